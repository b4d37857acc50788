//! SSE 模块
//!
//! 服务端发送事件的解码器，以及背景故事流的事件模型。

pub mod backstory;
pub mod decoder;

pub use backstory::{BackstoryEvent, BackstoryReader, StreamProgress};
pub use decoder::{SseDecoder, SseFrame};
