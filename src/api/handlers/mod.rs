//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod details_handler;
pub mod image_handler;
pub mod profile_handler;
pub mod story_handler;

pub use details_handler::*;
pub use image_handler::*;
pub use profile_handler::*;
pub use story_handler::*;
