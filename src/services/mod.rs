//! 服务模块

pub mod catalog;
pub mod fallback;
pub mod generation;
pub mod prompts;

pub use catalog::{random_backstory_prompt, random_name};
pub use fallback::{Generated, with_fallback};
pub use generation::{BasicInfo, CatDetails, CatGenerator, backstory_events, require};
