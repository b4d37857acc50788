//! 数据模型模块

pub mod cat;
pub mod personality;

pub use cat::{CatProfile, DndAttributes, PersonalityType, TimelineEvent};
pub use personality::{MBTI_TYPES, MbtiType, lookup_personality};
