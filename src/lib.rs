//! Catfolio - 猫咪肖像生成服务
//!
//! 从分层 PNG 素材随机合成猫咪肖像，并借助多模态对话模型为其生成名字、人格类型、
//! D&D 属性、背景故事与时间线。背景故事以 SSE 流式返回。

pub mod api;
pub mod client;
pub mod compositor;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod sse;
pub mod store;
