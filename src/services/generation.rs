//! 猫咪档案生成服务
//!
//! 每个方法对应一个生成接口：构造提示词、调用模型、解析 JSON，依赖失败时返回兜底值。

use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::catalog::{random_backstory_prompt, random_name};
use super::fallback::{Generated, with_fallback};
use super::prompts;
use crate::config::TimelineConfig;
use crate::error::{AppError, Result};
use crate::llm::{ChatModel, TextStream};
use crate::models::{DndAttributes, PersonalityType, TimelineEvent};
use crate::sse::BackstoryEvent;
use crate::store::KeyValueStore;

pub const MISSING_BACKSTORY: &str = "Missing or empty backstory";
pub const SHORT_BACKSTORY: &str = "Backstory too short or incomplete";
pub const UNKNOWN_CAT: &str = "Unknown Cat";
pub const TIMELINE_REQUEST_ERROR: &str = "Server error processing timeline request";

/// 人格与属性
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub personality_type: PersonalityType,
    pub dnd_attributes: DndAttributes,
}

/// 一次性生成的完整档案
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatDetails {
    pub backstory: String,
    pub personality_type: PersonalityType,
    pub dnd_attributes: DndAttributes,
    pub timeline: Vec<TimelineEvent>,
}

impl CatDetails {
    fn fallback(name: &str) -> Self {
        let inspiration = random_backstory_prompt(&mut rand::thread_rng());
        Self {
            backstory: format!("{} is a mysterious cat with an enigmatic past. {}", name, inspiration),
            personality_type: PersonalityType::fallback(),
            dnd_attributes: DndAttributes::fixed_fallback(),
            timeline: vec![
                TimelineEvent::new("Birth", "Born under mysterious circumstances"),
                TimelineEvent::new("6 months", "Began their journey into the unknown"),
                TimelineEvent::new("1 year", "Discovered their unique abilities"),
                TimelineEvent::new("2 years", "Overcame a significant challenge"),
                TimelineEvent::new("Present", "Continuing their adventures"),
            ],
        }
    }
}

/// 取出必填字段，缺失或为空时返回验证错误
pub fn require(value: Option<String>, message: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

fn malformed(what: &str) -> AppError {
    AppError::Upstream(format!("model response missing {}", what))
}

fn parse_name(value: &Value) -> Result<String> {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| malformed("name"))
}

fn parse_personality(value: &Value) -> Result<PersonalityType> {
    value
        .get("personalityType")
        .cloned()
        .and_then(|v| serde_json::from_value::<PersonalityType>(v).ok())
        .and_then(PersonalityType::normalized)
        .ok_or_else(|| malformed("personalityType"))
}

fn parse_attributes(value: &Value) -> Result<DndAttributes> {
    value
        .get("dndAttributes")
        .and_then(DndAttributes::from_value)
        .ok_or_else(|| malformed("dndAttributes"))
}

/// 兼容裸数组与 `{ "timeline": [...] }` 两种形状；无效事件被丢弃
fn parse_timeline(value: &Value, max_events: usize) -> Result<Vec<TimelineEvent>> {
    let items = match value {
        Value::Array(items) => items,
        other => other
            .get("timeline")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Upstream("unexpected timeline format".to_string()))?,
    };

    let events: Vec<TimelineEvent> = items
        .iter()
        .filter_map(|item| {
            let event = TimelineEvent::from_value(item);
            if event.is_none() {
                warn!("Filtering out invalid timeline event: {}", item);
            }
            event
        })
        .take(max_events)
        .collect();

    if events.is_empty() {
        return Err(AppError::Upstream(
            "No valid timeline events could be extracted".to_string(),
        ));
    }
    Ok(events)
}

/// 档案生成器
#[derive(Clone)]
pub struct CatGenerator {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn KeyValueStore>,
    timeline: TimelineConfig,
}

impl std::fmt::Debug for CatGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatGenerator")
            .field("model", &"Arc<dyn ChatModel>")
            .field("store", &"Arc<dyn KeyValueStore>")
            .field("timeline", &self.timeline)
            .finish()
    }
}

impl CatGenerator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn KeyValueStore>,
        timeline: TimelineConfig,
    ) -> Self {
        Self {
            model,
            store,
            timeline,
        }
    }

    /// 建议名字
    pub async fn suggest_name(&self, image: &str) -> Result<Generated<String>> {
        let prompt = prompts::name(image);
        with_fallback(
            async {
                let value = self.model.complete_json(&prompt).await?;
                parse_name(&value)
            },
            || random_name(&mut rand::thread_rng()),
        )
        .await
    }

    /// 推断人格类型
    pub async fn personality(&self, image: &str, name: &str) -> Result<Generated<PersonalityType>> {
        let prompt = prompts::personality(image, name, random_backstory_prompt(&mut rand::thread_rng()));
        with_fallback(
            async {
                let value = self.model.complete_json(&prompt).await?;
                parse_personality(&value)
            },
            PersonalityType::fallback,
        )
        .await
    }

    /// 根据人格分配属性
    pub async fn attributes(
        &self,
        image: &str,
        name: &str,
        personality: &PersonalityType,
    ) -> Result<Generated<DndAttributes>> {
        let prompt = prompts::attributes(
            image,
            name,
            personality,
            random_backstory_prompt(&mut rand::thread_rng()),
        );
        with_fallback(
            async {
                let value = self.model.complete_json(&prompt).await?;
                parse_attributes(&value)
            },
            || DndAttributes::random_fallback(&mut rand::thread_rng()),
        )
        .await
    }

    /// 一次调用同时得到人格与属性
    pub async fn basic_info(&self, image: &str, name: &str) -> Result<Generated<BasicInfo>> {
        let prompt = prompts::basic_info(image, name, random_backstory_prompt(&mut rand::thread_rng()));
        with_fallback(
            async {
                let value = self.model.complete_json(&prompt).await?;
                Ok(BasicInfo {
                    personality_type: parse_personality(&value)?,
                    dnd_attributes: parse_attributes(&value)?,
                })
            },
            || BasicInfo {
                personality_type: PersonalityType::fallback(),
                dnd_attributes: DndAttributes::random_fallback(&mut rand::thread_rng()),
            },
        )
        .await
    }

    /// 一次调用生成背景故事、人格、属性与时间线
    pub async fn details(&self, image: &str, name: &str) -> Result<Generated<CatDetails>> {
        let prompt = prompts::details(image, name, random_backstory_prompt(&mut rand::thread_rng()));
        let max_events = self.timeline.max_events;
        with_fallback(
            async {
                let value = self.model.complete_json(&prompt).await?;
                let backstory = value
                    .get("backstory")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| malformed("backstory"))?
                    .to_string();
                Ok(CatDetails {
                    backstory,
                    personality_type: parse_personality(&value)?,
                    dnd_attributes: parse_attributes(&value)?,
                    timeline: parse_timeline(&value, max_events)?,
                })
            },
            || CatDetails::fallback(name),
        )
        .await
    }

    /// 打开背景故事流
    ///
    /// 上游流建立失败直接返回错误；建立之后的失败以 `error` 事件结束流。
    pub async fn stream_backstory(
        &self,
        image: &str,
        name: &str,
        personality: Option<&PersonalityType>,
    ) -> Result<BoxStream<'static, BackstoryEvent>> {
        let prompt = prompts::backstory(
            image,
            name,
            personality,
            random_backstory_prompt(&mut rand::thread_rng()),
        );
        let upstream = self.model.stream_text(&prompt).await?;
        info!("Backstory stream started for {}", name);
        Ok(backstory_events(upstream, self.store.clone(), name.to_string()))
    }

    /// 由背景故事提炼时间线，从不返回错误
    ///
    /// 请求中的背景故事为空或过短时，按名字从缓存中恢复。
    pub async fn timeline(
        &self,
        name: Option<&str>,
        personality: Option<&PersonalityType>,
        backstory: Option<&str>,
    ) -> Generated<Vec<TimelineEvent>> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let Some(name) = name else {
            warn!("Timeline requested without a name, using default timeline");
            return Generated::fallback(TimelineEvent::default_timeline(UNKNOWN_CAT), MISSING_BACKSTORY);
        };

        let min_chars = self.timeline.min_backstory_chars;
        let usable = |text: &str| text.chars().count() >= min_chars;

        let supplied = backstory.map(str::trim).filter(|b| !b.is_empty());
        let text = match supplied {
            Some(text) if usable(text) => text.to_string(),
            _ => {
                debug!("Backstory not usable from request, checking cache for {}", name);
                let cached = self
                    .store
                    .get(name)
                    .map(|b| b.trim().to_string())
                    .filter(|b| !b.is_empty());
                match cached {
                    Some(text) if usable(&text) => {
                        info!("Recovered backstory for {} from cache", name);
                        text
                    }
                    other => {
                        let reason = if supplied.is_some() || other.is_some() {
                            SHORT_BACKSTORY
                        } else {
                            MISSING_BACKSTORY
                        };
                        warn!("{} for {}, using default timeline", reason, name);
                        return Generated::fallback(TimelineEvent::default_timeline(name), reason);
                    }
                }
            }
        };

        let prompt = prompts::timeline(name, personality, &text);
        let max_events = self.timeline.max_events;
        let result = with_fallback(
            async {
                let value = self.model.complete_json(&prompt).await?;
                parse_timeline(&value, max_events)
            },
            || TimelineEvent::default_timeline(name),
        )
        .await;

        match result {
            Ok(generated) => generated,
            Err(e) => Generated::fallback(TimelineEvent::default_timeline(name), e.to_string()),
        }
    }
}

struct EventState {
    upstream: TextStream,
    store: Arc<dyn KeyValueStore>,
    name: String,
    text: String,
    finished: bool,
}

/// 将上游文本流包装为 `start` / `text`* / (`done` | `error`) 事件序列
///
/// 正常结束时把完整文本写入缓存。
pub fn backstory_events(
    upstream: TextStream,
    store: Arc<dyn KeyValueStore>,
    name: String,
) -> BoxStream<'static, BackstoryEvent> {
    let state = EventState {
        upstream,
        store,
        name,
        text: String::new(),
        finished: false,
    };

    let body = stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            match state.upstream.next().await {
                Some(Ok(fragment)) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    state.text.push_str(&fragment);
                    return Some((BackstoryEvent::Text(fragment), state));
                }
                Some(Err(e)) => {
                    error!("Backstory stream for {} failed: {}", state.name, e);
                    state.finished = true;
                    return Some((BackstoryEvent::Error("Stream error".to_string()), state));
                }
                None => {
                    info!(
                        "Backstory stream completed for {}, length: {}",
                        state.name,
                        state.text.len()
                    );
                    state.store.put(&state.name, state.text.clone());
                    state.finished = true;
                    return Some((BackstoryEvent::Done, state));
                }
            }
        }
    });

    stream::once(async { BackstoryEvent::Start }).chain(body).boxed()
}
