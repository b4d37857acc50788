//! 背景故事流事件
//!
//! `start` / `text` / `done` / `error` 四种事件的编码、解码，以及客户端侧的文本累积。

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::decoder::{SseDecoder, SseFrame};

/// 背景故事流中的一个事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackstoryEvent {
    /// 连接建立
    Start,
    /// 增量文本片段
    Text(String),
    /// 正常结束
    Done,
    /// 流中途失败
    Error(String),
}

#[derive(Deserialize, Serialize)]
struct TextPayload {
    text: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}

impl BackstoryEvent {
    /// SSE `event:` 字段
    pub fn name(&self) -> &'static str {
        match self {
            BackstoryEvent::Start => "start",
            BackstoryEvent::Text(_) => "text",
            BackstoryEvent::Done => "done",
            BackstoryEvent::Error(_) => "error",
        }
    }

    /// SSE `data:` 字段（单行 JSON）
    pub fn data(&self) -> String {
        match self {
            BackstoryEvent::Start | BackstoryEvent::Done => "{}".to_string(),
            BackstoryEvent::Text(text) => json!({ "text": text }).to_string(),
            BackstoryEvent::Error(message) => json!({ "message": message }).to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BackstoryEvent::Done | BackstoryEvent::Error(_))
    }

    /// 按 SSE 线格式编码
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.data())
    }

    /// 从帧解码；未知事件类型返回 None
    pub fn from_frame(frame: &SseFrame) -> Option<Self> {
        match frame.event_type() {
            "start" => Some(BackstoryEvent::Start),
            "text" => {
                let text = serde_json::from_str::<TextPayload>(&frame.data)
                    .map(|p| p.text)
                    .unwrap_or_default();
                Some(BackstoryEvent::Text(text))
            }
            "done" => Some(BackstoryEvent::Done),
            "error" => {
                let message = serde_json::from_str::<ErrorPayload>(&frame.data)
                    .map(|p| p.message)
                    .unwrap_or_default();
                Some(BackstoryEvent::Error(message))
            }
            _ => None,
        }
    }
}

/// 读取进度
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamProgress {
    /// 尚未遇到终止事件
    Pending,
    /// 收到 `done`，携带完整文本
    Done(String),
    /// 收到 `error`
    Failed(String),
}

/// 客户端背景故事流读取器
///
/// 组合 [`SseDecoder`] 与累积的文本。收到终止事件后忽略之后的所有数据，
/// 包括与终止事件一起缓冲的部分。
#[derive(Debug, Default)]
pub struct BackstoryReader {
    decoder: SseDecoder,
    text: String,
    outcome: Option<StreamProgress>,
}

impl BackstoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 输入一段数据，每追加一个片段调用一次 `on_text`
    pub fn feed_with<F>(&mut self, chunk: &[u8], mut on_text: F) -> StreamProgress
    where
        F: FnMut(&str),
    {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        for frame in self.decoder.push(chunk) {
            let Some(event) = BackstoryEvent::from_frame(&frame) else {
                continue;
            };
            match event {
                BackstoryEvent::Start => self.text.clear(),
                BackstoryEvent::Text(fragment) => {
                    self.text.push_str(&fragment);
                    on_text(&fragment);
                }
                BackstoryEvent::Done => {
                    let outcome = StreamProgress::Done(self.text.clone());
                    self.outcome = Some(outcome.clone());
                    return outcome;
                }
                BackstoryEvent::Error(message) => {
                    let outcome = StreamProgress::Failed(message);
                    self.outcome = Some(outcome.clone());
                    return outcome;
                }
            }
        }

        StreamProgress::Pending
    }

    pub fn feed(&mut self, chunk: &[u8]) -> StreamProgress {
        self.feed_with(chunk, |_| {})
    }

    /// 目前累积的文本
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"event: text\ndata: {\"text\":\"ab\"}\n\n";

    #[test]
    fn test_text_reconstructed_for_every_split_offset() {
        for offset in 0..=SAMPLE.len() {
            let mut reader = BackstoryReader::new();
            reader.feed(&SAMPLE[..offset]);
            reader.feed(&SAMPLE[offset..]);
            assert_eq!(reader.text(), "ab", "split at byte {offset}");
        }
    }

    #[test]
    fn test_byte_by_byte_full_stream() {
        let stream = [
            BackstoryEvent::Start.encode(),
            BackstoryEvent::Text("Once ".into()).encode(),
            BackstoryEvent::Text("upon a \"time\"\n".into()).encode(),
            BackstoryEvent::Done.encode(),
        ]
        .concat();

        let mut reader = BackstoryReader::new();
        let mut fragments = Vec::new();
        let mut last = StreamProgress::Pending;
        for byte in stream.as_bytes() {
            last = reader.feed_with(std::slice::from_ref(byte), |f| fragments.push(f.to_string()));
        }

        assert_eq!(last, StreamProgress::Done("Once upon a \"time\"\n".into()));
        assert_eq!(fragments, vec!["Once ", "upon a \"time\"\n"]);
    }

    #[test]
    fn test_input_after_done_is_ignored() {
        let chunk = [
            BackstoryEvent::Text("kept".into()).encode(),
            BackstoryEvent::Done.encode(),
            BackstoryEvent::Text("dropped".into()).encode(),
        ]
        .concat();

        let mut reader = BackstoryReader::new();
        assert_eq!(reader.feed(chunk.as_bytes()), StreamProgress::Done("kept".into()));
        let again = reader.feed(BackstoryEvent::Text("late".into()).encode().as_bytes());
        assert_eq!(again, StreamProgress::Done("kept".into()));
        assert_eq!(reader.text(), "kept");
    }

    #[test]
    fn test_start_resets_text() {
        let mut reader = BackstoryReader::new();
        reader.feed(BackstoryEvent::Text("stale".into()).encode().as_bytes());
        reader.feed(BackstoryEvent::Start.encode().as_bytes());
        reader.feed(BackstoryEvent::Text("fresh".into()).encode().as_bytes());
        assert_eq!(reader.text(), "fresh");
    }

    #[test]
    fn test_error_is_terminal() {
        let mut reader = BackstoryReader::new();
        let progress = reader.feed(BackstoryEvent::Error("Stream error".into()).encode().as_bytes());
        assert_eq!(progress, StreamProgress::Failed("Stream error".into()));
        assert!(reader.is_finished());
    }

    #[test]
    fn test_unknown_events_ignored() {
        let mut reader = BackstoryReader::new();
        let progress = reader.feed(b"event: heartbeat\ndata: {}\n\n");
        assert_eq!(progress, StreamProgress::Pending);
        assert_eq!(reader.text(), "");
    }
}
