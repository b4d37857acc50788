//! Server-Sent Events 帧解码器
//!
//! 与传输层无关的增量解析器：累积字节 -> 寻找空行分隔符 -> 拆分字段 -> 产出帧 -> 重复。

/// 一个完整的 SSE 帧
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    /// `event:` 字段，缺省时为 None（规范中等价于 "message"）
    pub event: Option<String>,
    /// 所有 `data:` 行以 `\n` 拼接后的内容
    pub data: String,
}

impl SseFrame {
    /// 事件类型，缺省为 "message"
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

/// `text/event-stream` 增量解码器
///
/// 按字节缓冲，跨两次读取被截断的多字节字符或 `data:` 行会在解析前拼回。
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一段数据，按顺序返回因此完整的帧
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        // CRLF 统一为 LF
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_block(&block[..end]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// 冲刷末尾未以空行结束的事件
    pub fn finish(&mut self) -> Option<SseFrame> {
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }

    /// 等待分隔符的字节数
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if event.is_none() && data_lines.is_empty() {
        return None;
    }

    Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    })
}
