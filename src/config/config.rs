use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 最大请求体大小（字节），base64 图像会放在请求体中
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            max_request_size: 10 * 1024 * 1024,
        }
    }
}

/// 模型服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API 密钥，通常来自 `OPENAI_API_KEY`
    pub api_key: String,
    /// API 根地址
    pub base_url: String,
    /// 多模态对话模型
    pub model: String,
    /// 整体请求超时（秒），为空表示不限制
    pub request_timeout_secs: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            request_timeout_secs: None,
        }
    }
}

/// 图层素材配置
///
/// 除 `root` 外的路径都相对于 `root`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// 素材根目录
    pub root: PathBuf,
    /// 底色目录
    pub base_colors: PathBuf,
    /// 眼睛目录
    pub eyes: PathBuf,
    /// 嘴巴目录
    pub mouths: PathBuf,
    /// 线稿目录
    pub lines: PathBuf,
    /// 花纹分类目录（每个子目录是一个分类）
    pub patterns: PathBuf,
    /// 头饰类型目录（每个子目录是一种头饰）
    pub accessories: PathBuf,
    /// 头饰出现概率
    pub accessory_probability: f64,
    /// 调试快照目录
    pub debug_dir: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public/images"),
            base_colors: PathBuf::from("essential/fur/fur-base colors"),
            eyes: PathBuf::from("essential/face/face-eyes"),
            mouths: PathBuf::from("essential/face/face-mouth"),
            lines: PathBuf::from("essential/lines"),
            patterns: PathBuf::from("add-ons/fur"),
            accessories: PathBuf::from("add-ons/accessories/head accs"),
            accessory_probability: 0.8,
            debug_dir: None,
        }
    }
}

/// 背景故事缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 条目存活时间（秒）
    pub backstory_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backstory_ttl_secs: 30 * 60,
        }
    }
}

impl CacheConfig {
    /// 存活时间，超出 chrono 可表示范围时取上限
    pub fn backstory_ttl(&self) -> chrono::Duration {
        let max_secs = (i64::MAX / 1000) as u64;
        chrono::Duration::seconds(self.backstory_ttl_secs.min(max_secs) as i64)
    }
}

/// 时间线生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// 背景故事的最小可用长度（字符）
    pub min_backstory_chars: usize,
    /// 返回的最大事件数
    pub max_events: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_backstory_chars: 100,
            max_events: 7,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 模型服务配置
    pub openai: OpenAiConfig,
    /// 素材配置
    pub assets: AssetConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 时间线配置
    pub timeline: TimelineConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            openai: OpenAiConfig::default(),
            assets: AssetConfig::default(),
            cache: CacheConfig::default(),
            timeline: TimelineConfig::default(),
            logging: LoggingConfig::default(),
            app_name: "catfolio".into(),
            environment: "development".into(),
        }
    }
}
