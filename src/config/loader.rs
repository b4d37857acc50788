use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序：
    /// 1. 内置默认值
    /// 2. ./catfolio.toml
    /// 3. `CATFOLIO_` 前缀的环境变量（`__` 表示嵌套）
    /// 4. `OPENAI_API_KEY`
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CATFOLIO_").split("__"))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "openai.api_key".into()),
            )
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.openai.model.trim().is_empty() {
            return Err(ConfigValidationError::MissingModel);
        }

        if !(0.0..=1.0).contains(&config.assets.accessory_probability) {
            return Err(ConfigValidationError::InvalidProbability(
                config.assets.accessory_probability,
            ));
        }

        if config.cache.backstory_ttl_secs == 0 {
            return Err(ConfigValidationError::InvalidTtl);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("模型名称未配置")]
    MissingModel,

    #[error("头饰概率无效，必须在 0 到 1 之间: {0}")]
    InvalidProbability(f64),

    #[error("缓存存活时间无效，必须大于 0")]
    InvalidTtl,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("catfolio.toml")
}
