use std::time::Duration;

use rocket::figment::providers::Env;
use rocket::figment::Figment;
use serde::Deserialize;

use crate::defaults;
use crate::error::RelayError;

/// 两个上游模型服务的地址和生成参数。
///
/// 从 rocket 的 figment 中读取 `relay` 表（Rocket.toml，按 profile），
/// 再用 `RELAY_*` 环境变量覆盖。缺失的键取 [`defaults`] 中的值。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub text_endpoint: String,
    pub image_endpoint: String,
    pub text_model: String,
    pub temperature: f32,
    pub num_predict: u32,
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            text_endpoint: defaults::TEXT_ENDPOINT.to_string(),
            image_endpoint: defaults::IMAGE_ENDPOINT.to_string(),
            text_model: defaults::TEXT_MODEL.to_string(),
            temperature: defaults::TEMPERATURE,
            num_predict: defaults::NUM_PREDICT,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

impl RelayConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, RelayError> {
        let config: RelayConfig = figment
            .focus("relay")
            .merge(Env::prefixed("RELAY_").global())
            .extract()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.timeout_secs == 0 {
            return Err(RelayError::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
