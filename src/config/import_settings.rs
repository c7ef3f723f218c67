// ==========================================
// 客户批量导入 - 导入运行参数
// ==========================================
// 职责: 一次性读取全部导入配置, 供 API 层构建客户端与运行器
// ==========================================

use crate::config::config_manager::DEFAULT_DELIVERY_TIMEOUT_SECS;
use crate::config::error::ConfigError;
use crate::config::import_config_trait::ImportConfigReader;
use crate::engine::job_runner::RunnerSettings;
use crate::engine::retry::RetryPolicy;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub delivery_endpoint: Option<String>,
    pub delivery_auth_token: Option<String>,
    pub delivery_timeout: Duration,
    pub runner: RunnerSettings,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delivery_endpoint: None,
            delivery_auth_token: None,
            delivery_timeout: Duration::from_secs(DEFAULT_DELIVERY_TIMEOUT_SECS),
            runner: RunnerSettings::default(),
        }
    }
}

impl ImportSettings {
    pub async fn load(reader: &dyn ImportConfigReader) -> Result<Self, ConfigError> {
        let retry = RetryPolicy::new(
            reader.get_delivery_max_attempts().await?,
            Duration::from_millis(reader.get_backoff_base_ms().await?),
        );

        Ok(Self {
            delivery_endpoint: reader.get_delivery_endpoint().await?,
            delivery_auth_token: reader.get_delivery_auth_token().await?,
            delivery_timeout: Duration::from_secs(reader.get_delivery_timeout_secs().await?),
            runner: RunnerSettings {
                retry,
                inter_record_delay: Duration::from_millis(reader.get_inter_record_delay_ms().await?),
                pause_poll_interval: Duration::from_millis(
                    reader.get_pause_poll_interval_ms().await?,
                ),
            },
        })
    }
}
