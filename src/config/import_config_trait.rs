// ==========================================
// 客户批量导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入作业所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigError;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 投递与作业运行所需的配置
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 开通接口 =====

    /// 获取开通接口地址
    ///
    /// # 默认值
    /// - None（未配置时无法构建 HTTP 客户端）
    async fn get_delivery_endpoint(&self) -> Result<Option<String>, ConfigError>;

    /// 获取开通接口 Bearer Token（可选）
    async fn get_delivery_auth_token(&self) -> Result<Option<String>, ConfigError>;

    /// 获取请求超时（秒）
    ///
    /// # 默认值
    /// - 30
    async fn get_delivery_timeout_secs(&self) -> Result<u64, ConfigError>;

    // ===== 重试 =====

    /// 每条记录最多投递次数
    ///
    /// # 默认值
    /// - 3
    async fn get_delivery_max_attempts(&self) -> Result<u32, ConfigError>;

    /// 退避基数（毫秒）, 第 N 次失败后等待 2^N × base
    ///
    /// # 默认值
    /// - 1000
    async fn get_backoff_base_ms(&self) -> Result<u64, ConfigError>;

    // ===== 节奏 =====

    /// 相邻两条记录之间的间隔（毫秒）
    ///
    /// # 默认值
    /// - 500
    async fn get_inter_record_delay_ms(&self) -> Result<u64, ConfigError>;

    /// 暂停时的轮询间隔（毫秒）
    ///
    /// # 默认值
    /// - 500
    async fn get_pause_poll_interval_ms(&self) -> Result<u64, ConfigError>;
}
