// ==========================================
// 客户批量导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::ConfigError;
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::job_runner::{DEFAULT_INTER_RECORD_DELAY_MS, DEFAULT_PAUSE_POLL_INTERVAL_MS};
use crate::engine::retry::{DEFAULT_BACKOFF_BASE_MS, DEFAULT_MAX_ATTEMPTS};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub const GLOBAL_SCOPE: &str = "global";
pub const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 30;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 读取文本配置; 空白视为未配置
    fn get_optional_text(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 读取数值配置; 缺失或无法解析时返回默认值（无法解析时告警）
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    fallback = %default,
                    "配置值无法解析，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let config_map = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的 global 配置
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, ConfigError> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_delivery_endpoint(&self) -> Result<Option<String>, ConfigError> {
        self.get_optional_text(config_keys::DELIVERY_ENDPOINT)
    }

    async fn get_delivery_auth_token(&self) -> Result<Option<String>, ConfigError> {
        self.get_optional_text(config_keys::DELIVERY_AUTH_TOKEN)
    }

    async fn get_delivery_timeout_secs(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or_default(config_keys::DELIVERY_TIMEOUT_SECS, DEFAULT_DELIVERY_TIMEOUT_SECS)
    }

    async fn get_delivery_max_attempts(&self) -> Result<u32, ConfigError> {
        let attempts =
            self.get_parsed_or_default(config_keys::DELIVERY_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?;
        if attempts == 0 {
            tracing::warn!(
                config_key = config_keys::DELIVERY_MAX_ATTEMPTS,
                "最大投递次数不能为 0，使用默认值"
            );
            return Ok(DEFAULT_MAX_ATTEMPTS);
        }
        Ok(attempts)
    }

    async fn get_backoff_base_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or_default(config_keys::DELIVERY_BACKOFF_BASE_MS, DEFAULT_BACKOFF_BASE_MS)
    }

    async fn get_inter_record_delay_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or_default(config_keys::INTER_RECORD_DELAY_MS, DEFAULT_INTER_RECORD_DELAY_MS)
    }

    async fn get_pause_poll_interval_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or_default(
            config_keys::PAUSE_POLL_INTERVAL_MS,
            DEFAULT_PAUSE_POLL_INTERVAL_MS,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 开通接口
    pub const DELIVERY_ENDPOINT: &str = "delivery_endpoint";
    pub const DELIVERY_AUTH_TOKEN: &str = "delivery_auth_token";
    pub const DELIVERY_TIMEOUT_SECS: &str = "delivery_timeout_secs";

    // 重试
    pub const DELIVERY_MAX_ATTEMPTS: &str = "delivery_max_attempts";
    pub const DELIVERY_BACKOFF_BASE_MS: &str = "delivery_backoff_base_ms";

    // 节奏
    pub const INTER_RECORD_DELAY_MS: &str = "inter_record_delay_ms";
    pub const PAUSE_POLL_INTERVAL_MS: &str = "pause_poll_interval_ms";
}
