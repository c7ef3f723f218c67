// ==========================================
// 客户批量导入 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置存储访问失败: {0}")]
    Storage(String),

    #[error("配置锁获取失败: {0}")]
    LockError(String),

    #[error("配置快照格式错误: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage(err.to_string())
    }
}
