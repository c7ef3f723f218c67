// ==========================================
// 客户批量导入 - API层错误类型
// ==========================================
// 职责: 将各层技术错误转换为面向用户的错误消息
// ==========================================

use crate::config::error::ConfigError;
use crate::delivery::client::DeliveryError;
use crate::importer::error::ImportError;
use crate::report::reporter::ReportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 文件无法解码: 导入在处理任何记录前中止
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 外部依赖错误
    // ==========================================
    #[error("开通接口错误: {0}")]
    DeliveryError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("报表生成失败: {0}")]
    ReportError(String),

}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnknownField(field) => {
                ApiError::InvalidInput(format!("未知的逻辑字段: {}", field))
            }
            ImportError::JobAlreadyStarted(state) => ApiError::InvalidStateTransition {
                from: state,
                to: "RUNNING".to_string(),
            },
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::NotConfigured(key) => {
                ApiError::ConfigError(format!("开通接口未配置 ({})", key))
            }
            other => ApiError::DeliveryError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, key } => {
                ApiError::NotFound(format!("{}({})不存在", entity, key))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::ReportError(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
