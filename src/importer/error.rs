// ==========================================
// 客户批量导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    /// 文件无法解码为表格; 导入在处理任何记录前中止
    #[error("表格解析失败: {0}")]
    FileParseError(String),

    #[error("表格无工作表或无表头: {0}")]
    EmptyWorksheet(String),

    // ===== 列映射错误 =====
    #[error("未知的逻辑字段: {0}")]
    UnknownField(String),

    // ===== 作业控制错误 =====
    #[error("导入作业已启动，不能重复执行 (当前状态: {0})")]
    JobAlreadyStarted(String),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::FileParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::FileParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
