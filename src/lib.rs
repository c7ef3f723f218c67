// ==========================================
// 客户批量导入 - 核心库
// ==========================================
// 技术栈: Rust + Tokio + SQLite
// 流程: 表格 → 列映射 → 标准化 → 校验 → 逐条开通（可暂停/取消/重试）→ 报表
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 表格解析与记录校验
pub mod importer;

// 引擎层 - 作业控制与重试
pub mod engine;

// 投递层 - 开通接口
pub mod delivery;

// 数据仓储层 - 产品目录与套餐挂载
pub mod repository;

// 配置层 - 运行配置
pub mod config;

// 报表层 - 模板与结果导出
pub mod report;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CellValue, ImportField, ImportProgress, ImportRecord, ImportStats, JobState, PersonType,
    RawRow, RecordResult, RunSummary, ValidationOutcome,
};

// 导入
pub use importer::{ColumnMapping, ImportError, ImportPreview, ImportSession};

// 引擎
pub use engine::{ImportJobRunner, JobController, RetryPolicy, RunnerSettings};

// 投递
pub use delivery::{DeliveryClient, DeliveryError, DeliveryReceipt};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "客户批量导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
