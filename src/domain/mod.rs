// ==========================================
// 客户批量导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑, 不含网络调用
// ==========================================

pub mod job;
pub mod record;
pub mod types;

// 重导出核心类型
pub use job::{ImportProgress, ImportStats, RecordResult, RunSummary, ValidationOutcome};
pub use record::{CellValue, ImportField, ImportRecord, RawRow};
pub use types::{JobState, PersonType};
