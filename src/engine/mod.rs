// ==========================================
// 客户批量导入 - 引擎层
// ==========================================
// 职责: 作业状态控制 / 退避重试 / 逐条投递
// 红线: 引擎不拼 SQL, 不解析文件
// ==========================================

pub mod job_controller;
pub mod job_runner;
pub mod retry;

// 重导出核心引擎
pub use job_controller::JobController;
pub use job_runner::{ImportJobRunner, RunnerSettings};
pub use retry::RetryPolicy;
