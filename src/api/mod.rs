// ==========================================
// 客户批量导入 - API 层
// ==========================================
// 职责: 对 UI / CLI 暴露的业务接口
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportRunResponse, ProductionDeliveryClient};
