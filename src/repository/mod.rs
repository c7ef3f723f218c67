// ==========================================
// 客户批量导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod plan_attachment_repo;

// 重导出核心仓储
pub use catalog_repo::{CatalogEntry, ProductCatalog, SqliteProductCatalog};
pub use error::{RepositoryError, RepositoryResult};
pub use plan_attachment_repo::{PlanAttachment, PlanAttachmentStore, SqlitePlanAttachmentStore};
