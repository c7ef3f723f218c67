// ==========================================
// 客户批量导入 - 开通投递层
// ==========================================
// 职责: 单条记录投递接口 / HTTP 实现 / 套餐挂载装饰器
// 红线: 投递层不做重试, 重试由引擎层统一控制
// ==========================================

pub mod client;
pub mod http_client;
pub mod provisioning;

pub use client::{build_payload, DeliveryClient, DeliveryError, DeliveryReceipt};
pub use http_client::HttpDeliveryClient;
pub use provisioning::ProvisioningDeliveryClient;
