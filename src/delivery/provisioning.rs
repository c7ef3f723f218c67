// ==========================================
// 客户批量导入 - 开通后套餐挂载（装饰器）
// ==========================================
// 职责: 内层投递成功且返回合同 ID 时, 按产品/套餐名查目录并挂载套餐
// 约束: 挂载失败只记录日志, 不改变该记录的成功结果
// ==========================================

use crate::delivery::client::{DeliveryClient, DeliveryError, DeliveryReceipt};
use crate::domain::record::ImportRecord;
use crate::repository::catalog_repo::ProductCatalog;
use crate::repository::error::RepositoryResult;
use crate::repository::plan_attachment_repo::{PlanAttachment, PlanAttachmentStore};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct ProvisioningDeliveryClient<D, C, P> {
    inner: D,
    catalog: C,
    plans: P,
}

impl<D, C, P> ProvisioningDeliveryClient<D, C, P>
where
    D: DeliveryClient,
    C: ProductCatalog,
    P: PlanAttachmentStore,
{
    pub fn new(inner: D, catalog: C, plans: P) -> Self {
        Self {
            inner,
            catalog,
            plans,
        }
    }

    async fn attach_plan(&self, record: &ImportRecord, contract_id: &str) -> RepositoryResult<String> {
        let entry = self.catalog.lookup(&record.product, &record.plan).await?;
        let attachment = PlanAttachment {
            contract_id: contract_id.to_string(),
            plan_id: entry.plan_id,
            start_date: non_empty(&record.start_date),
            next_due_date: non_empty(&record.next_due_date),
            paid_amount: record.price,
        };
        self.plans.attach(&attachment).await
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[async_trait]
impl<D, C, P> DeliveryClient for ProvisioningDeliveryClient<D, C, P>
where
    D: DeliveryClient,
    C: ProductCatalog,
    P: PlanAttachmentStore,
{
    async fn deliver(&self, record: &ImportRecord) -> Result<DeliveryReceipt, DeliveryError> {
        let receipt = self.inner.deliver(record).await?;

        if let Some(contract_id) = receipt.contract_id.as_deref() {
            match self.attach_plan(record, contract_id).await {
                Ok(attachment_id) => info!(
                    row = record.row_index,
                    contract_id,
                    attachment_id = %attachment_id,
                    "套餐已挂载"
                ),
                Err(e) => warn!(
                    row = record.row_index,
                    contract_id,
                    product = %record.product,
                    plan = %record.plan,
                    error = %e,
                    "套餐挂载失败（开通结果保持成功）"
                ),
            }
        }

        Ok(receipt)
    }
}
