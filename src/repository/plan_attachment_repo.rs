// ==========================================
// 客户批量导入 - 客户套餐挂载仓储
// ==========================================
// 职责: 开通成功后记录 合同 ↔ 套餐 关系
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 套餐挂载请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAttachment {
    pub contract_id: String,
    pub plan_id: String,
    pub start_date: Option<String>,
    pub next_due_date: Option<String>,
    pub paid_amount: Option<f64>,
}

#[async_trait]
pub trait PlanAttachmentStore: Send + Sync {
    /// 挂载套餐，返回新生成的 attachment_id
    async fn attach(&self, attachment: &PlanAttachment) -> RepositoryResult<String>;
}

pub struct SqlitePlanAttachmentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlanAttachmentStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按合同查询已挂载的套餐 ID
    pub fn find_by_contract(&self, contract_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT plan_id FROM client_plan WHERE contract_id = ?1 ORDER BY created_at, attachment_id",
        )?;
        let plan_ids = stmt
            .query_map(params![contract_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plan_ids)
    }
}

#[async_trait]
impl PlanAttachmentStore for SqlitePlanAttachmentStore {
    async fn attach(&self, attachment: &PlanAttachment) -> RepositoryResult<String> {
        if attachment.contract_id.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "contract_id".to_string(),
                message: "不能为空".to_string(),
            });
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let attachment_id = Uuid::new_v4().to_string();
        conn.execute(
            r#"
            INSERT INTO client_plan (attachment_id, contract_id, plan_id, start_date, next_due_date, paid_amount)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                attachment_id,
                attachment.contract_id,
                attachment.plan_id,
                attachment.start_date,
                attachment.next_due_date,
                attachment.paid_amount,
            ],
        )?;
        Ok(attachment_id)
    }
}
