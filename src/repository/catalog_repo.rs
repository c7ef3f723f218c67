// ==========================================
// 客户批量导入 - 产品目录仓储
// ==========================================
// 职责: 产品名 + 套餐名 → (product_id, plan_id)
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 目录查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_id: String,
    pub plan_id: String,
}

// ==========================================
// ProductCatalog Trait
// ==========================================
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// 按名称查找产品与套餐（TRIM + 大小写不敏感）
    ///
    /// # 返回
    /// - Ok(CatalogEntry): 找到
    /// - Err(NotFound): 产品或套餐不存在
    async fn lookup(&self, product_name: &str, plan_name: &str) -> RepositoryResult<CatalogEntry>;
}

pub struct SqliteProductCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProductCatalog {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 登记产品与套餐（已存在则复用），返回目录项
    pub fn register(&self, product_name: &str, plan_name: &str) -> RepositoryResult<CatalogEntry> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let product_id: String = match conn
            .query_row(
                "SELECT product_id FROM product WHERE lower(name) = lower(trim(?1))",
                params![product_name],
                |row| row.get(0),
            )
            .optional()?
        {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO product (product_id, name) VALUES (?1, trim(?2))",
                    params![id, product_name],
                )?;
                id
            }
        };

        let plan_id: String = match conn
            .query_row(
                "SELECT plan_id FROM product_plan WHERE product_id = ?1 AND lower(name) = lower(trim(?2))",
                params![product_id, plan_name],
                |row| row.get(0),
            )
            .optional()?
        {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO product_plan (plan_id, product_id, name) VALUES (?1, ?2, trim(?3))",
                    params![id, product_id, plan_name],
                )?;
                id
            }
        };

        Ok(CatalogEntry {
            product_id,
            plan_id,
        })
    }
}

#[async_trait]
impl ProductCatalog for SqliteProductCatalog {
    async fn lookup(&self, product_name: &str, plan_name: &str) -> RepositoryResult<CatalogEntry> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let entry = conn
            .query_row(
                r#"
                SELECT p.product_id, pp.plan_id
                FROM product p
                JOIN product_plan pp ON pp.product_id = p.product_id
                WHERE lower(p.name) = lower(trim(?1)) AND lower(pp.name) = lower(trim(?2))
                "#,
                params![product_name, plan_name],
                |row| {
                    Ok(CatalogEntry {
                        product_id: row.get(0)?,
                        plan_id: row.get(1)?,
                    })
                },
            )
            .optional()?;

        entry.ok_or_else(|| {
            RepositoryError::not_found(
                "ProductPlan",
                format!("{}/{}", product_name.trim(), plan_name.trim()),
            )
        })
    }
}
