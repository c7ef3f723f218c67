// ==========================================
// 客户批量导入 - 开通网关接口
// ==========================================
// 职责: 定义单条记录的投递接口与错误类型（不包含实现）
// 实现者: HttpDeliveryClient（生产）, ProvisioningDeliveryClient（装饰器）, 测试替身
// ==========================================

use crate::domain::record::{ImportField, ImportRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// 投递错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("网络请求失败: {0}")]
    Transport(String),

    #[error("开通接口拒绝 (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("响应格式错误: {0}")]
    InvalidResponse(String),

    #[error("开通接口未配置: {0}")]
    NotConfigured(String),

    /// 重试耗尽: 按顺序拼接每次尝试的错误
    #[error("{attempts} 次尝试均失败: {}", .errors.join(" | "))]
    Exhausted { attempts: u32, errors: Vec<String> },
}

/// 开通成功回执
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub credentials: Option<String>, // 临时凭证
    pub contract_id: Option<String>, // 合同 ID（用于挂载套餐）
}

// ==========================================
// DeliveryClient Trait
// ==========================================
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// 投递一条合法记录
    ///
    /// # 返回
    /// - Ok(DeliveryReceipt): 开通成功
    /// - Err(DeliveryError): 开通失败或网络失败（由调用方决定是否重试）
    async fn deliver(&self, record: &ImportRecord) -> Result<DeliveryReceipt, DeliveryError>;
}

#[async_trait]
impl<T: DeliveryClient + ?Sized> DeliveryClient for Arc<T> {
    async fn deliver(&self, record: &ImportRecord) -> Result<DeliveryReceipt, DeliveryError> {
        (**self).deliver(record).await
    }
}

/// 构造投递报文: 所有逻辑字段均以文本发送, 缺失字段为空串
pub fn build_payload(record: &ImportRecord) -> Value {
    let mut body = Map::new();
    for field in ImportField::ALL {
        body.insert(field.key().to_string(), Value::String(record.field_text(field)));
    }
    body.insert(
        "linha".to_string(),
        Value::Number((record.row_index as u64 + 1).into()),
    );
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_contains_every_field_as_text() {
        let record = ImportRecord {
            row_index: 2,
            email: "ana@x.com".to_string(),
            cpf: "01234567890".to_string(),
            price: Some(99.9),
            ..Default::default()
        };

        let payload = build_payload(&record);
        let obj = payload.as_object().unwrap();

        assert_eq!(obj.len(), ImportField::ALL.len() + 1);
        assert_eq!(obj["email"], "ana@x.com");
        assert_eq!(obj["cpf"], "01234567890");
        assert_eq!(obj["valor"], "99.90");
        assert_eq!(obj["cnpj"], "");
        assert_eq!(obj["linha"], 3);
    }

    #[test]
    fn test_exhausted_message_joins_attempts() {
        let err = DeliveryError::Exhausted {
            attempts: 2,
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "2 次尝试均失败: a | b");
    }
}
