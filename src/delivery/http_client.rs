// ==========================================
// 客户批量导入 - HTTP 开通客户端
// ==========================================
// 职责: 将一条记录 POST 到配置的开通接口, 解析成功标记与临时凭证
// ==========================================

use crate::delivery::client::{build_payload, DeliveryClient, DeliveryError, DeliveryReceipt};
use crate::domain::record::ImportRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 凭证字段的可能名称
const CREDENTIAL_KEYS: [&str; 4] = ["senha_temporaria", "temporary_password", "password", "credentials"];
/// 合同 ID 字段的可能名称
const CONTRACT_KEYS: [&str; 3] = ["contrato_id", "contract_id", "contractId"];

pub struct HttpDeliveryClient {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpDeliveryClient {
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(DeliveryError::NotConfigured("delivery_endpoint".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            auth_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 取第一个存在的字段; 数字也按文本返回
    fn pick_text(body: &Value, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match body.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// 解析响应体
    pub(crate) fn parse_response(status: u16, body: &Value) -> Result<DeliveryReceipt, DeliveryError> {
        let success = match body.get("success").or_else(|| body.get("sucesso")) {
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(DeliveryError::InvalidResponse(
                    "success 字段不是布尔值".to_string(),
                ))
            }
            None => {
                return Err(DeliveryError::InvalidResponse(
                    "缺少 success 字段".to_string(),
                ))
            }
        };

        if !success {
            let message = Self::pick_text(body, &["message", "mensagem", "error", "erro"])
                .unwrap_or_else(|| "开通接口返回失败".to_string());
            return Err(DeliveryError::Rejected { status, message });
        }

        Ok(DeliveryReceipt {
            credentials: Self::pick_text(body, &CREDENTIAL_KEYS),
            contract_id: Self::pick_text(body, &CONTRACT_KEYS),
        })
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(&self, record: &ImportRecord) -> Result<DeliveryReceipt, DeliveryError> {
        let payload = build_payload(record);

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        debug!(row = record.row_index, status = status.as_u16(), "开通接口已响应");

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| DeliveryError::InvalidResponse(format!("无法解析 JSON: {}", e)))?;
        Self::parse_response(status.as_u16(), &body)
    }
}
