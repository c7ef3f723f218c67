// ==========================================
// 客户批量导入 API
// ==========================================
// 职责: 串联 打开文件 → 列映射 → 预览 → 运行作业 → 导出报表
// 作业控制（暂停/继续/取消/进度）通过共享的 JobController 完成
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportSettings};
use crate::db::open_and_prepare;
use crate::delivery::{DeliveryClient, HttpDeliveryClient, ProvisioningDeliveryClient};
use crate::domain::job::{ImportStats, RunSummary};
use crate::engine::{ImportJobRunner, JobController, RunnerSettings};
use crate::importer::{ColumnMapping, ImportError, ImportPreview, ImportSession};
use crate::report::reporter;
use crate::repository::{SqlitePlanAttachmentStore, SqliteProductCatalog};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

/// 生产环境使用的投递客户端
pub type ProductionDeliveryClient =
    ProvisioningDeliveryClient<HttpDeliveryClient, SqliteProductCatalog, SqlitePlanAttachmentStore>;

/// 运行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRunResponse {
    /// 汇总
    pub summary: RunSummary,
    /// 逐条结果
    pub stats: ImportStats,
}

/// 导入API
pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
    config: ConfigManager,
}

impl ImportApi {
    /// 打开数据库（不存在则创建并建表）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_and_prepare(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（连接需已建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())?;
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn catalog(&self) -> SqliteProductCatalog {
        SqliteProductCatalog::new(self.conn.clone())
    }

    pub fn plan_attachments(&self) -> SqlitePlanAttachmentStore {
        SqlitePlanAttachmentStore::new(self.conn.clone())
    }

    // ==========================================
    // 文件与映射
    // ==========================================

    /// 打开本地表格文件
    ///
    /// # 返回
    /// - Err(ImportError): 文件无法读取或解码, 不处理任何记录
    pub async fn open_file(&self, path: &Path) -> ApiResult<ImportSession> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ImportError::FileReadError(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.open_bytes(&file_name, &bytes)
    }

    /// 打开内存中的表格（上传场景）
    pub fn open_bytes(&self, file_name: &str, bytes: &[u8]) -> ApiResult<ImportSession> {
        let session = ImportSession::open(file_name, bytes)?;
        let preview = session.preview();
        info!(
            file_name,
            total_rows = preview.total_rows,
            valid = preview.valid,
            invalid = preview.invalid,
            "文件已打开"
        );
        Ok(session)
    }

    /// 解析 "逻辑字段=表头" 形式的映射参数
    pub fn parse_mapping<S: AsRef<str>>(pairs: &[S]) -> ApiResult<ColumnMapping> {
        let mut parsed = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let (field, header) = pair.as_ref().split_once('=').ok_or_else(|| {
                ApiError::InvalidInput(format!("映射格式应为 字段=表头: {}", pair.as_ref()))
            })?;
            parsed.push((field.trim().to_string(), header.trim().to_string()));
        }
        Ok(ColumnMapping::from_pairs(parsed)?)
    }

    pub fn preview(&self, session: &ImportSession) -> ImportPreview {
        session.preview()
    }

    // ==========================================
    // 作业运行
    // ==========================================

    /// 读取当前运行配置
    pub async fn settings(&self) -> ApiResult<ImportSettings> {
        Ok(ImportSettings::load(&self.config).await?)
    }

    /// 按配置构建生产投递客户端（HTTP + 套餐挂载）
    pub fn build_delivery_client(&self, settings: &ImportSettings) -> ApiResult<ProductionDeliveryClient> {
        let endpoint = settings.delivery_endpoint.clone().unwrap_or_default();
        let http = HttpDeliveryClient::new(
            endpoint,
            settings.delivery_auth_token.clone(),
            settings.delivery_timeout,
        )?;
        Ok(ProvisioningDeliveryClient::new(
            http,
            self.catalog(),
            self.plan_attachments(),
        ))
    }

    /// 使用配置的开通接口运行作业
    pub async fn run(
        &self,
        session: &ImportSession,
        controller: &JobController,
    ) -> ApiResult<ImportRunResponse> {
        let settings = self.settings().await?;
        let client = self.build_delivery_client(&settings)?;
        Self::run_with(session, client, settings.runner, controller).await
    }

    /// 使用指定投递客户端运行作业
    pub async fn run_with<D: DeliveryClient>(
        session: &ImportSession,
        client: D,
        runner_settings: RunnerSettings,
        controller: &JobController,
    ) -> ApiResult<ImportRunResponse> {
        let unmapped = session.columns().unmapped_required();
        if !unmapped.is_empty() {
            warn!(?unmapped, "存在未映射的必填字段，相关记录将校验失败");
        }

        let started = Instant::now();
        let runner = ImportJobRunner::new(client, runner_settings);
        let stats = runner.run(session.valid_records(), controller).await?;

        let summary = RunSummary::from_stats(
            controller.job_id().to_string(),
            controller.state(),
            &stats,
            started.elapsed().as_millis() as u64,
        );
        Ok(ImportRunResponse { summary, stats })
    }

    // ==========================================
    // 报表导出
    // ==========================================

    pub fn export_template(&self) -> ApiResult<Vec<u8>> {
        Ok(reporter::template_csv()?)
    }

    pub fn export_results(&self, stats: &ImportStats) -> ApiResult<Vec<u8>> {
        Ok(reporter::results_csv(stats)?)
    }

    pub fn export_invalid_rows(&self, session: &ImportSession) -> ApiResult<Vec<u8>> {
        Ok(reporter::invalid_rows_csv(&session.invalid_records())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::ImportField;

    #[test]
    fn test_parse_mapping_pairs() {
        let mapping =
            ImportApi::parse_mapping(&["email = Correio", "plano=Pacote Contratado"]).unwrap();
        assert_eq!(mapping.get(ImportField::Email), Some("Correio"));
        assert_eq!(mapping.get(ImportField::Plan), Some("Pacote Contratado"));
    }

    #[test]
    fn test_parse_mapping_rejects_bad_input() {
        assert!(matches!(
            ImportApi::parse_mapping(&["email"]),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            ImportApi::parse_mapping(&["idade=Idade"]),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_run_without_endpoint_is_config_error() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let api = ImportApi::from_connection(Arc::new(Mutex::new(conn))).unwrap();

        let session = api
            .open_bytes("c.csv", b"Nome,E-mail,Telefone,Produto,Plano,Tipo\nAna,a@x.com,1,Agenda,Mensal,PF\n")
            .unwrap();
        let controller = JobController::new();

        let err = api.run(&session, &controller).await.unwrap_err();
        assert!(matches!(err, ApiError::ConfigError(_)));
        assert_eq!(controller.state(), crate::domain::types::JobState::Idle);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_read_error() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let api = ImportApi::from_connection(Arc::new(Mutex::new(conn))).unwrap();

        let err = api
            .open_file(Path::new("/nonexistent/clientes.csv"))
            .await
            .err()
            .expect("expected open_file to fail");
        match err {
            ApiError::ImportError(message) => assert!(message.starts_with("文件读取失败")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
