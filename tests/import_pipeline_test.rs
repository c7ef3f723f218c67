// ==========================================
// 导入全流程集成测试
// ==========================================
// 测试目标: 文件 → 校验 → 逐条开通（含重试）→ 汇总与报表
// ==========================================


use client_import::api::ImportApi;
use client_import::delivery::{DeliveryError, DeliveryReceipt, ProvisioningDeliveryClient};
use client_import::domain::JobState;
use client_import::engine::JobController;
use client_import::importer::ImportSession;
use client_import::logging;
use client_import::report::reporter;
use client_import::repository::{SqlitePlanAttachmentStore, SqliteProductCatalog};
use std::sync::Arc;
use test_helpers::{
    create_test_db, fast_runner_settings, seed_catalog, shared_connection, ScriptedDeliveryClient,
};

const CLIENTS_CSV: &str = "Nome do Responsável;E-mail;Telefone;Produto;Plano;Tipo de Pessoa;CPF\n\
Ana Souza;ana@x.com;11999990000;Agenda;Mensal;Pessoa Física;111.444.777-35\n\
Bruno Lima;;11988880000;Agenda;Mensal;PF;\n\
Carla Dias;carla@x.com;11977770000;Agenda;Anual;PF;\n";

#[tokio::test]
async fn test_invalid_row_excluded_and_retries_counted_once() {
    logging::init_test();

    let session = ImportSession::open("clientes.csv", CLIENTS_CSV.as_bytes()).unwrap();
    let preview = session.preview();
    assert_eq!(preview.total_rows, 3);
    assert_eq!(preview.valid, 2);
    assert_eq!(preview.invalid, 1);
    assert_eq!(
        session.outcome().errors_for(1),
        Some(&["Email é obrigatório".to_string()][..])
    );

    // Ana: falha uma vez e depois sucesso; Carla: falha 3 vezes
    let client = Arc::new(ScriptedDeliveryClient::new());
    client.script(
        "ana@x.com",
        vec![
            Err(DeliveryError::Transport("timeout".to_string())),
            Ok(DeliveryReceipt {
                credentials: Some("Tmp#Ana".to_string()),
                contract_id: None,
            }),
        ],
    );
    client.fail_times("carla@x.com", 3);

    let controller = JobController::new();
    let response =
        ImportApi::run_with(&session, client.clone(), fast_runner_settings(), &controller)
            .await
            .unwrap();

    let stats = &response.stats;
    assert_eq!(stats.total, 2);
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.results.len(), 2);
    assert!(stats.is_consistent());

    assert_eq!(client.calls_for("ana@x.com"), 2);
    assert_eq!(client.calls_for("carla@x.com"), 3);
    assert_eq!(client.calls_for(""), 0);

    // 结果按文件顺序
    assert_eq!(stats.results[0].record.email, "ana@x.com");
    assert_eq!(stats.results[0].credentials.as_deref(), Some("Tmp#Ana"));
    assert_eq!(stats.results[1].record.email, "carla@x.com");

    assert_eq!(response.summary.state, JobState::Completed);
    assert!(response.summary.is_partial_failure());

    let report = String::from_utf8(reporter::results_csv(stats).unwrap()).unwrap();
    assert!(report.contains("ana@x.com,Ana Souza,Sucesso,,Tmp#Ana"));
    assert!(report.contains("carla@x.com,Carla Dias,Falha,"));
}

#[tokio::test]
async fn test_unparseable_file_aborts_before_any_delivery() {
    let result = ImportSession::open("clientes.xlsx", b"definitely not a zip archive");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_template_round_trips_as_valid_import() {
    let template = reporter::template_csv().unwrap();
    let session = ImportSession::open("modelo.csv", &template).unwrap();

    let preview = session.preview();
    assert!(preview.unmapped_required.is_empty());
    assert_eq!(preview.total_rows, 1);
    assert_eq!(preview.valid, 1);

    let record = &session.records()[0];
    assert_eq!(record.cpf, "11144477735");
    assert_eq!(record.postal_code, "01310100");
}

#[tokio::test]
async fn test_successful_delivery_attaches_plan() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_catalog(&db_path, &[("Agenda", "Mensal")]);
    let conn = shared_connection(&db_path);

    let inner = Arc::new(ScriptedDeliveryClient::new());
    inner.script(
        "ana@x.com",
        vec![Ok(DeliveryReceipt {
            credentials: None,
            contract_id: Some("CT-1".to_string()),
        })],
    );
    let client = ProvisioningDeliveryClient::new(
        inner.clone(),
        SqliteProductCatalog::new(conn.clone()),
        SqlitePlanAttachmentStore::new(conn.clone()),
    );

    let session = ImportSession::open("clientes.csv", CLIENTS_CSV.as_bytes()).unwrap();
    let controller = JobController::new();
    let response = ImportApi::run_with(&session, client, fast_runner_settings(), &controller)
        .await
        .unwrap();

    assert_eq!(response.stats.success, 2);
    let attached = SqlitePlanAttachmentStore::new(conn)
        .find_by_contract("CT-1")
        .unwrap();
    assert_eq!(attached.len(), 1);
}

#[tokio::test]
async fn test_invalid_rows_export_lists_errors() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();
    let session = api
        .open_bytes("clientes.csv", CLIENTS_CSV.as_bytes())
        .unwrap();

    let bytes = api.export_invalid_rows(&session).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("3,,Bruno Lima,Email é obrigatório"));
}
