// ==========================================
// 配置与仓储集成测试
// ==========================================
// 测试目标: 文件数据库上的配置读取、目录查询与 API 构建
// ==========================================


use client_import::api::{ApiError, ImportApi};
use client_import::config::{config_keys, ConfigManager, ImportConfigReader, ImportSettings};
use client_import::repository::{ProductCatalog, RepositoryError, SqliteProductCatalog};
use std::time::Duration;
use test_helpers::{create_test_db, insert_test_config, seed_catalog, shared_connection};

#[tokio::test]
async fn test_settings_loaded_from_file_database() {
    let (_temp, db_path) = create_test_db().unwrap();
    insert_test_config(&db_path, config_keys::DELIVERY_ENDPOINT, "https://crm.example.com/api/clientes");
    insert_test_config(&db_path, config_keys::DELIVERY_AUTH_TOKEN, "secret");
    insert_test_config(&db_path, config_keys::DELIVERY_BACKOFF_BASE_MS, "250");
    insert_test_config(&db_path, config_keys::PAUSE_POLL_INTERVAL_MS, "not-a-number");

    let manager = ConfigManager::new(&db_path).unwrap();
    let settings = ImportSettings::load(&manager).await.unwrap();

    assert_eq!(
        settings.delivery_endpoint.as_deref(),
        Some("https://crm.example.com/api/clientes")
    );
    assert_eq!(settings.delivery_auth_token.as_deref(), Some("secret"));
    assert_eq!(settings.runner.retry.base_delay, Duration::from_millis(250));
    assert_eq!(settings.runner.pause_poll_interval, Duration::from_millis(500));
    assert_eq!(manager.get_delivery_timeout_secs().await.unwrap(), 30);
}

#[tokio::test]
async fn test_catalog_lookup_across_connections() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_catalog(&db_path, &[("Agenda", "Mensal"), ("Agenda", "Anual"), ("Financeiro", "Mensal")]);

    let catalog = SqliteProductCatalog::new(shared_connection(&db_path));
    let monthly = catalog.lookup("AGENDA", " mensal ").await.unwrap();
    let yearly = catalog.lookup("agenda", "anual").await.unwrap();
    let finance = catalog.lookup("financeiro", "mensal").await.unwrap();

    assert_eq!(monthly.product_id, yearly.product_id);
    assert_ne!(monthly.plan_id, yearly.plan_id);
    assert_ne!(monthly.product_id, finance.product_id);

    let missing = catalog.lookup("Estoque", "Mensal").await.unwrap_err();
    assert!(matches!(missing, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_api_builds_delivery_client_when_configured() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let settings = api.settings().await.unwrap();
    assert!(matches!(
        api.build_delivery_client(&settings),
        Err(ApiError::ConfigError(_))
    ));

    api.config()
        .set_global_config_value(config_keys::DELIVERY_ENDPOINT, "http://127.0.0.1:9/clientes")
        .unwrap();
    let settings = api.settings().await.unwrap();
    assert!(api.build_delivery_client(&settings).is_ok());
}

#[tokio::test]
async fn test_template_export_written_to_disk() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modelo.csv");
    std::fs::write(&path, api.export_template().unwrap()).unwrap();

    let session = api.open_file(&path).await.unwrap();
    assert_eq!(session.file_name(), "modelo.csv");
    assert_eq!(session.preview().valid, 1);
}
