// ==========================================
// 客户批量导入 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（配置 / 产品目录 / 套餐挂载）
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建所需表（已存在则跳过）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS product (
            product_id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS product_plan (
            plan_id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES product(product_id),
            name TEXT NOT NULL,
            UNIQUE (product_id, name)
        );

        CREATE TABLE IF NOT EXISTS client_plan (
            attachment_id TEXT PRIMARY KEY,
            contract_id TEXT NOT NULL,
            plan_id TEXT NOT NULL REFERENCES product_plan(plan_id),
            start_date TEXT,
            next_due_date TEXT,
            paid_amount REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )
}

/// 打开连接并建表
pub fn open_and_prepare(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 默认数据库路径
///
/// 优先级: CLIENT_IMPORT_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("CLIENT_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./client_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("client-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("client_import.db");
        }
    }
    path.to_string_lossy().into_owned()
}
