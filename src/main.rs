// ==========================================
// 客户批量导入 - 命令行入口
// ==========================================
// 子命令:
// - run <file>       解析 → 校验 → 逐条开通, Ctrl-C 取消
// - template <out>   导出导入模板
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_import::api::ImportApi;
use client_import::db::default_db_path;
use client_import::engine::JobController;
use client_import::logging;
use client_import::report::reporter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "client-import", version, about = "客户批量导入")]
struct Cli {
    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导入表格并逐条开通
    Run {
        /// 表格文件 (.xlsx/.xlsm/.xls/.ods/.csv)
        file: PathBuf,

        /// SQLite 数据库路径（配置 / 产品目录）
        #[arg(long, env = "CLIENT_IMPORT_DB_PATH")]
        db: Option<String>,

        /// 列映射覆写, 形如 email=Correio
        #[arg(long = "map", value_name = "FIELD=HEADER")]
        mappings: Vec<String>,

        /// 开通结果报表输出路径 (CSV)
        #[arg(long)]
        report: Option<PathBuf>,

        /// 不合法行报表输出路径 (CSV)
        #[arg(long)]
        invalid_report: Option<PathBuf>,

        /// 只解析与校验, 不调用开通接口
        #[arg(long)]
        dry_run: bool,
    },

    /// 导出导入模板
    Template {
        /// 输出路径 (CSV)
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    info!("{} v{}", client_import::APP_NAME, client_import::VERSION);

    match cli.command {
        Command::Template { out } => {
            let bytes = reporter::template_csv()?;
            std::fs::write(&out, bytes)
                .with_context(|| format!("写入模板失败: {}", out.display()))?;
            info!(path = %out.display(), "模板已导出");
            Ok(())
        }
        Command::Run {
            file,
            db,
            mappings,
            report,
            invalid_report,
            dry_run,
        } => run(file, db, mappings, report, invalid_report, dry_run).await,
    }
}

async fn run(
    file: PathBuf,
    db: Option<String>,
    mappings: Vec<String>,
    report: Option<PathBuf>,
    invalid_report: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let db_path = db.unwrap_or_else(default_db_path);
    info!(db_path = %db_path, "使用数据库");

    let api = ImportApi::new(&db_path)?;
    let mut session = api.open_file(&file).await?;
    if !mappings.is_empty() {
        session.set_mapping(ImportApi::parse_mapping(mappings.as_slice())?);
    }

    let preview = api.preview(&session);
    println!("{}", serde_json::to_string_pretty(&preview)?);

    if let Some(path) = &invalid_report {
        std::fs::write(path, api.export_invalid_rows(&session)?)
            .with_context(|| format!("写入不合法行报表失败: {}", path.display()))?;
    }

    if dry_run {
        info!("dry-run: 跳过开通");
        return Ok(());
    }

    let controller = Arc::new(JobController::new());
    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("收到中断信号，正在取消作业");
                controller.cancel();
            }
        });
    }

    let response = match api.run(&session, &controller).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "导入作业失败");
            return Err(e.into());
        }
    };

    if let Some(path) = &report {
        std::fs::write(path, api.export_results(&response.stats)?)
            .with_context(|| format!("写入结果报表失败: {}", path.display()))?;
        info!(path = %path.display(), "结果报表已导出");
    }

    println!("{}", reporter::summary_json(&response.summary)?);
    Ok(())
}
