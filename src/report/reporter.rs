// ==========================================
// 客户批量导入 - 结果汇总与报表
// ==========================================
// 产物:
// - 导入模板（固定列 + 一行示例）
// - 开通结果报表（邮箱 / 姓名 / 状态 / 错误 / 凭证）
// - 不合法行报表（行号 / 邮箱 / 姓名 / 错误）
// - 运行汇总 JSON
// 约束: 只读内存数据, 不访问网络与存储
// ==========================================

use crate::domain::job::{ImportStats, RunSummary};
use crate::domain::record::{ImportField, ImportRecord};
use crate::importer::field_mapper::default_aliases;
use thiserror::Error;

/// UTF-8 BOM, 便于表格软件正确识别重音字符
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const RESULT_HEADERS: [&str; 5] = ["Email", "Nome", "Status", "Erro", "Credencial"];
pub const INVALID_ROW_HEADERS: [&str; 4] = ["Linha", "Email", "Nome", "Erros"];

pub const STATUS_SUCCESS: &str = "Sucesso";
pub const STATUS_FAILURE: &str = "Falha";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("报表输出失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// 模板表头: 每个逻辑字段取首选表头名
pub fn template_headers() -> Vec<&'static str> {
    ImportField::ALL
        .iter()
        .map(|field| default_aliases(*field).first().copied().unwrap_or(field.key()))
        .collect()
}

/// 模板示例行
fn template_example(field: ImportField) -> &'static str {
    match field {
        ImportField::ResponsibleName => "Maria Silva",
        ImportField::Email => "maria.silva@exemplo.com.br",
        ImportField::Phone => "11987654321",
        ImportField::Product => "Agenda",
        ImportField::Plan => "Mensal",
        ImportField::PersonType => "Pessoa Física",
        ImportField::Price => "99,90",
        ImportField::Status => "Ativo",
        ImportField::StartDate => "2025-01-01",
        ImportField::NextDueDate => "2025-02-01",
        ImportField::CreatedAt => "2025-01-01",
        ImportField::Cpf => "111.444.777-35",
        ImportField::Cnpj => "",
        ImportField::CompanyName => "",
        ImportField::PostalCode => "01310-100",
        ImportField::Street => "Avenida Paulista",
        ImportField::Number => "1000",
        ImportField::Complement => "Sala 1",
        ImportField::District => "Bela Vista",
        ImportField::City => "São Paulo",
        ImportField::State => "SP",
        ImportField::PaymentMethod => "Boleto",
    }
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new().from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ReportResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

/// 导入模板 CSV
pub fn template_csv() -> ReportResult<Vec<u8>> {
    let mut writer = csv_writer();
    writer.write_record(template_headers())?;
    writer.write_record(ImportField::ALL.iter().map(|f| template_example(*f)))?;
    finish(writer)
}

/// 开通结果 CSV（按处理顺序）
pub fn results_csv(stats: &ImportStats) -> ReportResult<Vec<u8>> {
    let mut writer = csv_writer();
    writer.write_record(RESULT_HEADERS)?;

    for result in &stats.results {
        let status = if result.success {
            STATUS_SUCCESS
        } else {
            STATUS_FAILURE
        };
        writer.write_record([
            result.record.email.as_str(),
            result.record.responsible_name.as_str(),
            status,
            result.error.as_deref().unwrap_or(""),
            result.credentials.as_deref().unwrap_or(""),
        ])?;
    }
    finish(writer)
}

/// 表格中的行号: 表头占第 1 行
pub fn sheet_line(record: &ImportRecord) -> usize {
    record.row_index + 2
}

/// 不合法行 CSV
pub fn invalid_rows_csv(invalid: &[(&ImportRecord, &[String])]) -> ReportResult<Vec<u8>> {
    let mut writer = csv_writer();
    writer.write_record(INVALID_ROW_HEADERS)?;

    for (record, errors) in invalid {
        writer.write_record([
            sheet_line(record).to_string(),
            record.email.clone(),
            record.responsible_name.clone(),
            errors.join("; "),
        ])?;
    }
    finish(writer)
}

/// 运行汇总 JSON
pub fn summary_json(summary: &RunSummary) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
