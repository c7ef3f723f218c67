// ==========================================
// 客户批量导入 - 导入层
// ==========================================
// 职责: 上传表格 → 标准客户记录 + 校验结果
// 支持: Excel, ODS, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod document_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod import_session;
pub mod importer_trait;
pub mod record_validator;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use document_validator::{
    format_cnpj, format_cpf, generate_cnpj, generate_cpf, is_valid_cnpj, is_valid_cpf,
};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMapping, RecordBuilder, ResolvedColumns};
pub use file_parser::{CsvReader, ExcelReader, ParsedSheet, UniversalSpreadsheetReader};
pub use import_session::{ImportPreview, ImportSession};
pub use record_validator::RecordValidator as RecordValidatorImpl;

// 重导出 Trait 接口
pub use importer_trait::{RecordValidator, SpreadsheetReader, ValueNormalizer};
