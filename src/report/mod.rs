// ==========================================
// 客户批量导入 - 报表层
// ==========================================

pub mod reporter;

pub use reporter::{
    invalid_rows_csv, results_csv, summary_json, template_csv, template_headers, ReportError,
    ReportResult,
};
