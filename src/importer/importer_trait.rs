// ==========================================
// 客户批量导入 - 导入组件 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 读表 → 列映射 → 值标准化 → 记录校验
// ==========================================

use crate::domain::record::{CellValue, ImportRecord};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::ParsedSheet;

// ==========================================
// SpreadsheetReader Trait
// ==========================================
// 用途: 表格解析接口（阶段 0）
// 实现者: ExcelReader, CsvReader, UniversalSpreadsheetReader
pub trait SpreadsheetReader: Send + Sync {
    /// 解析上传文件为表头 + 原始行
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于判断格式）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 第一个工作表的表头与数据行
    /// - Err(FileParseError): 无法按表格解码
    fn read(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ParsedSheet>;
}

// ==========================================
// ValueNormalizer Trait
// ==========================================
// 用途: 单元格值标准化（阶段 2）
// 实现者: DataCleaner
pub trait ValueNormalizer: Send + Sync {
    /// 日期单元格 → "YYYY-MM-DD HH:MM:SS"（空值返回空串）
    fn normalize_date(&self, value: &CellValue) -> String;

    /// 证件类单元格 → 文本（数字单元格不丢前导零）
    fn normalize_identifier(&self, value: &CellValue, width: Option<usize>) -> String;

    /// 普通文本单元格 → TRIM 后的文本
    fn normalize_text(&self, value: &CellValue) -> String;

    /// 价格单元格 → 数值（无法解析返回 None）
    fn normalize_price(&self, value: &CellValue) -> Option<f64>;
}

// ==========================================
// RecordValidator Trait
// ==========================================
// 用途: 单条记录校验（阶段 3）
// 实现者: RecordValidator
pub trait RecordValidator: Send + Sync {
    /// 校验一条标准记录
    ///
    /// # 返回
    /// - 有序错误列表（不短路，空列表 = 合法）
    fn validate(&self, record: &ImportRecord) -> Vec<String>;
}
