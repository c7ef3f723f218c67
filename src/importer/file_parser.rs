// ==========================================
// 客户批量导入 - 表格解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb) / ODS / CSV
// ==========================================

use crate::domain::record::{CellValue, RawRow};
use crate::importer::data_cleaner::serial_to_datetime;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::SpreadsheetReader;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::io::Cursor;
use tracing::{debug, warn};

/// Windows-1252 中 0x80..=0x9F 对应的字符（其余高位字节与 Latin-1 相同）
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

fn decode_windows_1252(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => WINDOWS_1252_HIGH[(b - 0x80) as usize],
            _ => char::from(b),
        })
        .collect()
}

/// CSV 文本解码: UTF-8 优先, 失败时按 Windows-1252（本地表格软件导出的常见编码）
fn decode_csv_text<'a>(file_name: &str, bytes: &'a [u8]) -> Cow<'a, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            warn!(file = %file_name, error = %e, "CSV 不是有效的 UTF-8，按 Windows-1252 解码");
            Cow::Owned(decode_windows_1252(bytes))
        }
    }
}

// ==========================================
// ParsedSheet - 解析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl ParsedSheet {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }
}

/// 按表头组装一行; 缺失单元格补 Empty, 空表头列丢弃
fn build_row(headers: &[String], cells: Vec<CellValue>) -> RawRow {
    let mut cells = cells.into_iter();
    let pairs = headers
        .iter()
        .map(|h| (h.clone(), cells.next().unwrap_or(CellValue::Empty)))
        .filter(|(h, _)| !h.is_empty())
        .collect();
    RawRow::new(pairs)
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvReader;

impl CsvReader {
    /// 根据表头行判断分隔符（';' 或 ','）
    fn detect_delimiter(text: &str) -> u8 {
        let first_line = text.lines().next().unwrap_or("");
        let semicolons = first_line.matches(';').count();
        let commas = first_line.matches(',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }
}

impl SpreadsheetReader for CsvReader {
    fn read(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        let decoded = decode_csv_text(file_name, bytes);
        let text = decoded.trim_start_matches('\u{feff}');

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(Self::detect_delimiter(text))
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyWorksheet("CSV 无表头".to_string()));
        }

        // 读取所有行
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let cells = record
                .iter()
                .map(|v| {
                    if v.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(v.to_string())
                    }
                })
                .collect();
            let row = build_row(&headers, cells);

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(ParsedSheet::new(headers, rows))
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader;

impl ExcelReader {
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                match serial_to_datetime(serial) {
                    Some(value) => CellValue::Date(value),
                    None => CellValue::Number(serial),
                }
            }
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) => CellValue::Empty,
        }
    }
}

impl SpreadsheetReader for ExcelReader {
    fn read(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        // 打开工作簿（自动识别 xlsx/xls/xlsb/ods）
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::EmptyWorksheet(file_name.to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::EmptyWorksheet(file_name.to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 读取数据行
        let mut records = Vec::new();
        for data_row in rows {
            let cells = data_row.iter().map(Self::convert_cell).collect();
            let row = build_row(&headers, cells);

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            records.push(row);
        }

        debug!(sheet = %sheet_name, rows = records.len(), "工作表读取完成");
        Ok(ParsedSheet::new(headers, records))
    }
}

// ==========================================
// 通用表格解析器（根据扩展名自动选择, 其余交给 calamine 识别内容）
// ==========================================
pub struct UniversalSpreadsheetReader;

impl SpreadsheetReader for UniversalSpreadsheetReader {
    fn read(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => CsvReader.read(file_name, bytes),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "xla" | "ods" => ExcelReader.read(file_name, bytes),
            _ => {
                debug!(file = %file_name, ext = %ext, "未知扩展名，按工作簿内容识别");
                ExcelReader.read(file_name, bytes)
            }
        }
    }
}
