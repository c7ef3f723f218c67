// ==========================================
// 客户批量导入 - 值标准化器实现
// ==========================================
// 职责: 日期统一为 "YYYY-MM-DD HH:MM:SS" / 证件字段转文本 / 价格解析
// ==========================================

use crate::domain::record::CellValue;
use crate::importer::importer_trait::ValueNormalizer;
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// 标准日期时间格式
pub const CANONICAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 表格日期序列号与 1970-01-01 的天数差
pub const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86400.0;

/// ISO 8601 日期时间: 日期 T 时间[.小数秒][Z|时区偏移]
static ISO_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2})[Tt](\d{2}:\d{2})(:\d{2})?(?:[.,]\d+)?([Zz]|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .expect("iso datetime pattern is a valid regex")
});

/// 日期序列号 → UTC 时间（按秒四舍五入）
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let seconds = ((serial - SERIAL_EPOCH_OFFSET_DAYS) * SECONDS_PER_DAY).round();
    if seconds.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(seconds as i64, 0).map(|dt| dt.naive_utc())
}

pub fn format_canonical(value: &NaiveDateTime) -> String {
    value.format(CANONICAL_DATETIME_FORMAT).to_string()
}

/// 纯数字字符串（允许一个小数点）
fn is_numeric_text(value: &str) -> bool {
    !value.is_empty()
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_digit() || c == '.')
        && value.matches('.').count() <= 1
}

/// 千位分组校验: 首组 1-3 位, 其余每组 3 位
fn ungroup(int_part: &str, separator: char) -> Option<String> {
    let mut groups = int_part.split(separator);
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

/// 价格文本解析, 兼容 "1.234,56" 与 "1,234.56"
///
/// 小数点取最后出现的 ',' 或 '.'; 另一个符号只能作千位分隔。
/// 仅出现一次分隔符且其后恰为 3 位、整数部分不超过 3 位时无法判断, 返回 None
pub fn parse_price_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return None;
    }

    let (int_digits, frac_digits) = match body.rfind(|c: char| c == ',' || c == '.') {
        None => (body.to_string(), String::new()),
        Some(pos) => {
            let separator = if body.as_bytes()[pos] == b',' { ',' } else { '.' };
            let other = if separator == ',' { '.' } else { ',' };
            let head = &body[..pos];
            let tail = &body[pos + 1..];

            if head.contains(separator) {
                // 同一符号多次出现: 千位分隔, 无小数部分
                if body.contains(other) {
                    return None;
                }
                (ungroup(body, separator)?, String::new())
            } else if head.contains(other) {
                (ungroup(head, other)?, tail.to_string())
            } else if tail.len() == 3 && (1..=3).contains(&head.len()) {
                return None;
            } else {
                (head.to_string(), tail.to_string())
            }
        }
    };

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }
    let int_digits = if int_digits.is_empty() { "0".to_string() } else { int_digits };
    let value = if frac_digits.is_empty() {
        int_digits.parse::<f64>().ok()?
    } else {
        format!("{}.{}", int_digits, frac_digits).parse::<f64>().ok()?
    };
    let value = if negative { -value } else { value };
    Some(value).filter(|v| v.is_finite())
}

pub struct DataCleaner;

impl DataCleaner {
    /// 文本日期: ISO 8601 的 'T' 分隔符统一为空格, 去掉 'Z' 与小数秒, 补齐秒;
    /// 时区偏移原样保留在末尾; 其他文本仅 TRIM
    fn normalize_date_text(&self, text: &str) -> String {
        let trimmed = text.trim();
        let without_zone = trimmed.strip_suffix('Z').unwrap_or(trimmed);
        if let Ok(dt) = NaiveDateTime::parse_from_str(without_zone, "%Y-%m-%dT%H:%M:%S%.f") {
            return format_canonical(&dt);
        }

        match ISO_DATETIME.captures(trimmed) {
            Some(caps) => {
                let seconds = caps.get(3).map_or(":00", |m| m.as_str());
                let offset = match caps.get(4).map(|m| m.as_str()) {
                    Some("Z") | Some("z") | None => "",
                    Some(other) => other,
                };
                format!("{} {}{}{}", &caps[1], &caps[2], seconds, offset)
            }
            None => trimmed.to_string(),
        }
    }

    fn serial_text(&self, serial: f64) -> String {
        serial_to_datetime(serial)
            .map(|dt| format_canonical(&dt))
            .unwrap_or_default()
    }
}

impl ValueNormalizer for DataCleaner {
    fn normalize_date(&self, value: &CellValue) -> String {
        match value {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => self.serial_text(*n),
            CellValue::Date(dt) => format_canonical(dt),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    String::new()
                } else if is_numeric_text(trimmed) {
                    trimmed
                        .parse::<f64>()
                        .map(|n| self.serial_text(n))
                        .unwrap_or_default()
                } else {
                    self.normalize_date_text(trimmed)
                }
            }
            CellValue::Bool(_) => String::new(),
        }
    }

    fn normalize_identifier(&self, value: &CellValue, width: Option<usize>) -> String {
        match value {
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                let digits = format!("{}", n.abs() as u64);
                match width {
                    Some(w) => format!("{:0>w$}", digits, w = w),
                    None => digits,
                }
            }
            other => other.to_string().trim().to_string(),
        }
    }

    fn normalize_text(&self, value: &CellValue) -> String {
        value.to_string().trim().to_string()
    }

    fn normalize_price(&self, value: &CellValue) -> Option<f64> {
        match value {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => parse_price_text(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_serial_date_number() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.normalize_date(&CellValue::Number(45658.0)),
            "2025-01-01 00:00:00"
        );
        // 小数部分按一天的比例换算
        assert_eq!(
            cleaner.normalize_date(&CellValue::Number(45658.4375)),
            "2025-01-01 10:30:00"
        );
    }

    #[test]
    fn test_serial_date_round_trip_through_text_path() {
        let cleaner = DataCleaner;
        let canonical = cleaner.normalize_date(&CellValue::Number(45658.0));
        let again = cleaner.normalize_date(&CellValue::Text(canonical.clone()));
        assert_eq!(again, canonical);
    }

    #[test]
    fn test_numeric_text_is_serial() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text(" 45658 ".to_string())),
            "2025-01-01 00:00:00"
        );
    }

    #[test]
    fn test_iso_text_separator() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text("2025-01-01T10:30:00Z".to_string())),
            "2025-01-01 10:30:00"
        );
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text("2025-01-01T10:30:00.000Z".to_string())),
            "2025-01-01 10:30:00"
        );
        // 无秒 / 时区偏移
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text("2025-01-01T10:30".to_string())),
            "2025-01-01 10:30:00"
        );
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text(" 2025-01-01T10:30:00-03:00 ".to_string())),
            "2025-01-01 10:30:00-03:00"
        );
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text("2025-01-01T10:30:15.250+0000".to_string())),
            "2025-01-01 10:30:15+0000"
        );
        // 其他文本仅 TRIM
        assert_eq!(
            cleaner.normalize_date(&CellValue::Text("  01/02/2025 ".to_string())),
            "01/02/2025"
        );
    }

    #[test]
    fn test_native_date_and_empty() {
        let cleaner = DataCleaner;
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(8, 0, 5)
            .unwrap();
        assert_eq!(
            cleaner.normalize_date(&CellValue::Date(dt)),
            "2024-02-29 08:00:05"
        );
        assert_eq!(cleaner.normalize_date(&CellValue::Empty), "");
        assert_eq!(cleaner.normalize_date(&CellValue::Text("  ".into())), "");
    }

    #[test]
    fn test_identifier_keeps_leading_zeros() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.normalize_identifier(&CellValue::Number(1234567890.0), Some(11)),
            "01234567890"
        );
        assert_eq!(
            cleaner.normalize_identifier(&CellValue::Number(11999990000.0), None),
            "11999990000"
        );
        assert_eq!(
            cleaner.normalize_identifier(&CellValue::Text(" 012.345 ".into()), Some(11)),
            "012.345"
        );
    }

    #[test]
    fn test_price_formats() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_price(&CellValue::Number(99.9)), Some(99.9));
        assert_eq!(
            cleaner.normalize_price(&CellValue::Text("R$ 1.234,56".into())),
            Some(1234.56)
        );
        assert_eq!(
            cleaner.normalize_price(&CellValue::Text("149.90".into())),
            Some(149.9)
        );
        assert_eq!(cleaner.normalize_price(&CellValue::Text("grátis".into())), None);
        assert_eq!(cleaner.normalize_price(&CellValue::Text("99,90".into())), Some(99.9));
        assert_eq!(cleaner.normalize_price(&CellValue::Empty), None);
    }

    #[test]
    fn test_price_decimal_separator_is_last_symbol() {
        // 巴西格式
        assert_eq!(parse_price_text("1.234,56"), Some(1234.56));
        assert_eq!(parse_price_text("R$ 1.234.567,89"), Some(1234567.89));
        // 英文格式
        assert_eq!(parse_price_text("1,234.56"), Some(1234.56));
        assert_eq!(parse_price_text("1,234,567.89"), Some(1234567.89));
        // 多个同类符号只能是千位分隔
        assert_eq!(parse_price_text("1.234.567"), Some(1234567.0));
        assert_eq!(parse_price_text("1234.567"), Some(1234.567));
        assert_eq!(parse_price_text("-10,5"), Some(-10.5));
    }

    #[test]
    fn test_price_ambiguous_or_malformed_is_rejected() {
        assert_eq!(parse_price_text("R$ 1.234"), None);
        assert_eq!(parse_price_text("1,234"), None);
        assert_eq!(parse_price_text("1.23.45"), None);
        assert_eq!(parse_price_text("12.34,5.6"), None);
        assert_eq!(parse_price_text("1,2345.6"), None);
        assert_eq!(parse_price_text("R$"), None);
    }
}
