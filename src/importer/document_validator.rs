// ==========================================
// 客户批量导入 - 证件号校验器
// ==========================================
// 职责: CPF (11 位自然人证件号) / CNPJ (14 位法人证件号) 校验位计算、校验与生成
// 算法: 加权模 11
// ==========================================

use rand::Rng;

pub const CPF_LENGTH: usize = 11;
pub const CNPJ_LENGTH: usize = 14;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// 去除非数字字符（"111.444.777-35" → "11144477735"）
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 证件号去格式: 只含数字与 ". - / 空格" 时返回纯数字, 否则原样（TRIM）返回交由校验拒绝
pub fn strip_document_punctuation(value: &str) -> String {
    let trimmed = value.trim();
    let only_formatting = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' '));
    if only_formatting {
        digits_only(trimmed)
    } else {
        trimmed.to_string()
    }
}

fn to_digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

// ==========================================
// CPF
// ==========================================

/// CPF 校验位: 11 - (Σ dᵢ·wᵢ mod 11)，≥10 记为 0
fn cpf_check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    let dv = 11 - sum % 11;
    if dv >= 10 {
        0
    } else {
        dv
    }
}

/// 校验 CPF（允许带格式符号）
pub fn is_valid_cpf(value: &str) -> bool {
    if value.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let digits = to_digits(value);
    if digits.len() != CPF_LENGTH || all_same(&digits) {
        return false;
    }
    cpf_check_digit(&digits[..9]) == digits[9] && cpf_check_digit(&digits[..10]) == digits[10]
}

/// 生成随机合法 CPF（仅数字）
pub fn generate_cpf() -> String {
    let mut rng = rand::thread_rng();
    let mut digits: Vec<u32> = loop {
        let base: Vec<u32> = (0..9).map(|_| rng.gen_range(0..10)).collect();
        if !all_same(&base) {
            break base;
        }
    };
    let first = cpf_check_digit(&digits);
    digits.push(first);
    let second = cpf_check_digit(&digits);
    digits.push(second);
    digits.iter().map(|d| char::from(b'0' + *d as u8)).collect()
}

/// 000.000.000-00
pub fn format_cpf(value: &str) -> String {
    let d = digits_only(value);
    if d.len() != CPF_LENGTH {
        return value.to_string();
    }
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}

// ==========================================
// CNPJ
// ==========================================

/// CNPJ 校验位: sum mod 11，<2 记为 0，否则 11 - 余数
fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 {
        0
    } else {
        11 - rest
    }
}

/// 校验 CNPJ（允许带格式符号）
pub fn is_valid_cnpj(value: &str) -> bool {
    if value.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let digits = to_digits(value);
    if digits.len() != CNPJ_LENGTH || all_same(&digits) {
        return false;
    }
    cnpj_check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS) == digits[12]
        && cnpj_check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS) == digits[13]
}

/// 生成随机合法 CNPJ（仅数字）
pub fn generate_cnpj() -> String {
    let mut rng = rand::thread_rng();
    let mut digits: Vec<u32> = loop {
        let base: Vec<u32> = (0..12).map(|_| rng.gen_range(0..10)).collect();
        if !all_same(&base) {
            break base;
        }
    };
    let first = cnpj_check_digit(&digits, &CNPJ_FIRST_WEIGHTS);
    digits.push(first);
    let second = cnpj_check_digit(&digits, &CNPJ_SECOND_WEIGHTS);
    digits.push(second);
    digits.iter().map(|d| char::from(b'0' + *d as u8)).collect()
}

/// 00.000.000/0000-00
pub fn format_cnpj(value: &str) -> String {
    let d = digits_only(value);
    if d.len() != CNPJ_LENGTH {
        return value.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    )
}
