// ==========================================
// 客户批量导入 - 记录校验器实现
// ==========================================
// 职责: 必填字段 / 邮箱格式 / 人员类型 / 证件校验位
// 规则: 累积所有错误, 不短路; 无副作用, 不依赖作业状态
// ==========================================

use crate::domain::job::ValidationOutcome;
use crate::domain::record::ImportRecord;
use crate::domain::types::PersonType;
use crate::importer::document_validator::{is_valid_cnpj, is_valid_cpf};
use crate::importer::importer_trait::RecordValidator as RecordValidatorTrait;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// 邮箱形态校验（local@domain.tld）
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

pub struct RecordValidator;

impl RecordValidator {
    /// 批量校验, 按记录序号登记错误
    pub fn validate_all(&self, records: &[ImportRecord]) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        for (idx, record) in records.iter().enumerate() {
            outcome.insert(idx, self.validate(record));
        }
        outcome
    }
}

impl RecordValidatorTrait for RecordValidator {
    fn validate(&self, record: &ImportRecord) -> Vec<String> {
        let mut errors = Vec::new();

        // ===== 必填字段 =====
        let required = [
            (&record.responsible_name, "Nome do responsável é obrigatório"),
            (&record.email, "Email é obrigatório"),
            (&record.phone, "Telefone é obrigatório"),
            (&record.product, "Produto é obrigatório"),
            (&record.plan, "Plano é obrigatório"),
            (&record.person_type, "Tipo de pessoa é obrigatório"),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                errors.push(message.to_string());
            }
        }

        // ===== 格式 =====
        if !record.email.trim().is_empty() && !is_valid_email(&record.email) {
            errors.push(format!("Email inválido: {}", record.email.trim()));
        }

        if !record.person_type.trim().is_empty() && record.parsed_person_type().is_none() {
            errors.push(format!(
                "Tipo de pessoa inválido: {} (use {})",
                record.person_type.trim(),
                PersonType::ACCEPTED_TOKENS.join(", ")
            ));
        }

        // ===== 证件校验位（可选字段, 有值才校验）=====
        if !record.cpf.is_empty() && !is_valid_cpf(&record.cpf) {
            errors.push(format!("CPF inválido: {}", record.cpf));
        }
        if !record.cnpj.is_empty() && !is_valid_cnpj(&record.cnpj) {
            errors.push(format!("CNPJ inválido: {}", record.cnpj));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record() -> ImportRecord {
        ImportRecord {
            responsible_name: "Ana Souza".to_string(),
            email: "ana@clinica.com.br".to_string(),
            phone: "11999990000".to_string(),
            product: "Agenda".to_string(),
            plan: "Mensal".to_string(),
            person_type: "PF".to_string(),
            cpf: "11144477735".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record_has_no_errors() {
        let validator = RecordValidator;
        assert!(validator.validate(&create_test_record()).is_empty());
    }

    #[test]
    fn test_missing_email_is_reported() {
        let validator = RecordValidator;
        let mut record = create_test_record();
        record.email = String::new();

        let errors = validator.validate(&record);
        assert_eq!(errors, vec!["Email é obrigatório".to_string()]);
    }

    #[test]
    fn test_errors_accumulate_in_order() {
        let validator = RecordValidator;
        let record = ImportRecord {
            email: "sem-arroba".to_string(),
            person_type: "empresa".to_string(),
            cpf: "11144477736".to_string(),
            ..Default::default()
        };

        let errors = validator.validate(&record);
        assert_eq!(errors[0], "Nome do responsável é obrigatório");
        assert_eq!(errors[1], "Telefone é obrigatório");
        assert_eq!(errors[2], "Produto é obrigatório");
        assert_eq!(errors[3], "Plano é obrigatório");
        assert!(errors[4].starts_with("Email inválido"));
        assert!(errors[5].starts_with("Tipo de pessoa inválido"));
        assert!(errors[6].starts_with("CPF inválido"));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_person_type_case_folding() {
        let validator = RecordValidator;
        for token in ["pessoa jurídica", "PESSOA FÍSICA", "pj", "Pf"] {
            let mut record = create_test_record();
            record.person_type = token.to_string();
            assert!(validator.validate(&record).is_empty(), "token {}", token);
        }
    }

    #[test]
    fn test_invalid_cnpj_reported() {
        let validator = RecordValidator;
        let mut record = create_test_record();
        record.cnpj = "11222333000182".to_string();
        let errors = validator.validate(&record);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("CNPJ inválido"));
    }

    #[test]
    fn test_validate_all_indexes_by_position() {
        let validator = RecordValidator;
        let mut bad = create_test_record();
        bad.phone = String::new();
        let outcome = validator.validate_all(&[create_test_record(), bad]);

        assert!(outcome.is_valid(0));
        assert_eq!(
            outcome.errors_for(1),
            Some(&["Telefone é obrigatório".to_string()][..])
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
    }
}
