// ==========================================
// 客户批量导入 - 列映射器实现
// ==========================================
// 职责: 逻辑字段 → 表格表头 解析 + 标准记录构建
// 解析顺序: 人工覆写 → 字段名本身 → 别名列表 → 未映射
// ==========================================

use crate::domain::record::{CellValue, ImportField, ImportRecord, RawRow};
use crate::importer::document_validator::{
    digits_only, strip_document_punctuation, CNPJ_LENGTH, CPF_LENGTH,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::ValueNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const POSTAL_CODE_LENGTH: usize = 8;

/// 逻辑字段的默认别名（按优先级）
pub fn default_aliases(field: ImportField) -> &'static [&'static str] {
    match field {
        ImportField::ResponsibleName => &[
            "Nome do Responsável",
            "Nome Responsável",
            "Responsável",
            "Nome",
            "Nome Completo",
            "Cliente",
        ],
        ImportField::Email => &["E-mail", "Email", "E-mail do Responsável", "Correio Eletrônico"],
        ImportField::Phone => &["Telefone", "Celular", "WhatsApp", "Fone", "Contato"],
        ImportField::Product => &["Produto", "Sistema", "Serviço"],
        ImportField::Plan => &["Plano", "Nome do Plano", "Pacote"],
        ImportField::PersonType => &["Tipo de Pessoa", "Tipo Pessoa", "Tipo", "PF/PJ"],
        ImportField::Price => &["Valor", "Preço", "Mensalidade", "Valor Pago"],
        ImportField::Status => &["Status", "Situação"],
        ImportField::StartDate => &["Data de Início", "Data Início", "Início", "Data Inicio"],
        ImportField::NextDueDate => &[
            "Data de Vencimento",
            "Próximo Vencimento",
            "Vencimento",
            "Data Vencimento",
        ],
        ImportField::CreatedAt => &["Data de Criação", "Data Criação", "Criado em", "Data Cadastro"],
        ImportField::Cpf => &["CPF", "CPF do Responsável"],
        ImportField::Cnpj => &["CNPJ", "CNPJ da Empresa"],
        ImportField::CompanyName => &["Razão Social", "Empresa", "Nome da Empresa"],
        ImportField::PostalCode => &["CEP", "Código Postal"],
        ImportField::Street => &["Endereço", "Logradouro", "Rua"],
        ImportField::Number => &["Número", "Nº", "Num"],
        ImportField::Complement => &["Complemento"],
        ImportField::District => &["Bairro"],
        ImportField::City => &["Cidade", "Município"],
        ImportField::State => &["Estado", "UF"],
        ImportField::PaymentMethod => &["Forma de Pagamento", "Pagamento", "Meio de Pagamento"],
    }
}

/// 表头比较键: TRIM + 小写
fn header_key(value: &str) -> String {
    value.trim().to_lowercase()
}

// ==========================================
// ColumnMapping - 人工覆写映射
// ==========================================
// 逻辑字段 → 表头; 选择文件时创建, 替换后必须重新派生全部记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    overrides: BTreeMap<ImportField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置覆写（空表头等同于移除）
    pub fn set(&mut self, field: ImportField, header: impl Into<String>) {
        let header = header.into();
        if header.trim().is_empty() {
            self.overrides.remove(&field);
        } else {
            self.overrides.insert(field, header);
        }
    }

    pub fn get(&self, field: ImportField) -> Option<&str> {
        self.overrides.get(&field).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// 从 "逻辑字段名 → 表头" 键值对构建
    pub fn from_pairs<I, K, V>(pairs: I) -> ImportResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut mapping = Self::new();
        for (key, header) in pairs {
            let field = ImportField::from_key(key.as_ref())
                .ok_or_else(|| ImportError::UnknownField(key.as_ref().to_string()))?;
            mapping.set(field, header);
        }
        Ok(mapping)
    }
}

// ==========================================
// ResolvedColumns - 解析后的列表（每个 (文件, 映射) 只解析一次）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    columns: BTreeMap<ImportField, Option<String>>,
    missing_overrides: BTreeMap<ImportField, String>, // 覆写的表头在文件中不存在
}

impl ResolvedColumns {
    /// 按 覆写 → 字段名 → 别名 顺序解析所有逻辑字段
    pub fn resolve(headers: &[String], mapping: &ColumnMapping) -> Self {
        let find_header = |candidate: &str| -> Option<String> {
            let key = header_key(candidate);
            headers.iter().find(|h| header_key(h) == key).cloned()
        };

        let mut columns = BTreeMap::new();
        let mut missing_overrides = BTreeMap::new();
        for &field in ImportField::ALL.iter() {
            let resolved = match mapping.get(field) {
                // 覆写优先; 表头不存在时视为未映射, 不再回退到别名
                Some(header) => {
                    let found = find_header(header);
                    if found.is_none() {
                        missing_overrides.insert(field, header.to_string());
                    }
                    found
                }
                None => find_header(field.key()).or_else(|| {
                    default_aliases(field)
                        .iter()
                        .find_map(|alias| find_header(*alias))
                }),
            };
            columns.insert(field, resolved);
        }

        Self {
            columns,
            missing_overrides,
        }
    }

    pub fn header_for(&self, field: ImportField) -> Option<&str> {
        self.columns.get(&field).and_then(|h| h.as_deref())
    }

    /// 未能映射的必填字段
    pub fn unmapped_required(&self) -> Vec<ImportField> {
        ImportField::ALL
            .iter()
            .copied()
            .filter(|f| f.is_required() && self.header_for(*f).is_none())
            .collect()
    }

    /// 文件中找不到的覆写表头
    pub fn missing_overrides(&self) -> &BTreeMap<ImportField, String> {
        &self.missing_overrides
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImportField, &Option<String>)> {
        self.columns.iter()
    }
}

// ==========================================
// RecordBuilder - RawRow → ImportRecord（纯函数, 全覆盖）
// ==========================================
pub struct RecordBuilder<'a> {
    columns: &'a ResolvedColumns,
    normalizer: &'a dyn ValueNormalizer,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(columns: &'a ResolvedColumns, normalizer: &'a dyn ValueNormalizer) -> Self {
        Self {
            columns,
            normalizer,
        }
    }

    fn cell<'r>(&self, row: &'r RawRow, field: ImportField) -> &'r CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.columns
            .header_for(field)
            .and_then(|h| row.get(h))
            .unwrap_or(&EMPTY)
    }

    fn text(&self, row: &RawRow, field: ImportField) -> String {
        self.normalizer.normalize_text(self.cell(row, field))
    }

    fn date(&self, row: &RawRow, field: ImportField) -> String {
        self.normalizer.normalize_date(self.cell(row, field))
    }

    /// 证件字段: 数字单元格补零, 文本去掉格式符号（含字母时保留原文）
    fn document(&self, row: &RawRow, field: ImportField, width: usize) -> String {
        strip_document_punctuation(
            &self
                .normalizer
                .normalize_identifier(self.cell(row, field), Some(width)),
        )
    }

    /// 电话/CEP: 只保留数字
    fn digits(&self, row: &RawRow, field: ImportField, width: Option<usize>) -> String {
        digits_only(
            &self
                .normalizer
                .normalize_identifier(self.cell(row, field), width),
        )
    }

    pub fn build(&self, row_index: usize, row: &RawRow) -> ImportRecord {
        ImportRecord {
            row_index,
            responsible_name: self.text(row, ImportField::ResponsibleName),
            email: self.text(row, ImportField::Email),
            phone: self.digits(row, ImportField::Phone, None),
            product: self.text(row, ImportField::Product),
            plan: self.text(row, ImportField::Plan),
            person_type: self.text(row, ImportField::PersonType),
            price: self
                .normalizer
                .normalize_price(self.cell(row, ImportField::Price)),
            status: self.text(row, ImportField::Status),
            start_date: self.date(row, ImportField::StartDate),
            next_due_date: self.date(row, ImportField::NextDueDate),
            created_at: self.date(row, ImportField::CreatedAt),
            cpf: self.document(row, ImportField::Cpf, CPF_LENGTH),
            cnpj: self.document(row, ImportField::Cnpj, CNPJ_LENGTH),
            company_name: self.text(row, ImportField::CompanyName),
            postal_code: self.digits(row, ImportField::PostalCode, Some(POSTAL_CODE_LENGTH)),
            street: self.text(row, ImportField::Street),
            number: self.text(row, ImportField::Number),
            complement: self.text(row, ImportField::Complement),
            district: self.text(row, ImportField::District),
            city: self.text(row, ImportField::City),
            state: self.text(row, ImportField::State),
            payment_method: self.text(row, ImportField::PaymentMethod),
        }
    }

    /// 按文件顺序派生全部记录
    pub fn build_all(&self, rows: &[RawRow]) -> Vec<ImportRecord> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.build(idx, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::data_cleaner::DataCleaner;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        RawRow::new(
            pairs
                .iter()
                .map(|(h, v)| (h.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_resolve_field_name_before_alias() {
        let hs = headers(&["Email", "email", "Nome"]);
        let resolved = ResolvedColumns::resolve(&hs, &ColumnMapping::new());

        // "email" 是逻辑字段名本身, 大小写不敏感时第一列即命中
        assert_eq!(resolved.header_for(ImportField::Email), Some("Email"));
        assert_eq!(
            resolved.header_for(ImportField::ResponsibleName),
            Some("Nome")
        );
        assert_eq!(resolved.header_for(ImportField::Cnpj), None);
    }

    #[test]
    fn test_resolve_alias_order() {
        let hs = headers(&["Cliente", "Responsável"]);
        let resolved = ResolvedColumns::resolve(&hs, &ColumnMapping::new());
        assert_eq!(
            resolved.header_for(ImportField::ResponsibleName),
            Some("Responsável")
        );
    }

    #[test]
    fn test_override_wins() {
        let hs = headers(&["E-mail", "Email Financeiro"]);
        let mut mapping = ColumnMapping::new();
        mapping.set(ImportField::Email, "Email Financeiro");

        let resolved = ResolvedColumns::resolve(&hs, &mapping);
        assert_eq!(
            resolved.header_for(ImportField::Email),
            Some("Email Financeiro")
        );
    }

    #[test]
    fn test_override_with_missing_header_is_unmapped() {
        let hs = headers(&["Nome", "E-mail", "Telefone", "Produto", "Plano", "Tipo"]);
        let mut mapping = ColumnMapping::new();
        mapping.set(ImportField::Email, "Email Financeiro");

        let resolved = ResolvedColumns::resolve(&hs, &mapping);

        // 不回退到 "E-mail"
        assert_eq!(resolved.header_for(ImportField::Email), None);
        assert_eq!(resolved.unmapped_required(), vec![ImportField::Email]);
        assert_eq!(
            resolved.missing_overrides().get(&ImportField::Email).map(String::as_str),
            Some("Email Financeiro")
        );
    }

    #[test]
    fn test_document_with_letters_kept_for_validation() {
        let hs = headers(&["CPF", "CNPJ"]);
        let resolved = ResolvedColumns::resolve(&hs, &ColumnMapping::new());
        let cleaner = DataCleaner;
        let builder = RecordBuilder::new(&resolved, &cleaner);

        let record = builder.build(
            0,
            &row(&[
                ("CPF", CellValue::Text("CPF 111.444.777-35".into())),
                ("CNPJ", CellValue::Text(" 11.222.333/0001-81 ".into())),
            ]),
        );

        assert_eq!(record.cpf, "CPF 111.444.777-35");
        assert_eq!(record.cnpj, "11222333000181");
    }

    #[test]
    fn test_unmapped_required() {
        let hs = headers(&["Nome", "E-mail", "Telefone", "Produto", "Plano"]);
        let resolved = ResolvedColumns::resolve(&hs, &ColumnMapping::new());
        assert_eq!(resolved.unmapped_required(), vec![ImportField::PersonType]);
    }

    #[test]
    fn test_from_pairs_rejects_unknown_field() {
        let result = ColumnMapping::from_pairs([("sobrenome", "Sobrenome")]);
        assert!(matches!(result, Err(ImportError::UnknownField(_))));

        let mapping = ColumnMapping::from_pairs([("email", "Mail")]).unwrap();
        assert_eq!(mapping.get(ImportField::Email), Some("Mail"));
    }

    #[test]
    fn test_build_record_normalizes_fields() {
        let hs = headers(&["Nome", "E-mail", "Telefone", "CPF", "CEP", "Vencimento", "Valor"]);
        let resolved = ResolvedColumns::resolve(&hs, &ColumnMapping::new());
        let cleaner = DataCleaner;
        let builder = RecordBuilder::new(&resolved, &cleaner);

        let record = builder.build(
            4,
            &row(&[
                ("Nome", CellValue::Text("  Ana Souza ".into())),
                ("E-mail", CellValue::Text("ana@x.com".into())),
                ("Telefone", CellValue::Text("(11) 99999-0000".into())),
                ("CPF", CellValue::Number(1234567890.0)),
                ("CEP", CellValue::Text("01310-100".into())),
                ("Vencimento", CellValue::Number(45658.0)),
                ("Valor", CellValue::Text("R$ 99,90".into())),
            ]),
        );

        assert_eq!(record.row_index, 4);
        assert_eq!(record.responsible_name, "Ana Souza");
        assert_eq!(record.phone, "11999990000");
        assert_eq!(record.cpf, "01234567890");
        assert_eq!(record.postal_code, "01310100");
        assert_eq!(record.next_due_date, "2025-01-01 00:00:00");
        assert_eq!(record.price, Some(99.9));
        // 未映射字段为空串
        assert_eq!(record.cnpj, "");
        assert_eq!(record.city, "");
    }
}
