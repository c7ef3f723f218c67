// ==========================================
// 客户批量导入 - 导入会话
// ==========================================
// 职责: 持有已打开文件的表头/原始行/列映射/标准记录/校验结果
// 流程: 解析(一次) → 列解析 → 记录派生 → 校验 → 合法/不合法分区
// 映射变更时整体重新派生, 保证同一 (文件, 映射) 结果确定
// ==========================================

use crate::domain::job::ValidationOutcome;
use crate::domain::record::{ImportField, ImportRecord, RawRow};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnMapping, RecordBuilder, ResolvedColumns};
use crate::importer::file_parser::{ParsedSheet, UniversalSpreadsheetReader};
use crate::importer::importer_trait::{RecordValidator, SpreadsheetReader, ValueNormalizer};
use crate::importer::record_validator::RecordValidator as RecordValidatorImpl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

/// 导入预览（UI 展示用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub file_name: String,
    pub total_rows: usize,
    pub valid: usize,
    pub invalid: usize,
    pub outcome: ValidationOutcome,
    pub unmapped_required: Vec<ImportField>,
    /// 人工覆写指定、但文件中不存在的表头
    pub missing_overrides: BTreeMap<ImportField, String>,
}

pub struct ImportSession {
    file_name: String,
    sheet: ParsedSheet,
    mapping: ColumnMapping,
    columns: ResolvedColumns,
    records: Vec<ImportRecord>,
    outcome: ValidationOutcome,

    normalizer: Box<dyn ValueNormalizer>,
    validator: Box<dyn RecordValidator>,
}

impl ImportSession {
    /// 使用默认组件打开文件
    pub fn open(file_name: &str, bytes: &[u8]) -> ImportResult<Self> {
        Self::open_with(
            file_name,
            bytes,
            &UniversalSpreadsheetReader,
            Box::new(DataCleaner),
            Box::new(RecordValidatorImpl),
        )
    }

    /// 打开文件（组件可注入）
    ///
    /// # 返回
    /// - Err(FileParseError): 文件无法解码, 此时不会处理任何记录
    #[instrument(skip(bytes, reader, normalizer, validator), fields(size = bytes.len()))]
    pub fn open_with(
        file_name: &str,
        bytes: &[u8],
        reader: &dyn SpreadsheetReader,
        normalizer: Box<dyn ValueNormalizer>,
        validator: Box<dyn RecordValidator>,
    ) -> ImportResult<Self> {
        let sheet = reader.read(file_name, bytes).map_err(|e| {
            error!(file = %file_name, error = %e, "文件解析失败");
            e
        })?;
        info!(
            file = %file_name,
            headers = sheet.headers().len(),
            rows = sheet.rows().len(),
            "文件解析完成"
        );

        let mut session = Self {
            file_name: file_name.to_string(),
            sheet,
            mapping: ColumnMapping::new(),
            columns: ResolvedColumns::resolve(&[], &ColumnMapping::new()),
            records: Vec::new(),
            outcome: ValidationOutcome::new(),
            normalizer,
            validator,
        };
        session.rederive();
        Ok(session)
    }

    /// 替换列映射并重新派生全部记录
    pub fn set_mapping(&mut self, mapping: ColumnMapping) {
        self.mapping = mapping;
        self.rederive();
    }

    fn rederive(&mut self) {
        self.columns = ResolvedColumns::resolve(self.sheet.headers(), &self.mapping);
        for (field, header) in self.columns.missing_overrides() {
            warn!(field = %field.key(), header = %header, "覆写的表头在文件中不存在");
        }
        self.records =
            RecordBuilder::new(&self.columns, self.normalizer.as_ref()).build_all(self.sheet.rows());

        let mut outcome = ValidationOutcome::new();
        for record in &self.records {
            outcome.insert(record.row_index, self.validator.validate(record));
        }
        self.outcome = outcome;

        info!(
            records = self.records.len(),
            invalid = self.outcome.invalid_count(),
            "记录派生与校验完成"
        );
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn headers(&self) -> &[String] {
        self.sheet.headers()
    }

    pub fn rows(&self) -> &[RawRow] {
        self.sheet.rows()
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    pub fn outcome(&self) -> &ValidationOutcome {
        &self.outcome
    }

    /// 合法记录（保持文件顺序）
    pub fn valid_records(&self) -> Vec<ImportRecord> {
        self.records
            .iter()
            .filter(|r| self.outcome.is_valid(r.row_index))
            .cloned()
            .collect()
    }

    /// 不合法记录及其错误
    pub fn invalid_records(&self) -> Vec<(&ImportRecord, &[String])> {
        self.records
            .iter()
            .filter_map(|r| self.outcome.errors_for(r.row_index).map(|e| (r, e)))
            .collect()
    }

    pub fn preview(&self) -> ImportPreview {
        let invalid = self.outcome.invalid_count();
        ImportPreview {
            file_name: self.file_name.clone(),
            total_rows: self.records.len(),
            valid: self.records.len() - invalid,
            invalid,
            outcome: self.outcome.clone(),
            unmapped_required: self.columns.unmapped_required(),
            missing_overrides: self.columns.missing_overrides().clone(),
        }
    }
}
