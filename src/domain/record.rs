// ==========================================
// 客户批量导入 - 记录领域模型
// ==========================================
// 职责: 原始行 (RawRow) / 逻辑字段 (ImportField) / 标准记录 (ImportRecord)
// 用途: 导入层生成, 引擎层与报表层只读
// ==========================================

use crate::domain::types::PersonType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

// ==========================================
// RawRow - 原始行（表头 → 单元格值，保持列顺序）
// ==========================================
// 读取后不可变
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// 按表头取值（同名列取第一列）
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    /// 整行是否为空白
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

// ==========================================
// ImportField - 逻辑字段
// ==========================================
// key() 即逻辑字段名, 同时作为默认表头候选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportField {
    ResponsibleName, // 负责人姓名（必填）
    Email,           // 邮箱（必填）
    Phone,           // 电话（必填）
    Product,         // 产品（必填）
    Plan,            // 套餐（必填）
    PersonType,      // 人员类型（必填）
    Price,           // 价格
    Status,          // 状态
    StartDate,       // 开始日期
    NextDueDate,     // 下次到期日
    CreatedAt,       // 创建日期
    Cpf,             // 自然人证件号
    Cnpj,            // 法人证件号
    CompanyName,     // 公司名称
    PostalCode,      // 邮编
    Street,          // 街道
    Number,          // 门牌号
    Complement,      // 补充地址
    District,        // 街区
    City,            // 城市
    State,           // 州
    PaymentMethod,   // 付款方式
}

impl ImportField {
    pub const ALL: [ImportField; 22] = [
        ImportField::ResponsibleName,
        ImportField::Email,
        ImportField::Phone,
        ImportField::Product,
        ImportField::Plan,
        ImportField::PersonType,
        ImportField::Price,
        ImportField::Status,
        ImportField::StartDate,
        ImportField::NextDueDate,
        ImportField::CreatedAt,
        ImportField::Cpf,
        ImportField::Cnpj,
        ImportField::CompanyName,
        ImportField::PostalCode,
        ImportField::Street,
        ImportField::Number,
        ImportField::Complement,
        ImportField::District,
        ImportField::City,
        ImportField::State,
        ImportField::PaymentMethod,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ImportField::ResponsibleName => "nome_responsavel",
            ImportField::Email => "email",
            ImportField::Phone => "telefone",
            ImportField::Product => "produto",
            ImportField::Plan => "plano",
            ImportField::PersonType => "tipo_pessoa",
            ImportField::Price => "valor",
            ImportField::Status => "status",
            ImportField::StartDate => "data_inicio",
            ImportField::NextDueDate => "data_vencimento",
            ImportField::CreatedAt => "data_criacao",
            ImportField::Cpf => "cpf",
            ImportField::Cnpj => "cnpj",
            ImportField::CompanyName => "razao_social",
            ImportField::PostalCode => "cep",
            ImportField::Street => "endereco",
            ImportField::Number => "numero",
            ImportField::Complement => "complemento",
            ImportField::District => "bairro",
            ImportField::City => "cidade",
            ImportField::State => "estado",
            ImportField::PaymentMethod => "forma_pagamento",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// 必填字段
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            ImportField::ResponsibleName
                | ImportField::Email
                | ImportField::Phone
                | ImportField::Product
                | ImportField::Plan
                | ImportField::PersonType
        )
    }

    /// 证件类字段: 始终按文本读取, 防止前导零丢失
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            ImportField::Cpf | ImportField::Cnpj | ImportField::PostalCode | ImportField::Phone
        )
    }

    /// 日期字段
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            ImportField::StartDate | ImportField::NextDueDate | ImportField::CreatedAt
        )
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// ImportRecord - 标准化客户记录
// ==========================================
// 由 RawRow + 列映射确定性派生; row_index 与文件中的位置一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub row_index: usize, // 数据行序号（从 0 开始，不含表头）

    // ===== 必填信息 =====
    pub responsible_name: String,
    pub email: String,
    pub phone: String,
    pub product: String,
    pub plan: String,
    pub person_type: String, // 原样保留，由校验器判定合法性

    // ===== 商务信息 =====
    pub price: Option<f64>,
    pub status: String,
    pub start_date: String,    // YYYY-MM-DD HH:MM:SS 或空
    pub next_due_date: String, // YYYY-MM-DD HH:MM:SS 或空
    pub created_at: String,    // YYYY-MM-DD HH:MM:SS 或空

    // ===== 证件（仅数字）=====
    pub cpf: String,
    pub cnpj: String,
    pub company_name: String,

    // ===== 地址 =====
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,

    pub payment_method: String,
}

impl ImportRecord {
    /// 解析后的人员类型
    pub fn parsed_person_type(&self) -> Option<PersonType> {
        PersonType::parse(&self.person_type)
    }

    /// 读取逻辑字段的文本值（价格保留两位小数）
    pub fn field_text(&self, field: ImportField) -> String {
        match field {
            ImportField::ResponsibleName => self.responsible_name.clone(),
            ImportField::Email => self.email.clone(),
            ImportField::Phone => self.phone.clone(),
            ImportField::Product => self.product.clone(),
            ImportField::Plan => self.plan.clone(),
            ImportField::PersonType => self.person_type.clone(),
            ImportField::Price => self
                .price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_default(),
            ImportField::Status => self.status.clone(),
            ImportField::StartDate => self.start_date.clone(),
            ImportField::NextDueDate => self.next_due_date.clone(),
            ImportField::CreatedAt => self.created_at.clone(),
            ImportField::Cpf => self.cpf.clone(),
            ImportField::Cnpj => self.cnpj.clone(),
            ImportField::CompanyName => self.company_name.clone(),
            ImportField::PostalCode => self.postal_code.clone(),
            ImportField::Street => self.street.clone(),
            ImportField::Number => self.number.clone(),
            ImportField::Complement => self.complement.clone(),
            ImportField::District => self.district.clone(),
            ImportField::City => self.city.clone(),
            ImportField::State => self.state.clone(),
            ImportField::PaymentMethod => self.payment_method.clone(),
        }
    }
}
