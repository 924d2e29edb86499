use crate::utils::error::{ReportError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 後端回傳的原始記錄，沒有固定 schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data }
    }

    /// 把 API 回應轉成記錄，一個元素一筆；null 或純量元素視為空記錄
    pub fn from_values(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::Object(data) => Record { data },
                _ => Record::default(),
            })
            .collect()
    }
}

/// A single scalar cell after normalization. Nested objects never reach this
/// type; arrays are kept as opaque display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Opaque(String),
}

impl CellValue {
    /// `null` 與空字串視為缺值
    pub fn from_json(value: &serde_json::Value) -> Option<CellValue> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(CellValue::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(CellValue::Bool(*b)),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            serde_json::Value::Array(items) => Some(CellValue::Opaque(join_array(items))),
            serde_json::Value::Object(_) => Some(CellValue::Opaque(value.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Unformatted text used by the free-text search.
    pub fn raw_text(&self) -> String {
        match self {
            CellValue::Text(s) | CellValue::Opaque(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

fn join_array(items: &[serde_json::Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// 正規化後的資料列：固定欄位 + 未被別名表涵蓋的額外欄位
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRow {
    pub(crate) fields: BTreeMap<String, CellValue>,
    pub(crate) extras: BTreeMap<String, CellValue>,
}

impl CanonicalRow {
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key).or_else(|| self.extras.get(key))
    }

    pub fn extra_keys(&self) -> impl Iterator<Item = &str> {
        self.extras.keys().map(String::as_str)
    }

    /// Every present value, fixed fields first.
    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.fields.values().chain(self.extras.values())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.extras.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// 使用者輸入的日期區間 (YYYY-MM-DD)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
        Self::new(parse_input_date("from", from)?, parse_input_date("to", to)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if to < from {
                return Err(ReportError::ValidationError {
                    message: "\"To\" must be on/after \"From\".".to_string(),
                });
            }
        }
        Ok(())
    }

    /// 兩端都有值時才做本地端過濾
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.from.zip(self.to)
    }

    pub fn from_param(&self) -> String {
        self.from.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
    }

    pub fn to_param(&self) -> String {
        self.to.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
    }
}

fn parse_input_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d").map(Some).map_err(|e| {
            ReportError::ValidationError {
                message: format!("Invalid {} date '{}': {}", field, v, e),
            }
        }),
    }
}

/// 無時區字串要用哪個時區解讀，顯示也用同一個時區
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timezone {
    #[default]
    Local,
    Utc,
}

impl std::str::FromStr for Timezone {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Timezone::Local),
            "utc" => Ok(Timezone::Utc),
            other => Err(ReportError::InvalidConfigValueError {
                field: "report.timezone".to_string(),
                value: other.to_string(),
                reason: "Expected \"local\" or \"utc\"".to_string(),
            }),
        }
    }
}

/// Everything an export needs besides rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub generated_at: NaiveDateTime,
    pub range: DateRange,
    pub selected_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}
