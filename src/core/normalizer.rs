use crate::core::flatten::{flatten, FlatRecord};
use crate::domain::model::{CanonicalRow, CellValue, Record};
use crate::domain::schema::ReportSchema;

/// 依別名順序取第一個非 null、非空字串的值
pub fn pick_first<'a>(record: &'a FlatRecord, aliases: &[&str]) -> Option<&'a serde_json::Value> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find(|value| CellValue::from_json(value).is_some())
}

/// Produces exactly one canonical row for a flat record. The input is never
/// mutated and the same input always yields the same row.
pub fn normalize_row(schema: &ReportSchema, record: &FlatRecord) -> CanonicalRow {
    let mut row = CanonicalRow::default();

    for field in schema.fields {
        if let Some(value) = pick_first(record, field.aliases).and_then(CellValue::from_json) {
            row.fields.insert(field.key.to_string(), value);
        }
    }

    for (key, value) in record {
        if !schema.keeps_extra(key) {
            continue;
        }
        if let Some(value) = CellValue::from_json(value) {
            row.extras.insert(key.clone(), value);
        }
    }

    row
}

pub fn normalize_records(schema: &ReportSchema, records: &[Record]) -> Vec<CanonicalRow> {
    let rows: Vec<CanonicalRow> = records
        .iter()
        .map(|record| normalize_row(schema, &flatten(&record.data)))
        .collect();
    tracing::debug!("🔄 {}: normalized {} records", schema.name, rows.len());
    rows
}
