use crate::domain::model::{CanonicalRow, ColumnDescriptor};
use crate::domain::schema::{ExtraColumns, ReportSchema};
use std::collections::HashSet;

/// `call_type` -> `Call type`, `billSec` -> `Bill Sec`
pub fn title_case(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if let Some(p) = prev {
            if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                spaced.push(' ');
            }
        }
        spaced.push(c);
        prev = Some(c);
    }

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn fixed_columns(schema: &ReportSchema) -> Vec<ColumnDescriptor> {
    schema
        .fields
        .iter()
        .map(|f| ColumnDescriptor::new(f.key, f.label))
        .collect()
}

/// Fixed columns first, then every extra key seen in the rows, in first-seen
/// order.
pub fn resolve_columns(schema: &ReportSchema, rows: &[CanonicalRow]) -> Vec<ColumnDescriptor> {
    let mut columns = fixed_columns(schema);
    let mut seen: HashSet<&str> = schema.fields.iter().map(|f| f.key).collect();

    for row in rows {
        for key in row.extra_keys() {
            if !seen.insert(key) {
                continue;
            }
            let label = match schema.extras {
                ExtraColumns::KeyContains(_) => key.to_string(),
                _ => title_case(key),
            };
            columns.push(ColumnDescriptor::new(key, label));
        }
    }

    columns
}

/// 空的選擇代表全部顯示
pub fn active_columns(all: &[ColumnDescriptor], selected: &[String]) -> Vec<ColumnDescriptor> {
    if selected.is_empty() {
        return all.to_vec();
    }
    all.iter()
        .filter(|c| selected.iter().any(|s| s == &c.key))
        .cloned()
        .collect()
}
