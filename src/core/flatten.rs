use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type FlatRecord = BTreeMap<String, Value>;

/// 把巢狀物件攤平成 `a.b.c` 的單層 key；陣列不展開，當成一個值
pub fn flatten(data: &Map<String, Value>) -> FlatRecord {
    let mut out = FlatRecord::new();
    flatten_into(data, "", &mut out);
    out
}

/// `null` 或非物件的輸入得到空結果
pub fn flatten_value(value: &Value) -> FlatRecord {
    match value {
        Value::Object(map) => flatten(map),
        _ => FlatRecord::new(),
    }
}

fn flatten_into(data: &Map<String, Value>, prefix: &str, out: &mut FlatRecord) {
    for (key, value) in data {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => flatten_into(nested, &path, out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}
