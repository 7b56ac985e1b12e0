//! Column projection: reduce a record to the fields a caller may read.
//! Hidden fields are dropped from the object entirely, never nulled out.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::security::ReadableColumns;

/// Keep exactly the keys of `record` that are in `allowed`. Never adds keys.
pub fn project_map(record: &Map<String, Value>, allowed: &ReadableColumns) -> Map<String, Value> {
    record
        .iter()
        .filter(|(k, _)| allowed.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Serialize `record` and project it. Records that do not serialize to an object yield an empty object.
pub fn project<T: Serialize>(record: &T, allowed: &ReadableColumns) -> serde_json::Result<Value> {
    let full = serde_json::to_value(record)?;
    Ok(match full {
        Value::Object(map) => Value::Object(project_map(&map, allowed)),
        _ => Value::Object(Map::new()),
    })
}

/// Project each element with the same allowed set.
pub fn project_all<T: Serialize>(records: &[T], allowed: &ReadableColumns) -> serde_json::Result<Vec<Value>> {
    records.iter().map(|r| project(r, allowed)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Row { id: i64, name: String, budget: Option<f64> }

    fn allowed(cols: &[&str]) -> ReadableColumns { cols.iter().copied().collect() }

    #[test]
    fn hidden_keys_are_absent_not_null() {
        let row = Row { id: 1, name: "Summer".into(), budget: Some(5.0) };
        let out = project(&row, &allowed(&["id", "name"])).unwrap();
        assert_eq!(out, json!({"id": 1, "name": "Summer"}));
        assert!(out.get("budget").is_none());
        assert!(!serde_json::to_string(&out).unwrap().contains("budget"));
    }

    #[test]
    fn allowed_keys_missing_from_record_are_not_invented() {
        let row = Row { id: 1, name: "x".into(), budget: None };
        let out = project(&row, &allowed(&["id", "owner", "secret"])).unwrap();
        assert_eq!(out, json!({"id": 1}));
    }

    #[test]
    fn empty_set_hides_everything() {
        let row = Row { id: 1, name: "x".into(), budget: None };
        assert_eq!(project(&row, &ReadableColumns::default()).unwrap(), json!({}));
    }

    #[test]
    fn null_fields_stay_when_allowed() {
        let row = Row { id: 1, name: "x".into(), budget: None };
        let out = project(&row, &allowed(&["budget"])).unwrap();
        assert_eq!(out, json!({"budget": null}));
    }

    #[test]
    fn collection_uses_same_rule_per_element_and_source_is_untouched() {
        let rows = vec![
            Row { id: 1, name: "a".into(), budget: Some(1.0) },
            Row { id: 2, name: "b".into(), budget: Some(2.0) },
        ];
        let set = allowed(&["name"]);
        let out = project_all(&rows, &set).unwrap();
        assert_eq!(out, vec![json!({"name": "a"}), json!({"name": "b"})]);
        assert_eq!(rows[1].budget, Some(2.0));

        let source = json!({"id": 9, "budget": 3}).as_object().cloned().unwrap();
        let projected = project_map(&source, &set);
        assert!(projected.is_empty());
        assert_eq!(source.len(), 2);
    }
}
