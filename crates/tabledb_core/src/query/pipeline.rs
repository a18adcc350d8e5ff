//! The sort → skip → limit → projection pipeline.

use crate::query::options::{QueryOptions, SortOrder};
use serde_json::Value;
use std::cmp::Ordering;
use tabledb_storage::Record;

/// Runs `options` over an already filtered result set.
///
/// Sorting is stable, so records that compare equal on every key keep their
/// table order.
#[must_use]
pub fn apply(mut records: Vec<Record>, options: &QueryOptions) -> Vec<Record> {
    if !options.sort.is_empty() {
        records.sort_by(|a, b| compare_records(a, b, &options.sort));
    }

    let skip = options.skip.unwrap_or(0);
    let limit = options.limit.unwrap_or(usize::MAX);
    let page = records.into_iter().skip(skip).take(limit);

    match &options.projection {
        Some(fields) => page.map(|record| project(&record, fields)).collect(),
        None => page.collect(),
    }
}

/// Compares two records key by key; the first key that differs decides.
#[must_use]
pub fn compare_records(a: &Record, b: &Record, keys: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in keys {
        let ordering = compare_values(a.get(field), b.get(field));
        if ordering != Ordering::Equal {
            return order.apply(ordering);
        }
    }
    Ordering::Equal
}

/// Natural order of field values.
///
/// Values of different kinds order by kind: absent, null, booleans,
/// numbers, strings, arrays, objects. Within a kind: `false < true`,
/// numeric order, code-point order for strings, element-wise for arrays.
/// Objects have no natural order and compare equal.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) | (Value::Object(_), Value::Object(_)) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x.cmp(&y)
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x.cmp(&y)
            } else {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (x, y) in x.iter().zip(y) {
                let ordering = compare_present(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Builds a record holding only `fields`, in that order.
///
/// Fields missing from the source record are left out.
#[must_use]
pub fn project(record: &Record, fields: &[String]) -> Record {
    fields
        .iter()
        .filter_map(|field| record.get(field).map(|v| (field.clone(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn field_values(records: &[Record], field: &str) -> Vec<Value> {
        records
            .iter()
            .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn sort_skip_limit_in_order() {
        let input = records(json!([{"a": 3}, {"a": 1}, {"a": 2}]));
        let options = QueryOptions::new().asc("a").skip(1).limit(1);

        let out = apply(input, &options);
        assert_eq!(out, records(json!([{"a": 2}])));
    }

    #[test]
    fn no_options_keeps_input() {
        let input = records(json!([{"a": 3}, {"a": 1}]));
        assert_eq!(apply(input.clone(), &QueryOptions::new()), input);
    }

    #[test]
    fn descending_sort() {
        let input = records(json!([{"a": 1}, {"a": 3}, {"a": 2}]));
        let out = apply(input, &QueryOptions::new().desc("a"));
        assert_eq!(field_values(&out, "a"), vec![json!(3), json!(2), json!(1)]);
    }

    #[test]
    fn later_keys_break_ties_only() {
        let input = records(json!([
            {"age": 30, "name": "b"},
            {"age": 20, "name": "z"},
            {"age": 30, "name": "a"}
        ]));
        let out = apply(input, &QueryOptions::new().desc("age").asc("name"));
        assert_eq!(
            field_values(&out, "name"),
            vec![json!("a"), json!("b"), json!("z")]
        );
    }

    #[test]
    fn full_ties_keep_table_order() {
        let input = records(json!([
            {"k": 1, "n": 1},
            {"k": 0, "n": 2},
            {"k": 1, "n": 3},
            {"k": 0, "n": 4}
        ]));
        let out = apply(input, &QueryOptions::new().asc("k"));
        assert_eq!(
            field_values(&out, "n"),
            vec![json!(2), json!(4), json!(1), json!(3)]
        );
    }

    #[test]
    fn absent_values_sort_first() {
        let input = records(json!([{"a": 1}, {}, {"a": null}]));
        let out = apply(input, &QueryOptions::new().asc("a"));
        assert_eq!(out[0], Record::new());
        assert_eq!(out[1].get("a"), Some(&Value::Null));
        assert_eq!(out[2].get("a"), Some(&json!(1)));
    }

    #[test]
    fn mixed_kinds_order_by_kind() {
        let values = [json!(null), json!(true), json!(-5), json!("a"), json!([1]), json!({})];
        for pair in values.windows(2) {
            assert_eq!(
                compare_values(Some(&pair[0]), Some(&pair[1])),
                Ordering::Less,
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2.5)), Some(&json!(2))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(-1)), Some(&json!(u64::MAX))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(1.0)), Some(&json!(1))), Ordering::Equal);
    }

    #[test]
    fn arrays_compare_element_wise() {
        assert_eq!(
            compare_values(Some(&json!([1, 2])), Some(&json!([1, 3]))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!([1, 2])), Some(&json!([1, 2, 0]))),
            Ordering::Less
        );
    }

    #[test]
    fn skip_past_end_is_empty() {
        let input = records(json!([{"a": 1}, {"a": 2}]));
        assert!(apply(input, &QueryOptions::new().skip(5)).is_empty());
    }

    #[test]
    fn limit_zero_is_empty() {
        let input = records(json!([{"a": 1}]));
        assert!(apply(input, &QueryOptions::new().limit(0)).is_empty());
    }

    #[test]
    fn projection_keeps_only_named_fields() {
        let record = records(json!([{"_id": "x", "name": "Tom", "age": 19}])).remove(0);
        let projected = project(&record, &["name".to_string()]);
        assert_eq!(Value::Object(projected), json!({"name": "Tom"}));
    }

    #[test]
    fn projection_follows_requested_order() {
        let record = records(json!([{"a": 1, "b": 2, "c": 3}])).remove(0);
        let projected = project(&record, &["c".to_string(), "missing".to_string(), "a".to_string()]);
        let keys: Vec<&str> = projected.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["c", "a"]);
    }

    #[test]
    fn projection_runs_after_sort() {
        let input = records(json!([{"a": 2, "b": "x"}, {"a": 1, "b": "y"}]));
        let out = apply(input, &QueryOptions::new().asc("a").project(["b"]));
        assert_eq!(out, records(json!([{"b": "y"}, {"b": "x"}])));
    }
}
