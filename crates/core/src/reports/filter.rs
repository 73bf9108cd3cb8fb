//! Document filters in the familiar `{"field": {"$op": value}}` shape.
//!
//! Supported operators: `$eq $ne $gt $gte $lt $lte $in $nin $all $exists
//! $regex $size $not` on fields and `$and $or $nor` at the top level.
//! Field names may be dotted paths into nested objects or array indexes.

use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::{Map, Value};

use crate::errors::{Error, Result};

/// Looks up a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Numeric view of a value; numeric strings count as numbers.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order used for sorting: missing and null first, then numbers,
/// strings, objects, arrays and booleans.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Ordering for comparison operators; values of different kinds don't compare.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Equality as a filter sees it: arrays match when any element matches.
fn field_equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) => {
            values_equal(&Value::Array(items.clone()), expected)
                || items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn field_compares(field: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    match field {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare(item, operand).is_some_and(accept)),
        Some(value) => compare(value, operand).is_some_and(accept),
        None => false,
    }
}

fn operand_array<'a>(op: &str, operand: &'a Value) -> Result<&'a Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| Error::invalid_input(format!("{} expects an array", op)))
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn eval_operators(field: Option<&Value>, operators: &Map<String, Value>) -> Result<bool> {
    for (op, operand) in operators {
        let ok = match op.as_str() {
            "$eq" => field_equals(field, operand),
            "$ne" => !field_equals(field, operand),
            "$gt" => field_compares(field, operand, |o| o == Ordering::Greater),
            "$gte" => field_compares(field, operand, |o| o != Ordering::Less),
            "$lt" => field_compares(field, operand, |o| o == Ordering::Less),
            "$lte" => field_compares(field, operand, |o| o != Ordering::Greater),
            "$in" => operand_array(op, operand)?
                .iter()
                .any(|candidate| field_equals(field, candidate)),
            "$nin" => !operand_array(op, operand)?
                .iter()
                .any(|candidate| field_equals(field, candidate)),
            "$all" => {
                let wanted = operand_array(op, operand)?;
                match field {
                    Some(Value::Array(items)) => wanted
                        .iter()
                        .all(|w| items.iter().any(|item| values_equal(item, w))),
                    _ => false,
                }
            }
            "$exists" => {
                let present = field.is_some();
                match operand {
                    Value::Bool(want) => present == *want,
                    other => present == as_number(other).is_some_and(|n| n != 0.0),
                }
            }
            "$size" => match (field, operand.as_u64()) {
                (Some(Value::Array(items)), Some(n)) => items.len() as u64 == n,
                _ => false,
            },
            "$regex" => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| Error::invalid_input("$regex expects a string"))?;
                let case_insensitive = operators
                    .get("$options")
                    .and_then(Value::as_str)
                    .is_some_and(|o| o.contains('i'));
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| Error::invalid_input(format!("Invalid $regex: {}", e)))?;
                match field {
                    Some(Value::String(s)) => regex.is_match(s),
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|s| regex.is_match(s)),
                    _ => false,
                }
            }
            "$options" => true,
            "$not" => match operand {
                Value::Object(inner) => !eval_operators(field, inner)?,
                _ => return Err(Error::invalid_input("$not expects an operator object")),
            },
            other => {
                return Err(Error::invalid_input(format!(
                    "Unsupported filter operator '{}'",
                    other
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_clauses(op: &str, clauses: &Value, doc: &Value) -> Result<Vec<bool>> {
    operand_array(op, clauses)?
        .iter()
        .map(|clause| matches(doc, clause))
        .collect()
}

/// True when `doc` satisfies `filter`. `null` and `{}` match everything.
pub fn matches(doc: &Value, filter: &Value) -> Result<bool> {
    let conditions = match filter {
        Value::Null => return Ok(true),
        Value::Object(map) => map,
        _ => return Err(Error::invalid_input("A filter must be an object")),
    };

    for (key, condition) in conditions {
        let ok = match key.as_str() {
            "$and" => eval_clauses(key, condition, doc)?.into_iter().all(|b| b),
            "$or" => eval_clauses(key, condition, doc)?.into_iter().any(|b| b),
            "$nor" => !eval_clauses(key, condition, doc)?.into_iter().any(|b| b),
            path if path.starts_with('$') => {
                return Err(Error::invalid_input(format!(
                    "Unsupported filter operator '{}'",
                    path
                )))
            }
            path => {
                let field = lookup(doc, path);
                match condition {
                    Value::Object(operators) if is_operator_object(condition) => {
                        eval_operators(field, operators)?
                    }
                    expected => field_equals(field, expected),
                }
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}
