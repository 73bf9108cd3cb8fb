//! In-memory execution of find, count and aggregate steps.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::collections::CollectionRegistry;
use super::filter::{as_number, lookup, matches, sort_order, values_equal};
use super::reports_model::{
    Accumulator, FindStep, GroupStage, PopulateSpec, QueryStep, SortDirection, SortKey, Stage,
};
use crate::errors::{Error, Result};
use crate::tenants::PartitionHandle;

/// Runs one bound step over `docs`.
pub fn execute_step(
    step: &QueryStep,
    docs: Vec<Value>,
    registry: &CollectionRegistry,
    partition: &PartitionHandle,
) -> Result<Value> {
    match step {
        QueryStep::Find(find) => run_find(find, docs, registry, partition),
        QueryStep::Count(count) => Ok(Value::from(apply_match(docs, &count.filter)?.len())),
        QueryStep::Aggregate(aggregate) => {
            let mut docs = docs;
            for stage in &aggregate.pipeline {
                docs = apply_stage(stage, docs)?;
            }
            Ok(Value::Array(docs))
        }
    }
}

fn run_find(
    find: &FindStep,
    docs: Vec<Value>,
    registry: &CollectionRegistry,
    partition: &PartitionHandle,
) -> Result<Value> {
    let mut docs = apply_match(docs, &find.filter)?;
    sort_docs(&mut docs, &find.sort);
    let mut docs: Vec<Value> = docs
        .into_iter()
        .skip(find.skip.unwrap_or(0))
        .take(find.limit.unwrap_or(usize::MAX))
        .collect();

    for spec in &find.populate {
        populate(&mut docs, spec, registry, partition)?;
    }
    Ok(Value::Array(docs))
}

fn apply_match(docs: Vec<Value>, filter: &Value) -> Result<Vec<Value>> {
    let mut kept = Vec::with_capacity(docs.len());
    for doc in docs {
        if matches(&doc, filter)? {
            kept.push(doc);
        }
    }
    Ok(kept)
}

fn sort_docs(docs: &mut [Value], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ord = sort_order(lookup(a, &key.field), lookup(b, &key.field));
                match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn populate(
    docs: &mut [Value],
    spec: &PopulateSpec,
    registry: &CollectionRegistry,
    partition: &PartitionHandle,
) -> Result<()> {
    let foreign = registry.get(&spec.from)?.documents(partition)?;
    let index: HashMap<String, Value> = foreign
        .into_iter()
        .filter_map(|doc| {
            let key = match lookup(&doc, &spec.foreign_field)? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key, doc))
        })
        .collect();
    let resolve = |reference: &Value| -> Value {
        let key = match reference {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        index.get(&key).cloned().unwrap_or(Value::Null)
    };

    for doc in docs.iter_mut() {
        let Value::Object(map) = doc else {
            continue;
        };
        let Some(current) = map.get(&spec.path) else {
            continue;
        };
        let populated = match current {
            Value::Array(refs) => Value::Array(refs.iter().map(resolve).collect()),
            Value::Null => Value::Null,
            reference => resolve(reference),
        };
        map.insert(spec.path.clone(), populated);
    }
    Ok(())
}

fn apply_stage(stage: &Stage, docs: Vec<Value>) -> Result<Vec<Value>> {
    match stage {
        Stage::Match(filter) => apply_match(docs, filter),
        Stage::Group(group) => group_docs(group, docs),
        Stage::Sort(keys) => {
            let mut docs = docs;
            sort_docs(&mut docs, keys);
            Ok(docs)
        }
        Stage::Skip(n) => Ok(docs.into_iter().skip(*n).collect()),
        Stage::Limit(n) => Ok(docs.into_iter().take(*n).collect()),
        Stage::Project(spec) => docs.iter().map(|doc| project(doc, spec)).collect(),
        Stage::Unwind(path) => Ok(unwind(docs, path)),
        Stage::Count(field) => {
            let mut out = Map::new();
            out.insert(field.clone(), Value::from(docs.len()));
            Ok(vec![Value::Object(out)])
        }
    }
}

/// Evaluates `"$path"` references; anything else is a literal.
fn eval_expr(doc: &Value, expr: &Value) -> Value {
    match expr {
        Value::String(s) if s.starts_with('$') => {
            lookup(doc, &s[1..]).cloned().unwrap_or(Value::Null)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), eval_expr(doc, v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[derive(Default)]
struct GroupState {
    key: Value,
    sums: Vec<f64>,
    counts: Vec<usize>,
    values: Vec<Option<Value>>,
    lists: Vec<Vec<Value>>,
}

fn group_docs(group: &GroupStage, docs: Vec<Value>) -> Result<Vec<Value>> {
    let fields: Vec<(&String, &Accumulator)> = group.fields.iter().collect();
    let mut order: Vec<GroupState> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for doc in &docs {
        let key = eval_expr(doc, &group.key);
        let slot = serde_json::to_string(&key)?;
        let idx = *positions.entry(slot).or_insert_with(|| {
            order.push(GroupState {
                key: key.clone(),
                sums: vec![0.0; fields.len()],
                counts: vec![0; fields.len()],
                values: vec![None; fields.len()],
                lists: vec![Vec::new(); fields.len()],
            });
            order.len() - 1
        });
        let state = &mut order[idx];

        for (i, (_, acc)) in fields.iter().enumerate() {
            match acc {
                Accumulator::Sum(expr) | Accumulator::Avg(expr) => {
                    if let Some(n) = as_number(&eval_expr(doc, expr)) {
                        state.sums[i] += n;
                        state.counts[i] += 1;
                    }
                }
                Accumulator::Min(expr) | Accumulator::Max(expr) => {
                    let value = eval_expr(doc, expr);
                    if value.is_null() {
                        continue;
                    }
                    let replace = match &state.values[i] {
                        None => true,
                        Some(current) => {
                            let ord = sort_order(Some(&value), Some(current));
                            if matches!(acc, Accumulator::Min(_)) {
                                ord.is_lt()
                            } else {
                                ord.is_gt()
                            }
                        }
                    };
                    if replace {
                        state.values[i] = Some(value);
                    }
                }
                Accumulator::First(expr) => {
                    if state.values[i].is_none() {
                        state.values[i] = Some(eval_expr(doc, expr));
                    }
                }
                Accumulator::Last(expr) => state.values[i] = Some(eval_expr(doc, expr)),
                Accumulator::Push(expr) => state.lists[i].push(eval_expr(doc, expr)),
                Accumulator::AddToSet(expr) => {
                    let value = eval_expr(doc, expr);
                    if !state.lists[i].iter().any(|v| values_equal(v, &value)) {
                        state.lists[i].push(value);
                    }
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|state| {
            let mut out = Map::new();
            out.insert("_id".to_string(), state.key.clone());
            for (i, (name, acc)) in fields.iter().enumerate() {
                let value = match acc {
                    Accumulator::Sum(_) => number(state.sums[i]),
                    Accumulator::Avg(_) if state.counts[i] == 0 => Value::Null,
                    Accumulator::Avg(_) => number(state.sums[i] / state.counts[i] as f64),
                    Accumulator::Min(_)
                    | Accumulator::Max(_)
                    | Accumulator::First(_)
                    | Accumulator::Last(_) => state.values[i].clone().unwrap_or(Value::Null),
                    Accumulator::Push(_) | Accumulator::AddToSet(_) => {
                        Value::Array(state.lists[i].clone())
                    }
                };
                out.insert((*name).clone(), value);
            }
            Value::Object(out)
        })
        .collect())
}

/// Whole numbers come out as integers so counts read naturally.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn is_exclusion(value: &Value) -> bool {
    matches!(value, Value::Bool(false)) || as_number(value) == Some(0.0) && !value.is_string()
}

fn is_inclusion(value: &Value) -> bool {
    matches!(value, Value::Bool(true)) || as_number(value) == Some(1.0) && !value.is_string()
}

fn project(doc: &Value, spec: &Map<String, Value>) -> Result<Value> {
    let exclude_id = spec.get("_id").is_some_and(is_exclusion);
    let shaping: Vec<(&String, &Value)> = spec.iter().filter(|(k, _)| *k != "_id").collect();
    let exclusion_only = !shaping.is_empty() && shaping.iter().all(|(_, v)| is_exclusion(v));

    if exclusion_only {
        let mut out = doc.as_object().cloned().unwrap_or_default();
        for (field, _) in shaping {
            out.remove(field.as_str());
        }
        if exclude_id {
            out.remove("_id");
        }
        return Ok(Value::Object(out));
    }

    let mut out = Map::new();
    if !exclude_id {
        if let Some(id) = lookup(doc, "_id") {
            out.insert("_id".to_string(), id.clone());
        }
    }
    for (field, rule) in shaping {
        if is_exclusion(rule) {
            return Err(Error::invalid_input(
                "$project cannot mix inclusion and exclusion",
            ));
        }
        if is_inclusion(rule) {
            if let Some(value) = lookup(doc, field) {
                out.insert(field.clone(), value.clone());
            }
        } else {
            out.insert(field.clone(), eval_expr(doc, rule));
        }
    }
    Ok(Value::Object(out))
}

fn unwind(docs: Vec<Value>, path: &str) -> Vec<Value> {
    let field = path.trim_start_matches('$');
    let mut out = Vec::new();
    for doc in docs {
        match doc.get(field) {
            Some(Value::Array(items)) => {
                for item in items.clone() {
                    let mut copy = doc.clone();
                    if let Value::Object(map) = &mut copy {
                        map.insert(field.to_string(), item);
                    }
                    out.push(copy);
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => out.push(doc),
        }
    }
    out
}
