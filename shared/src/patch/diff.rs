use serde_json::{Map, Value};

use super::{apply::element_id, patch_op::PatchOp};

/// Express the change from `prev` to `next` as patch ops.
///
/// Both values must be objects; anything else returns `None` and the caller
/// falls back to a full snapshot. Fields that cannot be described
/// incrementally (reordered arrays, dropped element keys, keys containing
/// `.`) are overwritten whole through a root merge, so for object roots the
/// result always reproduces `next` exactly.
pub fn diff(prev: &Value, next: &Value) -> Option<Vec<PatchOp>> {
    let (Value::Object(before), Value::Object(after)) = (prev, next) else {
        return None;
    };

    let mut ops = Vec::new();
    let mut root_merge = Map::new();

    for key in before.keys() {
        if !after.contains_key(key) {
            ops.push(PatchOp::Remove {
                path: None,
                value: Value::String(key.clone()),
            });
        }
    }

    for (key, new_value) in after {
        if key.contains('.') {
            if before.get(key) != Some(new_value) {
                root_merge.insert(key.clone(), new_value.clone());
            }
            continue;
        }
        match (before.get(key), new_value) {
            (Some(old_value), _) if old_value == new_value => {}
            (Some(Value::Array(old_items)), Value::Array(new_items)) => {
                match diff_array(key, old_items, new_items) {
                    Some(mut field_ops) => ops.append(&mut field_ops),
                    None => {
                        root_merge.insert(key.clone(), new_value.clone());
                    }
                }
            }
            (Some(Value::Object(old_fields)), Value::Object(new_fields)) => {
                ops.extend(diff_object(key, old_fields, new_fields));
            }
            _ => {
                root_merge.insert(key.clone(), new_value.clone());
            }
        }
    }

    if !root_merge.is_empty() {
        ops.push(PatchOp::Merge {
            path: None,
            value: Value::Object(root_merge),
        });
    }

    Some(ops)
}

fn diff_object(path: &str, before: &Map<String, Value>, after: &Map<String, Value>) -> Vec<PatchOp> {
    let mut ops = Vec::new();

    for key in before.keys() {
        if !after.contains_key(key) {
            ops.push(PatchOp::Remove {
                path: Some(path.to_string()),
                value: Value::String(key.clone()),
            });
        }
    }

    let changed: Map<String, Value> = after
        .iter()
        .filter(|(key, value)| before.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if !changed.is_empty() {
        ops.push(PatchOp::Merge {
            path: Some(path.to_string()),
            value: Value::Object(changed),
        });
    }

    ops
}

fn diff_array(path: &str, before: &[Value], after: &[Value]) -> Option<Vec<PatchOp>> {
    let before_ids: Option<Vec<&Value>> = before.iter().map(element_id).collect();
    let after_ids: Option<Vec<&Value>> = after.iter().map(element_id).collect();

    match (before_ids, after_ids) {
        (Some(before_ids), Some(after_ids)) if all_unique(&before_ids) && all_unique(&after_ids) => {
            diff_keyed_array(path, before, after, &before_ids, &after_ids)
        }
        _ => diff_appended(path, before, after),
    }
}

/// Arrays of `{ id, .. }` elements: removals by id, survivors merged in
/// place, new elements appended. Survivors must keep their relative order
/// and new elements must come after them.
fn diff_keyed_array(
    path: &str,
    before: &[Value],
    after: &[Value],
    before_ids: &[&Value],
    after_ids: &[&Value],
) -> Option<Vec<PatchOp>> {
    let mut ops = Vec::new();
    let mut survivors = Vec::new();

    for (index, id) in before_ids.iter().enumerate() {
        if after_ids.contains(id) {
            survivors.push(index);
        } else {
            ops.push(PatchOp::Remove {
                path: Some(path.to_string()),
                value: id_selector(id),
            });
        }
    }

    if after_ids.len() < survivors.len() {
        return None;
    }
    let in_order = survivors
        .iter()
        .zip(after_ids)
        .all(|(index, id)| before_ids[*index] == *id);
    if !in_order {
        return None;
    }

    let mut changed = Vec::new();
    for (position, index) in survivors.iter().enumerate() {
        let old_element = &before[*index];
        let new_element = &after[position];
        if old_element == new_element {
            continue;
        }
        let (Value::Object(old_fields), Value::Object(new_fields)) = (old_element, new_element) else {
            return None;
        };
        // a shallow merge can add or overwrite keys but never drop one
        if old_fields.keys().any(|key| !new_fields.contains_key(key)) {
            return None;
        }
        let mut delta: Map<String, Value> = new_fields
            .iter()
            .filter(|(key, value)| old_fields.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        delta.insert("id".to_string(), (*after_ids[position]).clone());
        changed.push(Value::Object(delta));
    }
    if !changed.is_empty() {
        ops.push(PatchOp::Merge {
            path: Some(path.to_string()),
            value: Value::Array(changed),
        });
    }

    for element in &after[survivors.len()..] {
        ops.push(PatchOp::Insert {
            path: path.to_string(),
            value: element.clone(),
        });
    }

    Some(ops)
}

/// Arrays without ids: only pure appends are expressible.
fn diff_appended(path: &str, before: &[Value], after: &[Value]) -> Option<Vec<PatchOp>> {
    if after.len() < before.len() || after[..before.len()] != *before {
        return None;
    }
    Some(
        after[before.len()..]
            .iter()
            .map(|element| PatchOp::Insert {
                path: path.to_string(),
                value: element.clone(),
            })
            .collect(),
    )
}

/// Numbers select by index, so numeric ids travel as `{ "id": n }`.
fn id_selector(id: &Value) -> Value {
    match id {
        Value::String(_) => id.clone(),
        _ => {
            let mut selector = Map::new();
            selector.insert("id".to_string(), id.clone());
            Value::Object(selector)
        }
    }
}

fn all_unique(ids: &[&Value]) -> bool {
    ids.iter()
        .enumerate()
        .all(|(index, id)| !ids[index + 1..].contains(id))
}
