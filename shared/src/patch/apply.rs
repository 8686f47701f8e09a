use serde_json::{Map, Value};

use super::{error::PatchError, patch_op::PatchOp};

const ROOT: &str = "<root>";

/// Apply `ops` in order to a deep copy of `value`.
///
/// Returns the patched copy only if every op succeeds; on error the input is
/// untouched and nothing partial escapes.
pub fn apply_ops(value: &Value, ops: &[PatchOp]) -> Result<Value, PatchError> {
    let mut working = value.clone();
    for op in ops {
        apply_op(&mut working, op)?;
    }
    Ok(working)
}

fn apply_op(root: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Set { value } => {
            *root = value.clone();
            Ok(())
        }
        PatchOp::Merge { path: None, value } => {
            let Value::Object(target) = root else {
                return Err(PatchError::NotAnObject {
                    path: ROOT.to_string(),
                });
            };
            let Value::Object(incoming) = value else {
                return Err(PatchError::InvalidMerge {
                    path: ROOT.to_string(),
                    reason: "root merge value must be an object",
                });
            };
            for (key, field) in incoming {
                target.insert(key.clone(), field.clone());
            }
            Ok(())
        }
        PatchOp::Merge {
            path: Some(path),
            value,
        } => {
            let target = field_mut(root, path, true)?;
            merge_into(target, value, path)
        }
        PatchOp::Insert { path, value } => {
            let target = field_mut(root, path, true)?;
            match target {
                Value::Null => {
                    *target = Value::Array(vec![value.clone()]);
                    Ok(())
                }
                Value::Array(items) => {
                    items.push(value.clone());
                    Ok(())
                }
                _ => Err(PatchError::NotAnArray { path: path.clone() }),
            }
        }
        PatchOp::Remove { path, value } => {
            let (target, shown) = match path {
                Some(path) => (field_mut(root, path, false)?, path.as_str()),
                None => (root, ROOT),
            };
            remove_from(target, value, shown)
        }
    }
}

/// Walk a dot-separated key path. With `create`, a missing final segment is
/// inserted as `null` so merge/insert can initialise new fields.
fn field_mut<'a>(root: &'a mut Value, path: &str, create: bool) -> Result<&'a mut Value, PatchError> {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(PatchError::EmptyPathSegment {
                path: path.to_string(),
            });
        }
        let is_last = segments.peek().is_none();
        let Value::Object(map) = current else {
            return Err(PatchError::NotAnObject {
                path: path.to_string(),
            });
        };
        current = if create && is_last {
            map.entry(segment.to_string()).or_insert(Value::Null)
        } else {
            map.get_mut(segment).ok_or_else(|| PatchError::PathNotFound {
                path: path.to_string(),
            })?
        };
    }

    Ok(current)
}

fn merge_into(target: &mut Value, incoming: &Value, path: &str) -> Result<(), PatchError> {
    match (target, incoming) {
        (Value::Array(items), Value::Array(updates)) => {
            for update in updates {
                let Some(id) = element_id(update) else {
                    return Err(PatchError::InvalidMerge {
                        path: path.to_string(),
                        reason: "array merge elements need an id",
                    });
                };
                let existing = items
                    .iter_mut()
                    .find(|item| element_id(item) == Some(id));
                match existing {
                    Some(Value::Object(fields)) if update.is_object() => {
                        merge_keys(fields, update);
                    }
                    Some(item) => *item = update.clone(),
                    None => items.push(update.clone()),
                }
            }
            Ok(())
        }
        (Value::Object(fields), Value::Object(_)) => {
            merge_keys(fields, incoming);
            Ok(())
        }
        (Value::Array(_), _) | (Value::Object(_), _) => Err(PatchError::InvalidMerge {
            path: path.to_string(),
            reason: "merge value does not match the field's type",
        }),
        (target, incoming) => {
            *target = incoming.clone();
            Ok(())
        }
    }
}

fn merge_keys(fields: &mut Map<String, Value>, incoming: &Value) {
    if let Value::Object(incoming) = incoming {
        for (key, value) in incoming {
            fields.insert(key.clone(), value.clone());
        }
    }
}

fn remove_from(target: &mut Value, selector: &Value, path: &str) -> Result<(), PatchError> {
    match (target, selector) {
        (Value::Array(items), Value::Number(number)) => {
            let Some(index) = number.as_u64() else {
                return Err(PatchError::InvalidSelector {
                    path: path.to_string(),
                });
            };
            if index >= items.len() as u64 {
                return Err(PatchError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            items.remove(index as usize);
            Ok(())
        }
        (Value::Array(items), Value::String(_)) => remove_by_id(items, selector, path),
        (Value::Array(items), Value::Object(fields)) => match fields.get("id") {
            Some(id) => remove_by_id(items, id, path),
            None => Err(PatchError::InvalidSelector {
                path: path.to_string(),
            }),
        },
        (Value::Object(fields), Value::String(key)) => match fields.remove(key) {
            Some(_) => Ok(()),
            None => Err(PatchError::KeyNotFound {
                path: path.to_string(),
                key: key.clone(),
            }),
        },
        _ => Err(PatchError::InvalidSelector {
            path: path.to_string(),
        }),
    }
}

fn remove_by_id(items: &mut Vec<Value>, id: &Value, path: &str) -> Result<(), PatchError> {
    match items.iter().position(|item| element_id(item) == Some(id)) {
        Some(index) => {
            items.remove(index);
            Ok(())
        }
        None => Err(PatchError::ElementNotFound {
            path: path.to_string(),
            id: id.to_string(),
        }),
    }
}

pub(crate) fn element_id(value: &Value) -> Option<&Value> {
    value
        .as_object()?
        .get("id")
        .filter(|id| id.is_string() || id.is_number())
}
