//! Conversion between strata/resolved views and the plain JSON interchange
//! format, with per-field type coercion.
//!
//! Deserialization never hard-fails on bad data: a field that cannot be
//! coerced is skipped and reported as a [`Fault`], and unknown keys are
//! either retained verbatim (when the schema opts into passthrough) or
//! dropped with a warning so catalogs stay forward-compatible.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::diagnostics::{Diagnostics, Fault};
use crate::errors::StratabaseResult;
use crate::model::StratifiedModel;
use crate::resolve::join_path;
use crate::schema::{FieldDescriptor, FieldKind, Schema};
use crate::stratum::Stratum;
use crate::value::{Value, ValueKind, REMOVED_KEY};

/// Deserialize one stratum from plain data. The root must be a JSON object;
/// anything else yields an empty stratum plus a fault.
pub fn stratum_from_plain(
    schema: &Schema,
    name: &str,
    plain: &serde_json::Value,
) -> (Stratum, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut stratum = Stratum::new(name);
    match plain {
        serde_json::Value::Object(map) => {
            let coerced = coerce_object("", schema, map, &mut diagnostics);
            *stratum.values_mut() = coerced;
        }
        other => diagnostics.push(Fault::TypeMismatch {
            path: String::new(),
            expected: ValueKind::Object.to_string(),
            found: json_kind_name(other).to_owned(),
        }),
    }
    (stratum, diagnostics)
}

/// Deserialize plain data straight into one of a model's strata. The usual
/// loader path: fetch JSON, then one synchronous write.
pub fn apply_plain(
    model: &mut StratifiedModel,
    stratum: &str,
    plain: &serde_json::Value,
) -> StratabaseResult<Diagnostics> {
    let (layer, diagnostics) = stratum_from_plain(model.schema(), stratum, plain);
    model.set_stratum(layer)?;
    Ok(diagnostics)
}

/// Serialize one stratum back to plain data. Lossless for any stratum that
/// was itself produced by [`stratum_from_plain`] against the same schema.
pub fn stratum_to_plain(stratum: &Stratum) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = stratum
        .iter()
        .map(|(name, value)| (name.clone(), value_to_plain(value)))
        .collect();
    serde_json::Value::Object(map)
}

/// Serialize the fully resolved view of a model.
pub fn resolved_to_plain(model: &StratifiedModel) -> (serde_json::Value, Diagnostics) {
    let (view, diagnostics) = model.resolved_view();
    (value_to_plain(&view), diagnostics)
}

pub fn value_to_plain(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Number(n) => number_to_plain(*n),
        Value::Boolean(b) => json!(b),
        Value::Date(d) => json!(d.to_rfc3339()),
        Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_plain(v)))
                .collect(),
        ),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_plain).collect()),
        Value::Opaque(raw) => raw.clone(),
    }
}

/// Integral numbers serialize without a fractional part so interchange stays
/// stable across a round-trip.
fn number_to_plain(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9_007_199_254_740_992.0 {
        json!(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn coerce_object(
    parent_path: &str,
    schema: &Schema,
    map: &serde_json::Map<String, serde_json::Value>,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for (key, raw) in map {
        // JSON null means "not written": the stratum stays partial there.
        if raw.is_null() {
            continue;
        }
        let path = join_path(parent_path, key);
        match schema.field(key) {
            Some(field) => {
                if let Some(value) = coerce_field(&path, field, raw, diagnostics) {
                    out.insert(key.clone(), value);
                }
            }
            None if schema.retains_unknown() => {
                out.insert(key.clone(), Value::Opaque(raw.clone()));
            }
            None => diagnostics.push(Fault::UnknownField { path }),
        }
    }
    out
}

fn coerce_field(
    path: &str,
    field: &FieldDescriptor,
    raw: &serde_json::Value,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    match &field.kind {
        FieldKind::Primitive(kind) => coerce_primitive(path, *kind, raw, diagnostics),
        FieldKind::Opaque => Some(Value::Opaque(raw.clone())),
        FieldKind::Object(schema) => match raw {
            serde_json::Value::Object(map) => {
                Some(Value::Object(coerce_object(path, schema, map, diagnostics)))
            }
            other => {
                mismatch(path, ValueKind::Object, other, diagnostics);
                None
            }
        },
        FieldKind::ObjectArray(schema) => match raw {
            serde_json::Value::Array(items) => {
                let identity = field.identity_field.as_deref().unwrap_or("id");
                let coerced = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        coerce_element(
                            &format!("{path}[{i}]"),
                            schema,
                            identity,
                            item,
                            diagnostics,
                        )
                    })
                    .collect();
                Some(Value::Array(coerced))
            }
            other => {
                mismatch(path, ValueKind::Array, other, diagnostics);
                None
            }
        },
    }
}

/// Coerce one array element. The identity key and the removal marker are
/// carried even when the element schema does not declare them; the merge
/// engine depends on both.
fn coerce_element(
    path: &str,
    schema: &Schema,
    identity_field: &str,
    raw: &serde_json::Value,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    let serde_json::Value::Object(map) = raw else {
        mismatch(path, ValueKind::Object, raw, diagnostics);
        return None;
    };
    let mut body = map.clone();
    // A schema-declared identity field coerces like any other field; an
    // undeclared one is carried through in its natural primitive kind.
    let identity = if schema.contains(identity_field) {
        None
    } else {
        body.remove(identity_field)
    };
    let removed = body.remove(REMOVED_KEY);

    let mut out = coerce_object(path, schema, &body, diagnostics);
    if let Some(id_raw) = identity {
        if !out.contains_key(identity_field) {
            if let Some(id_value) = plain_primitive(&id_raw) {
                out.insert(identity_field.to_owned(), id_value);
            }
        }
    }
    if let Some(serde_json::Value::Bool(true)) = removed {
        out.insert(REMOVED_KEY.to_owned(), Value::Boolean(true));
    }
    Some(Value::Object(out))
}

fn coerce_primitive(
    path: &str,
    kind: ValueKind,
    raw: &serde_json::Value,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    let coerced = match kind {
        ValueKind::String => match raw {
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Number(n) => Some(Value::String(n.to_string())),
            serde_json::Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ValueKind::Number => match raw {
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Number),
            _ => None,
        },
        ValueKind::Boolean => match raw {
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::String(s) => match s.as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
        ValueKind::Date => match raw {
            serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| Value::Date(d.with_timezone(&Utc))),
            _ => None,
        },
        _ => None,
    };
    if coerced.is_none() {
        mismatch(path, kind, raw, diagnostics);
    }
    coerced
}

/// A raw JSON primitive as its natural value kind, used for identity keys.
fn plain_primitive(raw: &serde_json::Value) -> Option<Value> {
    match raw {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
        serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
        _ => None,
    }
}

fn mismatch(
    path: &str,
    expected: ValueKind,
    found: &serde_json::Value,
    diagnostics: &mut Diagnostics,
) {
    diagnostics.push(Fault::TypeMismatch {
        path: path.to_owned(),
        expected: expected.to_string(),
        found: json_kind_name(found).to_owned(),
    });
}

fn json_kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
