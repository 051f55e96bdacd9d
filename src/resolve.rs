//! Per-field resolution: walk strata in precedence order, fall back to the
//! descriptor default, fall back to the kind's empty value. Object fields
//! recurse structurally; array fields delegate to the merge engine.

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostics, Fault};
use crate::merge;
use crate::schema::{FieldDescriptor, FieldKind, Schema};
use crate::value::{Value, ValueKind, REMOVED_KEY};

/// Where a resolved value came from. Lets consumers query absence ("nothing
/// wrote this") separately from "equal to the default".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionSource {
    /// The named stratum supplied the winning value.
    Stratum(String),
    /// No stratum defined the field; the descriptor default was used.
    Default,
    /// Neither a stratum nor a default defined the field; the kind's empty
    /// value was substituted.
    Empty,
}

/// The outcome of resolving one field: always a value (resolution is total),
/// plus provenance and any data faults recovered from along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub source: ResolutionSource,
    pub diagnostics: Diagnostics,
}

/// One layer contributing to a field, in precedence order. The descriptor
/// default rides along as the lowest pseudo-layer so that fallback inside
/// nested objects follows the same walk as top-level primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Provenance {
    Stratum(String),
    Default,
}

impl Provenance {
    pub(crate) fn source(&self) -> ResolutionSource {
        match self {
            Provenance::Stratum(name) => ResolutionSource::Stratum(name.clone()),
            Provenance::Default => ResolutionSource::Default,
        }
    }

    /// Layer label used in diagnostics.
    pub(crate) fn label(&self) -> &str {
        match self {
            Provenance::Stratum(name) => name,
            Provenance::Default => "<default>",
        }
    }
}

/// Resolve one field from the layers that define it (`defined` is in
/// precedence order, highest first, descriptor default last if present).
/// `path` is the full dotted path, used only for diagnostics.
pub(crate) fn resolve_field(
    path: &str,
    descriptor: &FieldDescriptor,
    defined: &[(Provenance, &Value)],
) -> Resolved {
    match &descriptor.kind {
        FieldKind::Primitive(expected) => resolve_primitive(path, *expected, defined),
        FieldKind::Opaque => resolve_opaque(defined),
        FieldKind::Object(schema) => resolve_object(path, schema, defined),
        FieldKind::ObjectArray(schema) => resolve_array(path, descriptor, schema, defined),
    }
}

fn resolve_primitive(path: &str, expected: ValueKind, defined: &[(Provenance, &Value)]) -> Resolved {
    let mut diagnostics = Diagnostics::new();
    for (provenance, value) in defined {
        if value.kind() == expected {
            return Resolved {
                value: (*value).clone(),
                source: provenance.source(),
                diagnostics,
            };
        }
        diagnostics.push(Fault::TypeMismatch {
            path: path.to_owned(),
            expected: expected.to_string(),
            found: value.kind().to_string(),
        });
    }
    Resolved {
        value: expected.empty_value(),
        source: ResolutionSource::Empty,
        diagnostics,
    }
}

/// Opaque fields never merge: the top-precedence layer wins verbatim.
fn resolve_opaque(defined: &[(Provenance, &Value)]) -> Resolved {
    match defined.first() {
        Some((provenance, value)) => Resolved {
            value: (*value).clone(),
            source: provenance.source(),
            diagnostics: Diagnostics::new(),
        },
        None => Resolved {
            value: ValueKind::Opaque.empty_value(),
            source: ResolutionSource::Empty,
            diagnostics: Diagnostics::new(),
        },
    }
}

fn resolve_object(path: &str, schema: &Schema, defined: &[(Provenance, &Value)]) -> Resolved {
    let mut diagnostics = Diagnostics::new();
    let mut layers: Vec<(Provenance, &BTreeMap<String, Value>)> = Vec::new();
    for (provenance, value) in defined {
        match value {
            Value::Object(map) => layers.push((provenance.clone(), map)),
            other => diagnostics.push(Fault::TypeMismatch {
                path: path.to_owned(),
                expected: ValueKind::Object.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
    let source = layers
        .first()
        .map(|(provenance, _)| provenance.source())
        .unwrap_or(ResolutionSource::Empty);
    let (map, nested) = resolve_object_fields(path, schema, &layers);
    diagnostics.extend(nested);
    Resolved {
        value: Value::Object(map),
        source,
        diagnostics,
    }
}

/// Resolve every field of `schema` against the given object layers. This is
/// the structural-recursion core shared by nested object fields, merged
/// array elements and the whole-model resolved view.
pub(crate) fn resolve_object_fields(
    parent_path: &str,
    schema: &Schema,
    layers: &[(Provenance, &BTreeMap<String, Value>)],
) -> (BTreeMap<String, Value>, Diagnostics) {
    let mut out = BTreeMap::new();
    let mut diagnostics = Diagnostics::new();

    for field in schema.fields() {
        let path = join_path(parent_path, &field.name);
        let mut defined: Vec<(Provenance, &Value)> = layers
            .iter()
            .filter_map(|(provenance, map)| {
                map.get(&field.name).map(|v| (provenance.clone(), v))
            })
            .collect();
        if let Some(default) = &field.default_value {
            defined.push((Provenance::Default, default));
        }
        let resolved = resolve_field(&path, field, &defined);
        diagnostics.extend(resolved.diagnostics);
        out.insert(field.name.clone(), resolved.value);
    }

    // Forward-compatibility passthrough: keep unknown keys, highest
    // precedence winning, when the schema opts in.
    if schema.retains_unknown() {
        for (_, map) in layers {
            for (key, value) in map.iter() {
                if key != REMOVED_KEY && !schema.contains(key) && !out.contains_key(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
    }

    (out, diagnostics)
}

fn resolve_array(
    path: &str,
    descriptor: &FieldDescriptor,
    element_schema: &Schema,
    defined: &[(Provenance, &Value)],
) -> Resolved {
    let mut diagnostics = Diagnostics::new();
    let mut layers: Vec<(Provenance, &[Value])> = Vec::new();
    for (provenance, value) in defined {
        match value {
            Value::Array(items) => layers.push((provenance.clone(), items.as_slice())),
            other => diagnostics.push(Fault::TypeMismatch {
                path: path.to_owned(),
                expected: ValueKind::Array.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
    let source = layers
        .first()
        .map(|(provenance, _)| provenance.source())
        .unwrap_or(ResolutionSource::Empty);
    let identity_field = descriptor.identity_field.as_deref().unwrap_or("id");
    let (items, merge_diags) = merge::merge_arrays(path, element_schema, identity_field, &layers);
    diagnostics.extend(merge_diags);
    Resolved {
        value: Value::Array(items),
        source,
        diagnostics,
    }
}

pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}.{child}")
    }
}
