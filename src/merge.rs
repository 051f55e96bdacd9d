//! Identity-keyed array merge across strata.
//!
//! Elements from different strata are matched by the value of the field's
//! declared identity key, never by position. Matched elements merge
//! recursively through the same per-field resolution used everywhere else;
//! arrays are not otherwise special-cased.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::diagnostics::{Diagnostics, Fault};
use crate::resolve::{resolve_object_fields, Provenance};
use crate::schema::Schema;
use crate::value::{Value, ValueKind};

/// One layer's contribution after indexing: elements in their written order,
/// plus an identity index for cross-layer matching.
struct LayerIndex<'a> {
    provenance: Provenance,
    elements: Vec<Element<'a>>,
    by_identity: HashMap<String, usize>,
}

enum Element<'a> {
    /// Carries the identity key; merges with same-identity elements from
    /// other layers.
    Keyed {
        identity: String,
        map: &'a BTreeMap<String, Value>,
    },
    /// Missing or unusable identity: appended verbatim, never merged across
    /// layers.
    Unkeyed(&'a Value),
}

/// Merge per-stratum element sequences into one resolved array.
///
/// `layers` is in precedence order, highest first (the descriptor default
/// array, if any, rides along as the lowest layer). Output ordering follows
/// first appearance in the highest-precedence layer that contains each
/// identity, then lower layers' order for identities not yet seen.
pub(crate) fn merge_arrays(
    path: &str,
    element_schema: &Schema,
    identity_field: &str,
    layers: &[(Provenance, &[Value])],
) -> (Vec<Value>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let indexed: Vec<LayerIndex<'_>> = layers
        .iter()
        .filter_map(|(provenance, items)| {
            index_layer(path, identity_field, provenance, *items, &mut diagnostics)
        })
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Value> = Vec::new();

    for layer in &indexed {
        for element in &layer.elements {
            match element {
                Element::Keyed { identity, .. } => {
                    if !seen.insert(identity.clone()) {
                        continue;
                    }
                    // All same-identity elements across layers act as strata
                    // of a nested model; the highest one decides deletion.
                    let occurrences: Vec<(Provenance, &BTreeMap<String, Value>)> = indexed
                        .iter()
                        .filter_map(|l| {
                            l.by_identity.get(identity).and_then(|&ix| match &l.elements[ix] {
                                Element::Keyed { map, .. } => {
                                    Some((l.provenance.clone(), *map))
                                }
                                Element::Unkeyed(_) => None,
                            })
                        })
                        .collect();
                    if occurrences.first().is_some_and(|&(_, map)| is_removal(map)) {
                        continue;
                    }
                    let element_path = format!("{path}[{}]", out.len());
                    let (mut merged, nested) =
                        resolve_object_fields(&element_path, element_schema, &occurrences);
                    diagnostics.extend(nested);
                    if !merged.contains_key(identity_field) {
                        if let Some((_, map)) = occurrences.first() {
                            if let Some(id_value) = map.get(identity_field) {
                                merged.insert(identity_field.to_owned(), id_value.clone());
                            }
                        }
                    }
                    out.push(Value::Object(merged));
                }
                Element::Unkeyed(value) => out.push((*value).clone()),
            }
        }
    }

    (out, diagnostics)
}

/// Index one layer's elements by identity. Returns `None` when the layer
/// holds duplicate identities: the offending layer is excluded from the
/// merge (recorded as a fault) so the field still resolves from the
/// remaining layers.
fn index_layer<'a>(
    path: &str,
    identity_field: &str,
    provenance: &Provenance,
    items: &'a [Value],
    diagnostics: &mut Diagnostics,
) -> Option<LayerIndex<'a>> {
    let mut elements = Vec::with_capacity(items.len());
    let mut by_identity = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        let Some(map) = item.as_object() else {
            diagnostics.push(Fault::TypeMismatch {
                path: format!("{path}[{i}]"),
                expected: ValueKind::Object.to_string(),
                found: item.kind().to_string(),
            });
            continue;
        };
        match map.get(identity_field).and_then(identity_key) {
            Some(identity) => {
                if by_identity.insert(identity.clone(), elements.len()).is_some() {
                    diagnostics.push(Fault::DuplicateIdentity {
                        path: path.to_owned(),
                        stratum: provenance.label().to_owned(),
                        identity,
                    });
                    return None;
                }
                elements.push(Element::Keyed { identity, map });
            }
            None => elements.push(Element::Unkeyed(item)),
        }
    }
    Some(LayerIndex {
        provenance: provenance.clone(),
        elements,
        by_identity,
    })
}

/// Canonical string form of an identity value. Non-primitive identities do
/// not participate in matching.
fn identity_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_finite() => {
            if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
        Value::Boolean(b) => Some(b.to_string()),
        Value::Date(d) => Some(d.to_rfc3339()),
        _ => None,
    }
}

fn is_removal(map: &BTreeMap<String, Value>) -> bool {
    matches!(
        map.get(crate::value::REMOVED_KEY),
        Some(Value::Boolean(true))
    )
}
