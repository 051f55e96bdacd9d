//! Order-sensitive, associative composition of trait fragments.

use crate::errors::{StratabaseError, StratabaseResult};

use super::{FieldDescriptor, FieldKind, Schema, TraitFragment};

/// Combine fragments, in order, into one effective schema.
///
/// Collision policy, per field name:
/// - not yet present: inserted at the end, keeping declaration order;
/// - present with a compatible kind: the earliest descriptor's metadata
///   (description/default/required) is kept unless the later declaration
///   carries [`overrides_metadata`](FieldDescriptor::overrides_metadata);
///   nested object/array schemas are composed recursively;
/// - present with a conflicting kind: [`StratabaseError::IncompatibleTrait`].
///
/// Composition is associative: `compose(&[compose(&[a, b]) as fragment, c])`
/// yields the same schema as `compose(&[a, b, c])`.
pub fn compose(fragments: &[TraitFragment]) -> StratabaseResult<Schema> {
    let mut schema = Schema::default();
    for fragment in fragments {
        merge_schema(&mut schema, fragment.name(), fragment.schema())?;
    }
    Ok(schema)
}

fn merge_schema(
    target: &mut Schema,
    fragment_name: &str,
    incoming: &Schema,
) -> StratabaseResult<()> {
    for field in incoming.fields() {
        match target.position(&field.name) {
            None => target.push_field(field.clone()),
            Some(index) => {
                let merged = merge_field(&target.fields()[index], field, fragment_name)?;
                target.replace_field(index, merged);
            }
        }
    }
    if incoming.retains_unknown() {
        target.set_retains_unknown(true);
    }
    Ok(())
}

fn merge_field(
    existing: &FieldDescriptor,
    incoming: &FieldDescriptor,
    fragment_name: &str,
) -> StratabaseResult<FieldDescriptor> {
    let kind = merge_kind(existing, incoming, fragment_name)?;
    let identity_field = merge_identity(existing, incoming)?;

    let winner = if incoming.overrides_metadata {
        incoming
    } else {
        existing
    };
    Ok(FieldDescriptor {
        name: existing.name.clone(),
        kind,
        description: winner.description.clone(),
        default_value: winner.default_value.clone(),
        identity_field,
        required: winner.required,
        overrides_metadata: winner.overrides_metadata,
    })
}

fn merge_kind(
    existing: &FieldDescriptor,
    incoming: &FieldDescriptor,
    fragment_name: &str,
) -> StratabaseResult<FieldKind> {
    match (&existing.kind, &incoming.kind) {
        (FieldKind::Primitive(a), FieldKind::Primitive(b)) if a == b => Ok(existing.kind.clone()),
        (FieldKind::Opaque, FieldKind::Opaque) => Ok(FieldKind::Opaque),
        (FieldKind::Object(a), FieldKind::Object(b)) => {
            let mut nested = a.clone();
            merge_schema(&mut nested, fragment_name, b)?;
            Ok(FieldKind::Object(nested))
        }
        (FieldKind::ObjectArray(a), FieldKind::ObjectArray(b)) => {
            let mut nested = a.clone();
            merge_schema(&mut nested, fragment_name, b)?;
            Ok(FieldKind::ObjectArray(nested))
        }
        (a, b) => Err(StratabaseError::IncompatibleTrait {
            fragment: fragment_name.to_owned(),
            field: existing.name.clone(),
            existing: a.to_string(),
            incoming: b.to_string(),
        }),
    }
}

fn merge_identity(
    existing: &FieldDescriptor,
    incoming: &FieldDescriptor,
) -> StratabaseResult<Option<String>> {
    match (&existing.identity_field, &incoming.identity_field) {
        (Some(a), Some(b)) if a != b => Err(StratabaseError::IdentityFieldConflict {
            field: existing.name.clone(),
            existing: a.clone(),
            incoming: b.clone(),
        }),
        (Some(a), _) => Ok(Some(a.clone())),
        (None, other) => Ok(other.clone()),
    }
}
