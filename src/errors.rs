use thiserror::Error;

pub type StratabaseResult<T> = Result<T, StratabaseError>;

/// Hard faults. These indicate a programming error in schema authoring or a
/// call against a field/stratum that does not exist, and are never recovered
/// from inside the engine.
///
/// Malformed *data* (type mismatches, duplicate array identities, unknown
/// keys) is deliberately not represented here; those are collected as
/// [`Fault`](crate::diagnostics::Fault)s alongside a best-effort result so a
/// single bad field never takes down resolution of a whole entity.
#[derive(Error, Debug)]
pub enum StratabaseError {
    #[error("duplicate field `{field}` in trait fragment `{fragment}`")]
    DuplicateField { fragment: String, field: String },

    #[error("incompatible kinds for field `{field}` while composing `{fragment}`: {existing} vs {incoming}")]
    IncompatibleTrait {
        fragment: String,
        field: String,
        existing: String,
        incoming: String,
    },

    #[error("conflicting identity fields for array field `{field}`: `{existing}` vs `{incoming}`")]
    IdentityFieldConflict {
        field: String,
        existing: String,
        incoming: String,
    },

    #[error("no field at path `{0}`")]
    UnknownPath(String),

    #[error("stratum `{0}` is not in this model's precedence list")]
    UnknownStratum(String),

    #[error("primitive field kind must be a primitive value kind, got {0}")]
    NonPrimitiveKind(String),
}
