//! Convenience re-exports of the public surface.

pub use crate::diagnostics::{Diagnostics, Fault};
pub use crate::errors::{StratabaseError, StratabaseResult};
pub use crate::interchange::{
    apply_plain, resolved_to_plain, stratum_from_plain, stratum_to_plain, value_to_plain,
};
pub use crate::model::{ChangeEvent, StratifiedModel};
pub use crate::resolve::{Resolved, ResolutionSource};
pub use crate::schema::{compose, FieldDescriptor, FieldKind, Schema, TraitFragment};
pub use crate::stratum::Stratum;
pub use crate::value::{Value, ValueKind, REMOVED_KEY};
