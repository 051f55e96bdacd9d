//! Non-fatal data faults collected during deserialization and resolution.
//!
//! Catalog data arrives from sources the engine does not control, so a
//! malformed field degrades to its default/empty value and the fault is
//! reported here instead of aborting the whole entity.

use thiserror::Error;

/// A recoverable data fault, tagged with the dotted path of the field it was
/// observed at (array elements use `field[index]`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("duplicate identity `{identity}` at `{path}` in stratum `{stratum}`")]
    DuplicateIdentity {
        path: String,
        stratum: String,
        identity: String,
    },

    /// A key in incoming data that the schema does not declare and does not
    /// retain. A warning, not an error: catalogs must stay forward-compatible
    /// with newer field additions.
    #[error("unknown field `{path}` dropped")]
    UnknownField { path: String },
}

impl Fault {
    /// Unknown fields are warnings; everything else is an error that caused a
    /// value substitution.
    pub fn is_warning(&self) -> bool {
        matches!(self, Fault::UnknownField { .. })
    }

    /// The field path the fault was observed at.
    pub fn path(&self) -> &str {
        match self {
            Fault::TypeMismatch { path, .. }
            | Fault::DuplicateIdentity { path, .. }
            | Fault::UnknownField { path } => path,
        }
    }

    /// Returns a copy of this fault with `prefix.` prepended to its path.
    /// Used when nested results bubble up to the parent object.
    pub fn prefixed(&self, prefix: &str) -> Fault {
        let reroot = |path: &str| {
            if path.is_empty() {
                prefix.to_owned()
            } else if path.starts_with('[') {
                format!("{prefix}{path}")
            } else {
                format!("{prefix}.{path}")
            }
        };
        match self {
            Fault::TypeMismatch {
                path,
                expected,
                found,
            } => Fault::TypeMismatch {
                path: reroot(path),
                expected: expected.clone(),
                found: found.clone(),
            },
            Fault::DuplicateIdentity {
                path,
                stratum,
                identity,
            } => Fault::DuplicateIdentity {
                path: reroot(path),
                stratum: stratum.clone(),
                identity: identity.clone(),
            },
            Fault::UnknownField { path } => Fault::UnknownField { path: reroot(path) },
        }
    }
}

/// An ordered collection of [`Fault`]s surfaced next to a best-effort result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    faults: Vec<Fault>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fault: Fault) {
        if fault.is_warning() {
            log::warn!("{fault}");
        } else {
            log::debug!("recovered data fault: {fault}");
        }
        self.faults.push(fault);
    }

    /// Absorb another diagnostic list, prefixing each fault's path.
    pub fn absorb(&mut self, other: Diagnostics, prefix: &str) {
        for fault in &other.faults {
            self.faults.push(fault.prefixed(prefix));
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.faults.extend(other.faults);
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter()
    }

    /// Faults that caused a value substitution (everything but warnings).
    pub fn errors(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter().filter(|f| !f.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter().filter(|f| f.is_warning())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Fault;
    type IntoIter = std::vec::IntoIter<Fault>;

    fn into_iter(self) -> Self::IntoIter {
        self.faults.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixing_reroots_paths() {
        let fault = Fault::TypeMismatch {
            path: "title".into(),
            expected: "String".into(),
            found: "Number".into(),
        };
        assert_eq!(fault.prefixed("legend").path(), "legend.title");

        let indexed = Fault::UnknownField {
            path: "[2].extra".into(),
        };
        assert_eq!(indexed.prefixed("items").path(), "items[2].extra");
    }

    #[test]
    fn warnings_are_separated_from_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Fault::UnknownField { path: "x".into() });
        diags.push(Fault::TypeMismatch {
            path: "y".into(),
            expected: "Number".into(),
            found: "String".into(),
        });
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(diags.errors().count(), 1);
    }
}
