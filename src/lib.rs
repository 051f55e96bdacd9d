//! # Stratabase
//!
//! A declarative multi-stratum model/trait system: schemas are assembled
//! from reusable trait fragments, populated from independently-writable
//! layers of values ("strata"), and resolved into one authoritative value
//! per field through deterministic precedence and merge rules.
//!
//! ## Features
//!
//! - **Composable schemas**: trait fragments combine via explicit,
//!   order-sensitive, associative composition — no inheritance, no diamond
//!   ambiguity, collision policy as a first-class rule
//! - **Stratified values**: any number of named layers (`"definition"`,
//!   `"user"`, `"underride"`, ...) with a fixed precedence order
//! - **Total resolution**: every field always resolves to *some* value
//!   (stratum, default, or kind-appropriate empty), with provenance
//! - **Identity-keyed array merge**: array elements match across strata by a
//!   declared identity field, merge recursively, and honor deletion markers
//! - **Forgiving interchange**: JSON in/out with per-field coercion; bad
//!   data degrades to defaults with a diagnostic list instead of aborting
//!
//! ## Quick Start
//!
//! ```
//! use stratabase::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> stratabase::StratabaseResult<()> {
//! let styling = TraitFragment::builder("styling")
//!     .register(FieldDescriptor::string("color").with_default("#ffffff"))?
//!     .register(FieldDescriptor::number("opacity").with_default(1.0))?
//!     .build();
//! let attribution = TraitFragment::builder("attribution")
//!     .register(FieldDescriptor::string("credit"))?
//!     .build();
//!
//! let schema = compose(&[styling, attribution])?;
//! let mut layer = StratifiedModel::new(schema, ["user", "definition"]);
//!
//! // A loader writes the definition stratum from fetched JSON.
//! let diags = apply_plain(
//!     &mut layer,
//!     "definition",
//!     &json!({"color": "#ff0000", "credit": "Example Org"}),
//! )?;
//! assert!(diags.is_empty());
//!
//! // Interactive edits land in the user stratum and take precedence.
//! layer.set_value("user", "color", "#00ff00")?;
//! assert_eq!(layer.resolved_value("color")?, "#00ff00".into());
//!
//! // Removing the edit falls back to the definition.
//! layer.remove_value("user", "color")?;
//! assert_eq!(layer.resolved_value("color")?, "#ff0000".into());
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod errors;
pub mod interchange;
pub mod model;
pub mod prelude;
pub mod schema;
pub mod stratum;
pub mod value;

mod merge;
mod resolve;

pub use errors::{StratabaseError, StratabaseResult};
pub use resolve::{Resolved, ResolutionSource};
