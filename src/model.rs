//! The stratified model instance: one modeled entity, its named value
//! strata, and on-demand per-field resolution.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use crate::diagnostics::Diagnostics;
use crate::errors::{StratabaseError, StratabaseResult};
use crate::resolve::{self, join_path, Provenance, Resolved, ResolutionSource};
use crate::schema::{FieldDescriptor, FieldKind, Schema};
use crate::stratum::Stratum;
use crate::value::Value;

/// Emitted on every write so a reactive layer built on top can subscribe.
/// The core itself never recomputes eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub stratum: String,
    /// Dotted field path, or empty when a whole stratum was replaced or
    /// removed.
    pub path: String,
}

/// One instantiated model: a composed schema, an ordered list of stratum
/// names defining precedence (highest first), and the strata written so far.
///
/// Renderers and other read-side collaborators use only [`resolved`] /
/// [`resolved_value`]; all mutation flows through [`set_value`],
/// [`remove_value`] and [`set_stratum`] so memoized resolutions stay honest.
///
/// [`resolved`]: StratifiedModel::resolved
/// [`resolved_value`]: StratifiedModel::resolved_value
/// [`set_value`]: StratifiedModel::set_value
/// [`remove_value`]: StratifiedModel::remove_value
/// [`set_stratum`]: StratifiedModel::set_stratum
pub struct StratifiedModel {
    schema: Schema,
    precedence: Vec<String>,
    strata: BTreeMap<String, Stratum>,
    revision: Cell<u64>,
    cache: RefCell<HashMap<String, (u64, Resolved)>>,
    listeners: Vec<Box<dyn FnMut(&ChangeEvent)>>,
}

impl std::fmt::Debug for StratifiedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StratifiedModel")
            .field("precedence", &self.precedence)
            .field("strata", &self.strata)
            .field("revision", &self.revision.get())
            .finish_non_exhaustive()
    }
}

impl StratifiedModel {
    /// Create an empty instance. `precedence` lists stratum names highest
    /// first (e.g. `["user", "definition", "underride"]`); only listed
    /// strata can ever be written.
    pub fn new<S: Into<String>>(schema: Schema, precedence: impl IntoIterator<Item = S>) -> Self {
        Self {
            schema,
            precedence: precedence.into_iter().map(Into::into).collect(),
            strata: BTreeMap::new(),
            revision: Cell::new(0),
            cache: RefCell::new(HashMap::new()),
            listeners: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Stratum names, highest precedence first.
    pub fn precedence(&self) -> &[String] {
        &self.precedence
    }

    pub fn stratum(&self, name: &str) -> Option<&Stratum> {
        self.strata.get(name)
    }

    /// Written strata in precedence order.
    pub fn strata(&self) -> impl Iterator<Item = &Stratum> {
        self.precedence
            .iter()
            .filter_map(|name| self.strata.get(name))
    }

    /// Register a change listener. Fired synchronously from every write.
    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replace a whole stratum at once, the loader path: deserialize fetched
    /// JSON into a stratum and write it here in a single step.
    pub fn set_stratum(&mut self, stratum: Stratum) -> StratabaseResult<()> {
        let name = stratum.name().to_owned();
        self.require_stratum(&name)?;
        self.strata.insert(name.clone(), stratum);
        self.touch(&name, "");
        Ok(())
    }

    /// Remove a stratum entirely; resolution falls through to the rest.
    pub fn remove_stratum(&mut self, name: &str) -> StratabaseResult<Option<Stratum>> {
        self.require_stratum(name)?;
        let removed = self.strata.remove(name);
        if removed.is_some() {
            self.touch(name, "");
        }
        Ok(removed)
    }

    /// Write one field value into a stratum. `path` may be dotted to reach
    /// fields of nested object kinds; intermediate objects are created as
    /// needed. The path must name a field the schema declares.
    pub fn set_value(
        &mut self,
        stratum: &str,
        path: &str,
        value: impl Into<Value>,
    ) -> StratabaseResult<()> {
        self.descriptor_at(path)?;
        self.require_stratum(stratum)?;
        let layer = self
            .strata
            .entry(stratum.to_owned())
            .or_insert_with(|| Stratum::new(stratum));

        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last().expect("path is never empty");
        let mut map = layer.values_mut();
        for segment in parents {
            let slot = map
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(BTreeMap::new()));
            if !matches!(slot, Value::Object(_)) {
                // A nested write through a non-object raw value replaces it.
                *slot = Value::Object(BTreeMap::new());
            }
            let Value::Object(inner) = slot else {
                unreachable!()
            };
            map = inner;
        }
        map.insert((*last).to_owned(), value.into());
        self.touch(stratum, path);
        Ok(())
    }

    /// Remove one field value from a stratum, if present.
    pub fn remove_value(&mut self, stratum: &str, path: &str) -> StratabaseResult<Option<Value>> {
        self.descriptor_at(path)?;
        self.require_stratum(stratum)?;
        let Some(layer) = self.strata.get_mut(stratum) else {
            return Ok(None);
        };

        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last().expect("path is never empty");
        let mut map = layer.values_mut();
        for segment in parents {
            match map.get_mut(*segment) {
                Some(Value::Object(inner)) => map = inner,
                _ => return Ok(None),
            }
        }
        let removed = map.remove(*last);
        if removed.is_some() {
            self.touch(stratum, path);
        }
        Ok(removed)
    }

    /// The descriptor a dotted path addresses. Paths descend through object
    /// kinds only; array elements are addressed by identity during merge,
    /// not by path.
    pub fn descriptor_at(&self, path: &str) -> StratabaseResult<&FieldDescriptor> {
        let mut schema = &self.schema;
        let mut segments = path.split('.').peekable();
        loop {
            let segment = segments
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| StratabaseError::UnknownPath(path.to_owned()))?;
            let field = schema
                .field(segment)
                .ok_or_else(|| StratabaseError::UnknownPath(path.to_owned()))?;
            if segments.peek().is_none() {
                return Ok(field);
            }
            match &field.kind {
                FieldKind::Object(nested) => schema = nested,
                _ => return Err(StratabaseError::UnknownPath(path.to_owned())),
            }
        }
    }

    /// Resolve one field: the value from the highest-precedence stratum that
    /// defines it, falling through lower strata, then the descriptor
    /// default, then the kind's empty value. Total — never "undefined".
    ///
    /// Results are memoized per path and invalidated by any write.
    pub fn resolved(&self, path: &str) -> StratabaseResult<Resolved> {
        let revision = self.revision.get();
        if let Some((cached_revision, cached)) = self.cache.borrow().get(path) {
            if *cached_revision == revision {
                return Ok(cached.clone());
            }
        }
        let resolved = self.resolved_uncached(path)?;
        self.cache
            .borrow_mut()
            .insert(path.to_owned(), (revision, resolved.clone()));
        Ok(resolved)
    }

    /// Just the value.
    pub fn resolved_value(&self, path: &str) -> StratabaseResult<Value> {
        Ok(self.resolved(path)?.value)
    }

    /// Where the resolved value came from; lets callers distinguish "absent"
    /// from "equal to the default".
    pub fn resolution_source(&self, path: &str) -> StratabaseResult<ResolutionSource> {
        Ok(self.resolved(path)?.source)
    }

    /// Whether any stratum defines the field, regardless of defaults.
    pub fn is_defined(&self, path: &str) -> StratabaseResult<bool> {
        Ok(matches!(
            self.resolution_source(path)?,
            ResolutionSource::Stratum(_)
        ))
    }

    /// Resolve every top-level field into one plain object, with all data
    /// faults recovered along the way.
    pub fn resolved_view(&self) -> (Value, Diagnostics) {
        let layers = self.top_layers();
        let (map, diagnostics) = resolve::resolve_object_fields("", &self.schema, &layers);
        (Value::Object(map), diagnostics)
    }

    /// Required fields that no stratum defines and that carry no default.
    pub fn missing_required(&self) -> Vec<String> {
        let layers = self.top_layers();
        self.schema
            .fields()
            .iter()
            .filter(|field| {
                field.required
                    && field.default_value.is_none()
                    && !layers.iter().any(|(_, map)| map.contains_key(&field.name))
            })
            .map(|field| field.name.clone())
            .collect()
    }

    fn top_layers(&self) -> Vec<(Provenance, &BTreeMap<String, Value>)> {
        self.precedence
            .iter()
            .filter_map(|name| {
                self.strata
                    .get(name)
                    .map(|s| (Provenance::Stratum(name.clone()), s.values()))
            })
            .collect()
    }

    fn resolved_uncached(&self, path: &str) -> StratabaseResult<Resolved> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(StratabaseError::UnknownPath(path.to_owned()));
        }

        let mut schema = &self.schema;
        let mut layers = self.top_layers();
        let mut diagnostics = Diagnostics::new();
        let mut prefix = String::new();

        for (i, segment) in segments.iter().enumerate() {
            let field = schema
                .field(segment)
                .ok_or_else(|| StratabaseError::UnknownPath(path.to_owned()))?;
            let full = join_path(&prefix, segment);

            if i == segments.len() - 1 {
                let mut defined: Vec<(Provenance, &Value)> = layers
                    .iter()
                    .filter_map(|(provenance, map)| {
                        map.get(*segment).map(|v| (provenance.clone(), v))
                    })
                    .collect();
                if let Some(default) = &field.default_value {
                    defined.push((Provenance::Default, default));
                }
                let mut resolved = resolve::resolve_field(&full, field, &defined);
                diagnostics.extend(resolved.diagnostics);
                resolved.diagnostics = diagnostics;
                return Ok(resolved);
            }

            // Descend one object level, narrowing each layer to the nested
            // map it defines; per-field precedence is preserved inside.
            let FieldKind::Object(nested) = &field.kind else {
                return Err(StratabaseError::UnknownPath(path.to_owned()));
            };
            let mut next: Vec<(Provenance, &BTreeMap<String, Value>)> = Vec::new();
            for (provenance, map) in &layers {
                match map.get(*segment) {
                    Some(Value::Object(sub)) => next.push((provenance.clone(), sub)),
                    Some(other) => diagnostics.push(crate::diagnostics::Fault::TypeMismatch {
                        path: full.clone(),
                        expected: crate::value::ValueKind::Object.to_string(),
                        found: other.kind().to_string(),
                    }),
                    None => {}
                }
            }
            if let Some(Value::Object(default_map)) = &field.default_value {
                next.push((Provenance::Default, default_map));
            }
            layers = next;
            schema = nested;
            prefix = full;
        }
        unreachable!("loop always returns on the last segment")
    }

    fn require_stratum(&self, name: &str) -> StratabaseResult<()> {
        if self.precedence.iter().any(|s| s == name) {
            Ok(())
        } else {
            Err(StratabaseError::UnknownStratum(name.to_owned()))
        }
    }

    fn touch(&mut self, stratum: &str, path: &str) {
        self.revision.set(self.revision.get() + 1);
        self.cache.borrow_mut().clear();
        let event = ChangeEvent {
            stratum: stratum.to_owned(),
            path: path.to_owned(),
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
