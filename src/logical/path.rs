//! Path patterns and per-operation handlers.

use futures::future::BoxFuture;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{FieldData, FieldSchema, Operation, Request, Response};
use crate::errors::{Error, Result};

/// Future returned by path handlers
pub type OperationFuture<'a> = BoxFuture<'a, Result<Option<Response>>>;

/// Future returned by existence checks
pub type ExistenceFuture<'a> = BoxFuture<'a, Result<bool>>;

pub(crate) type OperationHandler<S> =
    Arc<dyn for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> OperationFuture<'a> + Send + Sync>;

pub(crate) type ExistenceHandler<S> =
    Arc<dyn for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> ExistenceFuture<'a> + Send + Sync>;

/// Regex fragment capturing a name segment into group `name`.
///
/// A name starts and ends with a word character and may contain `-` and `.`
/// in between.
pub fn generic_name_regex(name: &str) -> String {
    format!(r"(?P<{}>\w(([\w\-.]+)?\w)?)", name)
}

/// A routable path on a backend with state `S`.
pub struct Path<S> {
    pattern: String,
    regex: Regex,
    fields: Arc<HashMap<String, FieldSchema>>,
    operations: HashMap<Operation, OperationHandler<S>>,
    existence_check: Option<ExistenceHandler<S>>,
    help_synopsis: &'static str,
    help_description: &'static str,
}

impl<S> Path<S> {
    /// Compile `pattern`, anchored at both ends
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| Error::internal(format!("invalid path pattern '{}': {}", pattern, e)))?;

        Ok(Self {
            pattern,
            regex,
            fields: Arc::new(HashMap::new()),
            operations: HashMap::new(),
            existence_check: None,
            help_synopsis: "",
            help_description: "",
        })
    }

    pub fn field(mut self, name: &str, schema: FieldSchema) -> Self {
        Arc::make_mut(&mut self.fields).insert(name.to_string(), schema);
        self
    }

    pub fn operation<F>(mut self, operation: Operation, handler: F) -> Self
    where
        F: for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> OperationFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.operations.insert(operation, Arc::new(handler));
        self
    }

    pub fn existence_check<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a S, &'a Request, &'a FieldData) -> ExistenceFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.existence_check = Some(Arc::new(handler));
        self
    }

    pub fn help(mut self, synopsis: &'static str, description: &'static str) -> Self {
        self.help_synopsis = synopsis;
        self.help_description = description;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn help_synopsis(&self) -> &'static str {
        self.help_synopsis
    }

    pub fn help_description(&self) -> &'static str {
        self.help_description
    }

    pub fn fields(&self) -> &HashMap<String, FieldSchema> {
        &self.fields
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains_key(&operation)
    }

    /// Named captures if `path` matches this pattern
    pub fn matches(&self, path: &str) -> Option<Map<String, Value>> {
        let captures = self.regex.captures(path)?;
        let mut values = Map::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = captures.name(name) {
                values.insert(name.to_string(), Value::String(m.as_str().to_string()));
            }
        }
        Some(values)
    }

    /// Request data merged with path captures; captures win.
    pub fn field_data(&self, request: &Request, captures: Map<String, Value>) -> FieldData {
        let mut raw = request.data.clone();
        raw.extend(captures);
        FieldData::new(raw, Arc::clone(&self.fields))
    }

    pub(crate) fn handler(&self, operation: Operation) -> Option<&OperationHandler<S>> {
        self.operations.get(&operation)
    }

    pub(crate) fn existence_handler(&self) -> Option<&ExistenceHandler<S>> {
        self.existence_check.as_ref()
    }
}

impl<S> fmt::Debug for Path<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<_> = self.operations.keys().map(|op| op.as_str()).collect();
        operations.sort_unstable();

        f.debug_struct("Path")
            .field("pattern", &self.pattern)
            .field("operations", &operations)
            .field("existence_check", &self.existence_check.is_some())
            .finish()
    }
}
