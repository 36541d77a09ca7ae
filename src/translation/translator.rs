//! # Failure Translators
//!
//! A translator rewrites a failure of its declared failure type (or any subtype)
//! into another failure, typically a more meaningful domain failure.

use crate::taxonomy::{TypeKey, TypeRef};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A failure value whose concrete runtime type is known to the taxonomy.
pub trait Failure: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Concrete runtime type of this failure
    fn failure_type(&self) -> TypeKey;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a failure. Identity is pointer identity.
pub type FailureRef = Arc<dyn Failure>;

/// Whether two handles point at the same failure value.
pub fn same_failure(left: &FailureRef, right: &FailureRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(left).cast::<()>(),
        Arc::as_ptr(right).cast::<()>(),
    )
}

/// Opaque context passed untouched to every translator of a chain.
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    /// Statement or operation that produced the failure
    pub statement: Option<String>,

    /// Correlation ID for logging/tracing
    pub correlation_id: Option<String>,

    /// Free-form attributes supplied by the caller
    pub attributes: HashMap<String, serde_json::Value>,
}

impl TranslationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Rewrites failures of one declared failure type.
pub trait FailureTranslator: Send + Sync {
    /// The declared failure type, or `None` if the implementation never stated one.
    fn failure_type(&self) -> Option<TypeRef>;

    fn implementation_name(&self) -> &str;

    /// Translate `failure`. Returning `None` or the same handle declines.
    fn translate(&self, failure: &FailureRef, context: &TranslationContext) -> Option<FailureRef>;
}

type TranslateFn = dyn Fn(&FailureRef, &TranslationContext) -> Option<FailureRef> + Send + Sync;

/// Closure-backed translator with an explicitly declared failure type.
pub struct FnTranslator {
    name: String,
    failure_type: TypeRef,
    translate: Box<TranslateFn>,
}

impl FnTranslator {
    pub fn new<F>(name: impl Into<String>, failure_type: impl Into<TypeRef>, translate: F) -> Self
    where
        F: Fn(&FailureRef, &TranslationContext) -> Option<FailureRef> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            failure_type: failure_type.into(),
            translate: Box::new(translate),
        }
    }

    pub fn into_arc(self) -> Arc<dyn FailureTranslator> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTranslator")
            .field("name", &self.name)
            .field("failure_type", &self.failure_type)
            .finish()
    }
}

impl FailureTranslator for FnTranslator {
    fn failure_type(&self) -> Option<TypeRef> {
        Some(self.failure_type.clone())
    }

    fn implementation_name(&self) -> &str {
        &self.name
    }

    fn translate(&self, failure: &FailureRef, context: &TranslationContext) -> Option<FailureRef> {
        (self.translate)(failure, context)
    }
}

/// General purpose failure value: a runtime type, a message and an optional cause.
#[derive(Debug, Clone)]
pub struct SimpleFailure {
    failure_type: TypeKey,
    message: String,
    cause: Option<FailureRef>,
}

impl SimpleFailure {
    pub fn new(failure_type: impl Into<TypeKey>, message: impl Into<String>) -> Self {
        Self {
            failure_type: failure_type.into(),
            message: message.into(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: FailureRef) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&FailureRef> {
        self.cause.as_ref()
    }

    pub fn into_ref(self) -> FailureRef {
        Arc::new(self)
    }
}

impl fmt::Display for SimpleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.failure_type, self.message)
    }
}

impl Failure for SimpleFailure {
    fn failure_type(&self) -> TypeKey {
        self.failure_type.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
