//! Shared fixtures: a library-domain taxonomy, instrumented taxonomies,
//! recording pre-processors and translators.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taxon_core::registry::{Draft, DraftPreProcessor, Extension, KeyGroup};
use taxon_core::taxonomy::{StaticTaxonomy, TypeCategory, TypeKey, TypeRef, TypeTaxonomy};
use taxon_core::translation::{
    FailureRef, FailureTranslator, FnTranslator, SimpleFailure, TranslationContext,
    TranslatorSource,
};

/// Entity and failure hierarchy used across the integration tests.
///
/// ```text
/// Auditable   Versioned            Failure (root)
///   │  └──┬──────┘                   ├── IoFailure
///   │    Book ◄── BookDraft (alias)  │    └── NetworkFailure
/// Author                             │         └── ConnectionRefused
/// Review                             └── RuntimeFailure (root)
///                                         ├── ConstraintViolation
///                                         │    └── DuplicateKey
///                                         ├── ServiceUnavailable
///                                         └── DomainFailure
/// ```
pub fn library_taxonomy() -> StaticTaxonomy {
    StaticTaxonomy::builder()
        .mapped_superclass("Auditable", &[])
        .mapped_superclass("Versioned", &[])
        .entity("Book", &["Auditable", "Versioned"])
        .entity("Author", &["Auditable"])
        .entity("Review", &[])
        .unclassified("Isbn", &[])
        .alias("BookDraft", "Book")
        .failure_root("Failure", &[])
        .failure_root("RuntimeFailure", &["Failure"])
        .failure("IoFailure", &["Failure"])
        .failure("NetworkFailure", &["IoFailure"])
        .failure("ConnectionRefused", &["NetworkFailure"])
        .failure("ConstraintViolation", &["RuntimeFailure"])
        .failure("DuplicateKey", &["ConstraintViolation"])
        .failure("ServiceUnavailable", &["RuntimeFailure"])
        .failure("DomainFailure", &["RuntimeFailure"])
        .build()
        .expect("library taxonomy is well formed")
}

/// Taxonomy wrapper counting `ancestors` calls per type.
pub struct CountingTaxonomy {
    inner: StaticTaxonomy,
    calls: Mutex<HashMap<TypeKey, usize>>,
}

impl CountingTaxonomy {
    pub fn new(inner: StaticTaxonomy) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn ancestor_calls(&self, ty: &str) -> usize {
        self.calls
            .lock()
            .get(&TypeKey::new(ty))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_ancestor_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

impl TypeTaxonomy for CountingTaxonomy {
    fn category(&self, ty: &TypeKey) -> TypeCategory {
        self.inner.category(ty)
    }

    fn identity(&self, ty: &TypeKey) -> TypeKey {
        self.inner.identity(ty)
    }

    fn ancestors(&self, ty: &TypeKey) -> Vec<TypeKey> {
        *self.calls.lock().entry(ty.clone()).or_insert(0) += 1;
        self.inner.ancestors(ty)
    }
}

/// Draft that records the names of the pre-processors that touched it.
#[derive(Debug, Clone)]
pub struct TestDraft {
    pub entity_type: TypeKey,
    pub stamps: Vec<String>,
}

impl TestDraft {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: TypeKey::new(entity_type),
            stamps: Vec::new(),
        }
    }
}

impl Draft for TestDraft {
    fn entity_type(&self) -> TypeKey {
        self.entity_type.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Pre-processor that stamps drafts with its name and logs every invocation.
pub struct RecordingPreProcessor {
    name: String,
    target: Option<TypeRef>,
    ignore_id_only: bool,
    ignored_groups: Vec<String>,
    invocations: Arc<Mutex<Vec<String>>>,
}

impl RecordingPreProcessor {
    pub fn new(name: &str, target: &str, invocations: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            target: Some(TypeRef::named(target)),
            ignore_id_only: false,
            ignored_groups: Vec::new(),
            invocations: Arc::clone(invocations),
        }
    }

    pub fn untyped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: None,
            ignore_id_only: false,
            ignored_groups: Vec::new(),
            invocations: Arc::default(),
        }
    }

    pub fn with_target(mut self, target: TypeRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn ignoring_id_only(mut self) -> Self {
        self.ignore_id_only = true;
        self
    }

    pub fn ignoring_key_group(mut self, group: &str) -> Self {
        self.ignored_groups.push(group.to_string());
        self
    }

    pub fn into_arc(self) -> Arc<dyn DraftPreProcessor> {
        Arc::new(self)
    }
}

impl Extension for RecordingPreProcessor {
    fn target_type(&self) -> Option<TypeRef> {
        self.target.clone()
    }

    fn implementation_name(&self) -> &str {
        &self.name
    }
}

impl DraftPreProcessor for RecordingPreProcessor {
    fn before_save(&self, draft: &mut dyn Draft) {
        self.invocations.lock().push(self.name.clone());
        if let Some(draft) = draft.as_any_mut().downcast_mut::<TestDraft>() {
            draft.stamps.push(self.name.clone());
        }
    }

    fn ignore_id_only(&self) -> bool {
        self.ignore_id_only
    }

    fn ignore_key_only(&self, group: &KeyGroup) -> bool {
        self.ignored_groups.iter().any(|name| name == group.name())
    }
}

pub fn failure(ty: &str, message: &str) -> FailureRef {
    SimpleFailure::new(ty, message).into_ref()
}

/// Translator rewriting any failure of `from` into a `to` failure, counting calls.
pub fn rewriting(
    name: &'static str,
    from: &str,
    to: &'static str,
    calls: &Arc<AtomicUsize>,
) -> TranslatorSource {
    let calls = Arc::clone(calls);
    FnTranslator::new(name, from, move |failure: &FailureRef, _: &TranslationContext| {
        calls.fetch_add(1, Ordering::SeqCst);
        let rewritten = SimpleFailure::new(to, failure.to_string()).with_cause(Arc::clone(failure));
        Some(rewritten.into_ref())
    })
    .into_arc()
    .into()
}

/// Translator that always declines by returning its input.
pub fn declining(name: &'static str, ty: &str, calls: &Arc<AtomicUsize>) -> TranslatorSource {
    let calls = Arc::clone(calls);
    FnTranslator::new(name, ty, move |failure: &FailureRef, _: &TranslationContext| {
        calls.fetch_add(1, Ordering::SeqCst);
        Some(Arc::clone(failure))
    })
    .into_arc()
    .into()
}

/// Translator declaring a type of the caller's choosing, possibly a non-class one.
pub struct DeclaredTranslator {
    pub name: &'static str,
    pub declared: Option<TypeRef>,
}

impl FailureTranslator for DeclaredTranslator {
    fn failure_type(&self) -> Option<TypeRef> {
        self.declared.clone()
    }

    fn implementation_name(&self) -> &str {
        self.name
    }

    fn translate(&self, _: &FailureRef, _: &TranslationContext) -> Option<FailureRef> {
        None
    }
}

pub fn declared(name: &'static str, declared: Option<TypeRef>) -> TranslatorSource {
    let translator: Arc<dyn FailureTranslator> = Arc::new(DeclaredTranslator { name, declared });
    TranslatorSource::from(translator)
}
