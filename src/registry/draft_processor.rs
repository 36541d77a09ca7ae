//! # Draft Pre-Processors
//!
//! Extensions that get a chance to mutate an entity draft right before it is
//! saved, declared against an entity or mapped superclass.
//!
//! The registry resolves, per concrete entity type, every pre-processor declared
//! against the type or any of its ancestors and wraps them in a
//! [`CompositePreProcessor`]. The composite forwards `before_save` to each member
//! in resolution order, so later members observe the mutations of earlier ones,
//! and reports a capability flag as soon as one member opts in.

use super::extension_registry::{Compose, Extension, ExtensionRegistry};
use crate::taxonomy::{TypeKey, TypeRef};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Opaque mutable value handed to pre-processors.
pub trait Draft: Send {
    /// Concrete entity type of the draft
    fn entity_type(&self) -> TypeKey;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A named group of properties that together form a uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyGroup {
    name: String,
    properties: Vec<String>,
}

impl KeyGroup {
    pub const DEFAULT_NAME: &'static str = "";

    pub fn new(name: impl Into<String>, properties: Vec<String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn is_default(&self) -> bool {
        self.name == Self::DEFAULT_NAME
    }
}

/// Extension invoked before a draft of its target type is saved.
pub trait DraftPreProcessor: Extension {
    fn before_save(&self, draft: &mut dyn Draft);

    /// Skip pre-processing for drafts that only carry an identifier
    fn ignore_id_only(&self) -> bool {
        false
    }

    /// Skip pre-processing for drafts matched only by the properties of `group`
    fn ignore_key_only(&self, _group: &KeyGroup) -> bool {
        false
    }
}

/// Aggregate of every pre-processor applicable to one concrete type.
///
/// Only the registry builds these.
pub struct CompositePreProcessor {
    members: Vec<Arc<dyn DraftPreProcessor>>,
    ignore_id_only: bool,
    implementation_name: String,
}

impl CompositePreProcessor {
    pub(crate) fn new(members: Vec<Arc<dyn DraftPreProcessor>>) -> Self {
        let ignore_id_only = members.iter().any(|member| member.ignore_id_only());
        let implementation_name = format!(
            "CompositePreProcessor[{}]",
            members
                .iter()
                .map(|member| member.implementation_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            members,
            ignore_id_only,
            implementation_name,
        }
    }

    pub fn members(&self) -> &[Arc<dyn DraftPreProcessor>] {
        &self.members
    }
}

impl fmt::Debug for CompositePreProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositePreProcessor")
            .field("implementation_name", &self.implementation_name)
            .field("ignore_id_only", &self.ignore_id_only)
            .finish()
    }
}

impl Extension for CompositePreProcessor {
    fn target_type(&self) -> Option<TypeRef> {
        None
    }

    fn implementation_name(&self) -> &str {
        &self.implementation_name
    }
}

impl DraftPreProcessor for CompositePreProcessor {
    fn before_save(&self, draft: &mut dyn Draft) {
        for member in &self.members {
            member.before_save(draft);
        }
    }

    fn ignore_id_only(&self) -> bool {
        self.ignore_id_only
    }

    fn ignore_key_only(&self, group: &KeyGroup) -> bool {
        self.members.iter().any(|member| member.ignore_key_only(group))
    }
}

impl Compose for dyn DraftPreProcessor {
    const EXTENSION_POINT: &'static str = "DraftPreProcessor";

    fn compose(members: Vec<Arc<Self>>) -> Arc<Self> {
        Arc::new(CompositePreProcessor::new(members))
    }
}

pub type DraftPreProcessorRegistry = ExtensionRegistry<dyn DraftPreProcessor>;

impl ExtensionRegistry<dyn DraftPreProcessor> {
    /// Run every applicable pre-processor on `draft`.
    ///
    /// Returns `false` when no pre-processor applies to the draft's type.
    pub fn before_save(&self, draft: &mut dyn Draft) -> bool {
        match self.get(&draft.entity_type()) {
            Some(processor) => {
                processor.before_save(draft);
                true
            }
            None => false,
        }
    }
}

type BeforeSaveFn = dyn Fn(&mut dyn Draft) + Send + Sync;

/// Closure-backed pre-processor with an explicitly declared target type.
pub struct FnPreProcessor {
    name: String,
    target: TypeRef,
    before_save: Box<BeforeSaveFn>,
    ignore_id_only: bool,
    ignored_key_groups: HashSet<String>,
}

impl FnPreProcessor {
    pub fn new<F>(name: impl Into<String>, target: impl Into<TypeRef>, before_save: F) -> Self
    where
        F: Fn(&mut dyn Draft) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: target.into(),
            before_save: Box::new(before_save),
            ignore_id_only: false,
            ignored_key_groups: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_ignore_id_only(mut self, ignore: bool) -> Self {
        self.ignore_id_only = ignore;
        self
    }

    /// Ignore drafts matched only by the key group named `group`
    #[must_use]
    pub fn with_ignored_key_group(mut self, group: impl Into<String>) -> Self {
        self.ignored_key_groups.insert(group.into());
        self
    }

    pub fn into_arc(self) -> Arc<dyn DraftPreProcessor> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnPreProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPreProcessor")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

impl Extension for FnPreProcessor {
    fn target_type(&self) -> Option<TypeRef> {
        Some(self.target.clone())
    }

    fn implementation_name(&self) -> &str {
        &self.name
    }
}

impl DraftPreProcessor for FnPreProcessor {
    fn before_save(&self, draft: &mut dyn Draft) {
        (self.before_save)(draft);
    }

    fn ignore_id_only(&self) -> bool {
        self.ignore_id_only
    }

    fn ignore_key_only(&self, group: &KeyGroup) -> bool {
        self.ignored_key_groups.contains(group.name())
    }
}
