//! # Extension Registry
//!
//! Registry of pluggable handlers, each declared against one node of the entity
//! taxonomy, resolved per concrete type into a single composed handler.
//!
//! ## Overview
//!
//! Declarations are validated and grouped once, at construction. Looking up a
//! concrete type walks its ancestor set, collects every handler registered
//! against any ancestor, and asks the handler family to [`Compose`] them. The
//! result (or the fact that nothing applies) is memoized in a
//! [`ResolutionCache`].
//!
//! ## Resolution Flow
//!
//! ```text
//! declarations ──► validate_target ──► groups[identity] (insertion order)
//!
//! get(T) ──► cache hit? ──yes──► cached Option<Arc<H>>
//!               │
//!               no
//!               ▼
//!   ancestors(T) ──► groups[a] for each ancestor a ──► H::compose(members)
//! ```
//!
//! ## Failure Semantics
//!
//! Every validation failure aborts construction with a [`ConfigurationError`];
//! a registry can never exist in a partially valid state. Lookups never fail.

use super::resolution_cache::{ResolutionCache, ResolutionCacheStats};
use crate::error::{ConfigurationError, ConfigurationResult};
use crate::logging::{log_error, log_registry_operation};
use crate::taxonomy::{TypeKey, TypeRef, TypeTaxonomy};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A handler that declares which taxonomy type it extends.
pub trait Extension: Send + Sync {
    /// The declared target type, or `None` if the implementation never stated one.
    fn target_type(&self) -> Option<TypeRef>;

    /// Name used in configuration errors and logs.
    fn implementation_name(&self) -> &str;
}

/// How a handler family aggregates the handlers matched for one concrete type.
pub trait Compose: Extension {
    /// Name of the extension point, used in error messages.
    const EXTENSION_POINT: &'static str;

    /// Build the composite over `members`, preserving their order.
    ///
    /// Only called with a non-empty member list.
    fn compose(members: Vec<Arc<Self>>) -> Arc<Self>;
}

/// Immutable, type-hierarchy indexed registry of extensions.
pub struct ExtensionRegistry<H: ?Sized + Compose> {
    taxonomy: Arc<dyn TypeTaxonomy>,
    groups: HashMap<TypeKey, Vec<Arc<H>>>,
    /// Target types in order of their first registration
    registered_types: Vec<TypeKey>,
    declaration_count: usize,
    cache: ResolutionCache<Arc<H>>,
}

impl<H: ?Sized + Compose> ExtensionRegistry<H> {
    /// Validate and group `declarations`.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::MissingTypeParameter`] if a declaration has no target type
    /// - [`ConfigurationError::InvalidTargetType`] if the target type is not a plain
    ///   named type classified as an entity or mapped superclass
    pub fn new<I>(taxonomy: Arc<dyn TypeTaxonomy>, declarations: I) -> ConfigurationResult<Self>
    where
        I: IntoIterator<Item = Arc<H>>,
    {
        let mut groups: HashMap<TypeKey, Vec<Arc<H>>> = HashMap::new();
        let mut registered_types = Vec::new();
        let mut declaration_count = 0;

        for declaration in declarations {
            let target = validate_target(taxonomy.as_ref(), declaration.as_ref()).inspect_err(
                |error| {
                    log_error(
                        "ExtensionRegistry",
                        H::EXTENSION_POINT,
                        &error.to_string(),
                        Some(error.implementation()),
                    );
                },
            )?;
            debug!(
                extension_point = H::EXTENSION_POINT,
                implementation = declaration.implementation_name(),
                target = %target,
                "Grouped extension declaration"
            );
            groups
                .entry(target)
                .or_insert_with_key(|target| {
                    registered_types.push(target.clone());
                    Vec::new()
                })
                .push(declaration);
            declaration_count += 1;
        }

        log_registry_operation(
            "register",
            H::EXTENSION_POINT,
            None,
            "constructed",
            Some(&format!(
                "declarations={declaration_count}, target_types={}",
                registered_types.len()
            )),
        );

        Ok(Self {
            taxonomy,
            groups,
            registered_types,
            declaration_count,
            cache: ResolutionCache::new(),
        })
    }

    /// Composite of every extension applicable to `ty`, or `None` if none applies.
    ///
    /// The first lookup of a type resolves and caches; later lookups return the
    /// same composite.
    pub fn get(&self, ty: &TypeKey) -> Option<Arc<H>> {
        self.cache.get_or_resolve(ty, |ty| self.resolve(ty))
    }

    fn resolve(&self, ty: &TypeKey) -> Option<Arc<H>> {
        let identity = self.taxonomy.identity(ty);
        let members: Vec<Arc<H>> = self
            .taxonomy
            .ancestors(&identity)
            .iter()
            .filter_map(|ancestor| self.groups.get(ancestor))
            .flatten()
            .cloned()
            .collect();

        debug!(
            extension_point = H::EXTENSION_POINT,
            ty = %ty,
            matched = members.len(),
            "Resolved extensions for type"
        );

        if members.is_empty() {
            None
        } else {
            Some(H::compose(members))
        }
    }

    /// Extensions registered against exactly `ty`, in registration order.
    pub fn group(&self, ty: &TypeKey) -> Option<&[Arc<H>]> {
        self.groups.get(ty).map(Vec::as_slice)
    }

    /// Target types in the order they were first registered.
    pub fn registered_types(&self) -> &[TypeKey] {
        &self.registered_types
    }

    /// Number of accepted declarations.
    pub fn len(&self) -> usize {
        self.declaration_count
    }

    pub fn is_empty(&self) -> bool {
        self.declaration_count == 0
    }

    pub fn stats(&self) -> ExtensionRegistryStats {
        ExtensionRegistryStats {
            extension_point: H::EXTENSION_POINT,
            declaration_count: self.declaration_count,
            target_type_count: self.registered_types.len(),
            cache: self.cache.stats(),
        }
    }
}

impl<H: ?Sized + Compose> fmt::Debug for ExtensionRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extension_point", &H::EXTENSION_POINT)
            .field("registered_types", &self.registered_types)
            .field("declaration_count", &self.declaration_count)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Resolve a declaration's target type to its taxonomy identity.
fn validate_target<H: ?Sized + Compose>(
    taxonomy: &dyn TypeTaxonomy,
    declaration: &H,
) -> ConfigurationResult<TypeKey> {
    let implementation = declaration.implementation_name();
    let declared = declaration.target_type().ok_or_else(|| {
        ConfigurationError::missing_type_parameter(implementation, H::EXTENSION_POINT)
    })?;
    let named = declared.as_named().ok_or_else(|| {
        ConfigurationError::non_class_target(implementation, H::EXTENSION_POINT, &declared)
    })?;

    let identity = taxonomy.identity(named);
    let category = taxonomy.category(&identity);
    if !category.is_extension_target() {
        return Err(ConfigurationError::target_outside_taxonomy(
            implementation,
            H::EXTENSION_POINT,
            named,
            category,
        ));
    }
    Ok(identity)
}

/// Statistics about an extension registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRegistryStats {
    pub extension_point: &'static str,
    pub declaration_count: usize,
    pub target_type_count: usize,
    pub cache: ResolutionCacheStats,
}
