//! # Type Taxonomy
//!
//! Type identities and the ancestor lattice that every registry in this crate
//! is indexed against.
//!
//! ## Overview
//!
//! The taxonomy is an external collaborator: the persistence layer knows which
//! types are entities or mapped superclasses, the failure layer knows how failure
//! types inherit from each other. Registries only depend on the [`TypeTaxonomy`]
//! trait, so they can be exercised against a synthetic lattice in tests.
//!
//! ## Key Types
//!
//! - [`TypeKey`]: cheap, cloneable type identity
//! - [`TypeRef`]: a type reference as declared by an extension (may be parameterized)
//! - [`TypeCategory`]: which family a type belongs to
//! - [`StaticTaxonomy`]: in-memory, multi-rooted lattice built once at startup
//!
//! ## Usage
//!
//! ```rust
//! use taxon_core::taxonomy::{StaticTaxonomy, TypeKey, TypeTaxonomy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let taxonomy = StaticTaxonomy::builder()
//!     .mapped_superclass("BaseEntity", &[])
//!     .entity("Book", &["BaseEntity"])
//!     .build()?;
//!
//! let ancestors = taxonomy.ancestors(&TypeKey::new("Book"));
//! assert_eq!(ancestors, vec![TypeKey::new("Book"), TypeKey::new("BaseEntity")]);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Identity of a type within a taxonomy.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// A type reference as an extension declares it.
///
/// Only [`TypeRef::Named`] can ever be a legal registration target. The other
/// forms exist so that declarations coming from dynamic sources (plugin
/// manifests, generated bindings) can be rejected with a precise reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A plain, non-parameterized named type
    Named(TypeKey),
    /// A generic type applied to arguments, e.g. `Page<Book>`
    Parameterized {
        raw: TypeKey,
        arguments: Vec<TypeRef>,
    },
    /// An unbound type variable, e.g. `T`
    Variable(String),
}

impl TypeRef {
    pub fn named(name: impl AsRef<str>) -> Self {
        Self::Named(TypeKey::new(name))
    }

    pub fn parameterized(raw: impl AsRef<str>, arguments: Vec<TypeRef>) -> Self {
        Self::Parameterized {
            raw: TypeKey::new(raw),
            arguments,
        }
    }

    /// The named type, if this reference is a plain named type.
    pub fn as_named(&self) -> Option<&TypeKey> {
        match self {
            Self::Named(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(key) => write!(f, "{key}"),
            Self::Parameterized { raw, arguments } => {
                write!(f, "{raw}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(">")
            }
            Self::Variable(name) => f.write_str(name),
        }
    }
}

impl From<TypeKey> for TypeRef {
    fn from(key: TypeKey) -> Self {
        Self::Named(key)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

/// Family a type belongs to within the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    /// Persistent entity type
    Entity,
    /// Abstract supertype whose properties are inherited by entities
    MappedSuperclass,
    /// Concrete or intermediate failure type
    Failure,
    /// One of the maximally general failure roots
    FailureRoot,
    /// Known to the taxonomy but belonging to no registrable family
    Unclassified,
}

impl TypeCategory {
    /// Whether draft pre-processors (and other entity extensions) may target this category.
    pub fn is_extension_target(self) -> bool {
        matches!(self, Self::Entity | Self::MappedSuperclass)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failure | Self::FailureRoot)
    }
}

/// The ancestor lattice consulted by registries and translation chains.
pub trait TypeTaxonomy: Send + Sync {
    /// Category of `ty`. Unknown types are [`TypeCategory::Unclassified`].
    fn category(&self, ty: &TypeKey) -> TypeCategory;

    /// Canonical identity of a declared type.
    ///
    /// Extensions may declare against a view of a type (for example the mutable
    /// draft of an entity); the registry groups them under the identity returned here.
    fn identity(&self, ty: &TypeKey) -> TypeKey {
        ty.clone()
    }

    /// Ancestor set of `ty`, including `ty` itself, in the taxonomy's own stable order.
    fn ancestors(&self, ty: &TypeKey) -> Vec<TypeKey>;

    /// Whether `sub` is a strict subtype of `sup`.
    fn is_strict_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        sub != sup && self.ancestors(sub).iter().any(|ancestor| ancestor == sup)
    }
}

/// Errors raised while building a [`StaticTaxonomy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("Type '{ty}' is declared more than once")]
    Duplicate { ty: TypeKey },

    #[error("Type '{ty}' names unknown parent '{parent}'")]
    UnknownParent { ty: TypeKey, parent: TypeKey },

    #[error("Alias '{alias}' points at unknown type '{target}'")]
    UnknownAliasTarget { alias: TypeKey, target: TypeKey },

    #[error("Type '{ty}' participates in an inheritance cycle")]
    Cycle { ty: TypeKey },
}

#[derive(Debug, Clone)]
struct TaxonomyNode {
    category: TypeCategory,
    ancestors: Vec<TypeKey>,
}

/// Immutable in-memory taxonomy.
///
/// Ancestors are precomputed at build time: the type itself first, then its
/// supertypes breadth-first in parent declaration order, each type listed once.
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomy {
    nodes: HashMap<TypeKey, TaxonomyNode>,
    aliases: HashMap<TypeKey, TypeKey>,
}

impl StaticTaxonomy {
    pub fn builder() -> StaticTaxonomyBuilder {
        StaticTaxonomyBuilder::default()
    }

    pub fn contains(&self, ty: &TypeKey) -> bool {
        self.nodes.contains_key(ty) || self.aliases.contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, ty: &TypeKey) -> Option<&TaxonomyNode> {
        let canonical = self.aliases.get(ty).unwrap_or(ty);
        self.nodes.get(canonical)
    }
}

impl TypeTaxonomy for StaticTaxonomy {
    fn category(&self, ty: &TypeKey) -> TypeCategory {
        self.node(ty)
            .map(|node| node.category)
            .unwrap_or(TypeCategory::Unclassified)
    }

    fn identity(&self, ty: &TypeKey) -> TypeKey {
        self.aliases.get(ty).cloned().unwrap_or_else(|| ty.clone())
    }

    fn ancestors(&self, ty: &TypeKey) -> Vec<TypeKey> {
        match self.node(ty) {
            Some(node) => node.ancestors.clone(),
            None => vec![ty.clone()],
        }
    }
}

#[derive(Debug, Clone)]
struct DeclaredType {
    key: TypeKey,
    category: TypeCategory,
    parents: Vec<TypeKey>,
}

/// Builder for [`StaticTaxonomy`].
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomyBuilder {
    declared: Vec<DeclaredType>,
    aliases: Vec<(TypeKey, TypeKey)>,
}

impl StaticTaxonomyBuilder {
    /// Declare a type with an explicit category and its direct parents.
    #[must_use]
    pub fn declare(mut self, name: &str, category: TypeCategory, parents: &[&str]) -> Self {
        self.declared.push(DeclaredType {
            key: TypeKey::new(name),
            category,
            parents: parents.iter().map(|parent| TypeKey::new(parent)).collect(),
        });
        self
    }

    #[must_use]
    pub fn entity(self, name: &str, parents: &[&str]) -> Self {
        self.declare(name, TypeCategory::Entity, parents)
    }

    #[must_use]
    pub fn mapped_superclass(self, name: &str, parents: &[&str]) -> Self {
        self.declare(name, TypeCategory::MappedSuperclass, parents)
    }

    #[must_use]
    pub fn failure(self, name: &str, parents: &[&str]) -> Self {
        self.declare(name, TypeCategory::Failure, parents)
    }

    #[must_use]
    pub fn failure_root(self, name: &str, parents: &[&str]) -> Self {
        self.declare(name, TypeCategory::FailureRoot, parents)
    }

    #[must_use]
    pub fn unclassified(self, name: &str, parents: &[&str]) -> Self {
        self.declare(name, TypeCategory::Unclassified, parents)
    }

    /// Declare `alias` as another name for `target`, e.g. a draft view of an entity.
    #[must_use]
    pub fn alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.push((TypeKey::new(alias), TypeKey::new(target)));
        self
    }

    pub fn build(self) -> Result<StaticTaxonomy, TaxonomyError> {
        let mut parents_of: HashMap<TypeKey, Vec<TypeKey>> = HashMap::new();
        let mut categories: HashMap<TypeKey, TypeCategory> = HashMap::new();
        for declared in &self.declared {
            if parents_of
                .insert(declared.key.clone(), declared.parents.clone())
                .is_some()
            {
                return Err(TaxonomyError::Duplicate {
                    ty: declared.key.clone(),
                });
            }
            categories.insert(declared.key.clone(), declared.category);
        }

        for declared in &self.declared {
            if let Some(parent) = declared
                .parents
                .iter()
                .find(|parent| !parents_of.contains_key(*parent))
            {
                return Err(TaxonomyError::UnknownParent {
                    ty: declared.key.clone(),
                    parent: parent.clone(),
                });
            }
        }

        detect_cycles(&self.declared, &parents_of)?;

        let mut aliases = HashMap::new();
        for (alias, target) in self.aliases {
            if !parents_of.contains_key(&target) {
                return Err(TaxonomyError::UnknownAliasTarget { alias, target });
            }
            if parents_of.contains_key(&alias) || aliases.contains_key(&alias) {
                return Err(TaxonomyError::Duplicate { ty: alias });
            }
            aliases.insert(alias, target);
        }

        let nodes = self
            .declared
            .iter()
            .map(|declared| {
                let node = TaxonomyNode {
                    category: categories[&declared.key],
                    ancestors: breadth_first_ancestors(&declared.key, &parents_of),
                };
                (declared.key.clone(), node)
            })
            .collect();

        Ok(StaticTaxonomy { nodes, aliases })
    }
}

fn breadth_first_ancestors(
    start: &TypeKey,
    parents_of: &HashMap<TypeKey, Vec<TypeKey>>,
) -> Vec<TypeKey> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut queue = VecDeque::from([start.clone()]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(parents) = parents_of.get(&current) {
            queue.extend(parents.iter().cloned());
        }
        ordered.push(current);
    }
    ordered
}

fn detect_cycles(
    declared: &[DeclaredType],
    parents_of: &HashMap<TypeKey, Vec<TypeKey>>,
) -> Result<(), TaxonomyError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        ty: &TypeKey,
        parents_of: &HashMap<TypeKey, Vec<TypeKey>>,
        marks: &mut HashMap<TypeKey, Mark>,
    ) -> Result<(), TaxonomyError> {
        match marks.get(ty) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(TaxonomyError::Cycle { ty: ty.clone() }),
            None => {}
        }
        marks.insert(ty.clone(), Mark::Visiting);
        for parent in parents_of.get(ty).into_iter().flatten() {
            visit(parent, parents_of, marks)?;
        }
        marks.insert(ty.clone(), Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for declared in declared {
        visit(&declared.key, parents_of, &mut marks)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> TypeKey {
        TypeKey::new(name)
    }

    #[test]
    fn test_ancestors_are_self_first_and_breadth_first() {
        let taxonomy = StaticTaxonomy::builder()
            .mapped_superclass("Auditable", &[])
            .mapped_superclass("Named", &[])
            .mapped_superclass("Base", &["Auditable"])
            .entity("Book", &["Base", "Named"])
            .build()
            .unwrap();

        assert_eq!(
            taxonomy.ancestors(&key("Book")),
            vec![key("Book"), key("Base"), key("Named"), key("Auditable")]
        );
    }

    #[test]
    fn test_diamond_lists_shared_ancestor_once() {
        let taxonomy = StaticTaxonomy::builder()
            .mapped_superclass("Root", &[])
            .mapped_superclass("Left", &["Root"])
            .mapped_superclass("Right", &["Root"])
            .entity("Leaf", &["Left", "Right"])
            .build()
            .unwrap();

        let ancestors = taxonomy.ancestors(&key("Leaf"));
        assert_eq!(ancestors.len(), 4);
        assert_eq!(ancestors.iter().filter(|t| **t == key("Root")).count(), 1);
    }

    #[test]
    fn test_unknown_type_is_its_own_only_ancestor() {
        let taxonomy = StaticTaxonomy::builder().build().unwrap();
        assert_eq!(taxonomy.ancestors(&key("Ghost")), vec![key("Ghost")]);
        assert_eq!(taxonomy.category(&key("Ghost")), TypeCategory::Unclassified);
    }

    #[test]
    fn test_alias_resolves_to_target_identity() {
        let taxonomy = StaticTaxonomy::builder()
            .entity("Book", &[])
            .alias("BookDraft", "Book")
            .build()
            .unwrap();

        assert_eq!(taxonomy.identity(&key("BookDraft")), key("Book"));
        assert_eq!(taxonomy.identity(&key("Book")), key("Book"));
        assert_eq!(taxonomy.category(&key("BookDraft")), TypeCategory::Entity);
    }

    #[test]
    fn test_strict_subtype() {
        let taxonomy = StaticTaxonomy::builder()
            .failure("IoFailure", &[])
            .failure("NetworkFailure", &["IoFailure"])
            .build()
            .unwrap();

        assert!(taxonomy.is_strict_subtype(&key("NetworkFailure"), &key("IoFailure")));
        assert!(!taxonomy.is_strict_subtype(&key("IoFailure"), &key("NetworkFailure")));
        assert!(!taxonomy.is_strict_subtype(&key("IoFailure"), &key("IoFailure")));
    }

    #[test]
    fn test_build_rejects_unknown_parent() {
        let result = StaticTaxonomy::builder().entity("Book", &["Missing"]).build();
        assert_eq!(
            result.unwrap_err(),
            TaxonomyError::UnknownParent {
                ty: key("Book"),
                parent: key("Missing"),
            }
        );
    }

    #[test]
    fn test_build_rejects_cycle() {
        let result = StaticTaxonomy::builder()
            .mapped_superclass("A", &["B"])
            .mapped_superclass("B", &["A"])
            .build();
        assert!(matches!(result, Err(TaxonomyError::Cycle { .. })));
    }

    #[test]
    fn test_build_rejects_duplicate() {
        let result = StaticTaxonomy::builder()
            .entity("Book", &[])
            .entity("Book", &[])
            .build();
        assert_eq!(result.unwrap_err(), TaxonomyError::Duplicate { ty: key("Book") });
    }

    #[test]
    fn test_type_ref_display() {
        let reference = TypeRef::parameterized("Page", vec![TypeRef::named("Book")]);
        assert_eq!(reference.to_string(), "Page<Book>");
        assert_eq!(TypeRef::Variable("T".to_string()).to_string(), "T");
        assert!(reference.as_named().is_none());
    }
}
