//! # Registry Infrastructure
//!
//! Type-hierarchy indexed extension registries.
//!
//! ## Overview
//!
//! An extension declares one target type in the entity taxonomy. The registry
//! groups declarations by target type once, at startup, and resolves a concrete
//! type to the composite of every extension declared against the type or one
//! of its ancestors.
//!
//! ## Available Components
//!
//! - **ExtensionRegistry**: validation, grouping and cached resolution
//! - **ResolutionCache**: write-once-per-key memoization with no cross-key blocking
//! - **DraftPreProcessor**: the pre-save extension family and its composite
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── ExtensionRegistry<H>   (validate, group, resolve)
//! │   └── ResolutionCache    (TypeKey → Option<Arc<H>>)
//! └── DraftPreProcessor      (Compose impl → CompositePreProcessor)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use taxon_core::registry::{DraftPreProcessorRegistry, FnPreProcessor};
//! use taxon_core::taxonomy::{StaticTaxonomy, TypeKey};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let taxonomy = StaticTaxonomy::builder()
//!     .mapped_superclass("Base", &[])
//!     .entity("Book", &["Base"])
//!     .build()?;
//!
//! let registry = DraftPreProcessorRegistry::new(
//!     Arc::new(taxonomy),
//!     vec![FnPreProcessor::new("AuditStamp", "Base", |_draft| {}).into_arc()],
//! )?;
//!
//! assert!(registry.get(&TypeKey::new("Book")).is_some());
//! # Ok(())
//! # }
//! ```

pub mod draft_processor;
pub mod extension_registry;
pub mod resolution_cache;

pub use draft_processor::{
    CompositePreProcessor, Draft, DraftPreProcessor, DraftPreProcessorRegistry, FnPreProcessor,
    KeyGroup,
};
pub use extension_registry::{Compose, Extension, ExtensionRegistry, ExtensionRegistryStats};
pub use resolution_cache::{ResolutionCache, ResolutionCacheStats};
