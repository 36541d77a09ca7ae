#![allow(clippy::doc_markdown)] // Allow technical terms like DashMap, OnceLock in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Taxon Core
//!
//! Type-hierarchy indexed extension registries and failure-translation chains.
//!
//! ## Overview
//!
//! Applications register behaviors against *types* in a hierarchy: pre-save
//! hooks against entity types, translators against failure types. Given a
//! concrete type at runtime, the engine finds every applicable behavior by walking
//! the type's ancestors and combines them into one.
//!
//! The type hierarchy itself is not discovered here. It is injected through the
//! [`taxonomy::TypeTaxonomy`] trait; [`taxonomy::StaticTaxonomy`] is a ready made
//! table-driven implementation.
//!
//! ## Key Features
//!
//! - **Validated at startup**: malformed declarations fail registry or chain
//!   construction with a [`ConfigurationError`] naming the implementation
//! - **Resolve once per type**: resolutions are memoized with exactly-once
//!   computation per type and no blocking across types
//! - **Specificity ordering**: translators for a subtype always run before
//!   translators for its supertypes
//! - **Fixpoint translation**: a failure is rewritten until no translator applies,
//!   each declared type at most once per call
//!
//! ## Module Organization
//!
//! - [`taxonomy`] - Type keys, categories and the injected hierarchy oracle
//! - [`registry`] - Extension registries, resolution cache and draft pre-processors
//! - [`translation`] - Failure translators, chains and the chain executor
//! - [`config`] - Settings loading
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use taxon_core::registry::{DraftPreProcessorRegistry, FnPreProcessor};
//! use taxon_core::taxonomy::{StaticTaxonomy, TypeKey};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let taxonomy = Arc::new(
//!     StaticTaxonomy::builder()
//!         .mapped_superclass("Auditable", &[])
//!         .entity("Book", &["Auditable"])
//!         .entity("Author", &[])
//!         .build()?,
//! );
//!
//! let registry = DraftPreProcessorRegistry::new(
//!     taxonomy,
//!     vec![FnPreProcessor::new("AuditStamp", "Auditable", |_draft| {}).into_arc()],
//! )?;
//!
//! assert!(registry.get(&TypeKey::new("Book")).is_some());
//! assert!(registry.get(&TypeKey::new("Author")).is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib                          # Unit tests
//! cargo test                                # All tests
//! cargo bench --features benchmarks         # Criterion benchmarks
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod taxonomy;
pub mod translation;

pub use config::{Settings, SettingsError, SettingsLoader};
pub use error::{ConfigurationError, ConfigurationResult};
pub use registry::{
    Compose, DraftPreProcessor, DraftPreProcessorRegistry, Extension, ExtensionRegistry,
    ResolutionCache,
};
pub use taxonomy::{StaticTaxonomy, TaxonomyError, TypeCategory, TypeKey, TypeRef, TypeTaxonomy};
pub use translation::{
    ChainExecutor, ChainOrdering, Failure, FailureRef, FailureTranslator, TranslationChain,
    TranslationContext, TranslatorSource,
};
