//! # Failure Translation
//!
//! Chains of failure translators ordered by failure-type specificity.
//!
//! ## Overview
//!
//! A [`FailureTranslator`] declares the failure type it understands. Translators
//! (and previously built chains) are merged into a flat [`TranslationChain`] in
//! which every strict subtype is tested before its supertypes. A
//! [`ChainExecutor`] then rewrites a failure until no applicable translator is
//! left, applying each declared type at most once per call.
//!
//! ## Architecture
//!
//! ```text
//! Failure Translation
//! ├── FailureTranslator   (declared type + translate)
//! ├── TranslationChain    (validate, flatten, deduplicate, order)
//! │   └── ChainOrdering   (Topological | Pairwise)
//! └── ChainExecutor       (fixpoint rewrite, per-call handled set)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use taxon_core::taxonomy::{StaticTaxonomy, TypeKey};
//! use taxon_core::translation::{
//!     ChainExecutor, Failure, FnTranslator, SimpleFailure, TranslationChain,
//!     TranslationContext, TranslatorSource,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let taxonomy = Arc::new(
//!     StaticTaxonomy::builder()
//!         .failure_root("Failure", &[])
//!         .failure("NetworkFailure", &["Failure"])
//!         .failure("ServiceUnavailable", &["Failure"])
//!         .build()?,
//! );
//!
//! let unavailable = FnTranslator::new("Unavailable", "NetworkFailure", |failure, _| {
//!     Some(SimpleFailure::new("ServiceUnavailable", failure.to_string()).into_ref())
//! });
//! let sources = vec![TranslatorSource::from(unavailable.into_arc())];
//! let chain = TranslationChain::merge(taxonomy, sources)?;
//! let executor = ChainExecutor::from(chain);
//!
//! let failure = SimpleFailure::new("NetworkFailure", "connection refused").into_ref();
//! let translated = executor.translate(failure, &TranslationContext::new());
//! assert_eq!(translated.failure_type(), TypeKey::new("ServiceUnavailable"));
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod executor;
pub mod ordering;
pub mod translator;

pub use chain::{ChainItem, TranslationChain, TranslationChainStats, TranslatorSource};
pub use executor::{ChainExecutor, TranslationTrace};
pub use ordering::ChainOrdering;
pub use translator::{
    same_failure, Failure, FailureRef, FailureTranslator, FnTranslator, SimpleFailure,
    TranslationContext,
};
