//! # Translation Chain
//!
//! Merged, deduplicated and specificity-ordered list of failure translators.
//!
//! ## Merge Rules
//!
//! - A source that is itself a chain is unpacked into its items, so chains of
//!   chains never nest.
//! - Declared failure types are unique: when a type is declared again, the newest
//!   translator replaces the older one in the position the type first occupied.
//! - Merging nothing yields no chain at all rather than an empty chain.
//! - Items are ordered so a strict subtype is always tested before its supertypes
//!   (see [`ChainOrdering`]).
//!
//! ## Example
//!
//! ```rust
//! use taxon_core::taxonomy::StaticTaxonomy;
//! use taxon_core::translation::{FnTranslator, TranslationChain, TranslatorSource};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let taxonomy = Arc::new(
//!     StaticTaxonomy::builder()
//!         .failure_root("Failure", &[])
//!         .failure("IoFailure", &["Failure"])
//!         .build()?,
//! );
//!
//! let chain = TranslationChain::merge(
//!     taxonomy,
//!     vec![TranslatorSource::from(
//!         FnTranslator::new("IoRewrite", "IoFailure", |_, _| None).into_arc(),
//!     )],
//! )?;
//! assert_eq!(chain.map(|chain| chain.len()), Some(1));
//! # Ok(())
//! # }
//! ```

use super::ordering::ChainOrdering;
use super::translator::FailureTranslator;
use crate::config::ChainSettings;
use crate::error::{ConfigurationError, ConfigurationResult};
use crate::logging::{log_error, log_registry_operation};
use crate::taxonomy::{TypeCategory, TypeKey, TypeTaxonomy};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const EXTENSION_POINT: &str = "FailureTranslator";

/// One validated translator and the failure type it declared.
#[derive(Clone)]
pub struct ChainItem {
    failure_type: TypeKey,
    translator: Arc<dyn FailureTranslator>,
}

impl ChainItem {
    pub fn failure_type(&self) -> &TypeKey {
        &self.failure_type
    }

    pub fn translator(&self) -> &Arc<dyn FailureTranslator> {
        &self.translator
    }
}

impl fmt::Debug for ChainItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainItem")
            .field("failure_type", &self.failure_type)
            .field("translator", &self.translator.implementation_name())
            .finish()
    }
}

/// Input to [`TranslationChain::merge`]: a single translator or a previously built chain.
#[derive(Clone)]
pub enum TranslatorSource {
    Translator(Arc<dyn FailureTranslator>),
    Chain(Arc<TranslationChain>),
}

impl From<Arc<dyn FailureTranslator>> for TranslatorSource {
    fn from(translator: Arc<dyn FailureTranslator>) -> Self {
        Self::Translator(translator)
    }
}

impl From<Arc<TranslationChain>> for TranslatorSource {
    fn from(chain: Arc<TranslationChain>) -> Self {
        Self::Chain(chain)
    }
}

/// Immutable, specificity-ordered translator chain.
pub struct TranslationChain {
    taxonomy: Arc<dyn TypeTaxonomy>,
    items: Vec<ChainItem>,
    ordering: ChainOrdering,
}

impl TranslationChain {
    /// Merge `sources` with the default [`ChainOrdering`].
    pub fn merge<I>(
        taxonomy: Arc<dyn TypeTaxonomy>,
        sources: I,
    ) -> ConfigurationResult<Option<Arc<Self>>>
    where
        I: IntoIterator<Item = TranslatorSource>,
    {
        Self::merge_with_ordering(taxonomy, sources, ChainOrdering::default())
    }

    /// Merge `sources` with the ordering selected in `settings`.
    pub fn from_settings<I>(
        taxonomy: Arc<dyn TypeTaxonomy>,
        sources: I,
        settings: &ChainSettings,
    ) -> ConfigurationResult<Option<Arc<Self>>>
    where
        I: IntoIterator<Item = TranslatorSource>,
    {
        Self::merge_with_ordering(taxonomy, sources, settings.ordering)
    }

    /// Merge `sources` into a single flat chain.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::MissingTypeParameter`] if a translator declares no failure type
    /// - [`ConfigurationError::InvalidTranslatorType`] if the declared type is not a plain
    ///   named failure type
    /// - [`ConfigurationError::TooGeneralType`] if the declared type is a failure root
    pub fn merge_with_ordering<I>(
        taxonomy: Arc<dyn TypeTaxonomy>,
        sources: I,
        ordering: ChainOrdering,
    ) -> ConfigurationResult<Option<Arc<Self>>>
    where
        I: IntoIterator<Item = TranslatorSource>,
    {
        let mut positions: HashMap<TypeKey, usize> = HashMap::new();
        let mut merged: Vec<ChainItem> = Vec::new();
        let mut upsert = |item: ChainItem| match positions.get(&item.failure_type) {
            Some(&position) => {
                debug!(
                    failure_type = %item.failure_type,
                    replaced = merged[position].translator.implementation_name(),
                    translator = item.translator.implementation_name(),
                    "Replacing translator for already declared failure type"
                );
                merged[position] = item;
            }
            None => {
                positions.insert(item.failure_type.clone(), merged.len());
                merged.push(item);
            }
        };

        for source in sources {
            match source {
                TranslatorSource::Translator(translator) => {
                    let failure_type = validate_translator(taxonomy.as_ref(), translator.as_ref())
                        .inspect_err(|error| {
                            log_error(
                                "TranslationChain",
                                "merge",
                                &error.to_string(),
                                Some(error.implementation()),
                            );
                        })?;
                    upsert(ChainItem {
                        failure_type,
                        translator,
                    });
                }
                TranslatorSource::Chain(chain) => {
                    for item in &chain.items {
                        upsert(item.clone());
                    }
                }
            }
        }

        if merged.is_empty() {
            debug!("No translators declared, no chain built");
            return Ok(None);
        }

        let types: Vec<TypeKey> = merged.iter().map(|item| item.failure_type.clone()).collect();
        let permutation = ordering.order(taxonomy.as_ref(), &types);
        let mut slots: Vec<Option<ChainItem>> = merged.into_iter().map(Some).collect();
        let items: Vec<ChainItem> = permutation
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();

        log_registry_operation(
            "merge",
            EXTENSION_POINT,
            None,
            "constructed",
            Some(&format!("items={}, ordering={ordering:?}", items.len())),
        );

        Ok(Some(Arc::new(Self {
            taxonomy,
            items,
            ordering,
        })))
    }

    /// Items in testing order.
    pub fn items(&self) -> &[ChainItem] {
        &self.items
    }

    /// Declared failure types in testing order.
    pub fn failure_types(&self) -> Vec<&TypeKey> {
        self.items.iter().map(ChainItem::failure_type).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn taxonomy(&self) -> &Arc<dyn TypeTaxonomy> {
        &self.taxonomy
    }

    pub fn ordering(&self) -> ChainOrdering {
        self.ordering
    }

    pub fn stats(&self) -> TranslationChainStats {
        TranslationChainStats {
            item_count: self.items.len(),
            failure_types: self
                .items
                .iter()
                .map(|item| item.failure_type.to_string())
                .collect(),
            translators: self
                .items
                .iter()
                .map(|item| item.translator.implementation_name().to_string())
                .collect(),
            ordering: self.ordering,
        }
    }
}

impl fmt::Debug for TranslationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationChain")
            .field("items", &self.items)
            .field("ordering", &self.ordering)
            .finish()
    }
}

/// Resolve and check a translator's declared failure type.
fn validate_translator(
    taxonomy: &dyn TypeTaxonomy,
    translator: &dyn FailureTranslator,
) -> ConfigurationResult<TypeKey> {
    let implementation = translator.implementation_name();
    let declared = translator.failure_type().ok_or_else(|| {
        ConfigurationError::missing_type_parameter(implementation, EXTENSION_POINT)
    })?;
    let named = declared
        .as_named()
        .ok_or_else(|| ConfigurationError::non_class_translator(implementation, &declared))?;

    match taxonomy.category(named) {
        TypeCategory::FailureRoot => Err(ConfigurationError::too_general(
            implementation,
            named.clone(),
        )),
        category if category.is_failure() => Ok(named.clone()),
        category => Err(ConfigurationError::not_a_failure(
            implementation,
            named,
            category,
        )),
    }
}

/// Statistics about a translation chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationChainStats {
    pub item_count: usize,
    /// Declared failure types in testing order
    pub failure_types: Vec<String>,
    /// Translator implementation names in testing order
    pub translators: Vec<String>,
    pub ordering: ChainOrdering,
}
