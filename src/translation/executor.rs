//! # Chain Executor
//!
//! Repeatedly rewrites a failure with the most specific applicable translator
//! until no translator applies or every applicable one declines.
//!
//! ## Algorithm
//!
//! ```text
//! current = failure, handled = {}
//! loop:
//!   for item in chain (specificity order):
//!     skip unless item.type ∈ ancestors(current) and item.type ∉ handled
//!     handled += item.type
//!     translated = item.translate(current)
//!     if translated is a different value: current = translated, restart loop
//!   return current
//! ```
//!
//! Every successful rewrite consumes one declared type from a finite set, so
//! the loop always terminates. The handled set is local to one call, which
//! makes [`ChainExecutor::translate`] safe to call from any number of threads.
//!
//! The executor never fails: when nothing applies the input comes back unchanged.

use super::chain::TranslationChain;
use super::translator::{same_failure, FailureRef, TranslationContext};
use crate::taxonomy::TypeKey;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Applies a [`TranslationChain`] to failures.
#[derive(Debug, Clone, Default)]
pub struct ChainExecutor {
    chain: Option<Arc<TranslationChain>>,
}

impl ChainExecutor {
    pub fn new(chain: Arc<TranslationChain>) -> Self {
        Self { chain: Some(chain) }
    }

    /// Executor that returns every failure unchanged, for when a merge yielded no chain.
    pub fn passthrough() -> Self {
        Self { chain: None }
    }

    pub fn chain(&self) -> Option<&Arc<TranslationChain>> {
        self.chain.as_ref()
    }

    /// Translate `failure` to its fixpoint.
    pub fn translate(&self, failure: FailureRef, context: &TranslationContext) -> FailureRef {
        self.translate_traced(failure, context).failure
    }

    /// Translate `failure` and report which declared types rewrote or declined it.
    #[instrument(
        skip(self, failure, context),
        fields(
            failure_type = %failure.failure_type(),
            correlation_id = ?context.correlation_id,
        )
    )]
    pub fn translate_traced(
        &self,
        failure: FailureRef,
        context: &TranslationContext,
    ) -> TranslationTrace {
        let mut trace = TranslationTrace {
            failure,
            applied: Vec::new(),
            declined: Vec::new(),
        };
        let Some(chain) = &self.chain else {
            return trace;
        };

        let taxonomy = chain.taxonomy();
        let mut handled: HashSet<TypeKey> = HashSet::new();

        'rescan: loop {
            let runtime_type = trace.failure.failure_type();
            let ancestors: HashSet<TypeKey> =
                taxonomy.ancestors(&runtime_type).into_iter().collect();

            for item in chain.items() {
                let declared = item.failure_type();
                if !ancestors.contains(declared) || handled.contains(declared) {
                    continue;
                }
                handled.insert(declared.clone());
                trace!(
                    runtime_type = %runtime_type,
                    declared = %declared,
                    translator = item.translator().implementation_name(),
                    "Applying translator"
                );

                match item.translator().translate(&trace.failure, context) {
                    Some(translated) if !same_failure(&translated, &trace.failure) => {
                        debug!(
                            from = %runtime_type,
                            to = %translated.failure_type(),
                            translator = item.translator().implementation_name(),
                            "Failure translated"
                        );
                        trace.applied.push(declared.clone());
                        trace.failure = translated;
                        continue 'rescan;
                    }
                    _ => trace.declined.push(declared.clone()),
                }
            }

            return trace;
        }
    }
}

impl From<Option<Arc<TranslationChain>>> for ChainExecutor {
    fn from(chain: Option<Arc<TranslationChain>>) -> Self {
        Self { chain }
    }
}

/// Outcome of one [`ChainExecutor::translate_traced`] call.
#[derive(Debug, Clone)]
pub struct TranslationTrace {
    /// The final failure
    pub failure: FailureRef,
    /// Declared types whose translators rewrote the failure, in application order
    pub applied: Vec<TypeKey>,
    /// Declared types whose translators were invoked and declined
    pub declined: Vec<TypeKey>,
}

impl TranslationTrace {
    pub fn was_translated(&self) -> bool {
        !self.applied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{StaticTaxonomy, TypeTaxonomy};
    use crate::translation::chain::TranslatorSource;
    use crate::translation::translator::{FnTranslator, SimpleFailure};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn taxonomy() -> Arc<dyn TypeTaxonomy> {
        Arc::new(
            StaticTaxonomy::builder()
                .failure_root("Failure", &[])
                .failure("IoFailure", &["Failure"])
                .failure("NetworkFailure", &["IoFailure"])
                .failure("ConnectionRefused", &["NetworkFailure"])
                .failure("ServiceUnavailable", &["Failure"])
                .build()
                .unwrap(),
        )
    }

    fn rewrite(name: &'static str, from: &str, to: &'static str) -> TranslatorSource {
        FnTranslator::new(name, from, move |failure: &FailureRef, _: &TranslationContext| {
            Some(SimpleFailure::new(to, format!("{name}: {failure}")).into_ref())
        })
        .into_arc()
        .into()
    }

    fn executor(sources: Vec<TranslatorSource>) -> ChainExecutor {
        ChainExecutor::from(TranslationChain::merge(taxonomy(), sources).unwrap())
    }

    fn failure(ty: &str) -> FailureRef {
        SimpleFailure::new(ty, "boom").into_ref()
    }

    #[test]
    fn test_most_specific_translator_wins() {
        let executor = executor(vec![
            rewrite("generic", "IoFailure", "ServiceUnavailable"),
            rewrite("refused", "NetworkFailure", "ServiceUnavailable"),
        ]);

        let trace =
            executor.translate_traced(failure("NetworkFailure"), &TranslationContext::new());
        assert_eq!(trace.applied, vec![TypeKey::new("NetworkFailure")]);
        assert!(trace.failure.to_string().contains("refused"));
    }

    #[test]
    fn test_no_matching_translator_returns_input() {
        let executor = executor(vec![rewrite("net", "NetworkFailure", "ServiceUnavailable")]);
        let input = failure("ServiceUnavailable");

        let output = executor.translate(Arc::clone(&input), &TranslationContext::new());
        assert!(same_failure(&input, &output));
    }

    #[test]
    fn test_passthrough_returns_input() {
        let input = failure("IoFailure");
        let output = ChainExecutor::passthrough()
            .translate(Arc::clone(&input), &TranslationContext::new());
        assert!(same_failure(&input, &output));
    }

    #[test]
    fn test_rewrite_restarts_at_more_specific_item() {
        // IoFailure is rewritten into ConnectionRefused, which matches the earlier,
        // more specific NetworkFailure item on the rescan.
        let executor = executor(vec![
            rewrite("io", "IoFailure", "ConnectionRefused"),
            rewrite("net", "NetworkFailure", "ServiceUnavailable"),
        ]);

        let trace = executor.translate_traced(failure("IoFailure"), &TranslationContext::new());
        assert_eq!(
            trace.applied,
            vec![TypeKey::new("IoFailure"), TypeKey::new("NetworkFailure")]
        );
        assert_eq!(trace.failure.failure_type(), TypeKey::new("ServiceUnavailable"));
    }

    #[test]
    fn test_translator_is_not_invoked_twice_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let looping = FnTranslator::new("looping", "IoFailure", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(SimpleFailure::new("IoFailure", "again").into_ref())
        });
        let executor = executor(vec![looping.into_arc().into()]);

        let trace = executor.translate_traced(failure("IoFailure"), &TranslationContext::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(trace.applied.len(), 1);

        // The handled set is per call.
        executor.translate(failure("IoFailure"), &TranslationContext::new());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_declining_translator_falls_through_to_general_one() {
        let declining = FnTranslator::new("declining", "NetworkFailure", |failure, _| {
            Some(Arc::clone(failure))
        });
        let executor = executor(vec![
            declining.into_arc().into(),
            rewrite("io", "IoFailure", "ServiceUnavailable"),
        ]);

        let trace =
            executor.translate_traced(failure("ConnectionRefused"), &TranslationContext::new());
        assert_eq!(trace.declined, vec![TypeKey::new("NetworkFailure")]);
        assert_eq!(trace.applied, vec![TypeKey::new("IoFailure")]);
        assert!(trace.was_translated());
    }

    #[test]
    fn test_context_is_passed_through() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = Arc::clone(&seen);
        let observing = FnTranslator::new("observing", "IoFailure", move |_, context| {
            *sink.lock() = context.statement.clone();
            None
        });
        let executor = executor(vec![observing.into_arc().into()]);

        let context = TranslationContext::new().with_statement("update book");
        executor.translate(failure("IoFailure"), &context);
        assert_eq!(seen.lock().as_deref(), Some("update book"));
    }
}
