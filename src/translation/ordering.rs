//! # Specificity Ordering
//!
//! Orders declared failure types so that a strict subtype is always tested
//! before any of its supertypes. Unrelated types keep their registration order.
//!
//! Two strategies are available:
//!
//! - [`ChainOrdering::Topological`] (default): Kahn's algorithm over the
//!   strict-subtype partial order, always emitting the lowest registration index
//!   among the ready types. Globally correct for any lattice.
//! - [`ChainOrdering::Pairwise`]: the legacy swap pass over every pair. Swaps
//!   move unrelated types out of registration order, so the relative position
//!   of unrelated translators differs from the topological order; kept for
//!   embedders that depend on it.

use crate::taxonomy::{TypeKey, TypeTaxonomy};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOrdering {
    #[default]
    Topological,
    Pairwise,
}

impl ChainOrdering {
    /// Permutation of `types` (as indices into it) in testing order.
    pub fn order(self, taxonomy: &dyn TypeTaxonomy, types: &[TypeKey]) -> Vec<usize> {
        let relation = SubtypeRelation::new(taxonomy, types);
        match self {
            Self::Topological => topological(&relation, types.len()),
            Self::Pairwise => pairwise(&relation, types.len()),
        }
    }
}

/// Strict-subtype relation among a fixed set of types, computed once.
struct SubtypeRelation<'a> {
    types: &'a [TypeKey],
    ancestors: Vec<HashSet<TypeKey>>,
}

impl<'a> SubtypeRelation<'a> {
    fn new(taxonomy: &dyn TypeTaxonomy, types: &'a [TypeKey]) -> Self {
        let ancestors = types
            .iter()
            .map(|ty| taxonomy.ancestors(ty).into_iter().collect())
            .collect();
        Self { types, ancestors }
    }

    /// `types[sub]` is a strict subtype of `types[sup]`
    fn is_strict_subtype(&self, sub: usize, sup: usize) -> bool {
        sub != sup
            && self.types[sub] != self.types[sup]
            && self.ancestors[sub].contains(&self.types[sup])
    }
}

fn topological(relation: &SubtypeRelation<'_>, len: usize) -> Vec<usize> {
    let mut successors = vec![Vec::new(); len];
    let mut pending = vec![0usize; len];
    for sub in 0..len {
        for sup in 0..len {
            if relation.is_strict_subtype(sub, sup) {
                successors[sub].push(sup);
                pending[sup] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..len)
        .filter(|&index| pending[index] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(len);
    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        for &next in &successors[index] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < len {
        // Only reachable with a taxonomy whose ancestor sets are mutually recursive.
        warn!(
            ordered = order.len(),
            total = len,
            "Subtype relation is cyclic, appending remaining types in registration order"
        );
        let placed: HashSet<usize> = order.iter().copied().collect();
        order.extend((0..len).filter(|index| !placed.contains(index)));
    }
    order
}

fn pairwise(relation: &SubtypeRelation<'_>, len: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    for i in 0..len {
        for j in (i + 1)..len {
            if relation.is_strict_subtype(order[j], order[i]) {
                order.swap(i, j);
            }
        }
    }
    order
}
