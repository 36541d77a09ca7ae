use proptest::prelude::*;
use taxon_core::taxonomy::{StaticTaxonomy, TypeKey};

/// Random failure hierarchy under a single root. Type `F{i}` may only inherit
/// from types with a lower index, so the hierarchy is always acyclic.
#[derive(Debug, Clone)]
pub struct RandomLattice {
    /// Direct parents of each type, as indices
    pub parents: Vec<Vec<usize>>,
    /// Order in which translators are registered, as a permutation of the types
    pub registration: Vec<usize>,
}

impl RandomLattice {
    pub fn name(index: usize) -> String {
        format!("F{index}")
    }

    pub fn key(index: usize) -> TypeKey {
        TypeKey::new(Self::name(index))
    }

    pub fn taxonomy(&self) -> StaticTaxonomy {
        let mut builder = StaticTaxonomy::builder().failure_root("Root", &[]);
        for (index, parents) in self.parents.iter().enumerate() {
            let names: Vec<String> = parents.iter().map(|&parent| Self::name(parent)).collect();
            let mut refs: Vec<&str> = names.iter().map(String::as_str).collect();
            if refs.is_empty() {
                refs.push("Root");
            }
            builder = builder.failure(&Self::name(index), &refs);
        }
        builder.build().expect("generated lattice is acyclic")
    }

    /// Registration order as type keys
    pub fn registered_keys(&self) -> Vec<TypeKey> {
        self.registration.iter().map(|&index| Self::key(index)).collect()
    }
}

/// Strategy for generating lattices of 1 to 9 failure types
pub fn lattice_strategy() -> impl Strategy<Value = RandomLattice> {
    (1usize..10).prop_flat_map(|size| {
        let edges = prop::collection::vec(prop::collection::vec(any::<bool>(), size), size);
        let registration = Just((0..size).collect::<Vec<_>>()).prop_shuffle();
        (edges, registration).prop_map(|(edges, registration)| RandomLattice {
            parents: edges
                .iter()
                .enumerate()
                .map(|(child, row)| (0..child).filter(|&parent| row[parent]).collect())
                .collect(),
            registration,
        })
    })
}

/// Strategy for choosing which type a failure is raised with
pub fn raised_type_strategy(lattice: &RandomLattice) -> impl Strategy<Value = usize> {
    0..lattice.parents.len()
}
