//! Shared model state read by signals and written by training.
//!
//! Classification threads read immutable snapshots behind `Arc`; training
//! builds a replacement and swaps the pointer under a short write lock.
//! A classification that started before a swap finishes on its slightly
//! stale snapshot, which is acceptable; what can never happen is a torn
//! read of a half-updated table.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::embedding::IntentPrototypes;
use crate::neural::FeedForwardNetwork;
use crate::training::weights::WeightTable;

/// The network plus the input threshold it was tuned with.
#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    pub network: FeedForwardNetwork,
    /// Feature components below this magnitude are zeroed before the
    /// forward pass.
    pub activation_threshold: f64,
}

/// All learned state, snapshot-swapped as a unit per table.
pub struct SharedModel {
    weights: RwLock<Arc<WeightTable>>,
    network: RwLock<Arc<NetworkSnapshot>>,
    prototypes: RwLock<Arc<IntentPrototypes>>,
}

impl std::fmt::Debug for SharedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedModel")
            .field("weights", &self.weights.read().len())
            .field("prototypes", &self.prototypes.read().len())
            .finish()
    }
}

impl SharedModel {
    /// Create shared state from initial tables.
    pub fn new(
        weights: WeightTable,
        network: NetworkSnapshot,
        prototypes: IntentPrototypes,
    ) -> Self {
        SharedModel {
            weights: RwLock::new(Arc::new(weights)),
            network: RwLock::new(Arc::new(network)),
            prototypes: RwLock::new(Arc::new(prototypes)),
        }
    }

    /// Current weight table snapshot.
    pub fn weights(&self) -> Arc<WeightTable> {
        Arc::clone(&self.weights.read())
    }

    /// Current network snapshot.
    pub fn network(&self) -> Arc<NetworkSnapshot> {
        Arc::clone(&self.network.read())
    }

    /// Current prototype snapshot.
    pub fn prototypes(&self) -> Arc<IntentPrototypes> {
        Arc::clone(&self.prototypes.read())
    }

    /// Swap in a new weight table.
    pub fn replace_weights(&self, table: WeightTable) {
        *self.weights.write() = Arc::new(table);
    }

    /// Copy-on-write update of the weight table.
    ///
    /// The write lock is held across clone, mutate, and swap so concurrent
    /// updaters serialize instead of overwriting each other's tables.
    /// Readers holding a snapshot are unaffected.
    pub fn update_weights<F>(&self, mutate: F)
    where
        F: FnOnce(&mut WeightTable),
    {
        let mut guard = self.weights.write();
        let mut table = (**guard).clone();
        mutate(&mut table);
        *guard = Arc::new(table);
    }

    /// Swap in a new network snapshot.
    pub fn replace_network(&self, snapshot: NetworkSnapshot) {
        *self.network.write() = Arc::new(snapshot);
    }

    /// Swap in new prototypes.
    pub fn replace_prototypes(&self, prototypes: IntentPrototypes) {
        *self.prototypes.write() = Arc::new(prototypes);
    }
}
