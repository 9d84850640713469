//! Online learning: sample accumulation, weight tables, and retraining.
//!
//! Learned state lives in [`SharedModel`] as immutable snapshots; the
//! classification path only ever reads them. Writes go through copy-on-write
//! updates on the calling thread (word weights, priors) or through the
//! [`Retrainer`] worker (network training), which swaps whole snapshots when
//! it finishes. [`interchange`] moves all of it in and out of JSON.

pub mod interchange;
pub mod retrainer;
pub mod state;
pub mod store;
pub mod weights;

pub use interchange::{ImportSummary, ModelExport};
pub use retrainer::{
    HyperParams, IntentMetrics, RetrainStats, Retrainer, TrainingConfig, ValidationReport,
};
pub use state::{NetworkSnapshot, SharedModel};
pub use store::{TrainingSample, TrainingStore};
pub use weights::WeightTable;
