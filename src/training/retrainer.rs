//! Background training worker.
//!
//! All learning runs off the classification path: online per-sample updates
//! and full retrains are submitted to a single worker thread over a channel,
//! and the worker publishes results by swapping snapshots in [`SharedModel`].
//! The queue exposes an explicit completion signal ([`Retrainer::wait_idle`])
//! so tests and graceful shutdown can await quiescence instead of sleeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{MorphologyAnalyzer, TextPreprocessor, Utterance};
use crate::embedding::{IntentPrototypes, WordEmbeddingStore};
use crate::error::{ParlanceError, Result};
use crate::features::{FeatureExtractor, apply_activation_threshold};
use crate::intent::Intent;
use crate::neural::{FeedForwardNetwork, NetworkConfig};
use crate::training::state::{NetworkSnapshot, SharedModel};
use crate::training::store::TrainingSample;

/// Configuration for the online learning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// A full retrain is triggered every this many accumulated samples.
    pub retrain_interval: usize,
    /// Cap on stored samples; the oldest are pruned beyond it.
    pub max_samples: usize,
    /// Samples required before the word-weight signal starts scoring.
    pub min_samples_for_weights: usize,
    /// Samples required for a retrain to run instead of being skipped.
    pub min_retrain_samples: usize,
    /// Fraction of samples held out for validation.
    pub holdout_fraction: f64,
    /// Folds for cross-validated grid search.
    pub folds: usize,
    /// Whether retraining searches the hyperparameter grid.
    pub grid_search: bool,
    /// Seed for shuffling and splitting.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            retrain_interval: 50,
            max_samples: 1000,
            min_samples_for_weights: 50,
            min_retrain_samples: 10,
            holdout_fraction: 0.2,
            folds: 3,
            grid_search: true,
            seed: 42,
        }
    }
}

/// One point in the retraining search space.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperParams {
    pub learning_rate: f64,
    pub l2_penalty: f64,
    /// Feature components below this magnitude are zeroed.
    pub activation_threshold: f64,
}

impl Default for HyperParams {
    fn default() -> Self {
        HyperParams {
            learning_rate: 0.01,
            l2_penalty: 0.0,
            activation_threshold: 0.0,
        }
    }
}

impl HyperParams {
    /// The full search grid.
    pub fn grid() -> Vec<HyperParams> {
        let mut grid = Vec::new();
        for learning_rate in [0.005, 0.01, 0.05] {
            for l2_penalty in [0.0, 1e-4] {
                for activation_threshold in [0.0, 0.05] {
                    grid.push(HyperParams {
                        learning_rate,
                        l2_penalty,
                        activation_threshold,
                    });
                }
            }
        }
        grid
    }
}

/// Per-intent quality metrics on the validation split.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Validation samples actually labeled with this intent.
    pub support: usize,
}

/// Outcome of one full retrain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub accuracy: f64,
    pub per_intent: HashMap<Intent, IntentMetrics>,
    pub train_size: usize,
    pub validation_size: usize,
    /// Winning hyperparameters, when grid search ran.
    pub learning_rate: f64,
    pub l2_penalty: f64,
    pub activation_threshold: f64,
}

/// Counters kept across the worker's lifetime.
#[derive(Debug, Clone, Default)]
pub struct RetrainStats {
    pub online_updates: u64,
    pub retrains_completed: u64,
    pub retrains_skipped: u64,
    pub last_accuracy: Option<f64>,
}

/// Work items accepted by the training worker.
enum TrainingTask {
    /// Apply online epochs for one labeled sample.
    Online(Box<TrainingSample>),
    /// Full retrain over a snapshot of the sample store.
    Retrain(Vec<TrainingSample>),
}

/// Task counter with an idle signal.
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.idle.wait_for(&mut count, remaining);
        }
        true
    }

    fn current(&self) -> usize {
        *self.count.lock()
    }
}

/// Background worker that applies training tasks to the shared model.
pub struct Retrainer {
    sender: Sender<TrainingTask>,
    running: Arc<AtomicBool>,
    pending: Arc<Pending>,
    report: Arc<Mutex<Option<ValidationReport>>>,
    stats: Arc<Mutex<RetrainStats>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Retrainer {
    /// Spawn the worker thread.
    pub fn new(
        config: TrainingConfig,
        network_config: NetworkConfig,
        model: Arc<SharedModel>,
        store: Arc<WordEmbeddingStore>,
        preprocessor: Arc<TextPreprocessor>,
        morphology: Arc<MorphologyAnalyzer>,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let pending = Arc::new(Pending::default());
        let report = Arc::new(Mutex::new(None));
        let stats = Arc::new(Mutex::new(RetrainStats::default()));

        let worker = Worker {
            config,
            network_config,
            model,
            extractor: FeatureExtractor::new(Arc::clone(&store))?,
            store,
            preprocessor,
            morphology,
            report: Arc::clone(&report),
            stats: Arc::clone(&stats),
        };

        let handle = spawn_worker(worker, receiver, Arc::clone(&running), Arc::clone(&pending))?;

        Ok(Retrainer {
            sender,
            running,
            pending,
            report,
            stats,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Queue online epochs for one labeled sample.
    pub fn submit_online(&self, sample: TrainingSample) -> Result<()> {
        self.submit(TrainingTask::Online(Box::new(sample)))
    }

    /// Queue a full retrain over a snapshot of samples.
    pub fn submit_retrain(&self, samples: Vec<TrainingSample>) -> Result<()> {
        self.submit(TrainingTask::Retrain(samples))
    }

    fn submit(&self, task: TrainingTask) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(ParlanceError::training("training worker is stopped"));
        }
        self.pending.add();
        self.sender.send(task).map_err(|_| {
            self.pending.done();
            ParlanceError::training("training worker queue is closed")
        })
    }

    /// Block until every submitted task has completed, or the timeout passes.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.pending.wait_idle(timeout)
    }

    /// Tasks submitted but not yet completed.
    pub fn pending_tasks(&self) -> usize {
        self.pending.current()
    }

    /// Report of the most recent completed retrain.
    pub fn last_report(&self) -> Option<ValidationReport> {
        self.report.lock().clone()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> RetrainStats {
        self.stats.lock().clone()
    }

    /// Stop the worker and join it. Queued tasks are abandoned.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Retrainer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Retrainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrainer")
            .field("running", &self.running.load(Ordering::Acquire))
            .field("pending", &self.pending.current())
            .finish()
    }
}

fn spawn_worker(
    worker: Worker,
    receiver: Receiver<TrainingTask>,
    running: Arc<AtomicBool>,
    pending: Arc<Pending>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("parlance-trainer".to_string())
        .spawn(move || {
            while running.load(Ordering::Acquire) {
                match receiver.recv_timeout(Duration::from_millis(100)) {
                    Ok(task) => {
                        worker.handle(task);
                        pending.done();
                    }
                    Err(_) => {
                        // Timeout or closed channel; re-check the flag.
                    }
                }
            }
        })
        .map_err(|e| ParlanceError::training(format!("failed to spawn training worker: {e}")))
}

/// State owned by the worker thread.
struct Worker {
    config: TrainingConfig,
    network_config: NetworkConfig,
    model: Arc<SharedModel>,
    store: Arc<WordEmbeddingStore>,
    preprocessor: Arc<TextPreprocessor>,
    morphology: Arc<MorphologyAnalyzer>,
    extractor: FeatureExtractor,
    report: Arc<Mutex<Option<ValidationReport>>>,
    stats: Arc<Mutex<RetrainStats>>,
}

impl Worker {
    fn handle(&self, task: TrainingTask) {
        match task {
            TrainingTask::Online(sample) => self.online_update(&sample),
            TrainingTask::Retrain(samples) => self.retrain(&samples),
        }
    }

    /// Clone the network, apply online epochs, swap the snapshot.
    fn online_update(&self, sample: &TrainingSample) {
        let utterance = Utterance::analyze(&sample.text, &self.preprocessor, &self.morphology);
        if utterance.is_empty() {
            return;
        }

        let snapshot = self.model.network();
        let mut features = self.extractor.extract(&utterance);
        apply_activation_threshold(&mut features, snapshot.activation_threshold);

        let mut network = snapshot.network.clone();
        if let Err(e) = network.online_update(&features, sample.correct_intent.index()) {
            log::warn!("online update skipped: {e}");
            return;
        }

        self.model.replace_network(NetworkSnapshot {
            network,
            activation_threshold: snapshot.activation_threshold,
        });
        self.stats.lock().online_updates += 1;
        log::debug!(
            "online update applied for intent {}",
            sample.correct_intent
        );
    }

    /// Full retrain: split, search, fit, validate, swap.
    fn retrain(&self, samples: &[TrainingSample]) {
        match self.try_retrain(samples) {
            Ok(Some(report)) => {
                log::info!(
                    "retrain complete: accuracy {:.3} on {} validation samples (lr {}, l2 {}, threshold {})",
                    report.accuracy,
                    report.validation_size,
                    report.learning_rate,
                    report.l2_penalty,
                    report.activation_threshold,
                );
                let mut stats = self.stats.lock();
                stats.retrains_completed += 1;
                stats.last_accuracy = Some(report.accuracy);
                *self.report.lock() = Some(report);
            }
            Ok(None) => {
                self.stats.lock().retrains_skipped += 1;
            }
            Err(e) => {
                log::warn!("retrain failed, keeping previous model: {e}");
                self.stats.lock().retrains_skipped += 1;
            }
        }
    }

    fn try_retrain(&self, samples: &[TrainingSample]) -> Result<Option<ValidationReport>> {
        if samples.len() < self.config.min_retrain_samples {
            log::warn!(
                "skipping retrain: {} samples, need {}",
                samples.len(),
                self.config.min_retrain_samples
            );
            return Ok(None);
        }

        // Featurize once; the grid search reuses the raw vectors.
        let featurized: Vec<(Vec<f64>, usize)> = samples
            .par_iter()
            .filter_map(|sample| {
                let utterance =
                    Utterance::analyze(&sample.text, &self.preprocessor, &self.morphology);
                if utterance.is_empty() {
                    return None;
                }
                Some((
                    self.extractor.extract(&utterance),
                    sample.correct_intent.index(),
                ))
            })
            .collect();

        if featurized.len() < self.config.min_retrain_samples {
            log::warn!(
                "skipping retrain: only {} usable samples after analysis",
                featurized.len()
            );
            return Ok(None);
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..featurized.len()).collect();
        order.shuffle(&mut rng);

        let holdout = ((featurized.len() as f64 * self.config.holdout_fraction).round() as usize)
            .clamp(1, featurized.len() - 1);
        let split = featurized.len() - holdout;
        let train_raw: Vec<&(Vec<f64>, usize)> =
            order[..split].iter().map(|i| &featurized[*i]).collect();
        let validation_raw: Vec<&(Vec<f64>, usize)> =
            order[split..].iter().map(|i| &featurized[*i]).collect();

        let best = if self.config.grid_search {
            self.grid_search(&train_raw)
        } else {
            HyperParams {
                learning_rate: self.network_config.learning_rate,
                l2_penalty: self.network_config.l2_penalty,
                activation_threshold: self.model.network().activation_threshold,
            }
        };

        let train_set = thresholded_set(&train_raw, best.activation_threshold);
        let validation_set = thresholded_set(&validation_raw, best.activation_threshold);

        let mut network = FeedForwardNetwork::new(NetworkConfig {
            learning_rate: best.learning_rate,
            l2_penalty: best.l2_penalty,
            ..self.network_config.clone()
        });
        let mut epoch_set = train_set.clone();
        for _ in 0..self.network_config.epochs {
            epoch_set.shuffle(&mut rng);
            network.train_epoch(&epoch_set)?;
        }

        let report = validation_report(&network, &validation_set, train_set.len(), &best)?;

        self.model.replace_network(NetworkSnapshot {
            network,
            activation_threshold: best.activation_threshold,
        });
        let labeled: Vec<(Intent, String)> = samples
            .iter()
            .map(|s| (s.correct_intent, s.text.clone()))
            .collect();
        self.model.replace_prototypes(IntentPrototypes::build_with_samples(
            &self.store,
            &self.preprocessor,
            &labeled,
        ));

        Ok(Some(report))
    }

    /// Pick hyperparameters by k-fold cross-validated accuracy.
    fn grid_search(&self, train: &[&(Vec<f64>, usize)]) -> HyperParams {
        let folds = self.config.folds.clamp(2, train.len().max(2));
        let scored: Vec<(HyperParams, f64)> = HyperParams::grid()
            .into_par_iter()
            .map(|candidate| {
                let accuracy = self.cross_validate(train, &candidate, folds);
                (candidate, accuracy)
            })
            .collect();

        scored
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(candidate, _)| candidate)
            .unwrap_or_default()
    }

    fn cross_validate(
        &self,
        samples: &[&(Vec<f64>, usize)],
        candidate: &HyperParams,
        folds: usize,
    ) -> f64 {
        let mut total = 0.0;
        let mut counted = 0usize;
        for fold in 0..folds {
            let train: Vec<(Vec<f64>, usize)> = samples
                .iter()
                .enumerate()
                .filter(|(i, _)| i % folds != fold)
                .map(|(_, s)| {
                    (
                        thresholded(&s.0, candidate.activation_threshold),
                        s.1,
                    )
                })
                .collect();
            let held: Vec<(Vec<f64>, usize)> = samples
                .iter()
                .enumerate()
                .filter(|(i, _)| i % folds == fold)
                .map(|(_, s)| {
                    (
                        thresholded(&s.0, candidate.activation_threshold),
                        s.1,
                    )
                })
                .collect();
            if train.is_empty() || held.is_empty() {
                continue;
            }

            let mut network = FeedForwardNetwork::new(NetworkConfig {
                learning_rate: candidate.learning_rate,
                l2_penalty: candidate.l2_penalty,
                ..self.network_config.clone()
            });
            let mut failed = false;
            for _ in 0..self.network_config.epochs {
                if network.train_epoch(&train).is_err() {
                    failed = true;
                    break;
                }
            }
            if failed {
                continue;
            }
            if let Ok((_, accuracy)) = network.evaluate(&held) {
                total += accuracy;
                counted += 1;
            }
        }
        if counted == 0 { 0.0 } else { total / counted as f64 }
    }
}

fn thresholded(features: &[f64], threshold: f64) -> Vec<f64> {
    let mut copy = features.to_vec();
    apply_activation_threshold(&mut copy, threshold);
    copy
}

fn thresholded_set(samples: &[&(Vec<f64>, usize)], threshold: f64) -> Vec<(Vec<f64>, usize)> {
    samples
        .iter()
        .map(|(features, target)| (thresholded(features, threshold), *target))
        .collect()
}

/// Accuracy plus per-intent precision/recall/F1 on the validation split.
fn validation_report(
    network: &FeedForwardNetwork,
    validation: &[(Vec<f64>, usize)],
    train_size: usize,
    params: &HyperParams,
) -> Result<ValidationReport> {
    let mut true_positives: HashMap<usize, usize> = HashMap::new();
    let mut predicted_counts: HashMap<usize, usize> = HashMap::new();
    let mut actual_counts: HashMap<usize, usize> = HashMap::new();
    let mut correct = 0usize;

    for (features, target) in validation {
        let (predicted, _) = network.predict(features)?;
        *predicted_counts.entry(predicted).or_insert(0) += 1;
        *actual_counts.entry(*target).or_insert(0) += 1;
        if predicted == *target {
            correct += 1;
            *true_positives.entry(*target).or_insert(0) += 1;
        }
    }

    let mut per_intent = HashMap::new();
    for intent in Intent::ALL {
        let index = intent.index();
        let support = actual_counts.get(&index).copied().unwrap_or(0);
        let predicted = predicted_counts.get(&index).copied().unwrap_or(0);
        if support == 0 && predicted == 0 {
            continue;
        }
        let tp = true_positives.get(&index).copied().unwrap_or(0) as f64;
        let precision = if predicted > 0 { tp / predicted as f64 } else { 0.0 };
        let recall = if support > 0 { tp / support as f64 } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        per_intent.insert(
            intent,
            IntentMetrics {
                precision,
                recall,
                f1,
                support,
            },
        );
    }

    Ok(ValidationReport {
        accuracy: if validation.is_empty() {
            0.0
        } else {
            correct as f64 / validation.len() as f64
        },
        per_intent,
        train_size,
        validation_size: validation.len(),
        learning_rate: params.learning_rate,
        l2_penalty: params.l2_penalty,
        activation_threshold: params.activation_threshold,
    })
}
