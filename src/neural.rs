//! From-scratch feed-forward network over utterance features.
//!
//! A single hidden layer with ReLU, softmax on the output, trained by plain
//! backpropagation with optional L2 weight decay. No tensor library: the
//! layers are `Vec<Vec<f64>>` and the math is written out, which keeps the
//! serialized form trivially portable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{ParlanceError, Result};
use crate::features::FEATURE_DIM;
use crate::intent::Intent;

/// Hyperparameters for network construction and training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Width of the input layer.
    pub input_size: usize,
    /// Width of the hidden layer.
    pub hidden_size: usize,
    /// Width of the output layer, one unit per intent.
    pub output_size: usize,
    /// Step size for gradient descent.
    pub learning_rate: f64,
    /// L2 weight decay coefficient. Zero disables decay.
    pub l2_penalty: f64,
    /// Epochs per full retraining run.
    pub epochs: usize,
    /// Backprop passes applied to each incrementally observed sample.
    pub online_epochs: usize,
    /// Seed for weight initialization.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            input_size: FEATURE_DIM,
            hidden_size: 64,
            output_size: Intent::COUNT,
            learning_rate: 0.01,
            l2_penalty: 0.0,
            epochs: 30,
            online_epochs: 5,
            seed: 42,
        }
    }
}

/// Dense network: input, one ReLU hidden layer, softmax output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNetwork {
    config: NetworkConfig,
    /// Row-major `[hidden][input]`.
    weights_input_hidden: Vec<Vec<f64>>,
    /// Row-major `[output][hidden]`.
    weights_hidden_output: Vec<Vec<f64>>,
    bias_hidden: Vec<f64>,
    bias_output: Vec<f64>,
    trained_samples: usize,
}

impl FeedForwardNetwork {
    /// Create a network with Xavier-initialized weights.
    pub fn new(config: NetworkConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let limit_ih = (6.0 / (config.input_size + config.hidden_size) as f64).sqrt();
        let weights_input_hidden = (0..config.hidden_size)
            .map(|_| {
                (0..config.input_size)
                    .map(|_| rng.random_range(-limit_ih..limit_ih))
                    .collect()
            })
            .collect();

        let limit_ho = (6.0 / (config.hidden_size + config.output_size) as f64).sqrt();
        let weights_hidden_output = (0..config.output_size)
            .map(|_| {
                (0..config.hidden_size)
                    .map(|_| rng.random_range(-limit_ho..limit_ho))
                    .collect()
            })
            .collect();

        FeedForwardNetwork {
            bias_hidden: vec![0.0; config.hidden_size],
            bias_output: vec![0.0; config.output_size],
            weights_input_hidden,
            weights_hidden_output,
            trained_samples: 0,
            config,
        }
    }

    /// Reassemble a network from serialized layers, validating shapes.
    pub fn from_parts(
        config: NetworkConfig,
        weights_input_hidden: Vec<Vec<f64>>,
        weights_hidden_output: Vec<Vec<f64>>,
        bias_hidden: Vec<f64>,
        bias_output: Vec<f64>,
    ) -> Result<Self> {
        let shape_ok = weights_input_hidden.len() == config.hidden_size
            && weights_input_hidden
                .iter()
                .all(|row| row.len() == config.input_size)
            && weights_hidden_output.len() == config.output_size
            && weights_hidden_output
                .iter()
                .all(|row| row.len() == config.hidden_size)
            && bias_hidden.len() == config.hidden_size
            && bias_output.len() == config.output_size;

        if !shape_ok {
            return Err(ParlanceError::model(format!(
                "layer shapes do not match architecture {}x{}x{}",
                config.input_size, config.hidden_size, config.output_size
            )));
        }

        Ok(FeedForwardNetwork {
            config,
            weights_input_hidden,
            weights_hidden_output,
            bias_hidden,
            bias_output,
            trained_samples: 0,
        })
    }

    /// Network configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// `(input, hidden, output)` layer widths.
    pub fn architecture(&self) -> (usize, usize, usize) {
        (
            self.config.input_size,
            self.config.hidden_size,
            self.config.output_size,
        )
    }

    /// Total samples this network has been trained on.
    pub fn trained_samples(&self) -> usize {
        self.trained_samples
    }

    /// Input-to-hidden weight matrix.
    pub fn weights_input_hidden(&self) -> &[Vec<f64>] {
        &self.weights_input_hidden
    }

    /// Hidden-to-output weight matrix.
    pub fn weights_hidden_output(&self) -> &[Vec<f64>] {
        &self.weights_hidden_output
    }

    /// Hidden layer bias.
    pub fn bias_hidden(&self) -> &[f64] {
        &self.bias_hidden
    }

    /// Output layer bias.
    pub fn bias_output(&self) -> &[f64] {
        &self.bias_output
    }

    /// Forward pass: softmax probabilities over intents.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.config.input_size {
            return Err(ParlanceError::model(format!(
                "input width {} does not match network input {}",
                input.len(),
                self.config.input_size
            )));
        }
        let (_, probs) = self.forward_layers(input);
        Ok(probs)
    }

    /// Index and probability of the most likely intent.
    pub fn predict(&self, input: &[f64]) -> Result<(usize, f64)> {
        let probs = self.forward(input)?;
        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        Ok((best, probs[best]))
    }

    /// One pass of backprop over the given samples, in order.
    ///
    /// Returns the mean cross-entropy loss of the pass. Sample order is the
    /// caller's concern; shuffling happens upstream.
    pub fn train_epoch(&mut self, samples: &[(Vec<f64>, usize)]) -> Result<f64> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        let mut total_loss = 0.0;
        for (input, target) in samples {
            total_loss += self.backprop(input, *target)?;
        }
        self.trained_samples += samples.len();
        Ok(total_loss / samples.len() as f64)
    }

    /// Apply the configured number of online passes to one sample.
    pub fn online_update(&mut self, input: &[f64], target: usize) -> Result<()> {
        for _ in 0..self.config.online_epochs {
            self.backprop(input, target)?;
        }
        self.trained_samples += 1;
        Ok(())
    }

    /// Mean loss and accuracy on a held-out set.
    pub fn evaluate(&self, samples: &[(Vec<f64>, usize)]) -> Result<(f64, f64)> {
        if samples.is_empty() {
            return Ok((0.0, 0.0));
        }
        let mut total_loss = 0.0;
        let mut correct = 0usize;
        for (input, target) in samples {
            let probs = self.forward(input)?;
            total_loss += cross_entropy(&probs, *target);
            let (best, _) = self.predict(input)?;
            if best == *target {
                correct += 1;
            }
        }
        Ok((
            total_loss / samples.len() as f64,
            correct as f64 / samples.len() as f64,
        ))
    }

    fn forward_layers(&self, input: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut hidden_pre = self.bias_hidden.clone();
        for (j, row) in self.weights_input_hidden.iter().enumerate() {
            let mut sum = 0.0;
            for (w, x) in row.iter().zip(input.iter()) {
                sum += w * x;
            }
            hidden_pre[j] += sum;
        }
        let hidden: Vec<f64> = hidden_pre.iter().map(|h| h.max(0.0)).collect();

        let mut output = self.bias_output.clone();
        for (j, row) in self.weights_hidden_output.iter().enumerate() {
            let mut sum = 0.0;
            for (w, h) in row.iter().zip(hidden.iter()) {
                sum += w * h;
            }
            output[j] += sum;
        }
        let probs = softmax(&output);
        (hidden, probs)
    }

    /// One gradient step on one sample; returns its cross-entropy loss.
    fn backprop(&mut self, input: &[f64], target: usize) -> Result<f64> {
        if input.len() != self.config.input_size {
            return Err(ParlanceError::model(format!(
                "input width {} does not match network input {}",
                input.len(),
                self.config.input_size
            )));
        }
        if target >= self.config.output_size {
            return Err(ParlanceError::model(format!(
                "target index {target} outside output layer of {}",
                self.config.output_size
            )));
        }

        let (hidden, probs) = self.forward_layers(input);
        let loss = cross_entropy(&probs, target);

        // Softmax with cross-entropy: output delta is probs minus one-hot.
        let mut delta_output = probs;
        delta_output[target] -= 1.0;

        let lr = self.config.learning_rate;
        let l2 = self.config.l2_penalty;

        let mut delta_hidden = vec![0.0; self.config.hidden_size];
        for (j, row) in self.weights_hidden_output.iter().enumerate() {
            for (k, w) in row.iter().enumerate() {
                delta_hidden[k] += delta_output[j] * w;
            }
        }
        for (k, d) in delta_hidden.iter_mut().enumerate() {
            if hidden[k] <= 0.0 {
                *d = 0.0;
            }
        }

        for (j, row) in self.weights_hidden_output.iter_mut().enumerate() {
            for (k, w) in row.iter_mut().enumerate() {
                *w -= lr * (delta_output[j] * hidden[k] + l2 * *w);
            }
            self.bias_output[j] -= lr * delta_output[j];
        }
        for (k, row) in self.weights_input_hidden.iter_mut().enumerate() {
            if delta_hidden[k] == 0.0 && l2 == 0.0 {
                continue;
            }
            for (i, w) in row.iter_mut().enumerate() {
                *w -= lr * (delta_hidden[k] * input[i] + l2 * *w);
            }
            self.bias_hidden[k] -= lr * delta_hidden[k];
        }

        Ok(loss)
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Cross-entropy of a probability vector against a target index.
fn cross_entropy(probs: &[f64], target: usize) -> f64 {
    -probs[target].max(1e-12).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> NetworkConfig {
        NetworkConfig {
            input_size: 8,
            hidden_size: 6,
            output_size: 4,
            learning_rate: 0.05,
            l2_penalty: 0.0,
            epochs: 30,
            online_epochs: 5,
            seed: 42,
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let net = FeedForwardNetwork::new(small_config());
        let input = vec![0.3; 8];
        let probs = net.forward(&input).unwrap();
        assert_eq!(probs.len(), 4);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "softmax sum was {sum}");
        assert!(probs.iter().all(|p| *p > 0.0));
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = FeedForwardNetwork::new(small_config());
        let b = FeedForwardNetwork::new(small_config());
        assert_eq!(a.weights_input_hidden(), b.weights_input_hidden());
        assert_eq!(a.weights_hidden_output(), b.weights_hidden_output());
    }

    #[test]
    fn test_wrong_input_width_is_an_error() {
        let net = FeedForwardNetwork::new(small_config());
        assert!(net.forward(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_training_separates_two_classes() {
        let mut net = FeedForwardNetwork::new(small_config());
        // Class 0 lives on the first half of the input, class 1 on the second.
        let mut samples = Vec::new();
        for i in 0..4 {
            let mut a = vec![0.0; 8];
            a[i] = 1.0;
            samples.push((a, 0usize));
            let mut b = vec![0.0; 8];
            b[4 + i] = 1.0;
            samples.push((b, 1usize));
        }

        let first_loss = net.train_epoch(&samples).unwrap();
        let mut last_loss = first_loss;
        for _ in 0..200 {
            last_loss = net.train_epoch(&samples).unwrap();
        }
        assert!(
            last_loss < first_loss,
            "loss did not fall: {first_loss} -> {last_loss}"
        );

        let (_, accuracy) = net.evaluate(&samples).unwrap();
        assert_eq!(accuracy, 1.0);
    }

    #[test]
    fn test_online_update_moves_prediction() {
        let mut net = FeedForwardNetwork::new(small_config());
        let input = vec![0.5; 8];
        let before = net.forward(&input).unwrap()[2];
        for _ in 0..20 {
            net.online_update(&input, 2).unwrap();
        }
        let after = net.forward(&input).unwrap()[2];
        assert!(after > before);
        assert_eq!(net.trained_samples(), 20);
    }

    #[test]
    fn test_l2_shrinks_weights() {
        let mut decayed = FeedForwardNetwork::new(NetworkConfig {
            l2_penalty: 0.1,
            ..small_config()
        });
        let mut plain = FeedForwardNetwork::new(small_config());
        let samples = vec![(vec![1.0; 8], 0usize)];
        for _ in 0..50 {
            decayed.train_epoch(&samples).unwrap();
            plain.train_epoch(&samples).unwrap();
        }
        let norm = |net: &FeedForwardNetwork| -> f64 {
            net.weights_hidden_output()
                .iter()
                .flat_map(|row| row.iter())
                .map(|w| w * w)
                .sum()
        };
        assert!(norm(&decayed) < norm(&plain));
    }

    #[test]
    fn test_from_parts_validates_shapes() {
        let config = small_config();
        let bad = FeedForwardNetwork::from_parts(
            config.clone(),
            vec![vec![0.0; 3]; 6],
            vec![vec![0.0; 6]; 4],
            vec![0.0; 6],
            vec![0.0; 4],
        );
        assert!(bad.is_err());

        let source = FeedForwardNetwork::new(config.clone());
        let rebuilt = FeedForwardNetwork::from_parts(
            config,
            source.weights_input_hidden().to_vec(),
            source.weights_hidden_output().to_vec(),
            source.bias_hidden().to_vec(),
            source.bias_output().to_vec(),
        )
        .unwrap();
        let input = vec![0.1; 8];
        assert_eq!(
            source.forward(&input).unwrap(),
            rebuilt.forward(&input).unwrap()
        );
    }

    #[test]
    fn test_invalid_target_is_an_error() {
        let mut net = FeedForwardNetwork::new(small_config());
        assert!(net.online_update(&vec![0.0; 8], 99).is_err());
    }
}
