//! # Parlance
//!
//! A hybrid rule/ML intent classification engine for conversational agents.
//!
//! ## Features
//!
//! - Pure Rust implementation, bilingual (Russian/English) out of the box
//! - Rule signals: regex patterns, keyword sets, conversational transitions
//! - Learned signals: naive word-weight scoring and a from-scratch
//!   feed-forward network over hand-engineered features
//! - Weighted ensemble scoring with per-intent argument extraction
//! - Online learning from labeled samples and user feedback
//! - JSON model export/import
//!
//! ## Quick start
//!
//! ```
//! use parlance::parser::{IntentParser, ParserConfig};
//!
//! let parser = IntentParser::advanced(ParserConfig::default()).unwrap();
//! let result = parser.classify("привет, как дела?");
//! assert!(result.confidence > 0.0);
//! ```

pub mod analysis;
pub mod arguments;
pub mod cli;
pub mod context;
pub mod embedding;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod intent;
pub mod neural;
pub mod parser;
pub mod signal;
pub mod training;

pub use error::{ParlanceError, Result};
pub use intent::{Intent, ParsedIntent, Sentiment};
pub use parser::{IntentParser, ParserConfig};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
