//! Top-level module for the n-gram language modeling system.
//!
//! This module provides a word-level n-gram model, including:
//! - Fixed-order count and probability tables (`NGramModel`)
//! - Per-context conditional distributions (`Distribution`)
//! - A bounded sentence generator (`SentenceGenerator`)

/// Per-context conditional distribution over continuation tokens.
///
/// Holds the probability map and its token-sorted pair list, and
/// performs inverse-transform sampling over the sorted pairs.
pub mod distribution;

/// Sentence generator bound to a trained model.
///
/// Samples tokens from the model's distributions using a trailing
/// context window, with an explicit maximum-length bound.
pub mod generator;

/// Fixed-order n-gram model (`n >= 1`).
///
/// Handles sentinel padding, window counting, conditional probability
/// queries and sentence scoring.
pub mod ngram_model;
