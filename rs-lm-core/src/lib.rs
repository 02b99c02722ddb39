//! N-gram language modeling library for tokenized sentences.
//!
//! This crate provides a maximum-likelihood n-gram model including:
//! - Frequency counting over sentinel-padded token windows
//! - Conditional probability tables with token-sorted distributions
//! - Sentence probability and base-2 log-probability scoring
//! - Bounded sentence generation by inverse-transform sampling
//!
//! Corpus loading, tokenization and model persistence are left to the
//! callers; the model treats tokens as opaque strings and exposes its
//! tables read-only so an outer layer can snapshot them.

/// Core n-gram model and generation logic.
///
/// This module exposes the model builder, its per-context distributions
/// and the sentence generator.
pub mod model;
