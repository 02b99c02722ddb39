use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::distribution::Distribution;

/// Sentinel token marking the start of a sentence.
///
/// Prepended `n - 1` times before counting or scoring, so the first
/// real token always has a full-length context.
pub const START_TOKEN: &str = "<s>";

/// Sentinel token marking the end of a sentence.
///
/// Appended once; drawing it is what terminates generation.
pub const END_TOKEN: &str = "</s>";

/// Represents an n-gram language model over sentences of word tokens.
///
/// The `NGramModel` stores occurrence counts for n-grams and their
/// (n-1)-token contexts, and derives a conditional probability
/// distribution for every observed context. Probabilities are plain
/// maximum-likelihood relative frequencies, without smoothing.
///
/// # Responsibilities
/// - Pad sentences with boundary sentinels (on private copies, callers'
///   sentences are never modified)
/// - Accumulate n-gram and context counts over sliding windows
/// - Answer count, conditional probability and sentence probability queries
/// - Expose its tables read-only for sampling and snapshotting
///
/// # Invariants
/// - `n` is always >= 1
/// - Every context count equals the sum of the counts of its observed
///   continuations, so each context's probabilities sum to 1.0
/// - Distributions exist only for contexts observed during construction,
///   and only hold tokens with a positive count
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// The order of the model (number of tokens in an n-gram)
	n: usize, // must be >= 1

	/// Occurrence counts, keyed by full n-grams (length n) and by
	/// their context prefixes (length n-1). A context is incremented
	/// once for every n-gram that extends it.
	counts: HashMap<Vec<String>, usize>,

	/// Mapping from a context (length n-1) to its conditional
	/// distribution over continuation tokens.
	distributions: HashMap<Vec<String>, Distribution>,

	/// First token of every training sentence, in corpus order and
	/// with duplicates kept. Used to seed generation.
	beginning_words: Vec<String>,
}

impl NGramModel {
	/// Builds a model of order `n` from tokenized sentences.
	///
	/// Each sentence is padded on a private copy with `n - 1` start
	/// sentinels and one end sentinel; every length-`n` window of the
	/// padded sentence increments the count of the full n-gram and of
	/// its (n-1)-token prefix. The conditional probability tables are
	/// derived eagerly; the model is immutable afterwards.
	///
	/// # Parameters
	/// - `n`: Order of the model.
	/// - `sentences`: Tokenized sentences. An empty sentence still
	///   contributes one all-sentinel window but no beginning word.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize, sentences: &[Vec<String>]) -> Result<Self, String> {
		if n < 1 {
			return Err("n must be >= 1".to_owned());
		}

		let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
		let mut beginning_words = Vec::with_capacity(sentences.len());

		for sentence in sentences {
			if let Some(first) = sentence.first() {
				beginning_words.push(first.clone());
			}

			// Padding guarantees at least one window per sentence
			let padded = pad_sentence(n, sentence);
			for window in padded.windows(n) {
				*counts.entry(window.to_vec()).or_insert(0) += 1;
				*counts.entry(window[..n - 1].to_vec()).or_insert(0) += 1;
			}
		}

		// Derive the conditional probability of every observed n-gram:
		// token = last element, context = prefix.
		let mut probs: HashMap<Vec<String>, HashMap<String, f64>> = HashMap::new();
		for (ngram, &occurrences) in &counts {
			if ngram.len() != n {
				continue;
			}
			let context = &ngram[..n - 1];
			let context_count = counts.get(context).copied().unwrap_or(0);
			if context_count == 0 {
				// Should not happen, every n-gram increments its prefix
				continue;
			}
			probs
				.entry(context.to_vec())
				.or_default()
				.insert(ngram[n - 1].clone(), occurrences as f64 / context_count as f64);
		}

		let distributions = probs
			.into_iter()
			.map(|(context, probs)| (context.clone(), Distribution::new(context, probs)))
			.collect();

		Ok(Self { n, counts, distributions, beginning_words })
	}

	/// Returns the order `n` of the model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Returns the stored count for an exact n-gram or context tuple.
	///
	/// # Parameters
	/// - `tokens`: A tuple of length `n` (full n-gram) or `n - 1` (context).
	///
	/// # Returns
	/// The raw occurrence count; 0 for keys never observed.
	///
	/// # Errors
	/// Returns an error for any other tuple length.
	pub fn count(&self, tokens: &[String]) -> Result<usize, String> {
		if tokens.len() != self.n && tokens.len() != self.n - 1 {
			return Err(format!(
				"expected {} or {} tokens, got {}",
				self.n - 1,
				self.n,
				tokens.len()
			));
		}
		Ok(self.counts.get(tokens).copied().unwrap_or(0))
	}

	/// Conditional probability of `token` following `prev_tokens`.
	///
	/// Computed as `count(context + token) / count(context)`. A context
	/// never observed in training yields 0.0 rather than an error, the
	/// same value as a context whose observed continuations exclude
	/// `token`; callers that need to tell the two apart must check
	/// `distribution` for the context first.
	///
	/// # Errors
	/// Returns an error if `prev_tokens` does not hold exactly `n - 1`
	/// tokens.
	pub fn cond_prob(&self, token: &str, prev_tokens: &[String]) -> Result<f64, String> {
		if prev_tokens.len() != self.n - 1 {
			return Err(format!(
				"context must hold exactly {} tokens, got {}",
				self.n - 1,
				prev_tokens.len()
			));
		}
		Ok(self.cond_prob_padded(token, prev_tokens))
	}

	/// Conditional probability for a context of known-good length.
	fn cond_prob_padded(&self, token: &str, prev_tokens: &[String]) -> f64 {
		let context_count = self.counts.get(prev_tokens).copied().unwrap_or(0);
		if context_count == 0 {
			return 0.0;
		}

		let mut ngram = prev_tokens.to_vec();
		ngram.push(token.to_owned());
		let ngram_count = self.counts.get(&ngram).copied().unwrap_or(0);

		ngram_count as f64 / context_count as f64
	}

	/// Probability of a sentence under the model.
	///
	/// Pads a private copy of the sentence as in construction, then
	/// multiplies the conditional probability of every token given its
	/// preceding `n - 1` tokens. Returns 0.0 as soon as any factor is
	/// impossible.
	///
	/// # Notes
	/// Repeated multiplication of small floats underflows for long
	/// sentences; prefer `sent_log_prob` when numerical stability
	/// matters.
	pub fn sent_prob(&self, sentence: &[String]) -> f64 {
		let padded = pad_sentence(self.n, sentence);

		let mut prob = 1.0;
		for i in self.n - 1..padded.len() {
			prob *= self.cond_prob_padded(&padded[i], &padded[i + 1 - self.n..i]);
		}
		prob
	}

	/// Base-2 log-probability of a sentence under the model.
	///
	/// Same traversal as `sent_prob`, accumulating `log2` of each
	/// factor. A single zero-probability step makes the whole sentence
	/// impossible, so the function short-circuits and returns negative
	/// infinity immediately.
	pub fn sent_log_prob(&self, sentence: &[String]) -> f64 {
		let padded = pad_sentence(self.n, sentence);

		let mut log_prob = 0.0;
		for i in self.n - 1..padded.len() {
			let prob = self.cond_prob_padded(&padded[i], &padded[i + 1 - self.n..i]);
			if prob == 0.0 {
				return f64::NEG_INFINITY;
			}
			log_prob += prob.log2();
		}
		log_prob
	}

	/// Returns the full count table, keyed by n-gram and context tuples.
	///
	/// Read-only; intended for snapshotting by an outer persistence
	/// layer.
	pub fn counts(&self) -> &HashMap<Vec<String>, usize> {
		&self.counts
	}

	/// Returns the conditional distribution for a context, if observed.
	pub fn distribution(&self, context: &[String]) -> Option<&Distribution> {
		self.distributions.get(context)
	}

	/// Returns an iterator over all per-context distributions.
	pub fn distributions(&self) -> impl Iterator<Item = &Distribution> {
		self.distributions.values()
	}

	/// Returns the first token of every training sentence, in corpus
	/// order and with duplicates kept.
	pub fn beginning_words(&self) -> &[String] {
		&self.beginning_words
	}
}

/// Returns a new sentence padded with `n - 1` start sentinels and one
/// end sentinel. The caller's sentence is left untouched.
fn pad_sentence(n: usize, sentence: &[String]) -> Vec<String> {
	let mut padded = Vec::with_capacity(sentence.len() + n);
	for _ in 0..n - 1 {
		padded.push(START_TOKEN.to_owned());
	}
	padded.extend_from_slice(sentence);
	padded.push(END_TOKEN.to_owned());
	padded
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(words: &[&str]) -> Vec<String> {
		words.iter().map(|w| (*w).to_owned()).collect()
	}

	fn corpus() -> Vec<Vec<String>> {
		vec![tokens(&["the", "cat", "sat"]), tokens(&["the", "dog", "ran"])]
	}

	#[test]
	fn order_zero_is_rejected() {
		assert!(NGramModel::new(0, &[]).is_err());
	}

	#[test]
	fn bigram_counts_match_padded_corpus() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		assert_eq!(model.count(&tokens(&["the"])).unwrap(), 2);
		assert_eq!(model.count(&tokens(&["the", "cat"])).unwrap(), 1);
		assert_eq!(model.count(&tokens(&["<s>", "the"])).unwrap(), 2);
		assert_eq!(model.count(&tokens(&["sat", "</s>"])).unwrap(), 1);
		assert_eq!(model.count(&tokens(&["the", "fish"])).unwrap(), 0);
	}

	#[test]
	fn count_rejects_wrong_tuple_length() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		assert!(model.count(&tokens(&["the", "cat", "sat"])).is_err());
		assert!(model.count(&[]).is_err());
	}

	#[test]
	fn bigram_conditional_probabilities() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		assert_eq!(model.cond_prob("cat", &tokens(&["the"])).unwrap(), 0.5);
		assert_eq!(model.cond_prob("dog", &tokens(&["the"])).unwrap(), 0.5);
		assert_eq!(model.cond_prob("fish", &tokens(&["the"])).unwrap(), 0.0);
	}

	#[test]
	fn unseen_context_yields_zero() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		assert_eq!(model.cond_prob("cat", &tokens(&["fish"])).unwrap(), 0.0);
	}

	#[test]
	fn context_length_mismatch_is_rejected() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		assert!(model.cond_prob("cat", &tokens(&["the", "cat"])).is_err());
		assert!(model.cond_prob("cat", &[]).is_err());
	}

	#[test]
	fn unigram_empty_context_counts_the_end_sentinel() {
		let model = NGramModel::new(1, &[tokens(&["a"])]).unwrap();
		// Padded sentence is ["a", "</s>"], two unigram windows
		assert_eq!(model.count(&[]).unwrap(), 2);
		assert_eq!(model.count(&tokens(&["a"])).unwrap(), 1);
		assert_eq!(model.cond_prob("a", &[]).unwrap(), 0.5);
		assert_eq!(model.cond_prob(END_TOKEN, &[]).unwrap(), 0.5);
	}

	#[test]
	fn probability_mass_sums_to_one_per_context() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		for distribution in model.distributions() {
			let total: f64 = distribution.probs().values().sum();
			assert!(
				(total - 1.0).abs() < 1e-9,
				"context {:?} sums to {}",
				distribution.context(),
				total
			);
		}
	}

	#[test]
	fn stored_probabilities_match_count_ratios() {
		let model = NGramModel::new(3, &corpus()).unwrap();
		for distribution in model.distributions() {
			let context = distribution.context().to_vec();
			for (token, prob) in distribution.sorted() {
				assert_eq!(*prob, model.cond_prob(token, &context).unwrap());
			}
		}
	}

	#[test]
	fn sentence_probability_of_a_training_sentence() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		// P(the|<s>) = 1, P(cat|the) = 0.5, P(sat|cat) = 1, P(</s>|sat) = 1
		assert!((model.sent_prob(&tokens(&["the", "cat", "sat"])) - 0.5).abs() < 1e-12);
	}

	#[test]
	fn log_probability_agrees_with_linear_probability() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let sentence = tokens(&["the", "cat", "sat"]);
		let prob = model.sent_prob(&sentence);
		assert!(prob > 0.0);
		assert!((model.sent_log_prob(&sentence) - prob.log2()).abs() < 1e-9);
	}

	#[test]
	fn impossible_sentence_scores_zero_and_negative_infinity() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let sentence = tokens(&["the", "fish", "sat"]);
		assert_eq!(model.sent_prob(&sentence), 0.0);
		assert_eq!(model.sent_log_prob(&sentence), f64::NEG_INFINITY);
	}

	#[test]
	fn rebuilding_from_the_same_corpus_is_idempotent() {
		let first = NGramModel::new(2, &corpus()).unwrap();
		let second = NGramModel::new(2, &corpus()).unwrap();
		assert_eq!(first.counts(), second.counts());
		for distribution in first.distributions() {
			assert_eq!(Some(distribution), second.distribution(distribution.context()));
		}
	}

	#[test]
	fn caller_sentences_are_not_mutated() {
		let sentences = corpus();
		let before = sentences.clone();
		let _ = NGramModel::new(2, &sentences).unwrap();
		assert_eq!(sentences, before);
	}

	#[test]
	fn empty_sentence_still_contributes_one_window() {
		let model = NGramModel::new(2, &[vec![]]).unwrap();
		assert_eq!(model.count(&tokens(&["<s>", "</s>"])).unwrap(), 1);
		assert!(model.beginning_words().is_empty());
	}

	#[test]
	fn beginning_words_keep_corpus_order_and_duplicates() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		assert_eq!(model.beginning_words(), &tokens(&["the", "the"])[..]);
	}
}
