use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::ngram_model::{END_TOKEN, NGramModel, START_TOKEN};

/// Maximum number of tokens generated per sentence unless overridden.
///
/// Termination of generation is only probabilistic (the end sentinel
/// must be drawn), so every generation runs under an explicit bound.
pub const DEFAULT_MAX_TOKENS: usize = 1000;

/// Outcome of one bounded sentence generation.
///
/// # Variants
/// - `Complete(Vec<String>)`: the end sentinel was drawn; the tokens
///   exclude it.
/// - `Truncated(Vec<String>)`: the token bound was reached first.
#[derive(Clone, Debug, PartialEq)]
pub enum GeneratedSentence {
	Complete(Vec<String>),
	Truncated(Vec<String>),
}

impl GeneratedSentence {
	/// Returns the generated tokens, complete or not.
	pub fn tokens(&self) -> &[String] {
		match self {
			GeneratedSentence::Complete(tokens) | GeneratedSentence::Truncated(tokens) => tokens,
		}
	}

	/// Consumes the outcome and returns the generated tokens.
	pub fn into_tokens(self) -> Vec<String> {
		match self {
			GeneratedSentence::Complete(tokens) | GeneratedSentence::Truncated(tokens) => tokens,
		}
	}

	/// Returns true if generation hit the token bound before the end
	/// sentinel.
	pub fn is_truncated(&self) -> bool {
		matches!(self, GeneratedSentence::Truncated(_))
	}
}

/// Sentence generator bound to a trained `NGramModel`.
///
/// Holds a read-only reference to the model's tables and owns nothing
/// beyond its random source and the length bound; the model is never
/// copied or modified, so independent generators can share one model.
///
/// # Responsibilities
/// - Sample the next token for a token history (trailing n-1 window,
///   left-padded with start sentinels)
/// - Generate whole sentences seeded from the model's beginning words,
///   bounded by `max_tokens`
#[derive(Debug)]
pub struct SentenceGenerator<'a, R: Rng = StdRng> {
	model: &'a NGramModel,
	rng: R,
	/// Token bound applied by `generate_sentence`.
	pub max_tokens: usize,
}

impl<'a> SentenceGenerator<'a, StdRng> {
	/// Creates a generator with an OS-seeded random source.
	pub fn new(model: &'a NGramModel) -> Self {
		Self::with_rng(model, StdRng::from_os_rng())
	}

	/// Creates a generator with a deterministic seed.
	///
	/// Two generators built from the same model and seed produce the
	/// same sentences.
	pub fn from_seed(model: &'a NGramModel, seed: u64) -> Self {
		Self::with_rng(model, StdRng::seed_from_u64(seed))
	}
}

impl<'a, R: Rng> SentenceGenerator<'a, R> {
	/// Creates a generator over a caller-supplied random source.
	pub fn with_rng(model: &'a NGramModel, rng: R) -> Self {
		Self { model, rng, max_tokens: DEFAULT_MAX_TOKENS }
	}

	/// Samples the next token after `prev_tokens`.
	///
	/// The effective context is always exactly n-1 tokens: the trailing
	/// window of `prev_tokens`, left-padded with start sentinels while
	/// the history is shorter than n-1. Sampling walks the context's
	/// token-sorted distribution by inverse transform.
	///
	/// # Errors
	/// Returns an error if the effective context has no distribution,
	/// which only arises for histories never observed in training.
	pub fn generate_token(&mut self, prev_tokens: &[String]) -> Result<String, String> {
		let context = self.make_context(prev_tokens);
		let distribution = self
			.model
			.distribution(&context)
			.ok_or_else(|| format!("no distribution for context {:?}", context))?;

		match distribution.sample(&mut self.rng) {
			Some(token) => Ok(token.to_owned()),
			None => Err(format!("empty distribution for context {:?}", context)),
		}
	}

	/// Generates one sentence.
	///
	/// The first token is drawn uniformly from the model's beginning
	/// words; every following token is sampled from the distribution of
	/// the trailing window, until the end sentinel is drawn or
	/// `max_tokens` tokens have been produced. The end sentinel is not
	/// part of the returned tokens.
	///
	/// # Errors
	/// Returns an error if the model was built from an empty corpus, or
	/// if sampling reaches a context without a distribution (model and
	/// generator out of sync).
	pub fn generate_sentence(&mut self) -> Result<GeneratedSentence, String> {
		let first = match self.model.beginning_words().choose(&mut self.rng) {
			Some(word) => word.clone(),
			None => return Err("no beginning words, the model corpus was empty".to_owned()),
		};

		let mut tokens = vec![first];
		while tokens.len() < self.max_tokens {
			let token = self.generate_token(&tokens)?;
			if token == END_TOKEN {
				return Ok(GeneratedSentence::Complete(tokens));
			}
			tokens.push(token);
		}

		Ok(GeneratedSentence::Truncated(tokens))
	}

	/// Builds the effective n-1 token context for a history.
	fn make_context(&self, prev_tokens: &[String]) -> Vec<String> {
		let len = self.model.order() - 1;

		let mut context = Vec::with_capacity(len);
		if prev_tokens.len() < len {
			for _ in 0..len - prev_tokens.len() {
				context.push(START_TOKEN.to_owned());
			}
			context.extend_from_slice(prev_tokens);
		} else {
			context.extend_from_slice(&prev_tokens[prev_tokens.len() - len..]);
		}
		context
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand_chacha::ChaCha8Rng;

	use super::*;

	fn tokens(words: &[&str]) -> Vec<String> {
		words.iter().map(|w| (*w).to_owned()).collect()
	}

	fn corpus() -> Vec<Vec<String>> {
		vec![tokens(&["the", "cat", "sat"]), tokens(&["the", "dog", "ran"])]
	}

	#[test]
	fn short_history_is_padded_with_start_sentinels() {
		let model = NGramModel::new(3, &corpus()).unwrap();
		let mut generator = SentenceGenerator::from_seed(&model, 1);
		// The context [<s>, <s>] only ever continues with "the"
		assert_eq!(generator.generate_token(&[]).unwrap(), "the");
	}

	#[test]
	fn long_history_uses_the_trailing_window() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut generator = SentenceGenerator::from_seed(&model, 1);
		// Only the trailing token matters for a bigram context
		assert_eq!(generator.generate_token(&tokens(&["ran", "sat", "cat"])).unwrap(), "sat");
	}

	#[test]
	fn unknown_context_is_a_loud_error() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut generator = SentenceGenerator::from_seed(&model, 1);
		assert!(generator.generate_token(&tokens(&["fish"])).is_err());
	}

	#[test]
	fn generated_sentences_are_complete_and_exclude_sentinels() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut generator = SentenceGenerator::from_seed(&model, 42);
		for _ in 0..50 {
			let sentence = generator.generate_sentence().unwrap();
			assert!(!sentence.is_truncated());
			assert_eq!(sentence.tokens().first().map(String::as_str), Some("the"));
			assert!(sentence.tokens().iter().all(|t| t != END_TOKEN && t != START_TOKEN));
		}
	}

	#[test]
	fn same_seed_reproduces_the_same_sentences() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut first = SentenceGenerator::from_seed(&model, 7);
		let mut second = SentenceGenerator::from_seed(&model, 7);
		for _ in 0..10 {
			assert_eq!(
				first.generate_sentence().unwrap(),
				second.generate_sentence().unwrap()
			);
		}
	}

	#[test]
	fn generation_stops_at_the_configured_bound() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut generator = SentenceGenerator::from_seed(&model, 3);
		generator.max_tokens = 1;
		let sentence = generator.generate_sentence().unwrap();
		assert!(sentence.is_truncated());
		assert_eq!(sentence.tokens().len(), 1);
	}

	#[test]
	fn empty_model_cannot_seed_generation() {
		let model = NGramModel::new(2, &[]).unwrap();
		let mut generator = SentenceGenerator::from_seed(&model, 1);
		assert!(generator.generate_sentence().is_err());
	}

	#[test]
	fn caller_supplied_rng_sources_are_accepted() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut generator = SentenceGenerator::with_rng(&model, ChaCha8Rng::seed_from_u64(11));
		assert!(generator.generate_sentence().is_ok());
	}

	#[test]
	fn token_sampling_matches_the_conditional_probabilities() {
		let model = NGramModel::new(2, &corpus()).unwrap();
		let mut generator = SentenceGenerator::with_rng(&model, ChaCha8Rng::seed_from_u64(5));
		let context = tokens(&["the"]);

		let draws = 10_000;
		let mut cats = 0usize;
		for _ in 0..draws {
			if generator.generate_token(&context).unwrap() == "cat" {
				cats += 1;
			}
		}

		let freq = cats as f64 / draws as f64;
		assert!((freq - 0.5).abs() < 0.02, "empirical frequency {} drifted from 0.5", freq);
	}
}
