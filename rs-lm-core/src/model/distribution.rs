use std::collections::HashMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

/// Conditional distribution over the tokens observed after one context.
///
/// A `Distribution` corresponds to a fixed (n-1)-token context and
/// stores the probability of every continuation token observed after
/// it, both as a map and as a pair list sorted by token. The sorted
/// order is what makes inverse-transform sampling reproducible for a
/// fixed random seed; it carries no linguistic meaning.
///
/// ## Invariants
/// - All entries belong to the same context
/// - Every stored probability is in (0, 1] and the entries sum to 1.0
///   up to floating-point rounding
/// - `sorted` holds exactly the entries of `probs`, ascending by token
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Distribution {
	/// Identifier of the distribution (the n-1 token context).
	context: Vec<String>,
	/// Probability of each continuation token.
	/// Example: { "cat" => 0.5, "dog" => 0.5 }
	probs: HashMap<String, f64>,
	/// The same entries as (token, probability) pairs, sorted by token.
	sorted: Vec<(String, f64)>,
}

impl Distribution {
	/// Creates a distribution for the given context, sorting the pairs.
	pub(crate) fn new(context: Vec<String>, probs: HashMap<String, f64>) -> Self {
		let mut sorted: Vec<(String, f64)> =
			probs.iter().map(|(token, prob)| (token.clone(), *prob)).collect();
		sorted.sort_by(|a, b| a.0.cmp(&b.0));
		Self { context, probs, sorted }
	}

	/// Returns the context this distribution conditions on.
	pub fn context(&self) -> &[String] {
		&self.context
	}

	/// Returns the probability map over continuation tokens.
	pub fn probs(&self) -> &HashMap<String, f64> {
		&self.probs
	}

	/// Returns the (token, probability) pairs sorted by token.
	pub fn sorted(&self) -> &[(String, f64)] {
		&self.sorted
	}

	/// Returns the probability of one continuation token, 0.0 if the
	/// token was never observed after this context.
	pub fn probability(&self, token: &str) -> f64 {
		self.probs.get(token).copied().unwrap_or(0.0)
	}

	/// Samples a continuation token by inverse-transform sampling.
	///
	/// Draws a uniform value in [0, 1) and walks the sorted pairs with
	/// a running cumulative sum, returning the first token whose bucket
	/// contains the draw.
	///
	/// If rounding makes the probabilities sum to slightly under 1.0
	/// the draw can fall past every bucket; the last token is returned
	/// in that case so the walk always yields a token.
	///
	/// Returns `None` only for an empty distribution, which the model
	/// builder never produces.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&str> {
		let r: f64 = rng.random();

		let mut acc = 0.0;
		let mut fallback = None;
		for (token, prob) in &self.sorted {
			if r < acc + prob {
				return Some(token.as_str());
			}
			acc += prob;
			fallback = Some(token.as_str());
		}

		fallback
	}
}
