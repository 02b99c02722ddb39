use std::env;
use std::io;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use rs_lm_core::model::generator::SentenceGenerator;
use rs_lm_core::model::ngram_model::NGramModel;

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	max_tokens: Option<usize>,
	seed: Option<u64>,
}

/// Struct representing query parameters for the `/v1/score` endpoint
#[derive(Deserialize)]
struct ScoreParams {
	sentence: String,
}

#[derive(Serialize)]
struct GenerateResponse {
	sentences: Vec<String>,
	truncated: usize,
}

#[derive(Serialize)]
struct ScoreResponse {
	tokens: Vec<String>,
	probability: f64,
	/// Base-2 log-probability; `null` when the sentence is impossible
	/// under the model (log-probability is negative infinity).
	log_probability: Option<f64>,
}

#[derive(Serialize)]
struct InfoResponse {
	order: usize,
	contexts: usize,
	count_entries: usize,
	training_sentences: usize,
}

struct SharedData {
	model: NGramModel,
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` sentences from the trained model and returns them
/// as space-joined lines, together with how many hit the token bound.
/// An optional `seed` makes the batch reproducible.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(1);

	let mut generator = match query.seed {
		Some(seed) => SentenceGenerator::from_seed(&data.model, seed),
		None => SentenceGenerator::new(&data.model),
	};
	if let Some(max_tokens) = query.max_tokens {
		generator.max_tokens = max_tokens;
	}

	let mut sentences = Vec::with_capacity(count);
	let mut truncated = 0;
	for _ in 0..count {
		match generator.generate_sentence() {
			Ok(sentence) => {
				if sentence.is_truncated() {
					truncated += 1;
				}
				sentences.push(sentence.tokens().join(" "));
			}
			Err(e) => {
				warn!("generation failed: {e}");
				return HttpResponse::InternalServerError().body(e);
			}
		}
	}

	HttpResponse::Ok().json(GenerateResponse { sentences, truncated })
}

/// HTTP GET endpoint `/v1/score`
///
/// Splits the query sentence on whitespace and returns its probability
/// and base-2 log-probability under the model.
#[get("/v1/score")]
async fn get_score(data: web::Data<SharedData>, query: web::Query<ScoreParams>) -> impl Responder {
	let tokens: Vec<String> = query.sentence.split_whitespace().map(str::to_owned).collect();
	if tokens.is_empty() {
		return HttpResponse::BadRequest().body("sentence must contain at least one token");
	}

	let probability = data.model.sent_prob(&tokens);
	let log_prob = data.model.sent_log_prob(&tokens);
	let log_probability = if log_prob.is_finite() { Some(log_prob) } else { None };

	HttpResponse::Ok().json(ScoreResponse { tokens, probability, log_probability })
}

/// HTTP GET endpoint `/v1/info`
///
/// Reports the model order and table sizes.
#[get("/v1/info")]
async fn get_info(data: web::Data<SharedData>) -> impl Responder {
	let model = &data.model;
	HttpResponse::Ok().json(InfoResponse {
		order: model.order(),
		contexts: model.distributions().count(),
		count_entries: model.counts().len(),
		training_sentences: model.beginning_words().len(),
	})
}

/// Reads a corpus file and splits every non-empty line into a sentence
/// of whitespace-separated tokens.
fn read_corpus(path: &str) -> io::Result<Vec<Vec<String>>> {
	let contents = std::fs::read_to_string(path)?;
	Ok(contents
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(|line| line.split_whitespace().map(str::to_owned).collect())
		.collect())
}

/// Main entry point for the server.
///
/// Builds the model once from the configured corpus and shares it
/// read-only across workers; each request owns its own generator, so
/// no locking is needed around the immutable tables.
///
/// # Notes
/// - `RS_LM_CORPUS`: corpus file, one sentence per line
///   (default `./data/corpus.txt`).
/// - `RS_LM_ORDER`: model order (default 3).
/// - `RS_LM_BIND`: bind address (default 127.0.0.1:5000).
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let corpus_path = env::var("RS_LM_CORPUS").unwrap_or_else(|_| "./data/corpus.txt".to_owned());
	let order = match env::var("RS_LM_ORDER") {
		Ok(value) => value
			.parse::<usize>()
			.map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "RS_LM_ORDER must be a positive integer"))?,
		Err(_) => 3,
	};
	let bind = env::var("RS_LM_BIND").unwrap_or_else(|_| "127.0.0.1:5000".to_owned());

	let sentences = read_corpus(&corpus_path)?;
	info!("read {} sentences from {}", sentences.len(), corpus_path);

	let model = NGramModel::new(order, &sentences)
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	info!("built order-{} model with {} contexts", order, model.distributions().count());

	let shared_data = web::Data::new(SharedData { model });

	info!("listening on {bind}");
	HttpServer::new(move || {
		App::new()
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_score)
			.service(get_info)
	})
		.bind(bind)?
		.run()
		.await
}
