use std::path::PathBuf;

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;

use rs_next_core::Error;
use rs_next_core::model::{SequenceClassifier, WordModel, predict_next, predict_top_k};
use rs_next_core::pipeline::load_artifacts;
use rs_next_core::text::Vocabulary;

/// Serve next-word predictions over HTTP.
#[derive(Parser)]
#[command(name = "rs-next-server", version)]
struct Args {
	#[arg(long, default_value = "./data/corpus.vocab")]
	vocabulary: PathBuf,

	#[arg(long, default_value = "./data/corpus.model")]
	model: PathBuf,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,
}

/// Query parameters for the `/v1/predict` endpoint
#[derive(Deserialize)]
struct PredictParams {
	text: String,
	k: Option<usize>,
}

/// Trained artifacts, read-only once the server is up.
struct SharedData {
	vocabulary: Vocabulary,
	model: WordModel,
}

/// Maps a prediction error to a response.
///
/// Bad user input is a 422, anything else is an internal failure.
fn error_response(e: Error) -> HttpResponse {
	match e {
		Error::UnknownToken(_) | Error::ContextTooShort { .. } => HttpResponse::UnprocessableEntity().body(e.to_string()),
		_ => {
			warn!("prediction failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Returns the most likely next word after `text`, or the `k` most likely
/// words as `word\tprobability` lines when `k` is given.
#[get("/v1/predict")]
async fn get_prediction(data: web::Data<SharedData>, query: web::Query<PredictParams>) -> impl Responder {
	match query.k {
		Some(k) => match predict_top_k(&data.model, &data.vocabulary, &query.text, k) {
			Ok(words) => {
				let lines: Vec<String> = words.iter().map(|(w, p)| format!("{w}\t{p:.6}")).collect();
				HttpResponse::Ok().body(lines.join("\n"))
			}
			Err(e) => error_response(e),
		},
		None => match predict_next(&data.model, &data.vocabulary, &query.text) {
			Ok(word) => HttpResponse::Ok().body(word),
			Err(e) => error_response(e),
		},
	}
}

/// HTTP GET endpoint `/v1/vocabulary`
///
/// Returns the vocabulary size and the number of context words a request needs.
#[get("/v1/vocabulary")]
async fn get_vocabulary(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().body(format!(
		"tokens: {}\nwindow_size: {}",
		data.vocabulary.len(),
		data.model.window_size()
	))
}

/// Main entry point for the server.
///
/// Loads the vocabulary and model once and shares them between workers
/// without a lock: nothing writes to them after startup.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let (vocabulary, model) = load_artifacts(&args.vocabulary, &args.model)
		.map_err(|e| std::io::Error::other(format!("Failed to load artifacts: {e}")))?;
	info!("Loaded {} tokens from {}", vocabulary.len(), args.vocabulary.display());

	let shared_data = web::Data::new(SharedData { vocabulary, model });

	info!("Listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.app_data(shared_data.clone())
			.service(get_prediction)
			.service(get_vocabulary)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
