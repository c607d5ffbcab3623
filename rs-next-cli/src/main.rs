use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::error;

use rs_next_core::config::TrainingConfig;
use rs_next_core::model::{predict_next, predict_top_k};
use rs_next_core::pipeline::{load_artifacts, run_training};

/// Train a next-word model on a text corpus and query it.
#[derive(Parser)]
#[command(name = "rs-next", version)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Train on a corpus and write `<stem>.vocab` / `<stem>.model`
	Train {
		/// Plain-text UTF-8 corpus
		corpus: PathBuf,

		/// Where the vocabulary and checkpoint are written
		#[arg(short, long, default_value = "./data")]
		output_dir: PathBuf,

		/// JSON file with training hyperparameters
		#[arg(short, long)]
		config: Option<PathBuf>,

		#[command(flatten)]
		overrides: Overrides,

		/// Predict the word following this text once training is done
		#[arg(long)]
		try_text: Option<String>,
	},

	/// Predict the next word after some text
	Predict {
		text: String,

		#[arg(long)]
		vocabulary: PathBuf,

		#[arg(long)]
		model: PathBuf,

		/// Show the k most likely words with their probabilities
		#[arg(short, long)]
		top: Option<usize>,
	},
}

/// Hyperparameters given on the command line, applied over the config file.
#[derive(Args, Debug, Default)]
struct Overrides {
	#[arg(long)]
	epochs: Option<usize>,

	#[arg(long)]
	batch_size: Option<usize>,

	#[arg(long)]
	learning_rate: Option<f32>,

	#[arg(long)]
	seed: Option<u64>,

	/// Gradient worker threads (0 = one per CPU)
	#[arg(long)]
	workers: Option<usize>,
}

impl Overrides {
	fn apply(&self, config: &mut TrainingConfig) {
		config.epochs = self.epochs.unwrap_or(config.epochs);
		config.batch_size = self.batch_size.unwrap_or(config.batch_size);
		config.learning_rate = self.learning_rate.unwrap_or(config.learning_rate);
		config.seed = self.seed.unwrap_or(config.seed);
		config.workers = self.workers.unwrap_or(config.workers);
	}
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	match run(Cli::parse()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{e}");
			ExitCode::FAILURE
		}
	}
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
	match cli.command {
		Command::Train { corpus, output_dir, config, overrides, try_text } => {
			let mut training = match config {
				Some(path) => TrainingConfig::from_json_file(path)?,
				None => TrainingConfig::default(),
			};
			overrides.apply(&mut training);

			let artifacts = run_training(&corpus, &output_dir, &training)?;
			println!("vocabulary: {} ({} tokens)", artifacts.vocabulary_path.display(), artifacts.vocabulary.len());
			match artifacts.report.final_loss() {
				Some(loss) => println!("model: {} (final loss {loss:.4})", artifacts.model_path.display()),
				None => println!("model: not trained, corpus has too few tokens"),
			}

			if let Some(text) = try_text {
				println!("{}", predict_next(&artifacts.model, &artifacts.vocabulary, &text)?);
			}
		}
		Command::Predict { text, vocabulary, model, top } => {
			let (vocabulary, model) = load_artifacts(vocabulary, model)?;
			match top {
				Some(k) => {
					for (word, probability) in predict_top_k(&model, &vocabulary, &text, k)? {
						println!("{word}\t{probability:.4}");
					}
				}
				None => println!("{}", predict_next(&model, &vocabulary, &text)?),
			}
		}
	}
	Ok(())
}
