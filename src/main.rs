use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use exam_match::artifacts::ModelArtifactStore;
use exam_match::config::{self, Config};
use exam_match::domain::{RawExamInputs, WeightTriple};
use exam_match::ensemble::{spawn_training, EnsembleScoringEngine};
use exam_match::features::FeatureEncoder;
use exam_match::normalizer::ExamScoreNormalizer;
use exam_match::output;
use exam_match::provider::{
    build_training_examples, CandidateSource, CatalogSource, JsonDataset, OutcomeSource,
};
use exam_match::scoring::{Recommender, RuleScoringEngine};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_TRAINING: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EngineChoice {
    /// Deterministic step-function scoring
    Rules,
    /// Trained models, falling back to rules when untrained
    Ensemble,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute stage scores, combined score, rank and percentile from raw counts
    Normalize {
        /// JSON file with {"stage1": {...}, "stage2": {...}} subject counts
        #[arg(long)]
        input: PathBuf,
        /// Track: quantitative, equal_weight, verbal or language
        #[arg(long)]
        track: String,
    },
    /// Rank a candidate's options by fit
    Recommend {
        /// Dataset JSON with candidates, institutions and options
        #[arg(long)]
        data: PathBuf,
        /// Candidate id in the dataset
        #[arg(long)]
        candidate: u64,
        /// Number of results (defaults to config limit)
        #[arg(long)]
        limit: Option<usize>,
        /// Blend weights as "C,S,P", e.g. "2,2,1"
        #[arg(long)]
        weights: Option<WeightTriple>,
        #[arg(long, value_enum, default_value_t = EngineChoice::Ensemble)]
        engine: EngineChoice,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Train the ensemble from the dataset's historical outcomes
    Train {
        #[arg(long)]
        data: PathBuf,
    },
    /// Show whether trained models are available
    Status,
}

#[derive(Parser, Debug)]
#[command(name = "exam-match")]
#[command(about = "Rank academic program options for a candidate's exam results", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to <config_dir>/exam-match/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.map(PathBuf::from);
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if let Err(e) = exam_match::logging::init_tracing(&config.log_level, cli.verbose) {
        eprintln!("Config error: {:#}", e);
        std::process::exit(EXIT_CONFIG);
    }
    debug!(?config, "loaded config");

    let code = match cli.command {
        Commands::Normalize { input, track } => run_normalize(&input, &track),
        Commands::Recommend {
            data,
            candidate,
            limit,
            weights,
            engine,
            format,
        } => run_recommend(
            &config,
            &data,
            candidate,
            limit.unwrap_or(config.limit),
            weights.unwrap_or(config.weights),
            engine,
            format,
        ),
        Commands::Train { data } => run_train(&config, &data).await,
        Commands::Status => run_status(&config),
    };

    std::process::exit(code);
}

fn run_normalize(input: &Path, track: &str) -> i32 {
    let raw: RawExamInputs = match fs::read_to_string(input)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from))
    {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Failed to read exam inputs from {}: {}", input.display(), e);
            return EXIT_INPUT;
        }
    };

    match ExamScoreNormalizer::new().normalize_scores(&raw, track) {
        Ok(derived) => {
            println!("{}", output::format_derived(&derived, output::should_use_colors()));
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            EXIT_INPUT
        }
    }
}

fn open_engine(config: &Config) -> Result<EnsembleScoringEngine, i32> {
    let dir = config.resolved_artifacts_dir().map_err(|e| {
        eprintln!("Config error: {:#}", e);
        EXIT_CONFIG
    })?;
    Ok(EnsembleScoringEngine::new(
        ModelArtifactStore::new(dir),
        RuleScoringEngine::new(),
        config.training.clone(),
    ))
}

fn load_dataset(path: &Path) -> Result<JsonDataset, i32> {
    JsonDataset::load(path).map_err(|e| {
        eprintln!("Dataset error: {:#}", e);
        EXIT_INPUT
    })
}

fn run_recommend(
    config: &Config,
    data: &Path,
    candidate_id: u64,
    limit: usize,
    weights: WeightTriple,
    engine: EngineChoice,
    format: OutputFormat,
) -> i32 {
    let dataset = match load_dataset(data) {
        Ok(dataset) => dataset,
        Err(code) => return code,
    };
    let candidate = match dataset.candidate(candidate_id) {
        Ok(candidate) => candidate,
        Err(e) => {
            eprintln!("{:#}", e);
            return EXIT_INPUT;
        }
    };
    let catalog = dataset.options_for_track(candidate.track);
    info!(
        candidate_id,
        track = %candidate.track,
        options = catalog.len(),
        "scoring candidate"
    );

    let recommender: Box<dyn Recommender> = match engine {
        EngineChoice::Rules => Box::new(RuleScoringEngine::new()),
        EngineChoice::Ensemble => match open_engine(config) {
            Ok(engine) => Box::new(engine),
            Err(code) => return code,
        },
    };

    let results = match recommender.recommend(&candidate, &catalog, weights, limit) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_INPUT;
        }
    };

    match format {
        OutputFormat::Table => {
            println!("{}", output::format_results_table(&results, output::should_use_colors()))
        }
        OutputFormat::Tsv => {
            let tsv = output::format_tsv(&results);
            if !tsv.is_empty() {
                println!("{}", tsv);
            }
        }
        OutputFormat::Json => match output::format_json(&results) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to encode results: {}", e);
                return EXIT_INPUT;
            }
        },
    }
    EXIT_SUCCESS
}

async fn run_train(config: &Config, data: &Path) -> i32 {
    let dataset = match load_dataset(data) {
        Ok(dataset) => dataset,
        Err(code) => return code,
    };
    let timeout = match config.training.timeout() {
        Ok(timeout) => timeout,
        Err(e) => {
            eprintln!("Config error: training.timeout: {}", e);
            return EXIT_CONFIG;
        }
    };
    let engine = match open_engine(config) {
        Ok(engine) => Arc::new(engine),
        Err(code) => return code,
    };

    let outcomes = dataset.outcomes();
    let examples =
        build_training_examples(&dataset, dataset.catalog(), &outcomes, &FeatureEncoder::new());
    info!(
        outcomes = outcomes.len(),
        examples = examples.len(),
        "prepared training examples"
    );

    match spawn_training(engine, examples, timeout).await {
        Ok(report) => {
            println!("{}", output::format_training_report(&report));
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Training failed: {:#}", anyhow::Error::from(e));
            EXIT_TRAINING
        }
    }
}

fn run_status(config: &Config) -> i32 {
    let engine = match open_engine(config) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    println!("{}", output::format_status(&engine.status(), output::should_use_colors()));
    if let Ok(dir) = config.resolved_artifacts_dir() {
        println!("Models:   {}", dir.display());
    }
    EXIT_SUCCESS
}
