use std::path::PathBuf;

use clap::{Parser, Subcommand};

use resume_matcher::errors::MatcherResult;
use resume_matcher::models::config::AppConfig;
use resume_matcher::processing::corpus::{
    build_job_description_documents, build_resume_documents, store_batch,
};
use resume_matcher::processing::embedding::embedder_from_config;
use resume_matcher::processing::matrix::generate_similarity_matrix;
use resume_matcher::processing::query::{match_resumes, rank_candidates};
use resume_matcher::repository::{IndexReader, VectorStore};
use resume_matcher::sources::{DirectorySource, DocumentSource, JsonRecordExtractor};

#[derive(Parser)]
#[command(name = "resume-matcher", about = "Match résumés against job descriptions")]
struct Cli {
    /// YAML configuration file (defaults to config/default.yaml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract résumé records from a directory and append them to the résumé store.
    IngestResumes { dir: PathBuf },
    /// Append raw job descriptions from a directory to the job store.
    IngestJds { dir: PathBuf },
    /// Write the résumé x job description similarity matrix.
    Matrix {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rank stored job descriptions for every stored résumé.
    Match,
    /// Rank candidate texts against one query text.
    Query {
        text: String,
        #[arg(required = true)]
        candidates: Vec<String>,
    },
}

fn resume_store(config: &AppConfig) -> VectorStore {
    VectorStore::new(&config.store.resume_path)
        .with_metric(config.store.metric)
        .with_append_policy(config.store.append_policy)
}

fn jd_store(config: &AppConfig) -> VectorStore {
    VectorStore::new(&config.store.jd_path)
        .with_metric(config.store.metric)
        .with_append_policy(config.store.append_policy)
}

fn run(cli: Cli) -> MatcherResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let mut embedder = embedder_from_config(&config.embedding)?;

    match cli.command {
        Command::IngestResumes { dir } => {
            let (raws, unreadable) = DirectorySource::new(dir).documents()?;
            let outcome = build_resume_documents(&JsonRecordExtractor, &raws);
            store_batch(embedder.as_mut(), &resume_store(&config), outcome, unreadable)?;
            Ok(())
        }
        Command::IngestJds { dir } => {
            let (raws, unreadable) = DirectorySource::new(dir).documents()?;
            let outcome = build_job_description_documents(&raws);
            store_batch(embedder.as_mut(), &jd_store(&config), outcome, unreadable)?;
            Ok(())
        }
        Command::Matrix { output } => {
            let output = output.unwrap_or_else(|| config.output.matrix_path.clone());
            generate_similarity_matrix(
                embedder.as_mut(),
                &resume_store(&config),
                &jd_store(&config),
                &output,
                config.output.delimiter_byte()?,
            )?;
            Ok(())
        }
        Command::Match => {
            let resumes = resume_store(&config).load()?;
            let jobs = jd_store(&config).load()?;
            for (i, result) in match_resumes(embedder.as_mut(), &resumes, &jobs)?
                .iter()
                .enumerate()
            {
                println!("\n===== Resume {} ({}) =====", i + 1, result.resume_title);
                for (title, score) in &result.matches {
                    println!("{title} - Match Score: {score:.4}");
                }
            }
            Ok(())
        }
        Command::Query { text, candidates } => {
            for (candidate, score) in
                rank_candidates(embedder.as_mut(), &text, &candidates, config.store.metric)?
            {
                println!("{score:.4}\t{candidate}");
            }
            Ok(())
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
