//! Reviewer affinity CLI entrypoint.

use std::path::PathBuf;

use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

use affinity::{
    Config, NoSource, PcsAdapter, Pipeline, RunError, SourceAdapter, SpecterConfig,
    SpecterEmbedder, Stage,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Computes reviewer-to-paper embedding distances for a conference committee.
///
/// Reviewers and submissions are extracted from the conference site once and cached
/// as snapshots; later runs reuse them. Outputs `reviewer_distance_matrix.csv` and
/// `paper_id_to_title.json` in the output directory.
#[derive(Debug, Parser)]
#[command(name = "affinity", version, about)]
struct Cli {
    /// Re-extract submissions even if a snapshot exists (same as UPDATE_SUBMISSIONS=true).
    #[arg(long)]
    force_refresh: bool,

    /// Never contact the conference site; missing snapshots are errors.
    #[arg(long)]
    offline: bool,

    /// Match on expert keywords only (same as EXPERT_ONLY=true).
    #[arg(long)]
    expert_only: bool,

    /// Directory holding reviewers.txt and submissions.txt.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Directory receiving the CSV and JSON artifacts.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Encoder directory with config.json, model.safetensors and tokenizer.json.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Use the deterministic stub embedder instead of loading a model. The distances
    /// it produces carry no meaning.
    #[arg(long, conflicts_with = "model_dir")]
    stub_embedder: bool,

    /// Run the encoder on the CPU even if a GPU is available.
    #[arg(long)]
    cpu: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        config.force_refresh_submissions |= self.force_refresh;
        config.offline |= self.offline;
        config.expert_only |= self.expert_only;
        if let Some(dir) = self.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.model_dir {
            config.model_dir = Some(dir);
        }
        config.stub_embedder |= self.stub_embedder;
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let cpu_only = cli.cpu;

    let mut config = Config::from_env().map_err(|source| RunError::Config {
        stage: Stage::Configuration,
        source,
    })?;
    cli.apply(&mut config);
    config.validate().map_err(|source| RunError::Config {
        stage: Stage::Configuration,
        source,
    })?;

    tracing::info!(
        conference = %config.conference_name,
        cache_dir = %config.cache_dir.display(),
        output_dir = %config.output_dir.display(),
        offline = config.offline,
        force_refresh_submissions = config.force_refresh_submissions,
        expert_only = config.expert_only,
        "Reviewer affinity starting"
    );

    let source: Box<dyn SourceAdapter> = match config.base_url {
        Some(_) if !config.offline => {
            Box::new(PcsAdapter::from_config(&config).map_err(|source| {
                RunError::Source {
                    stage: Stage::Configuration,
                    source,
                }
            })?)
        }
        _ => Box::new(NoSource),
    };

    let embedder_config = SpecterConfig {
        cpu_only,
        ..SpecterConfig::from_config(&config)
    };
    if embedder_config.testing_stub {
        tracing::warn!("Stub embedder requested, distances carry no meaning");
    }
    let embedder = SpecterEmbedder::load(embedder_config).map_err(RunError::from)?;

    let mut pipeline = Pipeline::new(&config, source, embedder);
    match pipeline.run() {
        Ok(summary) => {
            tracing::info!(
                reviewers = summary.reviewers,
                papers = summary.papers,
                reviewer_origin = ?summary.reviewer_origin,
                submission_origin = ?summary.submission_origin,
                distance_matrix = %summary.paths.distance_matrix.display(),
                paper_index = %summary.paths.paper_index.display(),
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(stage = %e.stage(), paper_id = ?e.paper_id(), "Run failed: {}", e);
            Err(e.into())
        }
    }
}
