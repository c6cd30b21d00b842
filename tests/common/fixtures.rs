//! Test fixtures for integration tests.

use affinity::{
    Config, Credentials, ReviewerRecord, SpecterConfig, SpecterEmbedder, SubmissionRecord,
};
use tempfile::TempDir;

pub const STUB_EMBEDDING_DIM: usize = 32;

pub const DEFAULT_AFFILIATION: &str = "Example University";

#[derive(Default)]
pub struct ReviewerBuilder {
    name: Option<String>,
    affiliation: Option<String>,
    expertise: Vec<String>,
    competence: Vec<String>,
    mail: Option<String>,
}

impl ReviewerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn affiliation(mut self, affiliation: &str) -> Self {
        self.affiliation = Some(affiliation.to_string());
        self
    }

    pub fn expertise(mut self, keywords: &[&str]) -> Self {
        self.expertise = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn competence(mut self, keywords: &[&str]) -> Self {
        self.competence = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn mail(mut self, mail: &str) -> Self {
        self.mail = Some(mail.to_string());
        self
    }

    pub fn build(self) -> ReviewerRecord {
        let mut reviewer = ReviewerRecord::new(
            self.name.unwrap_or_else(|| "Reviewer".to_string()),
            self.affiliation
                .unwrap_or_else(|| DEFAULT_AFFILIATION.to_string()),
        )
        .with_expertise(self.expertise)
        .with_competence(self.competence);
        if let Some(mail) = self.mail {
            reviewer = reviewer.with_mail(mail);
        }
        reviewer
    }
}

/// `count` distinct reviewers with one expertise keyword each.
pub fn sample_reviewers(count: usize) -> Vec<ReviewerRecord> {
    (0..count)
        .map(|i| {
            let topic = format!("topic {i}");
            ReviewerBuilder::new()
                .name(&format!("Reviewer {i}"))
                .expertise(&[topic.as_str(), "human-computer interaction"])
                .mail(&format!("reviewer{i}@example.org"))
                .build()
        })
        .collect()
}

/// One submission per title, each with a distinct abstract.
pub fn sample_submissions(titles: &[&str]) -> Vec<SubmissionRecord> {
    titles
        .iter()
        .map(|title| SubmissionRecord::new(*title, format!("We study {}.", title.to_lowercase())))
        .collect()
}

pub fn stub_embedder() -> SpecterEmbedder {
    SpecterEmbedder::load(SpecterConfig {
        embedding_dim: STUB_EMBEDDING_DIM,
        ..SpecterConfig::stub()
    })
    .expect("stub embedder should load")
}

/// A scratch cache/output directory pair with credentials set.
pub struct Workspace {
    pub dir: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = Config {
            base_url: Some("https://pcs.example.org".to_string()),
            credentials: Some(Credentials::new("chair", "hunter2")),
            cache_dir: dir.path().join("cache"),
            output_dir: dir.path().join("out"),
            ..Default::default()
        };
        Self { dir, config }
    }

    pub fn output_files(&self) -> Vec<String> {
        list_files(&self.config.output_dir)
    }

    pub fn cache_files(&self) -> Vec<String> {
        list_files(&self.config.cache_dir)
    }
}

fn list_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
