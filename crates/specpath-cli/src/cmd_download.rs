use anyhow::{Context, Result};
use clap::Args;
use specpath::v1::{CollectConfig, CollectOutcome, CollectionState, HistorySource, collect};
use specpath_git::GitHistory;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RepoSource {
    /// URL of a git repository to clone into a temporary directory
    #[arg(short = 'u', long)]
    pub repo_url: Option<String>,

    /// Path to a local git repository
    #[arg(short, long)]
    pub repo: Option<PathBuf>,
}

pub fn run(source: RepoSource, output: PathBuf, max_versions: usize) -> Result<()> {
    let config = CollectConfig { max_versions };

    let outcome = match (source.repo_url, source.repo) {
        (Some(url), _) => run_remote(&url, &output, &config)?,
        (None, Some(path)) => run_local(&path, &output, &config)?,
        (None, None) => anyhow::bail!("Either --repo-url or --repo is required"),
    };

    for saved in &outcome.accepted {
        println!(
            "✔ saved {} {} ({} @ {})",
            saved.api, saved.version, saved.source_path, saved.snapshot
        );
    }
    println!("{}", summary(&outcome, &output));
    Ok(())
}

fn run_remote(url: &str, output: &Path, config: &CollectConfig) -> Result<CollectOutcome> {
    // Removed on drop, after the walk finishes or fails
    let workdir = tempfile::Builder::new()
        .prefix("specpath-clone-")
        .tempdir()
        .context("Failed to create a temporary clone directory")?;
    tracing::debug!(%url, dir = %workdir.path().display(), "cloning");
    let history = GitHistory::clone_into(url, workdir.path())?;
    download(&history, output, config)
}

fn run_local(path: &Path, output: &Path, config: &CollectConfig) -> Result<CollectOutcome> {
    let history = GitHistory::open(path)?;
    download(&history, output, config)
}

fn download<H: HistorySource + ?Sized>(
    history: &H,
    output: &Path,
    config: &CollectConfig,
) -> Result<CollectOutcome> {
    collect(history, output, config, CollectionState::new()).with_context(|| {
        format!(
            "Failed to collect specifications into {}",
            output.display()
        )
    })
}

/// One-line report. Files that were never candidates are left out.
fn summary(outcome: &CollectOutcome, output: &Path) -> String {
    let apis = outcome.state.apis().len();
    let mut line = format!(
        "{} version(s) of {} API(s) saved to {}",
        outcome.accepted.len(),
        apis,
        output.display()
    );

    let skipped: Vec<String> = outcome
        .skipped
        .iter()
        .filter(|(label, _)| *label != "not-candidate")
        .map(|(label, count)| format!("{} {}", label, count))
        .collect();
    if !skipped.is_empty() {
        line.push_str(&format!("; skipped: {}", skipped.join(", ")));
    }
    line
}
