use anyhow::{Context, Result};
use specpath::v1::{Corpus, build_corpus, write_corpus};
use std::path::{Path, PathBuf};

pub fn run(input: PathBuf, output: PathBuf, compact: bool) -> Result<()> {
    let corpus = generate(&input)?;
    if corpus.apis.is_empty() {
        println!("no specification files found in {}", input.display());
    }

    let path = write_corpus(&corpus, &output, !compact)
        .with_context(|| format!("Failed to write corpus under {}", output.display()))?;

    let versions: usize = corpus.apis.iter().map(|a| a.versions.len()).sum();
    println!(
        "✔ wrote {} API(s), {} version(s) to {}",
        corpus.apis.len(),
        versions,
        path.display()
    );
    Ok(())
}

fn generate(input: &Path) -> Result<Corpus> {
    build_corpus(input)
        .with_context(|| format!("Failed to read layout directory {}", input.display()))
}
