use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::json;
use specpath::v1::{Corpus, build_corpus, read_corpus};
use std::path::{Path, PathBuf};

pub fn run(input: PathBuf, json: bool) -> Result<()> {
    let corpus = load(&input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&corpus))?);
    } else {
        print!("{}", render(&corpus));
    }
    Ok(())
}

/// A corpus file is read as is; a directory is read as a layout.
fn load(input: &Path) -> Result<Corpus> {
    if input.is_file() {
        read_corpus(input).with_context(|| format!("Failed to read corpus {}", input.display()))
    } else {
        build_corpus(input)
            .with_context(|| format!("Failed to read layout directory {}", input.display()))
    }
}

fn format_date(date: Option<&DateTime<FixedOffset>>) -> Option<String> {
    date.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn render(corpus: &Corpus) -> String {
    if corpus.apis.is_empty() {
        return "No APIs found.\n".to_string();
    }

    let mut out = String::new();
    for api in &corpus.apis {
        out.push_str(&format!("{}\n", api.name));
        for version in &api.versions {
            let date = format_date(version.info.date.as_ref()).unwrap_or_else(|| "-".to_string());
            out.push_str(&format!("  {:<16} {}\n", version.version, date));
        }
    }
    out
}

fn to_json(corpus: &Corpus) -> serde_json::Value {
    let apis: Vec<serde_json::Value> = corpus
        .apis
        .iter()
        .map(|api| {
            let versions: Vec<serde_json::Value> = api
                .versions
                .iter()
                .map(|v| {
                    json!({
                        "version": v.version,
                        "date": format_date(v.info.date.as_ref()),
                        "schemas": v.schema_examples.len(),
                    })
                })
                .collect();
            json!({ "name": api.name, "versions": versions })
        })
        .collect();
    json!(apis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use specpath::v1::write_corpus;
    use std::fs;

    fn layout() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let version_dir = dir.path().join("Widgets").join("1.0");
        fs::create_dir_all(&version_dir).unwrap();
        fs::write(
            version_dir.join("openapi.yaml"),
            "info: { title: Widgets, version: '1.0' }\ncomponents:\n  schemas:\n    W:\n      description: w\n",
        )
        .unwrap();
        fs::write(
            version_dir.join("info.json"),
            r#"{"date":"2024-05-01T12:30:00+09:00"}"#,
        )
        .unwrap();
        let bare = dir.path().join("Widgets").join("0.9");
        fs::create_dir_all(&bare).unwrap();
        fs::write(bare.join("openapi.json"), r#"{"info":{"title":"Widgets","version":"0.9"}}"#)
            .unwrap();
        dir
    }

    #[test]
    fn test_render_layout() {
        let dir = layout();
        let text = render(&load(dir.path()).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Widgets");
        assert!(lines[1].starts_with("  0.9"));
        assert!(lines[1].ends_with('-'));
        assert!(lines[2].ends_with("2024-05-01T12:30:00+09:00"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&Corpus::default()), "No APIs found.\n");
    }

    #[test]
    fn test_json_listing() {
        let dir = layout();
        let value = to_json(&load(dir.path()).unwrap());
        assert_eq!(value[0]["name"], "Widgets");
        assert_eq!(value[0]["versions"][0]["date"], serde_json::Value::Null);
        assert_eq!(value[0]["versions"][1]["schemas"], 1);
    }

    #[test]
    fn test_load_corpus_file() {
        let dir = layout();
        let out = tempfile::tempdir().unwrap();
        let corpus = load(dir.path()).unwrap();
        let path = write_corpus(&corpus, out.path(), false).unwrap();

        assert_eq!(load(&path).unwrap(), corpus);
        assert!(run(path, true).is_ok());
    }

    #[test]
    fn test_load_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("missing")).is_err());
    }
}
