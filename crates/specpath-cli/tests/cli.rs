use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn specpath() -> Command {
    Command::cargo_bin("specpath").unwrap()
}

fn spec(title: &str, version: &str) -> String {
    format!(
        "openapi: 3.0.0\ninfo:\n  title: {}\n  version: '{}'\ncomponents:\n  schemas:\n    Pet:\n      description: a pet\n",
        title, version
    )
}

/// A repository whose history holds versions 1.0, 2.0 and 3.0 of one API.
fn history_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();

    let mut parent: Option<git2::Oid> = None;
    for (i, version) in ["1.0", "2.0", "3.0"].iter().enumerate() {
        fs::write(dir.path().join("openapi.yaml"), spec("Pet Store", version)).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("openapi.yaml")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::new(
            "Test User",
            "test@example.com",
            &git2::Time::new(1_700_000_000 + i as i64 * 60, 0),
        )
        .unwrap();
        let parent_commit = parent.map(|oid| repo.find_commit(oid).unwrap());
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();
        parent = Some(
            repo.commit(Some("HEAD"), &sig, &sig, version, &tree, &parents)
                .unwrap(),
        );
    }
    dir
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn help_lists_subcommands() {
    specpath()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn download_requires_a_source() {
    specpath().arg("download").assert().failure();
}

#[test]
fn download_rejects_zero_versions() {
    specpath()
        .args(["download", "-r", ".", "-n", "0"])
        .assert()
        .failure();
}

#[test]
fn download_from_local_repository() {
    let repo = history_repo();
    let out = tempfile::tempdir().unwrap();

    specpath()
        .arg("download")
        .arg("--repo")
        .arg(repo.path())
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("✔ saved Pet_Store 3.0"))
        .stdout(predicate::str::contains("3 version(s) of 1 API(s)"));

    for version in ["1.0", "2.0", "3.0"] {
        let dir = out.path().join("Pet_Store").join(version);
        assert!(dir.join("openapi.yaml").is_file());
        assert!(dir.join("info.json").is_file());
    }
}

#[test]
fn download_keeps_most_recent_versions() {
    let repo = history_repo();
    let out = tempfile::tempdir().unwrap();

    specpath()
        .arg("download")
        .arg("-r")
        .arg(repo.path())
        .arg("-o")
        .arg(out.path())
        .args(["-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cap-reached 1"));

    assert!(out.path().join("Pet_Store/3.0").is_dir());
    assert!(out.path().join("Pet_Store/2.0").is_dir());
    assert!(!out.path().join("Pet_Store/1.0").exists());
}

#[test]
fn download_by_url_clones_first() {
    let repo = history_repo();
    let out = tempfile::tempdir().unwrap();

    specpath()
        .arg("download")
        .arg("--repo-url")
        .arg(repo.path().to_str().unwrap())
        .arg("--output")
        .arg(out.path())
        .assert()
        .success();

    assert!(out.path().join("Pet_Store/1.0/openapi.yaml").is_file());
}

#[test]
fn download_from_missing_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    specpath()
        .arg("download")
        .arg("-r")
        .arg(dir.path().join("missing"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open repository"));
}

#[test]
fn generate_writes_corpus() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "Pet_Store/2.0/openapi.yaml", &spec("Pet Store", "2.0"));
    write(input.path(), "Pet_Store/1.0/openapi.yaml", &spec("Pet Store", "1.0"));
    write(
        input.path(),
        "Pet_Store/1.0/info.json",
        r#"{"date":"2023-11-14T22:13:20Z"}"#,
    );

    specpath()
        .arg("generate")
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 API(s), 2 version(s)"));

    let text = fs::read_to_string(output.path().join("data/api-data.json")).unwrap();
    let corpus: serde_json::Value = serde_json::from_str(&text).unwrap();
    let versions = &corpus["apis"][0]["versions"];
    assert_eq!(corpus["apis"][0]["name"], "Pet_Store");
    assert_eq!(versions[0]["version"], "1.0");
    assert_eq!(versions[1]["version"], "2.0");
    assert!(versions[0]["info"]["date"].is_string());
    assert_eq!(versions[1]["info"], serde_json::json!({}));
    assert_eq!(
        versions[0]["schemaExamples"]["Pet"][0]["key"],
        "components.schemas.Pet"
    );
}

#[test]
fn generate_empty_input() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    specpath()
        .arg("generate")
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .arg("--compact")
        .assert()
        .success()
        .stdout(predicate::str::contains("no specification files found"));

    let text = fs::read_to_string(output.path().join("data/api-data.json")).unwrap();
    assert_eq!(text, r#"{"apis":[]}"#);
}

#[test]
fn generate_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    specpath()
        .arg("generate")
        .arg("-i")
        .arg(dir.path().join("missing"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read layout directory"));
}

#[test]
fn download_then_list() {
    let repo = history_repo();
    let out = tempfile::tempdir().unwrap();

    specpath()
        .arg("download")
        .arg("-r")
        .arg(repo.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    specpath()
        .arg("list")
        .arg("-i")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Pet_Store"))
        .stdout(predicate::str::contains("2023-11-14T22:13:20Z"));

    let assert = specpath()
        .arg("list")
        .arg("-i")
        .arg(out.path())
        .arg("--json")
        .assert()
        .success();
    let listing: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(listing[0]["versions"].as_array().unwrap().len(), 3);
}
