use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn configsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_configsync"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CONFIGSYNC_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

struct Fixture {
    home: TempDir,
    src: TempDir,
    work: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let home = TempDir::new().expect("home");
        let src = TempDir::new().expect("src");
        let work = home.path().join("sync");
        Self { home, src, work }
    }

    fn source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.src.path().join(name);
        fs::write(&path, content).expect("write source");
        path
    }

    /// Write `config.toml` with `body` appended after `work_dir`.
    fn config(&self, body: &str) -> PathBuf {
        let path = self.home.path().join("config.toml");
        let text = format!("work_dir = \"{}\"\n{body}", self.work.display());
        fs::write(&path, text).expect("write config");
        path
    }
}

#[test]
fn check_lists_resolved_files_and_commands() {
    let fx = Fixture::new();
    let a = fx.source("a.conf", "a");
    let b = fx.source("b.conf", "b");
    let cfg = fx.config(&format!(
        "files = [\"{}/*.conf\"]\n\n[[commands]]\ncommand_line = \"uname -a\"\nfile_path = \"/uname\"\n",
        fx.src.path().display()
    ));

    configsync_cmd(fx.home.path())
        .arg("check")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(contains("files (2):"))
        .stdout(contains(a.display().to_string()))
        .stdout(contains(b.display().to_string()))
        .stdout(contains("commands (1):"))
        .stdout(contains("/uname  ← uname -a"));

    assert!(!fx.work.exists(), "check must not create the work dir");
}

#[test]
fn check_rejects_config_without_sources() {
    let fx = Fixture::new();
    let cfg = fx.config("");

    configsync_cmd(fx.home.path())
        .arg("check")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(contains("at least one file pattern or command is required"));
}

#[test]
fn config_path_falls_back_to_environment() {
    let fx = Fixture::new();
    let file = fx.source("hosts", "127.0.0.1 localhost\n");
    let cfg = fx.config(&format!("files = [\"{}\"]\n", file.display()));

    configsync_cmd(fx.home.path())
        .env("CONFIGSYNC_CONFIG", &cfg)
        .arg("check")
        .assert()
        .success()
        .stdout(contains("files (1):"));
}

#[test]
fn missing_config_is_an_error() {
    let fx = Fixture::new();
    configsync_cmd(fx.home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(contains("no configuration file"));
}

#[test]
fn status_before_first_sync() {
    let fx = Fixture::new();
    let file = fx.source("hosts", "x");
    let cfg = fx.config(&format!("files = [\"{}\"]\n", file.display()));

    configsync_cmd(fx.home.path())
        .arg("status")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(contains("last sync never"))
        .stdout(contains("Nothing synced yet."));
}

#[test]
fn status_json_classifies_hand_written_metadata() {
    let fx = Fixture::new();
    let edited = fx.source("edited.conf", "new content");
    let gone = fx.src.path().join("gone.conf");
    let cfg = fx.config(&format!("files = [\"{}\"]\n", edited.display()));

    // Destination copy for the edited file, and a metadata document that
    // recorded a different hash for it.
    let dest = fx.work.join(edited.strip_prefix("/").expect("absolute"));
    fs::create_dir_all(dest.parent().expect("parent")).expect("mkdir");
    fs::write(&dest, "old content").expect("write dest");
    let meta = serde_json::json!({
        "Files": [
            {"Path": edited.display().to_string(), "Hash": 1, "Source": edited.display().to_string()},
            {"Path": gone.display().to_string(), "Hash": 2, "Source": gone.display().to_string()},
            {"Path": "/date", "Hash": 3, "Source": "cmd"}
        ]
    });
    fs::write(
        fx.work.join("configsync_meta.json"),
        serde_json::to_string_pretty(&meta).expect("json"),
    )
    .expect("write metadata");

    let output = configsync_cmd(fx.home.path())
        .args(["status", "--json"])
        .arg(&cfg)
        .output()
        .expect("run status");
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let states: Vec<&str> = payload["records"]
        .as_array()
        .expect("records")
        .iter()
        .map(|r| r["status"].as_str().expect("status"))
        .collect();
    assert_eq!(states, vec!["modified", "missing-source", "command"]);
    assert_eq!(payload["needs_sync"], 2);
    assert!(payload["last_sync_age"].as_str().expect("age").ends_with('s'));
}

#[test]
fn status_warns_about_corrupt_metadata_on_stderr() {
    let fx = Fixture::new();
    let file = fx.source("hosts", "x");
    let cfg = fx.config(&format!("files = [\"{}\"]\n", file.display()));
    fs::create_dir_all(&fx.work).expect("mkdir work");
    fs::write(fx.work.join("configsync_meta.json"), "{ not json").expect("write metadata");

    configsync_cmd(fx.home.path())
        .arg("status")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(contains("Nothing synced yet."))
        .stderr(contains("corrupt metadata"));
}

#[test]
fn sync_commits_and_reports_summary() {
    let Ok(git) = which::which("git") else {
        eprintln!("git not found on PATH; skipping");
        return;
    };
    let fx = Fixture::new();
    let file = fx.source("motd", "hello\n");
    let cfg = fx.config(&format!(
        "files = [\"{}\"]\n\n[git]\npath = \"{}\"\nauthor = \"configsync <configsync@test-host>\"\nbranch_name = \"test-host\"\n",
        file.display(),
        git.display()
    ));

    configsync_cmd(fx.home.path())
        .arg("sync")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(contains("1 written"))
        .stdout(contains("committed changes"));
    assert!(fx.work.join(".git").is_dir());

    configsync_cmd(fx.home.path())
        .args(["sync", "--log-format", "json", "-v"])
        .arg(&cfg)
        .assert()
        .success()
        .stdout(contains("1 unchanged"))
        .stdout(contains("nothing to commit"))
        .stderr(contains("\"level\":\"DEBUG\"").or(contains("\"level\":\"debug\"")));

    configsync_cmd(fx.home.path())
        .arg("status")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(contains("current"));
}

#[test]
fn verbose_in_config_enables_debug_logging() {
    let Ok(git) = which::which("git") else {
        eprintln!("git not found on PATH; skipping");
        return;
    };
    let fx = Fixture::new();
    let file = fx.source("motd", "hello\n");
    let cfg = fx.config(&format!(
        "verbose = true\nfiles = [\"{}\"]\n\n[git]\npath = \"{}\"\nauthor = \"configsync <configsync@test-host>\"\nbranch_name = \"test-host\"\n",
        file.display(),
        git.display()
    ));

    configsync_cmd(fx.home.path())
        .arg("sync")
        .arg(&cfg)
        .assert()
        .success()
        .stderr(contains("DEBUG"));
}
