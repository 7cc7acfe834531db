use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const AZURE_VARS: &[&str] = &[
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_API_VERSION",
    "AZURE_OPENAI_COMPLETIONS_DEPLOYMENT",
    "AZURE_OPENAI_CHAT_DEPLOYMENT",
    "AZURE_OPENAI_IMAGE_DEPLOYMENT",
];

/// Runs `get-weather` against an empty env file so the command fails on
/// missing configuration without touching the network.
fn run_with_logging_env(
    env_file: &Path,
    log_output: &str,
    log_format: &str,
    log_file_path: Option<&Path>,
) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_aoai-cli"));
    cmd.arg("get-weather")
        .env("AOAI_ENV_FILE", env_file)
        .env("RUST_LOG", "aoai_cli=info")
        .env("LOG_OUTPUT", log_output)
        .env("LOG_FORMAT", log_format);
    for var in AZURE_VARS {
        cmd.env_remove(var);
    }

    if let Some(path) = log_file_path {
        cmd.env("LOG_FILE_PATH", path);
    } else {
        cmd.env_remove("LOG_FILE_PATH");
    }

    cmd.output().expect("failed to run aoai-cli binary")
}

fn empty_env_file(dir: &Path) -> PathBuf {
    let path = dir.join(".env");
    fs::write(&path, "# nothing configured\n").expect("failed to write env file");
    path
}

fn find_rotated_log_file(dir: &Path, base_file_name: &str) -> PathBuf {
    let expected_prefix = format!("{base_file_name}.");
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .expect("failed to read temp directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&expected_prefix))
                .unwrap_or(false)
        })
        .collect();

    matches.sort();
    matches
        .pop()
        .expect("expected a rotated log file to be created")
}

#[test]
fn json_format_emits_json_log_lines_on_stderr() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let env_file = empty_env_file(dir.path());
    let output = run_with_logging_env(&env_file, "stderr", "json", None);
    assert!(
        !output.status.success(),
        "missing configuration should fail command"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    let json_lines: Vec<&str> = stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .collect();
    assert!(
        !json_lines.is_empty(),
        "expected at least one JSON log line, got stderr:\n{stderr}"
    );

    let parsed: Vec<Value> = json_lines
        .iter()
        .map(|line| serde_json::from_str::<Value>(line).expect("line should be valid JSON"))
        .collect();
    assert!(
        parsed.iter().any(|entry| {
            entry
                .get("fields")
                .and_then(|fields| fields.get("message"))
                .and_then(Value::as_str)
                == Some("loaded runtime configuration")
        }),
        "expected startup log message in JSON output, got stderr:\n{stderr}"
    );
}

#[test]
fn file_output_writes_logs_to_rotated_file() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let env_file = empty_env_file(dir.path());
    let log_dir = dir.path().join("logs");
    let log_path = log_dir.join("aoai-cli.log");
    let output = run_with_logging_env(&env_file, "file", "pretty", Some(&log_path));
    assert!(
        !output.status.success(),
        "missing configuration should fail command"
    );

    let rotated = find_rotated_log_file(&log_dir, "aoai-cli.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    assert!(
        file_contents.contains("loaded runtime configuration"),
        "expected startup log message in file, got:\n{file_contents}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("loaded runtime configuration"),
        "did not expect normal logs on stderr for file-only mode:\n{stderr}"
    );
    assert!(
        stderr.contains("environment variables missing"),
        "expected command error output on stderr:\n{stderr}"
    );
}

#[test]
fn both_output_writes_logs_to_stderr_and_file() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let env_file = empty_env_file(dir.path());
    let log_dir = dir.path().join("logs");
    let log_path = log_dir.join("aoai-cli.log");
    let output = run_with_logging_env(&env_file, "both", "pretty", Some(&log_path));
    assert!(
        !output.status.success(),
        "missing configuration should fail command"
    );

    let rotated = find_rotated_log_file(&log_dir, "aoai-cli.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    assert!(
        file_contents.contains("loaded runtime configuration"),
        "expected startup log message in file, got:\n{file_contents}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("loaded runtime configuration"),
        "expected startup log message on stderr, got:\n{stderr}"
    );
}

#[test]
fn invalid_file_path_falls_back_to_stderr_logging() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let env_file = empty_env_file(dir.path());
    let blocking_file = dir.path().join("not-a-directory");
    fs::write(&blocking_file, "block").expect("failed to create blocking file");
    let log_path = blocking_file.join("aoai-cli.log");

    let output = run_with_logging_env(&env_file, "file", "pretty", Some(&log_path));
    assert!(
        !output.status.success(),
        "missing configuration should fail command"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to initialize LOG_OUTPUT=file"),
        "expected fallback warning, got:\n{stderr}"
    );
    assert!(
        stderr.contains("using stderr instead"),
        "expected stderr fallback message, got:\n{stderr}"
    );
    assert!(
        stderr.contains("loaded runtime configuration"),
        "expected logs to continue on stderr after fallback, got:\n{stderr}"
    );
}
