// Integration tests for the kvload binary.
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use kvdump_store::{EnvConfig, Environment};
use kvdump_testkit::prelude::*;
use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_kvload");
    Command::new(exe)
}

fn run_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn kvload");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input)
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn entries(path: &Path, config: EnvConfig, name: Option<&str>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let env = Environment::open(path, config).expect("open environment");
    let read = env.begin_read();
    let dbi = read.open_database(name).expect("database");
    read.entries(dbi).expect("entries")
}

fn sample_dump() -> Vec<u8> {
    DumpBuilder::new()
        .section(
            Section::new(Encoding::Print)
                .database("users")
                .pair(b"alice", b"1")
                .pair(b"bob", b"2"),
        )
        .build()
}

#[test]
fn loads_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dump_path = temp.path().join("users.dump");
    std::fs::write(&dump_path, sample_dump()).expect("write dump");
    let env_path = temp.path().join("env");

    let output = cmd()
        .args(["-f", dump_path.to_str().unwrap(), env_path.to_str().unwrap()])
        .output()
        .expect("kvload");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    assert_eq!(
        entries(&env_path, EnvConfig::new(), Some("users")),
        vec![
            (b"alice".to_vec(), b"1".to_vec()),
            (b"bob".to_vec(), b"2".to_vec())
        ]
    );
}

#[test]
fn loads_from_stdin_with_json_summary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let env_path = temp.path().join("env");

    let output = run_with_stdin(&["--json", env_path.to_str().unwrap()], &sample_dump());
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    let summary: Value = serde_json::from_str(text.lines().next().expect("json line"))
        .expect("valid json");
    assert_eq!(summary["records"], 2);
    assert_eq!(summary["sections"], 1);
    assert_eq!(summary["duplicates"], 0);
    assert!(summary.get("input").is_none());
}

#[test]
fn no_subdir_and_subdb_flags() {
    let temp = tempfile::tempdir().expect("tempdir");
    let env_path = temp.path().join("flat.kvd");
    let dump = raw_dump([(b"k1", b"v1"), (b"k2", b"v2")]);

    let output = run_with_stdin(&["-n", "-T", "-s", "raw", env_path.to_str().unwrap()], &dump);
    assert!(output.status.success());
    assert!(env_path.is_file());

    assert_eq!(
        entries(&env_path, EnvConfig::new().no_subdir(true), Some("raw")),
        vec![
            (b"k1".to_vec(), b"v1".to_vec()),
            (b"k2".to_vec(), b"v2".to_vec())
        ]
    );
}

#[test]
fn no_overwrite_keeps_existing_values() {
    let temp = tempfile::tempdir().expect("tempdir");
    let env_path = temp.path().join("env");
    let path = env_path.to_str().unwrap();

    let first = DumpBuilder::new()
        .section(Section::new(Encoding::Print).pair(b"k", b"old"))
        .build();
    assert!(run_with_stdin(&[path], &first).status.success());

    let second = DumpBuilder::new()
        .section(Section::new(Encoding::Print).pair(b"k", b"new"))
        .build();
    let output = run_with_stdin(&["-N", "--json", path], &second);
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(summary["duplicates"], 1);

    assert_eq!(
        entries(&env_path, EnvConfig::new(), None),
        vec![(b"k".to_vec(), b"old".to_vec())]
    );
}

#[test]
fn malformed_input_fails_with_line_number() {
    let temp = tempfile::tempdir().expect("tempdir");
    let env_path = temp.path().join("env");

    let output = run_with_stdin(
        &[env_path.to_str().unwrap()],
        b"VERSION=3\nformat=bytevalue\nHEADER=END\n 616\n 62\n",
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("kvload: line 4:"), "stderr: {stderr}");
    assert!(stderr.contains("odd-length hex line"), "stderr: {stderr}");
}

#[test]
fn missing_input_file_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let env_path = temp.path().join("env");
    let missing = temp.path().join("absent.dump");

    let output = cmd()
        .args(["-f", missing.to_str().unwrap(), env_path.to_str().unwrap()])
        .output()
        .expect("kvload");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.dump"));
}

#[test]
fn version_flag_prints_version() {
    let output = cmd().arg("-V").output().expect("kvload");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_path_is_a_usage_error() {
    let output = cmd().output().expect("kvload");
    assert!(!output.status.success());
}
