use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hostfacts"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("parsers")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn stdout_json(out: &Output) -> serde_json::Value {
    assert!(
        out.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_yum_fixture_as_json() {
    let out = bin()
        .args(["parse", "--command", "/usr/bin/yum"])
        .args(["--arg", "list", "--arg", "installed"])
        .arg("--stdout")
        .arg(fixture("yum.out"))
        .output()
        .expect("failed to run hostfacts");

    let json = stdout_json(&out);
    let records = json.as_array().expect("records array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["kind"], "package");
    assert_eq!(records[0]["record"]["name"], "ConsoleKit");
}

#[test]
fn parse_ps_with_hyphenated_args_and_report() {
    let out = bin()
        .args(["parse", "--command", "/bin/ps", "--arg", "-ef", "--with-report"])
        .args(["--host", "web-1"])
        .arg("--stdout")
        .arg(fixture("psefcmd.out"))
        .output()
        .expect("failed to run hostfacts");

    let json = stdout_json(&out);
    assert_eq!(json["records"].as_array().map(Vec::len), Some(6));
    assert_eq!(json["report"]["parser"], "ps");
    assert_eq!(json["report"]["processes"], 6);
    assert_eq!(json["report"]["host"], "web-1");
    assert_eq!(json["report"]["anomalies"], 0);
}

#[test]
fn parse_reports_stderr_and_exit_status_anomalies() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = dir.path().join("rpm.out");
    let stderr = dir.path().join("rpm.err");
    fs::write(&stdout, "less-436-9.el5\n").unwrap();
    fs::write(&stderr, "error: rpmdbNextIterator: skipping h#     1 region trailer\n").unwrap();

    let out = bin()
        .args(["parse", "--command", "/bin/rpm", "--arg", "-qa", "--with-report"])
        .args(["--exit-status", "1"])
        .arg("--stdout")
        .arg(&stdout)
        .arg("--stderr")
        .arg(&stderr)
        .output()
        .expect("failed to run hostfacts");

    let json = stdout_json(&out);
    let symptoms = json["report"]["anomaly_symptoms"].as_array().unwrap();
    assert_eq!(json["report"]["packages"], 1);
    assert_eq!(symptoms.len(), 2);
    assert_eq!(symptoms[0], "Command exited with status 1.");
    assert_eq!(symptoms[1], "Broken rpm database.");
}

#[test]
fn parse_reads_stdout_from_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = bin()
        .args(["parse", "--command", "rpm", "--arg", "-qa", "--stdout", "-"])
        .args(["--format", "table"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn hostfacts");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"glib2-2.12.3-4.el5_3.1\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("package"));
    assert!(stdout.contains("glib2"));
    assert!(stdout.contains("2.12.3-4.el5_3.1"));
}

#[test]
fn parse_explicit_parser_overrides_basename() {
    let out = bin()
        .args(["parse", "--command", "/opt/collect/hwinfo", "--parser", "dmidecode"])
        .args(["--format", "yaml"])
        .arg("--stdout")
        .arg(fixture("dmidecode.out"))
        .output()
        .expect("failed to run hostfacts");

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("kind: hardware"));
    assert!(stdout.contains("serial_number: 2UA25107BB"));
}

#[test]
fn parse_unknown_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = dir.path().join("lsof.out");
    fs::write(&stdout, "COMMAND PID\n").unwrap();

    let out = bin()
        .args(["parse", "--command", "/usr/bin/lsof", "--stdout"])
        .arg(&stdout)
        .output()
        .expect("failed to run hostfacts");

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error: No parser handles command '/usr/bin/lsof'"));
}

#[test]
fn parse_missing_stdout_file_fails() {
    let out = bin()
        .args(["parse", "--command", "/bin/rpm", "--stdout", "/nonexistent/rpm.out"])
        .output()
        .expect("failed to run hostfacts");

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to read"));
}

// ---------------------------------------------------------------------------
// parse-batch
// ---------------------------------------------------------------------------

#[test]
fn parse_batch_collects_entries_and_failures() {
    let dir = tempfile::tempdir().unwrap();

    let rpm = dir.path().join("rpm.json");
    let capture = serde_json::json!({
        "command": "/bin/rpm",
        "args": ["-qa"],
        "stdout": "less-436-9.el5\ngcc-c++-4.1.2-55.el5\n",
        "host": {"hostname": "db-2"}
    });
    fs::write(&rpm, serde_json::to_string(&capture).unwrap()).unwrap();

    let ps = dir.path().join("ps.yaml");
    fs::write(
        &ps,
        "command: /bin/ps\nargs: [\"h\", \"-ewwo\", \"pid,ppid,cmd,comm\"]\nstdout: \"1 0 init\\n\"\n",
    )
    .unwrap();

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{not json").unwrap();

    let out = bin()
        .args(["parse-batch", "--jobs", "2"])
        .arg(&rpm)
        .arg(&ps)
        .arg(&broken)
        .output()
        .expect("failed to run hostfacts");

    let json = stdout_json(&out);
    assert!(json["generated_at"].as_str().is_some());
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["report"]["packages"], 2);
    assert_eq!(entries[0]["report"]["host"], "db-2");

    let ps_report = &entries[1]["report"];
    assert_eq!(ps_report["parser"], "ps");
    assert_eq!(ps_report["processes"], 0);
    assert_eq!(ps_report["anomaly_symptoms"][0], "Unusable ps output format.");

    assert_eq!(json["failures"].as_array().map(Vec::len), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("1 capture(s) could not be parsed"));
}

#[test]
fn parse_batch_requires_captures() {
    let out = bin()
        .arg("parse-batch")
        .output()
        .expect("failed to run hostfacts");
    assert!(!out.status.success());
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_good_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("sources.yaml");
    fs::write(
        &catalog,
        r#"version: "1.0"
sources:
  - name: GoodPsArgs1
    cmd: /bin/ps
    args: ["-ef"]
    supported_os: [Linux]
  - name: GoodPsArgs2
    cmd: /bin/ps
    args: ["h", "-ewwo", "pid,ppid,uid,comm,cmd"]
    supported_os: [Linux]
  - name: DebianPackages
    cmd: /usr/bin/dpkg
    args: ["--list"]
"#,
    )
    .unwrap();

    let out = bin()
        .args(["validate", "--sources"])
        .arg(&catalog)
        .output()
        .expect("failed to run hostfacts");

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Validated 3 source(s)."));
}

#[test]
fn validate_rejects_bad_ps_layout() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("sources.yaml");
    fs::write(
        &catalog,
        r#"sources:
  - name: BadPsArgsDuplicateCmd
    cmd: /bin/ps
    args: ["h", "-ewwo", "pid,ppid,uid,cmd,comm,cmd"]
    supported_os: [Linux]
"#,
    )
    .unwrap();

    let out = bin()
        .args(["validate", "--sources"])
        .arg(&catalog)
        .output()
        .expect("failed to run hostfacts");

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("[duplicate_field]"));
    assert!(stderr.contains("BadPsArgsDuplicateCmd"));
    assert!(stderr.contains("error: "));
}

#[test]
fn validate_missing_catalog_fails() {
    let out = bin()
        .args(["validate", "--sources", "/nonexistent/sources.yaml"])
        .output()
        .expect("failed to run hostfacts");

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to load source catalog"));
}

// ---------------------------------------------------------------------------
// parsers
// ---------------------------------------------------------------------------

#[test]
fn parsers_lists_every_kind() {
    let out = bin()
        .args(["parsers", "--format", "json"])
        .output()
        .expect("failed to run hostfacts");

    let json = stdout_json(&out);
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|info| info["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["yum", "rpm", "dpkg", "dmidecode", "ps"]);
    assert_eq!(json[0]["tools"], serde_json::json!(["yum", "dnf"]));
}

#[test]
fn parsers_table_is_default() {
    let out = bin().arg("parsers").output().expect("failed to run hostfacts");

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.lines().any(|line| line.starts_with("dpkg") && line.contains("dpkg-query")));
}
