//! CLI tests for rosa-core.
//!
//! These tests verify that every subcommand sanitizes what it prints and
//! reports outcomes through stable exit codes.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for rosa-core binary.
fn rosa_core() -> Command {
    let mut cmd = Command::cargo_bin("rosa-core").expect("rosa-core binary should exist");
    cmd.env_remove("ROSA_LOG")
        .env_remove("ROSA_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

const LEAKY_OUTPUT: &str = "rosa login --client-secret abcdef123 --client-id myid\n\
Role ARN: arn:aws:iam::123456789012:role/foo\n\
{\"password\":\"S3cr3t!\"}\n";

// ============================================================================
// redact
// ============================================================================

mod redact {
    use super::*;

    #[test]
    fn redacts_stdin() {
        rosa_core()
            .arg("redact")
            .write_stdin(LEAKY_OUTPUT)
            .assert()
            .success()
            .stdout(
                "rosa login --client-secret ************* --client-id *************\n\
                 Role ARN: arn:aws:iam::*************:role/foo\n\
                 {\"password\":\"*************\"}\n",
            );
    }

    #[test]
    fn redacts_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");
        fs::write(&first, "-----BEGIN CERTIFICATE-----\nMIIBkTCB\n-----END CERTIFICATE-----\n")
            .unwrap();
        fs::write(&second, "AWS Account: 123456789012").unwrap();

        rosa_core()
            .arg("redact")
            .arg(&first)
            .arg(&second)
            .assert()
            .success()
            .stdout(
                "-----BEGIN CERTIFICATE-----\n*************\n-----END CERTIFICATE-----\n\
                 AWS Account: *************",
            );
    }

    #[test]
    fn report_has_counts_not_values() {
        rosa_core()
            .args(["--quiet", "redact", "--report"])
            .write_stdin(LEAKY_OUTPUT)
            .assert()
            .success()
            .stdout(predicate::str::contains("abcdef123").not())
            .stderr(predicate::str::contains("\"total\": 4"))
            .stderr(predicate::str::contains("flag-client-secret"))
            .stderr(predicate::str::contains("abcdef123").not())
            .stderr(predicate::str::contains("S3cr3t!").not());
    }

    #[test]
    fn missing_file_is_io_error() {
        rosa_core()
            .args(["redact", "/nonexistent/rosa-core-input.log"])
            .assert()
            .code(21)
            .stderr(predicate::str::contains("rosa-core-input.log"));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        rosa_core()
            .arg("redact")
            .write_stdin(b"--password \xffsecret\n".to_vec())
            .assert()
            .success()
            .stdout("--password *************\n");
    }
}

// ============================================================================
// check
// ============================================================================

mod check {
    use super::*;

    #[test]
    fn clean_input_exits_zero() {
        rosa_core()
            .arg("check")
            .write_stdin("INFO: Cluster 'mycluster' is now ready\n")
            .assert()
            .code(0)
            .stdout("");
    }

    #[test]
    fn secrets_exit_one_without_printing_them() {
        rosa_core()
            .arg("check")
            .write_stdin(LEAKY_OUTPUT)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("<stdin>: flag-client-secret [cli_flag] x1"))
            .stdout(predicate::str::contains("arn-account [aws_account] x1"))
            .stdout(predicate::str::contains("abcdef123").not())
            .stderr(predicate::str::contains("abcdef123").not());
    }

    #[test]
    fn redacted_output_passes_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");

        let output = rosa_core()
            .arg("redact")
            .write_stdin(LEAKY_OUTPUT)
            .output()
            .unwrap();
        fs::write(&path, output.stdout).unwrap();

        rosa_core().arg("check").arg(&path).assert().code(0);
    }

    #[test]
    fn json_findings() {
        let output = rosa_core()
            .args(["--quiet", "check", "--json"])
            .write_stdin("--bind-password pw1 --bind-password pw2\n")
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
        let findings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(findings[0]["source"], "<stdin>");
        assert_eq!(findings[0]["hits"][0]["rule"], "flag-bind-password");
        assert_eq!(findings[0]["hits"][0]["count"], 2);
    }
}

// ============================================================================
// rules
// ============================================================================

mod rules {
    use super::*;

    #[test]
    fn lists_rules_in_order() {
        let output = rosa_core().arg("rules").output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let names: Vec<&str> = stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .collect();
        assert_eq!(names.first(), Some(&"json-password"));
        assert_eq!(names.last(), Some(&"aws-billing-account-label"));
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn json_format() {
        let output = rosa_core().args(["rules", "--format", "json"]).output().unwrap();
        let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(rules.as_array().unwrap().len(), 15);
        assert_eq!(rules[4]["name"], "certificate");
        assert_eq!(rules[4]["category"], "certificate");
    }

    #[test]
    fn verify_canaries() {
        rosa_core()
            .args(["rules", "--verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("0 leaked"));
    }
}

// ============================================================================
// exec
// ============================================================================

#[cfg(unix)]
mod exec {
    use super::*;

    #[test]
    fn sanitizes_child_output_and_forwards_status() {
        rosa_core()
            .args([
                "exec",
                "--",
                "sh",
                "-c",
                "echo 'AWS Billing Account: 123456789012'; echo '--client-secret xyz' >&2; exit 4",
            ])
            .assert()
            .code(4)
            .stdout("AWS Billing Account: *************\n")
            .stderr(predicate::str::contains("--client-secret *************"))
            .stderr(predicate::str::contains("xyz").not());
    }

    #[test]
    fn logs_sanitized_command_line() {
        rosa_core()
            .args(["exec", "--", "echo", "--cluster-admin-password", "Adm1nPw"])
            .assert()
            .success()
            .stdout("--cluster-admin-password *************\n")
            .stderr(predicate::str::contains("Running command"))
            .stderr(predicate::str::contains("Adm1nPw").not());
    }

    #[test]
    fn jsonl_logs_are_sanitized() {
        let output = rosa_core()
            .args(["--log-format", "jsonl", "exec", "--", "echo", "--password", "pw"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(!stderr.contains(" pw"));
        for line in stderr.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(parsed.get("level").is_some());
        }
    }

    #[test]
    fn spawn_failure_exit_code() {
        rosa_core()
            .args(["exec", "--", "definitely-not-a-real-binary-7f3a"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("failed to run"));
    }
}

// ============================================================================
// Argument errors
// ============================================================================

mod invalid_args {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        rosa_core()
            .arg("nonexistent-command")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn exec_requires_command() {
        rosa_core().arg("exec").assert().code(10);
    }

    #[test]
    fn bad_log_level() {
        rosa_core()
            .args(["--log-level", "loud", "rules"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("unknown log level"));
    }

    #[test]
    fn help_exits_zero() {
        rosa_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("redact"));
    }
}
