//! Integration tests for rosa-redact.
//!
//! These tests verify:
//! - The documented input/output pairs for every rule category
//! - Canary strings never leak through any redaction path
//! - Streaming redaction agrees with whole-buffer redaction
//! - Concurrent callers never see each other's output

use std::io::{Read, Seek, SeekFrom, Write};

use rosa_redact::{
    redact, PatternRegistry, RedactingWriter, RedactionRule, Redactor, SecretCategory,
    CANARY_SECRETS, REDACT_VALUE,
};

/// Realistic harness output mixing clean lines and secrets.
const SESSION_LOG: &str = r#"INFO: Creating nodepool with flags [--cluster mycluster --name np1 --replicas 2]
INFO: Running command: rosa login --client-id svc-account --client-secret s3cr3tValue
{"kind":"Cluster","id":"2a3b","password":"hunter2","name":"mycluster"}
ERROR: failed to create idp: {\"password\":\"P@ss w0rd\",\"name\":\"htpasswd-1\"}
rosa create idp --type htpasswd --users alice:alicePw1 \
  --cluster mycluster
Role ARN:                   arn:aws:iam::123456789012:role/ManagedOpenShift-Installer-Role
AWS Account:                210987654321
AWS Billing Account:        111122223333
-----BEGIN CERTIFICATE-----
MIIBkTCB+wIJAK1xq3V8bXpEMA0GCSqGSIb3DQEBCwUAMA0xCzAJBgNVBAYTAlVT
MB4XDTI0MDEwMTAwMDAwMFoXDTI1MDEwMTAwMDAwMFowDTELMAkGA1UEBhMCVVMw
-----END CERTIFICATE-----
INFO: Cluster 'mycluster' is now ready
"#;

const SESSION_SECRETS: &[&str] = &[
    "svc-account",
    "s3cr3tValue",
    "hunter2",
    "P@ss w0rd",
    "alicePw1",
    "123456789012",
    "210987654321",
    "111122223333",
    "MIIBkTCB",
    "MB4XDTI0",
];

// ============================================================================
// Documented Examples
// ============================================================================

#[test]
fn test_certificate_block_keeps_markers() {
    let input = "-----BEGIN CERTIFICATE-----\nMIIBkTCB+wIJAK1xq3V8bXpE\n-----END CERTIFICATE-----";
    assert_eq!(
        redact(input),
        "-----BEGIN CERTIFICATE-----\n*************\n-----END CERTIFICATE-----"
    );
}

#[test]
fn test_escaped_json_password() {
    let input = r#"{\"password\":\"S3cr3t!\"}"#;
    assert_eq!(redact(input), r#"{\"password\":\"*************\"}"#);
}

#[test]
fn test_plain_json_password() {
    let input = r#"{"password":"S3cr3t!"}"#;
    assert_eq!(redact(input), r#"{"password":"*************"}"#);
}

#[test]
fn test_client_secret_rule_alone() {
    let registry = PatternRegistry::global();
    let rule = registry.get("flag-client-secret").unwrap();
    let input = "rosa login --client-secret abcdef123 --client-id myid";
    assert_eq!(
        rule.apply(input),
        "rosa login --client-secret ************* --client-id myid"
    );
}

#[test]
fn test_client_secret_and_client_id_full_registry() {
    let input = "rosa login --client-secret abcdef123 --client-id myid";
    assert_eq!(
        redact(input),
        "rosa login --client-secret ************* --client-id *************"
    );
}

#[test]
fn test_arn_account() {
    assert_eq!(
        redact("arn:aws:iam::123456789012:role/foo"),
        "arn:aws:iam::*************:role/foo"
    );
}

// ============================================================================
// Canary Leak Tests
// ============================================================================

#[test]
fn test_canary_secrets_never_leak() {
    for (input, secret) in CANARY_SECRETS {
        let output = redact(input);
        assert!(
            !output.contains(secret),
            "Canary '{}' leaked in output: {}",
            secret,
            output
        );
    }
}

#[test]
fn test_canary_secrets_never_leak_in_report() {
    let redactor = Redactor::global();
    for (input, secret) in CANARY_SECRETS {
        let report = redactor.redact_with_report(input);
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains(secret), "Canary '{}' leaked in report", secret);
        assert!(!report.output.as_str().contains(secret));
        assert!(report.total() >= 1, "no rule fired for: {}", input);
    }
}

#[test]
fn test_session_log_secrets_never_leak() {
    let output = redact(SESSION_LOG);
    for secret in SESSION_SECRETS {
        assert!(
            !output.contains(secret),
            "Secret '{}' leaked in output:\n{}",
            secret,
            output
        );
    }
    assert!(output.contains("INFO: Cluster 'mycluster' is now ready"));
    assert!(output.contains("--cluster mycluster --name np1 --replicas 2"));
    assert!(output.contains(r#""name":"mycluster""#));
    assert!(output.contains("--users alice:************* \\\n  --cluster mycluster"));
}

#[test]
fn test_session_log_categories() {
    let report = Redactor::global().redact_with_report(SESSION_LOG);
    assert_eq!(report.count_for(SecretCategory::JsonField), 2);
    assert_eq!(report.count_for(SecretCategory::Certificate), 1);
    assert_eq!(report.count_for(SecretCategory::CliFlag), 2);
    assert_eq!(report.count_for(SecretCategory::UserList), 1);
    assert_eq!(report.count_for(SecretCategory::AwsAccount), 3);
}

#[test]
fn test_session_log_idempotent() {
    let once = redact(SESSION_LOG);
    assert_eq!(redact(&once), once);
}

// ============================================================================
// Streaming
// ============================================================================

#[test]
fn test_writer_matches_whole_buffer() {
    let mut out = Vec::new();
    {
        let mut writer = RedactingWriter::new(&mut out);
        for chunk in SESSION_LOG.as_bytes().chunks(7) {
            writer.write_all(chunk).unwrap();
        }
    }
    assert_eq!(String::from_utf8(out).unwrap(), redact(SESSION_LOG));
}

#[test]
fn test_writer_to_file() {
    let file = tempfile::tempfile().unwrap();
    let mut writer = RedactingWriter::new(file);
    writer.write_all(SESSION_LOG.as_bytes()).unwrap();
    writer.finish().unwrap();

    let mut file = writer.get_ref().try_clone().unwrap();
    drop(writer);
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();

    assert_eq!(contents, redact(SESSION_LOG));
    assert!(contents.contains(REDACT_VALUE));
}

// ============================================================================
// Custom Registries
// ============================================================================

#[test]
fn test_registry_extension() {
    let registry = PatternRegistry::builtin()
        .unwrap()
        .with_rule(
            RedactionRule::new(
                "flag-token",
                SecretCategory::CliFlag,
                r"(--token(?:=|\s+))([^\s\\]+)([\s\\]*)",
            )
            .unwrap(),
        )
        .unwrap();
    let redactor = Redactor::new(&registry);
    assert_eq!(
        redactor.redact("--token abc --password pw"),
        "--token ************* --password *************"
    );
    // the global registry is untouched
    assert_eq!(redact("--token abc"), "--token abc");
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_callers_are_isolated() {
    let inputs: Vec<(String, String)> = (0..64)
        .map(|i| {
            let secret = format!("secret{i:04}");
            (format!("worker {i} --client-secret {secret} done"), secret)
        })
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|(input, secret)| {
                scope.spawn(move || {
                    let redactor = Redactor::global();
                    for _ in 0..50 {
                        let output = redactor.redact(input);
                        assert!(!output.contains(secret.as_str()));
                        assert_eq!(
                            output,
                            input.replace(secret.as_str(), REDACT_VALUE),
                            "cross-contaminated output"
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
