//! Integration tests for the Sigil CLI.
//!
//! Each test creates keys and bundles in a temporary directory, invokes the
//! `sigil` binary via `assert_cmd`, and checks outputs and exit codes.

#![allow(deprecated)] // cargo_bin deprecation — macro replacement not yet stable

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use sigil_core::keys::{SigningKey, der_to_pem};

const DIGEST: &str = "sha256:abc";
const REFERENCE: &str = "example.com/app:v1";

/// Convenience: get a `Command` for the `sigil` binary, isolated from any
/// user configuration.
fn sigil(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sigil").expect("sigil binary not found");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env("HOME", dir);
    cmd
}

/// Helper: generate a key pair and write both halves as PEM files.
/// Returns (private_key_path, public_key_path).
fn write_key_pair(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    use aws_lc_rs::rand::SystemRandom;
    use aws_lc_rs::signature::Ed25519KeyPair;

    let rng = SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("keygen");
    let public = SigningKey::from_pkcs8_der(pkcs8.as_ref())
        .expect("parse")
        .public_key()
        .expect("public key");

    let priv_path = dir.join(format!("{name}.key"));
    std::fs::write(&priv_path, der_to_pem(pkcs8.as_ref(), "PRIVATE KEY")).expect("write key");
    let pub_path = dir.join(format!("{name}.pub"));
    std::fs::write(&pub_path, public.to_pem()).expect("write pub");

    (priv_path, pub_path)
}

/// Helper: print a payload, sign it, and attach it to `bundle.json`.
fn sign_and_attach(dir: &Path, key: &Path, digest: &str, annotations: &[&str]) -> PathBuf {
    let mut payload_cmd = sigil(dir);
    payload_cmd.args(["payload", "--digest", digest]);
    for a in annotations {
        payload_cmd.args(["-a", a]);
    }
    let payload = payload_cmd.output().expect("run payload").stdout;
    let payload_path = dir.join("payload.json");
    std::fs::write(&payload_path, &payload).expect("write payload");

    let out = sigil(dir)
        .args(["sign-blob", "--key", key.to_str().unwrap(), payload_path.to_str().unwrap()])
        .output()
        .expect("run sign-blob");
    assert!(out.status.success(), "sign-blob failed: {out:?}");
    let signature = String::from_utf8(out.stdout).unwrap();

    let bundle_path = dir.join("bundle.json");
    sigil(dir)
        .args([
            "attach",
            "--bundle",
            bundle_path.to_str().unwrap(),
            "--digest",
            DIGEST,
            "--payload",
            payload_path.to_str().unwrap(),
            "--signature",
            signature.trim(),
        ])
        .assert()
        .success();

    bundle_path
}

// ─── verify tests ───────────────────────────────────────────

#[test]
fn verify_valid_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &[]);

    sigil(dir.path())
        .args(["verify", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-manifest-digest"))
        .stdout(predicate::str::contains(DIGEST))
        .stderr(predicate::str::contains("The signed claims were validated"));
}

#[test]
fn verify_wrong_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (key, _) = write_key_pair(dir.path(), "signer");
    let (_, other) = write_key_pair(dir.path(), "other");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &[]);

    sigil(dir.path())
        .args(["verify", "--key", other.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no matching signatures"))
        .stderr(predicate::str::contains("unable to verify signature"));
}

#[test]
fn verify_wrong_digest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, "sha256:def", &[]);

    sigil(dir.path())
        .args(["verify", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no matching claims"))
        .stderr(predicate::str::contains("invalid or missing digest in claim: sha256:def"));
}

#[test]
fn verify_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &["env=prod", "team=infra"]);
    let args = |annotation: &str| {
        vec![
            "verify".to_owned(),
            "--key".to_owned(),
            public.to_str().unwrap().to_owned(),
            "--bundle".to_owned(),
            bundle.to_str().unwrap().to_owned(),
            "-a".to_owned(),
            annotation.to_owned(),
            REFERENCE.to_owned(),
        ]
    };

    sigil(dir.path()).args(args("env=prod")).assert().success();
    sigil(dir.path())
        .args(args("env=dev"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid or missing annotation in claim"));
}

#[test]
fn verify_without_claim_checks_accepts_any_payload() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");
    let blob = dir.path().join("blob.txt");
    std::fs::write(&blob, b"not a claim at all").unwrap();

    let out = sigil(dir.path())
        .args(["sign-blob", "--key", key.to_str().unwrap(), blob.to_str().unwrap()])
        .output()
        .unwrap();
    let signature = String::from_utf8(out.stdout).unwrap();
    let bundle = dir.path().join("bundle.json");
    sigil(dir.path())
        .args([
            "attach", "--bundle", bundle.to_str().unwrap(), "--digest", DIGEST,
            "--payload", blob.to_str().unwrap(), "--signature", signature.trim(),
        ])
        .assert()
        .success();

    let verify = |check: &str| {
        let mut cmd = sigil(dir.path());
        cmd.args([
            "verify", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(),
            "--check-claims", check, REFERENCE,
        ]);
        cmd
    };

    verify("false")
        .assert()
        .success()
        .stdout(predicate::str::contains("not a claim at all"));
    verify("true")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed payload"));
}

#[test]
fn verify_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &[]);

    let output = sigil(dir.path())
        .args(["verify", "--json", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .output()
        .expect("run verify");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let entries = report.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["payload"]["critical"]["image"]["docker-manifest-digest"], DIGEST);
    assert!(entries[0]["payloadDigest"].as_str().unwrap().starts_with("sha256:"));
}

#[test]
fn verify_key_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &["env=prod"]);

    let config = dir.path().join("sigil.toml");
    std::fs::write(
        &config,
        format!("key = {:?}\n\n[annotations]\nenv = \"prod\"\n", public.to_str().unwrap()),
    )
    .unwrap();

    sigil(dir.path())
        .args(["--config", config.to_str().unwrap(), "verify", "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .assert()
        .success();
}

#[test]
fn verify_without_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (key, _) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &[]);

    sigil(dir.path())
        .args(["verify", "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no public key given"));
}

// ─── sign-blob / attach tests ───────────────────────────────

#[test]
fn sign_blob_from_stdin_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");

    let out = sigil(dir.path())
        .args(["sign-blob", "--key", key.to_str().unwrap(), "-"])
        .write_stdin("hello from stdin")
        .output()
        .expect("run sign-blob");
    assert!(out.status.success());
    let signature = String::from_utf8(out.stdout).unwrap();

    let public = sigil_core::keys::load_public_key(public.to_str().unwrap()).expect("load key");
    sigil_core::signature::verify_signature(&public, signature.trim(), b"hello from stdin")
        .expect("signature should verify");
}

#[test]
fn sign_blob_raw_is_64_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (key, _) = write_key_pair(dir.path(), "signer");

    let out = sigil(dir.path())
        .args(["sign-blob", "--raw", "--key", key.to_str().unwrap(), "-"])
        .write_stdin("payload")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout.len(), 64);
}

#[test]
fn sign_blob_rejects_public_key() {
    let dir = tempfile::tempdir().unwrap();
    let (_, public) = write_key_pair(dir.path(), "signer");

    sigil(dir.path())
        .args(["sign-blob", "--key", public.to_str().unwrap(), "-"])
        .write_stdin("payload")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load key"));
}

#[test]
fn attach_generates_payload_and_reads_signature_file() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");

    // Sign the payload `attach` will generate for the same digest
    let payload = sigil(dir.path())
        .args(["payload", "--digest", DIGEST])
        .output()
        .unwrap()
        .stdout;
    let sig = sigil(dir.path())
        .args(["sign-blob", "--key", key.to_str().unwrap(), "-"])
        .write_stdin(payload)
        .output()
        .unwrap()
        .stdout;
    let sig_path = dir.path().join("payload.sig");
    std::fs::write(&sig_path, sig).unwrap();

    let bundle = dir.path().join("bundle.json");
    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--digest", DIGEST, "--signature", sig_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 total"));

    sigil(dir.path())
        .args(["verify", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), REFERENCE])
        .assert()
        .success();
}

#[test]
fn attach_rejects_bad_signatures() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.json");

    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--digest", DIGEST, "--signature", "-"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty signature"));

    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--digest", DIGEST, "--signature", "%%%"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid base64"));

    assert!(!bundle.exists(), "failed attach must not create the bundle");
}

#[test]
fn attach_new_bundle_requires_digest() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.json");

    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--signature", "c2ln"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--digest is required"));
}

#[test]
fn attach_appends_to_existing_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let (key, _) = write_key_pair(dir.path(), "signer");
    let bundle = sign_and_attach(dir.path(), &key, DIGEST, &[]);

    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--signature", "c2ln"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 total"));

    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--digest", "sha256:other", "--signature", "c2ln"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bundle is for sha256:abc"));
}

#[test]
fn attach_oci_manifest_bundle_verifies() {
    const OCI: &str = "application/vnd.oci.image.manifest.v1+json";
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");

    // Sign the descriptor payload `attach` will generate for this media type
    let payload = sigil(dir.path())
        .args(["payload", "--digest", DIGEST, "--media-type", OCI, "-a", "env=prod"])
        .output()
        .unwrap()
        .stdout;
    assert!(String::from_utf8_lossy(&payload).contains(OCI), "payload must carry mediaType");
    let sig = sigil(dir.path())
        .args(["sign-blob", "--key", key.to_str().unwrap(), "-"])
        .write_stdin(payload)
        .output()
        .unwrap()
        .stdout;
    let sig = String::from_utf8(sig).unwrap();

    let bundle = dir.path().join("bundle.json");
    sigil(dir.path())
        .args([
            "attach",
            "--bundle",
            bundle.to_str().unwrap(),
            "--digest",
            DIGEST,
            "--media-type",
            OCI,
            "-a",
            "env=prod",
            "--signature",
            sig.trim(),
        ])
        .assert()
        .success();

    sigil(dir.path())
        .args(["verify", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), "-a", "env=prod", REFERENCE])
        .assert()
        .success()
        .stdout(predicate::str::contains("mediaType"))
        .stderr(predicate::str::contains("The signed claims were validated"));
}

#[test]
fn attach_unknown_media_type_requires_payload() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("bundle.json");

    sigil(dir.path())
        .args([
            "attach",
            "--bundle",
            bundle.to_str().unwrap(),
            "--digest",
            DIGEST,
            "--media-type",
            "application/octet-stream",
            "--signature",
            "c2ln",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--payload is required for media type application/octet-stream",
        ));
    assert!(!bundle.exists());
}

#[test]
fn attach_annotations_conflict_with_payload() {
    let dir = tempfile::tempdir().unwrap();
    let payload = dir.path().join("payload.json");
    std::fs::write(&payload, b"{}").unwrap();
    let bundle = dir.path().join("bundle.json");

    sigil(dir.path())
        .args([
            "attach",
            "--bundle",
            bundle.to_str().unwrap(),
            "--digest",
            DIGEST,
            "--payload",
            payload.to_str().unwrap(),
            "-a",
            "env=prod",
            "--signature",
            "c2ln",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
    assert!(!bundle.exists());
}

#[test]
fn attach_binds_bundle_to_reference() {
    let dir = tempfile::tempdir().unwrap();
    let (key, public) = write_key_pair(dir.path(), "signer");

    let payload = sigil(dir.path())
        .args(["payload", "--digest", DIGEST])
        .output()
        .unwrap()
        .stdout;
    let sig = sigil(dir.path())
        .args(["sign-blob", "--key", key.to_str().unwrap(), "-"])
        .write_stdin(payload)
        .output()
        .unwrap()
        .stdout;
    let sig = String::from_utf8(sig).unwrap();

    let bundle = dir.path().join("bundle.json");
    sigil(dir.path())
        .args([
            "attach",
            "--bundle",
            bundle.to_str().unwrap(),
            "--digest",
            DIGEST,
            "--reference",
            REFERENCE,
            "--signature",
            sig.trim(),
        ])
        .assert()
        .success();

    let verify = |reference: &str| {
        let mut cmd = sigil(dir.path());
        cmd.args(["verify", "--key", public.to_str().unwrap(), "--bundle", bundle.to_str().unwrap(), reference]);
        cmd
    };
    verify(REFERENCE).assert().success();
    verify("example.com/other:v1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bundle is for `example.com/app:v1`"));

    sigil(dir.path())
        .args(["attach", "--bundle", bundle.to_str().unwrap(), "--reference", "example.com/other:v1", "--signature", "c2ln"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bundle is bound to example.com/app:v1"));
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    sigil(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("sign-blob"))
        .stdout(predicate::str::contains("attach"));
}
