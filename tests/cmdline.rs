/// Run the rtmr3-replay command with various parameters
use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const RTMR3: &str = "8d92e6b37fc64cccd58b177712d3fb3e3288abf28352894b8345b8ea3db70e63f6969f37e38a376818ca96e00c42f07d";
const COMPOSE_HASH: &str = "582a7ace6bbbd4683c2e4301edafc75bf4b284de1afb377cc5873da9e26f4188";

fn cmd() -> Command {
    Command::cargo_bin("rtmr3-replay").unwrap()
}

fn zero() -> String {
    "00".repeat(48)
}

#[test]
fn no_param() {
    // Without argument, shows the usage an aborts
    let result = cmd().assert();
    result.failure().stderr(predicate::str::contains("Usage:"));

    let result = cmd().arg("help").assert();
    result.success().stdout(predicate::str::contains("Usage:"));
}

#[test]
fn compute_config() {
    cmd()
        .args(["-c", "testdata/rtmr3.conf", "compute"])
        .assert()
        .append_context("test", "config file")
        .success()
        .stdout(format!("RTMR3: {RTMR3}\n"));

    cmd()
        .args(["-c", "testdata/rtmr3.conf", "compute"])
        .args(["--instance-id", &"01".repeat(48)])
        .assert()
        .append_context("test", "command-line overrides config")
        .success()
        .stdout(predicate::str::contains("RTMR3: "))
        .stdout(predicate::str::contains(RTMR3).not());

    cmd()
        .args(["-c", "testdata/nonexistent.conf", "compute"])
        .assert()
        .append_context("test", "missing config file")
        .failure()
        .stderr(predicate::str::contains("testdata/nonexistent.conf"));
}

#[test]
fn compute_params() {
    let temp = assert_fs::TempDir::new().unwrap();
    let manifest = temp.child("app-compose.json");
    manifest
        .write_str(r#"{"a":1,"docker_config":{"username":"someone"}}"#)
        .unwrap();

    let z = zero();
    let args = [
        "--rootfs-hash",
        &z,
        "--app-id",
        &z,
        "--ca-cert-hash",
        &z,
        "--instance-id",
        &z,
    ];

    cmd()
        .arg("compute")
        .args(args)
        .args(["--manifest", manifest.path().to_str().unwrap()])
        .assert()
        .append_context("test", "manifest")
        .success()
        .stdout(format!("RTMR3: {RTMR3}\n"));

    cmd()
        .arg("compute")
        .args(args)
        .args(["--compose-hash", COMPOSE_HASH])
        .assert()
        .append_context("test", "compose hash")
        .success()
        .stdout(format!("RTMR3: {RTMR3}\n"));

    cmd()
        .arg("compute")
        .args(["--rootfs-hash", &z, "--app-id", &z])
        .args(["--compose-hash", COMPOSE_HASH])
        .assert()
        .append_context("test", "missing CA cert hash")
        .failure()
        .stderr(predicate::str::contains("ca-cert-hash is not known"));

    cmd()
        .arg("compute")
        .args(args)
        .args(["--manifest", "testdata/nonexistent.json"])
        .assert()
        .append_context("test", "missing manifest")
        .failure()
        .stderr(predicate::str::contains("testdata/nonexistent.json"));

    temp.close().unwrap();
}

#[test]
fn compute_output() {
    cmd()
        .args(["-c", "testdata/rtmr3.conf", "--json", "compute"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\"rtmr3\": \"{RTMR3}\"")))
        .stdout(predicate::str::contains(format!("\"compose_hash\": \"{COMPOSE_HASH}\"")))
        .stdout(predicate::str::contains("\"event\": \"instance-id\""));

    cmd()
        .args(["-c", "testdata/rtmr3.conf", "-v", "compute"])
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("compose-hash: {COMPOSE_HASH}")))
        .stderr(predicate::str::contains("rootfs-hash digest: d0156882"));

    cmd()
        .args(["-c", "testdata/rtmr3.conf", "--print-b64", "compute"])
        .assert()
        .success()
        .stdout(predicate::str::contains(RTMR3).not())
        .stdout(predicate::str::starts_with("RTMR3: jZLms3/GTMzV"));
}

#[test]
fn strict() {
    let z = zero();
    let args = ["--rootfs-hash", "zz", "--app-id", &z, "--ca-cert-hash", &z];

    cmd()
        .arg("compute")
        .args(args)
        .args(["--instance-id", &z, "--compose-hash", COMPOSE_HASH])
        .assert()
        .append_context("test", "lenient hex")
        .success();

    cmd()
        .args(["--strict", "compute"])
        .args(args)
        .args(["--instance-id", &z, "--compose-hash", COMPOSE_HASH])
        .assert()
        .append_context("test", "strict hex")
        .failure()
        .stderr(predicate::str::contains("invalid rootfs-hash"));
}

#[test]
fn compose_hash() {
    cmd()
        .args(["compose-hash", "testdata/app-compose.json"])
        .assert()
        .success()
        .stdout(format!("{COMPOSE_HASH}\n"));

    cmd()
        .args(["compose-hash", "testdata/nonexistent.json"])
        .assert()
        .failure();
}

#[test]
fn digest() {
    cmd()
        .args(["digest", "app-id", "ab"])
        .assert()
        .success()
        .stdout("8c36c0055ce423d2ed035e3e8c4975071eccfbb33d71f01554f1023ea5adec195489aa5af620e0da066fbfd7872f2a55\n");

    cmd()
        .args(["digest", "app-id", ""])
        .assert()
        .append_context("test", "empty value")
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("app-id is not known"));

    cmd()
        .args(["digest", "instance-id", "  "])
        .assert()
        .append_context("test", "blank value")
        .failure()
        .stderr(predicate::str::contains("instance-id is not known"));

    cmd()
        .args(["digest", "app-id", "zz"])
        .assert()
        .append_context("test", "undecodable value is measured as empty")
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{96}\n$").unwrap());

    cmd()
        .args(["digest", "rtmr3", "ab"])
        .assert()
        .append_context("test", "unknown event")
        .failure()
        .stderr(predicate::str::contains("unknown event"));

    cmd()
        .args(["--strict", "digest", "app-id", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid app-id"));
}

#[test]
fn replay() {
    cmd()
        .arg("replay")
        .assert()
        .success()
        .stdout(format!("RTMR: {}\n", "0".repeat(96)));

    cmd()
        .args(["--print-b64", "replay"])
        .assert()
        .success()
        .stdout(format!("RTMR: {}\n", "A".repeat(64)));

    cmd()
        .args(["replay", "ab"])
        .assert()
        .success()
        .stdout("RTMR: 588543df6ba930fa5e91593de47ea696f3cd618f5d8ad1efaacdbad08c48526a86faa945dcc8b03908ce8fe713ccc980\n");

    cmd()
        .args(["replay", &"00".repeat(49)])
        .assert()
        .append_context("test", "event too large")
        .failure()
        .stderr(predicate::str::contains("larger than 48"));

    cmd()
        .args(["--strict", "replay", "ab", "xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("odd number of hex digits"));
}
