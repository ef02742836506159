use predicates::prelude::*;
use assert_cmd::Command;

const ENV_VARS: [&str; 4] = [
    "GCKIT_KEY_ID",
    "GCKIT_ISSUER_ID",
    "GCKIT_KEY_FILE",
    "GCKIT_APP_ID",
];

fn gckit() -> Command {
    let mut cmd = Command::cargo_bin("gckit").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn prints_help() {
    gckit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Game Center setup for App Store Connect"))
        .stdout(predicate::str::contains("upload-images"))
        .stdout(predicate::str::contains("submit-for-review"));
}

#[test]
fn setup_dry_run_needs_no_credentials() {
    gckit()
        .args(["setup", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"))
        .stdout(predicate::str::contains("level_60_score"))
        .stdout(predicate::str::contains("all_levels_complete"))
        .stdout(predicate::str::contains("(40 pts)"))
        .stdout(predicate::str::contains("Total:              121"))
        .stdout(predicate::str::contains("Achievement points: 100"));
}

#[test]
fn setup_dry_run_honours_level_count() {
    gckit()
        .args(["setup", "--dry-run", "--levels", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("level_3_complete"))
        .stdout(predicate::str::contains("level_4_score").not());
}

#[test]
fn setup_without_app_id_fails() {
    gckit()
        .arg("setup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GCKIT_APP_ID"));
}

#[test]
fn missing_key_id_is_reported() {
    gckit()
        .args(["--app-id", "123", "setup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GCKIT_KEY_ID"));
}

#[test]
fn unreadable_key_file_fails() {
    gckit()
        .args([
            "--app-id",
            "123",
            "--key-id",
            "K",
            "--issuer-id",
            "I",
            "--key-file",
            "/nonexistent/AuthKey_X.p8",
            "setup",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Generating JWT token..."))
        .stderr(predicate::str::contains("Failed to load key file"));
}

#[test]
fn token_prints_a_signed_jwt() {
    gckit()
        .env("GCKIT_KEY_ID", "KEY123")
        .env("GCKIT_ISSUER_ID", "issuer")
        .env("GCKIT_KEY_FILE", fixture("AuthKey_TEST.p8"))
        .arg("token")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[\w-]+\.[\w-]+\.[\w-]+\n$").unwrap());
}

#[test]
fn upload_dry_run_lists_png_files() {
    let dir = tempfile::tempdir().unwrap();
    let ach = dir.path().join("achievements");
    std::fs::create_dir_all(&ach).unwrap();
    std::fs::write(ach.join("level_2_complete.png"), b"abcd").unwrap();
    std::fs::write(ach.join("level_1_complete.png"), b"ab").unwrap();
    std::fs::write(ach.join("notes.txt"), b"skip me").unwrap();

    gckit()
        .args(["upload-images", "--dry-run", "--images-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("level_1_complete.png"))
        .stdout(predicate::str::contains("level_2_complete.png"))
        .stdout(predicate::str::contains("notes.txt").not())
        .stdout(predicate::str::contains("(no PNG files found)"));
}

#[test]
fn generate_images_writes_one_png_per_item() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gc_images");

    gckit()
        .args(["generate-images", "--levels", "2", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("level_2_score.png"));

    for file in [
        "achievements/level_1_complete.png",
        "achievements/level_2_complete.png",
        "achievements/all_levels_complete.png",
        "leaderboards/level_1_score.png",
        "leaderboards/level_2_score.png",
    ] {
        let bytes = std::fs::read(out.join(file)).unwrap();
        assert_eq!(&bytes[1..4], b"PNG", "{file} is not a PNG");
        assert_eq!(image::image_dimensions(out.join(file)).unwrap(), (1024, 1024));
    }
}

#[test]
fn yes_conflicts_with_keep_releases() {
    gckit()
        .args(["add-to-review", "--yes", "--keep-releases"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn add_to_review_without_terminal_needs_an_explicit_choice() {
    gckit()
        .args(["--app-id", "123", "add-to-review"])
        .write_stdin("")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Generating JWT token...").not())
        .stderr(predicate::str::contains("--yes"))
        .stderr(predicate::str::contains("--keep-releases"));
}
