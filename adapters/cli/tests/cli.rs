use std::process::{Command, Output};

use castle_defence_core::PathLayout;
use serde_json::Value;

fn castle_defence(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_castle-defence"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch castle-defence binary")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn paths_prints_a_reproducible_layout() {
    let first = castle_defence(&["paths", "--seed", "7"]);
    let second = castle_defence(&["paths", "--seed", "7"]);
    assert_eq!(first.stdout, second.stdout);

    let layout: PathLayout = serde_json::from_value(stdout_json(&first)).expect("layout json");
    assert!((1..=2).contains(&layout.path_count()));
    assert_eq!(layout.castle().x(), 1280.0);
}

#[test]
fn degenerate_maps_fail_with_context() {
    let output = castle_defence(&["paths", "--width", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to generate paths"), "{stderr}");
}

#[test]
fn campaign_points_flow_from_sessions_into_unlocks() {
    let save = tempfile::tempdir().expect("temporary directory");
    let save_dir = save.path().to_str().expect("utf-8 path");

    let summary = stdout_json(&castle_defence(&[
        "simulate",
        "--seed",
        "3",
        "--waves",
        "1",
        "--save-dir",
        save_dir,
    ]));
    assert_eq!(summary["outcome"], "waves_cleared");
    let earned = summary["campaign_points"].as_u64().expect("points");

    let stats = stdout_json(&castle_defence(&["campaign", "--save-dir", save_dir]));
    assert_eq!(stats["campaignPoints"].as_u64(), Some(earned));
    assert_eq!(stats["towersUnlocked"].as_u64(), Some(1));

    let refused = castle_defence(&["campaign", "--save-dir", save_dir, "--unlock", "tower_frost"]);
    assert!(!refused.status.success());

    let reset = stdout_json(&castle_defence(&["campaign", "--save-dir", save_dir, "--reset"]));
    assert_eq!(reset["campaignPoints"].as_u64(), Some(0));
}
