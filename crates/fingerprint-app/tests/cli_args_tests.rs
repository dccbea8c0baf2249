//! Integration tests for command-line argument validation.

use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fingerprint-app"))
        .args(args)
        .output()
        .expect("binary should run")
}

#[test]
fn cli_args_tests_depth_beyond_limit_is_rejected() {
    let output = run_cli(&["plan", "--duration", "60", "--mode", "quadtree", "--depth", "20"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_args_tests_deepest_quadtree_plans() {
    let output = run_cli(&["plan", "--duration", "1:00", "--mode", "quadtree", "--depth", "6"]);
    assert!(output.status.success(), "{output:?}");
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).expect("plan is JSON");
    assert_eq!(plan["cells"].as_array().map(Vec::len), Some(4096));
}
