use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let exe = assert_cmd::cargo_bin!("eddy-cli");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn cli_lays_out_json_fixture() {
    let path = fixture("cycle.json");
    let layout = run_json(&["layout", path.to_string_lossy().as_ref()]);

    assert_eq!(layout["nodes"].as_array().unwrap().len(), 5);
    let links = layout["links"].as_array().unwrap();
    assert_eq!(links.len(), 7);
    assert!(links.iter().any(|l| l["circular"] == true));
    assert!(links.iter().all(|l| l["d"].as_str().unwrap().starts_with('M')));
    assert_eq!(layout["bounds"]["x1"], 600.0);
}

#[test]
fn cli_reads_csv_and_applies_flags() {
    let path = fixture("energy.csv");
    let layout = run_json(&[
        "--width",
        "900",
        "--height",
        "300",
        "--align",
        "right",
        path.to_string_lossy().as_ref(),
    ]);
    assert_eq!(layout["bounds"]["x1"], 900.0);
    assert_eq!(layout["bounds"]["y1"], 300.0);
    let ids: Vec<&str> = layout["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids[0], "Coal");
    assert!(ids.contains(&"Storage"));
}

#[test]
fn cli_applies_json5_config() {
    let graph = fixture("cycle.json");
    let config = fixture("config.json5");
    let layout = run_json(&[
        "--config",
        config.to_string_lossy().as_ref(),
        "--pretty",
        graph.to_string_lossy().as_ref(),
    ]);
    assert_eq!(layout["bounds"]["x1"], 800.0);
    let legend: Vec<&str> = layout["legend"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(legend, vec!["recyclable", "residual", "mixed", "rejected"]);
    assert_eq!(layout["legend"][0]["label"], "Recyclable");
}

#[test]
fn cli_prints_paths_from_stdin() {
    let text = fs::read_to_string(fixture("energy.csv")).expect("read fixture");

    let exe = assert_cmd::cargo_bin!("eddy-cli");
    let output = assert_cmd::Command::new(exe)
        .args(["paths", "-"])
        .write_stdin(text)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf-8 output");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 10);
    let first: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(first[..2], ["Coal", "Power plant"]);
    assert!(first[2].starts_with('M'));
}

#[test]
fn cli_usage_errors_exit_with_2() {
    let exe = assert_cmd::cargo_bin!("eddy-cli");
    Command::new(exe).args(["--width", "-5"]).assert().code(2);

    let exe = assert_cmd::cargo_bin!("eddy-cli");
    Command::new(exe).args(["--bogus"]).assert().code(2);
}

#[test]
fn cli_bad_input_exits_with_1() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("broken.csv");
    fs::write(&input, "a,b,1\na,c,lots\n").expect("write input");

    let exe = assert_cmd::cargo_bin!("eddy-cli");
    let assert = Command::new(exe)
        .arg(input.to_string_lossy().as_ref())
        .assert()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("line 2"), "{stderr}");
}
