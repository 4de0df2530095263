//! Integration tests for the folder-priority CLI

use std::io::Write;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_folder-priority"));
    // keep the developer's environment out of the tests
    for var in [
        "FOLDER_PRIORITY_RULES",
        "FOLDER_PRIORITY_DEFAULT",
        "FOLDER_PRIORITY_STRATEGY",
        "FOLDER_PRIORITY_ANCHOR",
        "FOLDER_PRIORITY_SEGMENT_PREFIX",
        "FOLDER_PRIORITY_SEGMENT_FALLBACK",
        "FOLDER_PRIORITY_OUTPUT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_classify_file() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(
        input,
        r#"{{"values":[{{"recordId":"7","data":{{"storagePath":"/share/Manuals/a.pdf"}}}}]}}"#
    )
    .unwrap();

    let output = cli()
        .args(["classify", "--rules", "Guides:1;Manuals:5", "--default-priority", "100", "--input"])
        .arg(input.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["values"][0]["recordId"], "7");
    assert_eq!(value["values"][0]["data"]["priority"], 5);
}

#[test]
fn test_classify_replace_contract() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(input, r#"{{"recordId":"1","path":"/x/Guides/y"}}"#).unwrap();

    let output = cli()
        .args(["classify", "--rules", "Guides:1", "--output-contract", "replace", "--input"])
        .arg(input.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["values"][0]["data"], serde_json::json!({"folderPriority": 1}));
}

#[test]
fn test_classify_unparseable_file_fails() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(input, "not json").unwrap();

    let output = cli().args(["classify", "--input"]).arg(input.path()).output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_resolve_segment_strategy() {
    let output = cli()
        .args([
            "resolve",
            "/docs/4142_Guides/41421_Subfolder/file.pdf",
            "--strategy",
            "segment",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2");
}

#[test]
fn test_rules_listing_in_match_order() {
    let output = cli()
        .args(["rules", "--rules", "Guides:1;Guides/Internal:0"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let internal = stdout.find("guides/internal").unwrap();
    let guides = stdout.rfind("guides ").unwrap();
    assert!(internal < guides);
}
