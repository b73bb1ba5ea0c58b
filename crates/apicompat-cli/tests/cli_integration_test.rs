//! CLI 集成测试
//!
//! 测试命令行接口的各种功能和参数组合

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// 获取编译后的二进制文件路径
fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_apicompat"));
    command.env_remove("APICOMPAT_NOWARN").env_remove("RUST_LOG");
    command
}

fn surface(attributes: &[&str]) -> String {
    let attributes: Vec<_> = attributes
        .iter()
        .map(|id| serde_json::json!({ "type": id }))
        .collect();
    serde_json::json!({
        "name": "CompatTests",
        "namespaces": [{
            "name": "CompatTests",
            "types": [{ "name": "First", "attributes": attributes }]
        }]
    })
    .to_string()
}

/// 创建左右两个版本的表面描述
fn create_inputs() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let left = temp_dir.path().join("left.json");
    let right = temp_dir.path().join("right.json");
    std::fs::write(&left, surface(&["T:System.SerializableAttribute"])).expect("write left");
    std::fs::write(&right, surface(&[])).expect("write right");
    (temp_dir, left, right)
}

fn run(args: &[&str], left: &Path, right: &Path) -> Output {
    binary()
        .arg("--left")
        .arg(left)
        .arg("--right")
        .arg(right)
        .args(args)
        .output()
        .expect("Failed to run apicompat")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_help_output() {
    let output = binary().arg("--help").output().expect("Failed to run apicompat");
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("--suppression-file"));
    assert!(text.contains("--strict-mode"));
}

#[test]
fn test_differences_exit_with_one() {
    let (_dir, left, right) = create_inputs();
    let output = run(&[], &left, &right);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "CP0014 Removed T:CompatTests.First:[T:System.SerializableAttribute]\n"
    );
}

#[test]
fn test_identical_inputs_succeed() {
    let (_dir, left, _) = create_inputs();
    let output = run(&[], &left, &left);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_no_warn_flag_and_environment() {
    let (_dir, left, right) = create_inputs();
    let output = run(&["--no-warn", "CP0014"], &left, &right);
    assert_eq!(output.status.code(), Some(0));

    let output = binary()
        .env("APICOMPAT_NOWARN", "CP0001;CP0014")
        .arg("-l")
        .arg(&left)
        .arg("-r")
        .arg(&right)
        .output()
        .expect("Failed to run apicompat");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_generate_then_consume_suppression_file() {
    let (dir, left, right) = create_inputs();
    let suppression_file = dir.path().join("suppressions.json");
    let suppression_arg = suppression_file.to_string_lossy().to_string();

    let output = run(
        &["--generate-suppression-file", "--suppression-file", &suppression_arg],
        &left,
        &right,
    );
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());

    let written = std::fs::read_to_string(&suppression_file).expect("suppression file");
    assert!(written.contains("\"diagnosticKind\": \"CP0014\""));

    let output = run(&["--suppression-file", &suppression_arg], &left, &right);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_generate_without_file_is_fatal() {
    let (_dir, left, right) = create_inputs();
    let output = run(&["--generate-suppression-file"], &left, &right);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_exclude_attributes_file() {
    let (dir, left, right) = create_inputs();
    let exclusions = dir.path().join("exclusions.txt");
    std::fs::write(&exclusions, "T:System.SerializableAttribute\n").expect("write exclusions");

    let output = run(
        &["--exclude-attributes-file", &exclusions.to_string_lossy()],
        &left,
        &right,
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_malformed_input_is_fatal() {
    let (dir, left, _) = create_inputs();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"name\": ").expect("write broken");

    let output = run(&[], &left, &broken);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_per_assembly_mismatch_is_fatal() {
    let (_dir, left, right) = create_inputs();
    let output = binary()
        .arg("--left")
        .arg(&left)
        .arg(&right)
        .arg("--right")
        .arg(&right)
        .arg("--per-assembly")
        .output()
        .expect("Failed to run apicompat");
    assert_eq!(output.status.code(), Some(2));
}
