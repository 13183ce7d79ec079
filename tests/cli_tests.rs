//! Integration tests for the opentex binary

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Command isolated from any opentex.toml on this machine
fn opentex(workdir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_opentex"));
    cmd.current_dir(workdir)
        .env_remove("RUST_LOG")
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join(".config"))
        .env("OPENTEX__STORAGE__PROJECTS_DIR", workdir.join("projects"))
        .env("OPENTEX__STORAGE__CREDENTIALS_DIR", workdir.join("git_config"));
    cmd
}

fn run(cmd: &mut Command) -> (Output, String) {
    let output = cmd.output().expect("Failed to execute CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (output, stdout)
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    let (output, stdout) = run(opentex(temp_dir.path()).arg("--help"));

    assert!(output.status.success());
    assert!(stdout.contains("OpenTex"));
    assert!(stdout.contains("compile"));
    assert!(stdout.contains("git-config"));
}

#[test]
fn test_new_and_list() {
    let temp_dir = TempDir::new().unwrap();

    let (output, stdout) = run(opentex(temp_dir.path()).args(["new", "My Paper!"]));
    assert!(output.status.success());
    assert!(stdout.contains("My_Paper"));
    assert!(temp_dir
        .path()
        .join("projects/My_Paper/document.tex")
        .is_file());

    let (output, stdout) = run(opentex(temp_dir.path()).args(["list", "--json"]));
    assert!(output.status.success());
    let projects: Vec<String> = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(projects, vec!["My_Paper"]);

    let (output, _) = run(opentex(temp_dir.path()).args(["new", "My Paper"]));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_config_file_is_honored() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("custom.toml");
    std::fs::write(
        &config,
        format!(
            "[storage]\nprojects_dir = \"{}\"\n",
            temp_dir.path().join("elsewhere").display()
        ),
    )
    .unwrap();

    let mut cmd = opentex(temp_dir.path());
    cmd.env_remove("OPENTEX__STORAGE__PROJECTS_DIR")
        .args(["new", "paper", "--config"])
        .arg(&config);
    let (output, _) = run(&mut cmd);

    assert!(output.status.success());
    assert!(temp_dir.path().join("elsewhere/paper").is_dir());
}

#[test]
fn test_push_without_credential_fails() {
    let temp_dir = TempDir::new().unwrap();
    run(opentex(temp_dir.path()).args(["new", "paper"]));

    let (output, stdout) = run(opentex(temp_dir.path()).args(["git-config"]));
    assert!(output.status.success());
    assert!(stdout.contains("not configured"));

    let (output, _) = run(opentex(temp_dir.path()).args(["push", "paper"]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("git credential"));
}

#[test]
fn test_compile_with_missing_typesetter() {
    let temp_dir = TempDir::new().unwrap();
    run(opentex(temp_dir.path()).args(["new", "paper"]));

    let mut cmd = opentex(temp_dir.path());
    cmd.env("OPENTEX__BUILD__PROGRAM", "opentex-no-such-typesetter")
        .args(["compile", "paper"]);
    let (output, _) = run(&mut cmd);

    assert_eq!(output.status.code(), Some(5));
}

#[cfg(unix)]
#[test]
fn test_compile_with_script_typesetter() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    run(opentex(temp_dir.path()).args(["new", "paper"]));

    let script = temp_dir.path().join("fake-latex.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\nfor last; do :; done\nprintf '%%PDF' > \"${last%.tex}.pdf\"\nexit 1\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut cmd = opentex(temp_dir.path());
    cmd.env("OPENTEX__BUILD__PROGRAM", &script)
        .args(["compile", "paper", "document.tex"]);
    let (output, stdout) = run(&mut cmd);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("document.pdf"));
    assert!(temp_dir.path().join("projects/paper/document.pdf").is_file());
}

#[test]
fn test_import_archive() {
    use std::io::Write;

    let temp_dir = TempDir::new().unwrap();
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("thesis/main.tex", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(b"\\documentclass{article}").unwrap();
    let archive = temp_dir.path().join("thesis.zip");
    std::fs::write(&archive, writer.finish().unwrap().into_inner()).unwrap();

    let (output, stdout) = run(opentex(temp_dir.path()).arg("import").arg(&archive));
    assert!(output.status.success());
    assert!(stdout.contains("project 'thesis'"));
    assert!(temp_dir.path().join("projects/thesis/main.tex").is_file());
}
