use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn buildutil() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("buildutil"));
    cmd.env_remove("UNITY_HOME").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    buildutil()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build and package Unity projects"))
        .stdout(predicate::str::contains("packandroid"))
        .stdout(predicate::str::contains("packios"));
}

#[test]
fn test_unknown_build_target_uses_internal_exit_code() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("P")).unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["build", "P", "ps5", "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown build target: ps5"));
}

#[test]
fn test_build_without_unity_home() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("P")).unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["build", "P", "android", "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unity home is not set"));
}

#[test]
fn test_invoke_missing_project() {
    let tmp = tempdir().unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["invoke", "Missing", "Tools.Run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Project directory not found"));
}

#[test]
fn test_explicit_config_must_exist() {
    let tmp = tempdir().unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["--config", "nope.toml", "del", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_copy_and_delete_commands() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(src.join("nested/a.txt"), "a").unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["copy", "src", "dst"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DONE]"));
    assert_eq!(fs::read_to_string(tmp.path().join("dst/nested/a.txt")).unwrap(), "a");

    fs::write(tmp.path().join("dst.meta"), "").unwrap();
    buildutil()
        .current_dir(tmp.path())
        .args(["del", "dst", "--sfx", ".meta"])
        .assert()
        .success();
    assert!(!tmp.path().join("dst").exists());
    assert!(!tmp.path().join("dst.meta").exists());
}

#[test]
fn test_copy_missing_source_fails() {
    let tmp = tempdir().unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["copy", "missing", "dst"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("copy failed"));
}

#[test]
fn test_packandroid_requires_build_file() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("proj")).unwrap();

    buildutil()
        .current_dir(tmp.path())
        .args(["packandroid", "proj", "--task", "assembleRelease"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("build.gradle"));
}

#[cfg(unix)]
#[test]
fn test_editor_exit_code_is_mirrored() {
    use std::os::unix::fs::PermissionsExt;
    use unity_buildutil::invoker::inject::{HELPER_ROOT, HELPER_SCRIPTS};
    use unity_buildutil::pipelines::unity_executable_in;

    let tmp = tempdir().unwrap();
    let home = tmp.path().join("Unity");
    let exe = unity_executable_in(&home);
    fs::create_dir_all(exe.parent().unwrap()).unwrap();
    fs::write(&exe, "#!/bin/sh\nexit 3\n").unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

    let scripts = tmp.path().join("EditorScripts");
    fs::create_dir_all(&scripts).unwrap();
    for name in HELPER_SCRIPTS {
        fs::write(scripts.join(name), "// helper").unwrap();
    }
    let project = tmp.path().join("P");
    fs::create_dir_all(project.join("Assets")).unwrap();

    buildutil()
        .current_dir(tmp.path())
        .env("UNITY_HOME", &home)
        .arg("--scripts-dir")
        .arg(&scripts)
        .args(["invoke", "P", "Tools.Run", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exit code 3"));

    assert!(!project.join(HELPER_ROOT).exists());
}
