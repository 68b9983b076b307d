use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const DOCKERFILE_TEMPLATE: &str = "FROM centos:7\nRUN useradd -u {userid} builder\nENV RELEASE={release}\n";

fn pkgdock(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pkgdock");
    cmd.current_dir(dir).env_remove("BUILD_NUMBER").env_remove("RUST_LOG");
    cmd
}

fn project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("pkgdock.toml"), config).unwrap();
    std::fs::write(tmp.path().join("Dockerfile.template"), DOCKERFILE_TEMPLATE).unwrap();
    tmp
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Help / Version ──

#[test]
fn shows_help() {
    let tmp = TempDir::new().unwrap();
    pkgdock(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build docker images"))
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("--section"));
}

#[test]
fn shows_version() {
    let tmp = TempDir::new().unwrap();
    pkgdock(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pkgdock"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let tmp = TempDir::new().unwrap();
    pkgdock(tmp.path()).arg("deploy").assert().code(2);
}

// ── Show ──

#[test]
fn show_lists_resolved_options() {
    let tmp = project("[centos7]\nimage = \"rpm-builder\"\ntarget = \"hello.spec\"\n");

    pkgdock(tmp.path())
        .args(["-s", "centos7", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image        -> rpm-builder"))
        .stdout(predicate::str::contains("target       -> hello.spec"))
        .stdout(predicate::str::contains("dockerfile   -> Dockerfile.template"))
        .stdout(predicate::str::contains("git          -> false"));
}

#[test]
fn show_json_keeps_stdout_clean() {
    let tmp = project("[default]\nimagename = \"legacy\"\n");

    let output = pkgdock(tmp.path())
        .args(["show", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["image"], "legacy");
    assert_eq!(value["section"], "default");
}

#[test]
fn show_accepts_config_flag() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("other.toml"), "[default]\nimage = \"x\"\n").unwrap();

    pkgdock(tmp.path())
        .args(["-c", "other.toml", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> x"));
}

#[test]
fn show_ignores_missing_workdir() {
    let tmp = project("[default]\nworkdir = \"missing\"\n");

    pkgdock(tmp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("workdir      -> missing"));
}

// ── Config Errors ──

#[test]
fn missing_config_exits_3_without_side_effects() {
    for args in [
        vec!["image"],
        vec!["package"],
        vec!["package", "--remove"],
        vec!["shell"],
        vec!["generate"],
        vec!["clear"],
        vec!["show"],
    ] {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Dockerfile"), "keep").unwrap();
        std::fs::create_dir(tmp.path().join("rpmbuild")).unwrap();

        pkgdock(tmp.path())
            .args(&args)
            .assert()
            .code(3)
            .stderr(predicate::str::contains("pkgdock.toml"));

        assert_eq!(entries(tmp.path()), vec!["Dockerfile", "rpmbuild"], "{args:?}");
    }
}

#[test]
fn missing_section_exits_3_and_names_available() {
    let tmp = project("[rpm]\n[deb]\n");

    pkgdock(tmp.path())
        .args(["-s", "centos7", "generate"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("centos7"))
        .stderr(predicate::str::contains("deb, rpm"));

    assert!(!tmp.path().join("Dockerfile").exists());
}

#[test]
fn section_name_slashes_are_stripped() {
    let tmp = project("[centos7]\nimage = \"slashed\"\n");

    pkgdock(tmp.path())
        .args(["--section", "centos/7", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> slashed"));
}

// ── Generate ──

#[test]
fn generate_writes_dockerfile() {
    let tmp = project("[default]\n");

    pkgdock(tmp.path())
        .env("BUILD_NUMBER", "12")
        .arg("generate")
        .assert()
        .success();

    let content = std::fs::read_to_string(tmp.path().join("Dockerfile")).unwrap();
    assert!(content.starts_with("FROM centos:7\n"));
    assert!(content.contains("ENV RELEASE=12"));
    assert!(!content.contains('{'));
}

#[test]
fn generate_missing_template_exits_4() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("pkgdock.toml"), "[default]\n").unwrap();

    pkgdock(tmp.path())
        .arg("generate")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Dockerfile.template"));

    assert!(!tmp.path().join("Dockerfile").exists());
}

#[test]
fn generate_inside_workdir() {
    let tmp = project("[default]\nworkdir = \"packaging\"\n");
    std::fs::create_dir(tmp.path().join("packaging")).unwrap();
    std::fs::write(tmp.path().join("packaging/Dockerfile.template"), "FROM inner\n").unwrap();

    pkgdock(tmp.path()).arg("generate").assert().success();

    assert_eq!(
        std::fs::read_to_string(tmp.path().join("packaging/Dockerfile")).unwrap(),
        "FROM inner\n"
    );
    assert!(!tmp.path().join("Dockerfile").exists());
}

#[test]
fn missing_workdir_exits_5() {
    let tmp = project("[default]\nworkdir = \"missing\"\n");

    pkgdock(tmp.path())
        .arg("generate")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn git_release_outside_repository_exits_6() {
    let tmp = project("[default]\ngit = true\n");
    let ceiling = tmp.path().parent().unwrap();

    pkgdock(tmp.path())
        .env("GIT_CEILING_DIRECTORIES", ceiling)
        .arg("generate")
        .assert()
        .code(6);

    assert!(!tmp.path().join("Dockerfile").exists());
}

#[test]
fn missing_template_wins_over_git_failure() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("pkgdock.toml"), "[default]\ngit = true\n").unwrap();
    let ceiling = tmp.path().parent().unwrap();

    pkgdock(tmp.path())
        .env("GIT_CEILING_DIRECTORIES", ceiling)
        .arg("generate")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Dockerfile.template"));
}

// ── Clear ──

#[test]
fn clear_is_idempotent() {
    let tmp = project("[default]\n");
    std::fs::write(tmp.path().join("Dockerfile"), "FROM x").unwrap();
    std::fs::create_dir_all(tmp.path().join("build-env/SPECS")).unwrap();

    pkgdock(tmp.path()).arg("clear").assert().success();
    pkgdock(tmp.path()).arg("clear").assert().success();

    assert_eq!(
        entries(tmp.path()),
        vec!["Dockerfile.template", "pkgdock.toml"]
    );
}

// ── External Engine ──

/// Install a stand-in container engine that appends its arguments to
/// `engine.log` and exits with `status`.
#[cfg(unix)]
fn fake_engine(dir: &Path, status: i32) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-engine");
    let log = dir.join("engine.log");
    std::fs::write(
        &path,
        format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\nexit {status}\n",
            log.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn package_runs_engine_with_release_and_target() {
    let tools = TempDir::new().unwrap();
    let engine = fake_engine(tools.path(), 0);
    let tmp = project(&format!(
        "[default]\nengine = \"{}\"\nprepare = \"true\"\ntarget = \"t1\"\n",
        engine.display()
    ));
    std::fs::create_dir_all(tmp.path().join("rpmbuild/SPECS")).unwrap();
    std::fs::write(tmp.path().join("rpmbuild/SPECS/hello.spec"), "Name: hello").unwrap();

    pkgdock(tmp.path()).arg("package").assert().success();

    let log = std::fs::read_to_string(tools.path().join("engine.log")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("run --rm -v "), "got: {log}");
    assert!(log.contains("/build-env:/home/builder/build"), "got: {log}");
    assert!(log.contains("-e RELEASE=0 -e TARGET=t1 -t builder"), "got: {log}");
    assert!(tmp.path().join("build-env/SPECS/hello.spec").exists());
}

#[cfg(unix)]
#[test]
fn image_tags_only_with_build_number() {
    let tools = TempDir::new().unwrap();
    let engine = fake_engine(tools.path(), 0);
    let tmp = project(&format!("[default]\nengine = \"{}\"\n", engine.display()));

    pkgdock(tmp.path()).arg("image").assert().success();
    pkgdock(tmp.path())
        .env("BUILD_NUMBER", "42")
        .arg("image")
        .assert()
        .success();

    let log = std::fs::read_to_string(tools.path().join("engine.log")).unwrap();
    assert_eq!(
        log.lines().collect::<Vec<_>>(),
        vec![
            "build -t builder .",
            "build -t builder .",
            "tag builder:latest builder:42",
        ]
    );
}

#[cfg(unix)]
#[test]
fn engine_exit_status_propagates() {
    let tools = TempDir::new().unwrap();
    let engine = fake_engine(tools.path(), 42);
    let tmp = project(&format!("[default]\nengine = \"{}\"\n", engine.display()));

    pkgdock(tmp.path())
        .arg("package")
        .assert()
        .code(42)
        .stderr(predicate::str::contains("package stage failed"));
}

#[cfg(unix)]
#[test]
fn prepare_failure_skips_engine() {
    let tools = TempDir::new().unwrap();
    let engine = fake_engine(tools.path(), 0);
    let tmp = project(&format!(
        "[default]\nengine = \"{}\"\nprepare = \"exit 7\"\n",
        engine.display()
    ));

    pkgdock(tmp.path()).arg("package").assert().code(7);

    assert!(!tools.path().join("engine.log").exists());
}
