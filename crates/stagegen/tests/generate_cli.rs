use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn write_plasma(root: &Path) -> std::path::PathBuf {
    let unit = root.join("units/plasma");
    fs::create_dir_all(&unit).unwrap();
    fs::write(
        unit.join("stage.toml"),
        r#"
identity = "plasma"
description = "plasma with two auxiliary targets"
prelude = "common.metal"

[[stages]]
kind = "vertex"
body = "VertexOut out;\nreturn out;"

[[stages]]
kind = "fragment"
targets = 2
source = "plasma.frag.metal"

[[stages]]
kind = "initialize"
body = "setTex(0, \"london\");"
"#,
    )
    .unwrap();
    fs::write(
        unit.join("common.metal"),
        "struct KBuffer {\n  string textures[4];\n};\n",
    )
    .unwrap();
    fs::write(
        unit.join("plasma.frag.metal"),
        "FragmentOutput2 out;\nout.fragColor = float4(1);\nreturn out;\n",
    )
    .unwrap();
    unit
}

fn write_anonymous(root: &Path) -> std::path::PathBuf {
    let unit = root.join("units/warp-speed");
    fs::create_dir_all(&unit).unwrap();
    fs::write(
        unit.join("stage.toml"),
        "[[stages]]\nkind = \"compute\"\nbody = \"computeBuffer = float4(uni.iTime);\"\n",
    )
    .unwrap();
    unit
}

fn stagegen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stagegen"))
        .env_remove("STAGEGEN_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run stagegen")
}

#[test]
fn generate_writes_header_sources_and_dispatch_table() {
    let root = TempDir::new().unwrap();
    let unit = write_plasma(root.path());
    let config = root.path().join("stagegen.toml");
    fs::write(
        &config,
        "version = 1\n\n[[passes]]\nshader = \"plasma\"\nrender_targets = 2\n",
    )
    .unwrap();
    let out = root.path().join("build");

    let output = stagegen(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        unit.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let header = fs::read_to_string(out.join("stagegen_common.h")).unwrap();
    assert!(header.contains("#define STAGEGEN_REGISTRY_VERSION 1"));

    let source = fs::read_to_string(out.join("plasma.metal")).unwrap();
    assert!(source.contains("fragment FragmentOutput2 plasma___Fragment2("));
    assert!(source.contains("kernel void plasma___InitializeOptions("));
    assert!(source.contains("typedef FragmentOutput2 FragmentOutput;"));

    let dispatch: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("dispatch.json")).unwrap()).unwrap();
    assert_eq!(dispatch["registry_version"], 1);
    assert_eq!(
        dispatch["units"][0]["initializer"],
        "plasma___InitializeOptions"
    );
    assert_eq!(dispatch["units"][0]["entries"][1]["render_targets"], 2);
}

#[test]
fn missing_identity_requires_explicit_opt_in() {
    let root = TempDir::new().unwrap();
    let unit = write_anonymous(root.path());
    let out = root.path().join("build");

    let failed = stagegen(&[
        "generate",
        "--out",
        out.to_str().unwrap(),
        unit.to_str().unwrap(),
    ]);
    assert!(!failed.status.success());
    assert!(String::from_utf8_lossy(&failed.stderr).contains("has no identity"));
    assert!(!out.exists());

    let derived = stagegen(&[
        "generate",
        "--identity-from-path",
        "--out",
        out.to_str().unwrap(),
        unit.to_str().unwrap(),
    ]);
    assert!(derived.status.success());
    let source = fs::read_to_string(out.join("warp_speed.metal")).unwrap();
    assert!(source.contains("kernel void warp_speed___Kernel("));
}

#[test]
fn render_target_mismatch_fails_without_writing() {
    let root = TempDir::new().unwrap();
    let unit = write_plasma(root.path());
    let config = root.path().join("stagegen.toml");
    fs::write(
        &config,
        "version = 1\n\n[[passes]]\nshader = \"plasma\"\nrender_targets = 3\n",
    )
    .unwrap();
    let out = root.path().join("build");

    let output = stagegen(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        unit.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("writes 2 render targets"), "stderr: {stderr}");
    assert!(!out.join("dispatch.json").exists());
}

#[test]
fn prelude_and_inspect_commands() {
    let root = TempDir::new().unwrap();
    let unit = write_plasma(root.path());
    let header = root.path().join("include/common.h");

    let output = stagegen(&["prelude", "--out", header.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(fs::read_to_string(&header)
        .unwrap()
        .contains("constant int stateSlot = 3;"));

    let output = stagegen(&[
        "inspect",
        unit.to_str().unwrap(),
        "--stage",
        "fragment",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("plasma___Fragment2"));
    assert!(stdout.contains("texture(10..12)"));
    assert!(!stdout.contains("texture(10..14)"));
    assert!(!stdout.contains("plasma___Vertex"));
}
