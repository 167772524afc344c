//! CLI 集成测试
//!
//! 使用 assert_cmd 运行 zdxf 二进制

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PROJECT: &str = r#"{
    "name": "katastr",
    "crs": "EPSG:5514",
    "layers": [
        {
            "id": "p1", "name": "parcels", "kind": "vector",
            "features": [
                {
                    "type": "Line",
                    "start": [-744100.0, -1043200.0],
                    "end": [-743900.0, -1043000.0]
                },
                {
                    "type": "Polyline",
                    "vertices": [
                        [-744050.0, -1043150.0],
                        [-744000.0, -1043150.0],
                        [-744000.0, -1043100.0]
                    ],
                    "closed": true
                }
            ]
        },
        {
            "id": "o1", "name": "ortho", "kind": "raster",
            "extent": {
                "min_x": -745000.0, "min_y": -1044000.0,
                "max_x": -743000.0, "max_y": -1042000.0
            }
        },
        {
            "id": "r1", "name": "roads", "kind": "vector", "visible": false,
            "features": [
                { "type": "Point", "position": [-744000.0, -1043000.0] }
            ]
        }
    ]
}"#;

/// 创建带项目快照的临时目录
fn create_test_env() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("project.json"), PROJECT).unwrap();
    dir
}

fn zdxf(dir: &Path) -> Command {
    let mut command = Command::cargo_bin("zdxf").unwrap();
    command.current_dir(dir).env_remove("ZDXF_CONFIG").env_remove("ZDXF_LOG_LEVEL");
    command
}

/// `$INSUNITS` 记录的值
fn units_value(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .windows(3)
        .find(|w| w[0].trim() == "$INSUNITS" && w[1].trim() == "70")
        .map(|w| w[2].trim().to_string())
}

mod export_command {
    use super::*;

    #[test]
    fn test_export_visible_layers() {
        let env = create_test_env();

        zdxf(env.path())
            .args(["export", "--project", "project.json", "--output", "out/plan"])
            .assert()
            .success()
            .stdout(predicate::str::contains("plan.dxf"));

        let text = fs::read_to_string(env.path().join("out/plan.dxf")).unwrap();
        assert!(text.contains("AC1021"));
        assert!(!text.contains("AC1015"));
        assert_eq!(units_value(&text).as_deref(), Some("6"));
    }

    #[test]
    fn test_export_named_hidden_layer() {
        let env = create_test_env();

        zdxf(env.path())
            .args(["export", "-p", "project.json", "-o", "roads.dxf", "--layer", "roads"])
            .assert()
            .success();

        assert!(env.path().join("roads.dxf").exists());
        assert!(!env.path().join("roads.dxf.dxf").exists());
    }

    #[test]
    fn test_export_unknown_layer_fails() {
        let env = create_test_env();

        zdxf(env.path())
            .args(["export", "-p", "project.json", "-o", "plan", "--layer", "missing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No layers selected"));

        assert!(!env.path().join("plan.dxf").exists());
    }

    #[test]
    fn test_export_raster_only_fails() {
        let env = create_test_env();

        zdxf(env.path())
            .args(["export", "-p", "project.json", "-o", "plan", "--layer", "ortho"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No vector layers"));
    }

    #[test]
    fn test_export_uses_config_units() {
        let env = create_test_env();
        fs::write(
            env.path().join("zdxf.toml"),
            "[export]\noutput_dir = \"dist\"\n\n[normalize]\nunits = \"mm\"\n",
        )
        .unwrap();

        zdxf(env.path())
            .args(["export", "-p", "project.json", "-o", "plan"])
            .assert()
            .success();

        let text = fs::read_to_string(env.path().join("dist/plan.dxf")).unwrap();
        assert_eq!(units_value(&text).as_deref(), Some("4"));
    }

    #[test]
    fn test_invalid_config_fails() {
        let env = create_test_env();
        fs::write(env.path().join("zdxf.toml"), "[export]\nscale = 0\n").unwrap();

        zdxf(env.path())
            .args(["export", "-p", "project.json", "-o", "plan"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Scale must be a positive integer"));
    }
}

mod normalize_command {
    use super::*;

    #[test]
    fn test_normalize_in_place() {
        let env = create_test_env();
        let path = env.path().join("legacy.dxf");
        fs::write(&path, "HEADER\n$INSUNITS\n 70\n     0\nENDSEC\n999\nAC1015\n").unwrap();

        zdxf(env.path())
            .args(["normalize", "legacy.dxf"])
            .assert()
            .success();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "HEADER\n$INSUNITS\n 70\n     6\nENDSEC\n999\nAC1021\n"
        );
    }

    #[test]
    fn test_normalize_to_output_with_units() {
        let env = create_test_env();
        let input = "HEADER\nENDSEC\n";
        fs::write(env.path().join("in.dxf"), input).unwrap();

        zdxf(env.path())
            .args(["normalize", "in.dxf", "--output", "out.dxf", "--units", "miles"])
            .assert()
            .success();

        assert_eq!(fs::read_to_string(env.path().join("in.dxf")).unwrap(), input);
        assert_eq!(
            fs::read_to_string(env.path().join("out.dxf")).unwrap(),
            "HEADER\n$INSUNITS\n 70\n     3\nENDSEC\n"
        );
    }

    #[test]
    fn test_normalize_malformed_left_untouched() {
        let env = create_test_env();
        let path = env.path().join("broken.dxf");
        fs::write(&path, "999\nAC1015\n").unwrap();

        zdxf(env.path())
            .args(["normalize", "broken.dxf"])
            .assert()
            .success()
            .stderr(predicate::str::contains("HEADER"));

        assert_eq!(fs::read_to_string(&path).unwrap(), "999\nAC1015\n");
    }

    #[test]
    fn test_normalize_unknown_units_fails() {
        let env = create_test_env();
        fs::write(env.path().join("in.dxf"), "HEADER\nENDSEC\n").unwrap();

        zdxf(env.path())
            .args(["normalize", "in.dxf", "--units", "furlongs"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown drawing units"));
    }
}

mod layers_command {
    use super::*;

    #[test]
    fn test_list_layers() {
        let env = create_test_env();

        zdxf(env.path())
            .args(["layers", "--project", "project.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Project: katastr"))
            .stdout(predicate::str::contains("CRS: EPSG:5514"))
            .stdout(predicate::str::contains("parcels\tvector\tvisible"))
            .stdout(predicate::str::contains("roads\tvector\thidden"));
    }

    #[test]
    fn test_missing_project_fails() {
        let env = create_test_env();

        zdxf(env.path())
            .args(["layers", "--project", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load project"));
    }
}
