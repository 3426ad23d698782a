use approx::assert_relative_eq;
use assert_cmd::Command;
use piclayer::{CalibrationReport, WorldFile};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const WORLD: &str = "\
0.25
0.01
-0.02
-0.25
499875.125
5500124.875
";

fn piclayer() -> Command {
    Command::cargo_bin("piclayer").expect("binary built")
}

fn write_world(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("map.jgw");
    fs::write(&path, WORLD).expect("write world file");
    path
}

#[test]
fn world_file_survives_cal_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = write_world(dir.path());
    let cal = dir.path().join("map.jpg.cal");
    let back = dir.path().join("back.jgw");

    piclayer()
        .args(["world-to-cal", "--width", "1000", "--height", "1000", "-o"])
        .arg(&cal)
        .arg(&world)
        .assert()
        .success();

    let text = fs::read_to_string(&cal).expect("cal written");
    assert!(text.starts_with("#PicLayer plugin calibration file"));
    assert!(text.contains("INITIAL_SCALE=1.0"));

    piclayer()
        .args(["cal-to-world", "--width", "1000", "--height", "1000", "-o"])
        .arg(&back)
        .arg(&cal)
        .assert()
        .success();

    let original = WorldFile::parse(WORLD).expect("parse");
    let restored = WorldFile::read_from(fs::File::open(&back).expect("open")).expect("parse");
    for (a, b) in original.values().into_iter().zip(restored.values()) {
        assert_relative_eq!(a, b, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn cal_to_world_prints_to_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cal = dir.path().join("plain.cal");
    fs::write(&cal, "POSITION_X=0.0\nPOSITION_Y=0.0\nINITIAL_SCALE=100.0\n").expect("write cal");

    let assert = piclayer()
        .args(["cal-to-world", "--width", "2", "--height", "2"])
        .arg(&cal)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let wf = WorldFile::parse(&stdout).expect("world file on stdout");
    // 100 m per 100 px at the equator is one unit per pixel
    assert_relative_eq!(wf.sx, 1.0, max_relative = 1e-6);
    assert_relative_eq!(wf.sy, -1.0, max_relative = 1e-6);
    assert_relative_eq!(wf.dx, -1.0, max_relative = 1e-6);
    assert_relative_eq!(wf.dy, 1.0, max_relative = 1e-6);
}

#[test]
fn inspect_json_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cal = dir.path().join("legacy.cal");
    fs::write(
        &cal,
        "POSITION_X=1000\nPOSITION_Y=2000\nINITIAL_SCALE=10\nANGLE=0\nSCALEX=2\nSCALEY=2\n",
    )
    .expect("write cal");

    let assert = piclayer()
        .args(["inspect", "--width", "100", "--height", "50", "--format", "json"])
        .arg(&cal)
        .assert()
        .success();
    let report: CalibrationReport =
        serde_json::from_slice(&assert.get_output().stdout).expect("json report");
    assert_eq!(report.projection, "EPSG:3857");
    assert_eq!(report.image_size.width, 100);
    assert_eq!(report.calibration.transform.m00, 2.0);
    assert_eq!(report.calibration.initial_scale, 10.0);
    assert!(report.bounding_box.is_some());
}

#[test]
fn inspect_geographic_has_no_bounding_box() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cal = dir.path().join("geo.cal");
    fs::write(&cal, "POSITION_X=8.5\nPOSITION_Y=47.3\nINITIAL_SCALE=10\n").expect("write cal");

    piclayer()
        .args(["inspect", "--width", "10", "--height", "10", "--projection", "epsg:4326"])
        .arg(&cal)
        .assert()
        .success()
        .stdout(predicate::str::contains("projection     EPSG:4326"))
        .stdout(predicate::str::contains("not supported"));
}

#[test]
fn unknown_projection_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = write_world(dir.path());

    piclayer()
        .args(["world-to-cal", "--width", "10", "--height", "10", "--projection", "EPSG:2056"])
        .arg(&world)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown projection code \"EPSG:2056\""));
}

#[test]
fn short_world_file_reports_missing_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = dir.path().join("short.wld");
    fs::write(&world, "1\n0\n0\n-1\n").expect("write");

    piclayer()
        .args(["world-to-cal", "--width", "10", "--height", "10"])
        .arg(&world)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load"))
        .stderr(predicate::str::contains("unable to read line 5"));
}

#[test]
fn missing_input_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    piclayer()
        .args(["cal-to-world", "--width", "10", "--height", "10"])
        .arg(dir.path().join("absent.cal"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open"));
}
