use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;

fn bin_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("swiftloc").expect("swiftloc built");
    cmd.current_dir(root);
    cmd.env_remove("OPENAI_API_KEY");
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_rel(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, content).unwrap();
}

const PBX: &str = concat!(
    "// !$*UTF8*$!\n",
    "\t\t\tknownRegions = (\n",
    "\t\t\t\ten,\n",
    "\t\t\t\tBase,\n",
    "\t\t\t);\n",
    "INFOPLIST_KEY_NSLocationAlwaysAndWhenInUseUsageDescription = \"Always access.\";\n",
    "INFOPLIST_KEY_NSLocationWhenInUseUsageDescription = \"Shows local weather.\";\n",
);

fn scaffold_project(root: &Path) {
    write_rel(root, "Weather.xcodeproj/project.pbxproj", PBX);
    write_rel(
        root,
        "Weather/ContentView.swift",
        "Text(\"Add City\")\nButton(\"Cancel\") {}\n",
    );
    write_rel(root, "WeatherWidget/Widget.swift", "Text(\"Weather\")\n");
}

#[test]
fn scan_writes_candidates_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());

    bin_cmd(tmp.path())
        .args(["scan", "--lang", "es"])
        .assert()
        .success();

    let artifact = tmp.path().join("localization/es/translation_candidates.json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(value["schemaVersion"], 1);
    assert_eq!(value["targetLanguage"], "es");
    let sources: Vec<&str> = value["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["source"].as_str().unwrap())
        .collect();
    assert!(sources.contains(&"Add City"));
    assert!(sources.contains(&"Weather"));
    assert!(sources.contains(&"Shows local weather."));
}

#[test]
fn scan_can_emit_csv() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());

    bin_cmd(tmp.path())
        .args(["scan", "--lang", "es", "--out-csv", "candidates.csv"])
        .assert()
        .success();

    let csv = fs::read_to_string(tmp.path().join("candidates.csv")).unwrap();
    assert!(csv.starts_with("source,file,line,kind,target\n"));
    assert!(csv.contains("Add City,Weather/ContentView.swift,1,Text,app"));
}

#[test]
fn scan_app_only_excludes_widget_sources() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());

    bin_cmd(tmp.path())
        .args(["scan", "--lang", "es", "--targets", "app"])
        .assert()
        .success();

    let artifact = tmp.path().join("localization/es/translation_candidates.json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(value["includeTargets"], serde_json::json!(["app"]));
    let sources: Vec<&str> = value["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["source"].as_str().unwrap())
        .collect();
    assert!(!sources.contains(&"Weather"));
}

#[test]
fn unknown_target_group_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());

    bin_cmd(tmp.path())
        .args(["scan", "--lang", "es", "--targets", "watch"])
        .assert()
        .code(2);
}

#[test]
fn onboard_dry_run_needs_no_api_key_and_mutates_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());
    let pbx_before =
        fs::read_to_string(tmp.path().join("Weather.xcodeproj/project.pbxproj")).unwrap();

    bin_cmd(tmp.path())
        .args(["onboard", "--lang", "es", "--dry-run"])
        .assert()
        .success();

    assert!(tmp
        .path()
        .join("localization/es/translation_candidates.json")
        .is_file());
    assert!(!tmp
        .path()
        .join("localization/es/translation_results.json")
        .exists());
    assert!(!tmp.path().join("Weather/Localizable.xcstrings").exists());
    let pbx_after =
        fs::read_to_string(tmp.path().join("Weather.xcodeproj/project.pbxproj")).unwrap();
    assert_eq!(pbx_before, pbx_after);
}

#[test]
fn onboard_without_api_key_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());

    bin_cmd(tmp.path())
        .args(["onboard", "--lang", "es"])
        .assert()
        .code(2);
}

#[test]
fn onboard_fails_fast_on_missing_permission_key() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());
    // Drop one of the two required usage descriptions.
    write_rel(
        tmp.path(),
        "Weather.xcodeproj/project.pbxproj",
        concat!(
            "knownRegions = (\nen,\n);\n",
            "INFOPLIST_KEY_NSLocationWhenInUseUsageDescription = \"Shows local weather.\";\n",
        ),
    );

    let output = bin_cmd(tmp.path())
        .args(["onboard", "--lang", "es", "--dry-run"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NSLocationAlwaysAndWhenInUseUsageDescription"));
}

#[test]
fn check_reports_spanish_literals_with_exit_one() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());
    write_rel(
        tmp.path(),
        "Weather/SearchView.swift",
        "Text(\"Agregar ciudad\")\nText(\"Add City\")\n",
    );

    let output = bin_cmd(tmp.path()).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Agregar ciudad"));
    assert!(stdout.contains("Weather/SearchView.swift:1"));
    assert!(!stdout.contains("Add City"));
}

#[test]
fn check_passes_on_clean_project() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());

    bin_cmd(tmp.path()).arg("check").assert().success();
}

#[test]
fn config_file_supplies_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold_project(tmp.path());
    write_rel(
        tmp.path(),
        "swiftloc.toml",
        "target_lang = \"pt-BR\"\ninclude_targets = [\"app\"]\n",
    );

    bin_cmd(tmp.path()).arg("scan").assert().success();

    let artifact = tmp
        .path()
        .join("localization/pt-BR/translation_candidates.json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(value["targetLanguage"], "pt-BR");
    assert_eq!(value["includeTargets"], serde_json::json!(["app"]));
}
