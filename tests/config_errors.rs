// tests/config_errors.rs

use std::error::Error;
use std::fs;

use assetflow::config::{load_and_validate, Severity};
use assetflow::errors::AssetflowError;
use assetflow::types::TriggerWhileRunningBehaviour;
use assetflow_test_utils::builders::ConfigFileBuilder;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn unknown_lint_rule_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_style_rule("no-color-literals", Severity::Error)
        .try_build()
        .unwrap_err();
    match err {
        AssetflowError::ConfigError(msg) => assert!(msg.contains("no-color-literals"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn ordering_cycle_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_script_after("libs/a.js", "libs/b.js")
        .with_script_after("libs/b.js", "libs/a.js")
        .try_build()
        .unwrap_err();
    match err {
        AssetflowError::ManifestCycle(msg) => assert!(msg.starts_with("[scripts.after]"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn entry_declared_before_another_file_is_a_cycle() {
    let err = ConfigFileBuilder::new()
        .with_script_after("libs/a.js", "app.js")
        .try_build()
        .unwrap_err();
    assert!(matches!(err, AssetflowError::ManifestCycle(_)));
}

#[test]
fn zero_queue_length_is_rejected() {
    let err = ConfigFileBuilder::new().with_queue_length(0).try_build().unwrap_err();
    assert!(matches!(err, AssetflowError::ConfigError(_)));
}

#[test]
fn missing_file_means_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = load_and_validate(dir.path().join("Assetflow.toml"))?;

    assert_eq!(cfg.config.queue_length, 1);
    assert_eq!(
        cfg.config.triggered_while_running_behaviour,
        TriggerWhileRunningBehaviour::Queue
    );
    assert_eq!(cfg.scripts.entry, "app.js");
    assert_eq!(cfg.styles.rtl_suffix, "-rtl");
    assert_eq!(cfg.server.port, 3000);
    Ok(())
}

#[test]
fn toml_file_overrides_sections() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Assetflow.toml");
    fs::write(
        &path,
        r#"
[config]
triggered_while_running_behaviour = "parallel"
queue_length = 2

[scripts]
entry = "main.js"
target = "es2017"

[scripts.after]
"libs/02.plugins.js" = ["libs/01.jquery.js"]

[lint.styles.rules]
no-ids = "warning"

[server]
port = 8080
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(
        cfg.config.triggered_while_running_behaviour,
        TriggerWhileRunningBehaviour::Parallel
    );
    assert_eq!(cfg.config.queue_length, 2);
    assert_eq!(cfg.scripts.entry, "main.js");
    assert_eq!(cfg.scripts.after["libs/02.plugins.js"], vec!["libs/01.jquery.js"]);
    assert_eq!(cfg.lint.styles.rules.len(), 1);
    assert_eq!(cfg.lint.styles.rules["no-ids"], Severity::Warning);
    assert_eq!(cfg.server.port, 8080);
    Ok(())
}

#[test]
fn unknown_sections_and_bad_targets_fail() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Assetflow.toml");

    fs::write(&path, "[task.build]\ncmd = \"make\"\n")?;
    assert!(matches!(
        load_and_validate(&path),
        Err(AssetflowError::TomlError(_))
    ));

    fs::write(&path, "[scripts]\ntarget = \"es1999\"\n")?;
    assert!(matches!(
        load_and_validate(&path),
        Err(AssetflowError::ConfigError(_))
    ));
    Ok(())
}
