use memoboard_core::config::BoardConfig;
use memoboard_core::{AppConfig, ConfigError, MemoColor, Preferences, SortKey};
use uuid::Uuid;

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        owner: Some(Uuid::new_v4()),
        board: BoardConfig {
            default_sort: SortKey::CreatedAt,
            default_color: "purple".to_string(),
        },
        ..AppConfig::default()
    };
    config.save(&path).unwrap();

    let loaded = AppConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.board.color().unwrap(), MemoColor::Purple);
    assert_eq!(
        loaded.database_path(),
        dir.path().join("memoboard.sqlite3")
    );
    assert_eq!(
        loaded.preferences_path(),
        dir.path().join("preferences.toml")
    );
}

#[test]
fn missing_config_is_reported_and_defaults_are_available() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        AppConfig::from_file(&path),
        Err(ConfigError::NotFound(_))
    ));
    assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
}

#[test]
fn load_reports_invalid_values_instead_of_defaulting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let owner = Uuid::new_v4();
    let content = format!("owner = \"{owner}\"\n\n[board]\ndefault_sort = \"colour\"\n");
    std::fs::write(&path, &content).unwrap();

    assert!(matches!(
        AppConfig::load(&path),
        Err(ConfigError::Parse { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn malformed_config_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "owner = [not toml").unwrap();

    assert!(matches!(
        AppConfig::from_file(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn explicit_log_dir_overrides_data_dir() {
    let toml = r#"
        data_dir = "/srv/memoboard"

        [log]
        level = "warn"
        dir = "/var/log/memoboard"
    "#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.log.level.as_deref(), Some("warn"));
    assert_eq!(
        config.log_dir(),
        std::path::PathBuf::from("/var/log/memoboard")
    );
}

#[test]
fn preferences_default_when_missing_and_persist_dark_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    assert_eq!(Preferences::load(&path).unwrap(), Preferences::default());

    Preferences { dark_mode: true }.save(&path).unwrap();
    assert!(Preferences::load(&path).unwrap().dark_mode);
}
