//! End-to-end tests for settings resolution, fragment configs and the
//! composed core services.

mod common;

use alcis::domain::errors::{AuthenticationKind, ErrorKind};
use alcis::{ConfigManager, CoreServices, FragmentNamespace, SettingsResolver};
use common::{read_lines, temp_project, with_settings_env, write_file};
use serde_json::json;
use std::io;
use std::sync::Arc;

#[test]
fn test_secrets_from_environment() {
    let project = temp_project();

    let settings = with_settings_env(&[("SECRET_KEY", "abc"), ("ENCRYPTION_KEY", "def")], || {
        SettingsResolver::new(project.path()).resolve().unwrap()
    });

    assert_eq!(settings.security.secret_key, "abc");
    assert_eq!(settings.security.encryption_key, "def");
    assert_eq!(settings.data_dir, project.path().join("data"));
    assert_eq!(settings.logs_dir, project.path().join("logs"));
}

#[test]
fn test_layer_precedence_yaml_dotenv_environment() {
    let project = temp_project();
    write_file(
        project.path(),
        "config/settings.yaml",
        "environment: staging\ndatabase:\n  pool_size: 15\nai:\n  max_reasoning_steps: 4\n",
    );
    write_file(
        project.path(),
        ".env",
        "DATABASE_POOL_SIZE=25\nAI_MODEL_NAME=from-dotenv\n",
    );

    let settings = with_settings_env(&[("AI_MODEL_NAME", "from-env")], || {
        SettingsResolver::new(project.path()).resolve().unwrap()
    });

    assert_eq!(settings.environment, "staging");
    assert_eq!(settings.ai.max_reasoning_steps, 4);
    assert_eq!(settings.database.pool_size, 25);
    assert_eq!(settings.ai.model_name, "from-env");
    assert_eq!(settings.database.max_overflow, 20);
}

#[test]
fn test_missing_secrets_detected_outside_development() {
    let project = temp_project();

    let settings = with_settings_env(&[("ENVIRONMENT", "production")], || {
        SettingsResolver::new(project.path()).resolve().unwrap()
    });

    let error = settings.check_required_secrets().unwrap_err();
    assert!(error.kind().is_configuration());
    assert_eq!(error.error_code(), Some("INVALID_CONFIGURATION"));
}

#[test]
fn test_manager_validate_end_to_end() {
    let project = temp_project();

    let settings = with_settings_env(&[("SECRET_KEY", "abc"), ("ENCRYPTION_KEY", "def")], || {
        SettingsResolver::new(project.path()).resolve().unwrap()
    });
    let manager = ConfigManager::new(Arc::new(settings));
    assert!(!manager.validate(), "directories do not exist yet");

    manager.bootstrap_directories().unwrap();
    assert!(manager.validate());

    let without_secret = with_settings_env(&[("ENCRYPTION_KEY", "def")], || {
        SettingsResolver::new(project.path()).resolve().unwrap()
    });
    assert!(!ConfigManager::new(Arc::new(without_secret)).validate());
}

#[test]
fn test_fragments_survive_malformed_neighbours_and_reload() {
    let project = temp_project();
    write_file(project.path(), "config/platforms/linkedin.yaml", "name: LinkedIn\nmax_daily_actions: 50\n");
    write_file(project.path(), "config/platforms/broken.yaml", "name: [\n");
    write_file(project.path(), "config/policies/default.json", r#"{"allow_posting": false}"#);

    let settings = with_settings_env(&[], || {
        SettingsResolver::new(project.path()).resolve().unwrap()
    });
    let manager = ConfigManager::new(Arc::new(settings));

    assert_eq!(manager.get_all_platforms().len(), 1);
    assert_eq!(manager.get_platform_config("linkedin").unwrap()["max_daily_actions"], 50);
    assert!(manager.get_platform_config("broken").is_none());
    assert_eq!(manager.get_policy_config("default").unwrap()["allow_posting"], false);

    write_file(project.path(), "config/platforms/broken.yaml", "name: Fixed\n");
    let report = manager.reload_configs();

    assert!(report.skipped.is_empty());
    assert_eq!(
        manager.fragments().names(FragmentNamespace::Platform),
        vec!["broken", "linkedin"]
    );
}

#[test]
fn test_core_services_compose_and_log() {
    let project = temp_project();

    let core = with_settings_env(
        &[("SECRET_KEY", "abc"), ("ENCRYPTION_KEY", "def"), ("DEBUG", "false")],
        || CoreServices::initialize(project.path()).unwrap(),
    );
    let logs = project.path().join("logs");

    assert!(core.config.validate());
    assert!(!core.settings.debug);

    core.audit.record_security_event("brute_force", "warning", "10 failed logins", Default::default());
    let classified = core.classify(
        io::Error::new(io::ErrorKind::PermissionDenied, "cookie jar").into(),
        Some([("user".to_string(), json!("bob"))].into_iter().collect()),
    );

    assert_eq!(
        classified.kind(),
        ErrorKind::Authentication(AuthenticationKind::UnauthorizedAccess)
    );
    assert_eq!(classified.details()["user"], "bob");

    let security = read_lines(&logs.join("security.log"));
    assert_eq!(security.len(), 1);
    assert!(security[0].contains(" - security - WARNING - "));

    let errors = read_lines(&logs.join("errors.log"));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("PERMISSION_DENIED"));

    let audit = read_lines(&logs.join("security_audit.jsonl"));
    assert_eq!(audit.len(), 1);
    let record: serde_json::Value = serde_json::from_str(&audit[0]).unwrap();
    assert_eq!(record["event"], "security_event");
    assert_eq!(record["level"], "warning");
}

#[test]
fn test_log_file_path_overrides_main_channel() {
    let project = temp_project();

    let core = with_settings_env(
        &[("LOG_FILE_PATH", "var/main.log"), ("DEBUG", "false")],
        || CoreServices::initialize(project.path()).unwrap(),
    );
    core.channel("main").info("hello");

    let lines = read_lines(&project.path().join("var/main.log"));
    assert!(lines.iter().any(|line| line.ends_with(" - main - INFO - hello")));
    assert!(!project.path().join("logs/alcis.log").exists());
}

#[test]
fn test_one_bad_variable_keeps_the_rest_of_the_settings() {
    let project = temp_project();

    let core = with_settings_env(
        &[
            ("SECRET_KEY", "0123456789"),
            ("ENCRYPTION_KEY", "def"),
            ("DATABASE_POOL_SIZE", "lots"),
            ("AI_MODEL_NAME", "2024"),
            ("DEBUG", "false"),
        ],
        || CoreServices::initialize(project.path()).unwrap(),
    );

    assert_eq!(core.settings.security.secret_key, "0123456789");
    assert_eq!(core.settings.ai.model_name, "2024");
    assert_eq!(core.settings.database.pool_size, 10);
    assert!(core.config.validate());
}
