use runledger::config::Config;

// One combined test: env mutation is process-global, so splitting these
// into separate tests would race under the parallel test runner.
#[test]
fn config_loads_from_env_and_reports_missing_vars() {
    unsafe {
        std::env::set_var("DATABASE_URL", "postgres://localhost/runledger");
        std::env::set_var("BACKUP_BUCKET", "runledger-backups");
        std::env::remove_var("LOG_LEVEL");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.backup_bucket, "runledger-backups");
    assert_eq!(config.log_level, "info");

    unsafe {
        std::env::set_var("LOG_LEVEL", "debug");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.log_level, "debug");

    unsafe {
        std::env::remove_var("DATABASE_URL");
    }
    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("DATABASE_URL"));
}
