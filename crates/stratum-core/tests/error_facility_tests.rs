use stratum_core::errors::{ExError, ExErrorKind, StratumError};

#[test]
fn test_invalid_name_carries_file() {
    let err = StratumError::InvalidMigrationName {
        file: "abc.sql".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidMigrationName);
    assert_eq!(ex_err.code(), "ERR_INVALID_MIGRATION_NAME");
    assert_eq!(ex_err.file(), Some("abc.sql"));
}

#[test]
fn test_downgrade_is_distinct_from_migration_failure() {
    let downgrade: ExError = StratumError::DowngradeRefused {
        current: 5,
        requested: 3,
    }
    .into();
    let failed: ExError = StratumError::MigrationFailed {
        version: 3,
        reason: "boom".to_string(),
    }
    .into();

    assert_eq!(downgrade.kind(), ExErrorKind::Downgrade);
    assert_eq!(downgrade.version(), Some(5));
    assert_eq!(failed.kind(), ExErrorKind::Migration);
    assert_eq!(failed.version(), Some(3));
    assert_ne!(downgrade.code(), failed.code());
}

#[test]
fn test_asset_not_found_maps_to_not_found() {
    let ex_err: ExError = StratumError::AssetNotFound {
        name: "app.db".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.op(), Some("open_asset"));
}

#[test]
fn test_invalid_config_message_preserved() {
    let ex_err: ExError = StratumError::InvalidConfig {
        reason: "name must not be empty".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::Config);
    assert_eq!(ex_err.message(), "name must not be empty");
}

#[test]
fn test_stratum_error_display() {
    let err = StratumError::MigrationFailed {
        version: 7,
        reason: "constraint failed".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Migration to version 7 failed: constraint failed"
    );
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::InvalidMigrationName, "ERR_INVALID_MIGRATION_NAME"),
        (ExErrorKind::InvalidVersion, "ERR_INVALID_VERSION"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
    }
}
