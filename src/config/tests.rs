use clap::Parser;
use uuid::Uuid;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.database.url = Some("postgres://from-file".to_string());

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        database_url: Some("postgres://from-cli".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(
        settings.database.url.as_deref(),
        Some("postgres://from-cli")
    );
}

#[test]
fn defaults_enable_cache_and_follows() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.capacity.get(), DEFAULT_CACHE_CAPACITY);
    assert!(settings.timeline.follows_enabled);
    assert_eq!(settings.media.root, PathBuf::from(DEFAULT_MEDIA_ROOT));
    assert_eq!(
        settings.database.max_connections.get(),
        DEFAULT_DB_MAX_CONNECTIONS
    );
    assert!(settings.database.url.is_none());
}

#[test]
fn blank_database_url_is_treated_as_unset() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_cache_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.capacity = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero capacity");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.capacity",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn follows_can_be_disabled_from_cli() {
    let args = CliArgs::parse_from([
        "feedline",
        "--follows-enabled",
        "false",
        "migrate",
    ]);

    let mut raw = RawSettings::default();
    raw.apply_overrides(&args.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(!settings.timeline.follows_enabled);
    assert!(matches!(args.command, Command::Migrate));
}

#[test]
fn parse_timeline_arguments() {
    let user = Uuid::new_v4();
    let args = CliArgs::parse_from([
        "feedline",
        "timeline",
        "--user",
        user.to_string().as_str(),
        "--max-age-days",
        "7",
        "--database-url",
        "postgres://example",
    ]);

    assert_eq!(
        args.overrides.database_url.as_deref(),
        Some("postgres://example")
    );
    match args.command {
        Command::Timeline(timeline) => {
            assert_eq!(timeline.user, user);
            assert_eq!(timeline.max_age_days, Some(7));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_comments_filter() {
    let post = Uuid::new_v4();
    let args = CliArgs::parse_from([
        "feedline",
        "comments",
        "--post",
        post.to_string().as_str(),
        "--filter",
        "disapproved",
    ]);

    match args.command {
        Command::Comments(comments) => {
            assert_eq!(comments.post, post);
            assert_eq!(comments.filter, CommentFilterArg::Disapproved);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn comments_filter_defaults_to_all() {
    let post = Uuid::nil().to_string();
    let args = CliArgs::parse_from(["feedline", "comments", "--post", post.as_str()]);

    match args.command {
        Command::Comments(comments) => assert_eq!(comments.filter, CommentFilterArg::All),
        _ => panic!("wrong command parsed"),
    }
}
