use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.cache.ttl_minutes.get(), 60);
    assert_eq!(settings.scheduler.schedule, "0 0 * * * *");
    assert_eq!(settings.site.base_url, "http://localhost:3000");
    assert!(settings.site.tagging_enabled);
    assert!(settings.llms.enabled);
    assert!(settings.llms.allow_indexing);
    assert_eq!(settings.llms.latest_topics_count, 20);
    assert_eq!(settings.llms.posts_limit, PostsLimit::Medium);
    assert_eq!(settings.llms.min_views, 0);
    assert!(settings.llms.include_excerpts);
    assert_eq!(settings.llms.excerpt_length.get(), 500);
    assert!(settings.llms.webhook_secret.is_none());
    assert!(settings.database.url.is_none());
    assert!(settings.database.export_path.is_none());
}

#[test]
fn base_url_loses_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("https://forum.example.com/".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.base_url, "https://forum.example.com");
}

#[test]
fn base_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("ftp://forum.example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp is rejected");
    assert!(matches!(err, LoadError::Invalid { key: "site.base_url", .. }));
}

#[test]
fn unknown_posts_limit_falls_back_to_medium() {
    let mut raw = RawSettings::default();
    raw.llms.posts_limit = Some("enormous".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.llms.posts_limit, PostsLimit::Medium);
}

#[test]
fn invalid_schedule_is_rejected() {
    let mut raw = RawSettings::default();
    raw.scheduler.schedule = Some("every hour".to_string());

    let err = Settings::from_raw(raw).expect_err("schedule must parse");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "scheduler.schedule",
            ..
        }
    ));
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_minutes = Some(0);

    let err = Settings::from_raw(raw).expect_err("ttl must be positive");
    assert!(matches!(err, LoadError::Invalid { key: "cache.ttl_minutes", .. }));
}

#[test]
fn database_and_export_are_exclusive() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://forum".to_string());
    raw.database.export_path = Some(PathBuf::from("/tmp/forum.json"));

    let err = Settings::from_raw(raw).expect_err("sources are exclusive");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.export_path",
            ..
        }
    ));
}

#[test]
fn blank_webhook_secret_is_ignored() {
    let mut raw = RawSettings::default();
    raw.llms.webhook_secret = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.llms.webhook_secret.is_none());
}

#[test]
fn operator_text_is_kept_verbatim() {
    let mut raw = RawSettings::default();
    raw.llms.intro_text = Some("  Indented intro\n".to_string());
    raw.llms.full_description = Some(" \n\t ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.llms.intro_text, "  Indented intro\n");
    assert_eq!(settings.llms.full_description, "");
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["forum-llms-txt"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "forum-llms-txt",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--llms-allow-indexing=false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.source.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.llms_allow_indexing, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "forum-llms-txt",
        "render",
        "--export",
        "/tmp/forum.json",
        "topic",
        "42",
    ]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.kind, RenderKind::Topic);
            assert_eq!(render.target.as_deref(), Some("42"));
            assert_eq!(
                render.source.export_path.as_deref(),
                Some(std::path::Path::new("/tmp/forum.json"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn render_source_override_applies() {
    let args = CliArgs::parse_from(["forum-llms-txt", "render", "--export", "/tmp/f.json", "navigation"]);
    let mut raw = RawSettings::default();
    if let Some(Command::Render(render)) = args.command.as_ref() {
        raw.apply_source_override(&render.source);
    }

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.database.export_path.as_deref(),
        Some(std::path::Path::new("/tmp/f.json"))
    );
}
