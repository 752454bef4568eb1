use super::*;

use crate::domain::theme::{RenderProfile, Variant};

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
fn defaults_match_the_stock_deployment() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr, "0.0.0.0:3000".parse().expect("addr"));
    assert!(settings.images.enabled);
    assert_eq!(settings.images.padding_fraction, 0.1);
    assert_eq!(settings.theme, Theme::default());
    assert_eq!(settings.fonts.directory, PathBuf::from("fonts"));
    assert_eq!(settings.reasons.path, PathBuf::from("reasons.json"));
    assert_eq!(settings.static_files.directory, PathBuf::from("public"));
    assert_eq!(settings.rate_limit.window_seconds.get(), 60);
    assert_eq!(settings.rate_limit.max_requests.get(), 120);
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
fn malformed_colors_are_rejected() {
    for bad in ["#12345", "red", "#GGGGGG", "f0f0f0", "#f0f0f0f"] {
        let mut raw = RawSettings::default();
        raw.theme.background_color = Some(bad.to_string());
        let err = Settings::from_raw(raw).expect_err(bad);
        assert!(
            matches!(err, LoadError::Invalid { key: "theme.background_color", .. }),
            "{bad}: {err}"
        );
    }
}

#[test]
fn colors_accept_either_case() {
    let mut raw = RawSettings::default();
    raw.theme.background_color = Some("#FFD1DC".to_string());
    raw.theme.text_color = Some("#00ff7f".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.theme.background, HexColor::rgb(0xff, 0xd1, 0xdc));
    assert_eq!(settings.theme.text, HexColor::rgb(0x00, 0xff, 0x7f));
}

#[test]
fn font_family_quotes_are_stripped() {
    let mut raw = RawSettings::default();
    raw.theme.font_family = Some("\"Comic Neue Bold\"".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.theme.font_family, "Comic Neue Bold");

    let mut raw = RawSettings::default();
    raw.theme.font_family = Some("\"\"".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.theme.font_family, GENERIC_SANS_SERIF);
}

#[test]
fn padding_fraction_is_range_checked() {
    for bad in [-0.1_f32, 0.5, 0.75] {
        let mut raw = RawSettings::default();
        raw.images.padding_fraction = Some(bad);
        assert!(Settings::from_raw(raw).is_err(), "{bad} should be rejected");
    }

    let mut raw = RawSettings::default();
    raw.images.padding_fraction = Some(0.0);
    assert!(Settings::from_raw(raw).is_ok());
}

#[test]
fn zero_rate_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.rate_limit.max_requests = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "rate_limit.max_requests",
            ..
        })
    ));
}

#[test]
fn legacy_env_names_are_honoured() {
    let mut raw = RawSettings::default();
    raw.apply_legacy_env(|key| match key {
        "PORT" => Some("3005".to_string()),
        "ENABLE_IMAGES" => Some("false".to_string()),
        "IMG_BG_COLOR" => Some("#000000".to_string()),
        "IMG_TEXT_COLOR" => Some("#ffffff".to_string()),
        "IMG_FONT_FAMILY" => Some("\"Cami Rae\"".to_string()),
        _ => None,
    })
    .expect("legacy env");

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.server.addr.port(), 3005);
    assert!(!settings.images.enabled);
    assert_eq!(settings.theme.background, HexColor::rgb(0, 0, 0));
    assert_eq!(settings.theme.text, HexColor::rgb(0xff, 0xff, 0xff));
    assert_eq!(settings.theme.font_family, "Cami Rae");
}

#[test]
fn legacy_port_must_be_numeric() {
    let mut raw = RawSettings::default();
    let err = raw
        .apply_legacy_env(|key| (key == "PORT").then(|| "three thousand".to_string()))
        .expect_err("non-numeric port");
    assert!(matches!(err, LoadError::Invalid { key: "PORT", .. }));
}

#[test]
fn cli_beats_legacy_env() {
    let mut raw = RawSettings::default();
    raw.apply_legacy_env(|key| (key == "ENABLE_IMAGES").then(|| "true".to_string()))
        .expect("legacy env");
    raw.apply_serve_overrides(&ServeOverrides {
        images_enabled: Some(false),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.images.enabled);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["naas"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "naas",
        "serve",
        "--server-host",
        "127.0.0.1",
        "--images-enabled",
        "no",
        "--theme-background",
        "#ffd1dc",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("127.0.0.1"));
            assert_eq!(serve.overrides.images_enabled, Some(false));
            assert_eq!(
                serve.overrides.theme.background_color.as_deref(),
                Some("#ffd1dc")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "naas",
        "render",
        "--variant",
        "m",
        "--style",
        "plain",
        "--text",
        "Nope.",
        "/tmp/card.png",
    ]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.variant, Variant::Medium);
            assert_eq!(render.style, RenderProfile::Plain);
            assert_eq!(render.text.as_deref(), Some("Nope."));
            assert_eq!(render.output, std::path::Path::new("/tmp/card.png"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn render_overrides_apply_theme() {
    let args = CliArgs::parse_from([
        "naas",
        "render",
        "--theme-font-family",
        "Cami Rae",
        "--fonts-directory",
        "/srv/fonts",
        "out.png",
    ]);
    let Some(Command::Render(render)) = args.command else {
        panic!("wrong command parsed");
    };

    let mut raw = RawSettings::default();
    raw.apply_render_overrides(&render);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(render.variant, Variant::Full);
    assert_eq!(settings.theme.font_family, "Cami Rae");
    assert_eq!(settings.fonts.directory, PathBuf::from("/srv/fonts"));
}
