use std::{
    fs::File,
    io::{BufWriter, Write},
    net::SocketAddr,
    process,
    sync::Arc,
};

use naas::{
    application::{
        error::AppError,
        reasons::{FixedReason, RandomReasons, ReasonSource},
        render::{RenderRequest, Renderer},
    },
    config::{self, RenderArgs, Settings},
    domain::sanitize::sanitize,
    infra::{
        assets::StaticFiles,
        encode::encode_png,
        error::InfraError,
        fonts::FontRegistry,
        http::{self, HttpState, RateLimiter},
        telemetry,
    },
};
use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let reasons = RandomReasons::from_file(&settings.reasons.path)?;
    info!(
        target = "naas::startup",
        count = reasons.len(),
        path = %settings.reasons.path.display(),
        "reasons loaded"
    );

    let renderer = if settings.images.enabled {
        build_renderer(&settings, load_fonts(&settings))
    } else {
        info!(target = "naas::startup", "image generation disabled");
        build_renderer(&settings, FontRegistry::empty())
    };

    let rate_limiter = RateLimiter::new(
        std::time::Duration::from_secs(settings.rate_limit.window_seconds.get().into()),
        settings.rate_limit.max_requests.get(),
    );
    spawn_rate_limit_pruner(rate_limiter.clone());

    let state = HttpState {
        renderer: Arc::new(renderer),
        reasons: Arc::new(reasons),
        static_files: Arc::new(StaticFiles::new(settings.static_files.directory.clone())),
        rate_limiter,
        images_enabled: settings.images.enabled,
    };
    let router = http::build_router(state);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "naas::startup",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "naas::shutdown", "server stopped");
    Ok(())
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let source: Arc<dyn ReasonSource> = match args.text {
        Some(text) => Arc::new(FixedReason::new(text)),
        None => Arc::new(RandomReasons::from_file(&settings.reasons.path)?),
    };

    let renderer = build_renderer(&settings, load_fonts(&settings));
    let request = RenderRequest::for_variant(args.variant, args.style);
    let text = sanitize(&source.next_reason());
    let output = args.output.clone();

    tokio::task::spawn_blocking(move || -> Result<(), InfraError> {
        let surface = renderer.render(&request, &text);
        let mut writer = BufWriter::new(File::create(&output)?);
        encode_png(&surface, &mut writer)?;
        writer.flush()?;
        Ok(())
    })
    .await
    .map_err(|err| AppError::unexpected(format!("render task failed: {err}")))??;

    info!(
        target = "naas::render",
        path = %args.output.display(),
        variant = args.variant.as_str(),
        style = args.style.as_str(),
        "card written"
    );
    Ok(())
}

fn load_fonts(settings: &Settings) -> FontRegistry {
    let fonts = FontRegistry::scan(&settings.fonts.directory).with_system_fonts();
    info!(
        target = "naas::startup",
        registered = fonts.entries().len(),
        directory = %settings.fonts.directory.display(),
        "fonts loaded"
    );
    fonts
}

fn build_renderer(settings: &Settings, fonts: FontRegistry) -> Renderer {
    Renderer::new(
        &fonts,
        Arc::new(settings.theme.clone()),
        settings.images.padding_fraction,
    )
}

fn spawn_rate_limit_pruner(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            limiter.prune();
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "naas::shutdown", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "naas::shutdown", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!(target = "naas::shutdown", "shutdown signal received");
}
