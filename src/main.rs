use std::{process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use forum_llms_txt::{
    application::{
        error::AppError,
        freshness::FreshnessOracle,
        jobs::{RefreshContext, process_refresh_job},
        llms::LlmsService,
        repos::{AccessRepo, ContentRepo},
        settings::ConfigSnapshot,
        tracking::AccessTracker,
    },
    cache::{CacheConfig, CacheTrigger, Clock, DocumentCache, SystemClock},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        export::ExportRepository,
        http::{self, HttpState, OpsState},
        memory::MemoryAccessRepo,
        telemetry,
    },
};
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
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

struct Repositories {
    content: Arc<dyn ContentRepo>,
    access: Arc<dyn AccessRepo>,
}

struct ApplicationContext {
    llms: Arc<LlmsService>,
    tracker: AccessTracker,
    trigger: Arc<CacheTrigger>,
}

async fn init_repositories(
    settings: &config::Settings,
    migrate: bool,
) -> Result<Repositories, AppError> {
    let database = &settings.database;

    if let Some(path) = database.export_path.as_deref() {
        let export = ExportRepository::open(path).await?;
        return Ok(Repositories {
            content: Arc::new(export),
            access: Arc::new(MemoryAccessRepo::default()),
        });
    }

    let Some(url) = database.url.as_deref() else {
        return Err(AppError::validation(
            "either database.url or database.export_path must be configured",
        ));
    };

    let pool = PostgresRepositories::connect(url, database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    if migrate {
        PostgresRepositories::run_migrations(&pool)
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    }

    let repositories = Arc::new(PostgresRepositories::new(pool));
    Ok(Repositories {
        content: repositories.clone(),
        access: repositories,
    })
}

fn build_application_context(
    repositories: Repositories,
    settings: &config::Settings,
) -> ApplicationContext {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(DocumentCache::new(clock.clone()));
    let freshness = Arc::new(FreshnessOracle::new(
        repositories.content.clone(),
        clock.clone(),
    ));

    let llms = Arc::new(LlmsService::new(
        repositories.content,
        cache.clone(),
        freshness.clone(),
        Arc::new(ConfigSnapshot::from(settings)),
        CacheConfig::from(&settings.cache),
    ));
    let tracker = AccessTracker::new(repositories.access, clock);
    let trigger = Arc::new(CacheTrigger::new(settings.llms.enabled, cache, freshness));

    ApplicationContext {
        llms,
        tracker,
        trigger,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, true).await?;
    let app = build_application_context(repositories, &settings);

    let ops_state = match settings.llms.webhook_secret.as_deref() {
        Some(secret) => Some(OpsState::new(
            app.llms.clone(),
            app.trigger.clone(),
            app.tracker.clone(),
            secret,
        )),
        None => {
            info!("No webhook secret configured; operational routes are not mounted");
            None
        }
    };

    let http_state = HttpState {
        llms: app.llms.clone(),
        tracker: app.tracker.clone(),
    };

    let monitor_handle = spawn_job_monitor(app.llms.clone(), &settings.scheduler)?;

    let result = serve_http(&settings, http_state, ops_state).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_render(settings: config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, false).await?;
    let app = build_application_context(repositories, &settings);
    let llms = app.llms;
    let target = args.target.as_deref().map(str::trim);

    let body = match args.kind {
        config::RenderKind::Navigation => llms.navigation().await?.body,
        config::RenderKind::Full => llms.full_content().await?.body,
        config::RenderKind::Sitemap => llms.sitemap().await?.body,
        config::RenderKind::Category => {
            let path = require_target(target, "category path")?;
            llms.category(path).await?.document.body
        }
        config::RenderKind::Topic => {
            let raw = require_target(target, "topic id")?;
            let id = raw
                .parse::<i64>()
                .map_err(|_| AppError::validation(format!("`{raw}` is not a topic id")))?;
            llms.topic(id).await?.document.body
        }
        config::RenderKind::Tag => {
            let name = require_target(target, "tag name")?;
            llms.tag(name).await?.document.body
        }
    };

    print!("{body}");
    Ok(())
}

fn require_target<'a>(target: Option<&'a str>, what: &str) -> Result<&'a str, AppError> {
    target
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::validation(format!("render requires a {what}")))
}

fn spawn_job_monitor(
    llms: Arc<LlmsService>,
    scheduler: &config::SchedulerSettings,
) -> Result<tokio::task::JoinHandle<()>, AppError> {
    let schedule = scheduler.cron()?;

    let refresh_worker = WorkerBuilder::new("refresh-llms-cache-worker")
        .data(RefreshContext { llms })
        .backend(CronStream::new(schedule))
        .build_fn(process_refresh_job);

    let monitor = Monitor::new().register(refresh_worker);

    Ok(tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    }))
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    ops_state: Option<OpsState>,
) -> Result<(), AppError> {
    let router = http::build_router(http_state, ops_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "Serving llms.txt documents");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
