use std::sync::Arc;

use serde_json::Value;
use spectrabrainz::auth::{PasswordLogin, TokenCache, source_from_config};
use spectrabrainz::client::{HttpConfig, StorcycleClient};
use spectrabrainz::config::Config;
use spectrabrainz::observability::IngestMetrics;
use spectrabrainz::report::{DailyReportCache, StatusExport, StatusOutcome};
use spectrabrainz::storage::ReportStorage;
use tracing::{info, warn};

use crate::cli::{Commands, CreateArgs, DailyArgs, JobsArgs, ProjectArgs, ProjectsArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared client and token cache for one invocation
struct App {
    config: Config,
    client: Arc<StorcycleClient>,
    tokens: Arc<TokenCache>,
}

impl App {
    fn new(config: Config) -> Result<Self, AnyError> {
        let client = Arc::new(StorcycleClient::new(HttpConfig::from(&config.api))?);
        let credentials = source_from_config(&config.credentials)?;
        let login = Arc::new(PasswordLogin::new(client.clone(), credentials));
        let tokens = Arc::new(TokenCache::new(login, config.api.token_ttl.as_duration()));

        Ok(Self {
            config,
            client,
            tokens,
        })
    }
}

pub async fn run(config: Config, command: Commands) -> Result<(), AnyError> {
    let app = App::new(config)?;

    match command {
        Commands::Daily(args) => daily(&app, args).await,
        Commands::Status(args) => status(&app, args).await,
        Commands::Jobs(args) => jobs(&app, args).await,
        Commands::Exists(args) => exists(&app, args).await,
        Commands::Project(args) => project(&app, args).await,
        Commands::Create(args) => create(&app, args).await,
        Commands::Projects(args) => projects(&app, args).await,
    }
}

async fn daily(app: &App, args: DailyArgs) -> Result<(), AnyError> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let settings = &app.config.report;

    let storage = ReportStorage::local(&settings.dir)?;
    let metrics = Arc::new(IngestMetrics::new());
    let cache = DailyReportCache::new(app.client.clone(), app.tokens.clone(), storage)
        .with_page_size(settings.page_size)
        .with_include_all(settings.include_all)
        .with_metrics(metrics.clone());

    let report = cache.get_or_build(date).await?;
    if report.is_empty() {
        warn!(%date, "Daily report has no entries");
    }
    let snapshot = metrics.snapshot();
    info!(
        records_fetched = snapshot.records_fetched,
        records_dropped = snapshot.records_dropped,
        reports_built = snapshot.reports_built,
        reports_loaded = snapshot.reports_loaded,
        "Daily run finished"
    );

    let path = std::path::Path::new(&cache.storage().location).join(report.key());
    println!("{}\t{} entries", path.display(), report.len());
    Ok(())
}

async fn status(app: &App, args: DailyArgs) -> Result<(), AnyError> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let settings = &app.config.report;

    let storage = ReportStorage::local(&settings.dir)?;
    let location = storage.location.clone();
    let export = StatusExport::new(app.client.clone(), app.tokens.clone(), storage)
        .with_page_size(settings.page_size)
        .with_include_all(settings.include_all);

    let outcome = export.export(date).await?;
    let path = std::path::Path::new(&location).join(outcome.key());
    match outcome {
        StatusOutcome::Written { rows, .. } => println!("{}\t{} rows", path.display(), rows),
        StatusOutcome::AlreadyExported { .. } => println!("{}\talready exported", path.display()),
    }
    Ok(())
}

async fn jobs(app: &App, args: JobsArgs) -> Result<(), AnyError> {
    let token = app.tokens.get_token().await?;
    let records = app
        .client
        .job_statuses(&token, args.page_size, args.all)
        .await?;
    let list = Value::Array(records.into_iter().map(Value::Object).collect());
    print_json(&list)
}

async fn exists(app: &App, args: ProjectArgs) -> Result<(), AnyError> {
    let token = app.tokens.get_token().await?;
    let found = app.client.project_exists(&token, &args.id).await?;
    print_json(&serde_json::json!({ "id": args.id, "exists": found }))
}

async fn project(app: &App, args: ProjectArgs) -> Result<(), AnyError> {
    let token = app.tokens.get_token().await?;
    let body = app.client.get_project(&token, &args.id).await?;
    print_json(&body)
}

async fn create(app: &App, args: CreateArgs) -> Result<(), AnyError> {
    let token = app.tokens.get_token().await?;
    let body = app
        .client
        .create_project(
            &token,
            &app.config.project,
            &args.name,
            &args.description,
            &args.directory,
        )
        .await?;
    print_json(&body)
}

async fn projects(app: &App, args: ProjectsArgs) -> Result<(), AnyError> {
    let token = app.tokens.get_token().await?;
    let records = app.client.list_projects(&token, args.page_size).await?;
    let list = Value::Array(records.into_iter().map(Value::Object).collect());
    print_json(&list)
}

fn print_json(value: &Value) -> Result<(), AnyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
