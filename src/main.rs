use std::{io::Write, process::ExitCode, sync::Arc};

use clap::Parser;
use feedline::{
    application::{
        collections::CommentFilter,
        context::{AppContext, Repositories},
        error::{AppError, ErrorReport},
    },
    cache::{CacheConfig, CollectionCache, MemoryCacheBackend},
    config::{self, CliArgs, Command, CommentFilterArg},
    infra::{db::PostgresRepositories, error::InfraError, media::MediaStorage, telemetry},
};
use serde::Serialize;
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("feedline::main", error);
    let emit = || {
        error!(
            source = report.source,
            error = %error,
            chain = ?report.messages,
            "application error"
        );
    };

    if dispatcher::has_been_set() {
        emit();
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, emit);
}

async fn run() -> Result<(), AppError> {
    let cli_args = CliArgs::parse();
    let settings = config::load(&cli_args).map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    telemetry::init(&settings.logging)?;

    let repositories = init_repositories(&settings).await?;

    match cli_args.command {
        Command::Migrate => run_migrate(&repositories).await,
        Command::Timeline(args) => {
            let app = build_application_context(repositories, &settings)?;
            let posts = app
                .timeline
                .list_timeline(args.user, args.max_age_days)
                .await?;
            info!(
                target = "feedline::timeline",
                user_id = %args.user,
                count = posts.len(),
                "Timeline listed"
            );
            print_json(&posts)
        }
        Command::Posts(args) => {
            let app = build_application_context(repositories, &settings)?;
            if args.count {
                let count = app.collections.post_count(args.user).await?;
                print_json(&json!({ "user": args.user, "count": count }))
            } else {
                print_json(&app.posts.list_user_posts(args.user).await?)
            }
        }
        Command::Comments(args) => {
            let app = build_application_context(repositories, &settings)?;
            let comments = app
                .comments
                .list_post_comments(args.post, comment_filter(args.filter))
                .await?;
            print_json(&comments)
        }
    }
}

async fn run_migrate(repositories: &PostgresRepositories) -> Result<(), AppError> {
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(InfraError::from)?;
    info!(target = "feedline::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(settings: &config::Settings) -> Result<PostgresRepositories, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;

    let repositories = PostgresRepositories::new(pool);
    repositories
        .health_check()
        .await
        .map_err(InfraError::from)?;
    Ok(repositories)
}

fn build_application_context(
    repositories: PostgresRepositories,
    settings: &config::Settings,
) -> Result<AppContext, AppError> {
    let media = Arc::new(
        MediaStorage::new(settings.media.root.clone()).map_err(InfraError::from)?,
    );

    let cache_config = CacheConfig::from(&settings.cache);
    let backend = Arc::new(MemoryCacheBackend::new(&cache_config));
    let cache = CollectionCache::new(cache_config, backend);

    Ok(AppContext::new(
        Repositories::from_shared(Arc::new(repositories), media),
        cache,
        settings.timeline.follows_enabled,
    ))
}

fn comment_filter(arg: CommentFilterArg) -> CommentFilter {
    match arg {
        CommentFilterArg::All => CommentFilter::All,
        CommentFilterArg::Approved => CommentFilter::Approved,
        CommentFilterArg::Disapproved => CommentFilter::Disapproved,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|err| InfraError::Io(err.into()))?;
    writeln!(stdout).map_err(InfraError::from)?;
    Ok(())
}
