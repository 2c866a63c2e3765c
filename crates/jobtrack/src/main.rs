use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobtrack::api::{AppState, create_router};
use jobtrack::auth::{
    AccountService, AuthState, JwtVerifier, RoleResolver, SessionStore, TokenIssuer,
};
use jobtrack::catalog::{InitialsRepository, JobOpRepository, RoleRepository};
use jobtrack::db::Database;
use jobtrack::integrity::ReferentialIntegrityGuard;
use jobtrack::jobdata::{JobRecordRepository, JobRecordService};
use jobtrack::settings::Settings;
use jobtrack::user::{UserRepository, UserService};

#[derive(Debug, Parser)]
#[command(author, version, about = "Jobtrack - shop-floor job tracking server.")]
struct Cli {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the bind address from the config
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobtrack=info,tower_http=info")),
        )
        .init();

    let settings = Settings::load(cli.config.as_deref())?;
    let bind = cli.bind.unwrap_or_else(|| settings.server.bind.clone());

    let db = Database::new(&settings.database.path).await?;
    let state = build_state(&db, &settings);
    let router = create_router(state)?;

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding to {bind}"))?;
    info!(addr = %bind, "jobtrack listening");

    axum::serve(listener, router).await.context("serving")?;
    Ok(())
}

fn build_state(db: &Database, settings: &Settings) -> AppState {
    let pool = db.pool().clone();

    let sessions = SessionStore::new(std::time::Duration::from_secs(
        settings.auth.session_idle_minutes * 60,
    ));
    let verifier = JwtVerifier::new(
        &settings.auth.jwt_secret,
        &settings.auth.issuer,
        &settings.auth.audience,
    );
    let issuer = TokenIssuer::new(
        &settings.auth.jwt_secret,
        &settings.auth.issuer,
        &settings.auth.audience,
        settings.auth.token_ttl_minutes,
    );

    let auth = AuthState::new(
        Arc::new(verifier),
        RoleResolver::new(pool.clone()),
        sessions.clone(),
    );

    let users = UserService::new(UserRepository::new(pool.clone()));
    let accounts = AccountService::new(users.clone(), issuer, sessions);

    let job_ops = JobOpRepository::new(pool.clone());
    let initials = InitialsRepository::new(pool.clone());
    let records = JobRecordService::new(
        JobRecordRepository::new(pool.clone()),
        job_ops.clone(),
        initials.clone(),
    );

    AppState {
        auth,
        accounts,
        users,
        job_ops,
        initials,
        roles: RoleRepository::new(pool.clone()),
        records,
        guard: ReferentialIntegrityGuard::new(pool),
    }
}
