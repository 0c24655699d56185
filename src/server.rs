use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    cli::Cli,
    db::Database,
    web::{self, AppState},
};

pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    info!(database = %cli.database.display(), "Opening database...");
    let db = Database::open(&cli.database)
        .await
        .with_context(|| format!("Failed to connect to database {:?}", cli.database))?;
    db.apply_migrations()
        .await
        .context("Failed to apply database migrations")?;

    let templates = web::load_templates(&cli.templates)
        .with_context(|| format!("Failed to load templates from {}", cli.templates))?;
    let state = AppState::new(db, templates, cli.session_settings());

    let listener = TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!(addr = %listener.local_addr()?, "Ready for requests...");

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
