use std::time::Duration;

use accrual_engine::{AccrualClient, SqliteDatabase};
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, App, HttpServer};
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    reconciliation_worker::start_reconciliation_worker,
    routes::health,
};

/// Runs the health endpoint and the reconciliation worker until Ctrl-C is pressed.
///
/// On shutdown the worker is cancelled first, then the HTTP server is stopped, and finally this function waits for the
/// worker to finish the order it was working on.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let db = SqliteDatabase::new_with_url(config.database_url.reveal(), 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let client =
        AccrualClient::new(config.accrual_client_config()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    // Nothing is spawned until the listening socket is bound
    let srv = match create_server_instance(&config) {
        Ok(srv) => srv,
        Err(e) => {
            error!("🚀️ Could not start the HTTP server on {}:{}. {e}", config.host, config.port);
            db.close().await;
            return Err(e);
        },
    };
    let shutdown = CancellationToken::new();
    let worker = start_reconciliation_worker(db.clone(), client, config.worker_options(), shutdown.clone());

    let handle = srv.handle();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("🚀️ Could not listen for the shutdown signal. The server must be killed to stop it. {e}");
            return;
        }
        info!("🚀️ Shutdown requested");
        signal_token.cancel();
        handle.stop(true).await;
    });

    let result = srv.await;
    shutdown.cancel();
    if let Err(e) = worker.await {
        error!("🚀️ The reconciliation worker did not shut down cleanly. {e}");
        return Err(ServerError::WorkerError(e.to_string()));
    }
    db.close().await;
    result.map_err(ServerError::from)
}

pub fn create_server_instance(config: &ServerConfig) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("accrual::access_log"))
            .service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .disable_signals()
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
