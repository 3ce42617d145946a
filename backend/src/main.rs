use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use log::{error, info};
use store::Store;

mod config;
mod error;
mod logging;
mod middleware;
mod routes;
mod server;
mod service;

use config::{Config, Listen};
use middleware::RequestTimeout;
use routes::Ledger;
use server::{ShutdownCoordinator, remove_stale_socket};
use service::UserService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(std::io::Error::other)?;
    logging::init(config.log_file.as_deref())?;
    info!("start application");

    let store = Store::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.connect_timeout,
    )
    .await
    .map_err(|e| {
        error!("failed to connect to database: {}", e);
        std::io::Error::other(e)
    })?;

    let ledger: Arc<dyn Ledger> = Arc::new(UserService::new(store));
    let ledger_data = web::Data::from(ledger);
    let request_timeout = RequestTimeout(config.request_timeout);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(ledger_data.clone())
            .app_data(request_timeout)
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .disable_signals()
    .shutdown_timeout(config.shutdown_timeout.as_secs());

    let server = match &config.listen {
        Listen::Tcp { bind_ip, port } => {
            info!("server is listening on {}:{}", bind_ip, port);
            server.bind((bind_ip.as_str(), *port))?.run()
        }
        #[cfg(unix)]
        Listen::Socket { path } => {
            remove_stale_socket(path)?;
            info!("server is listening on unix socket: {}", path.display());
            server.bind_uds(path)?.run()
        }
        #[cfg(not(unix))]
        Listen::Socket { path } => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("unix socket {} is not supported here", path.display()),
            ));
        }
    };

    let result = ShutdownCoordinator::new(config.shutdown_timeout)
        .run(server)
        .await;

    if let Listen::Socket { path } = &config.listen {
        remove_stale_socket(path)?;
    }
    result
}
