// surfsup - Read-only HTTP API for Hawaii climate observations
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use clap::Parser;
use prometheus_client::registry::Registry;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use surfsup::http::RequestContext;
use surfsup::store::ClimateStore;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 5000);
const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_DATABASE_URL: &str = "sqlite://hawaii.sqlite";

#[derive(Debug, Parser)]
#[clap(name = "surfsup", version = clap::crate_version!())]
struct SurfsUpApplication {
    /// SQLite database containing `station` and `measurement` tables. The database
    /// is opened read-only.
    #[clap(long, default_value_t = DEFAULT_DATABASE_URL.into())]
    database_url: String,

    /// Maximum number of database connections shared by concurrent requests.
    #[clap(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,

    /// Timeout for acquiring a database connection, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to bind to. By default, surfsup will only listen on localhost.
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = SurfsUpApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let timeout = Duration::from_millis(opts.timeout_millis);
    let store = ClimateStore::connect(&opts.database_url, opts.max_connections, timeout)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(message = "unable to open database", database_url = %opts.database_url, error = %e);
            process::exit(1)
        });

    // Make sure the tables we query exist and have the columns we expect before starting
    // the HTTP server, rather than failing every request later.
    match store.verify().await {
        Ok(summary) => {
            tracing::info!(
                message = "verified database",
                database_url = %opts.database_url,
                stations = summary.stations,
                measurements = summary.measurements,
                latest = ?summary.latest,
            );
        }
        Err(e) => {
            tracing::error!(message = "invalid database", database_url = %opts.database_url, error = %e);
            process::exit(1)
        }
    }

    let context = Arc::new(RequestContext::new(store, Registry::default()));
    let app = surfsup::http::router(context);
    let server = axum::Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
        process::exit(1)
    });

    let server = server.serve(app.into_make_service());
    tracing::info!(message = "server started", address = %server.local_addr());

    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
