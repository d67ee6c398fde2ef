mod api;
mod auth;
mod config;
mod db;
mod models;
mod schema;
mod store;
mod telemetry;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use clap::{Parser, Subcommand};
use config::Config;
use recipebox_core::NewRecipe;
use std::sync::Arc;
use store::{MemoryStore, PgStore, Store};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "Recipe box server and admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Keep everything in memory instead of Postgres (lost on exit)
        #[arg(long)]
        in_memory: bool,
    },
    /// Print the OpenAPI spec as JSON and exit
    Openapi,
    /// Create a login
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, env = "RECIPEBOX_PASSWORD")]
        password: String,
    },
    /// Add a recipe
    CreateRecipe {
        #[arg(long)]
        name: String,
        /// Comma separated, e.g. "Tea leaves, Sugar, Water"
        #[arg(long, default_value = "")]
        ingredients: String,
        /// Minutes
        #[arg(long)]
        cooking_time: i32,
    },
    /// Remove a recipe by id
    DeleteRecipe {
        #[arg(long)]
        id: i32,
    },
}

fn postgres_state(config: Config) -> anyhow::Result<AppState> {
    let pool = db::create_pool(config.require_database_url()?)?;
    Ok(AppState::new(Arc::new(PgStore::new(pool)), config))
}

fn print_openapi() -> anyhow::Result<()> {
    let spec = api::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI spec")?;
    println!("{}", spec);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Dumping the OpenAPI document needs neither logging nor configuration
    if matches!(cli.command, Commands::Openapi) {
        return print_openapi();
    }

    telemetry::init()?;
    let config = Config::from_env()?;

    match cli.command {
        Commands::Openapi => print_openapi()?,
        Commands::Serve { in_memory } => {
            let state = if in_memory {
                tracing::warn!("Using in-memory store; data will be lost on exit");
                AppState::new(Arc::new(MemoryStore::new()), config)
            } else {
                postgres_state(config)?
            };
            serve(state).await?;
        }
        Commands::CreateUser { username, password } => {
            let state = postgres_state(config)?;
            let user = auth::register_user(&state, &username, &password)?;
            println!("Created user {} ({})", user.username, user.id);
        }
        Commands::CreateRecipe {
            name,
            ingredients,
            cooking_time,
        } => {
            let state = postgres_state(config)?;
            let recipe = state
                .store
                .create_recipe(&NewRecipe::new(name, ingredients, cooking_time))?;
            println!(
                "Created recipe {} at {} ({})",
                recipe.name,
                recipe.absolute_url(),
                recipe.difficulty(&state.config.difficulty)
            );
        }
        Commands::DeleteRecipe { id } => {
            let state = postgres_state(config)?;
            state
                .store
                .delete_recipe(id)
                .with_context(|| format!("Failed to delete recipe {}", id))?;
            println!("Deleted recipe {}", id);
        }
    }

    Ok(())
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_address = state.config.bind_address.clone();

    let app = api::router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %matched_path,
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &Span| {
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: std::time::Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = %latency.as_millis(),
                        "request failed"
                    );
                },
            ),
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
