//! CLI entry point for the CloudAtlas tool server.
//!
//! `serve` runs the HTTP boundary; `invoke`, `tools` and `check` are one-shot
//! commands that write JSON to stdout.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use cloudatlas_core::AppConfig;
use cloudatlas_graph::{GraphHandle, QueryRunner};
use cloudatlas_tools::{registry, server, ToolDispatcher};

#[derive(Parser)]
#[command(name = "cloudatlas")]
#[command(about = "Security queries and graph snapshots over an AWS infrastructure graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: cloudatlas).
    #[arg(short, long, default_value = "cloudatlas", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the tool API over HTTP.
    Serve {
        /// Override the bind address from config.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Invoke a single tool and print its result.
    Invoke {
        /// Tool name, e.g. find_public_s3_buckets.
        tool: String,
        /// Arguments as JSON: an array (positional) or a single value.
        #[arg(long)]
        args: Option<String>,
    },
    /// List tool descriptors.
    Tools,
    /// Connect to Neo4j and count nodes.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cli.command {
        Command::Serve { .. } => fmt().with_env_filter(filter).json().init(),
        _ => fmt().with_env_filter(filter).with_writer(std::io::stderr).init(),
    }

    let config = AppConfig::load(&cli.config)?;
    let graph = GraphHandle::new(config.neo4j.clone().into());

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let dispatcher = ToolDispatcher::new(Arc::new(graph.clone()));
            let app = server::router(dispatcher, &config.server);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            tracing::info!(%bind, "CloudAtlas tool server listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            graph.disconnect().await;
        }
        Command::Invoke { tool, args } => {
            let args = args
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()?;
            let dispatcher = ToolDispatcher::new(Arc::new(graph.clone()));
            let outcome = dispatcher.invoke(&tool, args).await;
            graph.disconnect().await;

            match outcome {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(failure) => {
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                    anyhow::bail!("{tool} failed: {}", failure.error);
                }
            }
        }
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&registry::descriptors())?);
        }
        Command::Check => {
            let outcome = graph.check_connection().await;
            graph.disconnect().await;
            let nodes = outcome?;
            println!(
                "{}",
                serde_json::json!({ "uri": graph.config().uri, "connected": true, "nodes": nodes })
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
