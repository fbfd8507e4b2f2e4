use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tokio::io::BufReader;
use tracing::{error, info};

use carmate::{chat, web_server, Actions, Config, OllamaProvider, Orchestrator, PromptVariant};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

// Overrides for the environment-derived configuration
#[derive(clap::Args, Debug)]
struct ProviderArgs {
    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", global = true)]
    ollama_url: Option<String>,
    /// Language model to prompt
    #[arg(long, env = "CARMATE_MODEL", global = true)]
    llm_model: Option<String>,
    /// Chat prompt template to use
    #[arg(long, env = "CARMATE_PROMPT_VARIANT", global = true, value_enum)]
    prompt_variant: Option<PromptVariant>,
    /// Seconds to wait for the model before giving up
    #[arg(long, env = "CARMATE_REQUEST_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,
}

impl ProviderArgs {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.ollama_url {
            config.ollama_url = url;
        }
        if let Some(model) = self.llm_model {
            config.model = model;
        }
        if let Some(variant) = self.prompt_variant {
            config.prompt_variant = variant;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
    }
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web server with the chat UI and JSON endpoints.
    Serve {
        #[arg(long, default_value = "127.0.0.1", help = "Address to listen on.")]
        host: String,
        #[arg(long, default_value_t = 9900, help = "Port for the web server.")]
        port: u16,
    },
    /// Chat with the assistant in the terminal.
    Chat,
    /// Generate a listing description for a car.
    Describe {
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        year: i64,
        #[arg(long)]
        mileage: i64,
        #[arg(long, help = "e.g. excellent, good, fair, poor")]
        condition: String,
        #[arg(long, help = "Comma-separated list of features.")]
        features: String,
        #[arg(long, help = "Comma-separated list of selling points.")]
        selling_points: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for OLLAMA_URL, CARMATE_* settings)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,carmate=debug); logs go
    // to stderr so command output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carmate=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Carmate starting with command: {:?}", cli.command);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    cli.provider.apply(&mut config);

    let provider = OllamaProvider::from_config(&config).context("Failed to initialize model provider")?;
    let orchestrator = Orchestrator::new(Arc::new(provider)).context("Failed to initialize prompt templates")?;
    let actions = Actions::new(Arc::new(orchestrator), config.prompt_variant);

    match cli.command {
        Commands::Serve { host, port } => {
            info!(model = %config.model, variant = %config.prompt_variant, "Starting Carmate web server...");

            let server = web_server::start_web_server(&host, port, actions, &config);
            tokio::pin!(server);

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down...");
                }
                res = &mut server => {
                    if let Err(e) = res {
                        error!("Web server failed: {:?}", e);
                        return Err(e);
                    }
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat => {
            chat::run_chat(&actions, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await
                .context("Chat session failed")?;
        }
        Commands::Describe {
            make,
            model,
            year,
            mileage,
            condition,
            features,
            selling_points,
        } => {
            let fields = json!({
                "make": make,
                "model": model,
                "year": year,
                "mileage": mileage,
                "condition": condition,
                "features": features,
                "sellingPoints": selling_points,
            });
            let reply = actions.car_description_json(fields).await;
            println!("{}", reply.text);
            if let Some(kind) = reply.error {
                anyhow::bail!("description generation failed ({:?} error)", kind);
            }
        }
    }

    Ok(())
}
