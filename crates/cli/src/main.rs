use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "warelay")]
#[command(about = "WhatsApp webhook relay to a chat-completion provider", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway (GET/POST /webhook). Secrets come from config or VERIFY_TOKEN, WHATSAPP_TOKEN, WHATSAPP_PHONE_NUMBER_ID, OPENAI_API_KEY (a .env file in the working directory is loaded first).
    Serve {
        /// Config file path (default: WARELAY_CONFIG_PATH or ~/.warelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Send one text message through the Graph API (checks WhatsApp credentials without the webhook).
    Send {
        /// Config file path (default: WARELAY_CONFIG_PATH or ~/.warelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Recipient WhatsApp id (phone number in international format, digits only)
        #[arg(long)]
        to: String,

        /// Message text
        message: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("warelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            to,
            message,
        }) => {
            if let Err(e) = run_send(config, &to, &message).await {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Some(b) = bind {
        config.gateway.bind = b;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

async fn run_send(config_path: Option<PathBuf>, to: &str, message: &str) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let clients = lib::clients::ClientManager::start(&config.clients)?;
    let sender = lib::gateway::whatsapp_sender(&config, &clients)?;
    let result = sender.try_send(to, message).await;
    clients.release();
    let response = result?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
