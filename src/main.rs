mod common;
mod config;
mod network;
mod ui;

use clap::Parser;
use common::DisplayName;
use config::ClientSettings;
use dotenvy::dotenv;
use network::PusherClient;
use tokio::sync::mpsc;
use ui::ChatApp;
use ui::state::AppState;

#[derive(Parser)]
#[command(
    name = "epg_chat",
    version,
    about = "Chat window for a hosted pub/sub channel"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Display name to use instead of a random `User<n>`
    #[arg(long)]
    name: Option<String>,
    /// Channel to join, overrides the config file
    #[arg(long)]
    channel: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides();
    if let Some(channel) = cli.channel {
        app_config.channel = channel;
    }

    let settings = match app_config.validate() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Invalid configuration: {err}");
            return Err(err.into());
        }
    };

    let display_name = match cli.name {
        Some(name) if !name.trim().is_empty() => {
            if DisplayName::is_generated(name.trim()) {
                log::warn!("`{}` looks like a generated name and may collide with others", name.trim());
            }
            DisplayName::custom(name.trim())
        }
        _ => DisplayName::generate(),
    };
    log::info!("Chatting as {display_name}");

    run_chat_client(settings, display_name).await?;
    Ok(())
}

async fn run_chat_client(
    settings: ClientSettings,
    display_name: DisplayName,
) -> Result<(), eframe::Error> {
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let channel = settings.channel.clone();
    tokio::spawn(async move {
        let client = PusherClient::new(settings, event_tx, cmd_rx);
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    let options = eframe::NativeOptions::default();
    let state = AppState::new(display_name, channel);

    eframe::run_native(
        "EPG Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, state, cmd_tx, event_rx)))),
    )
}
