#![deny(dead_code)] // DO NOT REMOVE THIS EVER
use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod utils;

use duochat::client::{ChatApi, DEFAULT_API_URL};
use duochat::contacts::default_contacts;
use duochat::models::LOCAL_SENDER;
use duochat::ui::{self, ApiEvent, ChatUI, UiAction};

/// How often the header's server status is refreshed
const HEALTH_INTERVAL: Duration = Duration::from_secs(5);

/// Command line arguments for the duochat terminal client
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "duochat: a terminal front-end for the duochat demo server."
)]
struct Args {
    /// Base URL of the chat API
    #[arg(long, env = "DUOCHAT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Where log lines go while the UI owns the terminal
    #[arg(long, value_name = "PATH", default_value = "duochat.log")]
    log_file: PathBuf,

    #[arg(long, env = "DUOCHAT_LOG", default_value = "debug")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    utils::setup_logging(Some(&args.log_file), args.log_level)?;
    info!("duochat client starting up");
    info!("System information: {} {}", std::env::consts::OS, std::env::consts::ARCH);
    info!("Logging to file: {}", args.log_file.display());
    info!("Using chat API at {}", args.api_url);

    let api = ChatApi::new(&args.api_url);
    let (event_tx, mut event_rx) = mpsc::channel::<ApiEvent>(100);

    let mut terminal = ui::setup_terminal()?;
    let mut chat_ui = ChatUI::new(default_contacts());

    // Initial load; the list then scrolls to the newest message
    spawn_health_check(&api, &event_tx);
    spawn_load(&api, &event_tx);

    let outcome = run_main_loop(&mut chat_ui, &mut terminal, &api, &event_tx, &mut event_rx).await;

    ui::restore_terminal(terminal)?;
    if let Err(e) = &outcome {
        error!("Main loop failed: {}", e);
    }
    println!("Chat session ended.");
    outcome
}

async fn run_main_loop(
    chat_ui: &mut ChatUI,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    api: &ChatApi,
    event_tx: &mpsc::Sender<ApiEvent>,
    event_rx: &mut mpsc::Receiver<ApiEvent>,
) -> Result<()> {
    let mut last_health_check = Instant::now();

    loop {
        terminal.draw(|f| chat_ui.draw(f))?;

        match chat_ui.handle_input()? {
            Some(UiAction::Quit) => {
                info!("Quit requested");
                break;
            }
            Some(UiAction::ContactChanged(contact_id)) => {
                // Every contact shares the same message list, so this is a full reload
                debug!("Contact {} selected, reloading messages", contact_id);
                spawn_load(api, event_tx);
            }
            Some(UiAction::Send(text)) => {
                debug!("Sending message ({} chars)", text.chars().count());
                spawn_send(api, event_tx, text);
            }
            None => {}
        }

        // Responses may arrive in any order
        while let Ok(event) = event_rx.try_recv() {
            chat_ui.apply(event);
        }

        if last_health_check.elapsed() >= HEALTH_INTERVAL {
            spawn_health_check(api, event_tx);
            last_health_check = Instant::now();
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

fn spawn_load(api: &ChatApi, event_tx: &mpsc::Sender<ApiEvent>) -> JoinHandle<()> {
    let api = api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.get_messages().await;
        if let Err(e) = tx.send(ApiEvent::Loaded(result)).await {
            error!("Failed to deliver loaded messages to UI: {}", e);
        }
    })
}

fn spawn_send(api: &ChatApi, event_tx: &mpsc::Sender<ApiEvent>, text: String) -> JoinHandle<()> {
    let api = api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.send_message(&text, Some(LOCAL_SENDER)).await;
        if let Err(e) = tx.send(ApiEvent::Sent(result)).await {
            error!("Failed to deliver send result to UI: {}", e);
        }
    })
}

fn spawn_health_check(api: &ChatApi, event_tx: &mpsc::Sender<ApiEvent>) -> JoinHandle<()> {
    let api = api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let connected = match api.health().await {
            Ok(status) => status.status == "ok",
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        };
        if let Err(e) = tx.send(ApiEvent::Health(connected)).await {
            error!("Failed to deliver health status to UI: {}", e);
        }
    })
}
