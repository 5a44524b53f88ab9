//! Line-oriented TCP chat relay server.
//!
//! Receives lines from connected clients and broadcasts them to all other
//! clients, persisting a transcript that is replayed to newcomers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 8989
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use idobata_server::{
    domain::{HistoryStore, Room},
    infrastructure::{ChannelMessagePusher, FileHistoryStore, InMemoryRoomRepository},
    ui::{Server, SessionContext},
    usecase::{Broadcaster, JoinChatUseCase, LeaveChatUseCase, SendMessageUseCase},
};
use idobata_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "idobata-server")]
#[command(about = "Line-oriented TCP chat relay with broadcast support", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8989")]
    port: u16,

    /// Path to the welcome banner shown to connecting clients
    #[arg(long, default_value = "welcome.txt")]
    banner: PathBuf,

    /// Path to the transcript file (truncated at startup)
    #[arg(long, default_value = "history.txt")]
    history_file: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // The banner is an external input; starting without it would greet every
    // client with nothing, so treat it as a fatal startup error.
    let banner = match std::fs::read_to_string(&args.banner) {
        Ok(banner) => banner,
        Err(e) => {
            tracing::error!("Error reading banner file {}: {}", args.banner.display(), e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Repository
    // 2. HistoryStore
    // 3. MessagePusher
    // 4. Broadcaster + UseCases
    // 5. Server

    // 1. Create Repository (in-memory registry)
    let room = Arc::new(Mutex::new(Room::new()));
    let repository = Arc::new(InMemoryRoomRepository::new(room));

    // 2. Create HistoryStore and drop the transcript of previous runs
    let history = Arc::new(FileHistoryStore::new(args.history_file.clone()));
    if let Err(e) = history.reset().await {
        tracing::warn!(
            "Failed to reset history file {}: {}",
            args.history_file.display(),
            e
        );
    }

    // 3. Create MessagePusher (per-session outbound channels)
    let message_pusher = Arc::new(ChannelMessagePusher::new());

    // 4. Create Broadcaster and UseCases
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let broadcaster = Arc::new(Broadcaster::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let join_chat = Arc::new(JoinChatUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        history.clone(),
        broadcaster.clone(),
        clock.clone(),
    ));
    let send_message = Arc::new(SendMessageUseCase::new(
        history.clone(),
        broadcaster.clone(),
        clock.clone(),
    ));
    let leave_chat = Arc::new(LeaveChatUseCase::new(
        repository,
        message_pusher,
        broadcaster,
    ));

    // 5. Create and run the server
    let context = Arc::new(SessionContext {
        join_chat,
        send_message,
        leave_chat,
        clock,
        banner,
    });
    let server = Server::new(context);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
