//! Interactive TCP chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-client
//! cargo run --bin idobata-client -- --host 127.0.0.1 --port 8989
//! ```

use clap::Parser;
use idobata_client::run_client;
use idobata_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "idobata-client")]
#[command(about = "Terminal client for the idobata chat relay", long_about = None)]
struct Args {
    /// Host address of the chat server
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number of the chat server
    #[arg(short = 'p', long, default_value = "8989")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Keep the terminal clean for chat output; RUST_LOG can raise this.
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = run_client(args.host, args.port).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
