//! TCP client session management.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc,
};

use super::error::ClientError;

/// Run one client session against `addr`.
///
/// Returns `Ok(())` when the user ends the session locally (Ctrl+C / Ctrl+D)
/// and an error when the server connection is lost.
pub async fn run_client_session(addr: &str) -> Result<(), ClientError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to chat server at {}", addr);

    let (mut read_half, mut write_half) = stream.into_split();

    // Print server bytes as they arrive; the server's prompts are the UI.
    let mut read_task = tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        loop {
            match read_half.read(&mut buf).await {
                Ok(0) => {
                    tracing::info!("Server closed the connection");
                    return true;
                }
                Ok(n) => {
                    print!("{}", String::from_utf8_lossy(&buf[..n]));
                    use std::io::Write;
                    std::io::stdout().flush().ok();
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    return true;
                }
            }
        }
    });

    // Channel bridging the blocking readline thread into the async writer.
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline("") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    // Empty lines are forwarded too; the server answers them
                    // with its own error text.
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    // Ctrl+C / Ctrl+D
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;
        while let Some(line) = input_rx.recv().await {
            if let Err(e) = write_half.write_all(format!("{}\n", line).as_bytes()).await {
                tracing::warn!("Failed to send line: {}", e);
                write_error = true;
                break;
            }
        }
        write_error
    });

    // If any one of the tasks completes, abort the other
    let connection_lost = tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or(true)
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or(true)
        }
    };

    if connection_lost {
        return Err(ClientError::ConnectionLost);
    }

    Ok(())
}
