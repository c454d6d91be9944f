//! Entry point for `rup-chat`.
//!
//! A login/chat service and client over RUP. `serve` answers every message
//! it receives; `send` delivers one message and prints the answer.
//! Set `RUST_LOG` to control verbosity.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rup_protocol::core::constants::ports;
use rup_protocol::prelude::*;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Login and chat over the Reliable UDP Protocol.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Reply timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 100)]
    timeout_ms: u64,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the service, answering LOGIN and CHAT commands.
    Serve {
        /// Local port to bind on every interface.
        #[arg(short, long, default_value_t = ports::SERVER_CHAT)]
        port: u16,
    },
    /// Send one message and wait for the answer.
    Send {
        /// Service address (e.g. 127.0.0.1:10001).
        #[arg(short, long)]
        to: SocketAddr,
        /// Local port to bind; 0 picks any.
        #[arg(long, default_value_t = ports::CLIENT_CHAT)]
        port: u16,
        /// Client name.
        #[arg(short, long, default_value = "")]
        name: String,
        /// Client credential.
        #[arg(short, long, default_value = "")]
        credential: String,
        /// Command tag (LOGIN, CHAT, ...).
        #[arg(long, default_value = "CHAT")]
        command: String,
        /// Sequence id of the message.
        #[arg(long, default_value_t = 1)]
        id: u32,
        /// How long to wait for the answer, in seconds.
        #[arg(long, default_value_t = 5)]
        wait: u64,
        /// Message text.
        message: String,
    },
}

#[derive(Debug, Error)]
enum ChatError {
    #[error(transparent)]
    Rup(#[from] RupError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("no answer within {0:?}")]
    NoAnswer(Duration),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ProtocolConfig::new().with_reply_timeout(Duration::from_millis(cli.timeout_ms));

    let result = match cli.mode {
        Mode::Serve { port } => serve(port, config).await,
        Mode::Send {
            to,
            port,
            name,
            credential,
            command,
            id,
            wait,
            message,
        } => {
            let request = Request {
                command,
                name,
                credential,
                id,
                message,
            };
            send(to, port, request, Duration::from_secs(wait), config).await
        }
    };

    if let Err(err) = result {
        eprintln!("rup-chat: {err}");
        std::process::exit(1);
    }
}

struct Request {
    command: String,
    name: String,
    credential: String,
    id: u32,
    message: String,
}

async fn serve(port: u16, config: ProtocolConfig) -> Result<(), ChatError> {
    let bind = SocketAddr::from(([0, 0, 0, 0], port));
    let mut endpoint = RupEndpoint::bind_with_config(bind, config).await?;
    info!("serving on {}", endpoint.local_addr()?);

    loop {
        let delivery = endpoint.receive().await?;
        let frame = &delivery.frame;
        let answer = answer_for(frame);
        info!(
            peer = %delivery.peer,
            sequence_id = frame.sequence_id(),
            command = frame.command(),
            "request"
        );

        let reply = Frame::builder(frame.sequence_id().wrapping_add(1))
            .command(frame.command())
            .origin(endpoint.origin()?)
            .client_name(frame.client_name())
            .payload(answer.into_bytes())
            .build()?;

        if let Err(err) = endpoint.send(&reply, delivery.peer).await {
            warn!(peer = %delivery.peer, error = %err, "reply not delivered");
        }
    }
}

fn answer_for(frame: &Frame) -> String {
    match frame.command() {
        "LOGIN" => format!("WELCOME {}", frame.client_name()),
        "CHAT" => {
            println!("{}: {}", frame.client_name(), frame.payload().to_text());
            "OK".to_string()
        }
        _ => "ERROR unknown command".to_string(),
    }
}

async fn send(
    to: SocketAddr,
    port: u16,
    request: Request,
    wait: Duration,
    config: ProtocolConfig,
) -> Result<(), ChatError> {
    let mut endpoint = RupEndpoint::bind_with_config(SocketAddr::from(([0, 0, 0, 0], port)), config).await?;

    let frame = Frame::builder(request.id)
        .command(request.command)
        .origin(endpoint.origin()?)
        .client_name(request.name)
        .client_credential(request.credential)
        .payload(request.message.into_bytes())
        .build()?;

    let outcome = endpoint.send(&frame, to).await?;
    info!(
        data_attempts = outcome.attempts.data,
        stop_confirmed = outcome.stop_confirmed,
        "delivered"
    );

    let answer = tokio::time::timeout(wait, async {
        loop {
            let delivery = endpoint.receive().await?;
            if delivery.peer == to && delivery.frame.sequence_id() == request.id.wrapping_add(1) {
                return Ok::<_, ChatError>(delivery);
            }
            warn!(peer = %delivery.peer, "ignoring unrelated message");
        }
    })
    .await
    .map_err(|_| ChatError::NoAnswer(wait))??;

    println!("{}", answer.frame.payload().to_text());
    Ok(())
}
