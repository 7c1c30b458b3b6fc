//! TCP gateway: newline-delimited JSON requests, one response line per
//! request, one task per connection.
//!
//! The transport stays deliberately thin; all game rules live behind
//! [`crate::game::GameEngine`]. Engine calls are short sled operations,
//! so they run inline on the connection task.

pub mod api;

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::config::Config;
use crate::game::GameEngine;
use crate::logutil::escape_log;

pub use api::{dispatch, Request, Response};

/// The network front end wrapping a shared engine.
pub struct GameServer {
    engine: Arc<GameEngine>,
    bind: String,
}

impl GameServer {
    pub fn new(engine: GameEngine, config: &Config) -> Self {
        Self {
            engine: Arc::new(engine),
            bind: config.server.bind.clone(),
        }
    }

    /// Accept connections until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind).await?;
        info!("petden listening on {}", self.bind);

        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("connection from {}", peer);
            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                if let Err(error) = handle_connection(engine, stream).await {
                    warn!("connection {} ended with error: {}", peer, error);
                }
            });
        }
    }
}

async fn handle_connection(engine: Arc<GameEngine>, stream: TcpStream) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(&engine, request),
            Err(error) => {
                debug!("malformed request {}: {}", escape_log(&line), error);
                Response::bad_request(&error.to_string())
            }
        };
        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        writer.write_all(payload.as_bytes()).await?;
    }

    Ok(())
}
