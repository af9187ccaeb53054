//! stdio transport for MCP

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::TransportError;
use crate::protocol::{McpError, McpMessage, RequestHandler};

/// stdio transport for MCP protocol
///
/// Each line on stdin is one JSON-RPC message. Requests are dispatched on
/// their own task so a slow AWS call does not block the session; responses
/// are funnelled through a single writer.
pub struct StdioTransport {
    handler: Arc<RequestHandler>,
}

impl StdioTransport {
    /// Create a new stdio transport
    pub fn new(handler: Arc<RequestHandler>) -> Self {
        Self { handler }
    }

    /// Serve stdin/stdout until EOF
    pub async fn run(&self) -> Result<(), TransportError> {
        info!("Starting MCP server on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve an arbitrary line-oriented stream pair until the reader hits EOF
    pub async fn serve<R, W>(&self, mut reader: R, writer: W) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<McpMessage>();
        let writer_task = tokio::spawn(write_messages(rx, writer));

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!("Received: {}", trimmed);

            let message: McpMessage = match serde_json::from_str(trimmed) {
                Ok(msg) => msg,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    let _ = tx.send(McpMessage::error_response(None, McpError::parse_error()));
                    continue;
                }
            };

            let handler = self.handler.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = handler.handle(message).await {
                    let _ = tx.send(response);
                }
            });
        }

        // The writer finishes once every in-flight request has answered
        drop(tx);
        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e).into()),
        }
    }
}

async fn write_messages<W>(
    mut rx: mpsc::UnboundedReceiver<McpMessage>,
    mut writer: W,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let line = serde_json::to_string(&message)?;
        debug!("Sending: {}", line);
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
