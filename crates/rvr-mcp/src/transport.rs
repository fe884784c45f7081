//! Stdio transport for MCP server communication.
//!
//! Owns the server process and correlates requests with responses over its
//! stdin/stdout. One request is in flight at a time: a call holds the
//! connection lock from id allocation until its response (or timeout), so
//! requests never interleave on the wire.

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::framer::LineFramer;
use crate::jsonrpc::{JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::process::{ProcessHandle, ShutdownOutcome};
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::Mutex;

/// Live connection state, guarded by the single-flight lock.
struct Connection {
    next_id: u64,
    stdin: ChildStdin,
    framer: LineFramer<BufReader<ChildStdout>>,
    process: ProcessHandle,
    closed: bool,
}

/// Request/response correlator over a child process's stdio.
pub struct StdioTransport {
    name: String,
    timeout: Duration,
    shutdown_grace: Duration,
    connection: Mutex<Option<Connection>>,
}

impl StdioTransport {
    /// Spawn the server process. No messages are exchanged yet.
    pub fn spawn(name: impl Into<String>, config: &McpServerConfig) -> Result<Self, McpError> {
        let name = name.into();
        let (process, pipes) = ProcessHandle::spawn(&name, config)?;

        Ok(Self {
            name,
            timeout: config.timeout(),
            shutdown_grace: config.shutdown_grace(),
            connection: Mutex::new(Some(Connection {
                next_id: 1,
                stdin: pipes.stdin,
                framer: LineFramer::new(BufReader::new(pipes.stdout)),
                process,
                closed: false,
            })),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and wait for its response using the default timeout.
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse, McpError> {
        self.call_with_timeout(method, params, self.timeout).await
    }

    /// Send a request and wait up to `timeout` for the matching response.
    ///
    /// The timeout covers writing the request as well as waiting for the
    /// response, so a server that stops reading its stdin cannot stall the
    /// caller. A write that does not complete leaves the connection closed.
    /// Responses carrying other ids (late replies to timed-out calls) and
    /// server-initiated messages are discarded while waiting.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, McpError> {
        let mut guard = self.connection.lock().await;
        let conn = self.live(&mut guard)?;

        let id = conn.next_id;
        conn.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        match tokio::time::timeout(timeout, conn.exchange(&request, &self.name)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    server = %self.name,
                    id,
                    method,
                    "request timed out after {}ms",
                    timeout.as_millis()
                );
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Send a notification. Does not wait for anything from the server.
    pub async fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), McpError> {
        let mut guard = self.connection.lock().await;
        let conn = self.live(&mut guard)?;

        let notification = JsonRpcNotification::new(method, params);
        match tokio::time::timeout(self.timeout, conn.write_line(&notification, &self.name)).await {
            Ok(written) => written?,
            Err(_) => {
                tracing::warn!(server = %self.name, method, "notification write timed out");
                return Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        }
        tracing::debug!(server = %self.name, method, "sent notification");
        Ok(())
    }

    /// Whether the server process is still attached.
    pub async fn is_running(&self) -> bool {
        matches!(&*self.connection.lock().await, Some(conn) if !conn.closed)
    }

    /// Shut down: close stdin, ask the process to exit, kill it after the
    /// grace period.
    ///
    /// Waits for any in-flight call to finish first. Returns `None` when the
    /// transport was already shut down.
    pub async fn shutdown(&self) -> Option<ShutdownOutcome> {
        let conn = self.connection.lock().await.take()?;
        let Connection { stdin, process, .. } = conn;
        drop(stdin);
        Some(process.stop(self.shutdown_grace).await)
    }

    fn live<'a>(
        &self,
        guard: &'a mut Option<Connection>,
    ) -> Result<&'a mut Connection, McpError> {
        match guard.as_mut() {
            None => Err(McpError::ServerNotRunning {
                name: self.name.clone(),
            }),
            Some(conn) if conn.closed => Err(McpError::ConnectionClosed {
                name: self.name.clone(),
            }),
            Some(conn) => Ok(conn),
        }
    }
}

impl Connection {
    /// Write `request` and read until its response arrives.
    async fn exchange(
        &mut self,
        request: &JsonRpcRequest,
        server: &str,
    ) -> Result<JsonRpcResponse, McpError> {
        self.write_line(request, server).await?;
        tracing::debug!(server, id = request.id, method = %request.method, "sent request");
        self.read_response(request.id, server).await
    }

    /// Serialize `message`, write it with a trailing newline, and flush.
    ///
    /// The connection counts as closed until the flush completes: a write
    /// that fails or is dropped part way may leave half a line on the wire,
    /// and nothing written after it could be framed correctly.
    async fn write_line<T: Serialize>(&mut self, message: &T, server: &str) -> Result<(), McpError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        self.closed = true;
        let written = async {
            self.stdin.write_all(line.as_bytes()).await?;
            self.stdin.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                self.closed = false;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::warn!(server, "MCP server closed its stdin");
                Err(McpError::ConnectionClosed {
                    name: server.to_string(),
                })
            }
            Err(e) => Err(McpError::Io(e)),
        }
    }

    /// Read framed values until the response with `id` arrives.
    async fn read_response(&mut self, id: u64, server: &str) -> Result<JsonRpcResponse, McpError> {
        loop {
            let Some(value) = self.framer.next_value().await? else {
                self.closed = true;
                tracing::warn!(server, "MCP server closed its stdout");
                return Err(McpError::ConnectionClosed {
                    name: server.to_string(),
                });
            };

            match JsonRpcMessage::from_value(value) {
                Some(JsonRpcMessage::Response(resp)) if resp.id == id => return Ok(resp),
                Some(JsonRpcMessage::Response(resp)) => {
                    tracing::debug!(server, expected = id, got = resp.id, "discarding stale response");
                }
                Some(other) => {
                    tracing::debug!(server, method = ?other.method(), "ignoring server-initiated message");
                }
                None => {
                    tracing::debug!(server, "ignoring JSON line that is not a JSON-RPC message");
                }
            }
        }
    }
}
