//! MCP (Model Context Protocol) client for RVR Chat.
//!
//! Talks to a single stdio MCP server (the robot controller) using
//! newline-delimited JSON-RPC 2.0. The server is spawned as a child process,
//! initialized with a handshake, and its tools are listed and called one
//! request at a time. Non-protocol lines the server prints on stdout are
//! skipped.

pub mod client;
pub mod config;
pub mod error;
pub mod framer;
pub mod handshake;
pub mod jsonrpc;
pub mod process;
pub mod tool;
pub mod transport;

pub use client::McpClient;
pub use config::McpServerConfig;
pub use error::McpError;
pub use framer::LineFramer;
pub use handshake::{ServerInfo, handshake};
pub use jsonrpc::{JsonRpcError, JsonRpcMessage, JsonRpcResponse};
pub use process::{ProcessHandle, ShutdownOutcome};
pub use tool::{ToolDescriptor, to_model_tools};
pub use transport::StdioTransport;
