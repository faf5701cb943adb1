//! HTTP client SDK for the Lark Aily assistant API.
//!
//! This crate provides a typed client for the session, message and run
//! endpoints, a cursor-driven page iterator, and a completion pipeline that
//! sends a message, runs an app on it and waits for the assistant's reply.
//!
//! # Example
//!
//! ```no_run
//! use aily_client::{AilyClient, CompletionRequest, RequestOptions};
//!
//! # async fn example() -> aily_client::Result<()> {
//! let client = AilyClient::builder()
//!     .base_url("https://open.feishu.cn")
//!     .auth_token("t-secret")
//!     .build()?;
//!
//! let request = CompletionRequest::new("spring_app", "Hello!").with_session_key("chat-42");
//! let result = client.completions().create(request, &RequestOptions::new()).await;
//! if let Some(reply) = result.message {
//!     println!("{}", reply.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Sessions**: create, get, delete
//! - **Messages**: create, get, list, list with iterator
//! - **Runs**: create, get, cancel, list, list with iterator
//! - **Completions**: the message → run → poll → reply pipeline

pub mod api;
pub mod client;
pub mod completions;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod pagination;
pub mod transport;
pub mod types;

pub use client::{AilyClient, ClientBuilder, HttpTransport};
pub use completions::{
    CompletionRequest, CompletionResult, CompletionSettings, Completions, ExecStatus,
    MessageInput,
};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use mock::{MockReply, MockTransport};
pub use pagination::{PageIterator, PageRequest};
pub use transport::{ApiRequest, RequestOptions, SharedTransport, Transport};
pub use types::*;

// Re-export API types that are commonly used with query methods
pub use api::{ListMessagesQuery, ListRunsQuery};

pub use aily_session::{Record, RecordPatch, SessionRecords};
