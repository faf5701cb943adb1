//! Request and response types for the Aily API.
//!
//! These types mirror the server's API contract. Identifier fields default
//! to empty strings so a response missing them still decodes and callers
//! can detect the gap.

use serde::{Deserialize, Deserializer, Serialize};

/// Decode an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a new session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Channel context (a JSON string understood by the server).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_context: Option<String>,
    /// Free-form metadata string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// A conversation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID.
    #[serde(default)]
    pub id: String,
    /// Creation time (milliseconds since epoch, as a string).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last modification time.
    #[serde(default)]
    pub modified_at: Option<String>,
    /// Creator identity.
    #[serde(default)]
    pub created_by: Option<String>,
    /// Channel context.
    #[serde(default)]
    pub channel_context: Option<String>,
    /// Session metadata.
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Payload of session create/get responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// The session, if the server returned one.
    #[serde(default)]
    pub session: Option<Session>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SenderType {
    /// The assistant.
    Assistant,
    /// An end user.
    User,
    /// Anything else the server reports.
    Other(String),
}

impl Default for SenderType {
    fn default() -> Self {
        SenderType::Other(String::new())
    }
}

impl From<Option<String>> for SenderType {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for SenderType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ASSISTANT" => SenderType::Assistant,
            "USER" => SenderType::User,
            _ => SenderType::Other(value),
        }
    }
}

impl From<SenderType> for String {
    fn from(value: SenderType) -> Self {
        match value {
            SenderType::Assistant => "ASSISTANT".to_string(),
            SenderType::User => "USER".to_string(),
            SenderType::Other(other) => other,
        }
    }
}

/// Message sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    /// Sender type.
    #[serde(default)]
    pub sender_type: SenderType,
    /// Entity ID in the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Identity provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<String>,
    /// Assistant ID when the sender is an assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aily_id: Option<String>,
}

/// A mention inside a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Mentioned entity ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Identity provider of the entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<String>,
    /// Placeholder key used in the message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Assistant ID when an assistant is mentioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aily_id: Option<String>,
}

/// A message in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Owning session.
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_id: String,
    /// Run that produced the message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Message content.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Content type (e.g. MDX, TEXT).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Message status (e.g. COMPLETED, IN_PROGRESS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Author of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Sender>,
    /// Plain-text rendering of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
    /// Attached file IDs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
    /// Quoted message ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_message_id: Option<String>,
    /// Mentions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Message {
    /// True when the message was authored by the assistant.
    pub fn is_from_assistant(&self) -> bool {
        matches!(
            self.sender,
            Some(Sender {
                sender_type: SenderType::Assistant,
                ..
            })
        )
    }
}

/// Request to create a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    /// Client-generated idempotency token.
    pub idempotent_id: String,
    /// Content type.
    pub content_type: String,
    /// Message content.
    pub content: String,
    /// Attached file IDs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
    /// Quoted message ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_message_id: Option<String>,
    /// Mentions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
}

/// Payload of message create/get responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    /// The message, if the server returned one.
    #[serde(default)]
    pub message: Option<Message>,
}

/// One page of messages, pagination fields already stripped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePage {
    /// Messages in this page.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Single-page list response for messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    /// Messages in this page.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Runs
// ─────────────────────────────────────────────────────────────────────────────

/// Status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Running.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Timed out on the server.
    Expired,
    /// Cancelled.
    Cancelled,
    /// Failed.
    Failed,
    /// A status this client does not know.
    Other(String),
}

impl RunStatus {
    /// True for statuses after which the run never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Expired | RunStatus::Cancelled | RunStatus::Failed
        )
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "QUEUED",
            RunStatus::InProgress => "IN_PROGRESS",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Expired => "EXPIRED",
            RunStatus::Cancelled => "CANCELLED",
            RunStatus::Failed => "FAILED",
            RunStatus::Other(other) => other,
        }
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        RunStatus::Other(String::new())
    }
}

impl From<Option<String>> for RunStatus {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for RunStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "QUEUED" => RunStatus::Queued,
            "IN_PROGRESS" => RunStatus::InProgress,
            "COMPLETED" => RunStatus::Completed,
            "EXPIRED" => RunStatus::Expired,
            "CANCELLED" => RunStatus::Cancelled,
            "FAILED" => RunStatus::Failed,
            _ => RunStatus::Other(value),
        }
    }
}

impl From<RunStatus> for String {
    fn from(value: RunStatus) -> Self {
        match value {
            RunStatus::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to a failed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A run: one unit of remote computation inside a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Run ID.
    #[serde(default)]
    pub id: String,
    /// Owning session.
    #[serde(default)]
    pub session_id: String,
    /// App the run executes.
    #[serde(default)]
    pub app_id: String,
    /// Current status.
    #[serde(default)]
    pub status: RunStatus,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// End time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    /// Error details for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
    /// Run metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Request to create a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// App to run.
    pub app_id: String,
    /// Specific skill within the app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    /// Skill input (JSON string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_input: Option<String>,
    /// Run metadata (JSON string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Payload of run create/get/cancel responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    /// The run, if the server returned one.
    #[serde(default)]
    pub run: Option<Run>,
}

/// One page of runs, pagination fields already stripped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunPage {
    /// Runs in this page.
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// Single-page list response for runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRunsResponse {
    /// Runs in this page.
    #[serde(default)]
    pub runs: Vec<Run>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}
