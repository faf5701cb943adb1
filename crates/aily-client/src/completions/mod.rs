//! Completion pipeline: send a message into a session, run an app on it and
//! return the assistant's reply.
//!
//! The steps run strictly in order:
//! 1. resolve the session id (session records first, then create)
//! 2. create the message
//! 3. create the run
//! 4. poll the run until it is terminal
//! 5. page through the run's messages and keep the last assistant message
//!
//! Every failure becomes an [`ExecStatus`] on the result; nothing here
//! returns `Err`.

mod poll;

use std::time::Duration;

use aily_session::{Record, RecordPatch, SessionRecords};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::ListMessagesQuery;
use crate::client::AilyClient;
use crate::transport::RequestOptions;
use crate::types::{CreateMessageRequest, CreateRunRequest, CreateSessionRequest, Mention, Message};

pub use poll::exec_status;

/// Default delay between run status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Content type used for pipeline messages.
pub const DEFAULT_CONTENT_TYPE: &str = "MDX";

/// Result code of a completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecStatus {
    /// A step failed before the run finished, or no reply was found.
    Error,
    /// The run completed and a reply was found.
    Success,
    /// The run expired.
    Expired,
    /// The run was cancelled.
    Cancelled,
    /// The run failed (or its status could not be checked).
    Failed,
    /// The run ended in a status this client does not know.
    Other,
}

impl ExecStatus {
    /// Numeric code: ERROR -1, SUCCESS 0, EXPIRED 1, CANCELLED 2, FAILED 3, OTHER 4.
    pub fn code(self) -> i32 {
        match self {
            ExecStatus::Error => -1,
            ExecStatus::Success => 0,
            ExecStatus::Expired => 1,
            ExecStatus::Cancelled => 2,
            ExecStatus::Failed => 3,
            ExecStatus::Other => 4,
        }
    }

    /// Upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecStatus::Error => "ERROR",
            ExecStatus::Success => "SUCCESS",
            ExecStatus::Expired => "EXPIRED",
            ExecStatus::Cancelled => "CANCELLED",
            ExecStatus::Failed => "FAILED",
            ExecStatus::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning for the completion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    /// Delay between run status checks.
    pub poll_interval: Duration,
    /// Give up after this many status checks. `None` polls until the run
    /// is terminal.
    pub max_poll_attempts: Option<u32>,
    /// Content type of created messages.
    pub content_type: String,
    /// Page size used while looking for the reply.
    pub reply_page_size: Option<u32>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            reply_page_size: None,
        }
    }
}

impl CompletionSettings {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Cap the number of status checks.
    pub fn with_max_poll_attempts(mut self, max: u32) -> Self {
        self.max_poll_attempts = Some(max);
        self
    }

    /// Set the content type of created messages.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the page size used while looking for the reply.
    pub fn with_reply_page_size(mut self, size: u32) -> Self {
        self.reply_page_size = Some(size);
        self
    }
}

/// Message content for a completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageInput {
    /// Message content.
    pub content: String,
    /// Attached file IDs.
    pub file_ids: Vec<String>,
    /// Quoted message ID.
    pub quote_message_id: Option<String>,
    /// Mentions.
    pub mentions: Vec<Mention>,
}

impl MessageInput {
    /// Plain message content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Input of [`Completions::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Caller-chosen key; sessions created under a key are reused.
    pub session_key: Option<String>,
    /// Parameters for session creation.
    pub session: Option<CreateSessionRequest>,
    /// The message to send.
    pub message: MessageInput,
    /// App to run.
    pub app_id: String,
    /// Skill within the app.
    pub skill_id: Option<String>,
    /// Skill input (JSON string).
    pub skill_input: Option<String>,
    /// Run metadata (JSON string).
    pub run_metadata: Option<String>,
}

impl CompletionRequest {
    /// Request running `app_id` on `content`.
    pub fn new(app_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            message: MessageInput::new(content),
            ..Default::default()
        }
    }

    /// Reuse (or create and remember) the session stored under `key`.
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    /// Set session creation parameters.
    pub fn with_session(mut self, session: CreateSessionRequest) -> Self {
        self.session = Some(session);
        self
    }

    /// Run a specific skill.
    pub fn with_skill(mut self, skill_id: impl Into<String>) -> Self {
        self.skill_id = Some(skill_id.into());
        self
    }
}

/// Outcome of a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    /// Result code.
    pub status: ExecStatus,
    /// The assistant reply, present only on success.
    pub message: Option<Message>,
}

impl CompletionResult {
    fn status(status: ExecStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// True on success.
    pub fn is_success(&self) -> bool {
        self.status == ExecStatus::Success
    }
}

/// Completion pipeline.
pub struct Completions {
    client: AilyClient,
    records: SessionRecords,
    settings: CompletionSettings,
}

impl Completions {
    pub(crate) fn new(
        client: AilyClient,
        records: SessionRecords,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            client,
            records,
            settings,
        }
    }

    /// Session key → session id records.
    pub fn session_records(&self) -> &SessionRecords {
        &self.records
    }

    /// Current session key → session id mapping.
    pub async fn records(&self) -> Record {
        self.records.get().await
    }

    /// Seed or merge session records.
    pub async fn update_records(&self, records: RecordPatch) -> bool {
        self.records.update(records).await
    }

    /// Send a message, run `app_id` on it and wait for the reply.
    pub async fn create(
        &self,
        request: CompletionRequest,
        options: &RequestOptions,
    ) -> CompletionResult {
        let CompletionRequest {
            session_key,
            session,
            message,
            app_id,
            skill_id,
            skill_input,
            run_metadata,
        } = request;

        let session = session.unwrap_or_default();
        let Some(session_id) = self
            .get_session_id(session_key.as_deref(), &session, options)
            .await
        else {
            return CompletionResult::status(ExecStatus::Error);
        };

        let message_request = CreateMessageRequest {
            idempotent_id: idempotency_token(),
            content_type: self.settings.content_type.clone(),
            content: message.content,
            file_ids: message.file_ids,
            quote_message_id: message.quote_message_id,
            mentions: message.mentions,
        };
        match self
            .client
            .messages()
            .create(&session_id, message_request, options)
            .await
        {
            Ok(envelope) if envelope.is_success() => {}
            Ok(envelope) => {
                warn!(
                    session_id = %session_id,
                    code = envelope.code,
                    msg = %envelope.msg,
                    "Failed to create message"
                );
                return CompletionResult::status(ExecStatus::Error);
            }
            Err(_) => return CompletionResult::status(ExecStatus::Error),
        }

        let run_request = CreateRunRequest {
            app_id,
            skill_id,
            skill_input,
            metadata: run_metadata,
        };
        let run = match self
            .client
            .runs()
            .create(&session_id, run_request, options)
            .await
        {
            Ok(envelope) if envelope.is_success() => envelope.data.and_then(|d| d.run),
            Ok(envelope) => {
                warn!(
                    session_id = %session_id,
                    code = envelope.code,
                    msg = %envelope.msg,
                    "Failed to create run"
                );
                return CompletionResult::status(ExecStatus::Error);
            }
            Err(_) => return CompletionResult::status(ExecStatus::Error),
        };
        let run_id = match run {
            Some(run) if !run.id.is_empty() => run.id,
            _ => {
                warn!(session_id = %session_id, "Created run has no id");
                return CompletionResult::status(ExecStatus::Error);
            }
        };
        debug!(session_id = %session_id, run_id = %run_id, "Run created");

        let status = poll::wait_for_run(
            &self.client.runs(),
            &session_id,
            &run_id,
            &self.settings,
            options,
        )
        .await;
        if status != ExecStatus::Success {
            info!(session_id = %session_id, run_id = %run_id, status = %status, "Run did not complete");
            return CompletionResult::status(status);
        }

        match self.find_reply(&session_id, &run_id, options).await {
            Some(reply) => CompletionResult {
                status: ExecStatus::Success,
                message: Some(reply),
            },
            None => {
                warn!(session_id = %session_id, run_id = %run_id, "No assistant reply found");
                CompletionResult::status(ExecStatus::Error)
            }
        }
    }

    /// Resolve the session to use.
    ///
    /// A `session_key` already present in the records is reused without any
    /// request. Otherwise a session is created and, when a key was given,
    /// remembered. Returns `None` when creation fails.
    pub async fn get_session_id(
        &self,
        session_key: Option<&str>,
        session: &CreateSessionRequest,
        options: &RequestOptions,
    ) -> Option<String> {
        if let Some(key) = session_key {
            if let Some(id) = self.records.session_id(key).await {
                debug!(session_key = %key, session_id = %id, "Reusing recorded session");
                return Some(id);
            }
        }

        let envelope = self
            .client
            .sessions()
            .create(session.clone(), options)
            .await
            .ok()?;
        if !envelope.is_success() {
            warn!(code = envelope.code, msg = %envelope.msg, "Failed to create session");
            return None;
        }

        let id = match envelope.data.and_then(|d| d.session) {
            Some(created) if !created.id.is_empty() => created.id,
            _ => {
                warn!("Created session has no id");
                return None;
            }
        };

        if let Some(key) = session_key {
            if !self.records.insert(key, &id).await {
                warn!(session_key = %key, session_id = %id, "Failed to record session");
            }
        }

        Some(id)
    }

    /// Page through the run's messages and keep the last assistant message.
    async fn find_reply(
        &self,
        session_id: &str,
        run_id: &str,
        options: &RequestOptions,
    ) -> Option<Message> {
        let query = ListMessagesQuery {
            page_size: self.settings.reply_page_size,
            run_id: Some(run_id.to_string()),
            ..Default::default()
        };
        let mut pages = self
            .client
            .messages()
            .list_with_iterator(session_id, &query, options);

        let mut reply = None;
        while let Some(page) = pages.next_page().await {
            let Some(page) = page else {
                break;
            };
            if let Some(last) = page
                .messages
                .into_iter()
                .rev()
                .find(Message::is_from_assistant)
            {
                reply = Some(last);
            }
        }
        reply
    }
}

/// Idempotency token for message creation: current time in milliseconds
/// plus a short random suffix so concurrent calls never collide.
fn idempotency_token() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
