//! Per-product polling state machine.
//!
//! A session starts in [`SessionState::Polling`] with the digest of the
//! installed file. Each reply from `update_secure` is fed to
//! [`UpdateSession::advance`]:
//!
//! ```text
//! Polling --NoUpdate--> Done(Publish | NothingToPublish)
//! Polling --Malformed--> Failed
//! Polling --GzipPayload--> Decompressing --> Polling
//!                                       \--> Failed (corrupt stream, round limit)
//! ```
//!
//! The session performs no I/O; the caller issues the polls and publishes
//! the final payload.

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use std::io::Read;

use crate::digest::ContentDigest;
use crate::error::{Result, UpdateError};
use crate::identity::ProductId;

/// Body prefix the service uses to say the client is current.
pub const NO_UPDATE_MARKER: &[u8] = b"No new updates available";

/// Leading bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Maximum number of payload rounds accepted in one session.
pub const MAX_ROUNDS: u32 = 5;

/// Classified reply to a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    /// The service has nothing newer than the digest we sent.
    NoUpdate,
    /// A gzip-compressed database.
    GzipPayload(Bytes),
    /// Anything else.
    Malformed,
}

impl ServerReply {
    /// Classify a raw poll body by its prefix.
    pub fn classify(body: Bytes) -> Self {
        if body.starts_with(NO_UPDATE_MARKER) {
            ServerReply::NoUpdate
        } else if body.starts_with(&GZIP_MAGIC) {
            ServerReply::GzipPayload(body)
        } else {
            ServerReply::Malformed
        }
    }
}

/// Counter for accepted payload rounds with a hard upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundBudget {
    used: u32,
    limit: u32,
}

impl RoundBudget {
    pub fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    /// Account for one more payload round.
    ///
    /// Fails once the round count would exceed the limit; the count is not
    /// advanced in that case.
    pub fn consume(&mut self) -> Result<u32> {
        if self.used >= self.limit {
            return Err(UpdateError::TooManyRounds { limit: self.limit });
        }
        self.used += 1;
        Ok(self.used)
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for RoundBudget {
    fn default() -> Self {
        Self::new(MAX_ROUNDS)
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A newer payload was retrieved and should be published.
    Publish,
    /// The installed file is already current.
    NothingToPublish,
}

/// State of an [`UpdateSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next poll reply.
    Polling,
    /// Inflating a gzip payload.
    Decompressing,
    /// No further rounds remain.
    Done(Completion),
    /// The session aborted; the error was returned from `advance`.
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done(_) | SessionState::Failed)
    }
}

/// Working state of one product's poll loop.
#[derive(Debug)]
pub struct UpdateSession {
    product_id: ProductId,
    remote_filename: String,
    current_digest: ContentDigest,
    challenge: ContentDigest,
    rounds: RoundBudget,
    latest_payload: Vec<u8>,
    state: SessionState,
}

impl UpdateSession {
    /// Start a session from the digest of the currently installed file.
    pub fn new(
        product_id: ProductId,
        remote_filename: impl Into<String>,
        local_digest: ContentDigest,
        challenge: ContentDigest,
    ) -> Self {
        Self::with_budget(
            product_id,
            remote_filename,
            local_digest,
            challenge,
            RoundBudget::default(),
        )
    }

    /// Start a session with a custom round budget.
    pub fn with_budget(
        product_id: ProductId,
        remote_filename: impl Into<String>,
        local_digest: ContentDigest,
        challenge: ContentDigest,
        rounds: RoundBudget,
    ) -> Self {
        Self {
            product_id,
            remote_filename: remote_filename.into(),
            current_digest: local_digest,
            challenge,
            rounds,
            latest_payload: Vec::new(),
            state: SessionState::Polling,
        }
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn remote_filename(&self) -> &str {
        &self.remote_filename
    }

    /// Digest to send as `db_md5` on the next poll.
    pub fn current_digest(&self) -> ContentDigest {
        self.current_digest
    }

    pub fn challenge(&self) -> ContentDigest {
        self.challenge
    }

    /// Number of payload rounds accepted so far.
    pub fn rounds(&self) -> u32 {
        self.rounds.used()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Most recently decompressed payload (empty before the first round).
    pub fn latest_payload(&self) -> &[u8] {
        &self.latest_payload
    }

    /// Feed the next poll reply into the session.
    ///
    /// On error the session is left in [`SessionState::Failed`].
    pub fn advance(&mut self, reply: ServerReply) -> Result<SessionState> {
        if self.state != SessionState::Polling {
            return Err(UpdateError::InvalidState("session is not polling"));
        }

        let result = match reply {
            ServerReply::NoUpdate => Ok(self.finish()),
            ServerReply::Malformed => Err(UpdateError::UnexpectedPayload),
            ServerReply::GzipPayload(data) => self.accept_payload(&data),
        };

        match result {
            Ok(state) => {
                tracing::debug!(
                    "product {} session -> {:?} after {} round(s)",
                    self.product_id,
                    state,
                    self.rounds.used()
                );
                Ok(state)
            }
            Err(err) => {
                self.state = SessionState::Failed;
                Err(err)
            }
        }
    }

    /// Consume a finished session, yielding the payload to publish if any.
    pub fn into_payload(self) -> Result<Option<Vec<u8>>> {
        match self.state {
            SessionState::Done(Completion::Publish) => Ok(Some(self.latest_payload)),
            SessionState::Done(Completion::NothingToPublish) => Ok(None),
            _ => Err(UpdateError::InvalidState("session has not completed")),
        }
    }

    fn finish(&mut self) -> SessionState {
        let completion = if self.latest_payload.is_empty() {
            Completion::NothingToPublish
        } else {
            Completion::Publish
        };
        self.state = SessionState::Done(completion);
        self.state
    }

    fn accept_payload(&mut self, data: &[u8]) -> Result<SessionState> {
        self.rounds.consume()?;
        self.state = SessionState::Decompressing;

        let payload = gunzip(data)?;
        self.current_digest = ContentDigest::of_bytes(&payload);
        self.latest_payload = payload;
        self.state = SessionState::Polling;
        Ok(self.state)
    }
}

/// Inflate every gzip member in `data`, concatenating their contents.
fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(UpdateError::Decompress)?;
    Ok(out)
}
