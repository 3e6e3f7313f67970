//! # Message Protocol
//!
//! Defines all message types exchanged between a leaderboard client and the
//! score server:
//! - Anonymous sign-in
//! - Best-effort attestation
//! - Document writes with server-assigned timestamps
//! - Ordered, limited collection queries
//!
//! Messages are serialized to JSON and sent over TCP with a 4-byte length prefix.
//! Each connection carries exactly one request and one response.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document: field name to JSON value.
pub type Document = Map<String, Value>;

/// Collection holding leaderboard entries.
pub const SCORES_COLLECTION: &str = "scores";

// ============================================================================
// MESSAGE TYPES
// ============================================================================

/// Core message enum for all client-server communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    // ========== SESSION ==========
    /// **Anonymous Sign-In**
    ///
    /// Sent by a client to obtain an anonymous session for a project.
    ///
    /// # Fields
    /// - `project_id`: Project the client believes it is talking to
    /// - `api_key`: Public API key of that project
    SignInAnonymously { project_id: String, api_key: String },

    /// **Sign-In Response**
    ///
    /// # Fields
    /// - `uid`: Anonymous user id assigned by the server
    /// - `token`: Session token to present on writes
    SignInResponse { uid: String, token: String },

    /// **Attestation Request**
    ///
    /// Best-effort bot mitigation. The server hands out an attestation token when
    /// the site key matches its own.
    AttestationRequest { project_id: String, site_key: String },

    /// **Attestation Response**
    AttestationResponse { token: String },

    // ========== DOCUMENTS ==========
    /// **Add Document**
    ///
    /// Appends a new document to a collection.
    ///
    /// # Fields
    /// - `token`: Session token from [`Message::SignInResponse`]
    /// - `attestation`: Attestation token, if the client obtained one
    /// - `collection`: Target collection name (e.g. `"scores"`)
    /// - `fields`: Document body
    /// - `server_timestamp_fields`: Fields the server fills with its own clock
    AddDocument {
        token: Option<String>,
        attestation: Option<String>,
        collection: String,
        fields: Document,
        server_timestamp_fields: Vec<String>,
    },

    /// **Document Added**
    ///
    /// Confirms a write. Only sent once the document is stored.
    DocumentAdded { id: String },

    /// **Run Query**
    ///
    /// Reads a collection ordered by one numeric field.
    RunQuery {
        collection: String,
        order_by: String,
        descending: bool,
        limit: usize,
    },

    /// **Query Result**
    ///
    /// Documents in the order the query produced them.
    QueryResult { documents: Vec<Document> },

    // ========== ERRORS ==========
    /// **Error Response**
    ///
    /// Sent instead of the expected response when the server refuses a request.
    ErrorResponse { message: String },
}

impl Message {
    /// Serialize a message to JSON bytes for transmission over the network.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize a message from JSON bytes received from the network.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Wire form of a server timestamp: `{"seconds": i64, "nanos": u32}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    /// Current server time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Parse a stored timestamp value. Returns `None` for anything malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(self) -> Value {
        serde_json::json!({ "seconds": self.seconds, "nanos": self.nanos })
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanos: at.timestamp_subsec_nanos(),
        }
    }
}
