//! Progress notifications emitted while the agent pipeline runs.
//!
//! Events only ever exist on the stream. The wire shape is:
//!
//! ```json
//! {
//!   "type": "status",
//!   "agentId": "gift-match",
//!   "status": "running",
//!   "timestamp": "2026-12-01T10:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Status,
    Output,
    Error,
    Complete,
    Detail,
}

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AgentId {
    Image,
    Profile,
    GiftMatch,
    Narration,
}

impl AgentId {
    pub const ORDER: [AgentId; 4] = [
        AgentId::Image,
        AgentId::Profile,
        AgentId::GiftMatch,
        AgentId::Narration,
    ];
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Profile => write!(f, "profile"),
            Self::GiftMatch => write!(f, "gift-match"),
            Self::Narration => write!(f, "narration"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub agent_id: AgentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AgentEvent {
    fn new(kind: EventType, agent_id: AgentId) -> Self {
        Self {
            kind,
            agent_id,
            status: None,
            data: None,
            error: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn running(agent_id: AgentId) -> Self {
        Self {
            status: Some(StageStatus::Running),
            ..Self::new(EventType::Status, agent_id)
        }
    }

    pub fn completed(agent_id: AgentId) -> Self {
        Self {
            status: Some(StageStatus::Completed),
            ..Self::new(EventType::Status, agent_id)
        }
    }

    pub fn output(agent_id: AgentId, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(EventType::Output, agent_id)
        }
    }

    pub fn detail(agent_id: AgentId, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(EventType::Detail, agent_id)
        }
    }

    /// Terminal failure of a stage. Nothing follows it on the stream.
    pub fn failed(agent_id: AgentId, error: impl Into<String>) -> Self {
        Self {
            status: Some(StageStatus::Failed),
            error: Some(error.into()),
            ..Self::new(EventType::Error, agent_id)
        }
    }

    /// Final event of a successful run, attributed to the last stage.
    pub fn complete(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(EventType::Complete, AgentId::Narration)
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventType::Complete | EventType::Error)
    }
}
