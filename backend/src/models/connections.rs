use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MatchError;
use crate::models::profiles::UserId;

/// A finalized, mutual link between two users. Position carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Connection {
    pub user_id_1: UserId,
    pub user_id_2: UserId,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(a: UserId, b: UserId) -> Self {
        Self {
            user_id_1: a,
            user_id_2: b,
            created_at: Utc::now(),
        }
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.user_id_1 == user_id || self.user_id_2 == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is one of them.
    pub fn other(&self, user_id: UserId) -> Option<UserId> {
        if self.user_id_1 == user_id {
            Some(self.user_id_2)
        } else if self.user_id_2 == user_id {
            Some(self.user_id_1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }

    pub fn is_final(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "declined" => Ok(RequestStatus::Declined),
            other => Err(MatchError::MalformedRecord(format!(
                "unknown request status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

impl ConnectionRequest {
    pub fn pending(from_user_id: UserId, to_user_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_user_id,
            to_user_id,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Row shape of `connection_requests`; status is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectionRequestRow {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<ConnectionRequestRow> for ConnectionRequest {
    type Error = MatchError;

    fn try_from(row: ConnectionRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            responded_at: row.responded_at,
        })
    }
}

/// Relationship between the current user and one candidate.
///
/// Variants are declared in precedence order, so `Ord` ranks
/// `Connected > PendingIn > PendingOut > None`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    None,
    PendingOut,
    PendingIn,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::None => "none",
            ConnectionState::PendingOut => "pending_out",
            ConnectionState::PendingIn => "pending_in",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}
