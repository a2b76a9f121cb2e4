use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::MatchError;
use crate::models::{Connection, ConnectionRequest, ConnectionState, UserId};

pub type StateMap = HashMap<UserId, ConnectionState>;

/// Records that `resolve` skipped, with the reason for each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    pub skipped: Vec<MatchError>,
}

fn merge(states: &mut StateMap, candidate: UserId, state: ConnectionState) {
    let entry = states.entry(candidate).or_default();
    if state > *entry {
        *entry = state;
    }
}

fn skip(report: &mut ResolveReport, reason: String) {
    warn!("Skipping record during connection resolve: {}", reason);
    report.skipped.push(MatchError::MalformedRecord(reason));
}

/// Collapse connections and pending requests into one state per candidate.
///
/// Each record proposes a state and the highest-precedence proposal wins,
/// so the result does not depend on input order. Candidates missing from
/// the map are `ConnectionState::None`.
pub fn resolve(
    current_user_id: UserId,
    connections: &[Connection],
    incoming: &[ConnectionRequest],
    outgoing: &[ConnectionRequest],
) -> Result<StateMap, MatchError> {
    resolve_with_report(current_user_id, connections, incoming, outgoing).map(|(states, _)| states)
}

pub fn resolve_with_report(
    current_user_id: UserId,
    connections: &[Connection],
    incoming: &[ConnectionRequest],
    outgoing: &[ConnectionRequest],
) -> Result<(StateMap, ResolveReport), MatchError> {
    if current_user_id.is_nil() {
        return Err(MatchError::InvalidInput("current user id is missing".to_string()));
    }

    let mut states = StateMap::new();
    let mut report = ResolveReport::default();

    for conn in connections {
        match conn.other(current_user_id) {
            Some(other) if other != current_user_id => {
                merge(&mut states, other, ConnectionState::Connected)
            }
            Some(_) => skip(&mut report, format!("connection of {} with itself", current_user_id)),
            None => skip(
                &mut report,
                format!(
                    "connection {} <-> {} does not involve {}",
                    conn.user_id_1, conn.user_id_2, current_user_id
                ),
            ),
        }
    }

    for req in incoming {
        if !req.is_pending() {
            continue;
        }
        if req.to_user_id != current_user_id || req.from_user_id == current_user_id {
            skip(&mut report, format!("incoming request {} is not addressed to {}", req.id, current_user_id));
            continue;
        }
        merge(&mut states, req.from_user_id, ConnectionState::PendingIn);
    }

    for req in outgoing {
        if !req.is_pending() {
            continue;
        }
        if req.from_user_id != current_user_id || req.to_user_id == current_user_id {
            skip(&mut report, format!("outgoing request {} was not sent by {}", req.id, current_user_id));
            continue;
        }
        merge(&mut states, req.to_user_id, ConnectionState::PendingOut);
    }

    debug!(
        "Resolved {} connection states for {} ({} records skipped)",
        states.len(),
        current_user_id,
        report.skipped.len()
    );

    Ok((states, report))
}

/// Only a user with no relationship at all can be sent a new request.
pub fn can_send_request(state: ConnectionState) -> bool {
    state == ConnectionState::None
}

pub fn state_for(states: &StateMap, candidate: UserId) -> ConnectionState {
    states.get(&candidate).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;
    use uuid::Uuid;

    fn uid(n: u128) -> UserId {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_pending_in_and_out() {
        let (u1, u2, u3, u4) = (uid(1), uid(2), uid(3), uid(4));
        let incoming = vec![ConnectionRequest::pending(u2, u1)];
        let outgoing = vec![ConnectionRequest::pending(u1, u3)];

        let states = resolve(u1, &[], &incoming, &outgoing).unwrap();

        assert_eq!(states.len(), 2);
        assert_eq!(states[&u2], ConnectionState::PendingIn);
        assert_eq!(states[&u3], ConnectionState::PendingOut);
        assert!(!can_send_request(state_for(&states, u2)));
        assert!(!can_send_request(state_for(&states, u3)));
        assert!(can_send_request(state_for(&states, u4)));
    }

    #[test]
    fn test_connected_overrides_stale_pending() {
        let (u1, u2, u3) = (uid(1), uid(2), uid(3));
        let connections = vec![Connection::new(u1, u2)];
        let incoming = vec![ConnectionRequest::pending(u2, u1)];
        let outgoing = vec![ConnectionRequest::pending(u1, u3), ConnectionRequest::pending(u1, u2)];

        let states = resolve(u1, &connections, &incoming, &outgoing).unwrap();

        assert_eq!(states.len(), 2);
        assert_eq!(states[&u2], ConnectionState::Connected);
        assert_eq!(states[&u3], ConnectionState::PendingOut);
    }

    #[test]
    fn test_connection_checked_in_either_position() {
        let (u1, u2) = (uid(1), uid(2));
        let states = resolve(u1, &[Connection::new(u2, u1)], &[], &[]).unwrap();
        assert_eq!(states[&u2], ConnectionState::Connected);
    }

    #[test]
    fn test_incoming_beats_outgoing() {
        let (u1, u2) = (uid(1), uid(2));
        let incoming = vec![ConnectionRequest::pending(u2, u1)];
        let outgoing = vec![ConnectionRequest::pending(u1, u2)];
        let states = resolve(u1, &[], &incoming, &outgoing).unwrap();
        assert_eq!(states[&u2], ConnectionState::PendingIn);
    }

    #[test]
    fn test_order_independent_and_idempotent() {
        let (u1, u2, u3) = (uid(1), uid(2), uid(3));
        let connections = vec![Connection::new(u3, u1)];
        let mut incoming = vec![ConnectionRequest::pending(u2, u1), ConnectionRequest::pending(u3, u1)];
        let mut outgoing = vec![ConnectionRequest::pending(u1, u2), ConnectionRequest::pending(u1, u3)];

        let first = resolve(u1, &connections, &incoming, &outgoing).unwrap();
        let second = resolve(u1, &connections, &incoming, &outgoing).unwrap();
        incoming.reverse();
        outgoing.reverse();
        let reversed = resolve(u1, &connections, &incoming, &outgoing).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, reversed);
        assert_eq!(first[&u2], ConnectionState::PendingIn);
        assert_eq!(first[&u3], ConnectionState::Connected);
    }

    #[test]
    fn test_non_pending_requests_ignored() {
        let (u1, u2, u3) = (uid(1), uid(2), uid(3));
        let mut declined = ConnectionRequest::pending(u2, u1);
        declined.status = RequestStatus::Declined;
        let mut accepted = ConnectionRequest::pending(u1, u3);
        accepted.status = RequestStatus::Accepted;

        let (states, report) = resolve_with_report(u1, &[], &[declined], &[accepted]).unwrap();
        assert!(states.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_malformed_records_skipped() {
        let (u1, u2, u3, u4) = (uid(1), uid(2), uid(3), uid(4));
        let connections = vec![Connection::new(u2, u3), Connection::new(u1, u1), Connection::new(u1, u4)];
        let incoming = vec![ConnectionRequest::pending(u2, u3)];
        let outgoing = vec![ConnectionRequest::pending(u3, u2)];

        let (states, report) = resolve_with_report(u1, &connections, &incoming, &outgoing).unwrap();

        assert_eq!(states.len(), 1);
        assert_eq!(states[&u4], ConnectionState::Connected);
        assert_eq!(report.skipped.len(), 4);
        assert!(report
            .skipped
            .iter()
            .all(|e| matches!(e, MatchError::MalformedRecord(_))));
    }

    #[test]
    fn test_nil_current_user_is_invalid() {
        let err = resolve(Uuid::nil(), &[], &[], &[]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput(_)));
    }

    #[test]
    fn test_can_send_request_truth_table() {
        assert!(can_send_request(ConnectionState::None));
        assert!(!can_send_request(ConnectionState::PendingOut));
        assert!(!can_send_request(ConnectionState::PendingIn));
        assert!(!can_send_request(ConnectionState::Connected));
    }
}
