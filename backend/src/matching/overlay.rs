use std::collections::HashMap;
use tracing::debug;

use crate::matching::resolver::{state_for, StateMap};
use crate::models::{ConnectionState, UserId};

/// Provisional states applied right after a local action succeeds, ahead of
/// the next authoritative resolve.
///
/// Every entry is dropped by `reconcile`, so an override never survives
/// more than one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct PendingOverlay {
    overrides: HashMap<UserId, ConnectionState>,
}

/// Outcome of folding a fresh resolve into the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub confirmed: usize,
    pub discarded: usize,
}

impl PendingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, candidate: UserId, state: ConnectionState) {
        self.overrides.insert(candidate, state);
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn view(&self, resolved: &StateMap, candidate: UserId) -> ConnectionState {
        self.overrides
            .get(&candidate)
            .copied()
            .unwrap_or_else(|| state_for(resolved, candidate))
    }

    /// Drop all overrides in favour of `resolved`.
    pub fn reconcile(&mut self, resolved: &StateMap) -> Reconciliation {
        let mut outcome = Reconciliation::default();
        for (candidate, provisional) in self.overrides.drain() {
            if state_for(resolved, candidate) == provisional {
                outcome.confirmed += 1;
            } else {
                debug!(
                    "Discarding provisional {} for {}, authoritative state is {}",
                    provisional,
                    candidate,
                    state_for(resolved, candidate)
                );
                outcome.discarded += 1;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::resolver::{can_send_request, resolve};
    use crate::models::ConnectionRequest;
    use uuid::Uuid;

    #[test]
    fn test_override_shadows_resolved_until_reconcile() {
        let (me, them) = (Uuid::from_u128(1), Uuid::from_u128(2));
        let mut overlay = PendingOverlay::new();
        let before = resolve(me, &[], &[], &[]).unwrap();
        assert!(can_send_request(overlay.view(&before, them)));

        overlay.mark(them, ConnectionState::PendingOut);
        assert_eq!(overlay.view(&before, them), ConnectionState::PendingOut);
        assert!(!can_send_request(overlay.view(&before, them)));

        let after = resolve(me, &[], &[], &[ConnectionRequest::pending(me, them)]).unwrap();
        let outcome = overlay.reconcile(&after);

        assert_eq!(outcome, Reconciliation { confirmed: 1, discarded: 0 });
        assert!(overlay.is_empty());
        assert_eq!(overlay.view(&after, them), ConnectionState::PendingOut);
    }

    #[test]
    fn test_unconfirmed_override_is_discarded() {
        let (me, them) = (Uuid::from_u128(1), Uuid::from_u128(2));
        let mut overlay = PendingOverlay::new();
        overlay.mark(them, ConnectionState::PendingOut);
        assert_eq!(overlay.len(), 1);

        let refreshed = resolve(me, &[], &[], &[]).unwrap();
        let outcome = overlay.reconcile(&refreshed);

        assert_eq!(outcome.discarded, 1);
        assert_eq!(overlay.view(&refreshed, them), ConnectionState::None);
    }
}
