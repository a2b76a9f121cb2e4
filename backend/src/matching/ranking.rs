use serde::Serialize;

use crate::matching::compatibility::{compatibility, PatternRelations};
use crate::matching::resolver::{can_send_request, state_for, StateMap};
use crate::models::{ConnectionState, ExperienceLevel, UserId, UserProfile};

/// One row of the match list or of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub user_id: UserId,
    pub name: String,
    pub experience: ExperienceLevel,
    pub location: Option<String>,
    pub score: u8,
    pub relations: PatternRelations,
    pub state: ConnectionState,
    pub can_connect: bool,
}

/// Score every candidate against `viewer`, best first.
///
/// The viewer's own profile is skipped. Ties break on name, then id.
pub fn rank_candidates(
    viewer: &UserProfile,
    candidates: &[UserProfile],
    states: &StateMap,
) -> Vec<MatchCandidate> {
    let mut ranked: Vec<MatchCandidate> = candidates
        .iter()
        .filter(|c| c.id != viewer.id)
        .map(|c| {
            let compat = compatibility(viewer, c);
            let state = state_for(states, c.id);
            MatchCandidate {
                user_id: c.id,
                name: c.name.clone(),
                experience: c.experience,
                location: c.location.clone(),
                score: compat.score,
                relations: compat.relations,
                state,
                can_connect: can_send_request(state),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    ranked
}
