use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::*;
use crate::error::MatchError;
use crate::models::UserProfile;

/// How two users' pattern sets relate, from the viewer's side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRelations {
    /// Known by both.
    pub shared: BTreeSet<String>,
    /// Candidate knows, viewer wants to learn.
    pub can_teach: BTreeSet<String>,
    /// Viewer knows, candidate wants to learn.
    pub can_learn: BTreeSet<String>,
}

/// Score plus the relations behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub score: u8,
    pub relations: PatternRelations,
}

fn intersection(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    a.intersection(b).cloned().collect()
}

pub fn derive_pattern_relations(viewer: &UserProfile, candidate: &UserProfile) -> PatternRelations {
    PatternRelations {
        shared: intersection(&viewer.known_patterns, &candidate.known_patterns),
        can_teach: intersection(&candidate.known_patterns, &viewer.want_to_learn_patterns),
        can_learn: intersection(&viewer.known_patterns, &candidate.want_to_learn_patterns),
    }
}

fn experience_points(viewer: &UserProfile, candidate: &UserProfile) -> u32 {
    let d = (viewer.experience.index() as i32 - candidate.experience.index() as i32).abs();
    (EXPERIENCE_MAX_POINTS - d * EXPERIENCE_STEP_PENALTY).max(0) as u32
}

fn score_from_relations(
    viewer: &UserProfile,
    candidate: &UserProfile,
    relations: &PatternRelations,
) -> u8 {
    let experience = experience_points(viewer, candidate);
    let shared = (relations.shared.len() * SHARED_PATTERN_POINTS).min(SHARED_PATTERN_MAX_POINTS) as u32;
    let teaching = ((relations.can_teach.len() + relations.can_learn.len()) * TEACHING_PATTERN_POINTS)
        .min(TEACHING_MAX_POINTS) as u32;
    let location = if candidate.has_location() { LOCATION_POINTS } else { 0 };

    (experience + shared + teaching + location).min(MAX_SCORE) as u8
}

/// Additive score in `[0, 100]`. Not symmetric: the teaching term and the
/// location term look at the pair from the viewer's side.
pub fn compute_score(viewer: &UserProfile, candidate: &UserProfile) -> u8 {
    let relations = derive_pattern_relations(viewer, candidate);
    score_from_relations(viewer, candidate, &relations)
}

pub fn compatibility(viewer: &UserProfile, candidate: &UserProfile) -> Compatibility {
    let relations = derive_pattern_relations(viewer, candidate);
    let score = score_from_relations(viewer, candidate, &relations);
    Compatibility { score, relations }
}

/// Entry point for callers whose profiles come from a lookup that may miss.
pub fn score_pair(
    viewer: Option<&UserProfile>,
    candidate: Option<&UserProfile>,
) -> Result<Compatibility, MatchError> {
    let viewer = viewer.ok_or_else(|| MatchError::InvalidInput("viewer profile is missing".to_string()))?;
    let candidate =
        candidate.ok_or_else(|| MatchError::InvalidInput("candidate profile is missing".to_string()))?;
    Ok(compatibility(viewer, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExperienceLevel::*;
    use crate::models::ExperienceLevel;
    use uuid::Uuid;

    fn profile(n: u128, experience: ExperienceLevel) -> UserProfile {
        UserProfile::new(Uuid::from_u128(n), format!("user{}", n), experience)
    }

    #[test]
    fn test_worked_example_scores_65() {
        let viewer = profile(1, Intermediate).with_known(["A", "B"]).with_wanted(["C"]);
        let candidate = profile(2, Intermediate).with_known(["B", "C"]).with_location("X");

        assert_eq!(compute_score(&viewer, &candidate), 65);

        let rel = derive_pattern_relations(&viewer, &candidate);
        assert_eq!(rel.shared, BTreeSet::from(["B".to_string()]));
        assert_eq!(rel.can_teach, BTreeSet::from(["C".to_string()]));
        assert!(rel.can_learn.is_empty());
    }

    #[test]
    fn test_experience_term_by_distance() {
        let beginner = profile(1, Beginner);
        assert_eq!(compute_score(&beginner, &profile(2, Beginner)), 40);
        assert_eq!(compute_score(&beginner, &profile(2, Intermediate)), 25);
        assert_eq!(compute_score(&beginner, &profile(2, Advanced)), 10);
        assert_eq!(compute_score(&profile(3, Advanced), &beginner), 10);
    }

    #[test]
    fn test_self_comparison() {
        let p = profile(1, Advanced).with_known(["cascade", "shower"]).with_wanted(["mills mess"]);
        assert_eq!(compute_score(&p, &p), 40 + 20);

        let crowded = profile(2, Beginner)
            .with_known(["a", "b", "c", "d", "e"])
            .with_location("Leeds");
        assert_eq!(compute_score(&crowded, &crowded), 40 + 30 + 10);
    }

    #[test]
    fn test_terms_are_capped_and_total_bounded() {
        let many: Vec<String> = (0..12).map(|i| format!("p{}", i)).collect();
        let viewer = profile(1, Beginner)
            .with_known(many[..6].iter().cloned())
            .with_wanted(many[6..].iter().cloned());
        let candidate = profile(2, Beginner)
            .with_known(many.iter().cloned())
            .with_wanted(many[..6].iter().cloned())
            .with_location("Oslo");

        // 40 + min(30, 60) + min(20, 60) + 10
        assert_eq!(compute_score(&viewer, &candidate), 100);
    }

    #[test]
    fn test_teaching_is_directional() {
        let viewer = profile(1, Intermediate).with_wanted(["441"]);
        let candidate = profile(2, Intermediate).with_known(["441"]);

        let forward = compatibility(&viewer, &candidate);
        let backward = compatibility(&candidate, &viewer);
        assert_eq!(forward.relations.can_teach.len(), 1);
        assert!(forward.relations.can_learn.is_empty());
        assert_eq!(backward.relations.can_learn.len(), 1);
        assert_eq!(forward.score, backward.score);
    }

    #[test]
    fn test_location_only_counts_on_candidate() {
        let viewer = profile(1, Beginner).with_location("Paris");
        let candidate = profile(2, Beginner);
        assert_eq!(compute_score(&viewer, &candidate), 40);
        assert_eq!(compute_score(&candidate, &viewer), 50);
        assert_eq!(compute_score(&viewer, &candidate.with_location("")), 40);
    }

    #[test]
    fn test_relations_are_subsets() {
        let viewer = profile(1, Beginner).with_known(["a", "b", "c"]).with_wanted(["d", "e"]);
        let candidate = profile(2, Advanced).with_known(["b", "d", "f"]).with_wanted(["a", "z"]);
        let rel = derive_pattern_relations(&viewer, &candidate);

        assert!(rel.shared.is_subset(&viewer.known_patterns));
        assert!(rel.shared.is_subset(&candidate.known_patterns));
        assert!(rel.can_teach.is_subset(&viewer.want_to_learn_patterns));
        assert!(rel.can_learn.is_subset(&candidate.want_to_learn_patterns));
        assert_eq!(rel.can_learn, BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn test_score_pair_rejects_missing_profiles() {
        let p = profile(1, Beginner);
        assert!(matches!(score_pair(None, Some(&p)), Err(MatchError::InvalidInput(_))));
        assert!(matches!(score_pair(Some(&p), None), Err(MatchError::InvalidInput(_))));
        assert_eq!(score_pair(Some(&p), Some(&p)).unwrap().score, 40);
    }
}
