use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MatchError;

pub type UserId = Uuid;

/// Juggling experience, ordered from least to most experienced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn index(self) -> u8 {
        match self {
            ExperienceLevel::Beginner => 0,
            ExperienceLevel::Intermediate => 1,
            ExperienceLevel::Advanced => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "advanced" => Ok(ExperienceLevel::Advanced),
            other => Err(MatchError::InvalidInput(format!(
                "unknown experience level: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub experience: ExperienceLevel,
    #[serde(default)]
    pub known_patterns: BTreeSet<String>,
    #[serde(default)]
    pub want_to_learn_patterns: BTreeSet<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl UserProfile {
    pub fn new(id: UserId, name: impl Into<String>, experience: ExperienceLevel) -> Self {
        Self {
            id,
            name: name.into(),
            experience,
            known_patterns: BTreeSet::new(),
            want_to_learn_patterns: BTreeSet::new(),
            location: None,
        }
    }

    pub fn with_known<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_wanted<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.want_to_learn_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// A blank location string counts as no location.
    pub fn has_location(&self) -> bool {
        self.location
            .as_deref()
            .is_some_and(|loc| !loc.trim().is_empty())
    }
}

/// Payload for creating a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub experience: ExperienceLevel,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub known_patterns: BTreeSet<String>,
    #[serde(default)]
    pub want_to_learn_patterns: BTreeSet<String>,
}

/// Row shape of the `profiles` table. Pattern sets live in `profile_patterns`.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub name: String,
    pub experience: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn into_profile(
        self,
        known_patterns: BTreeSet<String>,
        want_to_learn_patterns: BTreeSet<String>,
    ) -> Result<UserProfile, MatchError> {
        Ok(UserProfile {
            id: self.id,
            name: self.name,
            experience: self.experience.parse()?,
            known_patterns,
            want_to_learn_patterns,
            location: self.location,
        })
    }
}

/// An entry in the pattern library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub props: i32,
    pub difficulty: ExperienceLevel,
    pub siteswap: Option<String>,
}

/// Row shape of the `patterns` table; difficulty is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct PatternRow {
    pub id: String,
    pub name: String,
    pub props: i32,
    pub difficulty: String,
    pub siteswap: Option<String>,
}

impl TryFrom<PatternRow> for Pattern {
    type Error = MatchError;

    fn try_from(row: PatternRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            props: row.props,
            difficulty: row.difficulty.parse()?,
            siteswap: row.siteswap,
        })
    }
}
