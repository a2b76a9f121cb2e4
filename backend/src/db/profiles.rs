use crate::models::{ExperienceLevel, NewProfile, ProfileRow, UserProfile};
use anyhow::Result;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

const KIND_KNOWN: &str = "known";
const KIND_WANT_TO_LEARN: &str = "want_to_learn";

type PatternSets = (BTreeSet<String>, BTreeSet<String>);

async fn load_pattern_sets(pool: &PgPool, profile_ids: &[Uuid]) -> Result<HashMap<Uuid, PatternSets>> {
    let rows = sqlx::query_as::<_, (Uuid, String, String)>(
        r#"
        SELECT profile_id, pattern_id, kind
        FROM profile_patterns
        WHERE profile_id = ANY($1)
        "#,
    )
    .bind(profile_ids)
    .fetch_all(pool)
    .await?;

    let mut sets: HashMap<Uuid, PatternSets> = HashMap::new();
    for (profile_id, pattern_id, kind) in rows {
        let entry = sets.entry(profile_id).or_default();
        match kind.as_str() {
            KIND_KNOWN => {
                entry.0.insert(pattern_id);
            }
            KIND_WANT_TO_LEARN => {
                entry.1.insert(pattern_id);
            }
            other => tracing::warn!("Ignoring profile pattern {} with unknown kind {}", pattern_id, other),
        }
    }

    Ok(sets)
}

async fn hydrate(pool: &PgPool, rows: Vec<ProfileRow>) -> Result<Vec<UserProfile>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut sets = load_pattern_sets(pool, &ids).await?;

    let mut profiles = Vec::with_capacity(rows.len());
    for row in rows {
        let (known, wanted) = sets.remove(&row.id).unwrap_or_default();
        profiles.push(row.into_profile(known, wanted)?);
    }

    Ok(profiles)
}

async fn insert_patterns(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Uuid,
    patterns: &BTreeSet<String>,
    kind: &str,
) -> Result<()> {
    for pattern_id in patterns {
        sqlx::query(
            r#"
            INSERT INTO profile_patterns (profile_id, pattern_id, kind)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(profile_id)
        .bind(pattern_id)
        .bind(kind)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub async fn create_profile(pool: &PgPool, new: &NewProfile) -> Result<UserProfile> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles (name, experience, location)
        VALUES ($1, $2, $3)
        RETURNING id, name, experience, location, created_at, updated_at
        "#,
    )
    .bind(new.name.trim())
    .bind(new.experience.as_str())
    .bind(new.location.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    insert_patterns(&mut tx, row.id, &new.known_patterns, KIND_KNOWN).await?;
    insert_patterns(&mut tx, row.id, &new.want_to_learn_patterns, KIND_WANT_TO_LEARN).await?;
    tx.commit().await?;

    Ok(row.into_profile(new.known_patterns.clone(), new.want_to_learn_patterns.clone())?)
}

pub async fn get_profile(pool: &PgPool, profile_id: Uuid) -> Result<Option<UserProfile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, name, experience, location, created_at, updated_at
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(profile_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(hydrate(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Case-insensitive name search, optionally narrowed to one experience level.
pub async fn search_profiles(
    pool: &PgPool,
    query: Option<&str>,
    experience: Option<ExperienceLevel>,
    limit: i64,
) -> Result<Vec<UserProfile>> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());

    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, name, experience, location, created_at, updated_at
        FROM profiles
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
        AND ($2::text IS NULL OR experience = $2)
        ORDER BY name ASC
        LIMIT $3
        "#,
    )
    .bind(query)
    .bind(experience.map(|e| e.as_str()))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

pub async fn list_profiles_except(pool: &PgPool, profile_id: Uuid, limit: i64) -> Result<Vec<UserProfile>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, name, experience, location, created_at, updated_at
        FROM profiles
        WHERE id <> $1
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(profile_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Replace both pattern sets. Returns `None` if the profile does not exist.
pub async fn set_profile_patterns(
    pool: &PgPool,
    profile_id: Uuid,
    known: &BTreeSet<String>,
    want_to_learn: &BTreeSet<String>,
) -> Result<Option<UserProfile>> {
    let mut tx = pool.begin().await?;

    let touched = sqlx::query(
        r#"
        UPDATE profiles
        SET updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(profile_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if touched == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    sqlx::query("DELETE FROM profile_patterns WHERE profile_id = $1")
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

    insert_patterns(&mut tx, profile_id, known, KIND_KNOWN).await?;
    insert_patterns(&mut tx, profile_id, want_to_learn, KIND_WANT_TO_LEARN).await?;
    tx.commit().await?;

    get_profile(pool, profile_id).await
}
