use crate::models::{ExperienceLevel, Pattern, PatternRow};
use anyhow::Result;
use sqlx::PgPool;

/// Browse the pattern library, optionally by difficulty.
pub async fn list_patterns(pool: &PgPool, difficulty: Option<ExperienceLevel>) -> Result<Vec<Pattern>> {
    let rows = sqlx::query_as::<_, PatternRow>(
        r#"
        SELECT id, name, props, difficulty, siteswap
        FROM patterns
        WHERE ($1::text IS NULL OR difficulty = $1)
        ORDER BY props ASC, name ASC
        "#,
    )
    .bind(difficulty.map(|d| d.as_str()))
    .fetch_all(pool)
    .await?;

    let patterns = rows
        .into_iter()
        .map(Pattern::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(patterns)
}
