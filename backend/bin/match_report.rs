use anyhow::Result;
use clap::{Arg, Command};
use patternpals::db::{connections, get_db_pool, profiles, DatabaseConfig};
use patternpals::matching::{rank_candidates, resolve_with_report};
use patternpals::constants::{CANDIDATE_POOL_LIMIT, DEFAULT_MATCH_LIMIT};
use patternpals::utils::init_logging;
use tracing::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("match-report")
        .about("Print the ranked match list for one user")
        .arg(
            Arg::new("user")
                .long("user")
                .help("Profile id to build the report for")
                .required(true)
                .value_parser(clap::value_parser!(Uuid)),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .help("Number of candidates to print (default 50)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON instead of a table")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let user_id = *matches
        .get_one::<Uuid>("user")
        .ok_or_else(|| anyhow::anyhow!("--user is required"))?;
    let limit = *matches.get_one::<usize>("limit").unwrap_or(&DEFAULT_MATCH_LIMIT);
    let as_json = matches.get_flag("json");

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    let Some(viewer) = profiles::get_profile(&pool, user_id).await? else {
        anyhow::bail!("Profile {} not found", user_id);
    };

    let candidates = profiles::list_profiles_except(&pool, user_id, CANDIDATE_POOL_LIMIT).await?;
    let records = connections::load_relationship_records(&pool, user_id).await?;
    let (states, report) =
        resolve_with_report(user_id, &records.connections, &records.incoming, &records.outgoing)?;

    if !report.skipped.is_empty() {
        warn!("⚠️  {} connection records did not involve {} and were skipped", report.skipped.len(), user_id);
    }

    let mut ranked = rank_candidates(&viewer, &candidates, &states);
    ranked.truncate(limit);

    info!("📊 {} candidates scored for {} ({})", candidates.len(), viewer.name, viewer.experience);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    println!("{:<5} {:<24} {:<13} {:<12} {}", "SCORE", "NAME", "EXPERIENCE", "STATE", "SHARED / TEACH / LEARN");
    for m in &ranked {
        println!(
            "{:<5} {:<24} {:<13} {:<12} {} / {} / {}",
            m.score,
            m.name,
            m.experience.to_string(),
            m.state.to_string(),
            m.relations.shared.len(),
            m.relations.can_teach.len(),
            m.relations.can_learn.len(),
        );
    }

    Ok(())
}
