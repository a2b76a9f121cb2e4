use crate::models::{Connection, ConnectionRequest, ConnectionRequestRow};
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Everything the resolver needs for one user.
#[derive(Debug, Clone, Default)]
pub struct RelationshipRecords {
    pub connections: Vec<Connection>,
    pub incoming: Vec<ConnectionRequest>,
    pub outgoing: Vec<ConnectionRequest>,
}

fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b { (a, b) } else { (b, a) }
}

fn into_requests(rows: Vec<ConnectionRequestRow>) -> Result<Vec<ConnectionRequest>> {
    let mut requests = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id;
        match ConnectionRequest::try_from(row) {
            Ok(request) => requests.push(request),
            Err(e) => tracing::warn!("Skipping connection request {}: {}", id, e),
        }
    }
    Ok(requests)
}

// Connection request operations
pub async fn send_request(pool: &PgPool, from_user_id: Uuid, to_user_id: Uuid) -> Result<Option<ConnectionRequest>> {
    let row = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        INSERT INTO connection_requests (from_user_id, to_user_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        RETURNING id, from_user_id, to_user_id, status, created_at, responded_at
        "#,
    )
    .bind(from_user_id)
    .bind(to_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ConnectionRequest::try_from).transpose()?)
}

pub async fn get_request(pool: &PgPool, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
    let row = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, responded_at
        FROM connection_requests
        WHERE id = $1
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ConnectionRequest::try_from).transpose()?)
}

pub async fn list_incoming_pending(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConnectionRequest>> {
    let rows = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, responded_at
        FROM connection_requests
        WHERE to_user_id = $1 AND status = 'pending'
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    into_requests(rows)
}

pub async fn list_outgoing_pending(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConnectionRequest>> {
    let rows = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, responded_at
        FROM connection_requests
        WHERE from_user_id = $1 AND status = 'pending'
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    into_requests(rows)
}

/// Mark a pending request accepted and create the connection in the same
/// transaction. Returns `None` if the request is no longer pending.
pub async fn accept_request(pool: &PgPool, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        UPDATE connection_requests
        SET status = 'accepted', responded_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, from_user_id, to_user_id, status, created_at, responded_at
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(None);
    };

    let (smaller_id, larger_id) = ordered_pair(row.from_user_id, row.to_user_id);
    sqlx::query(
        r#"
        INSERT INTO connections (user_id_1, user_id_2)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(smaller_id)
    .bind(larger_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(ConnectionRequest::try_from(row)?))
}

pub async fn decline_request(pool: &PgPool, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
    let row = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        UPDATE connection_requests
        SET status = 'declined', responded_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, from_user_id, to_user_id, status, created_at, responded_at
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ConnectionRequest::try_from).transpose()?)
}

/// Sender withdraws a request that is still pending. The row is removed.
pub async fn cancel_request(pool: &PgPool, request_id: Uuid, from_user_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM connection_requests
        WHERE id = $1 AND from_user_id = $2 AND status = 'pending'
        "#,
    )
    .bind(request_id)
    .bind(from_user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Connection operations
pub async fn list_connections(pool: &PgPool, user_id: Uuid) -> Result<Vec<Connection>> {
    let connections = sqlx::query_as::<_, Connection>(
        r#"
        SELECT user_id_1, user_id_2, created_at
        FROM connections
        WHERE user_id_1 = $1 OR user_id_2 = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(connections)
}

pub async fn load_relationship_records(pool: &PgPool, user_id: Uuid) -> Result<RelationshipRecords> {
    let (connections, incoming, outgoing) = tokio::try_join!(
        list_connections(pool, user_id),
        list_incoming_pending(pool, user_id),
        list_outgoing_pending(pool, user_id),
    )?;

    Ok(RelationshipRecords {
        connections,
        incoming,
        outgoing,
    })
}
