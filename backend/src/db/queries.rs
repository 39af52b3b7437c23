use rand::seq::IndexedRandom;
use sqlx::{PgConnection, PgPool, Result};
use uuid::Uuid;

use crate::{
    game::{LeaderboardEntry, Standing, TopScores},
    models::{GameMode, GuessRecord, Location, Session},
};

/// Rows fetched per page when scanning leaderboard candidates
pub const LEADERBOARD_PAGE_SIZE: i64 = 1000;

// =============================================================================
// Session queries
// =============================================================================

/// Insert a fresh session with full lives and no score
pub async fn create_session(
    conn: &mut PgConnection,
    token: Uuid,
    mode: GameMode,
    location_id: i32,
) -> Result<Session> {
    let standing = Standing::default();

    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (token, mode, location_id, lives, score)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(mode)
    .bind(location_id)
    .bind(standing.lives)
    .bind(standing.score)
    .fetch_one(&mut *conn)
    .await
}

pub async fn get_session(pool: &PgPool, token: Uuid) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Read a session and hold its row lock until the surrounding
/// transaction ends. Concurrent guesses for the same token queue here.
pub async fn lock_session(conn: &mut PgConnection, token: Uuid) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1 FOR UPDATE")
        .bind(token)
        .fetch_optional(&mut *conn)
        .await
}

/// Store the standing after a guess along with the next location
/// (`None` when the session is over or the pool is exhausted)
pub async fn update_session_progress(
    conn: &mut PgConnection,
    token: Uuid,
    standing: Standing,
    location_id: Option<i32>,
) -> Result<Session> {
    sqlx::query_as::<_, Session>(
        r#"
        UPDATE sessions
        SET lives = $2,
            score = $3,
            location_id = $4,
            updated_at = NOW()
        WHERE token = $1
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(standing.lives)
    .bind(standing.score)
    .bind(location_id)
    .fetch_one(&mut *conn)
    .await
}

/// Delete an unclaimed session. Its guesses go with it (ON DELETE CASCADE).
/// Sessions with a claimed name stay, they back the leaderboard.
///
/// Returns the number of sessions removed.
pub async fn delete_unclaimed_session(pool: &PgPool, token: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1 AND name IS NULL")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Attach a display name to a finished, unnamed session.
///
/// Returns `None` if the session does not qualify (missing, still alive,
/// or already named).
pub async fn claim_session_name(pool: &PgPool, token: Uuid, name: &str) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>(
        r#"
        UPDATE sessions
        SET name = $2,
            updated_at = NOW()
        WHERE token = $1
          AND lives = 0
          AND name IS NULL
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(name)
    .fetch_optional(pool)
    .await
}

// =============================================================================
// Location queries
// =============================================================================

/// Look up a location of the given mode together with its zone name
pub async fn get_location(
    conn: &mut PgConnection,
    mode: GameMode,
    location_id: i32,
) -> Result<Option<Location>> {
    let sql = format!(
        r#"
        SELECT l.id, l.name, z.name AS zone_name, l.lat, l.lng, l.map_id
        FROM {locations} l
        JOIN {zones} z ON z.id = l.zone_id
        WHERE l.id = $1
        "#,
        locations = mode.locations_table(),
        zones = mode.zones_table(),
    );

    sqlx::query_as::<_, Location>(&sql)
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Pick a random enabled location that this session has not guessed yet.
///
/// The candidates come from a single statement so the pick always sees
/// one consistent snapshot. Returns `None` when the pool is exhausted.
pub async fn random_unvisited_location(
    conn: &mut PgConnection,
    mode: GameMode,
    token: Uuid,
) -> Result<Option<i32>> {
    let sql = format!(
        r#"
        SELECT l.id
        FROM {locations} l
        WHERE l.enabled
          AND NOT EXISTS (
              SELECT 1 FROM guesses g
              WHERE g.token = $1 AND g.location_id = l.id
          )
        "#,
        locations = mode.locations_table(),
    );

    let candidates: Vec<i32> = sqlx::query_scalar(&sql)
        .bind(token)
        .fetch_all(&mut *conn)
        .await?;

    Ok(pick_location(&candidates))
}

/// Uniform choice among candidate location ids
pub(crate) fn pick_location(candidates: &[i32]) -> Option<i32> {
    candidates.choose(&mut rand::rng()).copied()
}

// =============================================================================
// Guess queries
// =============================================================================

pub async fn insert_guess(
    conn: &mut PgConnection,
    token: Uuid,
    location_id: i32,
    dist_pct: i32,
) -> Result<GuessRecord> {
    sqlx::query_as::<_, GuessRecord>(
        r#"
        INSERT INTO guesses (token, location_id, dist_pct)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(location_id)
    .bind(dist_pct)
    .fetch_one(&mut *conn)
    .await
}

// =============================================================================
// Leaderboard queries
// =============================================================================

/// One page of leaderboard candidates: named sessions of a mode with a
/// positive score, highest score first
pub async fn leaderboard_page(
    pool: &PgPool,
    mode: GameMode,
    limit: i64,
    offset: i64,
) -> Result<Vec<LeaderboardEntry>> {
    sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT s.name AS name,
               s.score AS score,
               COALESCE(ROUND(AVG(g.dist_pct)), 0)::INT4 AS accuracy
        FROM sessions s
        LEFT JOIN guesses g ON g.token = s.token
        WHERE s.mode = $1
          AND s.name IS NOT NULL
          AND s.score > 0
        GROUP BY s.token, s.name, s.score
        ORDER BY s.score DESC, s.token
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(mode)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Scan leaderboard candidates page by page and keep the best `size`.
///
/// Pages arrive in descending score order, so the scan stops as soon as
/// no later row could displace a held entry.
pub async fn top_players(pool: &PgPool, mode: GameMode, size: usize) -> Result<Vec<LeaderboardEntry>> {
    let mut top = TopScores::new(size);
    let mut offset = 0_i64;

    loop {
        let page = leaderboard_page(pool, mode, LEADERBOARD_PAGE_SIZE, offset).await?;
        let page_len = page.len() as i64;
        let lowest_score = page.last().map(|entry| entry.score);

        top.extend(page);

        if page_len < LEADERBOARD_PAGE_SIZE {
            break;
        }
        if lowest_score.is_some_and(|score| top.is_closed_below(score)) {
            break;
        }
        offset += LEADERBOARD_PAGE_SIZE;
    }

    tracing::debug!("Ranked {} leaderboard entries for {}", top.len(), mode);
    Ok(top.into_ranked())
}
