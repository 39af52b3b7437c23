use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::queries,
    error::{db_error, ApiError},
    game::{Coordinates, GuessResult, Scorer, Standing, Turn},
    models::GameMode,
    routes::extract::{Validate, ValidJson},
    AppState,
};

/// Longest display name a player can claim
pub const MAX_NAME_LENGTH: usize = 24;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InitRequest {
    /// Previous session to discard. Anything that is not a valid token is
    /// ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub token: Uuid,
    pub location: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub token: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub resume: bool,
    #[serde(flatten)]
    pub session: Option<ResumedSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumedSession {
    pub mode: GameMode,
    pub lives: i32,
    pub score: i32,
    pub location: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessRequest {
    pub token: Uuid,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "mapID", default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<i32>,
}

impl Validate for GuessRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(ApiError::bad_request("Coordinates must be finite numbers"));
        }
        if self.map_id.is_some_and(|id| id < 0) {
            return Err(ApiError::bad_request("mapID must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    pub dist_pct: i32,
    pub lives: i32,
    pub score: i32,
    /// True position of the location just guessed
    pub lat: f64,
    pub lng: f64,
    pub loc_name: String,
    pub zone_name: String,
    pub result: GuessResult,
    #[serde(rename = "mapID", default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<i32>,
    /// Next location; absent when the session is over or out of locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub token: Uuid,
    pub name: String,
}

impl ClaimRequest {
    /// Trimmed name, or an error if it cannot be shown on the leaderboard
    pub fn display_name(&self) -> Result<&str, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ApiError::bad_request(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '_' || c == '-')
        {
            return Err(ApiError::bad_request(
                "Name may only contain letters, digits, spaces, '_' and '-'",
            ));
        }
        Ok(name)
    }
}

impl Validate for ClaimRequest {
    fn validate(&self) -> Result<(), ApiError> {
        self.display_name().map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub name: String,
}

pub(crate) fn parse_mode(mode: &str) -> Result<GameMode, ApiError> {
    mode.parse::<GameMode>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Start a new session on a random enabled location of the mode
pub async fn init_session(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<String>,
    ValidJson(payload): ValidJson<InitRequest>,
) -> Result<Json<InitResponse>, ApiError> {
    let mode = parse_mode(&mode)?;

    if let Some(previous) = payload
        .clear_token
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
    {
        clear_previous_session(&state, previous).await;
    }

    let token = Uuid::new_v4();
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| db_error("acquiring a connection", e))?;

    let location = queries::random_unvisited_location(&mut conn, mode, token)
        .await
        .map_err(|e| db_error("picking a starting location", e))?
        .ok_or_else(|| {
            tracing::error!("No enabled locations for mode {}", mode);
            ApiError::internal("No locations available")
        })?;

    queries::create_session(&mut conn, token, mode, location)
        .await
        .map_err(|e| db_error("creating session", e))?;

    tracing::info!("Created {} session {} at location {}", mode, token, location);

    Ok(Json(InitResponse { token, location }))
}

/// Best-effort removal of a previous session; failures are only logged
async fn clear_previous_session(state: &AppState, token: Uuid) {
    match queries::delete_unclaimed_session(&state.db, token).await {
        Ok(0) => tracing::debug!("Nothing to clear for token {}", token),
        Ok(_) => tracing::info!("Cleared previous session {}", token),
        Err(e) => tracing::warn!("Failed to clear previous session {}: {}", token, e),
    }
}

/// Report whether a stored token can still be played
pub async fn resume_session(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<ResumeRequest>,
) -> Json<ResumeResponse> {
    let session = match queries::get_session(&state.db, payload.token).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to load session {} for resume: {}", payload.token, e);
            None
        }
    };

    let resumed = session.and_then(|s| {
        let location = s.location_id.filter(|_| s.is_alive())?;
        Some(ResumedSession {
            mode: s.mode,
            lives: s.lives,
            score: s.score,
            location,
        })
    });

    Json(ResumeResponse {
        resume: resumed.is_some(),
        session: resumed,
    })
}

/// Score a guess against the session's current location.
///
/// Everything from reading the session to writing the new standing runs in
/// one transaction holding the session row lock.
pub async fn submit_guess(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<GuessRequest>,
) -> Result<Json<GuessResponse>, ApiError> {
    payload.validate()?;
    let token = payload.token;

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| db_error("starting guess transaction", e))?;

    let session = queries::lock_session(&mut tx, token)
        .await
        .map_err(|e| db_error("loading session", e))?
        .ok_or_else(|| ApiError::not_found("Session has expired"))?;

    let turn = Turn::begin(Standing::new(session.lives, session.score), session.location_id)?;
    let location_id = turn.location_id;

    let location = queries::get_location(&mut tx, session.mode, location_id)
        .await
        .map_err(|e| db_error("loading location", e))?
        .ok_or_else(|| {
            tracing::error!(
                "Session {} references missing {} location {}",
                token,
                session.mode,
                location_id
            );
            ApiError::internal("Session location no longer exists")
        })?;

    let outcome = Scorer::score_guess(
        Coordinates::new(payload.lat, payload.lng),
        Coordinates::new(location.lat, location.lng),
        Scorer::map_matches(location.map_id, payload.map_id),
    );

    queries::insert_guess(&mut tx, token, location.id, outcome.dist_pct)
        .await
        .map_err(|e| db_error("recording guess", e))?;

    let standing = turn.finish(outcome.result);

    let next_location = if standing.is_alive() {
        queries::random_unvisited_location(&mut tx, session.mode, token)
            .await
            .map_err(|e| db_error("picking next location", e))?
    } else {
        None
    };

    queries::update_session_progress(&mut tx, token, standing, next_location)
        .await
        .map_err(|e| db_error("updating session", e))?;

    tx.commit()
        .await
        .map_err(|e| db_error("committing guess", e))?;

    tracing::debug!(
        "Session {} guessed location {}: {:?} ({}%, distance {:.3})",
        token,
        location.id,
        outcome.result,
        outcome.dist_pct,
        outcome.distance
    );
    if !standing.is_alive() {
        tracing::info!("Session {} finished with score {}", token, standing.score);
    } else if next_location.is_none() {
        tracing::info!("Session {} ran out of locations with score {}", token, standing.score);
    }

    Ok(Json(GuessResponse {
        dist_pct: outcome.dist_pct,
        lives: standing.lives,
        score: standing.score,
        lat: location.lat,
        lng: location.lng,
        loc_name: location.name,
        zone_name: location.zone_name,
        result: outcome.result,
        map_id: location.map_id,
        location: next_location,
    }))
}

/// Put a name on a finished session so it can appear on the leaderboard
pub async fn claim_session(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let name = payload.display_name()?;

    let session = queries::get_session(&state.db, payload.token)
        .await
        .map_err(|e| db_error("loading session for claim", e))?
        .ok_or_else(|| ApiError::not_found("Session has expired"))?;

    if session.is_alive() {
        return Err(ApiError::bad_request("Session is still in progress"));
    }
    if session.name.is_some() {
        return Err(ApiError::bad_request("Session has already been claimed"));
    }

    let claimed = queries::claim_session_name(&state.db, payload.token, name)
        .await
        .map_err(|e| db_error("claiming session", e))?
        .ok_or_else(|| ApiError::bad_request("Session has already been claimed"))?;

    state.leaderboard.invalidate(claimed.mode);
    tracing::info!(
        "Session {} claimed as '{}' with score {}",
        claimed.token,
        name,
        claimed.score
    );

    Ok(Json(ClaimResponse {
        name: name.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_request_clear_token_is_optional() {
        let request: InitRequest = serde_json::from_str("{}").unwrap();
        assert!(request.clear_token.is_none());

        let request: InitRequest = serde_json::from_str(r#"{"clear_token": "garbage"}"#).unwrap();
        assert_eq!(request.clear_token.as_deref(), Some("garbage"));
    }

    #[test]
    fn test_resume_response_without_session() {
        let response = ResumeResponse {
            resume: false,
            session: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "resume": false })
        );
    }

    #[test]
    fn test_resume_response_is_flat() {
        let response = ResumeResponse {
            resume: true,
            session: Some(ResumedSession {
                mode: GameMode::Classic,
                lives: 2,
                score: 5,
                location: 17,
            }),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "resume": true,
                "mode": "classic",
                "lives": 2,
                "score": 5,
                "location": 17
            })
        );

        let parsed: ResumeResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, response);

        let parsed: ResumeResponse =
            serde_json::from_value(serde_json::json!({ "resume": false })).unwrap();
        assert!(parsed.session.is_none());
    }

    #[test]
    fn test_guess_request_field_names() {
        let request: GuessRequest = serde_json::from_value(serde_json::json!({
            "token": "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
            "lat": -120.5,
            "lng": 88,
            "mapID": 2
        }))
        .unwrap();

        assert_eq!(request.lng, 88.0);
        assert_eq!(request.map_id, Some(2));
        tokio_test::assert_ok!(request.validate());
    }

    #[test]
    fn test_guess_request_rejects_bad_shapes() {
        let bad_token = serde_json::json!({ "token": "abc", "lat": 1.0, "lng": 1.0 });
        assert!(serde_json::from_value::<GuessRequest>(bad_token).is_err());

        let string_lat = serde_json::json!({
            "token": "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
            "lat": "1.0",
            "lng": 1.0
        });
        assert!(serde_json::from_value::<GuessRequest>(string_lat).is_err());
    }

    #[test]
    fn test_guess_request_validation() {
        let mut request = GuessRequest {
            token: Uuid::new_v4(),
            lat: 1.0,
            lng: 2.0,
            map_id: Some(-1),
        };
        tokio_test::assert_err!(request.validate());

        request.map_id = None;
        request.lat = f64::INFINITY;
        tokio_test::assert_err!(request.validate());
    }

    #[test]
    fn test_guess_response_wire_format() {
        let response = GuessResponse {
            dist_pct: 63,
            lives: 3,
            score: 1,
            lat: -10.5,
            lng: 20.25,
            loc_name: "Goldshire".to_string(),
            zone_name: "Elwynn Forest".to_string(),
            result: GuessResult::Close,
            map_id: None,
            location: Some(42),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["distPct"], 63);
        assert_eq!(json["locName"], "Goldshire");
        assert_eq!(json["zoneName"], "Elwynn Forest");
        assert_eq!(json["result"], 1);
        assert_eq!(json["location"], 42);
        assert!(json.get("mapID").is_none(), "mapID is omitted for single-map locations");
    }

    #[test]
    fn test_claim_name_rules() {
        let claim = |name: &str| ClaimRequest {
            token: Uuid::new_v4(),
            name: name.to_string(),
        };

        assert_eq!(claim("  Jaina  ").display_name().unwrap(), "Jaina");
        assert_eq!(claim("Gul_dan-2").display_name().unwrap(), "Gul_dan-2");
        assert!(claim("   ").display_name().is_err());
        assert!(claim("<script>").display_name().is_err());
        assert!(claim(&"x".repeat(MAX_NAME_LENGTH + 1)).display_name().is_err());
        assert!(claim(&"x".repeat(MAX_NAME_LENGTH)).display_name().is_ok());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("retail").unwrap(), GameMode::Retail);
        let err = parse_mode("wotlk").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
