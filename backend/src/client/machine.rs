use std::{collections::VecDeque, time::Instant};

use uuid::Uuid;

use super::{
    api::GameApi,
    store::{self, LocalStore, PlayedRound},
    view::{self, LeaderboardView, MapView, Marker, PanoramaDrag, ResultOverlay, Toast},
};
use crate::{
    game::{Coordinates, Standing},
    models::GameMode,
    routes::session::{GuessRequest, GuessResponse, ResumeResponse},
};

pub const INIT_FAILED_TEXT: &str =
    "Sorry, there's a murloc in the engine right now. Please try again later!";

/// Where the player is in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Title screen, nothing in progress
    Intro,
    /// Looking at a panorama, placing a marker
    Playing,
    /// Guess scored, result shown, waiting to move on
    NextRound,
    /// Out of lives or out of locations. Terminal until the next `Play`.
    GameOver,
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Play(GameMode),
    /// Pick up the session stored from an earlier visit
    Continue,
    PlaceMarker(Marker),
    ConfirmGuess,
    NextRound,
    ToggleMap,
    ToggleLeaderboard,
    ClaimName(String),
    DismissToast,
}

/// Client-side game state machine.
///
/// Events are queued with [`dispatch`](Self::dispatch) and applied in order
/// by [`pump`](Self::pump). An event that makes no sense in the current
/// phase is dropped.
pub struct GameClient<A, S> {
    api: A,
    store: S,
    queue: VecDeque<Event>,

    phase: Phase,
    mode: GameMode,
    token: Option<Uuid>,
    round: u32,
    standing: Standing,
    current_location: Option<i32>,
    history: Vec<PlayedRound>,
    claimed_name: Option<String>,
    loading: bool,

    marker: Option<Marker>,
    /// Closed while a guess is in flight or its result is on screen
    can_place_marker: bool,
    overlay: Option<ResultOverlay>,
    last_guess: Option<GuessResponse>,
    viewing_map: bool,
    map_view: MapView,
    panorama: PanoramaDrag,
    toast: Option<Toast>,
    leaderboard: LeaderboardView,
}

impl<A: GameApi, S: LocalStore> GameClient<A, S> {
    pub fn new(api: A, store: S) -> Self {
        let token = store::load_token(&store);
        let mode = GameMode::Retail;

        Self {
            api,
            store,
            queue: VecDeque::new(),
            phase: Phase::Intro,
            mode,
            token,
            round: 0,
            standing: Standing::default(),
            current_location: None,
            history: Vec::new(),
            claimed_name: None,
            loading: false,
            marker: None,
            can_place_marker: true,
            overlay: None,
            last_guess: None,
            viewing_map: false,
            map_view: MapView::home(mode),
            panorama: PanoramaDrag::default(),
            toast: None,
            leaderboard: LeaderboardView::default(),
        }
    }

    pub fn dispatch(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Apply every queued event in order. Returns how many were processed.
    pub async fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.queue.pop_front() {
            self.handle(event).await;
            processed += 1;
        }
        processed
    }

    async fn handle(&mut self, event: Event) {
        match (self.phase, event) {
            (Phase::Intro | Phase::GameOver, Event::Play(mode)) => self.play(mode).await,
            (Phase::Intro, Event::Continue) => self.continue_session().await,
            (Phase::Playing, Event::PlaceMarker(marker)) => self.place_marker(marker),
            (Phase::Playing, Event::ConfirmGuess) => self.confirm_guess().await,
            (Phase::NextRound, Event::NextRound) => self.begin_round(),
            (Phase::Playing | Phase::NextRound, Event::ToggleMap) => {
                self.viewing_map = !self.viewing_map;
            }
            (_, Event::ToggleLeaderboard) => self.toggle_leaderboard().await,
            (Phase::GameOver, Event::ClaimName(name)) => self.claim_name(name).await,
            (_, Event::DismissToast) => self.toast = None,
            (phase, event) => tracing::debug!("Ignoring {:?} while {:?}", event, phase),
        }
    }

    async fn play(&mut self, mode: GameMode) {
        if mode != self.mode {
            self.leaderboard = LeaderboardView::default();
        }
        self.mode = mode;
        self.loading = true;
        self.reset_game_state();

        match self.api.init(mode, self.token).await {
            Ok(session) => {
                self.token = Some(session.token);
                store::save_token(&mut self.store, self.token);
                store::save_history(&mut self.store, &self.history);
                self.current_location = Some(session.location);
                self.begin_round();
                tracing::info!("Started {} session {}", mode, session.token);
            }
            Err(e) => {
                tracing::error!("Failed to initialize session: {}", e);
                self.show_error(INIT_FAILED_TEXT);
                self.phase = Phase::Intro;
            }
        }

        self.loading = false;
    }

    async fn continue_session(&mut self) {
        let Some(token) = self.token else {
            tracing::debug!("No stored session to continue");
            return;
        };

        self.loading = true;
        match self.api.resume(token).await {
            Ok(ResumeResponse {
                resume: true,
                session: Some(resumed),
            }) => {
                if resumed.mode != self.mode {
                    self.leaderboard = LeaderboardView::default();
                }
                self.mode = resumed.mode;
                self.standing = Standing::new(resumed.lives, resumed.score);
                self.current_location = Some(resumed.location);
                self.history = store::load_history(&self.store);
                self.round = self.history.len() as u32;
                self.claimed_name = None;
                self.begin_round();
                tracing::info!("Resumed {} session {} at round {}", self.mode, token, self.round);
            }
            Ok(_) => {
                tracing::info!("Stored session {} can no longer be resumed", token);
                self.token = None;
                store::save_token(&mut self.store, None);
            }
            Err(e) => {
                tracing::error!("Failed to resume session: {}", e);
                self.show_error(INIT_FAILED_TEXT);
            }
        }
        self.loading = false;
    }

    fn place_marker(&mut self, marker: Marker) {
        if !self.can_place_marker {
            return;
        }
        self.marker = Some(marker);
    }

    async fn confirm_guess(&mut self) {
        if !self.can_place_marker {
            tracing::debug!("Guess already in flight");
            return;
        }
        let (Some(marker), Some(token)) = (self.marker, self.token) else {
            return;
        };

        self.can_place_marker = false;
        let request = GuessRequest {
            token,
            lat: marker.position.lat,
            lng: marker.position.lng,
            map_id: marker.map_id,
        };

        match self.api.guess(&request).await {
            Ok(response) => self.apply_guess(marker, response),
            Err(e) => {
                tracing::warn!("Guess submission failed: {}", e);
                self.show_error(e.user_message());
                self.can_place_marker = true;
            }
        }
    }

    fn apply_guess(&mut self, marker: Marker, response: GuessResponse) {
        self.standing = Standing::new(response.lives, response.score);

        if let Some(location) = self.current_location {
            self.history.push(PlayedRound {
                location,
                dist_pct: response.dist_pct,
                result: response.result,
            });
            store::save_history(&mut self.store, &self.history);
        }

        self.overlay = Some(ResultOverlay::new(
            marker.position,
            Coordinates::new(response.lat, response.lng),
            response.result,
        ));
        self.viewing_map = true;
        self.current_location = response.location;

        self.phase = if self.standing.is_alive() && self.current_location.is_some() {
            Phase::NextRound
        } else {
            Phase::GameOver
        };
        tracing::debug!(
            "Round {} scored {:?} at {}%, now {:?}",
            self.round,
            response.result,
            response.dist_pct,
            self.phase
        );
        self.last_guess = Some(response);
    }

    fn reset_game_state(&mut self) {
        self.round = 0;
        self.standing = Standing::default();
        self.history.clear();
        self.current_location = None;
        self.claimed_name = None;
        self.last_guess = None;
        self.viewing_map = false;
    }

    /// Clear the map, recentre the camera, reopen marker placement
    fn begin_round(&mut self) {
        self.round += 1;
        self.marker = None;
        self.overlay = None;
        self.map_view = MapView::home(self.mode);
        self.can_place_marker = true;
        self.viewing_map = false;
        self.phase = Phase::Playing;
    }

    async fn toggle_leaderboard(&mut self) {
        self.leaderboard.shown = !self.leaderboard.shown;
        if !self.leaderboard.shown || !self.leaderboard.needs_refresh(Instant::now()) {
            return;
        }

        self.leaderboard.loading = true;
        match self.api.leaderboard(self.mode).await {
            Ok(board) => {
                self.leaderboard.players = board.players;
                self.leaderboard.fetched_at = Some(Instant::now());
            }
            Err(e) => tracing::error!("Failed to fetch leaderboard data: {}", e),
        }
        self.leaderboard.loading = false;
    }

    async fn claim_name(&mut self, name: String) {
        if self.claimed_name.is_some() {
            return;
        }
        let Some(token) = self.token else {
            return;
        };

        match self.api.claim(token, &name).await {
            Ok(claimed) => {
                self.claimed_name = Some(claimed.name);
                self.leaderboard.invalidate();
            }
            Err(e) => self.show_error(e.user_message()),
        }
    }

    fn show_error(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast::new(text, Instant::now()));
    }

    // Read-only view state

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn token(&self) -> Option<Uuid> {
        self.token
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn lives(&self) -> i32 {
        self.standing.lives
    }

    pub fn score(&self) -> i32 {
        self.standing.score
    }

    pub fn is_alive(&self) -> bool {
        self.standing.is_alive()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_location(&self) -> Option<i32> {
        self.current_location
    }

    pub fn history(&self) -> &[PlayedRound] {
        &self.history
    }

    /// Mean accuracy over the guesses made so far
    pub fn accuracy(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let total: i32 = self.history.iter().map(|r| r.dist_pct).sum();
        Some(total as f64 / self.history.len() as f64)
    }

    pub fn claimed_name(&self) -> Option<&str> {
        self.claimed_name.as_deref()
    }

    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }

    pub fn can_place_marker(&self) -> bool {
        self.can_place_marker
    }

    pub fn overlay(&self) -> Option<ResultOverlay> {
        self.overlay
    }

    pub fn last_guess(&self) -> Option<&GuessResponse> {
        self.last_guess.as_ref()
    }

    pub fn is_viewing_map(&self) -> bool {
        self.viewing_map
    }

    pub fn map_view(&self) -> MapView {
        self.map_view
    }

    pub fn panorama(&self) -> &PanoramaDrag {
        &self.panorama
    }

    pub fn panorama_mut(&mut self) -> &mut PanoramaDrag {
        &mut self.panorama
    }

    pub fn panorama_image(&self) -> Option<String> {
        self.current_location
            .map(|location| view::panorama_path(self.mode, location))
    }

    /// Error toast text, if one is up at `now`
    pub fn toast_text(&self, now: Instant) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|toast| toast.is_visible(now))
            .map(|toast| toast.text.as_str())
    }

    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.leaderboard
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
