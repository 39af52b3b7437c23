use std::time::{Duration, Instant};

use crate::{
    game::{
        scorer::{BENEFIT_OF_DOUBT_RADIUS, GUESS_THRESHOLD},
        Coordinates, GuessResult, LeaderboardEntry,
    },
    models::GameMode,
};

/// How long an error toast stays up
pub const TOAST_DURATION: Duration = Duration::from_secs(7);
/// How long a fetched leaderboard is reused before refetching
pub const LEADERBOARD_TTL: Duration = Duration::from_secs(60);

/// Initial camera centre of the world map
pub const HOME_CENTER: Coordinates = Coordinates {
    lat: -120.90349875311426,
    lng: 124.75,
};
pub const HOME_ZOOM: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Red,
    Yellow,
    Green,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Red => "red",
            MarkerColor::Yellow => "yellow",
            MarkerColor::Green => "green",
        }
    }
}

impl From<GuessResult> for MarkerColor {
    fn from(result: GuessResult) -> Self {
        match result {
            GuessResult::Miss => MarkerColor::Red,
            GuessResult::Close => MarkerColor::Yellow,
            GuessResult::Exact => MarkerColor::Green,
        }
    }
}

/// The player's pending guess on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Coordinates,
    pub map_id: Option<i32>,
}

/// What the map shows after a guess has been scored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultOverlay {
    pub guess: Coordinates,
    pub truth: Coordinates,
    pub color: MarkerColor,
    /// Circle drawn around the truth: the radius the guess had to land in
    /// for its tier
    pub radius: f64,
}

impl ResultOverlay {
    pub fn new(guess: Coordinates, truth: Coordinates, result: GuessResult) -> Self {
        let radius = match result {
            GuessResult::Exact => GUESS_THRESHOLD * (1.0 - BENEFIT_OF_DOUBT_RADIUS),
            GuessResult::Close | GuessResult::Miss => GUESS_THRESHOLD,
        };
        Self {
            guess,
            truth,
            color: result.into(),
            radius,
        }
    }
}

/// Map camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub max_zoom: u8,
}

impl MapView {
    pub fn home(mode: GameMode) -> Self {
        Self {
            center: HOME_CENTER,
            zoom: HOME_ZOOM,
            max_zoom: match mode {
                GameMode::Classic => 6,
                GameMode::Retail => 7,
            },
        }
    }
}

/// Horizontal drag state of the panorama strip
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanoramaDrag {
    offset: f64,
    anchor: f64,
    dragging: bool,
}

impl PanoramaDrag {
    pub fn press(&mut self, x: f64) {
        self.anchor = x;
        self.dragging = true;
    }

    pub fn drag(&mut self, x: f64) {
        if !self.dragging {
            return;
        }
        self.offset += x - self.anchor;
        self.anchor = x;
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// CSS `background-position` for the panorama image
    pub fn background_position(&self) -> String {
        format!("{}px 0", self.offset)
    }
}

/// Auto-dismissing error message
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub expires_at: Instant,
}

impl Toast {
    pub fn new(text: impl Into<String>, now: Instant) -> Self {
        Self {
            text: text.into(),
            expires_at: now + TOAST_DURATION,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Client-side leaderboard panel with its fetch cache
#[derive(Debug, Clone, Default)]
pub struct LeaderboardView {
    pub shown: bool,
    pub loading: bool,
    pub players: Vec<LeaderboardEntry>,
    pub fetched_at: Option<Instant>,
}

impl LeaderboardView {
    pub fn needs_refresh(&self, now: Instant) -> bool {
        if self.players.is_empty() {
            return true;
        }
        self.fetched_at
            .is_none_or(|at| now.saturating_duration_since(at) > LEADERBOARD_TTL)
    }

    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }
}

/// Panorama image for a location
pub fn panorama_path(mode: GameMode, location: i32) -> String {
    let dir = match mode {
        GameMode::Retail => "locations",
        GameMode::Classic => "locations_classic",
    };
    format!("static/images/{}/{}.jpg", dir, location)
}

/// Tile URL template for the world map
pub fn tiles_template(mode: GameMode) -> String {
    let dir = match mode {
        GameMode::Retail => "tiles",
        GameMode::Classic => "tiles_classic",
    };
    format!("static/images/{}/{{z}}/{{x}}/{{y}}.png", dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_colors() {
        assert_eq!(MarkerColor::from(GuessResult::Miss), MarkerColor::Red);
        assert_eq!(MarkerColor::from(GuessResult::Close), MarkerColor::Yellow);
        assert_eq!(MarkerColor::from(GuessResult::Exact).as_str(), "green");
    }

    #[test]
    fn test_overlay_radius_by_tier() {
        let p = Coordinates::new(0.0, 0.0);
        let exact = ResultOverlay::new(p, p, GuessResult::Exact);
        let miss = ResultOverlay::new(p, p, GuessResult::Miss);

        assert!((exact.radius - 0.48).abs() < 1e-9);
        assert_eq!(miss.radius, GUESS_THRESHOLD);
        assert_eq!(miss.color, MarkerColor::Red);
    }

    #[test]
    fn test_panorama_drag_accumulates_only_while_pressed() {
        let mut pano = PanoramaDrag::default();
        pano.drag(50.0);
        assert_eq!(pano.offset(), 0.0, "Moving without pressing must not scroll");

        pano.press(100.0);
        pano.drag(130.0);
        pano.drag(90.0);
        pano.release();
        pano.drag(500.0);

        assert_eq!(pano.offset(), -10.0);
        assert_eq!(pano.background_position(), "-10px 0");
        assert!(!pano.is_dragging());
    }

    #[test]
    fn test_toast_expires_after_seven_seconds() {
        let now = Instant::now();
        let toast = Toast::new("oops", now);
        assert!(toast.is_visible(now + Duration::from_secs(6)));
        assert!(!toast.is_visible(now + Duration::from_secs(7)));
    }

    #[test]
    fn test_leaderboard_refresh_rules() {
        let now = Instant::now();
        let mut view = LeaderboardView::default();
        assert!(view.needs_refresh(now), "Empty board always refreshes");

        view.players = vec![LeaderboardEntry {
            name: "Varian".to_string(),
            score: 3,
            accuracy: 60,
        }];
        view.fetched_at = Some(now);
        assert!(!view.needs_refresh(now + Duration::from_secs(60)));
        assert!(view.needs_refresh(now + Duration::from_secs(61)));

        view.invalidate();
        assert!(view.needs_refresh(now));
    }

    #[test]
    fn test_asset_paths() {
        assert_eq!(
            panorama_path(GameMode::Classic, 12),
            "static/images/locations_classic/12.jpg"
        );
        assert_eq!(
            tiles_template(GameMode::Retail),
            "static/images/tiles/{z}/{x}/{y}.png"
        );
        assert_eq!(MapView::home(GameMode::Classic).max_zoom, 6);
        assert_eq!(MapView::home(GameMode::Retail).zoom, HOME_ZOOM);
    }
}
