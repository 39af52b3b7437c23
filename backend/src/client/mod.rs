//! Game client: an explicit round state machine that drives the HTTP API.
//!
//! Rendering is left to the embedder. The machine only exposes view state
//! (markers, overlays, camera, toasts) for a renderer to draw.

pub mod api;
pub mod machine;
pub mod store;
pub mod view;

pub use api::{ClientError, GameApi, HttpGameApi};
pub use machine::{Event, GameClient, Phase};
pub use store::{LocalStore, MemoryStore, PlayedRound};
pub use view::{LeaderboardView, MapView, Marker, MarkerColor, PanoramaDrag, ResultOverlay, Toast};
