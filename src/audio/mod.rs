//! Local audio: the asset store, duration probing and playback.

pub mod player;
pub mod probe;
pub mod store;

pub use player::{AudioPlayer, SimulatedPlayer};
#[cfg(feature = "playback")]
pub use player::RodioPlayer;
pub use probe::{DurationProbe, SymphoniaProbe};
pub use store::{AssetStore, RecordPaths};
