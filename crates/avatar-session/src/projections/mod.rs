//! Derived UI state driven by inbound events and wall-clock timers.

pub mod countdown;
pub mod mode;
pub mod subtitle;

pub use countdown::{CountdownProjection, CountdownTimings};
pub use mode::{ModePollTimings, ModeProjection, ModeState};
pub use subtitle::{SubtitleProjection, SubtitleTimings};
