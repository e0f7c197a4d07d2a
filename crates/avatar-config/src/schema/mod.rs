//! Configuration schema types for the avatar controller.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod connection;
mod projections;
mod system;

pub use connection::*;
pub use projections::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// All options have defaults matching the backend's expectations.
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AvatarConfig {
    pub connection: ConnectionConfig,
    pub health: HealthConfig,
    pub mode_poll: ModePollConfig,
    pub subtitle: SubtitleConfig,
    pub countdown: CountdownConfig,
    pub publish: PublishConfig,
    pub credentials: CredentialsConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
