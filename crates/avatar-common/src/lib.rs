pub mod errors;
pub mod id;

pub use errors::{AvatarError, ConfigError};
pub use id::{new_id, RequestId};

pub type Result<T> = std::result::Result<T, AvatarError>;
