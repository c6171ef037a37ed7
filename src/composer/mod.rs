pub mod core;
pub mod error;
pub mod types;

pub use self::core::{Composer, compose};
pub use error::ComposeError;
pub use types::{ComposedMessage, MessageConfig, MessageConfigBuilder, PartKind, SendIntent};
