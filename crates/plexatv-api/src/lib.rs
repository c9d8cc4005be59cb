pub mod plex;
pub mod traits;

pub use plex::{PlexClient, PlexError};
pub use traits::SessionSource;
