mod session;
mod summary;

pub use session::{ContentType, RawSession, SeasonSource, SessionKind};
pub use summary::Summary;
