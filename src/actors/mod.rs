pub mod messages;
pub mod presenter;
pub mod session_actor;

pub use messages::{Message, Role, SessionView};
pub use presenter::{Presenter, RevealHandle};
pub use session_actor::{SessionHandle, FAILURE_TEXT, PLACEHOLDER_GLYPH};
