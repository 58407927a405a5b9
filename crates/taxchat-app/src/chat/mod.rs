pub mod recent;
pub mod session;

pub use recent::{record_exchange, record_new_chat, unique_sessions};
pub use session::ChatSession;
