pub mod identity;
pub mod registry;
pub mod server;
pub mod session;
pub mod status;

pub use identity::{ServerId, ServerIdentity};
pub use registry::ServerRegistry;
pub use server::{AccountId, AccountIdent, AccountInfo, ServerInfo, ServerSnapshot, SharedServer};
pub use session::{
    null_progress, spinner_progress, Connection, ConnectionHandle, HttpConnection,
    ProgressCallback, ProgressUpdate,
};
pub use status::{CrawlStatus, Transition};
