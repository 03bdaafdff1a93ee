//! Dev mode: watch the sources, rebuild, restart, tell the browsers.

pub mod coordinator;
pub mod live;
pub mod queue;
pub mod session;
pub mod state;
pub mod watcher;

pub use coordinator::{Coordinator, Lifecycle, RebuildOutcome};
pub use live::{script_url, start_live_server};
pub use queue::RebuildQueue;
pub use session::DevSession;
pub use state::{LiveClients, LiveEvent};
pub use watcher::{FileChange, FileWatcher, WatchFilter};
