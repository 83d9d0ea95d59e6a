mod events;
mod init;
mod intents;
mod state;
mod step;

pub use state::{App, DebugStats};
