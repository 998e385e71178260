mod tracker;

pub use tracker::{CommandTracker, MAX_UNCONFIRMED_COMMANDS, PendingCommand};
