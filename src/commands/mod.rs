pub mod channel_change;
pub mod grid_profile;
pub mod types;

pub use channel_change::ChannelChangeCommand;
pub use grid_profile::{GridProfileCommand, GridProfileResult, GridProfileSignal};
pub use types::{BoxedCommand, Command, CommandError, CommandOutcome, FailureReason};
