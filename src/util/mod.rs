pub mod queue;
pub mod timeout;

pub use queue::CommandQueue;
pub use timeout::{Clock, TimeoutTracker};

#[cfg(feature = "embedded")]
pub use timeout::EmbassyClock;
