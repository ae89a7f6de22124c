// Gateway module for the translation runtime - follows the Train Station Pattern
// All external access must go through this gateway

mod cancel;
mod coordinator;
mod status;

pub use cancel::CancelToken;
pub use coordinator::{Coordinator, CoordinatorSettings};
pub use status::{InFlightGuard, InFlightStatus};
