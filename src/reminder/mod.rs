pub mod clock;
pub mod kind;
pub mod random;

pub use clock::{OverlayRequest, ReminderClock};
pub use kind::ReminderKind;
pub use random::{RandomSource, ThreadRandom};
