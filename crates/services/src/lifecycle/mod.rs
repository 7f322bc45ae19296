pub mod engine;
pub mod error;
pub mod saga;
pub mod schedule;

pub use engine::{AcceptedMeetingRequest, LifecycleEngine};
pub use error::{LifecycleError, LifecycleResult};
pub use schedule::{default_slot, start_of_day, utc_offset, MeetingForm};
