mod clock;
mod countdown;
mod pause;
mod session_type;

pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use countdown::{CountdownTimer, TimerState};
pub use pause::{PauseRecord, ONGOING_PAUSE};
pub use session_type::SessionType;
