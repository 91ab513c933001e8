//! Narrow interfaces to the external collaborators.
//!
//! The scheduler crate only ever talks to these traits; concrete adapters
//! (Telegram, Home Assistant, camera command, HTTP source) live in
//! `watchbell-channels` and tests plug in in-memory fakes.

pub mod actuator;
pub mod camera;
pub mod clock;
pub mod source;
pub mod transport;

pub use actuator::Actuator;
pub use camera::CaptureDevice;
pub use clock::{Clock, SystemClock};
pub use source::{Formatter, StatusSource};
pub use transport::Transport;
