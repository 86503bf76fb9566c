/*!
The `core` module is for timecode types and arithmetic that are *not* tied to the JACK host or to
the MIDI wire format. These types could be used by any program that counts SMPTE frames against an
audio sample clock.
!*/

mod rate;
mod time;

pub use rate::{MtcRateCode, TimecodeRate, FPS_24, FPS_25, FPS_2997DF, FPS_30};
pub use time::TimecodeTime;
