/*!
`midi_timecode` bridges a JACK server's transport clock and the SMPTE/MIDI Time Code family of
protocols. It is the library behind two small tools:

- `mtcdump` decodes MTC quarter-frame messages from a JACK MIDI port and LTC audio from up to two
  JACK audio ports, correlates everything against the host's monotonic sample counter, and prints
  one line per decoded timecode.
- `mtcgen` watches the JACK transport and produces a sample-accurate stream of MTC quarter-frames
  while the transport rolls, and Full-Frame SysEx locate messages when it is stopped or locating.

The modules are split along the realtime boundary: `mtc`, `ltc`, `core` and the queues in `ring`
run inside the process callback and never block or allocate; `host` and the binaries hold the
JACK wiring and the printing thread.
!*/

#[macro_use]
mod error;
#[macro_use]
pub mod ring;

mod constants;

pub mod core;
pub mod host;
pub mod ltc;
pub mod mtc;
pub mod record;
pub mod transport;

pub use constants::RECORD_QUEUE_LEN;
pub use error::{Error, Result};
