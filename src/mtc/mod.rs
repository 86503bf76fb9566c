/*!
The `mtc` module implements the two directions of the MIDI Time Code wire format: `parse`
reassembles whole timecodes from incoming quarter-frame messages, `emit` schedules outgoing
quarter-frame and Full-Frame messages against the host sample clock.
!*/

mod emit;
mod parse;

pub use emit::{
    decode_ahead, quarter_frame_payloads, sysex_locate, EmitMode, Emitter, MidiEventQueue,
    QueuedMidiEvent,
};
pub use parse::{arrival_compensation, AssembledTime, Assembler};
