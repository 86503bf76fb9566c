/// `0xF1`: the status byte of an MTC quarter-frame message. The single data byte that follows
/// carries the piece number in its upper nibble and four bits of timecode in its lower nibble.
pub(crate) const STATUS_QUARTER_FRAME: u8 = 0xf1;

/// The upper nibble of a quarter-frame data byte selects which *piece* of the timecode the lower
/// nibble carries. There are exactly eight pieces; the whole timecode spans two frames on the wire.
pub(crate) const PIECE_MASK: u8 = 0xf0;

/// The lower nibble of a quarter-frame data byte: four bits of one BCD timecode field.
pub(crate) const NIBBLE_MASK: u8 = 0x0f;

/// `0xF0 0x7F`: a universal realtime SysEx message addressed to all devices.
pub(crate) const SYSEX_START: u8 = 0xf0;
pub(crate) const SYSEX_REALTIME: u8 = 0x7f;
pub(crate) const SYSEX_ALL_DEVICES: u8 = 0x7f;

/// `0x01 0x01`: sub-IDs identifying a MIDI Time Code Full Message.
pub(crate) const SYSEX_MTC_SUB_ID: u8 = 0x01;
pub(crate) const SYSEX_MTC_FULL_FRAME: u8 = 0x01;

/// `0xF7`: end of a SysEx message.
pub(crate) const SYSEX_END: u8 = 0xf7;

/// The length of a complete Full-Frame locate message, `F0 7F 7F 01 01 hh mm ss ff F7`.
pub(crate) const SYSEX_LOCATE_LEN: usize = 10;

/// Capacity of the RT-owned MIDI event queue, in events. Generously sized: rolling playback
/// enqueues at most `4 * (2 + decodeahead)` quarter-frames per cycle.
pub(crate) const MIDI_QUEUE_LEN: usize = 256;

/// The largest MIDI message the event queue can carry.
pub(crate) const MIDI_EVENT_MAX: usize = 16;

/// Capacity of the RT-to-printer ring, in decoded timecode records.
pub const RECORD_QUEUE_LEN: usize = 20;

/// Capacity of the RT log ring, in bytes.
pub(crate) const LOG_RING_LEN: usize = 4096;

/// A single formatted RT log line is truncated to this many bytes.
pub(crate) const LOG_LINE_MAX: usize = 256;

/// The largest audio period the LTC ingester accepts; bigger cycles are skipped because the 8-bit
/// conversion buffer lives on the RT stack.
pub(crate) const LTC_BLOCK_MAX: usize = 8192;
