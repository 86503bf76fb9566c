use crate::constants::{
    MIDI_EVENT_MAX, MIDI_QUEUE_LEN, STATUS_QUARTER_FRAME, SYSEX_ALL_DEVICES, SYSEX_END,
    SYSEX_LOCATE_LEN, SYSEX_MTC_FULL_FRAME, SYSEX_MTC_SUB_ID, SYSEX_REALTIME, SYSEX_START,
};
use crate::core::{MtcRateCode, TimecodeRate, TimecodeTime};
use crate::ring::RtLog;

/// What the transport is doing, as seen by the emitter. `Stopped` and `Locating` produce a
/// Full-Frame locate message; `Rolling` produces the quarter-frame stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmitMode {
    Stopped,
    Locating,
    Rolling,
}

/// A MIDI message waiting to leave through the output port. `align` is absolute on the host
/// monotonic sample counter; `time` is filled at dispatch with the offset into the cycle that
/// finally carries the message.
#[derive(Clone, Copy, Debug)]
pub struct QueuedMidiEvent {
    pub align: i64,
    pub time: u32,
    pub size: usize,
    pub bytes: [u8; MIDI_EVENT_MAX],
}

impl QueuedMidiEvent {
    fn quarter_frame(payload: u8, align: i64) -> Self {
        let mut bytes = [0u8; MIDI_EVENT_MAX];
        bytes[0] = STATUS_QUARTER_FRAME;
        bytes[1] = payload;
        Self {
            align,
            time: 0,
            size: 2,
            bytes,
        }
    }

    fn locate(message: [u8; SYSEX_LOCATE_LEN], align: i64) -> Self {
        let mut bytes = [0u8; MIDI_EVENT_MAX];
        bytes[..SYSEX_LOCATE_LEN].copy_from_slice(&message);
        Self {
            align,
            time: 0,
            size: SYSEX_LOCATE_LEN,
            bytes,
        }
    }
}

/// A fixed-capacity queue of pre-formed MIDI events. Producer and consumer are both the realtime
/// thread (enqueue while scheduling, dequeue while draining into the port buffer), so no
/// synchronisation is involved; the fixed array keeps it allocation-free.
pub struct MidiEventQueue {
    events: [QueuedMidiEvent; MIDI_QUEUE_LEN],
    write: usize,
    read: usize,
}

impl MidiEventQueue {
    pub fn new() -> Self {
        Self {
            events: [QueuedMidiEvent::quarter_frame(0, 0); MIDI_QUEUE_LEN],
            write: 0,
            read: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.write == self.read
    }

    pub fn len(&self) -> usize {
        (self.write + MIDI_QUEUE_LEN - self.read) % MIDI_QUEUE_LEN
    }

    /// Drops the event silently when the queue is full; the realtime thread never waits.
    pub fn push(&mut self, event: QueuedMidiEvent) {
        let next = (self.write + 1) % MIDI_QUEUE_LEN;
        if next == self.read {
            return;
        }
        self.events[self.write] = event;
        self.write = next;
    }

    pub fn front(&self) -> Option<&QueuedMidiEvent> {
        if self.is_empty() {
            None
        } else {
            Some(&self.events[self.read])
        }
    }

    pub fn pop(&mut self) -> Option<QueuedMidiEvent> {
        if self.is_empty() {
            return None;
        }
        let event = self.events[self.read];
        self.read = (self.read + 1) % MIDI_QUEUE_LEN;
        Some(event)
    }

    /// Forgets every pending event; used when a locate supersedes queued quarter-frames.
    pub fn flush(&mut self) {
        self.read = self.write;
    }
}

impl Default for MidiEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The eight quarter-frame data bytes for one timecode, in transmission order. Each byte carries
/// its piece number in the upper nibble; piece 7 carries the rate code in bits 1-2 of the payload.
pub fn quarter_frame_payloads(t: &TimecodeTime, rate: MtcRateCode) -> [u8; 8] {
    [
        t.frame & 0x0f,
        0x10 | ((t.frame >> 4) & 0x1),
        0x20 | (t.second & 0x0f),
        0x30 | ((t.second >> 4) & 0x3),
        0x40 | (t.minute & 0x0f),
        0x50 | ((t.minute >> 4) & 0x3),
        0x60 | (t.hour & 0x0f),
        0x70 | (rate.bits() << 1) | ((t.hour >> 4) & 0x1),
    ]
}

/// The ten-byte Full-Frame locate message, `F0 7F 7F 01 01 hh mm ss ff F7`, with the rate code in
/// bits 5-6 of the hour byte.
pub fn sysex_locate(t: &TimecodeTime, rate: MtcRateCode) -> [u8; SYSEX_LOCATE_LEN] {
    [
        SYSEX_START,
        SYSEX_REALTIME,
        SYSEX_ALL_DEVICES,
        SYSEX_MTC_SUB_ID,
        SYSEX_MTC_FULL_FRAME,
        (rate.bits() << 5) | (t.hour & 0x1f),
        t.minute & 0x7f,
        t.second & 0x7f,
        t.frame & 0x7f,
        SYSEX_END,
    ]
}

/// How many timecode frames the emitter schedules ahead of the transport, to absorb the playback
/// latency of the output port.
pub fn decode_ahead(latency: u32, frames_per_timecode_frame: f64) -> i64 {
    2 + (f64::from(latency) / frames_per_timecode_frame).ceil() as i64
}

/// Schedules MTC output against the host sample clock.
///
/// While rolling, the emitter walks a staged timecode ahead of the transport position, enqueueing
/// four quarter-frames per timecode frame boundary (the 8-message sequence spans two frames).
/// When stopped or locating it collapses to a single Full-Frame locate. Large jumps, stalls and
/// backward motion outside of rolling mode force a resync: the staged time snaps to the transport
/// time, pending events are flushed, and a locate is sent.
pub struct Emitter {
    /// The frame most recently scheduled; walks ahead of the transport while rolling.
    staged: TimecodeTime,
    /// Snapshot taken when a quarter-frame sequence starts; the sequence spans two frames and the
    /// upper fields must not change mid-flight.
    window: TimecodeTime,
    /// The next quarter-frame piece to send, 0..=7. Always 0 or 4 between batches.
    cursor: u8,
    prev_count: i64,
    prev_mode: Option<EmitMode>,
    rate_warned: bool,
    queue: MidiEventQueue,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            staged: TimecodeTime::default(),
            window: TimecodeTime::default(),
            cursor: 0,
            prev_count: 0,
            prev_mode: None,
            rate_warned: false,
            queue: MidiEventQueue::new(),
        }
    }

    /// The value of the quarter-frame cursor; for tests and diagnostics.
    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Runs one scheduling step for the current cycle. `t` is the transport time, `mfcnt` the
    /// monotonic sample counter at cycle start.
    pub fn generate(
        &mut self,
        t: &TimecodeTime,
        mfcnt: i64,
        mut mode: EmitMode,
        rate: &TimecodeRate,
        sample_rate: u32,
        decodeahead: i64,
        log: &mut RtLog,
    ) {
        let fptcf = rate.frames_per_timecode_frame(sample_rate);
        let nfn = t.to_frame_number(rate);
        let mut ofn = self.staged.to_frame_number(rate);
        let mut cfcnt = (mfcnt - i64::from(t.subframe)) as f64;

        if self.prev_mode == Some(mode) && mode == EmitMode::Stopped && ofn == nfn {
            // this frame has already been sent
            return;
        }

        if nfn - ofn > 3
            || (mfcnt - self.prev_count) as f64 > 3.0 * fptcf
            || (nfn - ofn < 1 && mode != EmitMode::Rolling)
        {
            mode = EmitMode::Stopped;
            self.staged = *t;
        }

        self.prev_count = mfcnt;
        self.prev_mode = Some(mode);

        if mode == EmitMode::Rolling {
            if nfn + decodeahead <= ofn {
                // already scheduled far enough ahead
                return;
            }
            cfcnt += fptcf * (ofn - nfn) as f64;
        }

        let code = match MtcRateCode::classify(rate) {
            Some(code) => {
                self.rate_warned = false;
                code
            }
            None => {
                if !self.rate_warned {
                    self.rate_warned = true;
                    rt_log!(
                        log,
                        "WARNING: invalid framerate {:.2} (using 25fps instead) - expect sync problems",
                        rate.fps()
                    );
                }
                MtcRateCode::Fps25
            }
        };

        loop {
            if mode != EmitMode::Rolling {
                rt_debug!(log, "sending sysex locate.");
                self.queue.flush();
                self.cursor = 0;
                let message = sysex_locate(&self.staged, code);
                self.queue.push(QueuedMidiEvent::locate(message, mfcnt));
                self.staged = *t;
            } else {
                let staged = self.staged;
                self.queue_quarter_frames(&staged, code, false, fptcf.round(), cfcnt, log);
                self.staged.increment(rate);
                cfcnt += fptcf;
                ofn = self.staged.to_frame_number(rate);
            }
            if mode != EmitMode::Rolling || ofn >= nfn + decodeahead {
                break;
            }
        }
    }

    /// Enqueues one four-quarter batch for `t`, spacing the events a quarter of `speed` samples
    /// apart starting at `posinfo`. Two batches transmit a whole timecode. In reverse mode the
    /// cursor walks 7..0.
    pub fn queue_quarter_frames(
        &mut self,
        t: &TimecodeTime,
        code: MtcRateCode,
        reverse: bool,
        speed: f64,
        posinfo: f64,
        log: &mut RtLog,
    ) {
        let qfl = speed / 4.0;

        if self.cursor != 0 && self.cursor != 4 {
            // this can actually never happen
            rt_log!(
                log,
                "quarter-frame mis-alignment: {} (should be 0 or 4)",
                self.cursor
            );
            self.cursor = 0;
        }
        if code == MtcRateCode::Fps25 && (t.frame % 2) == 1 && self.cursor == 0 {
            // at 25 fps a sequence may not start on an odd frame number, or the frame number
            // reconstructed from the eight quarters flips parity with the started sequence
            rt_log!(log, "re-align quarter-frame to even frame-number");
            return;
        }

        if self.cursor == 0 {
            // the sequence spans two frames; minute and hour may roll over before it completes
            self.window = *t;
        }
        let payloads = quarter_frame_payloads(&self.window, code);

        for i in 0..4 {
            if reverse {
                self.cursor = match self.cursor {
                    0 => 7,
                    n => n - 1,
                };
            }
            let align = (posinfo + f64::from(i) * qfl).round() as i64;
            self.queue.push(QueuedMidiEvent::quarter_frame(
                payloads[self.cursor as usize],
                align,
            ));
            if !reverse {
                self.cursor = (self.cursor + 1) % 8;
            }
        }
    }

    /// Moves every queued event whose latency-compensated alignment falls inside the cycle
    /// `[mfcnt, mfcnt + nframes)` out through `write`. Events stamped for an earlier cycle are
    /// dropped with a debug note; later events stay queued.
    pub fn drain<F>(&mut self, mfcnt: i64, nframes: u32, latency: u32, log: &mut RtLog, mut write: F)
    where
        F: FnMut(u32, &[u8]),
    {
        loop {
            let align = match self.queue.front() {
                Some(event) => event.align,
                None => break,
            };
            let mt = align - i64::from(latency);
            if mt >= mfcnt + i64::from(nframes) {
                break;
            }
            let event = match self.queue.pop() {
                Some(event) => event,
                None => break,
            };
            if mt < mfcnt {
                rt_debug!(
                    log,
                    "WARNING: MTC was for previous cycle (port latency too large?)"
                );
            } else {
                let mut event = event;
                event.time = (mt - mfcnt) as u32;
                write(event.time, &event.bytes[..event.size]);
            }
        }
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
