use crate::core::MtcRateCode;

/// The source id of the MTC input. LTC inputs are numbered from one; the reader prints the
/// absolute value.
pub const SOURCE_MTC: i8 = -1;

/// One decoded timecode, tagged with where it came from and when it happened on the host sample
/// clock. This is what travels through the RT-to-printer ring; it is `Copy` and fixed-size so the
/// ring transfer involves no ownership subtleties.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodedRecord {
    /// [`SOURCE_MTC`] for the MIDI input, `1` or `2` for the LTC inputs.
    pub source: i8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
    /// The wire rate for MTC sources. LTC frames do not carry their rate; `None` prints as a
    /// placeholder.
    pub rate: Option<MtcRateCode>,
    /// Host monotonic sample at which the event is deemed to have occurred, after latency and
    /// transmission compensation.
    pub sample: i64,
}

impl DecodedRecord {
    /// Formats one stdout line, terminated by `newline`. In carriage-return mode the LTC lines
    /// are pushed right so they do not fight the MTC line for the same columns.
    pub fn print_line(&self, newline: char) -> String {
        match self.rate {
            Some(rate) => format!(
                "MTC{} {:02}:{:02}:{:02}.{:02} [{}] {}{}",
                self.source.abs(),
                self.hour,
                self.minute,
                self.second,
                self.frame,
                rate.label(),
                self.sample,
                newline
            ),
            None => format!(
                "{}LTC{} {:02}:{:02}:{:02}.{:02} ------- {}{}",
                if newline == '\r' { "\t\t\t\t" } else { "" },
                self.source.abs(),
                self.hour,
                self.minute,
                self.second,
                self.frame,
                self.sample,
                newline
            ),
        }
    }
}
