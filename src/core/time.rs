use crate::core::rate::TimecodeRate;
use std::fmt::{Display, Formatter};

/// Frames in one ten-minute block of 29.97 drop-frame timecode: `30 * 600 - 9 * 2`.
const DROP_FRAMES_PER_10MIN: i64 = 17982;

/// Frames in one of the nine dropped minutes of such a block: `30 * 60 - 2`.
const DROP_FRAMES_PER_MIN: i64 = 1798;

/// A SMPTE timecode instant. The `subframe` field subdivides one frame into
/// [`TimecodeRate::subframes`] units; both tools set the resolution to one audio sample so that a
/// time derived from the transport remembers its offset into the current frame.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimecodeTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
    pub subframe: u32,
}

impl TimecodeTime {
    pub fn new(hour: u8, minute: u8, second: u8, frame: u8) -> Self {
        Self {
            hour,
            minute,
            second,
            frame,
            subframe: 0,
        }
    }

    /// Counts the frames from `00:00:00.00` up to this time. For drop-frame rates the dropped
    /// frame numbers (frames 0 and 1 of every minute not divisible by ten) are not counted.
    pub fn to_frame_number(&self, rate: &TimecodeRate) -> i64 {
        let fps = i64::from(rate.frames_round());
        let seconds =
            i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second);
        let mut n = seconds * fps + i64::from(self.frame);
        if rate.is_drop() {
            let minutes = i64::from(self.hour) * 60 + i64::from(self.minute);
            n -= 2 * (minutes - minutes / 10);
        }
        n
    }

    /// The inverse of [`to_frame_number`](Self::to_frame_number). The subframe of the result is
    /// zero.
    pub fn from_frame_number(rate: &TimecodeRate, frame_number: i64) -> Self {
        let fps = i64::from(rate.frames_round());
        let mut n = frame_number.max(0);
        if rate.is_drop() {
            let d = n / DROP_FRAMES_PER_10MIN;
            let m = n % DROP_FRAMES_PER_10MIN;
            n += 18 * d;
            if m >= 2 {
                n += 2 * ((m - 2) / DROP_FRAMES_PER_MIN);
            }
        }
        Self {
            hour: ((n / (fps * 3600)) % 24) as u8,
            minute: ((n / (fps * 60)) % 60) as u8,
            second: ((n / fps) % 60) as u8,
            frame: (n % fps) as u8,
            subframe: 0,
        }
    }

    /// Converts an absolute sample position on the host clock into a timecode. The fractional part
    /// of the frame lands in `subframe`, scaled to the rate's subframe resolution. Exact integer
    /// arithmetic; the emitter aligns its schedule on the subframe and a one-sample rounding
    /// wobble here would tear the quarter-frame grid.
    pub fn from_sample(rate: &TimecodeRate, sample_rate: u32, sample: i64) -> Self {
        let frames = i128::from(sample.max(0)) * i128::from(rate.num());
        let samples_per_den = i128::from(rate.den()) * i128::from(sample_rate);
        let whole = frames / samples_per_den;
        let rem = frames % samples_per_den;
        let mut time = Self::from_frame_number(rate, whole as i64);
        time.subframe = ((rem * i128::from(rate.subframes())) / samples_per_den) as u32;
        time
    }

    /// Advances by exactly one timecode frame, skipping dropped frame numbers.
    pub fn increment(&mut self, rate: &TimecodeRate) {
        let fps = rate.frames_round() as u8;
        self.frame += 1;
        if self.frame >= fps {
            self.frame = 0;
            self.second += 1;
            if self.second >= 60 {
                self.second = 0;
                self.minute += 1;
                if self.minute >= 60 {
                    self.minute = 0;
                    self.hour += 1;
                    if self.hour >= 24 {
                        self.hour = 0;
                    }
                }
                if rate.is_drop() && self.minute % 10 != 0 {
                    self.frame = 2;
                }
            }
        }
    }
}

impl Display for TimecodeTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            self.hour, self.minute, self.second, self.frame
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::{FPS_24, FPS_25, FPS_2997DF, FPS_30};

    #[test]
    fn frame_number_at_25fps() {
        let t = TimecodeTime::new(1, 0, 0, 0);
        assert_eq!(t.to_frame_number(&FPS_25), 90_000);
        assert_eq!(TimecodeTime::from_frame_number(&FPS_25, 90_000), t);
    }

    #[test]
    fn drop_frame_minute_boundary() {
        // 00:01:00.00 does not exist in drop-frame; the first frame of minute one is 00:01:00.02
        // and it follows 00:00:59.29 immediately.
        let before = TimecodeTime::new(0, 0, 59, 29);
        let after = TimecodeTime::new(0, 1, 0, 2);
        assert_eq!(before.to_frame_number(&FPS_2997DF), 1799);
        assert_eq!(after.to_frame_number(&FPS_2997DF), 1800);
        assert_eq!(TimecodeTime::from_frame_number(&FPS_2997DF, 1799), before);
        assert_eq!(TimecodeTime::from_frame_number(&FPS_2997DF, 1800), after);
    }

    #[test]
    fn drop_frame_ten_minute_boundary() {
        // Minute ten keeps its frames 0 and 1.
        let t = TimecodeTime::new(0, 10, 0, 0);
        assert_eq!(t.to_frame_number(&FPS_2997DF), 17_982);
        assert_eq!(TimecodeTime::from_frame_number(&FPS_2997DF, 17_982), t);
    }

    #[test]
    fn drop_frame_round_trip_sweep() {
        for n in (0..200_000i64).step_by(7) {
            let t = TimecodeTime::from_frame_number(&FPS_2997DF, n);
            assert_eq!(t.to_frame_number(&FPS_2997DF), n, "frame number {}", n);
        }
    }

    #[test]
    fn increment_cascades() {
        let mut t = TimecodeTime::new(0, 0, 59, 23);
        t.increment(&FPS_24);
        assert_eq!(t, TimecodeTime::new(0, 1, 0, 0));

        let mut t = TimecodeTime::new(23, 59, 59, 29);
        t.increment(&FPS_30);
        assert_eq!(t, TimecodeTime::new(0, 0, 0, 0));
    }

    #[test]
    fn increment_skips_dropped_frames() {
        let mut t = TimecodeTime::new(0, 0, 59, 29);
        t.increment(&FPS_2997DF);
        assert_eq!(t, TimecodeTime::new(0, 1, 0, 2));

        let mut t = TimecodeTime::new(0, 9, 59, 29);
        t.increment(&FPS_2997DF);
        assert_eq!(t, TimecodeTime::new(0, 10, 0, 0));
    }

    #[test]
    fn from_sample_at_48k() {
        let t = TimecodeTime::from_sample(&FPS_25, 48_000, 48_000);
        assert_eq!(t, TimecodeTime::new(0, 0, 1, 0));

        // Halfway into frame zero: subframe carries the sample offset once the resolution is set
        // to one sample per subframe.
        let mut rate = FPS_25;
        rate.set_sample_subframes(48_000);
        let t = TimecodeTime::from_sample(&rate, 48_000, 960);
        assert_eq!(t.frame, 0);
        assert_eq!(t.subframe, 960);
    }

    #[test]
    fn display_format() {
        let t = TimecodeTime::new(1, 2, 3, 4);
        assert_eq!(format!("{}", t), "01:02:03.04");
    }
}
