/*!
The `transport` module models what the generator learns from the host transport each cycle, and
tracks the MTC frame rate when the user asked to follow the host's video rate.
!*/

use crate::core::{MtcRateCode, TimecodeRate};
use crate::ring::RtLog;

/// The transport states the emitter distinguishes. `Locating` covers the host's "starting"
/// phase, where the position is known but playback has not begun.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportMode {
    Stopped,
    Locating,
    Rolling,
}

/// One cycle's view of the host transport. The video fields are optional because not every host
/// (or host binding) reports them.
#[derive(Clone, Copy, Debug)]
pub struct TransportSnapshot {
    pub mode: TransportMode,
    pub sample_pos: u32,
    pub video_offset: Option<u32>,
    pub audio_frames_per_video_frame: Option<f32>,
}

impl TransportSnapshot {
    /// The position the timecode is derived from: the transport position minus the host's video
    /// offset, saturating at zero when the offset reaches past the session start.
    pub fn effective_sample_pos(&self) -> u32 {
        match self.video_offset {
            Some(offset) => self.sample_pos.saturating_sub(offset),
            None => self.sample_pos,
        }
    }
}

/// Tracks the MTC frame rate across cycles. When following the host video rate, a change of the
/// host's audio-frames-per-video-frame value reclassifies the rate against the four MTC rates;
/// unclassifiable values are logged and the previous rate stays in effect.
pub struct RateFollower {
    rate: TimecodeRate,
    follow: bool,
    last_apv: f32,
}

impl RateFollower {
    pub fn new(rate: TimecodeRate, follow: bool) -> Self {
        Self {
            rate,
            follow,
            last_apv: 0.0,
        }
    }

    pub fn rate(&self) -> &TimecodeRate {
        &self.rate
    }

    /// Inspects one transport snapshot. Returns `true` when the frame rate changed, in which case
    /// the caller must recompute whatever it derived from the rate (lookahead depth in
    /// particular).
    pub fn observe(
        &mut self,
        snapshot: &TransportSnapshot,
        sample_rate: u32,
        log: &mut RtLog,
    ) -> bool {
        if !self.follow {
            return false;
        }
        let apv = match snapshot.audio_frames_per_video_frame {
            Some(apv) if apv != self.last_apv => apv,
            _ => return false,
        };
        self.last_apv = apv;
        rt_log!(log, "new APV: {:.2}", apv);
        match MtcRateCode::from_video_rate(sample_rate, apv) {
            Some(code) => {
                let mut rate = code.rate();
                rate.set_sample_subframes(sample_rate);
                self.rate = rate;
                rt_log!(log, "FPS changed to {}", rate);
                true
            }
            None => {
                rt_log!(log, "invalid framerate.");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FPS_25;
    use crate::ring::{log_ring, Waker};

    fn snapshot(apv: Option<f32>) -> TransportSnapshot {
        TransportSnapshot {
            mode: TransportMode::Rolling,
            sample_pos: 0,
            video_offset: None,
            audio_frames_per_video_frame: apv,
        }
    }

    #[test]
    fn video_offset_subtracts_and_saturates() {
        let mut snap = snapshot(None);
        snap.sample_pos = 10_000;
        snap.video_offset = Some(4_000);
        assert_eq!(snap.effective_sample_pos(), 6_000);
        snap.video_offset = Some(20_000);
        assert_eq!(snap.effective_sample_pos(), 0);
        snap.video_offset = None;
        assert_eq!(snap.effective_sample_pos(), 10_000);
    }

    #[test]
    fn follower_ignores_when_disabled() {
        let waker = Waker::new();
        let (mut log, mut drain) = log_ring(&waker, false);
        let mut follower = RateFollower::new(FPS_25, false);
        assert!(!follower.observe(&snapshot(Some(2000.0)), 48_000, &mut log));
        assert_eq!(drain.take_string(), "");
        assert_eq!(follower.rate().fps(), 25.0);
    }

    #[test]
    fn follower_reclassifies_once_per_change() {
        let waker = Waker::new();
        let (mut log, mut drain) = log_ring(&waker, false);
        let mut follower = RateFollower::new(FPS_25, true);

        // 48000 / 2000 = 24 fps
        assert!(follower.observe(&snapshot(Some(2000.0)), 48_000, &mut log));
        assert_eq!(follower.rate().fps(), 24.0);
        assert_eq!(follower.rate().subframes(), 2000);
        let text = drain.take_string();
        assert!(text.contains("new APV: 2000.00"));
        assert!(text.contains("FPS changed to 24.00"));

        // the same value again is quiet
        assert!(!follower.observe(&snapshot(Some(2000.0)), 48_000, &mut log));
        assert_eq!(drain.take_string(), "");
    }

    #[test]
    fn follower_keeps_rate_on_invalid_video_rate() {
        let waker = Waker::new();
        let (mut log, mut drain) = log_ring(&waker, false);
        let mut follower = RateFollower::new(FPS_25, true);

        // 48000 / 500 = 96 fps, not an MTC rate
        assert!(!follower.observe(&snapshot(Some(500.0)), 48_000, &mut log));
        assert_eq!(follower.rate().fps(), 25.0);
        assert!(drain.take_string().contains("invalid framerate."));
    }

    #[test]
    fn follower_detects_drop_frame() {
        let waker = Waker::new();
        let (mut log, _drain) = log_ring(&waker, false);
        let mut follower = RateFollower::new(FPS_25, true);

        // 48000 / 1601.6 = 29.97 fps
        assert!(follower.observe(&snapshot(Some(1601.6)), 48_000, &mut log));
        assert!(follower.rate().is_drop());
        assert_eq!(follower.rate().frames_round(), 30);
    }
}
