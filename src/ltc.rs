/*!
The `ltc` module feeds LTC audio into the external decoder and correlates the decoded frames with
the host sample clock. The bit-level demodulation itself is `timecode-coder`'s business; this
module only remaps the float samples to the 8-bit PCM the decoder expects and timestamps whatever
comes out.
!*/

use crate::constants::LTC_BLOCK_MAX;
use crate::record::DecodedRecord;
use crate::ring::Sender;
use timecode_coder::ltc_decoder::LtcDecoder;
use timecode_coder::FramesPerSecond;

/// Decodes one LTC audio input and emits timestamped records.
pub struct LtcIngest {
    decoder: LtcDecoder<u8>,
    source: i8,
    sample_rate: u32,
    /// Samples per timecode frame at the configured fallback rate, used to back-date a decoded
    /// frame to its start when the decoder could not measure the rate.
    fallback_fps: f64,
}

impl LtcIngest {
    /// `source` is the LTC input number (1 or 2). `fallback_fps` is used for frame-length
    /// back-dating until the decoder has measured the incoming rate.
    pub fn new(source: i8, sample_rate: u32, fallback_fps: f64) -> Self {
        Self {
            decoder: LtcDecoder::new(sample_rate),
            source,
            sample_rate,
            fallback_fps,
        }
    }

    /// Feeds one audio period. `posinfo` is the host monotonic sample of the first sample in the
    /// block, already compensated for the port capture latency. Returns `false` when the block
    /// was too large for the fixed conversion buffer and had to be skipped.
    ///
    /// Decoded frames are timestamped with the host sample at which the frame *started*: the
    /// decoder reports a frame at the sample that completes it, one frame length after its start.
    pub fn ingest(&mut self, samples: &[f32], posinfo: i64, records: &mut Sender<DecodedRecord>) -> bool {
        if samples.len() > LTC_BLOCK_MAX {
            return false;
        }
        for (i, &sample) in samples.iter().enumerate() {
            if let Some(tc) = self.decoder.get_timecode_frame(pcm_u8(sample)) {
                let fps = match tc.frames_per_second {
                    FramesPerSecond::TwentyFour => 24.0,
                    FramesPerSecond::TwentyFive => 25.0,
                    FramesPerSecond::Thirty => 30.0,
                    _ => self.fallback_fps,
                };
                let frame_len = (f64::from(self.sample_rate) / fps).round() as i64;
                records.send(DecodedRecord {
                    source: self.source,
                    hour: tc.hours,
                    minute: tc.minutes,
                    second: tc.seconds,
                    frame: tc.frames,
                    rate: None,
                    sample: posinfo + i as i64 + 1 - frame_len,
                });
            }
        }
        true
    }
}

/// The 8-bit remap the decoder expects: `round(127 * x + 128)`, i.e. unsigned PCM centered on 128.
fn pcm_u8(sample: f32) -> u8 {
    ((127.0 * sample + 128.0).round() as i32 & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::{channel, Waker};

    #[test]
    fn pcm_remap_range() {
        assert_eq!(pcm_u8(0.0), 128);
        assert_eq!(pcm_u8(1.0), 255);
        assert_eq!(pcm_u8(-1.0), 1);
        assert_eq!(pcm_u8(0.5), 192);
    }

    #[test]
    fn oversized_block_is_skipped() {
        let waker = Waker::new();
        let (mut tx, mut rx) = channel(4, &waker);
        let mut ingest = LtcIngest::new(1, 48_000, 25.0);
        let block = vec![0.0f32; LTC_BLOCK_MAX + 1];
        assert!(!ingest.ingest(&block, 0, &mut tx));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn silence_decodes_nothing() {
        let waker = Waker::new();
        let (mut tx, mut rx) = channel(4, &waker);
        let mut ingest = LtcIngest::new(1, 48_000, 25.0);
        let block = vec![0.0f32; 1024];
        assert!(ingest.ingest(&block, 0, &mut tx));
        assert!(rx.try_recv().is_none());
    }
}
