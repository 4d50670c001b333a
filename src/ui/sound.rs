/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is synthesised into an in-memory WAV buffer at start-up
/// and played fire-and-forget through a detached Sink.
///
/// Build without the "sound" feature to get the silent stub instead.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::synth;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_start: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_coin: Arc<Vec<u8>>,
        sfx_speed_up: Arc<Vec<u8>>,
        sfx_crash: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, running silent: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_start: Arc::new(synth::make_wav(&synth::gen_start())),
                sfx_jump: Arc::new(synth::make_wav(&synth::gen_jump())),
                sfx_coin: Arc::new(synth::make_wav(&synth::gen_coin())),
                sfx_speed_up: Arc::new(synth::make_wav(&synth::gen_speed_up())),
                sfx_crash: Arc::new(synth::make_wav(&synth::gen_crash())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_start(&self) { self.play(&self.sfx_start); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_coin(&self) { self.play(&self.sfx_coin); }
        pub fn play_speed_up(&self) { self.play(&self.sfx_speed_up); }
        pub fn play_crash(&self) { self.play(&self.sfx_crash); }
    }
}

// ════════════════════════════════════════════════════════════
//  Synthesis: mono f32 samples and the WAV wrapper
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    pub const SAMPLE_RATE: u32 = 22050;

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Play `notes` back to back. `harmonics` are (multiple, weight) pairs.
    fn sequence(notes: &[(f32, f32)], harmonics: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, dur) in notes {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.6);
                let wave: f32 = harmonics
                    .iter()
                    .map(|&(mult, w)| (t * freq * mult * TAU).sin() * w)
                    .sum();
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// Run start: quick rising triad.
    pub fn gen_start() -> Vec<f32> {
        sequence(&[(523.0, 0.06), (659.0, 0.06), (784.0, 0.10)], &[(1.0, 0.8), (2.0, 0.2)], 0.25)
    }

    /// Jump: short upward chirp.
    pub fn gen_jump() -> Vec<f32> {
        let n = samples_for(0.09);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 320.0 + t * 520.0;
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                (phase * TAU).sin() * env * 0.22
            })
            .collect()
    }

    /// Yuanbao pickup: bright two-note "ding".
    pub fn gen_coin() -> Vec<f32> {
        sequence(&[(1319.0, 0.04), (1976.0, 0.12)], &[(1.0, 0.7), (3.0, 0.3)], 0.22)
    }

    /// Speed tier reached: three quick ascending pips.
    pub fn gen_speed_up() -> Vec<f32> {
        sequence(&[(880.0, 0.04), (1047.0, 0.04), (1319.0, 0.07)], &[(1.0, 1.0)], 0.18)
    }

    /// Crash into a mountain: noisy thud sliding down.
    pub fn gen_crash() -> Vec<f32> {
        let n = samples_for(0.45);
        let mut rng: u32 = 0x2545_F491;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 160.0;
                phase += freq / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.5);
                ((phase * TAU).sin() * 0.6 + noise * 0.4) * env * 0.3
            })
            .collect()
    }

    /// 16-bit PCM mono WAV.
    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = gen_coin();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn effects_stay_in_range() {
            for fx in [gen_start(), gen_jump(), gen_coin(), gen_speed_up(), gen_crash()] {
                assert!(!fx.is_empty());
                assert!(fx.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_start(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_coin(&self) {}
    pub fn play_speed_up(&self) {}
    pub fn play_crash(&self) {}
}
