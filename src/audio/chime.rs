use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

/// Two-tone notification chime (a rising fifth) with an exponential decay per note.
pub struct Chime {
    notes: [f32; 2],
    note_samples: usize,
    num_sample: usize,
}

impl Chime {
    pub fn new() -> Self {
        Self {
            notes: [659.25, 987.77], // E5, B5
            note_samples: (SAMPLE_RATE as f32 * 0.35) as usize,
            num_sample: 0,
        }
    }

    fn total_samples(&self) -> usize {
        self.note_samples * self.notes.len()
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples() {
            return None;
        }

        let note = self.notes[self.num_sample / self.note_samples];
        let offset = (self.num_sample % self.note_samples) as f32 / SAMPLE_RATE as f32;
        self.num_sample += 1;

        let envelope = (-offset * 9.0).exp();
        Some((2.0 * PI * note * offset).sin() * envelope * 0.2)
    }
}

impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples() - self.num_sample.min(self.total_samples()))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples() as f32 / SAMPLE_RATE as f32,
        ))
    }
}
