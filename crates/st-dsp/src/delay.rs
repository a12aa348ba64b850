//! Sample-accurate circular delay lines
//!
//! One `DelayLine` per routing contribution, sized to the matrix's
//! maximum delay so every contribution shares the same memory bound.

use st_core::Sample;

/// Fixed-delay circular buffer
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<Sample>,
    write_pos: usize,
    delay: usize,
}

impl DelayLine {
    /// Create a line delaying by `delay_samples`, with capacity for
    /// `max_delay_samples` (the matrix-wide maximum).
    pub fn new(delay_samples: usize, max_delay_samples: usize) -> Self {
        let capacity = max_delay_samples.max(delay_samples) + 1;
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay: delay_samples,
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.delay
    }

    /// Push one sample, read the sample from `delay` frames ago.
    /// Zero delay is a pass-through.
    #[inline]
    pub fn process(&mut self, input: Sample) -> Sample {
        let len = self.buffer.len();
        self.buffer[self.write_pos] = input;
        let read_pos = (self.write_pos + len - self.delay) % len;
        let out = self.buffer[read_pos];
        self.write_pos = (self.write_pos + 1) % len;
        out
    }

    /// Delay a whole buffer in place; late samples fall off the end
    pub fn process_block(&mut self, io: &mut [Sample]) {
        for s in io.iter_mut() {
            *s = self.process(*s);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
