//! Fixed-length delay line used by the reverb combs.

/// A ring buffer that returns the sample written `len` calls earlier.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Creates a delay of `len` samples (at least one).
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            write_pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Runs one sample through a feedback comb and returns the delayed
    /// output, writing `input + output * feedback` back into the line.
    pub fn comb(&mut self, input: f32, feedback: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input + delayed * feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_time() {
        let mut line = DelayLine::new(3);
        let out: Vec<f32> = [1.0, 0.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&x| line.comb(x, 0.0))
            .collect();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_feedback_repeats_decay() {
        let mut line = DelayLine::new(2);
        let mut out = Vec::new();
        out.push(line.comb(1.0, 0.5));
        for _ in 0..6 {
            out.push(line.comb(0.0, 0.5));
        }
        assert_eq!(out, vec![0.0, 0.0, 1.0, 0.0, 0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_zero_length_becomes_one() {
        let mut line = DelayLine::new(0);
        assert_eq!(line.len(), 1);
        assert_eq!(line.comb(1.0, 0.0), 0.0);
        assert_eq!(line.comb(0.0, 0.0), 1.0);
    }
}
