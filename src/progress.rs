/// One sample of session progress, taken each time a sentence is completed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPoint {
    /// Seconds since the session started.
    pub secs: f64,
    pub wpm: f64,
    pub score: u32,
}

impl ProgressPoint {
    pub fn new(secs: f64, wpm: f64, score: u32) -> Self {
        Self { secs, wpm, score }
    }

    /// `(secs, wpm)` pair in the shape chart datasets expect.
    pub fn wpm_xy(&self) -> (f64, f64) {
        (self.secs, self.wpm)
    }

    pub fn score_xy(&self) -> (f64, f64) {
        (self.secs, f64::from(self.score))
    }
}
