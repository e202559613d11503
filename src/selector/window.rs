/// How many candidates are revealed.
///
/// Starts at `base`, grows by `base` per scroll step, never past the number
/// of candidates available, and only shrinks through [`reset`](Self::reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateWindow {
    base: usize,
    size: usize,
}

impl CandidateWindow {
    #[must_use]
    pub fn new(base: usize) -> Self {
        let base = base.max(1);
        Self { base, size: base }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn base(&self) -> usize {
        self.base
    }

    /// Back to the initial increment.
    pub fn reset(&mut self) {
        self.size = self.base;
    }

    /// Reveals one more increment out of `available`. Returns whether it grew.
    pub fn grow(&mut self, available: usize) -> bool {
        if self.size >= available {
            return false;
        }
        self.size = (self.size + self.base).min(available);
        true
    }

    /// Whether every one of `available` candidates is revealed.
    #[must_use]
    pub fn covers(&self, available: usize) -> bool {
        self.size >= available
    }
}

/// Scroll position of the candidate list, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f32,
    pub client_height: f32,
    pub scroll_height: f32,
}

impl ScrollMetrics {
    #[must_use]
    pub fn distance_to_bottom(&self) -> f32 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }
}
