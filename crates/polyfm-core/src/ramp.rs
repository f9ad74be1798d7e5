//! Linear ramps for click-free gain changes.
//!
//! A [`LinearRamp`] moves from its current value to a target at a constant
//! rate over a fixed number of samples, then snaps to the exact target.
//! The voice pool uses one per voice to fade a stolen voice to silence
//! before it is reused.

/// A value with linear smoothing (constant rate of change).
///
/// # Example
///
/// ```rust
/// use polyfm_core::LinearRamp;
///
/// let mut gain = LinearRamp::new(1.0);
/// gain.ramp_to(0.0, 4);
/// assert_eq!(gain.advance(), 0.75);
/// assert_eq!(gain.advance(), 0.5);
/// assert_eq!(gain.advance(), 0.25);
/// assert_eq!(gain.advance(), 0.0);
/// assert!(gain.is_settled());
/// ```
#[derive(Debug, Clone)]
pub struct LinearRamp {
    /// Current value
    current: f32,
    /// Target value
    target: f32,
    /// Increment per sample (can be positive or negative)
    increment: f32,
    /// Samples remaining until target reached
    samples_remaining: u32,
}

impl LinearRamp {
    /// Create a settled ramp at `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
        }
    }

    /// Start a ramp toward `target` lasting `samples` samples.
    ///
    /// A length of zero jumps straight to the target.
    pub fn ramp_to(&mut self, target: f32, samples: u32) {
        self.target = target;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Set value immediately.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target; // Snap to exact target
            }
        }
        self.current
    }

    /// Get current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Check if the ramp has reached its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}

impl Default for LinearRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}
