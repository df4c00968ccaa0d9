//! Current clamp point process

use crate::error::{CableNeuronError, MorphologyError, StimulusError};
use crate::morphology::SectionId;


/// Injects a constant current at a single location during a time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentClamp {
    /// Section the clamp is placed in
    pub section: SectionId,
    /// Normalized location along the section
    pub location: f64,
    /// Onset (ms)
    pub delay: f64,
    /// Duration (ms)
    pub dur: f64,
    /// Amplitude (nA), positive values depolarize
    pub amp: f64,
}

impl CurrentClamp {
    /// Creates an inactive clamp at the given location
    pub fn new(section: SectionId, location: f64) -> Self {
        CurrentClamp {
            section,
            location,
            delay: 0.,
            dur: 0.,
            amp: 0.,
        }
    }

    /// Injected current at time `t` (nA)
    pub fn current_at(&self, t: f64) -> f64 {
        if self.is_active(t) {
            self.amp
        } else {
            0.
        }
    }

    /// Whether `t` falls inside the stimulus window
    pub fn is_active(&self, t: f64) -> bool {
        t >= self.delay && t < self.delay + self.dur
    }

    /// Checks location and timing parameters
    pub fn validate(&self) -> Result<(), CableNeuronError> {
        if !(0. ..=1.).contains(&self.location) {
            return Err(MorphologyError::LocationOutOfRange(self.location).into());
        }
        if !(self.delay.is_finite() && self.delay >= 0.) {
            return Err(StimulusError::InvalidDelay.into());
        }
        if !(self.dur.is_finite() && self.dur >= 0.) {
            return Err(StimulusError::InvalidDuration.into());
        }
        if !self.amp.is_finite() {
            return Err(StimulusError::InvalidAmplitude.into());
        }

        Ok(())
    }
}
