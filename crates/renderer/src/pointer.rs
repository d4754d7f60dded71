//! Pointer target and its exponentially smoothed follower.

/// Both pointers start centred before any input arrives.
pub const POINTER_ORIGIN: [f32; 2] = [0.5, 0.5];

/// Raw pointer target plus the smoothed position handed to the shader.
///
/// Coordinates are normalised to the window with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    target: [f32; 2],
    smoothed: [f32; 2],
    smoothing: f32,
}

impl PointerState {
    pub fn new(smoothing: f32) -> Self {
        Self {
            target: POINTER_ORIGIN,
            smoothed: POINTER_ORIGIN,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
        }
    }

    /// Overwrites the target; only the latest input matters.
    pub fn set_target(&mut self, target: [f32; 2]) {
        if target.iter().all(|value| value.is_finite()) {
            self.target = target;
        }
    }

    pub fn target(&self) -> [f32; 2] {
        self.target
    }

    pub fn smoothed(&self) -> [f32; 2] {
        self.smoothed
    }

    /// Moves the smoothed pointer a fixed fraction of the way to the target.
    /// Called once per rendered frame.
    pub fn step(&mut self) -> [f32; 2] {
        for axis in 0..2 {
            self.smoothed[axis] += (self.target[axis] - self.smoothed[axis]) * self.smoothing;
        }
        self.smoothed
    }

    /// Euclidean distance between the smoothed pointer and its target.
    pub fn distance(&self) -> f32 {
        let dx = self.target[0] - self.smoothed[0];
        let dy = self.target[1] - self.smoothed[1];
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(0.05)
    }
}
