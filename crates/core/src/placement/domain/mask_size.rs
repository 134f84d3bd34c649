use crate::shared::constants::{DEFAULT_MASK_SIZE, MASK_SIZE_STEP, MAX_MASK_SIZE, MIN_MASK_SIZE};

/// Clamps a size multiplier to [0.5, 2.0] and snaps it to the 0.05 step.
/// Non-finite input gives the default size.
pub fn snap(value: f64) -> f64 {
    if !value.is_finite() {
        return DEFAULT_MASK_SIZE;
    }
    let clamped = value.clamp(MIN_MASK_SIZE, MAX_MASK_SIZE);
    let steps = ((clamped - MIN_MASK_SIZE) / MASK_SIZE_STEP).round();
    // Round away accumulated float error so 1.1 stays 1.1
    ((MIN_MASK_SIZE + steps * MASK_SIZE_STEP) * 100.0).round() / 100.0
}

/// Whole-percent label for a size multiplier, e.g. `1.25` -> `125`.
pub fn percent(value: f64) -> u32 {
    (snap(value) * 100.0).round() as u32
}
