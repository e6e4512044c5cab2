//! Arguments describing how a setting should change

use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Either a step relative to the current value or an absolute value
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Change<T> {
    /// Add to the current value
    Inc(T),
    /// Replace the current value
    Set(T),
}

impl<T: Add<Output = T> + Copy> Change<T> {
    /// Apply the [`Change`] to `current`
    pub(crate) fn apply(self, current: T) -> T {
        match self {
            Self::Inc(step) => current + step,
            Self::Set(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Change;

    #[test]
    fn change_apply() {
        assert_eq!(Change::Inc(2_i32).apply(3), 5);
        assert_eq!(Change::Set(0.5_f32).apply(3.0), 0.5);
    }
}
