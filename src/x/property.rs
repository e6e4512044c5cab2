//! Properties on the server

use crate::geometry::Dimension;
use x11rb::properties::{self, WmSizeHintsSpecification};

// ============================ SizeHints =============================
// ====================================================================

/// A client's `WM_NORMAL_HINTS`, normalized. A zero field means the client
/// did not provide the value
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub(crate) struct SizeHints {
    /// Base size, falls back to the minimum size
    pub(crate) base:       Dimension,
    /// Minimum size, falls back to the base size
    pub(crate) min:        Dimension,
    /// Maximum size
    pub(crate) max:        Dimension,
    /// Resize increments
    pub(crate) inc:        Dimension,
    /// Minimum aspect, expressed as `height / width`
    pub(crate) min_aspect: f32,
    /// Maximum aspect, expressed as `width / height`
    pub(crate) max_aspect: f32,
    /// The client asked for a position (user or program specified)
    pub(crate) position:   bool,
}

/// Keep only strictly positive pairs
fn positive((w, h): (i32, i32)) -> Dimension {
    Dimension::new(w.max(0) as u32, h.max(0) as u32)
}

impl From<&properties::WmSizeHints> for SizeHints {
    fn from(raw: &properties::WmSizeHints) -> Self {
        let given_base = raw.base_size.map(positive);
        let given_min = raw.min_size.map(positive);

        let base = given_base.or(given_min).unwrap_or_default();
        let min = given_min.or(given_base).unwrap_or_default();

        let (min_aspect, max_aspect) = raw.aspect.map_or((0.0, 0.0), |(min, max)| {
            let min_aspect = if min.numerator > 0 {
                min.denominator as f32 / min.numerator as f32
            } else {
                0.0
            };
            let max_aspect = if max.denominator > 0 {
                max.numerator as f32 / max.denominator as f32
            } else {
                0.0
            };
            (min_aspect, max_aspect)
        });

        Self {
            base,
            min,
            max: raw.max_size.map(positive).unwrap_or_default(),
            inc: raw.size_increment.map(positive).unwrap_or_default(),
            min_aspect,
            max_aspect,
            position: matches!(
                raw.position,
                Some((
                    WmSizeHintsSpecification::UserSpecified
                        | WmSizeHintsSpecification::ProgramSpecified,
                    _,
                    _
                ))
            ),
        }
    }
}

impl SizeHints {
    /// Create [`SizeHints`] with identical minimum and maximum sizes
    #[cfg(test)]
    pub(crate) fn fixed(width: u32, height: u32) -> Self {
        Self {
            min: Dimension::new(width, height),
            max: Dimension::new(width, height),
            base: Dimension::new(width, height),
            ..Self::default()
        }
    }

    /// A window whose maximum equals its minimum cannot be resized
    pub(crate) fn is_fixed(&self) -> bool {
        self.max.width > 0
            && self.max.height > 0
            && self.max.width == self.min.width
            && self.max.height == self.min.height
    }

    /// Adjust a client size following the ICCCM rules: base size is removed
    /// before the aspect and increment steps unless it equals the minimum size
    pub(crate) fn constrain(&self, width: i32, height: i32) -> (i32, i32) {
        let (base_w, base_h) = (self.base.width as i32, self.base.height as i32);
        let base_is_min = self.base == self.min;
        let (mut w, mut h) = (width, height);

        if !base_is_min {
            w -= base_w;
            h -= base_h;
        }

        if self.min_aspect > 0.0 && self.max_aspect > 0.0 && w > 0 && h > 0 {
            if self.max_aspect < w as f32 / h as f32 {
                w = (h as f32 * self.max_aspect + 0.5) as i32;
            } else if self.min_aspect < h as f32 / w as f32 {
                h = (w as f32 * self.min_aspect + 0.5) as i32;
            }
        }

        if base_is_min {
            w -= base_w;
            h -= base_h;
        }

        if self.inc.width > 0 {
            w -= w.rem_euclid(self.inc.width as i32);
        }
        if self.inc.height > 0 {
            h -= h.rem_euclid(self.inc.height as i32);
        }

        w = (w + base_w).max(self.min.width as i32);
        h = (h + base_h).max(self.min.height as i32);

        if self.max.width > 0 {
            w = w.min(self.max.width as i32);
        }
        if self.max.height > 0 {
            h = h.min(self.max.height as i32);
        }

        (w, h)
    }
}

// ============================== Hints ===============================
// ====================================================================

/// The parts of `WM_HINTS` the manager cares about
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Hints {
    /// The client asks for attention
    pub(crate) urgent: bool,
    /// `Some(false)` means the client never wants input focus
    pub(crate) input:  Option<bool>,
}

impl From<&properties::WmHints> for Hints {
    fn from(raw: &properties::WmHints) -> Self {
        Self {
            urgent: raw.urgent,
            input:  raw.input,
        }
    }
}

// ======================= Icccm Window State ======================
// ====================================================================

/// Possible values for setting the `WM_STATE` property on a client.
///
/// See the [ICCCM docs][1] for more information.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum IcccmWindowState {
    /// Newly created windows
    Withdrawn,
    /// Window is visible
    Normal,
    /// Window's icon is visible
    Iconic,
}

impl From<IcccmWindowState> for u32 {
    fn from(u: IcccmWindowState) -> Self {
        match u {
            IcccmWindowState::Withdrawn => 0,
            IcccmWindowState::Normal => 1,
            IcccmWindowState::Iconic => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SizeHints;
    use crate::geometry::Dimension;

    #[test]
    fn fixed_windows() {
        let hints = SizeHints::fixed(200, 100);
        assert!(hints.is_fixed());
        assert_eq!(hints.constrain(500_i32, 500_i32), (200_i32, 100_i32));
        assert_eq!(hints.constrain(1_i32, 1_i32), (200_i32, 100_i32));
    }

    #[test]
    fn increments_round_down() {
        // A terminal with a 6x12 cell and a 4px frame
        let hints = SizeHints {
            base: Dimension::new(4, 4),
            min: Dimension::new(10, 16),
            inc: Dimension::new(6, 12),
            ..SizeHints::default()
        };

        assert!(!hints.is_fixed());
        assert_eq!(hints.constrain(105_i32, 100_i32), (100_i32, 100_i32));
    }

    #[test]
    fn aspect_limits_width() {
        let hints = SizeHints {
            min_aspect: 2.0,
            max_aspect: 1.0,
            ..SizeHints::default()
        };

        assert_eq!(hints.constrain(400_i32, 200_i32), (200_i32, 200_i32));
        // Too tall for the minimum aspect
        assert_eq!(hints.constrain(100_i32, 400_i32), (100_i32, 200_i32));
        assert_eq!(hints.constrain(100_i32, 150_i32), (100_i32, 150_i32));
    }
}
