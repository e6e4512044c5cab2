//! Base types used throughout [`tagwm`]

pub(crate) mod change;
pub(crate) mod decoration;

use crate::x::xconnection::Atoms;
use std::fmt;

// Re-export
pub(crate) use x11rb::protocol::xproto::{Atom, Window};

/// Type alias used for syntax compatibility
pub(crate) type Pid = u32;
/// Bitmask of tags. Bit `n` is tag `n + 1`
pub(crate) type TagMask = u32;

/// Sentinel requesting every configured tag
pub(crate) const ALL_TAGS: TagMask = !0;

/// Value used when a window does not provide its class, instance or title
pub(crate) const MISSING_VALUE: &str = "broken";

/// Window manager's name
#[macro_export]
macro_rules! WM_NAME (
    () => { "tagwm" };
);

// =============================== Tags ===============================
// ====================================================================

/// Mask covering the first `count` tags
pub(crate) const fn tag_mask(count: usize) -> TagMask {
    if count >= TagMask::BITS as usize {
        ALL_TAGS
    } else {
        (1 << count) - 1
    }
}

/// Zero-based index of the lowest tag in `mask`, if any
pub(crate) const fn lowest_tag(mask: TagMask) -> Option<u32> {
    if mask == 0 {
        None
    } else {
        Some(mask.trailing_zeros())
    }
}

/// Index into the per-tag store for a visible tagset. Showing every tag maps
/// to slot `0`, anything else to its lowest tag plus one
pub(crate) const fn pertag_index(mask: TagMask, valid: TagMask) -> usize {
    if mask & valid == valid {
        0
    } else {
        match lowest_tag(mask) {
            Some(idx) => idx as usize + 1,
            None => 0,
        }
    }
}

/// Value of `_NET_WM_DESKTOP` for a client carrying `tags`
pub(crate) const fn desktop_index(tags: TagMask) -> u32 {
    if tags.count_ones() == 1 {
        tags.trailing_zeros()
    } else {
        0xFFFF_FFFF
    }
}

// ============================ WindowType ============================
// ====================================================================

/// The `_NET_WM_WINDOW_TYPE` categories the manager reacts to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum WindowType {
    /// A normal, top-level window
    Normal,
    /// A dialog window
    Dialog,
    /// Single window containing desktop icons same dimensions as the screen
    Desktop,
    /// Dock or panel
    Dock,
    /// A splash screen, a.k.a., an application startup screen
    Splash,
    /// Small persistent utility window (e.g., pallete or toolbox)
    Utility,
}

impl WindowType {
    /// Convert an [`Atom`] to a [`WindowType`]
    pub(crate) fn from_atom(atoms: &Atoms, atom: Atom) -> Option<Self> {
        match atom {
            a if a == atoms._NET_WM_WINDOW_TYPE_NORMAL => Some(Self::Normal),
            a if a == atoms._NET_WM_WINDOW_TYPE_DIALOG => Some(Self::Dialog),
            a if a == atoms._NET_WM_WINDOW_TYPE_DESKTOP => Some(Self::Desktop),
            a if a == atoms._NET_WM_WINDOW_TYPE_DOCK => Some(Self::Dock),
            a if a == atoms._NET_WM_WINDOW_TYPE_SPLASH => Some(Self::Splash),
            a if a == atoms._NET_WM_WINDOW_TYPE_UTILITY => Some(Self::Utility),
            _ => None,
        }
    }
}

impl Default for WindowType {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Normal => "normal",
            Self::Dialog => "dialog",
            Self::Desktop => "desktop",
            Self::Dock => "dock",
            Self::Splash => "splash",
            Self::Utility => "utility",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{desktop_index, pertag_index, tag_mask, ALL_TAGS};

    #[test]
    fn pertag_slots() {
        let valid = tag_mask(9);
        assert_eq!(valid, 0x1FF_u32);
        assert_eq!(pertag_index(0b1, valid), 1);
        assert_eq!(pertag_index(0b1100, valid), 3);
        assert_eq!(pertag_index(valid, valid), 0);
        assert_eq!(pertag_index(ALL_TAGS, valid), 0);
    }

    #[test]
    fn net_desktop() {
        assert_eq!(desktop_index(0b100), 2);
        assert_eq!(desktop_index(0b101), 0xFFFF_FFFF);
    }
}
