//! Metadata about a managed X-window

use crate::{
    core::{Pid, TagMask, Window, MISSING_VALUE},
    geometry::Rectangle,
    x::property::SizeHints,
};
use bitflags::bitflags;
use std::fmt;

// ============================= ClientId =============================
// ====================================================================

/// Stable handle of a [`Client`] inside the manager's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ClientId(pub(crate) usize);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

// ============================ ClientFlags ===========================
// ====================================================================

bitflags! {
    /// Boolean state of a [`Client`]
    #[derive(Default)]
    pub(crate) struct ClientFlags: u32 {
        /// Exempt from the layout
        const FLOATING     = 0b0000_0000_0001;
        /// Minimum size equals maximum size
        const FIXED        = 0b0000_0000_0010;
        /// Asked for attention
        const URGENT       = 0b0000_0000_0100;
        /// Covers the whole monitor
        const FULLSCREEN   = 0b0000_0000_1000;
        /// Can swallow its children
        const TERMINAL     = 0b0000_0001_0000;
        /// Must never be swallowed
        const NO_SWALLOW   = 0b0000_0010_0000;
        /// Never receives input focus
        const NEVER_FOCUS  = 0b0000_0100_0000;
        /// `_NET_WM_WINDOW_TYPE_DESKTOP`
        const DESKTOP      = 0b0000_1000_0000;
        /// Floating state before going fullscreen
        const OLD_FLOATING = 0b0001_0000_0000;
        /// Raise on the next restack even when tiled
        const RAISE_ME     = 0b0010_0000_0000;
    }
}

// ============================== Opacity =============================
// ====================================================================

/// Opacity requested for a [`Client`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Opacity {
    /// No override, the window is drawn as the client wants
    Unset,
    /// An explicit value in `[0, 1]`
    Set(f64),
    /// A value that is remembered but currently not applied
    Suspended(f64),
}

impl Default for Opacity {
    fn default() -> Self {
        Self::Unset
    }
}

impl Opacity {
    /// Opacity given to the selected window while it is being dragged
    pub(crate) const DRAG: f64 = 0.42;

    /// The value written to `_NET_WM_WINDOW_OPACITY`, if any
    pub(crate) fn value(self) -> Option<f64> {
        match self {
            Self::Set(v) if (0.0..=1.0).contains(&v) => Some(v),
            _ => None,
        }
    }

    /// Whether the client asked to be drawn fully opaque
    pub(crate) fn is_opaque(self) -> bool {
        matches!(self, Self::Set(v) if (v - 1.0).abs() < f64::EPSILON)
    }

    /// Walk the cycle `unset -> shade -> suspended -> shade -> ...`. An opaque
    /// client goes back to unset
    pub(crate) fn cycle(self, shade: f64) -> Self {
        match self {
            Self::Unset => Self::Set(shade),
            Self::Suspended(v) => Self::Set(v),
            Self::Set(v) if v < 1.0 => Self::Suspended(v),
            Self::Set(_) => Self::Unset,
        }
    }

    /// Add `delta` to the opacity, wrapping around at both ends
    pub(crate) fn adjust(self, delta: f64) -> Self {
        let current = match self {
            Self::Unset => -1.0,
            Self::Set(v) => v,
            Self::Suspended(v) => v - 1.0,
        };

        let next = current + delta;
        if next < 0.0 {
            Self::Set(1.0)
        } else if next > 1.0 {
            Self::Set(0.1)
        } else {
            Self::Set(next)
        }
    }
}

// =============================== Client =============================
// ====================================================================

/// Bounds and switches consulted when resolving a client's geometry
#[derive(Debug, Clone, Copy)]
pub(crate) struct HintContext {
    /// The whole display
    pub(crate) screen:      Rectangle,
    /// Usable area of the client's monitor
    pub(crate) window_area: Rectangle,
    /// Height of the bar, used as a minimum size
    pub(crate) bar_height:  u32,
    /// Size hints are honored for tiled clients as well
    pub(crate) honor_hints: bool,
    /// The monitor's layout positions windows
    pub(crate) arranged:    bool,
}

/// Information about a managed top-level [`Window`]
#[derive(Debug, Clone)]
pub(crate) struct Client {
    pub(crate) id:       ClientId,
    pub(crate) window:   Window,
    pub(crate) name:     String,
    pub(crate) class:    String,
    pub(crate) instance: String,
    pub(crate) pid:      Option<Pid>,

    /// Position of the outer corner and the inner size
    pub(crate) rect:             Rectangle,
    /// Geometry to come back to after fullscreen or floating
    pub(crate) old_rect:         Rectangle,
    pub(crate) border_width:     u32,
    pub(crate) old_border_width: u32,

    pub(crate) hints:       SizeHints,
    /// Cleared when `WM_NORMAL_HINTS` changes
    pub(crate) hints_valid: bool,

    pub(crate) tags:    TagMask,
    pub(crate) flags:   ClientFlags,
    pub(crate) opacity: Opacity,
    /// Index of the owning monitor
    pub(crate) monitor: usize,

    /// A child hidden behind this client's window
    pub(crate) swallowing: Option<ClientId>,
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Client {
    /// Create a new [`Client`]
    pub(crate) fn new(id: ClientId, window: Window, rect: Rectangle, monitor: usize) -> Self {
        Self {
            id,
            window,
            name: String::from(MISSING_VALUE),
            class: String::from(MISSING_VALUE),
            instance: String::from(MISSING_VALUE),
            pid: None,
            rect,
            old_rect: rect,
            border_width: 0,
            old_border_width: 0,
            hints: SizeHints::default(),
            hints_valid: false,
            tags: 0,
            flags: ClientFlags::empty(),
            opacity: Opacity::Unset,
            monitor,
            swallowing: None,
        }
    }

    /// Check a state flag
    pub(crate) const fn is(&self, flag: ClientFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Set or clear a state flag
    pub(crate) fn set(&mut self, flag: ClientFlags, value: bool) {
        self.flags.set(flag, value);
    }

    pub(crate) const fn is_floating(&self) -> bool {
        self.is(ClientFlags::FLOATING)
    }

    pub(crate) const fn is_fullscreen(&self) -> bool {
        self.is(ClientFlags::FULLSCREEN)
    }

    /// Width including both borders
    pub(crate) const fn outer_width(&self) -> u32 {
        self.rect.width() + 2 * self.border_width
    }

    /// Height including both borders
    pub(crate) const fn outer_height(&self) -> u32 {
        self.rect.height() + 2 * self.border_width
    }

    /// The inner rectangle for an outer cell handed out by a layout
    pub(crate) const fn inner(&self, cell: Rectangle) -> Rectangle {
        cell.shrink(self.border_width)
    }

    /// Resolve a proposed geometry into one the client accepts. Returns the
    /// resulting rectangle and whether it differs from the current one
    pub(crate) fn apply_size_hints(
        &self,
        proposed: Rectangle,
        interactive: bool,
        ctx: &HintContext,
    ) -> (Rectangle, bool) {
        let bw = self.border_width as i32;
        let (mut x, mut y) = proposed.point.as_tuple();
        let mut w = proposed.width().max(1) as i32;
        let mut h = proposed.height().max(1) as i32;

        let bounds = if interactive { ctx.screen } else { ctx.window_area };
        if interactive {
            if x > bounds.right() {
                x = bounds.right() - (w + 2 * bw);
            }
            if y > bounds.bottom() {
                y = bounds.bottom() - (h + 2 * bw);
            }
            if x + w + 2 * bw < bounds.x() {
                x = bounds.x();
            }
            if y + h + 2 * bw < bounds.y() {
                y = bounds.y();
            }
        } else {
            if x >= bounds.right() {
                x = bounds.right() - (w + 2 * bw);
            }
            if y >= bounds.bottom() {
                y = bounds.bottom() - (h + 2 * bw);
            }
            if x + w + 2 * bw <= bounds.x() {
                x = bounds.x();
            }
            if y + h + 2 * bw <= bounds.y() {
                y = bounds.y();
            }
        }

        // 1x1 windows would otherwise bounce against the bar height forever
        let bar = ctx.bar_height as i32;
        if h < bar && h != 1 && w != 1 {
            h = bar;
        }
        if w < bar && h != 1 && w != 1 {
            w = bar;
        }

        if ctx.honor_hints || self.is_floating() || !ctx.arranged {
            let (cw, ch) = self.hints.constrain(w, h);
            w = cw;
            h = ch;
        }

        let rect = Rectangle::new(x, y, w.max(1) as u32, h.max(1) as u32);
        (rect, rect != self.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::{Client, ClientFlags, ClientId, HintContext, Opacity};
    use crate::{geometry::Rectangle, x::property::SizeHints};

    fn context(honor_hints: bool) -> HintContext {
        HintContext {
            screen: Rectangle::new(0, 0, 1920, 1080),
            window_area: Rectangle::new(0, 20, 1920, 1060),
            bar_height: 20,
            honor_hints,
            arranged: true,
        }
    }

    fn client() -> Client {
        let mut c = Client::new(ClientId(0), 0x40_0001, Rectangle::new(10, 30, 300, 300), 0);
        c.border_width = 1;
        c
    }

    #[test]
    fn fixed_size_wins_in_both_modes() {
        let mut c = client();
        c.hints = SizeHints::fixed(200, 100);
        c.rect = Rectangle::new(0, 0, 50, 50);
        let proposed = Rectangle::new(0, 0, 500, 500);

        for interactive in [false, true] {
            let (rect, changed) = c.apply_size_hints(proposed, interactive, &context(true));
            assert_eq!(rect.width(), 200_u32);
            assert_eq!(rect.height(), 100_u32);
            assert_eq!(rect.x(), 0_i32);
            assert!(changed);
        }

        let (rect, _) = c.apply_size_hints(proposed, false, &context(true));
        assert_eq!(rect, Rectangle::new(0, 0, 200, 100));
    }

    #[test]
    fn hints_ignored_for_tiled_when_disabled() {
        let mut c = client();
        c.hints = SizeHints::fixed(200, 100);
        let (rect, _) = c.apply_size_hints(Rectangle::new(0, 20, 500, 500), false, &context(false));
        assert_eq!(rect, Rectangle::new(0, 20, 500, 500));

        c.set(ClientFlags::FLOATING, true);
        let (rect, _) = c.apply_size_hints(Rectangle::new(0, 20, 500, 500), false, &context(false));
        assert_eq!(rect, Rectangle::new(0, 20, 200, 100));
    }

    #[test]
    fn pulled_back_into_view() {
        let c = client();
        let (rect, _) =
            c.apply_size_hints(Rectangle::new(5000, 20, 100, 100), false, &context(false));
        assert_eq!(rect.x(), 1920 - 102);

        let (rect, _) =
            c.apply_size_hints(Rectangle::new(-500, 20, 100, 100), true, &context(false));
        assert_eq!(rect.x(), 0);
    }

    #[test]
    fn tiny_windows_are_not_inflated() {
        let c = client();
        let (rect, _) = c.apply_size_hints(Rectangle::new(0, 20, 1, 1), false, &context(false));
        assert_eq!((rect.width(), rect.height()), (1, 1));

        let (rect, _) = c.apply_size_hints(Rectangle::new(0, 20, 5, 5), false, &context(false));
        assert_eq!((rect.width(), rect.height()), (20, 20));
    }

    #[test]
    fn unchanged_geometry_is_reported() {
        let c = client();
        let (_, changed) = c.apply_size_hints(c.rect, false, &context(false));
        assert!(!changed);
    }

    #[test]
    fn opacity_cycle() {
        let shade = 0.6;
        let set = Opacity::Unset.cycle(shade);
        assert_eq!(set, Opacity::Set(0.6));
        let suspended = set.cycle(shade);
        assert_eq!(suspended, Opacity::Suspended(0.6));
        assert_eq!(suspended.value(), None);
        assert_eq!(suspended.cycle(shade), Opacity::Set(0.6));
        assert_eq!(Opacity::Set(1.0).cycle(shade), Opacity::Unset);
    }

    #[test]
    fn opacity_adjust_wraps() {
        assert_eq!(Opacity::Set(0.95).adjust(0.1), Opacity::Set(0.1));
        assert_eq!(Opacity::Set(0.05).adjust(-0.1), Opacity::Set(1.0));
        assert_eq!(Opacity::Unset.adjust(0.1), Opacity::Set(1.0));
        assert!(Opacity::Set(1.0).is_opaque());
    }
}
