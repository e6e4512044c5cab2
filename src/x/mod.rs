//! Everything that talks to the X-Server

pub(crate) mod event;
pub(crate) mod input;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod property;
pub(crate) mod xconnection;

use self::{
    event::{ConfigureRequestData, XEvent},
    input::{ButtonCombo, KeyCombo},
    property::{Hints, IcccmWindowState, SizeHints},
};
use crate::{
    core::{decoration::Color, Pid, TagMask, Window, WindowType},
    geometry::{Point, Rectangle},
};
use anyhow::Result;

/// Attributes and geometry of a window that is not managed yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WindowAttributes {
    pub(crate) override_redirect: bool,
    /// Mapped and shown
    pub(crate) viewable:          bool,
    /// Position of the outer corner and the inner size
    pub(crate) rect:              Rectangle,
    pub(crate) border_width:      u32,
}

/// Cursor shown while the pointer is grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorKind {
    Move,
    Resize,
}

/// The requests the window manager makes of the display server.
///
/// Failures caused by windows that disappear in the meantime are not reported
/// as errors by implementations; queries about such windows return `None` or
/// empty values
pub(crate) trait XConn {
    // ============================ Queries ===========================

    /// The root window
    fn root(&self) -> Window;

    /// Geometry of every distinct physical screen
    fn screen_rects(&self) -> Result<Vec<Rectangle>>;

    /// Position of the pointer relative to the root window
    fn pointer_position(&self) -> Result<Point>;

    /// Children of the root window, bottom to top
    fn top_level_windows(&self) -> Result<Vec<Window>>;

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes>;

    /// `WM_CLASS` as `(class, instance)`, empty strings when missing
    fn window_class(&self, window: Window) -> (String, String);

    /// `_NET_WM_NAME`, falling back to `WM_NAME`
    fn window_title(&self, window: Window) -> String;

    fn window_pid(&self, window: Window) -> Option<Pid>;

    /// `WM_TRANSIENT_FOR`
    fn transient_for(&self, window: Window) -> Option<Window>;

    /// First recognized `_NET_WM_WINDOW_TYPE`
    fn window_type(&self, window: Window) -> Option<WindowType>;

    /// `_NET_WM_STATE` holds `_NET_WM_STATE_FULLSCREEN`
    fn requests_fullscreen(&self, window: Window) -> bool;

    /// `WM_NORMAL_HINTS`
    fn size_hints(&self, window: Window) -> Option<SizeHints>;

    /// `WM_HINTS`
    fn wm_hints(&self, window: Window) -> Option<Hints>;

    /// `WM_STATE` is iconic
    fn is_iconic(&self, window: Window) -> bool;

    /// Tags stored on the window by an earlier run
    fn tags_property(&self, window: Window) -> Option<TagMask>;

    /// Modifier bit the num-lock key is mapped to
    fn numlock_mask(&self) -> u16;

    // ============================ Geometry ==========================

    /// Move and resize; `rect` is the outer corner and the inner size
    fn configure_window(&self, window: Window, rect: Rectangle, border_width: u32) -> Result<()>;

    /// Tell the client about its geometry without changing it
    fn send_configure_notify(
        &self,
        window: Window,
        rect: Rectangle,
        border_width: u32,
    ) -> Result<()>;

    /// Pass a configure request of an unmanaged window through unchanged
    fn forward_configure_request(&self, request: &ConfigureRequestData) -> Result<()>;

    fn move_window(&self, window: Window, point: Point) -> Result<()>;

    fn set_border_width(&self, window: Window, width: u32) -> Result<()>;

    fn set_border_color(&self, window: Window, color: Color) -> Result<()>;

    fn raise_window(&self, window: Window) -> Result<()>;

    /// Stack `window` directly below `sibling`, or at the bottom
    fn stack_below(&self, window: Window, sibling: Option<Window>) -> Result<()>;

    // ========================= Mapping/Focus ========================

    fn map_window(&self, window: Window) -> Result<()>;

    fn unmap_window(&self, window: Window) -> Result<()>;

    /// Give input focus and update `_NET_ACTIVE_WINDOW`. `None` resets the
    /// focus to the root window
    fn focus_window(&self, window: Option<Window>) -> Result<()>;

    /// Send `WM_TAKE_FOCUS` if the window supports it
    fn send_take_focus(&self, window: Window) -> Result<()>;

    /// Ask politely with `WM_DELETE_WINDOW`, otherwise kill the client
    fn close_window(&self, window: Window) -> Result<()>;

    /// `WM_STATE`
    fn set_client_state(&self, window: Window, state: IcccmWindowState) -> Result<()>;

    /// `_NET_WM_WINDOW_OPACITY`; `None` removes the property
    fn set_opacity(&self, window: Window, opacity: Option<f64>) -> Result<()>;

    /// `_NET_WM_STATE`
    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> Result<()>;

    /// Set or clear the urgency flag of `WM_HINTS`
    fn set_urgency_hint(&self, window: Window, urgent: bool) -> Result<()>;

    /// Store the tags (`_TAGWM_TAGS`) and the desktop (`_NET_WM_DESKTOP`)
    fn set_tags_property(&self, window: Window, tags: TagMask) -> Result<()>;

    /// Events of a newly managed window
    fn select_client_events(&self, window: Window, focus_follows_mouse: bool) -> Result<()>;

    // ============================= Input ============================

    fn grab_keys(&self, keys: &[KeyCombo]) -> Result<()>;

    /// Focused windows get the configured buttons, unfocused ones every
    /// button so a click can focus them
    fn grab_buttons(&self, window: Window, focused: bool, buttons: &[ButtonCombo]) -> Result<()>;

    /// Returns `false` if another client holds the pointer
    fn grab_pointer(&self, cursor: CursorKind) -> Result<bool>;

    fn ungrab_pointer(&self) -> Result<()>;

    /// Move the pointer to `point` relative to `window`
    fn warp_pointer(&self, window: Window, point: Point) -> Result<()>;

    // ============================= EWMH =============================

    /// `_NET_CLIENT_LIST`
    fn update_client_list(&self, windows: &[Window]) -> Result<()>;

    /// `_NET_CURRENT_DESKTOP`
    fn set_current_desktop(&self, index: u32) -> Result<()>;

    // ============================ Events ============================

    /// Block until the next event arrives
    fn next_event(&self) -> Result<XEvent>;

    fn flush(&self) -> Result<()>;
}
