//! X11 Events

use crate::{
    core::Window,
    geometry::{Point, Rectangle},
    x::input::{Button, Keysym},
};
use x11rb::protocol::ErrorKind;

// ============================== XEvent ==============================

/// Low-level wrapper around X-server events
///
/// Translated into state changes by the `WindowManager`
#[derive(Debug, Clone)]
pub(crate) enum XEvent {
    /// Notification that a window has changed its configuration
    ConfigureNotify(ConfigureEvent),
    /// Request for configuration from a client
    ConfigureRequest(ConfigureRequestData),
    /// A client is requesting to be mapped
    MapRequest {
        window:            Window,
        override_redirect: bool,
    },
    /// A client has unmapped a window
    UnmapNotify {
        window:    Window,
        /// Sent by the client with `SendEvent`
        synthetic: bool,
    },
    /// A client has destroyed a window
    DestroyNotify(Window),
    /// The pointer has entered a window
    EnterNotify(PointerEvent),
    /// The pointer moved over the root window
    MotionNotify(PointerEvent),
    /// A window property was changed
    PropertyNotify(PropertyEvent),
    /// A key combination was pressed
    KeyPress(KeypressEvent),
    /// A mouse button was pressed
    ButtonPress(MouseEvent),
    /// A mouse button was released
    ButtonRelease(MouseEvent),
    /// A client message was received
    ClientMessage(ClientMessageEvent),
    /// A window received the input focus
    FocusIn(Window),
    /// The keyboard mapping changed and keys have to be grabbed again
    MappingNotify,
    /// A request failed
    ProtocolError {
        /// Major opcode of the failed request
        request: u8,
        kind:    ErrorKind,
    },
    /// Unknown event type, used as a catchall for events not tracked
    Unknown(u8),
}

/// Data associated with a configure event
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConfigureEvent {
    /// The window associated with the event
    pub(crate) id:      Window,
    /// The new geometry of the window
    pub(crate) geom:    Rectangle,
    /// Is the window the root window?
    pub(crate) is_root: bool,
}

/// Data associated with a configure request. Only the fields in the request's
/// value mask are given
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct ConfigureRequestData {
    /// The window associated with the event
    pub(crate) id:           Window,
    pub(crate) x:            Option<i32>,
    pub(crate) y:            Option<i32>,
    pub(crate) width:        Option<u32>,
    pub(crate) height:       Option<u32>,
    pub(crate) border_width: Option<u32>,
    /// Sibling window of id. Used if `stack_mode` is set
    pub(crate) sibling:      Option<Window>,
    /// Raw stack mode
    pub(crate) stack_mode:   Option<u32>,
}

/// Data associated with a pointer event (Enter, Motion)
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointerEvent {
    /// The id of the event window
    pub(crate) id:     Window,
    /// The absolute position of the pointer (relative to root)
    pub(crate) abs:    Point,
    /// Time of the event in milliseconds
    pub(crate) time:   u32,
    /// Crossing in `Normal` mode onto a non-inferior window. Always `true`
    /// for motion
    pub(crate) normal: bool,
}

/// The properties whose changes the manager reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropertyKind {
    /// `WM_NAME` or `_NET_WM_NAME`
    Name,
    /// `WM_NORMAL_HINTS`
    NormalHints,
    /// `WM_HINTS`
    Hints,
    /// `WM_TRANSIENT_FOR`
    TransientFor,
    /// `_NET_WM_WINDOW_TYPE`
    WindowType,
    /// Anything else
    Other,
}

/// Data associated with a property change event
#[derive(Debug, Clone, Copy)]
pub(crate) struct PropertyEvent {
    /// The window associated with the event
    pub(crate) id:      Window,
    pub(crate) kind:    PropertyKind,
    /// Whether the property was deleted
    pub(crate) deleted: bool,
}

/// Data associated with a key press event
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeypressEvent {
    /// The state of modifier keys was active at the time
    pub(crate) mask:   u16,
    /// The keysym of the key pressed, without the shift level
    pub(crate) keysym: Keysym,
}

/// Data associated with a button event
#[derive(Debug, Clone, Copy)]
pub(crate) struct MouseEvent {
    /// The window the pointer was on when the button was pressed
    pub(crate) id:       Window,
    /// The location of the pointer (relative to root)
    pub(crate) location: Point,
    pub(crate) button:   Option<Button>,
    /// The state of the modifiers
    pub(crate) mask:     u16,
}

/// A `_NET_WM_STATE` action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    /// Parse the first data field of a `_NET_WM_STATE` message
    pub(crate) const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Remove),
            1 => Some(Self::Add),
            2 => Some(Self::Toggle),
            _ => None,
        }
    }

    /// Whether a state currently `on` is on after the action
    pub(crate) const fn apply(self, on: bool) -> bool {
        match self {
            Self::Remove => false,
            Self::Add => true,
            Self::Toggle => !on,
        }
    }
}

/// The client messages the manager reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientMessageEvent {
    /// `_NET_WM_STATE` naming `_NET_WM_STATE_FULLSCREEN`
    Fullscreen(Window, StateAction),
    /// `_NET_ACTIVE_WINDOW`
    ActiveWindow(Window),
    /// Anything else
    Other(Window),
}

#[cfg(test)]
mod tests {
    use super::StateAction;

    #[test]
    fn state_actions() {
        assert_eq!(StateAction::from_u32(3), None);
        let toggle = StateAction::from_u32(2).unwrap();
        assert!(toggle.apply(false));
        assert!(!toggle.apply(true));
        assert!(StateAction::Add.apply(true));
        assert!(!StateAction::Remove.apply(true));
    }
}
