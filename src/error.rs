//! Errors found throughout this crate

use crate::monitor::client::ClientId;
use thiserror::Error;
use x11rb::{
    errors::ConnectError,
    protocol::{xproto, ErrorKind},
};

/// Errors that occur from interacting with the X-Server or the configuration
#[derive(Debug, Error)]
pub(crate) enum Error {
    /// A property holding a value of the wrong format
    #[error("the property {0} holds an invalid value")]
    InvalidProperty(String),

    /// Failure to connect to the server
    #[error("failed to connect to the X11 server: {0}")]
    Connection(#[from] ConnectError),

    /// `SubstructureRedirect` on the root window is taken
    #[error("another window manager is already running")]
    OtherWmRunning,

    /// The previous owner of the window manager selection did not go away
    #[error("the running window manager did not give up its selection")]
    ReplaceTimeout,

    /// An error the server reported that cannot be ignored
    #[error("fatal X11 error {kind:?} from request {request}")]
    Protocol {
        /// Major opcode of the failed request
        request: u8,
        /// Kind of error
        kind:    ErrorKind,
    },

    /// A handle that is not in the client arena
    #[error("{0} is not managed")]
    UnknownClient(ClientId),

    /// A key or button binding that could not be parsed
    #[error("invalid binding `{0}`: {1}")]
    InvalidBinding(String, String),

    /// A color that is not `#rrggbb`
    #[error("invalid color `{0}`")]
    InvalidColor(String),
}

/// Errors caused by windows disappearing while requests about them are in
/// flight, or by grabs other clients already hold
pub(crate) fn is_benign(request: u8, kind: ErrorKind) -> bool {
    matches!(
        (request, kind),
        (_, ErrorKind::Window)
            | (xproto::SET_INPUT_FOCUS_REQUEST, ErrorKind::Match)
            | (xproto::CONFIGURE_WINDOW_REQUEST, ErrorKind::Match)
            | (xproto::GRAB_BUTTON_REQUEST, ErrorKind::Access)
            | (xproto::GRAB_KEY_REQUEST, ErrorKind::Access)
            | (xproto::POLY_TEXT8_REQUEST, ErrorKind::Drawable)
            | (xproto::POLY_FILL_RECTANGLE_REQUEST, ErrorKind::Drawable)
            | (xproto::POLY_SEGMENT_REQUEST, ErrorKind::Drawable)
            | (xproto::COPY_AREA_REQUEST, ErrorKind::Drawable)
    )
}

#[cfg(test)]
mod tests {
    use super::is_benign;
    use x11rb::protocol::{xproto, ErrorKind};

    #[test]
    fn races_are_ignored() {
        assert!(is_benign(xproto::MAP_WINDOW_REQUEST, ErrorKind::Window));
        assert!(is_benign(xproto::SET_INPUT_FOCUS_REQUEST, ErrorKind::Match));
        assert!(is_benign(xproto::GRAB_KEY_REQUEST, ErrorKind::Access));
        assert!(!is_benign(xproto::CHANGE_WINDOW_ATTRIBUTES_REQUEST, ErrorKind::Access));
        assert!(!is_benign(xproto::CONFIGURE_WINDOW_REQUEST, ErrorKind::Value));
    }
}
