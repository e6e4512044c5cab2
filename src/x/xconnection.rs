//! The [`x11rb`] backed [`XConn`]

use super::{
    event::{
        ClientMessageEvent as TagwmClientMessage,
        ConfigureEvent,
        ConfigureRequestData,
        KeypressEvent,
        MouseEvent,
        PointerEvent,
        PropertyEvent,
        PropertyKind,
        StateAction,
        XEvent,
    },
    input::{Button, ButtonCombo, KeyCombo, Keysym},
    property::{Hints, IcccmWindowState, SizeHints},
    CursorKind,
    WindowAttributes,
    XConn,
};
use crate::{
    config::Config,
    core::{decoration::Color, desktop_index, Atom, Pid, TagMask, Window, WindowType},
    error::Error,
    geometry::{Point, Rectangle},
    WM_NAME,
};
use anyhow::{Context, Result};
use std::{
    cell::RefCell,
    collections::HashMap,
    thread,
    time::Duration,
};
use x11rb::{
    atom_manager,
    connection::Connection,
    cursor::Handle as CursorHandle,
    errors::ReplyError,
    properties::{WmClass, WmHints, WmSizeHints},
    protocol::{
        res::{self, ConnectionExt as _},
        xinerama::ConnectionExt as _,
        xproto::{
            self,
            Allow,
            AtomEnum,
            ButtonIndex,
            ChangeWindowAttributesAux,
            ClientMessageEvent,
            ConfigWindow,
            ConfigureNotifyEvent,
            ConfigureWindowAux,
            ConnectionExt,
            CreateWindowAux,
            Cursor,
            EventMask,
            GrabMode,
            GrabStatus,
            InputFocus,
            Keycode,
            MapState,
            ModMask,
            NotifyDetail,
            NotifyMode,
            PropMode,
            Property,
            StackMode,
            WindowClass,
        },
        ErrorKind,
        Event,
    },
    resource_manager::Database,
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    CURRENT_TIME,
    NONE,
};

/// `XK_Num_Lock`
const NUM_LOCK: Keysym = 0xFF7F;

/// How long a replaced window manager gets to release its selection
const REPLACE_ATTEMPTS: usize = 50;
const REPLACE_INTERVAL: Duration = Duration::from_millis(100);

// ============================== Atoms ===============================
// ====================================================================

atom_manager! {
    // Atoms interned once at startup. See the [ICCCM][1] and the [EWMH][2]
    //
    // [1]: https://tronche.com/gui/x/icccm/sec-4.html
    // [2]: https://specifications.freedesktop.org/wm-spec/wm-spec-latest.html
    pub(crate) Atoms: AtomsCookie {
        ATOM,
        CARDINAL,
        WINDOW,
        UTF8_STRING,

        // ICCCM
        WM_NAME,
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_TAKE_FOCUS,
        WM_STATE,
        WM_TRANSIENT_FOR,
        WM_HINTS,
        WM_NORMAL_HINTS,

        // EWMH root properties
        _NET_SUPPORTED,
        _NET_SUPPORTING_WM_CHECK,
        _NET_CLIENT_LIST,
        _NET_ACTIVE_WINDOW,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_DESKTOP_NAMES,
        _NET_CURRENT_DESKTOP,

        // EWMH client properties
        _NET_WM_NAME,
        _NET_WM_PID,
        _NET_WM_DESKTOP,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_WINDOW_OPACITY,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_NORMAL,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_WM_WINDOW_TYPE_DESKTOP,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_SPLASH,
        _NET_WM_WINDOW_TYPE_UTILITY,

        MANAGER,
        _TAGWM_TAGS,
    }
}

// =========================== XConnection ============================
// ====================================================================

/// Cursors shown on the root window and during drags
#[derive(Debug, Clone, Copy)]
struct Cursors {
    normal: Cursor,
    moving: Cursor,
    sizing: Cursor,
}

/// Connection to the X server
pub(crate) struct XConnection {
    conn:         RustConnection,
    /// Index of the screen being managed
    screen:       usize,
    root:         Window,
    atoms:        Atoms,
    /// Window announcing the manager to EWMH clients and owning `WM_S<n>`
    check_window: Window,
    cursors:      Cursors,
    /// Unshifted keysym of every keycode
    keysyms:      RefCell<HashMap<Keycode, Keysym>>,
    numlock:      RefCell<u16>,
}

impl XConnection {
    /// Connect to the display named by `$DISPLAY`
    pub(crate) fn connect() -> Result<Self> {
        let (conn, screen) = x11rb::connect(None).map_err(Error::Connection)?;
        let root = conn.setup().roots[screen].root;
        log::debug!("connected to screen {}, root {:#0x}", screen, root);

        let atoms = Atoms::new(&conn)
            .context("failed to intern atoms")?
            .reply()
            .context("failed to intern atoms")?;

        let check_window = conn.generate_id().context("failed to generate an `ID`")?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1),
        )
        .context("failed to create the check window")?
        .check()
        .context("failed to create the check window")?;

        let cursors = Self::load_cursors(&conn, screen)?;

        let xconn = Self {
            conn,
            screen,
            root,
            atoms,
            check_window,
            cursors,
            keysyms: RefCell::new(HashMap::new()),
            numlock: RefCell::new(0),
        };
        xconn.refresh_keyboard()?;

        Ok(xconn)
    }

    fn load_cursors(conn: &RustConnection, screen: usize) -> Result<Cursors> {
        let db = Database::new_from_default(conn).context("failed to read the resource database")?;
        let handle = CursorHandle::new(conn, screen, &db)
            .context("failed to load the cursor theme")?
            .reply()
            .context("failed to load the cursor theme")?;
        let load = |name: &str| {
            handle
                .load_cursor(conn, name)
                .with_context(|| format!("failed to load cursor `{}`", name))
        };

        Ok(Cursors {
            normal: load("left_ptr")?,
            moving: load("fleur")?,
            sizing: load("sizing")?,
        })
    }

    /// Take over the root window. With `replace`, a running manager owning the
    /// `WM_S<n>` selection is asked to leave first
    pub(crate) fn become_wm(&self, replace: bool, config: &Config) -> Result<()> {
        let selection = self
            .conn
            .intern_atom(false, format!("WM_S{}", self.screen).as_bytes())?
            .reply()
            .context("failed to intern the manager selection")?
            .atom;
        let owner = self.conn.get_selection_owner(selection)?.reply()?.owner;

        if owner != NONE {
            if !replace {
                return Err(Error::OtherWmRunning.into());
            }
            log::info!("replacing the window manager owning {:#0x}", owner);
            self.conn.change_window_attributes(
                owner,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
            )?;
        }

        self.conn
            .set_selection_owner(self.check_window, selection, CURRENT_TIME)?;

        if owner != NONE {
            self.wait_for_exit(owner)?;
        }

        let mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::BUTTON_PRESS
            | EventMask::POINTER_MOTION
            | EventMask::ENTER_WINDOW
            | EventMask::LEAVE_WINDOW
            | EventMask::PROPERTY_CHANGE;
        let redirect = self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new()
                .event_mask(mask)
                .cursor(self.cursors.normal),
        )?;
        match redirect.check() {
            Err(ReplyError::X11Error(err)) if err.error_kind == ErrorKind::Access =>
                return Err(Error::OtherWmRunning.into()),
            Err(e) => return Err(e).context("failed to select events on the root window"),
            Ok(()) => {},
        }

        // Let clients know a new manager owns the selection
        let announce = ClientMessageEvent::new(32, self.root, self.atoms.MANAGER, [
            CURRENT_TIME,
            selection,
            self.check_window,
            0,
            0,
        ]);
        self.conn
            .send_event(false, self.root, EventMask::STRUCTURE_NOTIFY, &announce)?;

        self.init_ewmh(&config.global.tags)?;
        log::info!("{} manages screen {}", WM_NAME!(), self.screen);
        Ok(())
    }

    fn wait_for_exit(&self, owner: Window) -> Result<()> {
        for _ in 0..REPLACE_ATTEMPTS {
            if self.conn.get_geometry(owner)?.reply().is_err() {
                return Ok(());
            }
            thread::sleep(REPLACE_INTERVAL);
        }

        Err(Error::ReplaceTimeout.into())
    }

    /// Advertise the supported hints and the desktops
    fn init_ewmh(&self, tags: &[String]) -> Result<()> {
        let atoms = &self.atoms;

        self.conn.change_property32(
            PropMode::REPLACE,
            self.check_window,
            atoms._NET_SUPPORTING_WM_CHECK,
            AtomEnum::WINDOW,
            &[self.check_window],
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            self.check_window,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            WM_NAME!().as_bytes(),
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms._NET_SUPPORTING_WM_CHECK,
            AtomEnum::WINDOW,
            &[self.check_window],
        )?;

        let supported = [
            atoms._NET_SUPPORTED,
            atoms._NET_SUPPORTING_WM_CHECK,
            atoms._NET_CLIENT_LIST,
            atoms._NET_ACTIVE_WINDOW,
            atoms._NET_NUMBER_OF_DESKTOPS,
            atoms._NET_DESKTOP_NAMES,
            atoms._NET_CURRENT_DESKTOP,
            atoms._NET_WM_NAME,
            atoms._NET_WM_DESKTOP,
            atoms._NET_WM_STATE,
            atoms._NET_WM_STATE_FULLSCREEN,
            atoms._NET_WM_WINDOW_OPACITY,
            atoms._NET_WM_WINDOW_TYPE,
            atoms._NET_WM_WINDOW_TYPE_DIALOG,
            atoms._NET_WM_WINDOW_TYPE_DESKTOP,
        ];
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms._NET_SUPPORTED,
            AtomEnum::ATOM,
            &supported,
        )?;

        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms._NET_NUMBER_OF_DESKTOPS,
            AtomEnum::CARDINAL,
            &[tags.len() as u32],
        )?;
        let names = tags.iter().fold(Vec::new(), |mut acc, name| {
            acc.extend_from_slice(name.as_bytes());
            acc.push(0);
            acc
        });
        self.conn.change_property8(
            PropMode::REPLACE,
            self.root,
            atoms._NET_DESKTOP_NAMES,
            atoms.UTF8_STRING,
            &names,
        )?;

        self.conn
            .delete_property(self.root, atoms._NET_CLIENT_LIST)?;
        self.conn
            .delete_property(self.root, atoms._NET_ACTIVE_WINDOW)?;

        Ok(())
    }

    /// Re-read the keyboard and modifier mappings
    fn refresh_keyboard(&self) -> Result<()> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let mapping = self
            .conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()
            .context("failed to read the keyboard mapping")?;

        let per_keycode = usize::from(mapping.keysyms_per_keycode.max(1));
        let keysyms = mapping
            .keysyms
            .chunks(per_keycode)
            .enumerate()
            .filter_map(|(idx, syms)| {
                syms.first()
                    .filter(|&&sym| sym != 0)
                    .map(|&sym| (min + idx as u8, sym))
            })
            .collect::<HashMap<_, _>>();

        let modifiers = self
            .conn
            .get_modifier_mapping()?
            .reply()
            .context("failed to read the modifier mapping")?;
        let per_modifier = usize::from(modifiers.keycodes_per_modifier().max(1));
        let numlock = modifiers
            .keycodes
            .chunks(per_modifier)
            .position(|codes| {
                codes
                    .iter()
                    .any(|code| keysyms.get(code) == Some(&NUM_LOCK))
            })
            .map_or(0, |idx| 1 << idx);

        log::debug!("{} keycodes mapped, num-lock is {:#x}", keysyms.len(), numlock);
        self.keysyms.replace(keysyms);
        self.numlock.replace(numlock);
        Ok(())
    }

    /// Keycodes producing `keysym` without shift
    fn keycodes(&self, keysym: Keysym) -> Vec<Keycode> {
        self.keysyms
            .borrow()
            .iter()
            .filter(|(_, &sym)| sym == keysym)
            .map(|(&code, _)| code)
            .collect()
    }

    /// `mask` combined with every state of caps-lock and num-lock
    fn lock_variants(&self, mask: u16) -> [u16; 4] {
        let numlock = *self.numlock.borrow();
        let lock = u16::from(ModMask::LOCK);
        [mask, mask | lock, mask | numlock, mask | numlock | lock]
    }

    fn property32(&self, window: Window, property: Atom, kind: impl Into<Atom>) -> Vec<u32> {
        self.conn
            .get_property(false, window, property, kind, 0, u32::MAX)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| reply.value32().map(Iterator::collect))
            .unwrap_or_default()
    }

    fn text_property(&self, window: Window, property: Atom, kind: impl Into<Atom>) -> Option<String> {
        self.conn
            .get_property(false, window, property, kind, 0, u32::MAX)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .filter(|reply| !reply.value.is_empty())
            .map(|reply| String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn supports_protocol(&self, window: Window, protocol: Atom) -> bool {
        self.property32(window, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM)
            .contains(&protocol)
    }

    fn send_protocol(&self, window: Window, protocol: Atom) -> Result<()> {
        let event = ClientMessageEvent::new(32, window, self.atoms.WM_PROTOCOLS, [
            protocol,
            CURRENT_TIME,
            0,
            0,
            0,
        ]);
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, &event)
            .with_context(|| format!("failed to send a client message to {:#0x}", window))?;
        Ok(())
    }

    fn configure(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        self.conn
            .configure_window(window, aux)
            .with_context(|| format!("failed to configure {:#0x}", window))?;
        Ok(())
    }

    /// Translate a raw event. Button presses are replayed to the client
    fn translate(&self, event: Event) -> Result<XEvent> {
        let atoms = &self.atoms;

        Ok(match event {
            Event::ConfigureNotify(e) => XEvent::ConfigureNotify(ConfigureEvent {
                id:      e.window,
                geom:    Rectangle::new(
                    i32::from(e.x),
                    i32::from(e.y),
                    u32::from(e.width),
                    u32::from(e.height),
                ),
                is_root: e.window == self.root,
            }),
            Event::ConfigureRequest(e) => {
                let has = |flag: ConfigWindow| u16::from(e.value_mask) & u16::from(flag) != 0;
                XEvent::ConfigureRequest(ConfigureRequestData {
                    id:           e.window,
                    x:            has(ConfigWindow::X).then(|| i32::from(e.x)),
                    y:            has(ConfigWindow::Y).then(|| i32::from(e.y)),
                    width:        has(ConfigWindow::WIDTH).then(|| u32::from(e.width)),
                    height:       has(ConfigWindow::HEIGHT).then(|| u32::from(e.height)),
                    border_width: has(ConfigWindow::BORDER_WIDTH)
                        .then(|| u32::from(e.border_width)),
                    sibling:      has(ConfigWindow::SIBLING).then(|| e.sibling),
                    stack_mode:   has(ConfigWindow::STACK_MODE).then(|| u32::from(e.stack_mode)),
                })
            },
            Event::MapRequest(e) => XEvent::MapRequest {
                window:            e.window,
                override_redirect: false,
            },
            Event::UnmapNotify(e) => XEvent::UnmapNotify {
                window:    e.window,
                synthetic: e.response_type & 0x80 != 0,
            },
            Event::DestroyNotify(e) => XEvent::DestroyNotify(e.window),
            Event::EnterNotify(e) => XEvent::EnterNotify(PointerEvent {
                id:     e.event,
                abs:    Point::new(i32::from(e.root_x), i32::from(e.root_y)),
                time:   e.time,
                normal: e.mode == NotifyMode::NORMAL && e.detail != NotifyDetail::INFERIOR,
            }),
            Event::MotionNotify(e) => XEvent::MotionNotify(PointerEvent {
                id:     e.event,
                abs:    Point::new(i32::from(e.root_x), i32::from(e.root_y)),
                time:   e.time,
                normal: true,
            }),
            Event::PropertyNotify(e) => {
                let kind = match e.atom {
                    a if a == atoms.WM_NAME || a == atoms._NET_WM_NAME => PropertyKind::Name,
                    a if a == atoms.WM_NORMAL_HINTS => PropertyKind::NormalHints,
                    a if a == atoms.WM_HINTS => PropertyKind::Hints,
                    a if a == atoms.WM_TRANSIENT_FOR => PropertyKind::TransientFor,
                    a if a == atoms._NET_WM_WINDOW_TYPE => PropertyKind::WindowType,
                    _ => PropertyKind::Other,
                };
                XEvent::PropertyNotify(PropertyEvent {
                    id: e.window,
                    kind,
                    deleted: e.state == Property::DELETE,
                })
            },
            Event::KeyPress(e) => XEvent::KeyPress(KeypressEvent {
                mask:   u16::from(e.state),
                keysym: self.keysyms.borrow().get(&e.detail).copied().unwrap_or(0),
            }),
            Event::ButtonPress(e) => {
                self.conn.allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
                XEvent::ButtonPress(MouseEvent {
                    id:       e.event,
                    location: Point::new(i32::from(e.root_x), i32::from(e.root_y)),
                    button:   Button::try_from(e.detail).ok(),
                    mask:     u16::from(e.state),
                })
            },
            Event::ButtonRelease(e) => XEvent::ButtonRelease(MouseEvent {
                id:       e.event,
                location: Point::new(i32::from(e.root_x), i32::from(e.root_y)),
                button:   Button::try_from(e.detail).ok(),
                mask:     u16::from(e.state),
            }),
            Event::ClientMessage(e) => {
                let data = e.data.as_data32();
                let msg = if e.type_ == atoms._NET_WM_STATE
                    && (data[1] == atoms._NET_WM_STATE_FULLSCREEN
                        || data[2] == atoms._NET_WM_STATE_FULLSCREEN)
                {
                    StateAction::from_u32(data[0]).map_or(
                        TagwmClientMessage::Other(e.window),
                        |action| TagwmClientMessage::Fullscreen(e.window, action),
                    )
                } else if e.type_ == atoms._NET_ACTIVE_WINDOW {
                    TagwmClientMessage::ActiveWindow(e.window)
                } else {
                    TagwmClientMessage::Other(e.window)
                };
                XEvent::ClientMessage(msg)
            },
            Event::FocusIn(e) => XEvent::FocusIn(e.event),
            Event::MappingNotify(e) => {
                if e.request != xproto::Mapping::POINTER {
                    self.refresh_keyboard()?;
                }
                XEvent::MappingNotify
            },
            Event::Error(e) => XEvent::ProtocolError {
                request: e.major_opcode,
                kind:    e.error_kind,
            },
            other => XEvent::Unknown(other.response_type()),
        })
    }
}

impl XConn for XConnection {
    fn root(&self) -> Window {
        self.root
    }

    fn screen_rects(&self) -> Result<Vec<Rectangle>> {
        let active = self
            .conn
            .xinerama_is_active()
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(false, |reply| reply.state != 0);

        if active {
            let screens = self
                .conn
                .xinerama_query_screens()?
                .reply()
                .context("failed to query the xinerama screens")?
                .screen_info
                .iter()
                .map(|s| {
                    Rectangle::new(
                        i32::from(s.x_org),
                        i32::from(s.y_org),
                        u32::from(s.width),
                        u32::from(s.height),
                    )
                })
                .collect::<Vec<_>>();
            if !screens.is_empty() {
                return Ok(screens);
            }
        }

        let screen = &self.conn.setup().roots[self.screen];
        Ok(vec![Rectangle::new(
            0,
            0,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        )])
    }

    fn pointer_position(&self) -> Result<Point> {
        let reply = self
            .conn
            .query_pointer(self.root)?
            .reply()
            .context("failed to query the pointer")?;
        Ok(Point::new(i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        Ok(self
            .conn
            .query_tree(self.root)?
            .reply()
            .context("failed to query the window tree")?
            .children)
    }

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes> {
        let attrs = self.conn.get_window_attributes(window).ok()?.reply().ok()?;
        let geom = self.conn.get_geometry(window).ok()?.reply().ok()?;

        Some(WindowAttributes {
            override_redirect: attrs.override_redirect,
            viewable:          attrs.map_state == MapState::VIEWABLE,
            rect:              Rectangle::new(
                i32::from(geom.x),
                i32::from(geom.y),
                u32::from(geom.width),
                u32::from(geom.height),
            ),
            border_width:      u32::from(geom.border_width),
        })
    }

    fn window_class(&self, window: Window) -> (String, String) {
        WmClass::get(&self.conn, window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|class| {
                (
                    String::from_utf8_lossy(class.class()).into_owned(),
                    String::from_utf8_lossy(class.instance()).into_owned(),
                )
            })
            .unwrap_or_default()
    }

    fn window_title(&self, window: Window) -> String {
        self.text_property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)
            .or_else(|| self.text_property(window, self.atoms.WM_NAME, AtomEnum::ANY))
            .unwrap_or_default()
    }

    fn window_pid(&self, window: Window) -> Option<Pid> {
        let mask = u32::from(res::ClientIdMask::LOCAL_CLIENT_PID);
        let spec = res::ClientIdSpec {
            client: window,
            mask,
        };

        let from_res = self
            .conn
            .res_query_client_ids(&[spec])
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| {
                reply
                    .ids
                    .iter()
                    .find(|id| id.spec.mask & mask != 0)
                    .and_then(|id| id.value.first().copied())
                    .filter(|&pid| pid != 0)
            });

        from_res.or_else(|| {
            self.property32(window, self.atoms._NET_WM_PID, AtomEnum::CARDINAL)
                .first()
                .copied()
        })
    }

    fn transient_for(&self, window: Window) -> Option<Window> {
        self.property32(window, self.atoms.WM_TRANSIENT_FOR, AtomEnum::WINDOW)
            .first()
            .copied()
            .filter(|&w| w != NONE)
    }

    fn window_type(&self, window: Window) -> Option<WindowType> {
        self.property32(window, self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM)
            .into_iter()
            .find_map(|atom| WindowType::from_atom(&self.atoms, atom))
    }

    fn requests_fullscreen(&self, window: Window) -> bool {
        self.property32(window, self.atoms._NET_WM_STATE, AtomEnum::ATOM)
            .contains(&self.atoms._NET_WM_STATE_FULLSCREEN)
    }

    fn size_hints(&self, window: Window) -> Option<SizeHints> {
        WmSizeHints::get_normal_hints(&self.conn, window)
            .ok()?
            .reply()
            .ok()
            .map(|hints| SizeHints::from(&hints))
    }

    fn wm_hints(&self, window: Window) -> Option<Hints> {
        WmHints::get(&self.conn, window)
            .ok()?
            .reply()
            .ok()
            .map(|hints| Hints::from(&hints))
    }

    fn is_iconic(&self, window: Window) -> bool {
        self.property32(window, self.atoms.WM_STATE, self.atoms.WM_STATE)
            .first()
            .map_or(false, |&state| state == u32::from(IcccmWindowState::Iconic))
    }

    fn tags_property(&self, window: Window) -> Option<TagMask> {
        let reply = self
            .conn
            .get_property(false, window, self.atoms._TAGWM_TAGS, AtomEnum::CARDINAL, 0, 1)
            .ok()?
            .reply()
            .ok()?;
        if reply.value.is_empty() {
            return None;
        }

        match reply.value32().and_then(|mut v| v.next()) {
            Some(tags) => Some(tags),
            None => {
                log::debug!(
                    "{} on {}",
                    Error::InvalidProperty(String::from("_TAGWM_TAGS")),
                    window
                );
                None
            },
        }
    }

    fn numlock_mask(&self) -> u16 {
        *self.numlock.borrow()
    }

    fn configure_window(&self, window: Window, rect: Rectangle, border_width: u32) -> Result<()> {
        self.configure(window, &rect.to_aux(border_width))
    }

    fn send_configure_notify(
        &self,
        window: Window,
        rect: Rectangle,
        border_width: u32,
    ) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type:     xproto::CONFIGURE_NOTIFY_EVENT,
            sequence:          0,
            event:             window,
            window,
            above_sibling:     NONE,
            x:                 rect.x() as i16,
            y:                 rect.y() as i16,
            width:             rect.width() as u16,
            height:            rect.height() as u16,
            border_width:      border_width as u16,
            override_redirect: false,
        };
        self.conn
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, &event)
            .with_context(|| format!("failed to send a configure notify to {:#0x}", window))?;
        Ok(())
    }

    fn forward_configure_request(&self, request: &ConfigureRequestData) -> Result<()> {
        let aux = ConfigureWindowAux {
            x:            request.x,
            y:            request.y,
            width:        request.width,
            height:       request.height,
            border_width: request.border_width,
            sibling:      request.sibling,
            stack_mode:   request.stack_mode.and_then(stack_mode),
        };
        self.configure(request.id, &aux)
    }

    fn move_window(&self, window: Window, point: Point) -> Result<()> {
        self.configure(window, &ConfigureWindowAux::new().x(point.x).y(point.y))
    }

    fn set_border_width(&self, window: Window, width: u32) -> Result<()> {
        self.configure(window, &ConfigureWindowAux::new().border_width(width))
    }

    fn set_border_color(&self, window: Window, color: Color) -> Result<()> {
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().border_pixel(color))
            .with_context(|| format!("failed to color the border of {:#0x}", window))?;
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.configure(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
    }

    fn stack_below(&self, window: Window, sibling: Option<Window>) -> Result<()> {
        let mut aux = ConfigureWindowAux::new().stack_mode(StackMode::BELOW);
        aux.sibling = sibling;
        self.configure(window, &aux)
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn
            .map_window(window)
            .with_context(|| format!("failed to map {:#0x}", window))?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.conn
            .unmap_window(window)
            .with_context(|| format!("failed to unmap {:#0x}", window))?;
        Ok(())
    }

    fn focus_window(&self, window: Option<Window>) -> Result<()> {
        match window {
            Some(window) => {
                self.conn
                    .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_ACTIVE_WINDOW,
                    AtomEnum::WINDOW,
                    &[window],
                )?;
            },
            None => {
                self.conn
                    .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME)?;
                self.conn
                    .delete_property(self.root, self.atoms._NET_ACTIVE_WINDOW)?;
            },
        }
        Ok(())
    }

    fn send_take_focus(&self, window: Window) -> Result<()> {
        if self.supports_protocol(window, self.atoms.WM_TAKE_FOCUS) {
            self.send_protocol(window, self.atoms.WM_TAKE_FOCUS)?;
        }
        Ok(())
    }

    fn close_window(&self, window: Window) -> Result<()> {
        if self.supports_protocol(window, self.atoms.WM_DELETE_WINDOW) {
            log::debug!("asking {:#0x} to close", window);
            return self.send_protocol(window, self.atoms.WM_DELETE_WINDOW);
        }

        log::debug!("killing the client of {:#0x}", window);
        self.conn.grab_server()?;
        self.conn.set_close_down_mode(xproto::CloseDown::DESTROY_ALL)?;
        self.conn.kill_client(window)?;
        self.conn.ungrab_server()?;
        Ok(())
    }

    fn set_client_state(&self, window: Window, state: IcccmWindowState) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.WM_STATE,
            self.atoms.WM_STATE,
            &[u32::from(state), NONE],
        )?;
        Ok(())
    }

    fn set_opacity(&self, window: Window, opacity: Option<f64>) -> Result<()> {
        match opacity {
            Some(value) => {
                let value = (value.clamp(0.0, 1.0) * f64::from(u32::MAX)) as u32;
                self.conn.change_property32(
                    PropMode::REPLACE,
                    window,
                    self.atoms._NET_WM_WINDOW_OPACITY,
                    AtomEnum::CARDINAL,
                    &[value],
                )?;
            },
            None => {
                self.conn
                    .delete_property(window, self.atoms._NET_WM_WINDOW_OPACITY)?;
            },
        }
        Ok(())
    }

    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> Result<()> {
        let state: &[Atom] = if fullscreen {
            &[self.atoms._NET_WM_STATE_FULLSCREEN]
        } else {
            &[]
        };
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_STATE,
            AtomEnum::ATOM,
            state,
        )?;
        Ok(())
    }

    fn set_urgency_hint(&self, window: Window, urgent: bool) -> Result<()> {
        let mut hints = match WmHints::get(&self.conn, window)?.reply() {
            Ok(hints) => hints,
            Err(_) => return Ok(()),
        };
        hints.urgent = urgent;
        hints.set(&self.conn, window)?;
        Ok(())
    }

    fn set_tags_property(&self, window: Window, tags: TagMask) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._TAGWM_TAGS,
            AtomEnum::CARDINAL,
            &[tags],
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_DESKTOP,
            AtomEnum::CARDINAL,
            &[desktop_index(tags)],
        )?;
        Ok(())
    }

    fn select_client_events(&self, window: Window, focus_follows_mouse: bool) -> Result<()> {
        let mut mask =
            EventMask::FOCUS_CHANGE | EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY;
        if focus_follows_mouse {
            mask |= u32::from(EventMask::ENTER_WINDOW);
        }
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn grab_keys(&self, keys: &[KeyCombo]) -> Result<()> {
        self.conn.ungrab_key(xproto::Grab::ANY, self.root, ModMask::ANY)?;

        for key in keys {
            let codes = self.keycodes(key.keysym);
            if codes.is_empty() {
                log::warn!("no keycode produces keysym {:#x}", key.keysym);
            }
            for code in codes {
                for mask in self.lock_variants(key.mask) {
                    self.conn.grab_key(
                        true,
                        self.root,
                        mask,
                        code,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn grab_buttons(&self, window: Window, focused: bool, buttons: &[ButtonCombo]) -> Result<()> {
        let mask = u32::from(EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE) as u16;
        self.conn
            .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;

        if !focused {
            self.conn.grab_button(
                false,
                window,
                mask,
                GrabMode::SYNC,
                GrabMode::SYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }

        for combo in buttons {
            let index = button_index(combo.button);
            for modifiers in self.lock_variants(combo.mask) {
                self.conn.grab_button(
                    false,
                    window,
                    mask,
                    GrabMode::ASYNC,
                    GrabMode::SYNC,
                    NONE,
                    NONE,
                    index,
                    modifiers,
                )?;
            }
        }

        Ok(())
    }

    fn grab_pointer(&self, cursor: CursorKind) -> Result<bool> {
        let cursor = match cursor {
            CursorKind::Move => self.cursors.moving,
            CursorKind::Resize => self.cursors.sizing,
        };
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                u32::from(
                    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                ) as u16,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                cursor,
                CURRENT_TIME,
            )?
            .reply()
            .context("failed to grab the pointer")?;

        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn warp_pointer(&self, window: Window, point: Point) -> Result<()> {
        self.conn
            .warp_pointer(NONE, window, 0, 0, 0, 0, point.x as i16, point.y as i16)?;
        Ok(())
    }

    fn update_client_list(&self, windows: &[Window]) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_CLIENT_LIST,
            AtomEnum::WINDOW,
            windows,
        )?;
        Ok(())
    }

    fn set_current_desktop(&self, index: u32) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_CURRENT_DESKTOP,
            AtomEnum::CARDINAL,
            &[index],
        )?;
        Ok(())
    }

    fn next_event(&self) -> Result<XEvent> {
        let event = self
            .conn
            .wait_for_event()
            .context("lost the connection to the X server")?;
        self.translate(event)
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush().context("failed to flush the connection")?;
        Ok(())
    }
}

fn stack_mode(value: u32) -> Option<StackMode> {
    match value {
        0 => Some(StackMode::ABOVE),
        1 => Some(StackMode::BELOW),
        2 => Some(StackMode::TOP_IF),
        3 => Some(StackMode::BOTTOM_IF),
        4 => Some(StackMode::OPPOSITE),
        _ => None,
    }
}

const fn button_index(button: Button) -> ButtonIndex {
    match button {
        Button::Left => ButtonIndex::M1,
        Button::Middle => ButtonIndex::M2,
        Button::Right => ButtonIndex::M3,
        Button::ScrollUp => ButtonIndex::M4,
        Button::ScrollDown => ButtonIndex::M5,
    }
}

impl Drop for XConnection {
    fn drop(&mut self) {
        let _ = self.conn.destroy_window(self.check_window);
        let _ = self.conn.delete_property(self.root, self.atoms._NET_SUPPORTING_WM_CHECK);
        let _ = self.conn.delete_property(self.root, self.atoms._NET_ACTIVE_WINDOW);
        let _ = self
            .conn
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME);
        let _ = self.conn.flush();
    }
}
