//! Dispatching events from the X server

use super::WindowManager;
use crate::{
    error::{is_benign, Error},
    monitor::client::ClientFlags,
    x::{
        event::{
            ClientMessageEvent,
            ConfigureEvent,
            ConfigureRequestData,
            KeypressEvent,
            MouseEvent,
            PointerEvent,
            PropertyEvent,
            PropertyKind,
            XEvent,
        },
        input::{clean_mask, ButtonCombo, KeyCombo},
        property::IcccmWindowState,
        XConn,
    },
};
use anyhow::Result;

impl<X: XConn> WindowManager<X> {
    /// Handle a single event
    pub(crate) fn handle_event(&mut self, event: XEvent) -> Result<()> {
        match event {
            XEvent::ConfigureNotify(ev) => self.configure_notify(ev),
            XEvent::ConfigureRequest(data) => self.configure_request(&data),
            XEvent::MapRequest {
                window,
                override_redirect,
            } => {
                if override_redirect
                    || self.window_to_client(window).is_some()
                    || self.swallower_of(window).is_some()
                {
                    return Ok(());
                }
                match self.conn.window_attributes(window) {
                    Some(attrs) if !attrs.override_redirect => self.manage(window, attrs),
                    _ => Ok(()),
                }
            },
            XEvent::UnmapNotify { window, synthetic } =>
                if synthetic {
                    if self.window_to_client(window).is_some() {
                        self.conn
                            .set_client_state(window, IcccmWindowState::Withdrawn)?;
                    }
                    Ok(())
                } else {
                    self.unmanage_window(window, false)
                },
            XEvent::DestroyNotify(window) => self.unmanage_window(window, true),
            XEvent::EnterNotify(ev) => self.enter_notify(ev),
            XEvent::MotionNotify(ev) => self.motion_notify(ev),
            XEvent::PropertyNotify(ev) => self.property_notify(ev),
            XEvent::KeyPress(ev) => self.key_press(ev),
            XEvent::ButtonPress(ev) => self.button_press(ev),
            XEvent::ClientMessage(msg) => self.client_message(msg),
            XEvent::FocusIn(window) => {
                // Some clients grab the focus on their own
                if let Some(sel) = self.selected() {
                    if self.client(sel)?.window != window {
                        self.set_focus(sel)?;
                    }
                }
                Ok(())
            },
            XEvent::MappingNotify => self.grab_keys(),
            XEvent::ProtocolError { request, kind } =>
                if is_benign(request, kind) {
                    log::debug!("ignoring {:?} error from request {}", kind, request);
                    Ok(())
                } else {
                    Err(Error::Protocol { request, kind }.into())
                },
            XEvent::ButtonRelease(_) => Ok(()),
            XEvent::Unknown(code) => {
                log::trace!("unhandled event type {}", code);
                Ok(())
            },
        }
    }

    /// Only the root window is of interest: the screens may have changed
    fn configure_notify(&mut self, ev: ConfigureEvent) -> Result<()> {
        if !ev.is_root || !self.update_geometry()? {
            return Ok(());
        }

        log::info!("screens changed, now {}", self.screen);
        let fullscreen = self
            .clients
            .values()
            .filter(|c| c.is_fullscreen() && c.monitor < self.monitors.len())
            .map(|c| (c.id, self.monitors[c.monitor].screen))
            .collect::<Vec<_>>();
        for (id, screen) in fullscreen {
            self.resize_client(id, screen)?;
        }

        self.focus(None)?;
        self.arrange(None)
    }

    /// Floating clients get what they ask for, tiled ones are told where they
    /// are, unmanaged windows are left alone
    fn configure_request(&mut self, data: &ConfigureRequestData) -> Result<()> {
        let id = match self.window_to_client(data.id) {
            Some(id) => id,
            None => return self.conn.forward_configure_request(data),
        };

        let visible = self.is_visible(id);
        let m = self.client(id)?.monitor;
        let arranged = self.monitors[m].layout().arranges();
        let screen = self.monitors[m].screen;
        let c = self.client_mut(id)?;

        if let Some(bw) = data.border_width {
            c.border_width = bw;
            return Ok(());
        }

        if !c.is_floating() && arranged {
            let (window, rect, bw) = (c.window, c.rect, c.border_width);
            return self.conn.send_configure_notify(window, rect, bw);
        }

        if let Some(x) = data.x {
            c.old_rect.point.x = c.rect.x();
            c.rect.point.x = screen.x() + x;
        }
        if let Some(y) = data.y {
            c.old_rect.point.y = c.rect.y();
            c.rect.point.y = screen.y() + y;
        }
        if let Some(width) = data.width {
            c.old_rect.dimension.width = c.rect.width();
            c.rect.dimension.width = width;
        }
        if let Some(height) = data.height {
            c.old_rect.dimension.height = c.rect.height();
            c.rect.dimension.height = height;
        }

        if c.is_floating() {
            if c.rect.x() + c.rect.width() as i32 > screen.right() {
                c.rect.point.x = screen.x() + (screen.width() as i32 / 2 - c.outer_width() as i32 / 2);
            }
            if c.rect.y() + c.rect.height() as i32 > screen.bottom() {
                c.rect.point.y =
                    screen.y() + (screen.height() as i32 / 2 - c.outer_height() as i32 / 2);
            }
        }

        let (window, rect, bw) = (c.window, c.rect, c.border_width);
        let moved = data.x.is_some() || data.y.is_some();
        let resized = data.width.is_some() || data.height.is_some();
        if moved && !resized {
            self.conn.send_configure_notify(window, rect, bw)?;
        }
        if visible {
            self.conn.configure_window(window, rect, bw)?;
        }

        Ok(())
    }

    /// Focus follows the mouse into clients and across monitors
    fn enter_notify(&mut self, ev: PointerEvent) -> Result<()> {
        let root = self.conn.root();
        if !self.config.global.focus_follows_mouse || (!ev.normal && ev.id != root) {
            return Ok(());
        }

        let id = self.window_to_client(ev.id);
        let m = match id {
            Some(id) => self.client(id)?.monitor,
            None => self.window_monitor(ev.id, ev.abs),
        };

        if m != self.selmon {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, true)?;
            }
            self.selmon = m;
        } else if id.is_none() || id == self.selected() {
            return Ok(());
        }

        self.focus(id)
    }

    /// Crossing between monitors over the root window switches the selected
    /// monitor
    fn motion_notify(&mut self, ev: PointerEvent) -> Result<()> {
        if ev.id != self.conn.root() {
            return Ok(());
        }

        let m = self.monitor_at(ev.abs);
        if self.motion_mon.map_or(false, |prev| prev != m) {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, true)?;
            }
            self.selmon = m;
            self.focus(None)?;
        }
        self.motion_mon = Some(m);

        Ok(())
    }

    fn property_notify(&mut self, ev: PropertyEvent) -> Result<()> {
        if ev.deleted {
            return Ok(());
        }
        let id = match self.window_to_client(ev.id) {
            Some(id) => id,
            None => return Ok(()),
        };

        let m = self.client(id)?.monitor;
        match ev.kind {
            PropertyKind::TransientFor => {
                let parent = self
                    .conn
                    .transient_for(ev.id)
                    .and_then(|w| self.window_to_client(w));
                let c = self.client_mut(id)?;
                if !c.is_floating() && parent.is_some() {
                    c.set(ClientFlags::FLOATING, true);
                    self.arrange(Some(m))?;
                }
            },
            PropertyKind::NormalHints => self.client_mut(id)?.hints_valid = false,
            PropertyKind::Hints => self.update_wm_hints(id)?,
            PropertyKind::Name => self.update_title(id)?,
            PropertyKind::WindowType => {
                self.update_window_type(id)?;
                self.arrange(Some(m))?;
            },
            PropertyKind::Other => {},
        }

        Ok(())
    }

    fn client_message(&mut self, msg: ClientMessageEvent) -> Result<()> {
        match msg {
            ClientMessageEvent::Fullscreen(window, action) => {
                if let Some(id) = self.window_to_client(window) {
                    let on = self.client(id)?.is_fullscreen();
                    self.set_fullscreen(id, action.apply(on))?;
                }
            },
            ClientMessageEvent::ActiveWindow(window) => {
                if let Some(id) = self.window_to_client(window) {
                    let c = self.client(id)?;
                    if Some(id) != self.selected() && !c.is(ClientFlags::URGENT) {
                        log::debug!("{} asked to be activated", id);
                        let window = c.window;
                        self.set_urgent(id, true)?;
                        self.conn.set_border_color(window, self.colors.urgent)?;
                    }
                }
            },
            ClientMessageEvent::Other(window) => {
                log::trace!("ignoring client message for {}", window);
            },
        }

        Ok(())
    }

    fn key_press(&mut self, ev: KeypressEvent) -> Result<()> {
        let combo = KeyCombo {
            mask:   clean_mask(ev.mask, self.numlock),
            keysym: ev.keysym,
        };

        match self.keys.get(&combo).cloned() {
            Some(action) => self.handle_action(&action),
            None => Ok(()),
        }
    }

    /// A click focuses the monitor and client under it, then runs the bound
    /// action when it landed on a client
    fn button_press(&mut self, ev: MouseEvent) -> Result<()> {
        let m = self.window_monitor(ev.id, ev.location);
        if m != self.selmon {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, true)?;
            }
            self.selmon = m;
            self.focus(None)?;
        }

        let id = match self.window_to_client(ev.id) {
            Some(id) => id,
            None => return Ok(()),
        };

        self.focus(Some(id))?;
        if self.config.global.raise_on_click {
            self.client_mut(id)?.set(ClientFlags::RAISE_ME, true);
            self.restack(self.selmon)?;
        }

        let button = match ev.button {
            Some(button) => button,
            None => return Ok(()),
        };
        let combo = ButtonCombo {
            mask: clean_mask(ev.mask, self.numlock),
            button,
        };

        match self.buttons.get(&combo).cloned() {
            Some(action) => self.handle_action(&action),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_consistent, id_of, map, map_default, screen, selected_window, wm, wm_with};
    use crate::{
        action::{Action, StackPos},
        config::Config,
        core::WindowType,
        geometry::{Point, Rectangle},
        monitor::client::ClientFlags,
        x::{
            event::{
                ClientMessageEvent,
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
            input::{keysym_from_name, Button, ModMask},
            mock::{Call, MockWindow},
        },
    };
    use x11rb::protocol::{xproto, ErrorKind};

    fn dialog() -> MockWindow {
        MockWindow {
            window_type: Some(WindowType::Dialog),
            ..MockWindow::default()
        }
    }

    fn pointer(id: u32, x: i32, y: i32) -> PointerEvent {
        PointerEvent {
            id,
            abs: Point::new(x, y),
            time: 0,
            normal: true,
        }
    }

    #[test]
    fn floating_clients_get_their_request() {
        let mut wm = wm();
        map(&mut wm, 10, dialog());
        wm.handle_event(XEvent::ConfigureRequest(ConfigureRequestData {
            id: 10,
            x: Some(100),
            y: Some(100),
            width: Some(500),
            height: Some(400),
            ..ConfigureRequestData::default()
        }))
        .unwrap();
        assert_eq!(wm.conn.geometry(10), Some(Rectangle::new(100, 100, 500, 400)));

        // Overflowing the monitor re-centers
        wm.handle_event(XEvent::ConfigureRequest(ConfigureRequestData {
            id: 10,
            x: Some(1800),
            ..ConfigureRequestData::default()
        }))
        .unwrap();
        assert_eq!(wm.clients[&id_of(&wm, 10)].rect.x(), 960 - 251);
        assert!(wm
            .conn
            .calls()
            .contains(&Call::ConfigureNotify(10, Rectangle::new(709, 100, 500, 400))));
    }

    #[test]
    fn tiled_clients_are_told_where_they_are() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        let rect = wm.clients[&id_of(&wm, 10)].rect;
        wm.conn.clear_calls();

        wm.handle_event(XEvent::ConfigureRequest(ConfigureRequestData {
            id: 10,
            width: Some(50),
            ..ConfigureRequestData::default()
        }))
        .unwrap();
        assert_eq!(wm.conn.calls(), vec![Call::ConfigureNotify(10, rect)]);

        wm.handle_event(XEvent::ConfigureRequest(ConfigureRequestData {
            id: 99,
            ..ConfigureRequestData::default()
        }))
        .unwrap();
        assert_eq!(wm.conn.calls().last(), Some(&Call::Forward(99)));
    }

    #[test]
    fn override_redirect_windows_are_ignored() {
        let mut wm = wm();
        let mut menu = MockWindow::default();
        menu.attributes.override_redirect = true;
        map(&mut wm, 10, menu);
        assert!(wm.clients.is_empty());

        map_default(&mut wm, 11);
        map_default(&mut wm, 11);
        assert_eq!(wm.clients.len(), 1);
    }

    #[test]
    fn synthetic_unmap_only_withdraws() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        wm.handle_event(XEvent::UnmapNotify {
            window:    10,
            synthetic: true,
        })
        .unwrap();
        assert_eq!(wm.clients.len(), 1);
        assert_eq!(
            wm.conn.calls().last(),
            Some(&Call::State(10, crate::x::property::IcccmWindowState::Withdrawn))
        );
    }

    #[test]
    fn screen_changes_refit_fullscreen_clients() {
        let mut wm = wm();
        map(&mut wm, 10, MockWindow {
            fullscreen: true,
            ..MockWindow::default()
        });

        wm.conn.set_screens(vec![Rectangle::new(0, 0, 2560, 1440)]);
        wm.handle_event(XEvent::ConfigureNotify(ConfigureEvent {
            id:      1,
            geom:    Rectangle::new(0, 0, 2560, 1440),
            is_root: true,
        }))
        .unwrap();
        assert_eq!(wm.clients[&id_of(&wm, 10)].rect, Rectangle::new(0, 0, 2560, 1440));
        assert_eq!(wm.monitors[0].window_area, Rectangle::new(0, 18, 2560, 1422));
    }

    #[test]
    fn focus_follows_the_mouse() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        map_default(&mut wm, 11);
        assert_eq!(selected_window(&wm), Some(11));

        wm.handle_event(XEvent::EnterNotify(pointer(10, 5, 5))).unwrap();
        assert_eq!(selected_window(&wm), Some(10));
        assert_eq!(wm.conn.focused(), Some(10));

        wm.config.global.focus_follows_mouse = false;
        wm.handle_event(XEvent::EnterNotify(pointer(11, 5, 5))).unwrap();
        assert_eq!(selected_window(&wm), Some(10));
    }

    #[test]
    fn pointer_motion_switches_monitors() {
        let mut wm = wm_with(
            vec![screen(), Rectangle::new(1920, 0, 1280, 1024)],
            Config::default(),
        );
        map_default(&mut wm, 10);

        wm.handle_event(XEvent::MotionNotify(pointer(1, 100, 100))).unwrap();
        assert_eq!(wm.selmon, 0);
        wm.handle_event(XEvent::MotionNotify(pointer(1, 2000, 100))).unwrap();
        assert_eq!(wm.selmon, 1);
        assert_eq!(wm.selected(), None);
        assert_eq!(wm.conn.focused(), None);

        wm.handle_event(XEvent::MotionNotify(pointer(1, 100, 100))).unwrap();
        assert_eq!(selected_window(&wm), Some(10));
    }

    #[test]
    fn property_changes() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        map_default(&mut wm, 11);
        let id = id_of(&wm, 10);
        let notify = |id, kind| {
            XEvent::PropertyNotify(PropertyEvent {
                id,
                kind,
                deleted: false,
            })
        };

        wm.conn.add_window(10, MockWindow {
            title: "renamed".to_owned(),
            transient_for: Some(11),
            hints: Some(crate::x::property::Hints {
                urgent: true,
                input:  None,
            }),
            ..MockWindow::default()
        });
        wm.handle_event(notify(10, PropertyKind::Name)).unwrap();
        assert_eq!(wm.clients[&id].name, "renamed");

        wm.handle_event(notify(10, PropertyKind::NormalHints)).unwrap();
        assert!(!wm.clients[&id].hints_valid);

        wm.handle_event(notify(10, PropertyKind::Hints)).unwrap();
        assert!(wm.clients[&id].is(ClientFlags::URGENT));

        wm.handle_event(notify(10, PropertyKind::TransientFor)).unwrap();
        assert!(wm.clients[&id].is_floating());
        assert_consistent(&wm);
    }

    #[test]
    fn fullscreen_requests() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        let id = id_of(&wm, 10);
        let request = |action| {
            XEvent::ClientMessage(ClientMessageEvent::Fullscreen(10, action))
        };

        wm.handle_event(request(StateAction::Toggle)).unwrap();
        assert!(wm.clients[&id].is_fullscreen());
        wm.handle_event(request(StateAction::Add)).unwrap();
        assert!(wm.clients[&id].is_fullscreen());
        wm.handle_event(request(StateAction::Remove)).unwrap();
        assert!(!wm.clients[&id].is_fullscreen());
        assert!(wm.conn.calls().contains(&Call::Fullscreen(10, false)));
    }

    #[test]
    fn activation_requests_mark_urgency() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        map_default(&mut wm, 11);

        wm.handle_event(XEvent::ClientMessage(ClientMessageEvent::ActiveWindow(10)))
            .unwrap();
        assert!(wm.clients[&id_of(&wm, 10)].is(ClientFlags::URGENT));
        assert!(wm.conn.calls().contains(&Call::Urgency(10, true)));

        // The selection is never marked
        wm.handle_event(XEvent::ClientMessage(ClientMessageEvent::ActiveWindow(11)))
            .unwrap();
        assert!(!wm.clients[&id_of(&wm, 11)].is(ClientFlags::URGENT));
    }

    #[test]
    fn key_bindings_ignore_locks() {
        let mut config = Config::default();
        config
            .bindings
            .insert("mod4+j".to_owned(), Action::FocusStack(StackPos::Relative(1)));
        let mut wm = wm_with(vec![screen()], config);
        map_default(&mut wm, 10);
        map_default(&mut wm, 11);

        let lock = u16::from(ModMask::Lock);
        wm.handle_event(XEvent::KeyPress(KeypressEvent {
            mask:   u16::from(ModMask::Mod4) | lock,
            keysym: keysym_from_name("j").unwrap(),
        }))
        .unwrap();
        assert_eq!(selected_window(&wm), Some(10));

        // Without the modifier nothing happens
        wm.handle_event(XEvent::KeyPress(KeypressEvent {
            mask:   0,
            keysym: keysym_from_name("j").unwrap(),
        }))
        .unwrap();
        assert_eq!(selected_window(&wm), Some(10));
    }

    #[test]
    fn clicks_focus_raise_and_run_bindings() {
        let mut config = Config::default();
        config
            .mouse_bindings
            .insert("mod4+mouse2".to_owned(), Action::KillClient);
        let mut wm = wm_with(vec![screen()], config);
        map_default(&mut wm, 10);
        map_default(&mut wm, 11);

        let click = |mask| {
            XEvent::ButtonPress(MouseEvent {
                id: 10,
                location: Point::new(5, 5),
                button: Some(Button::Middle),
                mask,
            })
        };

        wm.handle_event(click(0)).unwrap();
        assert_eq!(selected_window(&wm), Some(10));
        assert!(wm.conn.calls().contains(&Call::Raise(10)));
        assert!(!wm.conn.calls().contains(&Call::Close(10)));

        wm.handle_event(click(u16::from(ModMask::Mod4))).unwrap();
        assert!(wm.conn.calls().contains(&Call::Close(10)));
    }

    #[test]
    fn protocol_errors() {
        let mut wm = wm();
        assert!(wm
            .handle_event(XEvent::ProtocolError {
                request: xproto::CONFIGURE_WINDOW_REQUEST,
                kind:    ErrorKind::Window,
            })
            .is_ok());
        assert!(wm
            .handle_event(XEvent::ProtocolError {
                request: xproto::CHANGE_WINDOW_ATTRIBUTES_REQUEST,
                kind:    ErrorKind::Access,
            })
            .is_err());
    }
}
