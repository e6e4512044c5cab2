//! The window manager: monitors, clients and the handling of every request

mod arrange;
mod events;
mod focus;
mod manage;
mod mouse;
mod tags;

use crate::{
    action::Action,
    config::{Config, Placement, ZoomPolicy},
    core::{decoration::Colorscheme, tag_mask, Pid, TagMask, Window},
    error::Error,
    geometry::{Point, Rectangle},
    monitor::{
        client::{Client, ClientFlags, ClientId, HintContext},
        Clients,
        Monitor,
    },
    utils,
    x::{
        input::{ButtonCombo, KeyCombo},
        XConn,
    },
};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::collections::HashMap;

/// Looks up the parent of a process
pub(crate) type ParentLookup = Box<dyn Fn(Pid) -> Option<Pid>>;

/// State of the window manager, generic over the display connection
pub(crate) struct WindowManager<X: XConn> {
    pub(crate) conn:      X,
    pub(crate) config:    Config,
    colors:               Colorscheme,
    /// Every managed client, including the ones hidden by swallowing
    pub(crate) clients:   Clients,
    pub(crate) monitors:  Vec<Monitor>,
    /// Index of the selected monitor
    pub(crate) selmon:    usize,
    next_id:              usize,
    keys:                 HashMap<KeyCombo, Action>,
    buttons:              HashMap<ButtonCombo, Action>,
    numlock:              u16,
    /// Bounding box of every monitor
    screen:               Rectangle,
    running:              bool,
    /// Monitor the pointer was last seen on
    motion_mon:           Option<usize>,
    pub(crate) parent_of: ParentLookup,
}

impl<X: XConn> WindowManager<X> {
    /// Create a new [`WindowManager`] on top of a connection that already
    /// manages the root window
    pub(crate) fn new(conn: X, config: Config) -> Result<Self> {
        let colors = Colorscheme::new(&config).context("invalid border color")?;
        let keys = config.key_bindings()?.into_iter().collect();
        let buttons = config.button_bindings()?.into_iter().collect();
        let numlock = conn.numlock_mask();

        let mut wm = Self {
            conn,
            config,
            colors,
            clients: Clients::default(),
            monitors: vec![],
            selmon: 0,
            next_id: 0,
            keys,
            buttons,
            numlock,
            screen: Rectangle::default(),
            running: false,
            motion_mon: None,
            parent_of: Box::new(utils::parent_pid),
        };

        wm.update_geometry()?;
        wm.grab_keys()?;
        wm.set_current_desktop()?;
        wm.update_client_list()?;

        Ok(wm)
    }

    /// Handle events until asked to quit
    pub(crate) fn run(&mut self) -> Result<()> {
        self.running = true;
        log::info!("managing {} monitor(s)", self.monitors.len());

        while self.running {
            self.conn.flush()?;
            let event = self.conn.next_event()?;
            log::trace!("event: {:?}", event);
            self.handle_event(event)?;
            utils::reap_children();
        }

        Ok(())
    }

    // ============================ Monitors ==========================

    /// Match the monitors to the current screens. Returns whether anything
    /// changed
    pub(crate) fn update_geometry(&mut self) -> Result<bool> {
        let screens = self
            .conn
            .screen_rects()
            .context("failed to query the screens")?
            .into_iter()
            .unique()
            .collect::<Vec<_>>();

        if screens.is_empty() {
            log::warn!("no screens reported, keeping {} monitor(s)", self.monitors.len());
            return Ok(false);
        }

        let global = &self.config.global;
        let mut dirty = false;

        for (num, screen) in screens.iter().enumerate() {
            if num == self.monitors.len() {
                log::info!("new monitor {} at {}", num, screen);
                self.monitors.push(Monitor::new(
                    num,
                    *screen,
                    global.tag_count(),
                    global.top_bar,
                    global.tag_slot(),
                ));
                self.monitors[num].screen = Rectangle::default();
            }

            let mon = &mut self.monitors[num];
            if mon.screen != *screen {
                dirty = true;
                mon.screen = *screen;
                mon.update_bar_position(global.bar_height);
            }
        }

        while self.monitors.len() > screens.len() {
            if let Some(gone) = self.monitors.pop() {
                dirty = true;
                log::info!("monitor {} is gone, moving its clients", gone.num);
                for id in gone.clients {
                    if let Some(c) = self.clients.get_mut(&id) {
                        c.monitor = 0;
                    }
                    self.monitors[0].attach(id);
                    self.monitors[0].attach_focus(id);
                }
            }
        }

        if self.selmon >= self.monitors.len() {
            self.selmon = 0;
        }

        self.screen = self
            .monitors
            .iter()
            .map(|m| m.screen)
            .reduce(|a, b| {
                let (x, y) = (a.x().min(b.x()), a.y().min(b.y()));
                let (right, bottom) = (a.right().max(b.right()), a.bottom().max(b.bottom()));
                Rectangle::new(x, y, (right - x) as u32, (bottom - y) as u32)
            })
            .unwrap_or_default();

        Ok(dirty)
    }

    /// Monitor whose usable area overlaps `rect` the most
    pub(crate) fn rect_to_monitor(&self, rect: Rectangle) -> usize {
        let mut best = (self.selmon, 0);
        for (idx, mon) in self.monitors.iter().enumerate() {
            let area = mon.window_area.intersection_area(rect);
            if area > best.1 {
                best = (idx, area);
            }
        }
        best.0
    }

    /// Monitor under `point`
    pub(crate) fn monitor_at(&self, point: Point) -> usize {
        self.rect_to_monitor(Rectangle::new(point.x, point.y, 1, 1))
    }

    /// Monitor of `window`: the one under the pointer for the root window, the
    /// owning one for clients, else the selected one
    pub(crate) fn window_monitor(&self, window: Window, pointer: Point) -> usize {
        if window == self.conn.root() {
            return self.monitor_at(pointer);
        }

        self.window_to_client(window)
            .and_then(|id| self.clients.get(&id))
            .map_or(self.selmon, |c| c.monitor)
    }

    /// Monitor `step` monitors away from the selected one
    pub(crate) fn step_monitor(&self, step: i32) -> usize {
        (self.selmon as i32 + step).rem_euclid(self.monitors.len().max(1) as i32) as usize
    }

    // ============================= Clients ==========================

    /// Mask of the configured tags
    pub(crate) fn valid_tags(&self) -> TagMask {
        tag_mask(self.config.global.tag_count())
    }

    pub(crate) fn client(&self, id: ClientId) -> Result<&Client, Error> {
        self.clients.get(&id).ok_or(Error::UnknownClient(id))
    }

    pub(crate) fn client_mut(&mut self, id: ClientId) -> Result<&mut Client, Error> {
        self.clients.get_mut(&id).ok_or(Error::UnknownClient(id))
    }

    /// The selected client of the selected monitor
    pub(crate) fn selected(&self) -> Option<ClientId> {
        self.monitors.get(self.selmon).and_then(|m| m.sel)
    }

    /// Whether the client is shown on its monitor
    pub(crate) fn is_visible(&self, id: ClientId) -> bool {
        self.clients.get(&id).map_or(false, |c| {
            self.monitors
                .get(c.monitor)
                .map_or(false, |m| m.is_visible(c))
        })
    }

    /// The attached client owning `window`. Clients hidden by swallowing are
    /// not attached and never found
    pub(crate) fn window_to_client(&self, window: Window) -> Option<ClientId> {
        self.monitors
            .iter()
            .flat_map(|m| m.clients.iter().copied())
            .find(|id| self.clients.get(id).map_or(false, |c| c.window == window))
    }

    /// The client that hides the swallowed `window`
    pub(crate) fn swallower_of(&self, window: Window) -> Option<ClientId> {
        self.clients.values().find_map(|c| {
            c.swallowing
                .and_then(|s| self.clients.get(&s))
                .filter(|s| s.window == window)
                .map(|_| c.id)
        })
    }

    /// Bounds and switches for resolving the geometry of a client on
    /// monitor `m`
    pub(crate) fn hint_context(&self, m: usize) -> HintContext {
        let mon = &self.monitors[m];
        HintContext {
            screen:      self.screen,
            window_area: mon.window_area,
            bar_height:  self.config.global.bar_height,
            honor_hints: self.config.global.honor_size_hints,
            arranged:    mon.layout().arranges(),
        }
    }

    fn grab_keys(&self) -> Result<()> {
        let combos = self.keys.keys().copied().collect::<Vec<_>>();
        self.conn.grab_keys(&combos)
    }

    pub(crate) fn grab_buttons(&self, id: ClientId, focused: bool) -> Result<()> {
        let combos = self.buttons.keys().copied().collect::<Vec<_>>();
        self.conn.grab_buttons(self.client(id)?.window, focused, &combos)
    }

    // ============================= Actions ==========================

    /// Carry out a bound command
    pub(crate) fn handle_action(&mut self, action: &Action) -> Result<()> {
        log::debug!("action: {:?}", action);

        match action {
            Action::Spawn(cmd) => utils::spawn(cmd),
            Action::Quit => {
                log::info!("quitting");
                self.running = false;
            },
            Action::KillClient => {
                if let Some(id) = self.selected() {
                    self.conn.close_window(self.client(id)?.window)?;
                }
            },

            Action::FocusStack(pos) => self.focus_stack(*pos)?,
            Action::PushStack(pos) => self.push_stack(*pos)?,
            Action::Zoom => self.zoom()?,

            Action::View(arg) => self.view(arg.mask())?,
            Action::ToggleView(arg) => self.toggle_view(arg.mask())?,
            Action::Tag(arg) => self.tag(arg.mask())?,
            Action::ToggleTag(arg) => self.toggle_tag(arg.mask())?,

            Action::FocusMonitor(step) => self.focus_monitor(*step)?,
            Action::TagMonitor(step) => self.tag_monitor(*step)?,

            Action::IncMaster(n) => self.inc_master(*n)?,
            Action::IncStackColumns(n) => self.inc_stack_columns(*n)?,
            Action::SetLayout(layout) => self.set_layout(*layout)?,
            Action::CycleLayouts(step) => self.cycle_layouts(*step)?,
            Action::SetDirections(changes) => {
                self.monitors[self.selmon].pertag.slot_mut().set_directions(*changes);
                self.arrange(Some(self.selmon))?;
            },
            Action::SetFactors(changes) => {
                self.monitors[self.selmon].pertag.slot_mut().set_factors(*changes);
                self.arrange(Some(self.selmon))?;
            },

            Action::ToggleBar => self.toggle_bar()?,
            Action::ToggleFloating => self.toggle_floating()?,
            Action::ToggleFullscreen => {
                if let Some(id) = self.selected() {
                    let on = self.client(id)?.is_fullscreen();
                    self.set_fullscreen(id, !on)?;
                }
            },
            Action::ToggleOpacity => {
                let shade = self.config.global.shade;
                self.change_opacity(|o| o.cycle(shade))?;
            },
            Action::AdjustOpacity(delta) => self.change_opacity(|o| o.adjust(*delta))?,
            Action::FocusUrgent => self.focus_urgent()?,
            Action::Unswallow => self.toggle_swallow()?,

            Action::MoveMouse => self.move_mouse()?,
            Action::ResizeMouse => self.resize_mouse()?,

            Action::ToggleResizeHints => {
                let global = &mut self.config.global;
                global.honor_size_hints = !global.honor_size_hints;
                self.arrange(Some(self.selmon))?;
            },
            Action::ToggleFixed => {
                if let Some(id) = self.selected() {
                    let c = self.client_mut(id)?;
                    c.set(ClientFlags::FIXED, !c.is(ClientFlags::FIXED));
                    self.arrange(Some(self.selmon))?;
                }
            },
            Action::ToggleAttachBottom => {
                let global = &mut self.config.global;
                global.attach_bottom = !global.attach_bottom;
            },
            Action::ToggleZoomSwap => {
                let global = &mut self.config.global;
                global.zoom_policy = match global.zoom_policy {
                    ZoomPolicy::Push => ZoomPolicy::Swap,
                    ZoomPolicy::Swap => ZoomPolicy::Push,
                };
            },
            Action::TogglePlacement => {
                let global = &mut self.config.global;
                global.placement = match global.placement {
                    Placement::Centered => Placement::UnderMouse,
                    Placement::UnderMouse => Placement::Centered,
                };
            },
            Action::ToggleRaiseOnClick => {
                let global = &mut self.config.global;
                global.raise_on_click = !global.raise_on_click;
            },
            Action::ToggleLoseFocus => {
                let global = &mut self.config.global;
                global.lose_focus = !global.lose_focus;
            },
        }

        Ok(())
    }

    // ============================== EWMH ============================

    /// Publish every attached window in `_NET_CLIENT_LIST`
    pub(crate) fn update_client_list(&self) -> Result<()> {
        let windows = self
            .monitors
            .iter()
            .flat_map(|m| m.clients.iter())
            .filter_map(|id| self.clients.get(id).map(|c| c.window))
            .collect::<Vec<_>>();

        self.conn.update_client_list(&windows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::WindowManager;
    use crate::{
        action::{Action, StackPos, TagArg},
        config::Config,
        core::Window,
        geometry::Rectangle,
        monitor::client::ClientId,
        x::{
            event::{KeypressEvent, XEvent},
            input::{keysym_from_name, ModMask},
            mock::{MockWindow, MockXConn},
        },
    };
    use std::collections::HashSet;

    pub(crate) fn screen() -> Rectangle {
        Rectangle::new(0, 0, 1920, 1080)
    }

    pub(crate) fn wm_with(screens: Vec<Rectangle>, config: Config) -> WindowManager<MockXConn> {
        let mut wm = WindowManager::new(MockXConn::new(screens), config).unwrap();
        wm.parent_of = Box::new(|_| None);
        wm
    }

    pub(crate) fn wm() -> WindowManager<MockXConn> {
        wm_with(vec![screen()], Config::default())
    }

    /// Map a window the way a client would
    pub(crate) fn map(wm: &mut WindowManager<MockXConn>, window: Window, meta: MockWindow) {
        wm.conn.add_window(window, meta);
        wm.handle_event(XEvent::MapRequest {
            window,
            override_redirect: false,
        })
        .unwrap();
    }

    pub(crate) fn map_default(wm: &mut WindowManager<MockXConn>, window: Window) {
        map(wm, window, MockWindow::default());
    }

    pub(crate) fn id_of(wm: &WindowManager<MockXConn>, window: Window) -> ClientId {
        wm.window_to_client(window).unwrap()
    }

    /// Windows of the selected monitor in insertion order
    pub(crate) fn order(wm: &WindowManager<MockXConn>) -> Vec<Window> {
        wm.monitors[wm.selmon]
            .clients
            .iter()
            .map(|id| wm.clients[id].window)
            .collect()
    }

    pub(crate) fn selected_window(wm: &WindowManager<MockXConn>) -> Option<Window> {
        wm.selected().map(|id| wm.clients[&id].window)
    }

    /// Every attached client is in exactly one insertion list and one focus
    /// list, on the monitor it names
    pub(crate) fn assert_consistent(wm: &WindowManager<MockXConn>) {
        let hidden = wm
            .clients
            .values()
            .filter_map(|c| c.swallowing)
            .collect::<HashSet<_>>();

        for (id, c) in &wm.clients {
            if hidden.contains(id) {
                assert!(wm.monitors.iter().all(|m| !m.clients.contains(id)));
                continue;
            }

            let in_clients = wm
                .monitors
                .iter()
                .map(|m| m.clients.iter().filter(|x| *x == id).count())
                .sum::<usize>();
            let in_stack = wm
                .monitors
                .iter()
                .map(|m| m.stack.iter().filter(|x| *x == id).count())
                .sum::<usize>();

            assert_eq!(in_clients, 1, "{} attached {} times", id, in_clients);
            assert_eq!(in_stack, 1, "{} stacked {} times", id, in_stack);
            assert!(wm.monitors[c.monitor].clients.contains(id));
            assert!(wm.monitors[c.monitor].stack.contains(id));
        }

        for m in &wm.monitors {
            if let Some(sel) = m.sel {
                assert!(m.stack.contains(&sel), "selection of monitor {} is detached", m.num);
            }
        }
    }

    #[test]
    fn starts_with_one_monitor_per_screen() {
        let wm = wm_with(
            vec![
                Rectangle::new(0, 0, 1920, 1080),
                Rectangle::new(1920, 0, 1280, 1024),
                Rectangle::new(0, 0, 1920, 1080),
            ],
            Config::default(),
        );

        assert_eq!(wm.monitors.len(), 2);
        assert_eq!(wm.screen, Rectangle::new(0, 0, 3200, 1080));
        assert_eq!(wm.monitors[1].window_area, Rectangle::new(1920, 18, 1280, 1006));
        assert_eq!(wm.monitor_at(crate::geometry::Point::new(2000, 500)), 1);
        assert_eq!(wm.step_monitor(-1), 1);
    }

    #[test]
    fn sole_client_leaves_no_selection() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        assert_eq!(selected_window(&wm), Some(10));

        wm.handle_event(XEvent::DestroyNotify(10)).unwrap();
        assert_eq!(wm.selected(), None);
        assert!(wm.clients.is_empty());
        assert_consistent(&wm);

        map_default(&mut wm, 11);
        assert_eq!(selected_window(&wm), Some(11));
        assert_eq!(wm.conn.focused(), Some(11));
        assert_consistent(&wm);
    }

    #[test]
    fn lists_stay_consistent() {
        let mut wm = wm_with(
            vec![Rectangle::new(0, 0, 1920, 1080), Rectangle::new(1920, 0, 1920, 1080)],
            Config::default(),
        );

        for w in 10..16 {
            map_default(&mut wm, w);
            assert_consistent(&wm);
        }

        let script = [
            Action::Tag(TagArg::Index(2)),
            Action::FocusStack(StackPos::Relative(1)),
            Action::TagMonitor(1),
            Action::Zoom,
            Action::FocusMonitor(1),
            Action::PushStack(StackPos::Index(-1)),
            Action::View(TagArg::All),
            Action::ToggleTag(TagArg::Index(3)),
            Action::ToggleFloating,
            Action::View(TagArg::Previous),
            Action::KillClient,
        ];

        for action in &script {
            wm.handle_action(action).unwrap();
            assert_consistent(&wm);
        }

        wm.handle_event(XEvent::UnmapNotify {
            window:    12,
            synthetic: false,
        })
        .unwrap();
        wm.handle_event(XEvent::DestroyNotify(14)).unwrap();
        assert_consistent(&wm);
        assert_eq!(wm.clients.len(), 4);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut config = Config::default();
        config.bindings.insert("mod4+shift+q".to_owned(), Action::Quit);
        let mut wm = wm_with(vec![screen()], config);
        wm.conn.add_window(11, MockWindow::default());

        // Whatever is queued behind the quit key stays unhandled
        wm.conn.push_events([
            XEvent::KeyPress(KeypressEvent {
                mask:   u16::from(ModMask::Mod4) | u16::from(ModMask::Shift),
                keysym: keysym_from_name("q").unwrap(),
            }),
            XEvent::MapRequest {
                window:            11,
                override_redirect: false,
            },
        ]);
        wm.run().unwrap();

        assert!(!wm.running);
        assert!(wm.clients.is_empty());
    }

    #[test]
    fn runtime_toggles() {
        let mut wm = wm();
        wm.handle_action(&Action::ToggleZoomSwap).unwrap();
        wm.handle_action(&Action::TogglePlacement).unwrap();
        wm.handle_action(&Action::ToggleLoseFocus).unwrap();
        wm.handle_action(&Action::ToggleResizeHints).unwrap();

        let global = &wm.config.global;
        assert_eq!(global.zoom_policy, crate::config::ZoomPolicy::Swap);
        assert_eq!(global.placement, crate::config::Placement::UnderMouse);
        assert!(global.lose_focus);
        assert!(global.honor_size_hints);
    }
}
