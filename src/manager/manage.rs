//! Adopting windows, letting go of them and terminal swallowing

use super::WindowManager;
use crate::{
    config::Placement,
    core::{Window, WindowType, MISSING_VALUE},
    error::Error,
    geometry::Point,
    monitor::client::{Client, ClientFlags, ClientId, Opacity},
    rule::{match_rules, WindowMeta},
    utils,
    x::{property::IcccmWindowState, WindowAttributes, XConn},
};
use anyhow::Result;

impl<X: XConn> WindowManager<X> {
    /// Adopt the windows that exist before the manager started. Transient
    /// windows come last so their parents are already known
    pub(crate) fn scan(&mut self) -> Result<()> {
        let mut transients = vec![];

        for window in self.conn.top_level_windows()? {
            let attrs = match self.conn.window_attributes(window) {
                Some(attrs) => attrs,
                None => continue,
            };
            if attrs.override_redirect
                || self.window_to_client(window).is_some()
                || !(attrs.viewable || self.conn.is_iconic(window))
            {
                continue;
            }

            if self.conn.transient_for(window).is_some() {
                transients.push((window, attrs));
            } else {
                self.manage(window, attrs)?;
            }
        }

        for (window, attrs) in transients {
            self.manage(window, attrs)?;
        }

        log::info!("adopted {} existing window(s)", self.clients.len());
        Ok(())
    }

    /// Start managing `window`
    pub(crate) fn manage(&mut self, window: Window, attrs: WindowAttributes) -> Result<()> {
        let id = ClientId(self.next_id);
        self.next_id += 1;

        let mut c = Client::new(id, window, attrs.rect, self.selmon);
        c.old_border_width = attrs.border_width;
        let (class, instance) = self.conn.window_class(window);
        c.class = if class.is_empty() { MISSING_VALUE.to_owned() } else { class };
        c.instance = if instance.is_empty() { MISSING_VALUE.to_owned() } else { instance };
        c.pid = self.conn.window_pid(window);
        self.clients.insert(id, c);
        self.update_title(id)?;

        let transient = self.conn.transient_for(window);
        let parent = transient.and_then(|t| self.window_to_client(t));
        let mut terminal = None;

        if let Some(parent) = parent {
            let (m, tags) = {
                let p = self.client(parent)?;
                (p.monitor, p.tags)
            };
            let c = self.client_mut(id)?;
            c.monitor = m;
            c.tags = tags;
        } else {
            self.apply_rules(id)?;
            terminal = self.term_for_window(id);
        }

        self.place(id, &attrs)?;

        let (rect, bw) = {
            let c = self.client(id)?;
            (c.rect, c.border_width)
        };
        self.conn.set_border_width(window, bw)?;
        self.conn.set_border_color(window, self.colors.normal)?;
        self.conn.send_configure_notify(window, rect, bw)?;

        self.update_size_hints(id)?;
        self.update_wm_hints(id)?;

        let valid = self.valid_tags();
        let stored = self
            .conn
            .tags_property(window)
            .map(|t| t & valid)
            .filter(|&t| t != 0);
        let m = self.client(id)?.monitor;
        let fallback = self.monitors[m].tagset();
        let c = self.client_mut(id)?;
        if let Some(tags) = stored {
            c.tags = tags;
        } else if c.tags == 0 {
            c.tags = fallback;
        }
        let tags = c.tags;
        self.conn.set_tags_property(window, tags)?;

        self.update_window_type(id)?;

        let c = self.client_mut(id)?;
        let floating = c.is_floating() || transient.is_some() || c.is(ClientFlags::FIXED);
        c.set(ClientFlags::FLOATING, floating);
        let raise = floating && !c.is(ClientFlags::DESKTOP);
        if raise {
            self.conn.raise_window(window)?;
        }

        self.conn
            .select_client_events(window, self.config.global.focus_follows_mouse)?;
        self.grab_buttons(id, false)?;

        let mon = &mut self.monitors[m];
        if self.config.global.attach_bottom {
            mon.attach_bottom(id);
        } else {
            mon.attach(id);
        }
        mon.attach_focus(id);

        let offscreen = Point::new(rect.x() + 2 * self.screen.width() as i32, rect.y());
        self.conn.move_window(window, offscreen)?;
        self.conn.set_client_state(window, IcccmWindowState::Normal)?;

        if m == self.selmon {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, false)?;
            }
        }
        self.monitors[m].sel = Some(id);
        self.arrange(Some(m))?;
        self.conn.map_window(window)?;

        if let Some(terminal) = terminal {
            self.swallow(terminal, id)?;
        }

        log::info!("managing {} ({}) as {}", window, self.client(id)?.class, id);
        self.focus(None)?;
        self.update_client_list()
    }

    /// Initial geometry of a new client: placement for windows without a
    /// position of their own, then clamped to its monitor
    fn place(&mut self, id: ClientId, attrs: &WindowAttributes) -> Result<()> {
        let m = self.client(id)?.monitor;
        let area = self.monitors[m].window_area;
        let bw = self.config.global.border_width;
        let mut rect = attrs.rect;

        let positioned = self
            .conn
            .size_hints(self.client(id)?.window)
            .map_or(false, |h| h.position);
        if !attrs.viewable && !positioned {
            rect.point = match self.config.global.placement {
                Placement::UnderMouse => self.conn.pointer_position().unwrap_or(rect.point),
                Placement::Centered => Point::new(
                    area.x() + (area.width() as i32 - rect.width() as i32) / 2,
                    area.y() + (area.height() as i32 - rect.height() as i32) / 2,
                ),
            };
        }

        let outer_w = (rect.width() + 2 * bw) as i32;
        let outer_h = (rect.height() + 2 * bw) as i32;
        if rect.x() + outer_w > area.right() {
            rect.point.x = area.right() - outer_w;
        }
        if rect.y() + outer_h > area.bottom() {
            rect.point.y = area.bottom() - outer_h;
        }
        rect.point.x = rect.x().max(area.x());
        rect.point.y = rect.y().max(area.y());

        let c = self.client_mut(id)?;
        c.rect = rect;
        c.old_rect = rect;
        c.border_width = bw;
        Ok(())
    }

    /// Let go of the client owning `window`. Swallowed windows only count when
    /// they are destroyed
    pub(crate) fn unmanage_window(&mut self, window: Window, destroyed: bool) -> Result<()> {
        if let Some(id) = self.window_to_client(window) {
            return self.unmanage(id, destroyed);
        }

        if destroyed {
            if let Some(owner) = self.swallower_of(window) {
                if let Some(hidden) = self.client_mut(owner)?.swallowing.take() {
                    self.clients.remove(&hidden);
                    log::debug!("{} lost the terminal it swallowed", owner);
                }
                let m = self.client(owner)?.monitor;
                self.arrange(Some(m))?;
                self.focus(None)?;
            }
        }

        Ok(())
    }

    /// Stop managing `id`. A client showing a swallowed window gives the
    /// terminal back instead
    pub(crate) fn unmanage(&mut self, id: ClientId, destroyed: bool) -> Result<()> {
        let c = self.client(id)?;
        if c.swallowing.is_some() {
            return self.unswallow(id);
        }

        let (m, window, old_bw) = (c.monitor, c.window, c.old_border_width);
        let mon = &mut self.monitors[m];
        mon.detach(id);
        mon.detach_focus(id, &self.clients);
        for mon in &mut self.monitors {
            mon.pertag.forget(id);
        }

        if !destroyed {
            self.conn.set_border_width(window, old_bw)?;
            self.conn.set_client_state(window, IcccmWindowState::Withdrawn)?;
        }

        self.clients.remove(&id);
        log::info!("no longer managing {} ({})", window, id);

        self.arrange(Some(m))?;
        self.focus(None)?;
        self.update_client_list()
    }

    // ============================ Swallowing ========================

    /// The terminal client `id` was started from, if it may be swallowed
    fn term_for_window(&self, id: ClientId) -> Option<ClientId> {
        if !self.config.global.swallow {
            return None;
        }

        let c = self.client(id).ok()?;
        let pid = c.pid?;
        if c.is(ClientFlags::TERMINAL) {
            return None;
        }

        self.monitors
            .iter()
            .flat_map(|m| m.clients.iter())
            .filter_map(|t| self.clients.get(t))
            .find(|t| {
                t.id != id
                    && t.is(ClientFlags::TERMINAL)
                    && t.swallowing.is_none()
                    && t.pid
                        .map_or(false, |tp| utils::is_descendant(tp, pid, self.parent_of.as_ref()))
            })
            .map(|t| t.id)
    }

    /// Hide the terminal `term` behind its child `child`. The terminal's
    /// client keeps its place and shows the child's window
    pub(crate) fn swallow(&mut self, term: ClientId, child: ClientId) -> Result<()> {
        let c = self.client(child)?;
        if c.is(ClientFlags::NO_SWALLOW) || c.is(ClientFlags::TERMINAL) {
            return Ok(());
        }

        let old_m = c.monitor;
        let mon = &mut self.monitors[old_m];
        mon.detach(child);
        mon.detach_focus(child, &self.clients);

        let t = self.client(term)?;
        let (m, term_window) = (t.monitor, t.window);
        let child_window = self.client(child)?.window;

        self.conn.unmap_window(term_window)?;
        self.conn.set_client_state(term_window, IcccmWindowState::Iconic)?;

        let c = self.client_mut(child)?;
        c.monitor = m;
        c.window = term_window;

        let t = self.client_mut(term)?;
        t.swallowing = Some(child);
        t.window = child_window;
        let (rect, bw) = (t.rect, t.border_width);

        log::debug!("{} swallowed {}", term, child);
        self.update_title(term)?;
        self.arrange(Some(m))?;
        self.conn.configure_window(child_window, rect, bw)?;
        self.conn.send_configure_notify(child_window, rect, bw)?;
        self.update_client_list()
    }

    /// The window shown by `id` is gone: show the swallowed terminal again
    fn unswallow(&mut self, id: ClientId) -> Result<()> {
        let hidden = match self.client_mut(id)?.swallowing.take() {
            Some(hidden) => hidden,
            None => return Ok(()),
        };
        let terminal = self
            .clients
            .remove(&hidden)
            .ok_or(Error::UnknownClient(hidden))?;

        let c = self.client_mut(id)?;
        c.window = terminal.window;
        let (m, window, rect, bw) = (c.monitor, c.window, c.rect, c.border_width);

        log::debug!("{} gave back its terminal", id);
        self.update_title(id)?;
        self.arrange(Some(m))?;
        self.conn.map_window(window)?;
        self.conn.configure_window(window, rect, bw)?;
        self.conn.send_configure_notify(window, rect, bw)?;
        self.conn.set_client_state(window, IcccmWindowState::Normal)?;
        self.focus(None)?;
        self.update_client_list()
    }

    /// Give a swallowed child its own client again, or let the terminal of
    /// the selection swallow it
    pub(crate) fn toggle_swallow(&mut self) -> Result<()> {
        let id = match self.selected() {
            Some(id) => id,
            None => return Ok(()),
        };

        let hidden = match self.client(id)?.swallowing {
            Some(hidden) => hidden,
            None => {
                if let Some(terminal) = self.term_for_window(id) {
                    self.swallow(terminal, id)?;
                    self.focus(None)?;
                }
                return Ok(());
            },
        };

        let child_window = self.client(id)?.window;
        let term_window = self.client(hidden)?.window;

        let c = self.client_mut(id)?;
        c.swallowing = None;
        c.window = term_window;
        let m = c.monitor;
        self.client_mut(hidden)?.window = child_window;

        self.update_title(id)?;
        self.update_title(hidden)?;

        let mon = &mut self.monitors[m];
        mon.attach(hidden);
        mon.attach_focus(hidden);

        for window in [term_window, child_window] {
            self.conn.set_client_state(window, IcccmWindowState::Normal)?;
        }
        self.arrange(Some(m))?;
        self.conn.map_window(term_window)?;
        self.conn.map_window(child_window)?;
        self.focus(Some(hidden))?;
        self.update_client_list()
    }

    // ============================ Properties ========================

    /// Fold the matching rules into a new client
    fn apply_rules(&mut self, id: ClientId) -> Result<()> {
        let c = self.client(id)?;
        let meta = WindowMeta::new(&c.class, &c.instance, &c.name);
        let monitors = self.monitors.len();
        let outcome = match_rules(
            &self.config.rules,
            &meta,
            self.config.global.rule_merge,
            |m| m < monitors,
        );

        let m = outcome.monitor.unwrap_or(c.monitor);
        let tags = outcome.resolve_tags(self.valid_tags(), self.monitors[m].tagset());

        let c = self.client_mut(id)?;
        c.monitor = m;
        c.tags = tags;
        c.set(ClientFlags::FLOATING, outcome.floating);
        c.set(ClientFlags::TERMINAL, outcome.terminal);
        c.set(ClientFlags::NO_SWALLOW, outcome.no_swallow);
        c.opacity = outcome.opacity.map_or(Opacity::Unset, Opacity::Set);

        Ok(())
    }

    pub(crate) fn update_title(&mut self, id: ClientId) -> Result<()> {
        let title = self.conn.window_title(self.client(id)?.window);
        self.client_mut(id)?.name = if title.is_empty() {
            MISSING_VALUE.to_owned()
        } else {
            title
        };
        Ok(())
    }

    /// Read `WM_NORMAL_HINTS` again
    pub(crate) fn update_size_hints(&mut self, id: ClientId) -> Result<()> {
        let hints = self
            .conn
            .size_hints(self.client(id)?.window)
            .unwrap_or_default();

        let c = self.client_mut(id)?;
        c.set(ClientFlags::FIXED, hints.is_fixed());
        c.hints = hints;
        c.hints_valid = true;
        Ok(())
    }

    /// Read urgency and input focus from `WM_HINTS`. The selection never
    /// stays urgent
    pub(crate) fn update_wm_hints(&mut self, id: ClientId) -> Result<()> {
        let window = self.client(id)?.window;
        let hints = match self.conn.wm_hints(window) {
            Some(hints) => hints,
            None => return Ok(()),
        };

        if hints.urgent && self.selected() == Some(id) {
            self.conn.set_urgency_hint(window, false)?;
        } else {
            self.client_mut(id)?.set(ClientFlags::URGENT, hints.urgent);
        }

        self.client_mut(id)?
            .set(ClientFlags::NEVER_FOCUS, hints.input == Some(false));
        Ok(())
    }

    /// React to `_NET_WM_STATE` and `_NET_WM_WINDOW_TYPE`
    pub(crate) fn update_window_type(&mut self, id: ClientId) -> Result<()> {
        let window = self.client(id)?.window;

        if self.conn.requests_fullscreen(window) {
            self.set_fullscreen(id, true)?;
        }

        match self.conn.window_type(window) {
            Some(WindowType::Dialog) => self.client_mut(id)?.set(ClientFlags::FLOATING, true),
            Some(WindowType::Desktop) => {
                let valid = self.valid_tags();
                let c = self.client_mut(id)?;
                c.set(ClientFlags::DESKTOP | ClientFlags::FLOATING | ClientFlags::FIXED, true);
                c.tags = valid;
                self.conn.set_tags_property(window, valid)?;
            },
            _ => {},
        }

        Ok(())
    }
}
