//! Input focus, the focus order and moving clients around the insertion order

use super::WindowManager;
use crate::{
    action::StackPos,
    config::ZoomPolicy,
    core::lowest_tag,
    monitor::client::{Client, ClientFlags, ClientId, Opacity},
    x::XConn,
};
use anyhow::Result;

impl<X: XConn> WindowManager<X> {
    // ============================== Focus ===========================

    /// Focus `target`, or pick a replacement when it is missing or hidden
    pub(crate) fn focus(&mut self, target: Option<ClientId>) -> Result<()> {
        let target = if target.is_none() && self.config.global.lose_focus {
            None
        } else {
            target
                .filter(|&id| self.is_visible(id))
                .or_else(|| self.replacement())
        };

        if let Some(old) = self.selected().filter(|&old| Some(old) != target) {
            self.unfocus(old, false)?;
        }

        if let Some(id) = target {
            let c = self.client(id)?;
            let (m, window, urgent) = (c.monitor, c.window, c.is(ClientFlags::URGENT));
            self.selmon = m;
            if urgent {
                self.set_urgent(id, false)?;
            }

            let mon = &mut self.monitors[m];
            mon.detach_focus(id, &self.clients);
            mon.attach_focus(id);

            self.grab_buttons(id, true)?;
            self.conn.set_border_color(window, self.colors.focused)?;
            self.set_focus(id)?;
        } else {
            self.conn.focus_window(None)?;
        }

        self.monitors[self.selmon].sel = target;

        if let Some(id) = target {
            let c = self.client(id)?;
            self.conn.set_opacity(c.window, c.opacity.value())?;
        }

        Ok(())
    }

    /// Most recently focused visible client of the selected monitor. Clients
    /// that only became visible with the last view change come first
    fn replacement(&self) -> Option<ClientId> {
        let mon = &self.monitors[self.selmon];
        let visible = |id: &ClientId| self.clients.get(id).filter(|c| mon.is_visible(c));

        mon.stack
            .iter()
            .copied()
            .find(|id| visible(id).map_or(false, |c| c.tags & mon.previous_tagset() == 0))
            .or_else(|| mon.stack.iter().copied().find(|id| visible(id).is_some()))
    }

    /// Draw `id` as unfocused. With `reset` the input focus goes back to the
    /// root window
    pub(crate) fn unfocus(&mut self, id: ClientId, reset: bool) -> Result<()> {
        self.grab_buttons(id, false)?;

        let c = self.client(id)?;
        let color = if c.is(ClientFlags::URGENT) {
            self.colors.urgent
        } else {
            self.colors.normal
        };
        self.conn.set_border_color(c.window, color)?;

        if !c.opacity.is_opaque() {
            self.conn.set_opacity(c.window, Some(self.config.global.shade))?;
        }

        if reset {
            self.conn.focus_window(None)?;
        }

        Ok(())
    }

    pub(crate) fn set_focus(&self, id: ClientId) -> Result<()> {
        let c = self.client(id)?;
        if !c.is(ClientFlags::NEVER_FOCUS) {
            self.conn.focus_window(Some(c.window))?;
        }
        self.conn.send_take_focus(c.window)
    }

    pub(crate) fn set_urgent(&mut self, id: ClientId, urgent: bool) -> Result<()> {
        let c = self.client_mut(id)?;
        c.set(ClientFlags::URGENT, urgent);
        let window = c.window;
        self.conn.set_urgency_hint(window, urgent)
    }

    // ========================== Stack moves =========================

    /// Whether `c` takes part in moves on monitor `m`. Clients on every tag
    /// are skipped when stepping relatively
    fn counted(&self, c: &Client, m: usize, skip_sticky: bool) -> bool {
        let valid = self.valid_tags();
        self.monitors[m].is_visible(c) && !(skip_sticky && c.tags & valid == valid)
    }

    /// Clients of the selected monitor that count for `pos`, in insertion
    /// order
    fn candidates(&self, skip_sticky: bool) -> Vec<ClientId> {
        self.monitors[self.selmon]
            .clients
            .iter()
            .copied()
            .filter(|id| {
                self.clients
                    .get(id)
                    .map_or(false, |c| self.counted(c, self.selmon, skip_sticky))
            })
            .collect()
    }

    /// Resolve `pos` to an index into [`Self::candidates`]
    pub(crate) fn stack_pos(&self, pos: StackPos, skip_sticky: bool) -> Option<usize> {
        let sel = self.selected();
        let candidates = self.candidates(skip_sticky);
        let n = candidates.len() as i32;

        match pos {
            StackPos::Previous => {
                let mon = &self.monitors[self.selmon];
                let previous = mon.stack.iter().find(|&&id| Some(id) != sel && candidates.contains(&id))?;
                candidates.iter().position(|id| id == previous)
            },
            StackPos::Relative(step) => {
                if sel.is_none() && !self.config.global.lose_focus {
                    return None;
                }
                if n == 0 {
                    return Some(0);
                }

                let before = self.monitors[self.selmon]
                    .clients
                    .iter()
                    .take_while(|&&id| Some(id) != sel)
                    .filter(|id| candidates.contains(id))
                    .count() as i32;
                Some((before + step).rem_euclid(n) as usize)
            },
            StackPos::Index(i) if i < 0 => Some((n + i).max(0) as usize),
            StackPos::Index(i) => Some(i as usize),
        }
    }

    /// Focus another visible client of the selected monitor
    pub(crate) fn focus_stack(&mut self, pos: StackPos) -> Result<()> {
        if let Some(sel) = self.selected() {
            if self.client(sel)?.is_fullscreen() && self.config.global.lock_fullscreen {
                return Ok(());
            }
        }

        let skip_sticky = !matches!(pos, StackPos::Index(_));
        let idx = match self.stack_pos(pos, skip_sticky) {
            Some(idx) => idx,
            None => return Ok(()),
        };

        let candidates = self.candidates(skip_sticky);
        if let Some(&target) = candidates.get(idx).or_else(|| candidates.last()) {
            self.focus(Some(target))?;
            self.restack(self.selmon)?;
        }

        Ok(())
    }

    /// Move the selection to another position in the insertion order
    pub(crate) fn push_stack(&mut self, pos: StackPos) -> Result<()> {
        let sel = match self.selected() {
            Some(sel) => sel,
            None => return Ok(()),
        };
        let idx = match self.stack_pos(pos, false) {
            Some(idx) => idx,
            None => return Ok(()),
        };

        let m = self.selmon;
        // The client the selection ends up behind
        let anchor = if idx == 0 {
            None
        } else {
            let others = self
                .candidates(false)
                .into_iter()
                .filter(|&id| id != sel)
                .collect::<Vec<_>>();
            others.get(idx - 1).or_else(|| others.last()).copied()
        };

        let mon = &mut self.monitors[m];
        mon.detach(sel);
        match anchor.and_then(|a| mon.clients.iter().position(|&id| id == a)) {
            Some(pos) => mon.clients.insert(pos + 1, sel),
            None => mon.attach(sel),
        }

        self.arrange(Some(m))
    }

    /// Promote the selection to the master area
    pub(crate) fn zoom(&mut self) -> Result<()> {
        let sel = match self.selected() {
            Some(sel) => sel,
            None => return Ok(()),
        };

        let target = match self.config.global.zoom_policy {
            ZoomPolicy::Push => self.zoom_push(sel),
            ZoomPolicy::Swap => self.zoom_swap(sel),
        };

        if let Some(target) = target {
            self.focus(Some(target))?;
            self.arrange(Some(self.selmon))?;
        }

        Ok(())
    }

    /// Move the selection to the front, or the next tiled client when the
    /// selection already is the master
    fn zoom_push(&mut self, sel: ClientId) -> Option<ClientId> {
        let mon = &mut self.monitors[self.selmon];
        let tiled = mon.tiled(&self.clients);

        let target = if tiled.first() == Some(&sel) {
            *tiled.get(1)?
        } else {
            sel
        };

        mon.detach(target);
        mon.attach(target);
        Some(target)
    }

    /// Exchange the selection with the master. Zooming the master again swaps
    /// back the client it displaced
    fn zoom_swap(&mut self, sel: ClientId) -> Option<ClientId> {
        let mon = &mut self.monitors[self.selmon];
        let tiled = mon.tiled(&self.clients);
        let before = |clients: &[ClientId], id: ClientId| {
            let idx = clients.iter().position(|&c| c == id)?;
            idx.checked_sub(1).map(|i| clients[i])
        };
        let tiled_after = |id: ClientId| {
            let idx = tiled.iter().position(|&c| c == id);
            match idx {
                Some(idx) => tiled.get(idx + 1).copied(),
                None => {
                    let pos = mon.clients.iter().position(|&c| c == id)?;
                    mon.clients[pos + 1..].iter().copied().find(|c| tiled.contains(c))
                },
            }
        };

        let master = tiled.first().copied();
        let prev_zoom = mon.pertag.slot().prev_zoom;
        let mut target = sel;
        let mut at = None;
        let mut forget = false;

        if master == Some(sel) {
            at = prev_zoom.and_then(|p| before(&mon.clients, p));
            let previous = at.and_then(tiled_after);

            if previous.is_some() && previous == prev_zoom {
                target = previous?;
            } else {
                forget = true;
                at = None;
                target = tiled_after(sel)?;
            }
        }

        if Some(target) != master && at.is_none() {
            at = before(&mon.clients, target);
        }

        if forget {
            mon.pertag.slot_mut().prev_zoom = None;
        }

        mon.detach(target);
        mon.attach(target);

        if let (Some(master), Some(at)) = (master.filter(|&m| m != target), at) {
            mon.pertag.slot_mut().prev_zoom = Some(master);
            if at != master {
                mon.detach(master);
                let idx = mon.clients.iter().position(|&c| c == at).map_or(mon.clients.len(), |i| i + 1);
                mon.clients.insert(idx, master);
            }
        }

        Some(target)
    }

    // ============================ Monitors ==========================

    /// Focus the monitor `step` monitors away
    pub(crate) fn focus_monitor(&mut self, step: i32) -> Result<()> {
        if self.monitors.len() < 2 {
            return Ok(());
        }

        let m = self.step_monitor(step);
        if m == self.selmon {
            return Ok(());
        }

        if let Some(sel) = self.selected() {
            self.unfocus(sel, false)?;
        }
        self.selmon = m;
        self.focus(None)
    }

    /// Send the selection to the monitor `step` monitors away
    pub(crate) fn tag_monitor(&mut self, step: i32) -> Result<()> {
        if self.monitors.len() < 2 {
            return Ok(());
        }

        match self.selected() {
            Some(sel) => self.send_to_monitor(sel, self.step_monitor(step)),
            None => Ok(()),
        }
    }

    /// Move a client to monitor `m`, showing it on that monitor's tags
    pub(crate) fn send_to_monitor(&mut self, id: ClientId, m: usize) -> Result<()> {
        let old = self.client(id)?.monitor;
        if old == m {
            return Ok(());
        }

        self.unfocus(id, true)?;
        let mon = &mut self.monitors[old];
        mon.detach(id);
        mon.detach_focus(id, &self.clients);

        let tags = self.monitors[m].tagset();
        let c = self.client_mut(id)?;
        c.monitor = m;
        c.tags = tags;
        let window = c.window;

        let mon = &mut self.monitors[m];
        if self.config.global.attach_bottom {
            mon.attach_bottom(id);
        } else {
            mon.attach(id);
        }
        mon.attach_focus(id);

        log::debug!("{} moved from monitor {} to {}", id, old, m);
        self.conn.set_tags_property(window, tags)?;
        self.focus(None)?;
        self.arrange(None)
    }

    /// View the first tag of the first urgent client and focus it
    pub(crate) fn focus_urgent(&mut self) -> Result<()> {
        let urgent = self
            .monitors
            .iter()
            .flat_map(|m| m.clients.iter())
            .filter_map(|id| self.clients.get(id))
            .find(|c| c.is(ClientFlags::URGENT))
            .map(|c| (c.id, c.monitor, c.tags));

        let (id, m, tags) = match urgent {
            Some(urgent) => urgent,
            None => return Ok(()),
        };

        if m != self.selmon {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, false)?;
            }
            self.selmon = m;
        }

        if !self.is_visible(id) {
            if let Some(tag) = lowest_tag(tags) {
                self.view(1 << tag)?;
            }
        }

        self.focus(Some(id))
    }

    // ============================= Opacity ==========================

    /// Change the opacity of the selection
    pub(crate) fn change_opacity(&mut self, f: impl FnOnce(Opacity) -> Opacity) -> Result<()> {
        let id = match self.selected() {
            Some(id) => id,
            None => return Ok(()),
        };

        let c = self.client_mut(id)?;
        c.opacity = f(c.opacity);
        log::debug!("{} opacity is now {:?}", id, c.opacity);

        let (window, value) = (c.window, c.opacity.value());
        self.conn.set_opacity(window, value)
    }
}
