//! Placing clients on their monitors

use super::WindowManager;
use crate::{
    geometry::{Point, Rectangle},
    layout::{self, LayoutKind, Params},
    monitor::client::{ClientFlags, ClientId},
    x::XConn,
};
use anyhow::Result;

impl<X: XConn> WindowManager<X> {
    /// Show, hide and lay out the clients of monitor `m`, or of every monitor
    pub(crate) fn arrange(&mut self, m: Option<usize>) -> Result<()> {
        if let Some(m) = m {
            self.show_hide(m)?;
            self.arrange_monitor(m)?;
            self.restack(m)
        } else {
            for m in 0..self.monitors.len() {
                self.show_hide(m)?;
            }
            for m in 0..self.monitors.len() {
                self.arrange_monitor(m)?;
            }
            Ok(())
        }
    }

    /// Run the active layout of monitor `m`
    fn arrange_monitor(&mut self, m: usize) -> Result<()> {
        self.monitors[m].repair(&self.clients);
        let mon = &self.monitors[m];
        let tiled = mon.tiled(&self.clients);
        let visible = mon.visible(&self.clients).count();
        let areas = mon.pertag.slot().areas;

        let params = Params {
            area: mon.window_area,
            gap: self.config.global.window_gap,
            master_count: mon.master_count,
            stack_columns: mon.stack_columns,
            areas: &areas,
        };
        let arrangement = layout::arrange(mon.layout(), &params, tiled.len(), visible);
        self.monitors[m].symbol = arrangement.symbol;

        for (id, cell) in tiled.into_iter().zip(arrangement.cells) {
            let rect = self.client(id)?.inner(cell);
            self.resize(id, rect, false)?;
        }

        Ok(())
    }

    /// Move visible clients into view top down and hidden ones out of view
    /// bottom up
    fn show_hide(&mut self, m: usize) -> Result<()> {
        let arranged = self.monitors[m].layout().arranges();
        let offscreen = 2 * self.screen.width() as i32;
        let (shown, hidden): (Vec<_>, Vec<_>) = self.monitors[m]
            .stack
            .iter()
            .copied()
            .partition(|&id| self.is_visible(id));

        for id in shown {
            let c = self.client(id)?;
            self.conn.move_window(c.window, c.rect.point)?;

            if (!arranged || c.is_floating()) && !c.is_fullscreen() {
                let rect = if c.is_floating() { c.rect } else { c.old_rect };
                self.resize(id, rect, false)?;
            }
        }

        for id in hidden.into_iter().rev() {
            let c = self.client(id)?;
            let point = Point::new(c.rect.x() + offscreen, c.rect.y());
            self.conn.move_window(c.window, point)?;
        }

        Ok(())
    }

    /// Raise the selection where appropriate and stack the tiled clients in
    /// focus order
    pub(crate) fn restack(&mut self, m: usize) -> Result<()> {
        let sel = match self.monitors[m].sel {
            Some(sel) => sel,
            None => return Ok(()),
        };
        let arranged = self.monitors[m].layout().arranges();

        let c = self.client_mut(sel)?;
        let raise = c.is_floating() || !arranged || c.is(ClientFlags::RAISE_ME);
        c.set(ClientFlags::RAISE_ME, false);
        let (window, desktop) = (c.window, c.is(ClientFlags::DESKTOP));
        if raise && !desktop {
            self.conn.raise_window(window)?;
        }

        if arranged {
            let mut sibling = None;
            for id in &self.monitors[m].stack {
                let c = self.client(*id)?;
                if !c.is_floating() && self.is_visible(*id) {
                    self.conn.stack_below(c.window, sibling)?;
                    sibling = Some(c.window);
                }
            }
        }

        Ok(())
    }

    // ============================ Geometry ==========================

    /// Resolve `rect` against the client's size hints and apply it if that
    /// changes anything
    pub(crate) fn resize(&mut self, id: ClientId, rect: Rectangle, interactive: bool) -> Result<()> {
        if !self.client(id)?.hints_valid {
            self.update_size_hints(id)?;
        }

        let c = self.client(id)?;
        let (rect, changed) = c.apply_size_hints(rect, interactive, &self.hint_context(c.monitor));
        if changed {
            self.resize_client(id, rect)?;
        }

        Ok(())
    }

    /// Apply `rect` unconditionally
    pub(crate) fn resize_client(&mut self, id: ClientId, rect: Rectangle) -> Result<()> {
        let m = self.client(id)?.monitor;
        let arranged = self.monitors[m].layout().arranges();
        let c = self.client_mut(id)?;

        c.rect = rect;
        if (!arranged || c.is_floating()) && !c.is_fullscreen() {
            c.old_rect = rect;
        }

        let (window, bw) = (c.window, c.border_width);
        self.conn.configure_window(window, rect, bw)?;
        self.conn.send_configure_notify(window, rect, bw)
    }

    // ============================= Layouts ==========================

    /// Select `kind` in the other half of the pair, or flip to the other
    /// layout when no kind is given. Asking for the active layout does nothing
    pub(crate) fn set_layout(&mut self, kind: Option<LayoutKind>) -> Result<()> {
        let m = self.selmon;
        let mon = &mut self.monitors[m];
        let slot = mon.pertag.slot_mut();

        if kind == Some(slot.layout()) {
            return Ok(());
        }
        slot.sellt ^= 1;
        if let Some(k) = kind {
            slot.layouts[slot.sellt] = k;
        }

        mon.load_pertag();
        mon.symbol = mon.layout().symbol().to_owned();
        log::debug!("monitor {} uses the {:?} layout", m, mon.layout());

        self.arrange(Some(m))
    }

    /// Step through the configured layouts
    pub(crate) fn cycle_layouts(&mut self, step: i32) -> Result<()> {
        let layouts = &self.config.global.layouts;
        if layouts.is_empty() {
            return Ok(());
        }

        let current = self.monitors[self.selmon].layout();
        let idx = layouts.iter().position(|&l| l == current).unwrap_or(0) as i32;
        let next = layouts[(idx + step).rem_euclid(layouts.len() as i32) as usize];

        if next == current {
            return Ok(());
        }
        self.set_layout(Some(next))
    }

    pub(crate) fn inc_master(&mut self, delta: i32) -> Result<()> {
        let m = self.selmon;
        let slot = self.monitors[m].pertag.slot_mut();
        slot.master_count = (slot.master_count as i32 + delta).max(0) as u32;
        self.monitors[m].load_pertag();
        self.arrange(Some(m))
    }

    pub(crate) fn inc_stack_columns(&mut self, delta: i32) -> Result<()> {
        let m = self.selmon;
        let slot = self.monitors[m].pertag.slot_mut();
        slot.stack_columns = (slot.stack_columns as i32 + delta).max(1) as u32;
        self.monitors[m].load_pertag();
        self.arrange(Some(m))
    }

    /// Show or hide the bar of the selected monitor for the current view
    pub(crate) fn toggle_bar(&mut self) -> Result<()> {
        let m = self.selmon;
        let bar_height = self.config.global.bar_height;
        let mon = &mut self.monitors[m];

        mon.show_bar = !mon.show_bar;
        mon.pertag.slot_mut().show_bar = mon.show_bar;
        mon.update_bar_position(bar_height);

        self.arrange(Some(m))
    }

    // ========================= Floating state =======================

    /// Take the selection out of the layout or put it back
    pub(crate) fn toggle_floating(&mut self) -> Result<()> {
        let id = match self.selected() {
            Some(id) => id,
            None => return Ok(()),
        };
        let floating = !self.client(id)?.is_floating();
        self.set_floating(id, floating)
    }

    /// Float `id` at its remembered geometry, or hand it back to the layout.
    /// Fixed-size clients always float
    pub(crate) fn set_floating(&mut self, id: ClientId, floating: bool) -> Result<()> {
        let c = self.client_mut(id)?;
        let floating = floating || c.is(ClientFlags::FIXED);
        c.set(ClientFlags::FLOATING, floating);

        if floating {
            let rect = c.old_rect;
            self.resize(id, rect, false)?;
        } else if !c.is_fullscreen() {
            c.old_rect = c.rect;
        }

        let m = self.client(id)?.monitor;
        self.arrange(Some(m))
    }

    /// Cover the whole monitor, or go back to the geometry from before
    pub(crate) fn set_fullscreen(&mut self, id: ClientId, on: bool) -> Result<()> {
        let c = self.client(id)?;
        if on == c.is_fullscreen() {
            return Ok(());
        }

        let (window, m) = (c.window, c.monitor);
        self.conn.set_fullscreen_state(window, on)?;

        if on {
            let screen = self.monitors[m].screen;
            let c = self.client_mut(id)?;
            c.set(ClientFlags::FULLSCREEN, true);
            c.set(ClientFlags::OLD_FLOATING, c.is_floating());
            c.set(ClientFlags::FLOATING, true);
            c.old_rect = c.rect;
            c.old_border_width = c.border_width;
            c.border_width = 0;
            let desktop = c.is(ClientFlags::DESKTOP);

            self.resize_client(id, screen)?;
            if !desktop {
                self.conn.raise_window(window)?;
            }
            Ok(())
        } else {
            let c = self.client_mut(id)?;
            c.set(ClientFlags::FULLSCREEN, false);
            c.set(ClientFlags::FLOATING, c.is(ClientFlags::OLD_FLOATING));
            c.border_width = c.old_border_width;
            let rect = c.old_rect;

            self.resize_client(id, rect)?;
            self.arrange(Some(m))
        }
    }
}
