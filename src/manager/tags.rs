//! Switching the visible tags and retagging clients

use super::WindowManager;
use crate::{
    core::{lowest_tag, TagMask},
    monitor::{client::ClientId, Monitor},
    x::XConn,
};
use anyhow::Result;

impl<X: XConn> WindowManager<X> {
    /// Show the tags in `mask` on the selected monitor. An empty mask goes
    /// back to the previous view
    pub(crate) fn view(&mut self, mask: TagMask) -> Result<()> {
        let valid = self.valid_tags();
        let masked = mask & valid;
        let m = self.selmon;
        let mon = &mut self.monitors[m];

        if masked == mon.tagset() {
            return Ok(());
        }

        mon.seltags ^= 1;
        if masked == 0 {
            mon.pertag.swap();
        } else {
            mon.tagset[mon.seltags] = masked;
            mon.pertag.select(Monitor::slot_for(masked, valid));
        }
        log::debug!("monitor {} views {:#b}", m, mon.tagset());

        self.apply_view(m)
    }

    /// Show or hide the tags in `mask` next to the current ones
    pub(crate) fn toggle_view(&mut self, mask: TagMask) -> Result<()> {
        let valid = self.valid_tags();
        let m = self.selmon;
        let mon = &mut self.monitors[m];
        let tagset = mon.tagset() ^ (mask & valid);

        if tagset == 0 {
            return Ok(());
        }

        let current = mon.pertag.current;
        if tagset == valid {
            mon.pertag.select(0);
        } else if current == 0 || tagset & (1 << (current - 1)) == 0 {
            mon.pertag.select(Monitor::slot_for(tagset, valid));
        }

        mon.tagset[mon.seltags] = tagset;
        self.apply_view(m)
    }

    /// Load the parameters of the new view and show it
    fn apply_view(&mut self, m: usize) -> Result<()> {
        if self.monitors[m].load_pertag() {
            self.toggle_bar()?;
        }

        self.focus(None)?;
        self.set_current_desktop()?;
        self.arrange(Some(m))
    }

    /// Put the selection on exactly the tags in `mask`
    pub(crate) fn tag(&mut self, mask: TagMask) -> Result<()> {
        let masked = mask & self.valid_tags();
        match self.selected() {
            Some(id) if masked != 0 => self.retag(id, masked),
            _ => Ok(()),
        }
    }

    /// Add or remove the tags in `mask` from the selection, as long as one
    /// tag remains
    pub(crate) fn toggle_tag(&mut self, mask: TagMask) -> Result<()> {
        let id = match self.selected() {
            Some(id) => id,
            None => return Ok(()),
        };

        let tags = self.client(id)?.tags ^ (mask & self.valid_tags());
        if tags == 0 {
            log::debug!("refusing to remove the last tag of {}", id);
            return Ok(());
        }

        self.retag(id, tags)
    }

    fn retag(&mut self, id: ClientId, tags: TagMask) -> Result<()> {
        let c = self.client_mut(id)?;
        c.tags = tags;
        let window = c.window;

        self.conn.set_tags_property(window, tags)?;
        self.focus(None)?;
        self.arrange(Some(self.selmon))
    }

    /// Publish the lowest visible tag of the selected monitor
    pub(crate) fn set_current_desktop(&self) -> Result<()> {
        let tagset = self.monitors.get(self.selmon).map_or(1, Monitor::tagset);
        self.conn.set_current_desktop(lowest_tag(tagset).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_consistent, id_of, map_default, selected_window, wm};
    use super::super::WindowManager;
    use crate::{
        action::{Action, TagArg},
        core::{change::Change, ALL_TAGS},
        geometry::Rectangle,
        layout::LayoutKind,
        x::mock::{Call, MockXConn},
    };

    #[test]
    fn view_and_back() {
        let mut wm = wm();
        wm.view(1 << 2).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 1 << 2);
        assert_eq!(wm.monitors[0].pertag.current, 3);
        assert!(wm.conn.calls().contains(&Call::CurrentDesktop(2)));

        wm.view(0).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 1);
        assert_eq!(wm.monitors[0].pertag.current, 1);

        wm.handle_action(&Action::View(TagArg::All)).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 0x1FF);
        assert_eq!(wm.monitors[0].pertag.current, 0);
    }

    #[test]
    fn layouts_are_remembered_per_tag() {
        let mut wm = wm();
        wm.set_layout(Some(LayoutKind::Grid)).unwrap();
        wm.inc_master(2).unwrap();

        wm.view(1 << 1).unwrap();
        assert_eq!(wm.monitors[0].layout(), LayoutKind::Tile);
        assert_eq!(wm.monitors[0].master_count, 1);

        wm.view(1).unwrap();
        assert_eq!(wm.monitors[0].layout(), LayoutKind::Grid);
        assert_eq!(wm.monitors[0].master_count, 3);
    }

    fn tiled_rects(wm: &WindowManager<MockXConn>) -> Vec<Rectangle> {
        wm.monitors[0].clients.iter().map(|id| wm.clients[id].rect).collect()
    }

    #[test]
    fn split_parameters_are_remembered_per_tag() {
        let mut wm = wm();
        for window in 10..14 {
            map_default(&mut wm, window);
        }
        let defaults = wm.monitors[0].pertag.slot().areas;
        let default_rects = tiled_rects(&wm);

        wm.inc_stack_columns(1).unwrap();
        wm.handle_action(&Action::SetFactors([
            Change::Set(2.0),
            Change::Set(0.5),
            Change::Set(1.5),
        ]))
        .unwrap();
        wm.handle_action(&Action::SetDirections([Change::Inc(1); 3])).unwrap();

        let areas = wm.monitors[0].pertag.slot().areas;
        let rects = tiled_rects(&wm);
        assert_eq!(
            areas.iter().map(|a| a.fact).collect::<Vec<_>>(),
            vec![2.0, 0.5, 1.5]
        );
        for (area, default) in areas.iter().zip(defaults) {
            assert_ne!(area.dir, default.dir);
        }
        assert_ne!(rects, default_rects);

        wm.view(1 << 1).unwrap();
        assert_eq!(wm.monitors[0].stack_columns, 1);
        assert_eq!(wm.monitors[0].pertag.slot().areas, defaults);

        wm.view(1).unwrap();
        assert_eq!(wm.monitors[0].stack_columns, 2);
        assert_eq!(wm.monitors[0].pertag.slot().areas, areas);
        assert_eq!(tiled_rects(&wm), rects);
        assert_consistent(&wm);
    }

    #[test]
    fn bar_visibility_is_remembered_per_tag() {
        let mut wm = wm();
        wm.toggle_bar().unwrap();
        assert!(!wm.monitors[0].show_bar);

        wm.view(1 << 1).unwrap();
        assert!(wm.monitors[0].show_bar);
        wm.view(1).unwrap();
        assert!(!wm.monitors[0].show_bar);
        assert_eq!(wm.monitors[0].window_area, wm.monitors[0].screen);
    }

    #[test]
    fn toggle_view_keeps_one_tag() {
        let mut wm = wm();
        wm.toggle_view(1 << 1).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 0b11);
        assert_eq!(wm.monitors[0].pertag.current, 1);

        wm.toggle_view(1).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 0b10);
        assert_eq!(wm.monitors[0].pertag.current, 2);

        // Would leave nothing visible
        wm.toggle_view(1 << 1).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 0b10);

        wm.toggle_view(ALL_TAGS ^ 0b10).unwrap();
        assert_eq!(wm.monitors[0].tagset(), 0x1FF);
        assert_eq!(wm.monitors[0].pertag.current, 0);

        // Leaving the all-tags view picks the lowest remaining tag
        wm.toggle_view(1).unwrap();
        assert_eq!(wm.monitors[0].pertag.current, 2);
    }

    #[test]
    fn tagging_hides_the_client() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        map_default(&mut wm, 11);
        let id = id_of(&wm, 11);

        wm.tag(1 << 4).unwrap();
        assert_eq!(wm.clients[&id].tags, 1 << 4);
        assert_eq!(wm.conn.stored_tags(11), Some(1 << 4));
        assert_eq!(selected_window(&wm), Some(10));

        // Tags outside the configured ones are rejected
        wm.tag(1 << 20).unwrap();
        assert_eq!(wm.clients[&id_of(&wm, 10)].tags, 1);
        assert_consistent(&wm);
    }

    #[test]
    fn toggle_tag_never_empties() {
        let mut wm = wm();
        map_default(&mut wm, 10);
        let id = id_of(&wm, 10);
        wm.toggle_view(1 << 1).unwrap();

        wm.toggle_tag(1 << 1).unwrap();
        assert_eq!(wm.clients[&id].tags, 0b11);
        wm.toggle_tag(1).unwrap();
        assert_eq!(wm.clients[&id].tags, 0b10);
        assert_eq!(selected_window(&wm), Some(10));
        wm.toggle_tag(1 << 1).unwrap();
        assert_eq!(wm.clients[&id].tags, 0b10);
    }
}
