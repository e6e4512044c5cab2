//! Representation of physical monitors and the clients attached to them

pub(crate) mod client;
pub(crate) mod pertag;

use self::{
    client::{Client, ClientId},
    pertag::{Pertag, TagSlot},
};
use crate::{
    core::{pertag_index, TagMask},
    geometry::Rectangle,
    layout::LayoutKind,
    utils::BuildIdHasher,
};
use std::collections::{HashMap, HashSet};

/// Arena owning every [`Client`]
pub(crate) type Clients = HashMap<ClientId, Client, BuildIdHasher>;

/// A logical display region with its own tagset and client lists
#[derive(Debug, Clone)]
pub(crate) struct Monitor {
    pub(crate) num:           usize,
    /// The whole monitor
    pub(crate) screen:        Rectangle,
    /// What remains after the bar is reserved
    pub(crate) window_area:   Rectangle,
    pub(crate) bar_y:         i32,
    pub(crate) show_bar:      bool,
    pub(crate) top_bar:       bool,
    /// Current and previous visible tags
    pub(crate) tagset:        [TagMask; 2],
    pub(crate) seltags:       usize,
    pub(crate) sellt:         usize,
    pub(crate) layouts:       [LayoutKind; 2],
    pub(crate) symbol:        String,
    pub(crate) master_count:  u32,
    pub(crate) stack_columns: u32,
    /// Insertion order
    pub(crate) clients:       Vec<ClientId>,
    /// Focus order, most recently focused first
    pub(crate) stack:         Vec<ClientId>,
    pub(crate) sel:           Option<ClientId>,
    pub(crate) pertag:        Pertag,
}

impl Monitor {
    /// Create a new [`Monitor`]
    pub(crate) fn new(
        num: usize,
        screen: Rectangle,
        tag_count: usize,
        top_bar: bool,
        defaults: TagSlot,
    ) -> Self {
        let pertag = Pertag::new(tag_count, defaults);
        let slot = pertag.slot();

        Self {
            num,
            screen,
            window_area: screen,
            bar_y: 0,
            show_bar: slot.show_bar,
            top_bar,
            tagset: [1, 1],
            seltags: 0,
            sellt: slot.sellt,
            layouts: slot.layouts,
            symbol: slot.layout().symbol().to_owned(),
            master_count: slot.master_count,
            stack_columns: slot.stack_columns,
            clients: vec![],
            stack: vec![],
            sel: None,
            pertag,
        }
    }

    /// Tags currently shown
    pub(crate) const fn tagset(&self) -> TagMask {
        self.tagset[self.seltags]
    }

    /// Tags shown before the last view change
    pub(crate) const fn previous_tagset(&self) -> TagMask {
        self.tagset[1 - self.seltags]
    }

    /// Active layout
    pub(crate) const fn layout(&self) -> LayoutKind {
        self.layouts[self.sellt]
    }

    /// Whether `client` is shown under the current tagset
    pub(crate) const fn is_visible(&self, client: &Client) -> bool {
        client.tags & self.tagset() != 0
    }

    /// Place the bar and shrink the window area accordingly
    pub(crate) fn update_bar_position(&mut self, bar_height: u32) {
        let mut area = self.screen;

        if self.show_bar && bar_height < area.height() {
            area.dimension.height -= bar_height;
            if self.top_bar {
                self.bar_y = area.y();
                area.point.y += bar_height as i32;
            } else {
                self.bar_y = area.bottom();
            }
        } else {
            self.bar_y = -(bar_height as i32);
        }

        self.window_area = area;
    }

    /// Make the pertag slot for `tagset` the working parameters. Returns
    /// whether the bar visibility has to change
    pub(crate) fn load_pertag(&mut self) -> bool {
        let slot = self.pertag.slot();
        self.master_count = slot.master_count;
        self.stack_columns = slot.stack_columns;
        self.sellt = slot.sellt;
        self.layouts = slot.layouts;
        slot.show_bar != self.show_bar
    }

    /// Slot the view `mask` maps to
    pub(crate) const fn slot_for(mask: TagMask, valid: TagMask) -> usize {
        pertag_index(mask, valid)
    }

    // ========================== Registry ===========================

    /// Prepend to the insertion order
    pub(crate) fn attach(&mut self, id: ClientId) {
        if self.clients.contains(&id) {
            log::error!("refusing to attach {} twice to monitor {}", id, self.num);
            return;
        }
        self.clients.insert(0, id);
    }

    /// Append to the insertion order
    pub(crate) fn attach_bottom(&mut self, id: ClientId) {
        if self.clients.contains(&id) {
            log::error!("refusing to attach {} twice to monitor {}", id, self.num);
            return;
        }
        self.clients.push(id);
    }

    /// Remove from the insertion order. Returns whether it was a member
    pub(crate) fn detach(&mut self, id: ClientId) -> bool {
        if let Some(idx) = self.clients.iter().position(|&c| c == id) {
            self.clients.remove(idx);
            true
        } else {
            log::warn!("{} is not attached to monitor {}", id, self.num);
            false
        }
    }

    /// Put on top of the focus order
    pub(crate) fn attach_focus(&mut self, id: ClientId) {
        if self.stack.contains(&id) {
            log::error!("{} already in the focus order of monitor {}", id, self.num);
            return;
        }
        self.stack.insert(0, id);
    }

    /// Remove from the focus order. When `id` was selected, the most recently
    /// focused client that is still visible takes over the selection
    pub(crate) fn detach_focus(&mut self, id: ClientId, clients: &Clients) -> bool {
        let found = if let Some(idx) = self.stack.iter().position(|&c| c == id) {
            self.stack.remove(idx);
            true
        } else {
            log::warn!("{} is not in the focus order of monitor {}", id, self.num);
            false
        };

        if self.sel == Some(id) {
            self.sel = self
                .stack
                .iter()
                .copied()
                .find(|c| clients.get(c).map_or(false, |c| self.is_visible(c)));

            if self.sel.is_none() {
                log::debug!("monitor {} lost its selection", self.num);
            }
        }

        found
    }

    /// Visible clients in insertion order
    pub(crate) fn visible<'a>(&'a self, clients: &'a Clients) -> impl Iterator<Item = ClientId> + 'a {
        self.clients
            .iter()
            .copied()
            .filter(move |c| clients.get(c).map_or(false, |c| self.is_visible(c)))
    }

    /// Visible clients the layout is responsible for, in insertion order
    pub(crate) fn tiled(&self, clients: &Clients) -> Vec<ClientId> {
        self.clients
            .iter()
            .copied()
            .filter(|c| {
                clients.get(c).map_or(false, |c| {
                    self.is_visible(c) && !c.is_floating() && !c.is_fullscreen()
                })
            })
            .collect()
    }

    /// Drop duplicate and dangling handles from both lists. Returns `false` if
    /// anything had to be repaired
    pub(crate) fn repair(&mut self, clients: &Clients) -> bool {
        fn scrub(list: &mut Vec<ClientId>, clients: &Clients) -> bool {
            let mut seen = HashSet::new();
            let before = list.len();
            list.retain(|c| clients.contains_key(c) && seen.insert(*c));
            before == list.len()
        }

        let clients_ok = scrub(&mut self.clients, clients);
        let stack_ok = scrub(&mut self.stack, clients);
        if self.sel.map_or(false, |s| !self.clients.contains(&s)) {
            self.sel = None;
        }
        if !(clients_ok && stack_ok) {
            log::error!("client lists of monitor {} were corrupt and have been repaired", self.num);
        }

        clients_ok && stack_ok
    }
}

#[cfg(test)]
mod tests {
    use super::{
        client::{Client, ClientId},
        pertag::{Area, SplitDir, TagSlot},
        Clients,
        Monitor,
    };
    use crate::{geometry::Rectangle, layout::LayoutKind};

    fn slot() -> TagSlot {
        TagSlot {
            master_count:  1,
            stack_columns: 1,
            areas:         [
                Area { dir: SplitDir::Horizontal, fact: 1.1 },
                Area { dir: SplitDir::Vertical, fact: 1.1 },
                Area { dir: SplitDir::Vertical, fact: 1.1 },
            ],
            layouts:       [LayoutKind::Tile, LayoutKind::Monocle],
            sellt:         0,
            show_bar:      true,
            prev_zoom:     None,
        }
    }

    fn setup(tags: &[u32]) -> (Monitor, Clients) {
        let mut mon = Monitor::new(0, Rectangle::new(0, 0, 1920, 1080), 9, true, slot());
        let mut clients = Clients::default();
        for (i, &t) in tags.iter().enumerate() {
            let mut c = Client::new(ClientId(i), i as u32 + 1, Rectangle::default(), 0);
            c.tags = t;
            clients.insert(c.id, c);
            mon.attach_bottom(ClientId(i));
            mon.attach_focus(ClientId(i));
        }
        (mon, clients)
    }

    #[test]
    fn bar_reserves_space() {
        let (mut mon, _) = setup(&[]);
        mon.update_bar_position(20);
        assert_eq!(mon.window_area, Rectangle::new(0, 20, 1920, 1060));
        assert_eq!(mon.bar_y, 0);

        mon.top_bar = false;
        mon.update_bar_position(20);
        assert_eq!(mon.window_area, Rectangle::new(0, 0, 1920, 1060));
        assert_eq!(mon.bar_y, 1060);

        mon.show_bar = false;
        mon.update_bar_position(20);
        assert_eq!(mon.window_area, mon.screen);
    }

    #[test]
    fn attach_preserves_order() {
        let (mut mon, _) = setup(&[1, 1, 1]);
        mon.attach(ClientId(7));
        assert_eq!(mon.clients, vec![ClientId(7), ClientId(0), ClientId(1), ClientId(2)]);

        assert!(mon.detach(ClientId(1)));
        assert_eq!(mon.clients, vec![ClientId(7), ClientId(0), ClientId(2)]);
        assert!(!mon.detach(ClientId(1)));

        mon.attach(ClientId(0));
        assert_eq!(mon.clients.len(), 3);
    }

    #[test]
    fn focus_detach_picks_visible_replacement() {
        // Stack order is 2, 1, 0; client 1 is on a hidden tag
        let (mut mon, clients) = setup(&[1, 2, 1]);
        mon.sel = Some(ClientId(2));

        assert!(mon.detach_focus(ClientId(2), &clients));
        assert_eq!(mon.sel, Some(ClientId(0)));
        assert_eq!(mon.stack, vec![ClientId(1), ClientId(0)]);
    }

    #[test]
    fn focus_detach_of_last_visible_clears_selection() {
        let (mut mon, clients) = setup(&[1]);
        mon.sel = Some(ClientId(0));

        assert!(mon.detach_focus(ClientId(0), &clients));
        assert_eq!(mon.sel, None);
        assert!(!mon.detach_focus(ClientId(0), &clients));
    }

    #[test]
    fn duplicate_focus_attach_is_refused() {
        let (mut mon, _) = setup(&[1, 1]);
        mon.attach_focus(ClientId(0));
        assert_eq!(mon.stack, vec![ClientId(1), ClientId(0)]);
    }

    #[test]
    fn repair_removes_duplicates() {
        let (mut mon, clients) = setup(&[1, 1]);
        assert!(mon.repair(&clients));

        mon.stack.push(ClientId(1));
        mon.clients.push(ClientId(42));
        assert!(!mon.repair(&clients));
        assert_eq!(mon.stack, vec![ClientId(1), ClientId(0)]);
        assert_eq!(mon.clients, vec![ClientId(0), ClientId(1)]);
    }

    #[test]
    fn tiled_skips_floating_and_hidden() {
        let (mon, mut clients) = setup(&[1, 1, 2, 1]);
        if let Some(c) = clients.get_mut(&ClientId(3)) {
            c.set(super::client::ClientFlags::FLOATING, true);
        }

        assert_eq!(mon.tiled(&clients), vec![ClientId(0), ClientId(1)]);
        assert_eq!(mon.visible(&clients).count(), 3);
    }
}
