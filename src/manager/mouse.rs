//! Moving and resizing clients with the pointer

use super::WindowManager;
use crate::{
    geometry::{Point, Rectangle},
    monitor::client::{ClientId, Opacity},
    x::{event::XEvent, CursorKind, XConn},
};
use anyhow::Result;

impl<X: XConn> WindowManager<X> {
    /// Drag the selection around, snapping to the edges of its monitor
    pub(crate) fn move_mouse(&mut self) -> Result<()> {
        let id = match self.selected() {
            Some(id) => id,
            None => return Ok(()),
        };
        let c = self.client(id)?;
        if c.is_fullscreen() {
            return Ok(());
        }
        let origin = c.rect.point;

        self.restack(self.selmon)?;
        let start = self.conn.pointer_position()?;

        self.drag(id, CursorKind::Move, move |wm, id, pointer| {
            let m = wm.selmon;
            let area = wm.monitors[m].window_area;
            let arranged = wm.monitors[m].layout().arranges();
            let snap = wm.config.global.snap as i32;

            let c = wm.client(id)?;
            let (w, h) = (c.outer_width() as i32, c.outer_height() as i32);
            let mut x = origin.x + (pointer.x - start.x);
            let mut y = origin.y + (pointer.y - start.y);

            if (area.x() - x).abs() < snap {
                x = area.x();
            } else if (area.right() - (x + w)).abs() < snap {
                x = area.right() - w;
            }
            if (area.y() - y).abs() < snap {
                y = area.y();
            } else if (area.bottom() - (y + h)).abs() < snap {
                y = area.bottom() - h;
            }

            if !c.is_floating()
                && arranged
                && ((x - c.rect.x()).abs() > snap || (y - c.rect.y()).abs() > snap)
            {
                wm.set_floating(id, true)?;
            }

            let c = wm.client(id)?;
            if !arranged || c.is_floating() {
                let rect = Rectangle::new(x, y, c.rect.width(), c.rect.height());
                wm.resize(id, rect, true)?;
            }
            Ok(())
        })
    }

    /// Resize the selection from its bottom right corner
    pub(crate) fn resize_mouse(&mut self) -> Result<()> {
        let id = match self.selected() {
            Some(id) => id,
            None => return Ok(()),
        };
        let c = self.client(id)?;
        if c.is_fullscreen() {
            return Ok(());
        }
        let (origin, bw) = (c.rect.point, c.border_width as i32);

        self.restack(self.selmon)?;
        self.warp_to_corner(id)?;

        self.drag(id, CursorKind::Resize, move |wm, id, pointer| {
            let m = wm.selmon;
            let area = wm.monitors[m].window_area;
            let arranged = wm.monitors[m].layout().arranges();
            let snap = wm.config.global.snap as i32;

            let w = (pointer.x - origin.x - 2 * bw + 1).max(1);
            let h = (pointer.y - origin.y - 2 * bw + 1).max(1);

            let c = wm.client(id)?;
            let inside = area.is_inside(Point::new(origin.x + w, origin.y + h));
            if inside
                && !c.is_floating()
                && arranged
                && ((w - c.rect.width() as i32).abs() > snap
                    || (h - c.rect.height() as i32).abs() > snap)
            {
                wm.set_floating(id, true)?;
            }

            if !arranged || wm.client(id)?.is_floating() {
                wm.resize(id, Rectangle::new(origin.x, origin.y, w as u32, h as u32), true)?;
            }
            Ok(())
        })?;

        self.warp_to_corner(id)
    }

    fn warp_to_corner(&self, id: ClientId) -> Result<()> {
        let c = self.client(id)?;
        let corner = Point::new(
            (c.rect.width() + c.border_width) as i32 - 1,
            (c.rect.height() + c.border_width) as i32 - 1,
        );
        self.conn.warp_pointer(c.window, corner)
    }

    /// Run a pointer grab until the button is released, calling `on_motion`
    /// with the pointer position at most `motion_rate` times a second. The
    /// client ends up on the monitor it overlaps the most
    fn drag<F>(&mut self, id: ClientId, cursor: CursorKind, mut on_motion: F) -> Result<()>
    where
        F: FnMut(&mut Self, ClientId, Point) -> Result<()>,
    {
        if !self.conn.grab_pointer(cursor)? {
            log::warn!("could not grab the pointer for {:?}", cursor);
            return Ok(());
        }

        let window = self.client(id)?.window;
        self.conn.set_opacity(window, Some(Opacity::DRAG))?;

        let interval = self.config.global.motion_interval();
        let mut last = None;
        let result = loop {
            let event = match self.conn.next_event() {
                Ok(event) => event,
                Err(e) => break Err(e),
            };

            let outcome = match event {
                XEvent::ButtonRelease(_) => break Ok(()),
                ev @ (XEvent::ConfigureRequest(_) | XEvent::MapRequest { .. }) =>
                    self.handle_event(ev),
                XEvent::MotionNotify(ev) => {
                    if last.map_or(false, |t: u32| ev.time.wrapping_sub(t) <= interval) {
                        continue;
                    }
                    last = Some(ev.time);
                    on_motion(self, id, ev.abs)
                },
                _ => Ok(()),
            };
            if let Err(e) = outcome {
                break Err(e);
            }
        };

        self.conn.ungrab_pointer()?;
        let c = self.client(id)?;
        self.conn.set_opacity(c.window, c.opacity.value())?;
        result?;

        let m = self.rect_to_monitor(self.client(id)?.rect);
        if m != self.selmon {
            self.send_to_monitor(id, m)?;
            self.selmon = m;
            self.focus(None)?;
        }

        Ok(())
    }
}
