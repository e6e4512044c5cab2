//! A scripted [`XConn`] that records every request made of it

use super::{
    event::{ConfigureRequestData, XEvent},
    input::{ButtonCombo, KeyCombo},
    property::{Hints, IcccmWindowState, SizeHints},
    CursorKind,
    WindowAttributes,
    XConn,
};
use crate::{
    core::{decoration::Color, Pid, TagMask, Window, WindowType},
    geometry::{Point, Rectangle},
};
use anyhow::{anyhow, Result};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
};

/// Side effects a [`MockXConn`] has been asked for
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Configure(Window, Rectangle, u32),
    ConfigureNotify(Window, Rectangle),
    Forward(Window),
    Move(Window, Point),
    BorderWidth(Window, u32),
    BorderColor(Window, Color),
    Raise(Window),
    StackBelow(Window, Option<Window>),
    Map(Window),
    Unmap(Window),
    Focus(Option<Window>),
    TakeFocus(Window),
    Close(Window),
    State(Window, IcccmWindowState),
    Opacity(Window, Option<f64>),
    Fullscreen(Window, bool),
    Urgency(Window, bool),
    Tags(Window, TagMask),
    GrabButtons(Window, bool),
    ClientList(Vec<Window>),
    CurrentDesktop(u32),
}

/// Metadata a scripted window reports
#[derive(Debug, Clone)]
pub(crate) struct MockWindow {
    pub(crate) attributes:    WindowAttributes,
    pub(crate) class:         String,
    pub(crate) instance:      String,
    pub(crate) title:         String,
    pub(crate) pid:           Option<Pid>,
    pub(crate) transient_for: Option<Window>,
    pub(crate) window_type:   Option<WindowType>,
    pub(crate) fullscreen:    bool,
    pub(crate) size_hints:    Option<SizeHints>,
    pub(crate) hints:         Option<Hints>,
    pub(crate) tags:          Option<TagMask>,
}

impl Default for MockWindow {
    fn default() -> Self {
        Self {
            attributes:    WindowAttributes {
                override_redirect: false,
                viewable:          true,
                rect:              Rectangle::new(0, 0, 400, 300),
                border_width:      0,
            },
            class:         String::from("Mock"),
            instance:      String::from("mock"),
            title:         String::from("mock window"),
            pid:           None,
            transient_for: None,
            window_type:   None,
            fullscreen:    false,
            size_hints:    None,
            hints:         None,
            tags:          None,
        }
    }
}

/// An in-memory display server
#[derive(Debug)]
pub(crate) struct MockXConn {
    screens: RefCell<Vec<Rectangle>>,
    windows: RefCell<HashMap<Window, MockWindow>>,
    events:  RefCell<VecDeque<XEvent>>,
    calls:   RefCell<Vec<Call>>,
    pointer: Cell<Point>,
}

impl MockXConn {
    /// Create a new [`MockXConn`] with the given screens
    pub(crate) fn new(screens: Vec<Rectangle>) -> Self {
        Self {
            screens: RefCell::new(screens),
            windows: RefCell::new(HashMap::new()),
            events: RefCell::new(VecDeque::new()),
            calls: RefCell::new(vec![]),
            pointer: Cell::new(Point::new(0, 0)),
        }
    }

    /// Make `window` known to the server
    pub(crate) fn add_window(&self, window: Window, meta: MockWindow) {
        self.windows.borrow_mut().insert(window, meta);
    }

    /// Queue events returned by [`XConn::next_event`]
    pub(crate) fn push_events(&self, events: impl IntoIterator<Item = XEvent>) {
        self.events.borrow_mut().extend(events);
    }

    /// Replace the screens, as after an output change
    pub(crate) fn set_screens(&self, screens: Vec<Rectangle>) {
        self.screens.replace(screens);
    }

    pub(crate) fn set_pointer(&self, point: Point) {
        self.pointer.set(point);
    }

    /// Everything requested so far
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Target of the last focus request
    pub(crate) fn focused(&self) -> Option<Window> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::Focus(w) => Some(*w),
            _ => None,
        })?
    }

    /// Geometry of the last configure request for `window`
    pub(crate) fn geometry(&self, window: Window) -> Option<Rectangle> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::Configure(w, rect, _) if *w == window => Some(*rect),
            _ => None,
        })
    }

    /// Whether the last map or unmap request for `window` was a map
    pub(crate) fn is_mapped(&self, window: Window) -> bool {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Map(w) if *w == window => Some(true),
                Call::Unmap(w) if *w == window => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Last value stored with [`XConn::set_tags_property`]
    pub(crate) fn stored_tags(&self, window: Window) -> Option<TagMask> {
        self.windows.borrow().get(&window).and_then(|w| w.tags)
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.borrow_mut().push(call);
        Ok(())
    }

    fn with<T>(&self, window: Window, f: impl FnOnce(&MockWindow) -> T) -> Option<T> {
        self.windows.borrow().get(&window).map(f)
    }
}

impl XConn for MockXConn {
    fn root(&self) -> Window {
        1
    }

    fn screen_rects(&self) -> Result<Vec<Rectangle>> {
        Ok(self.screens.borrow().clone())
    }

    fn pointer_position(&self) -> Result<Point> {
        Ok(self.pointer.get())
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        let mut windows: Vec<_> = self.windows.borrow().keys().copied().collect();
        windows.sort_unstable();
        Ok(windows)
    }

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes> {
        self.with(window, |w| w.attributes)
    }

    fn window_class(&self, window: Window) -> (String, String) {
        self.with(window, |w| (w.class.clone(), w.instance.clone()))
            .unwrap_or_default()
    }

    fn window_title(&self, window: Window) -> String {
        self.with(window, |w| w.title.clone()).unwrap_or_default()
    }

    fn window_pid(&self, window: Window) -> Option<Pid> {
        self.with(window, |w| w.pid).flatten()
    }

    fn transient_for(&self, window: Window) -> Option<Window> {
        self.with(window, |w| w.transient_for).flatten()
    }

    fn window_type(&self, window: Window) -> Option<WindowType> {
        self.with(window, |w| w.window_type).flatten()
    }

    fn requests_fullscreen(&self, window: Window) -> bool {
        self.with(window, |w| w.fullscreen).unwrap_or(false)
    }

    fn size_hints(&self, window: Window) -> Option<SizeHints> {
        self.with(window, |w| w.size_hints).flatten()
    }

    fn wm_hints(&self, window: Window) -> Option<Hints> {
        self.with(window, |w| w.hints).flatten()
    }

    fn is_iconic(&self, _window: Window) -> bool {
        false
    }

    fn tags_property(&self, window: Window) -> Option<TagMask> {
        self.with(window, |w| w.tags).flatten()
    }

    fn numlock_mask(&self) -> u16 {
        0
    }

    fn configure_window(&self, window: Window, rect: Rectangle, border_width: u32) -> Result<()> {
        self.record(Call::Configure(window, rect, border_width))
    }

    fn send_configure_notify(
        &self,
        window: Window,
        rect: Rectangle,
        _border_width: u32,
    ) -> Result<()> {
        self.record(Call::ConfigureNotify(window, rect))
    }

    fn forward_configure_request(&self, request: &ConfigureRequestData) -> Result<()> {
        self.record(Call::Forward(request.id))
    }

    fn move_window(&self, window: Window, point: Point) -> Result<()> {
        self.record(Call::Move(window, point))
    }

    fn set_border_width(&self, window: Window, width: u32) -> Result<()> {
        self.record(Call::BorderWidth(window, width))
    }

    fn set_border_color(&self, window: Window, color: Color) -> Result<()> {
        self.record(Call::BorderColor(window, color))
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.record(Call::Raise(window))
    }

    fn stack_below(&self, window: Window, sibling: Option<Window>) -> Result<()> {
        self.record(Call::StackBelow(window, sibling))
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.record(Call::Map(window))
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.record(Call::Unmap(window))
    }

    fn focus_window(&self, window: Option<Window>) -> Result<()> {
        self.record(Call::Focus(window))
    }

    fn send_take_focus(&self, window: Window) -> Result<()> {
        self.record(Call::TakeFocus(window))
    }

    fn close_window(&self, window: Window) -> Result<()> {
        self.record(Call::Close(window))
    }

    fn set_client_state(&self, window: Window, state: IcccmWindowState) -> Result<()> {
        self.record(Call::State(window, state))
    }

    fn set_opacity(&self, window: Window, opacity: Option<f64>) -> Result<()> {
        self.record(Call::Opacity(window, opacity))
    }

    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> Result<()> {
        self.record(Call::Fullscreen(window, fullscreen))
    }

    fn set_urgency_hint(&self, window: Window, urgent: bool) -> Result<()> {
        self.record(Call::Urgency(window, urgent))
    }

    fn set_tags_property(&self, window: Window, tags: TagMask) -> Result<()> {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.tags = Some(tags);
        }
        self.record(Call::Tags(window, tags))
    }

    fn select_client_events(&self, _window: Window, _focus_follows_mouse: bool) -> Result<()> {
        Ok(())
    }

    fn grab_keys(&self, _keys: &[KeyCombo]) -> Result<()> {
        Ok(())
    }

    fn grab_buttons(&self, window: Window, focused: bool, _buttons: &[ButtonCombo]) -> Result<()> {
        self.record(Call::GrabButtons(window, focused))
    }

    fn grab_pointer(&self, _cursor: CursorKind) -> Result<bool> {
        Ok(true)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        Ok(())
    }

    fn warp_pointer(&self, _window: Window, _point: Point) -> Result<()> {
        Ok(())
    }

    fn update_client_list(&self, windows: &[Window]) -> Result<()> {
        self.record(Call::ClientList(windows.to_vec()))
    }

    fn set_current_desktop(&self, index: u32) -> Result<()> {
        self.record(Call::CurrentDesktop(index))
    }

    fn next_event(&self) -> Result<XEvent> {
        self.events
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no more scripted events"))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
