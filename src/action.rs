//! Commands that can be bound to keys and buttons

use crate::{
    core::{change::Change, TagMask, ALL_TAGS},
    layout::LayoutKind,
};
use serde::{Deserialize, Serialize};

/// Position in the list of visible clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum StackPos {
    /// Steps away from the selection, wrapping around
    Relative(i32),
    /// Absolute index; negative values count from the end
    Index(i32),
    /// The client that was focused before the selection
    Previous,
}

/// Tags an action applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum TagArg {
    /// A single tag, counting from `1`. `0` means every tag
    Index(u8),
    /// A raw bitmask
    Mask(TagMask),
    /// Every tag
    All,
    /// The tags shown before the last view change
    Previous,
}

impl TagArg {
    /// The bitmask; an empty mask goes back to the previous tagset
    pub(crate) fn mask(self) -> TagMask {
        match self {
            Self::Index(0) | Self::All => ALL_TAGS,
            Self::Index(n) => 1_u32.checked_shl(u32::from(n) - 1).unwrap_or(0),
            Self::Mask(m) => m,
            Self::Previous => 0,
        }
    }
}

/// Everything the window manager can be asked to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Action {
    /// Run a command with the user's shell
    Spawn(String),
    /// Stop managing windows and exit
    Quit,
    /// Close the selected client
    KillClient,

    /// Focus another visible client
    FocusStack(StackPos),
    /// Move the selected client to another position
    PushStack(StackPos),
    /// Promote the selected client to the master area
    Zoom,

    View(TagArg),
    ToggleView(TagArg),
    Tag(TagArg),
    ToggleTag(TagArg),

    /// Focus the monitor `n` steps away
    FocusMonitor(i32),
    /// Send the selected client to the monitor `n` steps away
    TagMonitor(i32),

    IncMaster(i32),
    IncStackColumns(i32),
    /// Select a layout. Without one, or with the active one, switch to the
    /// other layout of the pair
    SetLayout(Option<LayoutKind>),
    /// Step through the configured layouts
    CycleLayouts(i32),
    /// Primary split, master area, stack area
    SetDirections([Change<i32>; 3]),
    SetFactors([Change<f32>; 3]),

    ToggleBar,
    ToggleFloating,
    ToggleFullscreen,
    ToggleOpacity,
    AdjustOpacity(f64),
    /// View the first urgent client
    FocusUrgent,
    Unswallow,

    MoveMouse,
    ResizeMouse,

    ToggleResizeHints,
    ToggleFixed,
    ToggleAttachBottom,
    ToggleZoomSwap,
    TogglePlacement,
    ToggleRaiseOnClick,
    ToggleLoseFocus,
}

#[cfg(test)]
mod tests {
    use super::{Action, StackPos, TagArg};
    use crate::{
        core::{change::Change, ALL_TAGS},
        layout::LayoutKind,
    };
    use indexmap::IndexMap;

    #[test]
    fn parse_bindings() {
        let yaml = r#"
mod4+Return: { spawn: "st -e tmux" }
mod4+j: { focus-stack: { relative: 1 } }
mod4+shift+k: { push-stack: previous }
mod4+space: { set-layout: ~ }
mod4+m: { set-layout: monocle }
mod4+ctrl+h: { set-factors: [{ inc: -0.1 }, { set: 1.0 }, { inc: 0.0 }] }
mod4+shift+q: quit
mod4+Tab: { view: previous }
"#;
        let bindings: IndexMap<String, Action> = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(bindings["mod4+Return"], Action::Spawn("st -e tmux".to_owned()));
        assert_eq!(bindings["mod4+j"], Action::FocusStack(StackPos::Relative(1)));
        assert_eq!(bindings["mod4+shift+k"], Action::PushStack(StackPos::Previous));
        assert_eq!(bindings["mod4+space"], Action::SetLayout(None));
        assert_eq!(bindings["mod4+m"], Action::SetLayout(Some(LayoutKind::Monocle)));
        assert_eq!(
            bindings["mod4+ctrl+h"],
            Action::SetFactors([Change::Inc(-0.1), Change::Set(1.0), Change::Inc(0.0)])
        );
        assert_eq!(bindings["mod4+shift+q"], Action::Quit);
        assert_eq!(bindings.get_index(0).map(|(k, _)| k.as_str()), Some("mod4+Return"));
    }

    #[test]
    fn tag_masks() {
        assert_eq!(TagArg::Index(1).mask(), 0b1_u32);
        assert_eq!(TagArg::Index(9).mask(), 0x100_u32);
        assert_eq!(TagArg::Index(0).mask(), ALL_TAGS);
        assert_eq!(TagArg::Previous.mask(), 0_u32);
        assert_eq!(TagArg::Mask(0b101).mask(), 0b101_u32);
    }
}
