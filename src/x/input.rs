//! Input into the window manager

use crate::error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use x11rb::protocol::xproto::ModMask as XModMask;

/// A keysym as found in `X11/keysymdef.h`
pub(crate) type Keysym = u32;

// ============================== ModMask =============================
// ====================================================================

/// Keycode modifier that is held
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ModMask {
    /// Left or right `shift` key
    Shift,
    /// Caps-lock
    Lock,
    /// Left or right `control` key
    #[serde(alias = "ctrl")]
    Control,
    /// Modifier 1 as defined in `xmodmap` (usually `alt`)
    #[serde(alias = "alt")]
    Mod1,
    /// Modifier 2 as defined in `xmodmap` (usually `num-lock`)
    Mod2,
    /// Modifier 3 as defined in `xmodmap` (usually blank)
    Mod3,
    /// Modifier 4 as defined in `xmodmap` (usually `super`)
    #[serde(alias = "super")]
    Mod4,
    /// Modifier 5 as defined or in `xmodmap` (usually `mode_shift`)
    Mod5,
}

/// Convert from a [`ModMask`] to an [`x11rb`] [`ModMask`](XModMask)
impl From<ModMask> for XModMask {
    fn from(m: ModMask) -> Self {
        match m {
            ModMask::Shift => Self::SHIFT,
            ModMask::Lock => Self::LOCK,
            ModMask::Control => Self::CONTROL,
            ModMask::Mod1 => Self::M1,
            ModMask::Mod2 => Self::M2,
            ModMask::Mod3 => Self::M3,
            ModMask::Mod4 => Self::M4,
            ModMask::Mod5 => Self::M5,
        }
    }
}

impl From<ModMask> for u16 {
    fn from(m: ModMask) -> Self {
        u16::from(XModMask::from(m))
    }
}

impl FromStr for ModMask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shift" => Ok(Self::Shift),
            "lock" => Ok(Self::Lock),
            "control" | "ctrl" => Ok(Self::Control),
            "mod1" | "alt" => Ok(Self::Mod1),
            "mod2" => Ok(Self::Mod2),
            "mod3" => Ok(Self::Mod3),
            "mod4" | "super" => Ok(Self::Mod4),
            "mod5" => Ok(Self::Mod5),
            _ => Err(Error::InvalidBinding(s.to_owned(), String::from("unknown modifier"))),
        }
    }
}

impl fmt::Display for ModMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Shift => "shift",
            Self::Lock => "lock",
            Self::Control => "control",
            Self::Mod1 => "mod1",
            Self::Mod2 => "mod2",
            Self::Mod3 => "mod3",
            Self::Mod4 => "mod4",
            Self::Mod5 => "mod5",
        })
    }
}

/// Keep only real modifiers, dropping caps-lock and the num-lock modifier
pub(crate) fn clean_mask(state: u16, numlock: u16) -> u16 {
    let modifiers = ModMask::iter()
        .filter(|m| *m != ModMask::Lock)
        .fold(0, |acc, m| acc | u16::from(m));

    state & !(numlock | u16::from(ModMask::Lock)) & modifiers
}

// ============================== Button ==============================
// ====================================================================

/// Available buttons on a mouse
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Button {
    /// 1, Left-click
    #[serde(rename = "mouse1", alias = "button1")]
    Left,
    /// 2, Middle-click
    #[serde(rename = "mouse2", alias = "button2")]
    Middle,
    /// 3, Right-click
    #[serde(rename = "mouse3", alias = "button3")]
    Right,
    /// 4, Wheel-scroll up
    #[serde(alias = "scroll-up", alias = "scroll_up")]
    ScrollUp,
    /// 5, Wheel-scroll down
    #[serde(alias = "scroll-down", alias = "scroll_down")]
    ScrollDown,
}

impl TryFrom<u8> for Button {
    type Error = Error;

    fn try_from(u: u8) -> Result<Self, Self::Error> {
        match u {
            1 => Ok(Self::Left),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Right),
            4 => Ok(Self::ScrollUp),
            5 => Ok(Self::ScrollDown),
            _ => Err(Error::InvalidBinding(u.to_string(), String::from("unknown button"))),
        }
    }
}

impl FromStr for Button {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mouse1" | "button1" => Ok(Self::Left),
            "mouse2" | "button2" => Ok(Self::Middle),
            "mouse3" | "button3" => Ok(Self::Right),
            "mouse4" | "button4" | "scroll-up" => Ok(Self::ScrollUp),
            "mouse5" | "button5" | "scroll-down" => Ok(Self::ScrollDown),
            _ => Err(Error::InvalidBinding(s.to_owned(), String::from("unknown button"))),
        }
    }
}

// ============================= Bindings =============================
// ====================================================================

/// A key combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct KeyCombo {
    pub(crate) mask:   u16,
    pub(crate) keysym: Keysym,
}

/// A mouse button combination on a client window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ButtonCombo {
    pub(crate) mask:   u16,
    pub(crate) button: Button,
}

/// `mod4+shift+Return`: any number of modifiers and a final key, `+` separated
static BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<mods>(?:[A-Za-z0-9]+\+)*)(?P<key>[A-Za-z0-9_]+)$")
        .expect("binding pattern is valid")
});

/// Split a binding into its modifier mask and its final token
fn split_binding(binding: &str) -> Result<(u16, &str), Error> {
    let invalid = |why: &str| Error::InvalidBinding(binding.to_owned(), why.to_owned());
    let caps = BINDING
        .captures(binding.trim())
        .ok_or_else(|| invalid("expected `mod+...+key`"))?;

    let mut mask = 0;
    for m in caps
        .name("mods")
        .map_or("", |m| m.as_str())
        .split('+')
        .filter(|m| !m.is_empty())
    {
        mask |= u16::from(m.parse::<ModMask>()?);
    }

    let key = caps
        .name("key")
        .map(|k| k.as_str())
        .ok_or_else(|| invalid("missing key"))?;

    Ok((mask, key))
}

impl FromStr for KeyCombo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mask, key) = split_binding(s)?;
        let keysym = keysym_from_name(key)
            .ok_or_else(|| Error::InvalidBinding(s.to_owned(), format!("unknown key `{}`", key)))?;
        Ok(Self { mask, keysym })
    }
}

impl FromStr for ButtonCombo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mask, button) = split_binding(s)?;
        Ok(Self {
            mask,
            button: button.parse()?,
        })
    }
}

// ============================== Keysyms =============================
// ====================================================================

/// Keysym for a key name. Letters are folded to lowercase since keys are
/// looked up without the shift level
pub(crate) fn keysym_from_name(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_ascii_lowercase() as Keysym);
        }
    }

    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=24).contains(&n).then(|| 0xFFBD + n);
    }

    let sym = match name {
        "Return" => 0xFF0D,
        "Tab" => 0xFF09,
        "space" => 0x0020,
        "Escape" => 0xFF1B,
        "BackSpace" => 0xFF08,
        "Delete" => 0xFFFF,
        "Home" => 0xFF50,
        "Left" => 0xFF51,
        "Up" => 0xFF52,
        "Right" => 0xFF53,
        "Down" => 0xFF54,
        "Prior" | "Page_Up" => 0xFF55,
        "Next" | "Page_Down" => 0xFF56,
        "End" => 0xFF57,
        "Print" => 0xFF61,
        "Insert" => 0xFF63,
        "comma" => 0x002C,
        "minus" => 0x002D,
        "period" => 0x002E,
        "slash" => 0x002F,
        "semicolon" => 0x003B,
        "equal" => 0x003D,
        "plus" => 0x002B,
        "bracketleft" => 0x005B,
        "backslash" => 0x005C,
        "bracketright" => 0x005D,
        "grave" => 0x0060,
        "apostrophe" => 0x0027,
        _ => return None,
    };

    Some(sym)
}

#[cfg(test)]
mod tests {
    use super::{clean_mask, keysym_from_name, Button, ButtonCombo, KeyCombo, ModMask};

    #[test]
    fn parse_key_binding() {
        let combo: KeyCombo = "mod4+shift+Return".parse().unwrap();
        assert_eq!(combo.mask, u16::from(ModMask::Mod4) | u16::from(ModMask::Shift));
        assert_eq!(combo.keysym, 0xFF0D_u32);

        let combo: KeyCombo = "alt+J".parse().unwrap();
        assert_eq!(combo.mask, u16::from(ModMask::Mod1));
        assert_eq!(combo.keysym, u32::from(b'j'));

        let combo: KeyCombo = "F5".parse().unwrap();
        assert_eq!((combo.mask, combo.keysym), (0_u16, 0xFFC2_u32));
    }

    #[test]
    fn reject_bad_bindings() {
        assert!("hyper+j".parse::<KeyCombo>().is_err());
        assert!("mod4+".parse::<KeyCombo>().is_err());
        assert!("mod4+nosuchkey".parse::<KeyCombo>().is_err());
        assert!("mod4+mouse9".parse::<ButtonCombo>().is_err());
    }

    #[test]
    fn parse_button_binding() {
        let combo: ButtonCombo = "mod1+mouse3".parse().unwrap();
        assert_eq!(combo.button, Button::Right);
        assert_eq!(combo.mask, u16::from(ModMask::Mod1));
    }

    #[test]
    fn locks_are_ignored() {
        let numlock = u16::from(ModMask::Mod2);
        let state = u16::from(ModMask::Mod4) | numlock | u16::from(ModMask::Lock);
        assert_eq!(clean_mask(state, numlock), u16::from(ModMask::Mod4));
        assert_eq!(keysym_from_name("F25"), None);
    }
}
