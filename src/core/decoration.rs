//! Border colors

use crate::{config::Config, error::Error};

// =========================== Colorscheme ============================
// ====================================================================

pub(crate) type Color = u32;

/// Border colors for each client state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Colorscheme {
    pub(crate) normal:  Color,
    pub(crate) focused: Color,
    pub(crate) urgent:  Color,
}

macro_rules! if_6 {
    ($c:ident) => {
        ($c.len() == 6).then(|| $c)
    };
}

/// Parse `#rrggbb`, `0xrrggbb` or `rrggbb`
pub(crate) fn to_hex(s: &str) -> Result<Color, Error> {
    let trim = s.strip_prefix("0x").map_or_else(
        || s.strip_prefix('#').map_or_else(|| if_6!(s), |c| if_6!(c)),
        |c| if_6!(c),
    );

    trim.and_then(|color| u32::from_str_radix(color, 16).ok())
        .ok_or_else(|| Error::InvalidColor(s.to_owned()))
}

impl Colorscheme {
    /// Default colorscheme (found as the default in [`Config`])
    pub(crate) const DEFAULT: Self = Self {
        normal:  0x44_4444,
        focused: 0x00_5577,
        urgent:  0xEF_1D55,
    };

    /// Create a new [`Colorscheme`]
    pub(crate) fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            normal:  to_hex(&config.global.normal_border_color)?,
            focused: to_hex(&config.global.focused_border_color)?,
            urgent:  to_hex(&config.global.urgent_border_color)?,
        })
    }
}

impl Default for Colorscheme {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::to_hex;

    #[test]
    fn parse_colors() {
        assert_eq!(to_hex("#005577").unwrap(), 0x00_5577_u32);
        assert_eq!(to_hex("0xffffff").unwrap(), 0xFF_FFFF_u32);
        assert_eq!(to_hex("444444").unwrap(), 0x44_4444_u32);
        assert!(to_hex("#fff").is_err());
        assert!(to_hex("#gggggg").is_err());
    }
}
