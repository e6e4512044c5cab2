//! Configuration options

use crate::{
    action::{Action, TagArg},
    layout::LayoutKind,
    monitor::pertag::{Area, SplitDir, TagSlot},
    rule::{Rule, RuleMerge},
    utils::deserialize_shellexpand,
    x::input::{ButtonCombo, KeyCombo},
};
use anyhow::{Context, Result};
use colored::Colorize;
use directories::BaseDirs;
use format_serde_error::SerdeError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

/// Configuration file name
const CONFIG_FILE: &str = "tagwm.yml";

/// Most tags a [`TagMask`](crate::core::TagMask) can address while leaving
/// room for the all-tags sentinel
pub(crate) const MAX_TAGS: usize = 31;

// ============================= Policies =============================
// ====================================================================

/// What zooming does to the master area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ZoomPolicy {
    /// Move the selection to the front, everything else moves back a slot
    Push,
    /// Exchange the selection with the master, remembering the old master
    Swap,
}

/// Where windows without a requested position appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Placement {
    /// Centered on their monitor
    Centered,
    /// Centered on the pointer
    UnderMouse,
}

// ========================== GlobalSettings ==========================
// ====================================================================

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GlobalSettings {
    /// Whether logs should be written to a file
    #[serde(alias = "log-to-file")]
    pub(crate) log_to_file: bool,

    /// The directory to write the log to
    #[serde(alias = "log-dir", deserialize_with = "deserialize_shellexpand")]
    pub(crate) log_dir: Option<PathBuf>,

    // ====================== Window Manager Specific ======================
    /// Names of the tags
    pub(crate) tags: Vec<String>,

    /// Size of the border around the window
    #[serde(alias = "border-width")]
    pub(crate) border_width: u32,

    /// Gap between tiled windows and around the edges
    #[serde(alias = "window-gap")]
    pub(crate) window_gap: u32,

    /// Distance in pixels at which dragged windows snap to the monitor edges
    pub(crate) snap: u32,

    /// Opacity of unfocused windows
    pub(crate) shade: f64,

    /// Height reserved for a status bar
    #[serde(alias = "bar-height")]
    pub(crate) bar_height: u32,

    #[serde(alias = "show-bar")]
    pub(crate) show_bar: bool,

    /// Reserve the bar at the top instead of the bottom
    #[serde(alias = "top-bar")]
    pub(crate) top_bar: bool,

    /// Color of the border of an unfocused window
    #[serde(alias = "normal-border-color")]
    pub(crate) normal_border_color: String,

    /// Color of the border of the focused window
    #[serde(alias = "focused-border-color")]
    pub(crate) focused_border_color: String,

    /// Color of the border of a window asking for attention
    #[serde(alias = "urgent-border-color")]
    pub(crate) urgent_border_color: String,

    /// Clients in the master area
    #[serde(alias = "master-count")]
    pub(crate) master_count: u32,

    /// Columns of the stack area
    #[serde(alias = "stack-columns")]
    pub(crate) stack_columns: u32,

    /// Primary split, master area, stack area
    #[serde(alias = "split-directions")]
    pub(crate) split_directions: [SplitDir; 3],

    /// Weight of the first occupant in each area
    #[serde(alias = "split-factors")]
    pub(crate) split_factors: [f32; 3],

    /// Layouts to cycle through. The first two form the initial pair
    pub(crate) layouts: Vec<LayoutKind>,

    /// Respect size hints of tiled clients too
    #[serde(alias = "honor-size-hints")]
    pub(crate) honor_size_hints: bool,

    /// Keep the focus on a fullscreen window
    #[serde(alias = "lock-fullscreen")]
    pub(crate) lock_fullscreen: bool,

    /// New clients go to the end of the list instead of the master area
    #[serde(alias = "attach-bottom")]
    pub(crate) attach_bottom: bool,

    #[serde(alias = "zoom-policy")]
    pub(crate) zoom_policy: ZoomPolicy,

    pub(crate) placement: Placement,

    /// Clicking a client raises it
    #[serde(alias = "raise-on-click")]
    pub(crate) raise_on_click: bool,

    /// The pointer leaving every client drops the focus
    #[serde(alias = "lose-focus")]
    pub(crate) lose_focus: bool,

    /// Focus the window under the pointer
    #[serde(alias = "focus-follows-mouse")]
    pub(crate) focus_follows_mouse: bool,

    /// Motion updates per second while dragging
    #[serde(alias = "motion-rate")]
    pub(crate) motion_rate: u32,

    /// Terminals hide behind the windows they start
    pub(crate) swallow: bool,

    /// How later matching rules treat fields they do not mention
    #[serde(alias = "rule-merge")]
    pub(crate) rule_merge: RuleMerge,
}

impl GlobalSettings {
    /// Number of usable tags
    pub(crate) fn tag_count(&self) -> usize {
        self.tags.len().clamp(1, MAX_TAGS)
    }

    /// Parameters every tag starts out with
    pub(crate) fn tag_slot(&self) -> TagSlot {
        let layout = |idx: usize, fallback: LayoutKind| {
            self.layouts.get(idx).copied().unwrap_or(fallback)
        };
        let area = |idx: usize| Area {
            dir:  self.split_directions[idx],
            fact: self.split_factors[idx],
        };

        TagSlot {
            master_count:  self.master_count,
            stack_columns: self.stack_columns.max(1),
            areas:         [area(0), area(1), area(2)],
            layouts:       [layout(0, LayoutKind::Tile), layout(1, LayoutKind::Floating)],
            sellt:         0,
            show_bar:      self.show_bar,
            prev_zoom:     None,
        }
    }

    /// Minimum time between two handled motion events while dragging
    pub(crate) fn motion_interval(&self) -> u32 {
        1000 / self.motion_rate.max(1)
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_dir:     None,

            tags:                 (1..=9).map(|t| t.to_string()).collect(),
            border_width:         1_u32,
            window_gap:           6_u32,
            snap:                 32_u32,
            shade:                0.6_f64,
            bar_height:           18_u32,
            show_bar:             true,
            top_bar:              true,
            normal_border_color:  String::from("#444444"),
            focused_border_color: String::from("#005577"),
            urgent_border_color:  String::from("#EF1D55"),

            master_count:     1_u32,
            stack_columns:    1_u32,
            split_directions: [SplitDir::Horizontal, SplitDir::Vertical, SplitDir::Vertical],
            split_factors:    [1.1_f32; 3],
            layouts:          vec![
                LayoutKind::Tile,
                LayoutKind::Monocle,
                LayoutKind::Grid,
                LayoutKind::Tatami,
                LayoutKind::Floating,
            ],

            honor_size_hints:    false,
            lock_fullscreen:     true,
            attach_bottom:       false,
            zoom_policy:         ZoomPolicy::Push,
            placement:           Placement::Centered,
            raise_on_click:      true,
            lose_focus:          false,
            focus_follows_mouse: true,
            motion_rate:         60_u32,
            swallow:             true,
            rule_merge:          RuleMerge::Overwrite,
        }
    }
}

// =========================== TagBindings ============================
// ====================================================================

/// Modifier prefixes that generate one binding per tag key, `1` to `9`, plus
/// `0` for every tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TagBindings {
    pub(crate) view:        Option<String>,
    #[serde(alias = "toggle-view")]
    pub(crate) toggle_view: Option<String>,
    pub(crate) tag:         Option<String>,
    #[serde(alias = "toggle-tag")]
    pub(crate) toggle_tag:  Option<String>,
}

impl Default for TagBindings {
    fn default() -> Self {
        Self {
            view:        Some(String::from("mod4")),
            toggle_view: Some(String::from("mod4+ctrl")),
            tag:         Some(String::from("mod4+shift")),
            toggle_tag:  Some(String::from("mod4+ctrl+shift")),
        }
    }
}

impl TagBindings {
    /// Expand into `(binding, action)` pairs for `tag_count` tags
    pub(crate) fn expand(&self, tag_count: usize) -> Vec<(String, Action)> {
        let prefixes: [(&Option<String>, fn(TagArg) -> Action); 4] = [
            (&self.view, Action::View),
            (&self.toggle_view, Action::ToggleView),
            (&self.tag, Action::Tag),
            (&self.toggle_tag, Action::ToggleTag),
        ];

        let keys = (1..=tag_count.min(9) as u8).chain(std::iter::once(0));
        keys.flat_map(|key| {
            prefixes.iter().filter_map(move |&(prefix, action)| {
                prefix
                    .as_ref()
                    .map(|p| (format!("{}+{}", p, key), action(TagArg::Index(key))))
            })
        })
        .collect()
    }
}

// ============================== Config ==============================
// ====================================================================

/// Configuration file to parse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Global settings
    #[serde(flatten)]
    pub(crate) global: GlobalSettings,

    /// Initial attributes of new windows
    #[serde(default)]
    pub(crate) rules: Vec<Rule>,

    /// The mappings of keys to actions
    #[serde(default)]
    pub(crate) bindings: IndexMap<String, Action>,

    /// The mappings of buttons on client windows to actions
    #[serde(default, alias = "mouse-bindings")]
    pub(crate) mouse_bindings: IndexMap<String, Action>,

    #[serde(default, alias = "tag-bindings")]
    pub(crate) tag_bindings: TagBindings,
}

impl Config {
    /// Create the default configuration file
    pub(crate) fn create_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("creating configuration path: {}", path.display());
            fs::create_dir_all(path).context("unable to create configuration directory")?;
        }

        let path = path.join(CONFIG_FILE);
        log::debug!("{}: {}", "configuration path".bright_blue(), path.display());

        if !path.is_file() {
            let initialization = include_str!("../config/tagwm.yml");

            let mut config_file: fs::File = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .open(&path)
                .with_context(|| format!("could not create tagwm config: '{}'", path.display()))?;

            config_file
                .write_all(initialization.as_bytes())
                .with_context(|| format!("could not create tagwm config: '{}'", path.display()))?;
            config_file.flush()?;
        }

        Self::load(path)
    }

    /// Load the configuration file from a given path
    pub(crate) fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;

        Self::parse(file)
    }

    /// Parse the contents of a configuration file
    pub(crate) fn parse(file: String) -> Result<Self> {
        let res = serde_yaml::from_str(&file).map_err(|e| SerdeError::new(file, e))?;
        Ok(res)
    }

    /// Load the default configuration file
    pub(crate) fn load_default() -> Result<Self> {
        let path = PROJECT_DIRS.config_dir();
        log::debug!("loading default config: {}", path.display());
        Self::create_default(path)
    }

    /// Every key binding, tag bindings first so explicit ones override them
    pub(crate) fn key_bindings(&self) -> Result<Vec<(KeyCombo, Action)>> {
        self.tag_bindings
            .expand(self.global.tag_count())
            .into_iter()
            .chain(self.bindings.iter().map(|(k, a)| (k.clone(), a.clone())))
            .map(|(key, action)| {
                let combo = key
                    .parse::<KeyCombo>()
                    .with_context(|| format!("invalid key binding for {:?}", action))?;
                Ok((combo, action))
            })
            .collect()
    }

    /// Every button binding on client windows
    pub(crate) fn button_bindings(&self) -> Result<Vec<(ButtonCombo, Action)>> {
        self.mouse_bindings
            .iter()
            .map(|(button, action)| {
                let combo = button
                    .parse::<ButtonCombo>()
                    .with_context(|| format!("invalid mouse binding for {:?}", action))?;
                Ok((combo, action.clone()))
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global:         GlobalSettings::default(),
            rules:          vec![],
            bindings:       IndexMap::new(),
            mouse_bindings: IndexMap::new(),
            tag_bindings:   TagBindings::default(),
        }
    }
}

// =========================== Project Dirs ===========================
// ====================================================================

/// Get the base [`TagwmDirs`]
pub(crate) static PROJECT_DIRS: Lazy<TagwmDirs> = Lazy::new(TagwmDirs::new);

/// Get the project directories relevant to `tagwm`
#[derive(Debug, Clone)]
pub(crate) struct TagwmDirs {
    /// User's `$XDG_CONFIG_HOME/tagwm` directory
    config_dir: PathBuf,
    /// User's `$XDG_DATA_HOME/tagwm` directory
    data_dir:   PathBuf,
}

impl TagwmDirs {
    /// Create a new [`TagwmDirs`]
    fn new() -> Self {
        Self {
            config_dir: Self::get_dir("TAGWM_CONFIG_DIR", "XDG_CONFIG_HOME", ".config"),
            data_dir:   Self::get_dir("TAGWM_DATA_DIR", "XDG_DATA_HOME", ".local/share"),
        }
    }

    /// An absolute override in `env_var`, else `$var/tagwm`, else
    /// `$HOME/join/tagwm`. Without a home directory the temporary directory
    /// is used
    fn get_dir(env_var: &str, var: &str, join: &str) -> PathBuf {
        env::var_os(env_var)
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| {
                env::var_os(var)
                    .map(PathBuf::from)
                    .filter(|p| p.is_absolute())
                    .or_else(|| BaseDirs::new().map(|p| p.home_dir().join(join)))
                    .map(|p| p.join(env!("CARGO_PKG_NAME")))
            })
            .unwrap_or_else(|| env::temp_dir().join(env!("CARGO_PKG_NAME")))
    }

    /// Get configuration directory
    #[must_use]
    pub(crate) fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get local data directory
    #[must_use]
    pub(crate) fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Placement, TagBindings, ZoomPolicy};
    use crate::{
        action::{Action, StackPos, TagArg},
        layout::LayoutKind,
        monitor::pertag::SplitDir,
        rule::RuleMerge,
        x::input::ModMask,
    };

    #[test]
    fn bundled_config_parses() {
        let config = Config::parse(include_str!("../config/tagwm.yml").to_owned()).unwrap();
        assert_eq!(config.global.tag_count(), 9);
        assert!(!config.bindings.is_empty());
        assert!(config.key_bindings().is_ok());
        assert!(config.button_bindings().is_ok());
    }

    #[test]
    fn kebab_aliases_and_defaults() {
        let config = Config::parse(String::from(
            r#"
tags: [web, code, chat]
window-gap: 0
zoom-policy: swap
placement: under-mouse
rule-merge: preserve
split-directions: [vertical, horizontal, horizontal]
layouts: [monocle]
rules:
  - class: Firefox
    tags: 2
bindings:
  mod4+j: { focus-stack: { relative: 1 } }
"#,
        ))
        .unwrap();

        let global = &config.global;
        assert_eq!(global.tag_count(), 3);
        assert_eq!(global.window_gap, 0_u32);
        assert_eq!(global.border_width, 1_u32);
        assert_eq!(global.zoom_policy, ZoomPolicy::Swap);
        assert_eq!(global.placement, Placement::UnderMouse);
        assert_eq!(global.rule_merge, RuleMerge::Preserve);
        assert_eq!(config.rules[0].tags, Some(2));

        let slot = global.tag_slot();
        assert_eq!(slot.layouts, [LayoutKind::Monocle, LayoutKind::Floating]);
        assert_eq!(slot.areas[0].dir, SplitDir::Vertical);
        assert_eq!(global.motion_interval(), 16_u32);
    }

    #[test]
    fn tag_bindings_cover_every_tag() {
        let bindings = TagBindings::default().expand(3);
        // three tags plus `0`, four actions each
        assert_eq!(bindings.len(), 16);
        assert!(bindings.contains(&(String::from("mod4+2"), Action::View(TagArg::Index(2)))));
        assert!(bindings.contains(&(
            String::from("mod4+ctrl+shift+0"),
            Action::ToggleTag(TagArg::Index(0))
        )));
    }

    #[test]
    fn explicit_bindings_come_last() {
        let mut config = Config::default();
        config
            .bindings
            .insert(String::from("mod4+1"), Action::FocusStack(StackPos::Index(0)));

        let keys = config.key_bindings().unwrap();
        let (combo, action) = keys.last().unwrap();
        assert_eq!(combo.mask, u16::from(ModMask::Mod4));
        assert_eq!(combo.keysym, u32::from(b'1'));
        assert_eq!(action, &Action::FocusStack(StackPos::Index(0)));
    }

    #[test]
    fn invalid_binding_is_reported() {
        let mut config = Config::default();
        config.bindings.insert(String::from("hyper+x"), Action::Quit);
        assert!(config.key_bindings().is_err());
    }
}
