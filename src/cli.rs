//! The command line arguments

use crate::utils::wants_color;
use clap::{
    crate_description,
    crate_version,
    AppSettings,
    Parser,
    ValueHint,
};
use once_cell::sync::Lazy;
use std::{env, fs, path::PathBuf};

/// Options for the `tagwm` program
#[derive(Parser, Default, Clone, Debug, PartialEq)]
#[clap(
    version = crate_version!(),
    about = <String as AsRef<str>>::as_ref(&APP_ABOUT),
    after_help =  <String as AsRef<str>>::as_ref(&AFTER_HELP),
    override_usage =  <String as AsRef<str>>::as_ref(&OVERRIDE_HELP),
    max_term_width = 100,
    color = clap::ColorChoice::Auto,
    global_setting = AppSettings::DeriveDisplayOrder,
    hide_possible_values = true,
)]
pub(crate) struct Opts {
    /// Display debugging messages on various levels
    #[clap(
        long,
        short,
        global = true,
        parse(from_occurrences),
        long_help = "
        Set the verbosity level of the program. Only warnings are shown by default. `-v` \
                     adds INFO messages, `-vv` DEBUG messages and `-vvv` TRACE messages. The \
                     verbosity can also be set with the `TAGWM_LOG` environment variable"
    )]
    pub(crate) verbose: u8,

    /// Location of configuration file
    #[clap(
        long,
        short,
        takes_value = true,
        number_of_values = 1,
        value_name = "file",
        value_hint = ValueHint::FilePath,
        validator = |t| {
            fs::metadata(
                PathBuf::from(t).components()
                    .collect::<Vec<_>>()
                    .len()
                    .gt(&1_usize)
                    .then(|| PathBuf::from(t))
                    .unwrap_or_else(|| env::current_dir().unwrap_or(PathBuf::from(".")).join(PathBuf::from(t))),
            )
            .map_err(|_| "must be a valid path")
            .map(|_| ())
            .map_err(|e| e.to_string())
        },
        long_help = "\
        Specify the location of the configuration file. The default location is \
                `$XDG_CONFIG_HOME/tagwm/tagwm.yml`"
    )]
    pub(crate) config: Option<PathBuf>,

    /// Take over from a running window manager
    #[clap(
        name = "replace",
        long = "replace",
        short = 'r',
        takes_value = false,
        long_help = "\
        Replace the window manager that is currently running. The running manager is asked to \
                     give up the `WM_S<n>` selection of the screen, and tagwm waits for it to \
                     release the root window before managing any windows"
    )]
    pub(crate) replace: bool,

    /// When to colorize output
    #[clap(
        name = "color",
        long = "color",
        short = 'C',
        value_name = "when",
        possible_values = &["never", "auto", "always"],
        long_help = "\
        When to colorize the log written to the terminal. Valid values are: always, auto, \
                never. `auto` colorizes when standard error is a terminal"
    )]
    pub(crate) color_when: Option<String>,
}

// =============== Prettify Help ==================

/// Yellow ansi code
const YELLOW: &str = "\x1b[0;33m";
/// Green ansi code
const GREEN: &str = "\x1b[0;32m";
/// Bold-red ansi code
const BRED: &str = "\x1b[01;38;5;1m";
/// Reset colors
const RES: &str = "\x1b[0m";

/// Colored options used in the output of `--help`
pub(crate) static APP_ABOUT: Lazy<String> = Lazy::new(|| {
    wants_color()
        .then(|| {
            format!(
                "{}DESCRIPTION: {}{}{}",
                YELLOW,
                GREEN,
                crate_description!(),
                RES
            )
        })
        .unwrap_or_else(|| crate_description!().to_owned())
});

/// Colorized message to override the generated help message
pub(crate) static OVERRIDE_HELP: Lazy<String> = Lazy::new(|| {
    wants_color()
        .then(|| {
            format!(
                "{}tagwm{} [{}FLAGS{}/{}OPTIONS{}]",
                BRED, RES, GREEN, RES, GREEN, RES
            )
        })
        .unwrap_or_else(|| String::from("tagwm [FLAGS/OPTIONS]"))
});

/// Colorized message displayed after the help message
pub(crate) static AFTER_HELP: Lazy<String> = Lazy::new(|| {
    wants_color()
        .then(|| {
            format!(
                "See {}tagwm{} {}--help{} for longer explanations of some options.",
                BRED, RES, GREEN, RES
            )
        })
        .unwrap_or_else(|| {
            String::from("See tagwm --help for longer explanations of some options.")
        })
});

impl Opts {
    /// Whether the terminal log is colored, `None` leaves it to the terminal
    pub(crate) fn color(&self) -> Option<bool> {
        match self.color_when.as_deref() {
            Some("always") => Some(true),
            Some("never") => Some(false),
            _ if wants_color() => None,
            _ => Some(false),
        }
    }
}
