//! Various helper-utilities

use crate::{
    cli::Opts,
    config::{Config, PROJECT_DIRS},
    core::Pid,
};
use anyhow::{Context, Result};
use clap::crate_name;
use flexi_logger::{
    style,
    AdaptiveFormat,
    Age,
    Cleanup,
    Criterion,
    DeferredNow,
    Duplicate,
    FileSpec,
    Level,
    Logger,
    LoggerHandle,
    Naming,
    Record,
    WriteMode,
};
use nix::{
    sys::wait::{waitpid, WaitPidFlag, WaitStatus},
    unistd::Pid as NixPid,
};
use once_cell::sync::Lazy;
use serde::{de, Deserialize};
use std::{
    env,
    hash::{BuildHasherDefault, Hasher},
    io::{self, Write},
    panic,
    path::PathBuf,
    process::{Command, Stdio},
};
use which::which;

/// The user's shell, used to run `spawn` commands
pub(crate) static SHELL: Lazy<PathBuf> = Lazy::new(|| {
    env::var("SHELL")
        .ok()
        .and_then(|sh| which(sh).ok())
        .or_else(|| which("sh").ok())
        .unwrap_or_else(|| PathBuf::from("/bin/sh"))
});

/// Used as a custom inner state/hasher for any `Hash` item in the [`std`]
#[derive(Default)]
pub(crate) struct IdHasher {
    /// Current state of the hasher
    state: u64,
}

impl Hasher for IdHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.rotate_left(8).wrapping_add(u64::from(byte));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

/// Type alias to build a `Hash` using [`IdHasher`]
pub(crate) type BuildIdHasher = BuildHasherDefault<IdHasher>;

/// Shorter way of testing if the user wants color for the output of `--help`
pub(crate) fn wants_color() -> bool {
    env::var_os("NO_COLOR").is_none()
}

/// Initializes logging for this crate
pub(crate) fn initialize_logging(config: &Config, args: &Opts) -> Result<LoggerHandle> {
    /// Customize the format of the log (colored)
    fn colored_format(
        w: &mut dyn Write,
        _now: &mut DeferredNow,
        record: &Record,
    ) -> Result<(), io::Error> {
        let level = record.level();
        write!(
            w,
            "{:<5} [{}:{}]: {}",
            style(level, level),
            style(Level::Trace, record.file().unwrap_or("<unnamed>")),
            record.line().unwrap_or(0),
            &record.args()
        )
    }

    /// Customize the format of the log (uncolored)
    fn uncolored_format(
        w: &mut dyn Write,
        now: &mut DeferredNow,
        record: &Record,
    ) -> Result<(), io::Error> {
        // Messages may carry escapes from `colored`, they do not belong in a file
        write!(
            w,
            "[{:>}] {:<5} [{}:{}]: {}",
            now.now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.file().unwrap_or("<unnamed>"),
            record.line().unwrap_or(0),
            String::from_utf8(strip_ansi_escapes::strip(
                &record.args().to_string().as_bytes()
            )?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        )
    }

    if cfg!(debug_assertions) {
        better_panic::install();
        panic::set_hook(Box::new(|panic_info| {
            better_panic::Settings::auto().create_panic_handler()(panic_info);
        }));
    }

    let log_dir = config
        .global
        .log_dir
        .clone()
        .unwrap_or_else(|| PROJECT_DIRS.data_dir().to_path_buf());

    let mut logger = Logger::try_with_str(env::var("TAGWM_LOG").unwrap_or_else(|_| {
        String::from(match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    }))
    .context("invalid log specification")?
    .write_mode(WriteMode::BufferAndFlush)
    .set_palette(String::from("9;11;14;5;13"));

    logger = match args.color() {
        Some(true) => logger.format_for_stderr(colored_format),
        Some(false) => logger.format_for_stderr(uncolored_format),
        None => logger
            .adaptive_format_for_stderr(AdaptiveFormat::Custom(uncolored_format, colored_format)),
    };

    if config.global.log_to_file {
        logger = logger
            .duplicate_to_stderr(Duplicate::All)
            .rotate(
                Criterion::AgeOrSize(Age::Day, 50_000_000),
                Naming::Numbers,
                Cleanup::KeepLogFiles(2),
            )
            .log_to_file(
                FileSpec::default()
                    .basename(crate_name!())
                    .directory(&log_dir),
            )
            .format_for_files(uncolored_format);
    }

    logger.start().context("failed to start the logger")
}

/// [`Deserialize`] a path that may contain `~` or environment variables
#[allow(single_use_lifetimes)]
pub(crate) fn deserialize_shellexpand<'de, D>(d: D) -> Result<Option<PathBuf>, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value = PathBuf::deserialize(d)?;

    let value = PathBuf::from(
        shellexpand::full(&value.to_string_lossy())
            .map_err(|e| {
                de::Error::invalid_value(
                    de::Unexpected::Str(value.to_string_lossy().as_ref()),
                    &e.to_string().as_str(),
                )
            })?
            .to_string(),
    );

    Ok(Some(value))
}

// ============================= Processes ============================
// ====================================================================

/// Parent of the process `pid`, as reported by `/proc`
pub(crate) fn parent_pid(pid: Pid) -> Option<Pid> {
    psutil::process::Process::new(pid)
        .ok()
        .and_then(|p| p.ppid().ok().flatten())
}

/// Whether `ancestor` is found walking up the parents of `pid`
pub(crate) fn is_descendant(
    ancestor: Pid,
    mut pid: Pid,
    parent_of: &dyn Fn(Pid) -> Option<Pid>,
) -> bool {
    while pid != ancestor && pid > 1 {
        match parent_of(pid) {
            Some(parent) if parent != pid => pid = parent,
            _ => return false,
        }
    }

    pid == ancestor
}

/// Run `cmd` through the user's shell without waiting for it
pub(crate) fn spawn(cmd: &str) {
    log::info!("spawning: {}", cmd);
    if let Err(e) = Command::new(&*SHELL)
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .spawn()
    {
        log::error!("failed to spawn `{}`: {}", cmd, e);
    }
}

/// Collect every child that has exited so none linger as zombies
pub(crate) fn reap_children() {
    loop {
        match waitpid(NixPid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(_) => break,
            Ok(status) => log::trace!("reaped child: {:?}", status),
        }
    }
}
