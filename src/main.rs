//! A dynamic tiling X11 window manager organized around tags

#![deny(
    clippy::all,
    clippy::complexity,
    clippy::correctness,
    clippy::perf,
    clippy::style,
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    bad_style,
    ellipsis_inclusive_range_patterns,
    ill_formed_attribute_input,
    improper_ctypes,
    keyword_idents,
    macro_use_extern_crate,
    missing_abi,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    noop_method_call,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unsafe_code,
    while_true
)]
#![allow(
    clippy::redundant_pub_crate,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::upper_case_acronyms,
    clippy::similar_names
)]
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::panic,
        clippy::unwrap_used,
        clippy::wildcard_enum_match_arm,
    )
)]

mod action;
mod cli;
mod config;
mod core;
mod error;
mod geometry;
mod layout;
mod macros;
mod manager;
mod monitor;
mod rule;
mod utils;
mod x;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::Opts,
    config::Config,
    error::Error,
    manager::WindowManager,
    x::xconnection::XConnection,
};

fn main() {
    let opts = Opts::parse();

    if let Err(e) = run(&opts) {
        if let Some(Error::OtherWmRunning) = e.downcast_ref::<Error>() {
            tagwm_info!("pass {} to take over from it", "--replace".green());
        }
        tagwm_fatal!("{:#}", e);
    }
}

/// Load the configuration, take over the display and handle events until
/// asked to quit
fn run(opts: &Opts) -> Result<()> {
    let config = match &opts.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            // Rendered by `format_serde_error`, the context chain would hide it
            tagwm_error!("{}", e.root_cause());
            return Err(e.context("invalid configuration"));
        },
    };

    let _logger = utils::initialize_logging(&config, opts)?;
    log::debug!("{}: {:#?}", "Configuration options".bright_blue(), config.global);

    let conn = XConnection::connect().context("failed to set up the connection")?;
    conn.become_wm(opts.replace, &config)?;

    let mut wm = WindowManager::new(conn, config)?;
    wm.scan().context("failed to adopt existing windows")?;
    wm.run()?;

    log::info!("quitting");
    Ok(())
}
