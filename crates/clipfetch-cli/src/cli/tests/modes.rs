//! Tests for mode selection and --history.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use clipfetch_core::pipeline::RunMode;

#[test]
fn cli_parse_default_mode_is_urls() {
    assert_eq!(parse(&["clipfetch"]).command(), CliCommand::Run(RunMode::Urls));
}

#[test]
fn cli_parse_modes() {
    assert_eq!(
        parse(&["clipfetch", "urls"]).command(),
        CliCommand::Run(RunMode::Urls)
    );
    assert_eq!(
        parse(&["clipfetch", "download"]).command(),
        CliCommand::Run(RunMode::Download)
    );
    assert_eq!(
        parse(&["clipfetch", "clips"]).command(),
        CliCommand::Run(RunMode::Clips)
    );
}

#[test]
fn cli_parse_unknown_mode_fails() {
    assert!(Cli::try_parse_from(["clipfetch", "transcode"]).is_err());
}

#[test]
fn cli_parse_history() {
    assert_eq!(
        parse(&["clipfetch", "--history"]).command(),
        CliCommand::History { limit: 10 }
    );
    assert_eq!(
        parse(&["clipfetch", "--history", "--limit", "3"]).command(),
        CliCommand::History { limit: 3 }
    );
}

#[test]
fn cli_parse_limit_requires_history() {
    assert!(Cli::try_parse_from(["clipfetch", "--limit", "3"]).is_err());
}
