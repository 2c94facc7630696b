//! Tests for config overrides from flags.

use super::parse;
use clap::Parser;
use clipfetch_core::config::ClipfetchConfig;
use std::path::{Path, PathBuf};

#[test]
fn cli_parse_flags() {
    let cli = parse(&[
        "clipfetch",
        "download",
        "--input",
        "streamer_clips.json",
        "--channel",
        "streamer",
        "--min-views",
        "1000",
        "--days-back",
        "7",
        "-c",
        "4",
        "-o",
        "out.json",
        "--download-dir",
        "/tmp/clips",
    ]);
    let o = &cli.overrides;
    assert_eq!(o.input.as_deref(), Some(Path::new("streamer_clips.json")));
    assert_eq!(o.channel.as_deref(), Some("streamer"));
    assert_eq!(o.min_views, Some(1000));
    assert_eq!(o.days_back, Some(7));
    assert_eq!(o.concurrency, Some(4));
    assert_eq!(o.output.as_deref(), Some(Path::new("out.json")));
    assert_eq!(o.download_dir.as_deref(), Some(Path::new("/tmp/clips")));
}

#[test]
fn overrides_replace_config_values() {
    let cli = parse(&[
        "clipfetch",
        "--channel",
        "streamer",
        "--concurrency",
        "3",
        "--download-dir",
        "dl",
    ]);
    let mut cfg = ClipfetchConfig::default();
    cli.overrides.apply(&mut cfg);
    assert_eq!(cfg.twitch.channel, "streamer");
    assert_eq!(cfg.concurrency, 3);
    assert_eq!(cfg.downloader.download_dir, PathBuf::from("dl"));
    assert_eq!(cfg.twitch.min_views, 250);
    assert!(cfg.output_file.is_none());
}

#[test]
fn no_flags_leave_config_untouched() {
    let cli = parse(&["clipfetch"]);
    let mut cfg = ClipfetchConfig::default();
    cfg.twitch.channel = "from_file".to_string();
    cli.overrides.apply(&mut cfg);
    assert_eq!(cfg.twitch.channel, "from_file");
    assert_eq!(cfg.concurrency, 10);
}

#[test]
fn invalid_number_is_rejected() {
    assert!(crate::cli::Cli::try_parse_from(["clipfetch", "--min-views", "lots"]).is_err());
}
