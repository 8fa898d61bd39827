use std::path::PathBuf;

use clap::Parser;

/// Watch an authenticated web page and alert when its content changes.
///
/// Session cookies exported from a logged-in browser are replayed on every
/// check. The page's main content region is fingerprinted and compared with
/// the previous check.
#[derive(Parser, Debug)]
#[command(name = "pagemon", version, about)]
pub struct Args {
    /// Config file path (default: ./pagemon.toml, then the user config dir)
    #[arg(short, long, env = "PAGEMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Page to monitor (overrides config)
    #[arg(short, long, env = "PAGEMON_URL")]
    pub url: Option<String>,

    /// Cookie export file (overrides config)
    #[arg(long, env = "PAGEMON_COOKIES")]
    pub cookies: Option<PathBuf>,

    /// Seconds between checks (overrides config)
    #[arg(short, long, env = "PAGEMON_INTERVAL")]
    pub interval: Option<u64>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "PAGEMON_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Region markers in priority order, e.g. "div[role=main]" (overrides config)
    #[arg(long = "marker", value_name = "MARKER")]
    pub markers: Vec<String>,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "pagemon",
            "--url",
            "https://example.org/page",
            "--interval",
            "30",
            "--marker",
            "div[role=main]",
            "--marker",
            "table.generaltable",
            "--once",
        ])
        .unwrap();

        assert_eq!(args.url.as_deref(), Some("https://example.org/page"));
        assert_eq!(args.interval, Some(30));
        assert_eq!(args.markers, vec!["div[role=main]", "table.generaltable"]);
        assert!(args.once);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["pagemon", "-v", "-q"]).is_err());
    }
}
