#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Supports environment variable overrides via the `AUTOSTACK_DEMO_*`
//! prefix; explicit flags win.

use std::env;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Autostack Demo - boxes that stack themselves by measured height

USAGE:
    autostack-demo [OPTIONS]

OPTIONS:
    --json               Print one JSON snapshot per action
    --viewport=WxH       Initial viewport (default: 800x600)
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    AUTOSTACK_DEMO_VIEWPORT   Override the default viewport
    AUTOSTACK_CONTAINER       Container to mount into (default: container)
    AUTOSTACK_SETTLE_BUDGET   Steps allowed per settle (default: 64)
    AUTOSTACK_LOG             Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Emit JSON lines instead of a table.
    pub json: bool,
    /// Initial viewport `(width, height)`.
    pub viewport: (f64, f64),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            json: false,
            viewport: (800.0, 600.0),
        }
    }
}

/// Parse `WxH` into a positive, finite viewport.
pub fn parse_viewport(raw: &str) -> Option<(f64, f64)> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    let width: f64 = w.trim().parse().ok()?;
    let height: f64 = h.trim().parse().ok()?;
    let valid = |v: f64| v.is_finite() && v > 0.0;
    (valid(width) && valid(height)).then_some((width, height))
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    pub fn parse() -> Self {
        let mut opts = Self::default();

        if let Ok(val) = env::var("AUTOSTACK_DEMO_VIEWPORT")
            && let Some(viewport) = parse_viewport(&val)
        {
            opts.viewport = viewport;
        }

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--help" | "-h" => {
                    println!("{HELP_TEXT}");
                    process::exit(0);
                }
                "--version" | "-V" => {
                    println!("autostack-demo {VERSION}");
                    process::exit(0);
                }
                "--json" => opts.json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--viewport=") {
                        match parse_viewport(val) {
                            Some(viewport) => opts.viewport = viewport,
                            None => {
                                eprintln!("Invalid --viewport value: {val}");
                                process::exit(1);
                            }
                        }
                    } else {
                        eprintln!("Unknown argument: {other}");
                        eprintln!("Run with --help for usage information.");
                        process::exit(1);
                    }
                }
            }
        }

        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert!(!opts.json);
        assert_eq!(opts.viewport, (800.0, 600.0));
    }

    #[test]
    fn viewport_parsing() {
        assert_eq!(parse_viewport("1024x768"), Some((1024.0, 768.0)));
        assert_eq!(parse_viewport(" 320 X 480 "), Some((320.0, 480.0)));
        assert_eq!(parse_viewport("1024"), None);
        assert_eq!(parse_viewport("0x600"), None);
        assert_eq!(parse_viewport("-5x600"), None);
        assert_eq!(parse_viewport("widexhigh"), None);
    }

    #[test]
    fn help_text_lists_env_vars() {
        assert!(HELP_TEXT.contains("AUTOSTACK_LOG"));
        assert!(HELP_TEXT.contains("AUTOSTACK_DEMO_VIEWPORT"));
        assert!(!VERSION.is_empty());
    }
}
