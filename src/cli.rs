use crate::{Error, Result};

/// Options for the `run` command; values are `None` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub device: Option<String>,
    pub baud: Option<u32>,
    pub layout: Option<String>,
    pub brightness: Option<u8>,
    pub interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    /// Render one frame to the panel and exit.
    pub test_render: bool,
    /// Cycle solid color fills instead of the dashboard.
    pub demo: bool,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Ok(Command::Run(RunOptions::default()));
        }

        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            Some("run") => Ok(Command::Run(parse_run_options(&mut iter)?)),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // Allow omitting the explicit `run` subcommand: pass the consumed flag plus the
                // remaining args into the run parser.
                let flags: Vec<String> = std::iter::once(flag.to_string())
                    .chain(iter.map(|s| s.to_string()))
                    .collect();
                let mut iter = flags.iter();
                Ok(Command::Run(parse_run_options(&mut iter)?))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
            None => Ok(Command::Run(RunOptions::default())),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "turingmon - system monitor daemon for Turing Smart Screen panels\n",
            "\n",
            "USAGE:\n",
            "  turingmon run [OPTIONS]\n",
            "  turingmon --help\n",
            "  turingmon --version\n",
            "\n",
            "OPTIONS:\n",
            "  --device <path>       Serial device path, or 'auto' to scan (default: auto)\n",
            "  --baud <number>       Baud rate (default: 115200)\n",
            "  --layout <path>       Dashboard layout JSON (default: built-in layout)\n",
            "  --brightness <0-100>  Backlight level (default: 50)\n",
            "  --interval-ms <ms>    Update cycle interval (default: 1000)\n",
            "  --log-level <level>   error|warn|info|debug|trace (default: info)\n",
            "  --log-file <path>     Also append log lines to this file\n",
            "  --test-render         Render a single frame and exit\n",
            "  --demo                Cycle solid color fills (panel smoke test)\n",
            "  -h, --help            Show this help\n",
            "  -V, --version         Show version\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--device" => {
                opts.device = Some(take_value(flag, iter)?);
            }
            "--baud" => {
                let raw = take_value(flag, iter)?;
                opts.baud = Some(raw.parse().map_err(|_| {
                    Error::InvalidArgs("baud must be a positive integer".to_string())
                })?);
            }
            "--layout" => {
                opts.layout = Some(take_value(flag, iter)?);
            }
            "--brightness" => {
                let raw = take_value(flag, iter)?;
                let level: u8 = raw.parse().map_err(|_| {
                    Error::InvalidArgs("brightness must be within 0..=100".to_string())
                })?;
                if level > 100 {
                    return Err(Error::InvalidArgs(
                        "brightness must be within 0..=100".to_string(),
                    ));
                }
                opts.brightness = Some(level);
            }
            "--interval-ms" => {
                let raw = take_value(flag, iter)?;
                opts.interval_ms = Some(raw.parse().map_err(|_| {
                    Error::InvalidArgs("interval-ms must be a positive integer".to_string())
                })?);
            }
            "--log-level" => {
                opts.log_level = Some(take_value(flag, iter)?);
            }
            "--log-file" => {
                opts.log_file = Some(take_value(flag, iter)?);
            }
            "--test-render" => {
                opts.test_render = true;
            }
            "--demo" => {
                opts.demo = true;
            }
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}
