use crate::config::Overrides;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

pub struct CliOptions {
    pub log_level: Option<String>,
    pub version: bool,
    pub summary: bool,
    pub overrides: Overrides,
}

pub fn build_cli() -> Command {
    Command::new("openrouter-key-status")
        .about("Print OpenRouter API key usage and limits as JSON")
        .arg(
            Arg::new("token")
                .long("token")
                .num_args(1)
                .help("API key to inspect (default: $OPENROUTER_API_KEY)"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .num_args(1)
                .help("API base URL (default: https://openrouter.ai/api/v1)"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .num_args(1)
                .value_parser(value_parser!(u32))
                .help("Retry transient failures (network, 429, 5xx) up to N times"),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .help("Print a short human-readable summary instead of JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            log_level: matches.get_one::<String>("log-level").cloned(),
            version: matches.get_flag("version"),
            summary: matches.get_flag("summary"),
            overrides: Overrides {
                token: matches.get_one::<String>("token").cloned(),
                api_url: matches.get_one::<String>("api-url").cloned(),
                timeout_secs: matches.get_one::<u64>("timeout-secs").copied(),
                max_retries: matches.get_one::<u32>("retries").copied(),
            },
        }
    }
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins, then RUST_LOG, then info. Logs go to stderr.
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}
