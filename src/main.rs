use anyhow::Context;
use log::{debug, info};
use openrouter_key_status::cli::{self, CliOptions};
use openrouter_key_status::config::Config;
use openrouter_key_status::types::KeyStatus;
use openrouter_key_status::{http, output};
use std::io;

#[tokio::main(flavor = "current_thread")] // one request, nothing to run in parallel
async fn main() -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches();
    let opts = CliOptions::from_matches(&matches);

    cli::init_logging(opts.log_level.as_deref());

    if opts.version {
        println!("openrouter-key-status {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = Config::from_env(&opts.overrides)?;
    debug!(
        "api_url={} timeout={}s retries={}",
        cfg.api_url, cfg.timeout_secs, cfg.max_retries
    );
    let client = http::build_client(&cfg)?;
    let resp = http::fetch_key_status(&client, &cfg).await.map_err(|e| {
        let code = e.code();
        anyhow::Error::new(e).context(format!("key status lookup failed [{}]", code))
    })?;
    info!("Key status fetched (status {})", resp.status);

    let mut stdout = io::stdout().lock();
    if opts.summary {
        let status: KeyStatus = serde_json::from_value(resp.value)
            .context("response does not look like a key-status body")?;
        output::write_summary(&mut stdout, &status)?;
    } else {
        output::write_json(&mut stdout, &resp.value)?;
    }
    Ok(())
}
