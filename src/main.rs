use anyhow::Context;
use clap::Parser;
use mc_probe::{run_probe, Edition, ProbeConfig, Strategy};
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mc-probe")]
#[command(about = "Check whether a Minecraft server is reachable and how fast it answers.")]
struct Cli {
    /// Server to probe, as `host:port` or `host port`
    #[arg(required = true, num_args = 1..)]
    target: Vec<String>,

    /// JSON file with probe settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probing strategy: tcp, native-udp or http
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Give up after this many milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Status API edition for the http strategy: java or bedrock
    #[arg(long)]
    edition: Option<Edition>,

    /// Base URL of the status API for the http strategy
    #[arg(long)]
    api_url: Option<String>,

    /// Follow the TCP connect with one Server List Ping round trip
    #[arg(long)]
    echo: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn probe_config(&self) -> anyhow::Result<ProbeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                serde_json::from_str::<ProbeConfig>(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => ProbeConfig::default(),
        };

        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(edition) = self.edition {
            config.status_api.edition = edition;
        }
        if let Some(url) = &self.api_url {
            config.status_api.base_url.clone_from(url);
        }
        if self.echo {
            config.tcp_echo = true;
        }

        Ok(config)
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    let config = cli.probe_config()?;
    let target = cli.target.join(" ");

    match run_probe(&target, &config).await {
        Ok(outcome) if cli.json => {
            let json = serde_json::to_string_pretty(&outcome).context("cannot serialize result")?;
            println!("{json}");
        }
        Ok(outcome) => {
            println!("Server `{}`: {outcome}", target.trim());
            println!("-- {} probe", config.strategy);
        }
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use mc_probe::Strategy;
    use std::time::Duration;

    #[test]
    fn test_missing_config_file_has_context() {
        let cli = Cli::try_parse_from(["mc-probe", "--config", "/nonexistent/mc-probe.json", "host:1"])
            .unwrap();

        let err = cli.probe_config().unwrap_err();
        assert_eq!(err.to_string(), "cannot read /nonexistent/mc-probe.json");
        assert!(err.chain().count() >= 2);
    }

    #[test]
    fn test_invalid_config_file_has_context() {
        let path = std::env::temp_dir().join(format!("mc-probe-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{not json").unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["mc-probe", "--config", path_arg.as_str(), "host:1"]).unwrap();
        let err = cli.probe_config().unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(err.to_string().starts_with("invalid config "));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "mc-probe", "--strategy", "tcp", "--timeout-ms", "750", "--echo", "play.example.com", "25565",
        ])
        .unwrap();

        let config = cli.probe_config().unwrap();
        assert_eq!(config.strategy, Strategy::Tcp);
        assert_eq!(config.timeout, Duration::from_millis(750));
        assert!(config.tcp_echo);
        assert_eq!(cli.target, ["play.example.com", "25565"]);
    }
}
