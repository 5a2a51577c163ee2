mod provider_commands;
mod save_commands;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    clawsetup_config::{SetupConfig, Severity},
    clawsetup_onboarding::{SetupSession, TokenGenerator, WizardOutcome, run_wizard},
};

#[derive(Parser)]
#[command(name = "clawsetup", about = "clawsetup: model provider setup for the OpenClaw gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Settings file (overrides discovery in ./ and ~/.config/clawsetup/).
    #[arg(long, global = true, env = "CLAWSETUP_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the config API (overrides settings).
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive setup (default when no subcommand is provided).
    Wizard,
    /// List the provider catalog.
    Providers,
    /// Ask the config API which models a credential can use.
    Models {
        #[arg(long)]
        provider: String,
        #[arg(long, env = "CLAWSETUP_API_KEY", hide_env_values = true)]
        api_key: String,
    },
    /// Save a configuration without prompting.
    Save(save_commands::SaveArgs),
    /// Print a freshly generated gateway token.
    Token,
}

/// Initialise tracing on stderr so prompts and results on stdout stay clean.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load settings, apply overrides, and refuse to continue on invalid values.
fn load_settings(cli: &Cli) -> anyhow::Result<SetupConfig> {
    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = clawsetup_config::load_config(path)
                .with_context(|| format!("loading settings from {}", path.display()))?;
            clawsetup_config::apply_env_overrides(&mut config);
            config
        },
        None => clawsetup_config::discover_and_load(),
    };
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint.base_url = endpoint.clone();
    }

    let result = clawsetup_config::validate(&config);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => eprintln!("{d}"),
            Severity::Warning => tracing::warn!(path = d.path, "{}", d.message),
        }
    }
    if result.has_errors() {
        anyhow::bail!("invalid settings");
    }
    debug!(base_url = %config.endpoint.base_url, "settings loaded");
    Ok(config)
}

async fn handle_wizard(config: &SetupConfig) -> anyhow::Result<()> {
    let session = SetupSession::from_config(config)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    match run_wizard(&session, stdin.lock(), &mut stdout).await? {
        WizardOutcome::Saved(_) => Ok(()),
        WizardOutcome::Abandoned(Some(last)) if !last.ok => {
            anyhow::bail!("configuration was not saved: {}", last.message)
        },
        WizardOutcome::Abandoned(_) => {
            println!("已退出，配置未保存。");
            Ok(())
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "clawsetup starting");

    match cli.command {
        Some(Commands::Providers) => {
            provider_commands::handle_providers();
            Ok(())
        },
        Some(Commands::Token) => {
            println!("{}", TokenGenerator::default().generate());
            Ok(())
        },
        Some(Commands::Models {
            ref provider,
            ref api_key,
        }) => {
            let config = load_settings(&cli)?;
            provider_commands::handle_models(&config, provider, api_key).await
        },
        Some(Commands::Save(ref args)) => {
            let config = load_settings(&cli)?;
            save_commands::handle_save(&config, args).await
        },
        None | Some(Commands::Wizard) => {
            let config = load_settings(&cli)?;
            handle_wizard(&config).await
        },
    }
}
