use {anyhow::Result, clap::Args};

use {
    clawsetup_config::SetupConfig,
    clawsetup_onboarding::{SetupSession, SubmitReport, print_status},
};

#[derive(Args)]
pub struct SaveArgs {
    /// Provider id (see `clawsetup providers`).
    #[arg(long)]
    pub provider: String,
    /// Credential variable name; only used with the custom provider.
    #[arg(long)]
    pub env_key: Option<String>,
    #[arg(long, env = "CLAWSETUP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Defaults to the provider's suggested model.
    #[arg(long)]
    pub model: Option<String>,
    /// Gateway token; generated when omitted.
    #[arg(long)]
    pub token: Option<String>,
}

pub async fn handle_save(config: &SetupConfig, args: &SaveArgs) -> Result<()> {
    let session = SetupSession::from_config(config)?;
    if let Some(ref env_key) = args.env_key {
        session.set_custom_env_key(env_key.as_str());
    }
    session.select_provider(&args.provider)?;
    if let Some(ref api_key) = args.api_key {
        session.edit_api_key(api_key.as_str());
    }
    if let Some(ref model) = args.model {
        session.edit_model(model.as_str());
    }
    // The session starts with a generated token; an explicit one replaces it.
    if let Some(ref token) = args.token {
        session.edit_token(token.as_str());
    }

    match session.submit().await {
        SubmitReport::Rejected(reason) => anyhow::bail!("{reason}"),
        SubmitReport::Completed(response) => {
            let mut stdout = std::io::stdout();
            print_status(&mut stdout, &response, session.snapshot().gateway_token())?;
            if !response.ok {
                anyhow::bail!("configuration was not saved");
            }
            Ok(())
        },
    }
}
