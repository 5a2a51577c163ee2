use anyhow::Result;

use {
    clawsetup_config::SetupConfig,
    clawsetup_onboarding::{DiscoveryReport, SetupSession},
    clawsetup_provider_setup::{DiscoveryOutcome, ProviderGroup, by_group},
};

pub fn handle_providers() {
    for group in ProviderGroup::ALL {
        println!("{}:", group.label());
        for option in by_group(group) {
            let env_key = option.env_key.unwrap_or("(自定义)");
            let default_model = option.default_model.unwrap_or("-");
            let auto = if option.supports_auto_models {
                "auto"
            } else {
                "manual"
            };
            println!(
                "  {:<10} {:<18} {env_key:<20} {auto:<6} {default_model}",
                option.id, option.label
            );
        }
    }
}

pub async fn handle_models(config: &SetupConfig, provider: &str, api_key: &str) -> Result<()> {
    let session = SetupSession::from_config(config)?;
    session.select_provider(provider)?;
    session.edit_api_key(api_key);

    match session.discover_models().await {
        DiscoveryReport::Applied(DiscoveryOutcome::Listed { models, message }) => {
            for model in &models {
                println!("{model}");
            }
            if let Some(message) = message {
                eprintln!("{message}");
            }
            Ok(())
        },
        DiscoveryReport::Applied(outcome) => {
            anyhow::bail!("{}", outcome.message().unwrap_or_default())
        },
        DiscoveryReport::Rejected(reason) => anyhow::bail!("{reason}"),
        DiscoveryReport::Discarded => anyhow::bail!("model discovery was superseded"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::serve,
        axum::http::StatusCode,
        serde_json::json,
    };

    fn saved_ok() -> serde_json::Value {
        json!({ "ok": true, "restarted": true, "message": "配置已保存并重启" })
    }

    #[tokio::test]
    async fn listed_models_succeed() {
        let api = serve(
            (StatusCode::OK, json!({ "models": ["deepseek/deepseek-chat"] })),
            saved_ok(),
        )
        .await;

        handle_models(&api.config, "deepseek", "sk-deep").await.unwrap();
    }

    #[tokio::test]
    async fn rejected_key_fails_with_server_message() {
        let api = serve(
            (StatusCode::UNAUTHORIZED, json!({ "message": "invalid api key" })),
            saved_ok(),
        )
        .await;

        let err = handle_models(&api.config, "openai", "sk-wrong").await.unwrap_err();
        assert!(err.to_string().contains("invalid api key"), "{err}");
    }

    #[tokio::test]
    async fn empty_key_fails_without_request() {
        let api = serve((StatusCode::OK, json!({ "models": [] })), saved_ok()).await;

        let err = handle_models(&api.config, "openai", "  ").await.unwrap_err();
        assert!(err.to_string().contains("请先填写 API Key"), "{err}");
    }
}
