//! Terminal driver for the setup wizard.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::{
    error::Result,
    flow::{FlowCommand, WizardFlow},
    session::{DiscoveryRejection, DiscoveryReport, SetupSession, SubmitReport},
    submit::SaveResponse,
};

/// How an interactive run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    /// The collaborator accepted the configuration.
    Saved(SaveResponse),
    /// The operator quit or input ended; carries the last status, if any.
    Abandoned(Option<SaveResponse>),
}

/// Run the wizard, reading answers from `input` and writing prompts to `out`.
pub async fn run_wizard<R: BufRead, W: Write>(
    session: &SetupSession,
    mut input: R,
    out: &mut W,
) -> Result<WizardOutcome> {
    let mut flow = WizardFlow::new();
    writeln!(out, "OpenClaw 快速配置（任意步骤输入 back 返回上一步）")?;

    while !flow.is_done() {
        let state = session.snapshot();
        writeln!(out, "{}", flow.prompt(&state))?;
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            debug!(step = ?flow.step(), "input closed before the wizard finished");
            return Ok(WizardOutcome::Abandoned(state.status().cloned()));
        }

        match flow.advance(&line, &state) {
            FlowCommand::Keep => {},
            FlowCommand::SelectProvider(id) => session.select_provider(&id)?,
            FlowCommand::SetCustomEnvKey(value) => session.set_custom_env_key(value),
            FlowCommand::SetApiKey(value) => session.edit_api_key(value),
            FlowCommand::SetModel(value) => session.edit_model(value),
            FlowCommand::SetToken(value) => session.edit_token(value),
            FlowCommand::RegenerateToken => {
                let token = session.regenerate_token();
                writeln!(out, "新 Token：{token}")?;
            },
            FlowCommand::Discover => {
                writeln!(out, "获取中...")?;
                match session.discover_models().await {
                    // A missing key is already recorded as the discovery hint.
                    DiscoveryReport::Rejected(DiscoveryRejection::MissingApiKey) => {},
                    DiscoveryReport::Rejected(reason) => writeln!(out, "{reason}")?,
                    DiscoveryReport::Applied(outcome) => {
                        debug!(message = ?outcome.message(), "models discovered");
                    },
                    DiscoveryReport::Discarded => {},
                }
            },
            FlowCommand::Submit => {
                writeln!(out, "保存中...")?;
                match session.submit().await {
                    SubmitReport::Rejected(reason) => {
                        writeln!(out, "{reason}")?;
                        flow.retry();
                    },
                    SubmitReport::Completed(response) => {
                        print_status(out, &response, session.snapshot().gateway_token())?;
                        if response.ok {
                            flow.finish();
                            return Ok(WizardOutcome::Saved(response));
                        }
                        flow.retry();
                    },
                }
            },
            FlowCommand::Cancel => {
                return Ok(WizardOutcome::Abandoned(session.snapshot().status().cloned()));
            },
            FlowCommand::Invalid(message) => writeln!(out, "{message}")?,
        }
    }

    Ok(WizardOutcome::Abandoned(session.snapshot().status().cloned()))
}

/// Render a save status the way the operator sees it.
pub fn print_status<W: Write>(out: &mut W, response: &SaveResponse, token: &str) -> Result<()> {
    if !response.message.is_empty() {
        writeln!(out, "{}", response.message)?;
    }
    if let Some(detail) = response.restart_detail() {
        writeln!(out, "{detail}")?;
    }
    if response.ok {
        if response.is_partial_success() {
            writeln!(out, "配置已写入，但网关未能重启，请手动重启。")?;
        }
        writeln!(out, "Gateway Token：{token}")?;
    }
    Ok(())
}
