//! `nbload template add`.

use serde::Serialize;

use nbload_core::{Directory, TemplateOutcome, TemplateRequest, add_interface_template};

use crate::cli::{GlobalOpts, TemplateArgs, TemplateCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
pub struct TemplateResult {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl From<&TemplateOutcome> for TemplateResult {
    fn from(outcome: &TemplateOutcome) -> Self {
        let (status, id) = match outcome {
            TemplateOutcome::AlreadyExists { .. } => ("exists", None),
            TemplateOutcome::Added { id, .. } => ("added", Some(*id)),
            TemplateOutcome::WouldAdd { .. } => ("dry-run", None),
        };
        Self {
            status,
            message: outcome.to_string(),
            id,
        }
    }
}

pub async fn add<D: Directory>(
    directory: &D,
    request: &TemplateRequest,
    commit: bool,
) -> Result<TemplateResult, CliError> {
    let outcome = add_interface_template(directory, request, commit).await?;
    Ok(TemplateResult::from(&outcome))
}

pub async fn handle(args: TemplateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TemplateCommand::Add {
            device_type,
            manufacturer,
            name,
            kind,
            disabled,
            commit,
        } => {
            let cfg = nbload_config::load_config_or_default();
            let client = config::connect(global, &cfg)?;

            let request = TemplateRequest {
                device_type,
                manufacturer,
                name,
                kind,
                enabled: !disabled,
            };
            let result = add(&client, &request, commit).await?;

            let out = output::render_single(
                global.output,
                &result,
                |r| r.message.clone(),
                |r| r.status.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
