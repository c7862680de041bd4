//! Hunt commands: create, list, show and modify.

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use colored::{ColoredString, Colorize};
use tracing::Instrument;

use fh_core::{
    AccessContext, CancellationToken, Hunt, HuntId, HuntModification, HuntRequest, HuntService,
    HuntState, ListHuntsRequest, StartRequest,
};

use super::OutputFormat;

/// Arguments of `fleet-hunt create`.
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    pub artifacts: Vec<String>,
    /// `Artifact.Name.param=value` overrides.
    pub params: Vec<String>,
    pub description: String,
    pub expires_in_hours: Option<u64>,
    pub start: bool,
}

/// Splits `Artifact.Name.param=value` into its artifact, parameter and value.
///
/// Artifact names contain dots, so the parameter is whatever follows the last
/// dot before the `=`.
pub fn parse_param(raw: &str) -> Result<(String, String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Parameter '{}' must look like Artifact.param=value", raw))?;
    let (artifact, name) = key
        .rsplit_once('.')
        .filter(|(artifact, name)| !artifact.is_empty() && !name.is_empty())
        .ok_or_else(|| anyhow!("Parameter '{}' must name an artifact and a parameter", raw))?;
    Ok((artifact.to_string(), name.to_string(), value.to_string()))
}

/// Builds the service request for `create`.
pub fn build_request(args: &CreateArgs) -> Result<HuntRequest> {
    let mut start_request = StartRequest::new(args.artifacts.iter().cloned());
    for raw in &args.params {
        let (artifact, name, value) = parse_param(raw)?;
        start_request = start_request.with_parameter(artifact, name, value);
    }

    let mut request = HuntRequest::new(start_request).with_description(args.description.clone());
    if let Some(hours) = args.expires_in_hours {
        let hours = i64::try_from(hours).context("Expiry is too far in the future")?;
        request = request.with_expires(Utc::now() + Duration::hours(hours));
    }
    if args.start {
        request = request.running();
    }
    Ok(request)
}

pub async fn cmd_create(
    service: &HuntService,
    args: CreateArgs,
    access: &AccessContext,
    format: OutputFormat,
) -> Result<()> {
    let request = build_request(&args)?;
    let cancel = CancellationToken::new();

    let hunt_id = tokio::select! {
        result = service.create_hunt(request, access, &cancel) => result?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            return Err(anyhow!("Interrupted before the hunt was created"));
        }
    };

    let hunt = service.get_hunt(&hunt_id).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&hunt)?);
    } else {
        println!("{} {}", "Created hunt".green().bold(), hunt_id);
        print_hunt(&hunt);
    }
    Ok(())
}

pub async fn cmd_list(
    service: &HuntService,
    request: ListHuntsRequest,
    format: OutputFormat,
) -> Result<()> {
    let hunts = service.list_hunts(request).await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&hunts)?);
        return Ok(());
    }

    println!("{}", "Hunts".bold());
    println!("─────");
    if hunts.is_empty() {
        println!("No hunts found");
        return Ok(());
    }
    for hunt in &hunts {
        println!(
            "{:<22} {:<10} {:<20} {}",
            hunt.hunt_id().as_str().cyan(),
            colored_state(hunt.state()),
            hunt.create_time().format("%Y-%m-%d %H:%M:%S"),
            hunt.description()
        );
    }
    Ok(())
}

pub async fn cmd_show(service: &HuntService, hunt_id: &HuntId, format: OutputFormat) -> Result<()> {
    let hunt = service.get_hunt(hunt_id).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&hunt)?);
    } else {
        print_hunt(&hunt);
    }
    Ok(())
}

pub async fn cmd_modify(
    service: &HuntService,
    hunt_id: &HuntId,
    modification: HuntModification,
    user: &str,
    format: OutputFormat,
) -> Result<()> {
    let effect = service
        .modify_hunt(hunt_id, modification, user)
        .instrument(fh_observability::hunt_span!(hunt_id, user = user))
        .await?;

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "hunt_id": hunt_id,
            "effect": effect.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}: {}", "✓".green(), hunt_id, effect.as_str());
    }
    Ok(())
}

fn colored_state(state: HuntState) -> ColoredString {
    let label = state.to_string();
    match state {
        HuntState::Running => label.green(),
        HuntState::Paused => label.yellow(),
        HuntState::Stopped => label.red(),
        HuntState::Archived => label.dimmed(),
        HuntState::Unset => label.normal(),
    }
}

fn print_hunt(hunt: &Hunt) {
    println!("{}", hunt.hunt_id().as_str().bold());
    println!("{}", "═".repeat(40));
    println!("  {} {}", "State:".cyan(), colored_state(hunt.state()));
    println!("  {} {}", "Description:".cyan(), hunt.description());
    println!("  {} {}", "Creator:".cyan(), hunt.creator());
    println!("  {} {}", "Created:".cyan(), hunt.create_time());
    if let Some(started) = hunt.start_time() {
        println!("  {} {}", "Started:".cyan(), started);
    }
    println!("  {} {}", "Expires:".cyan(), hunt.expires());
    println!("  {} {}", "Artifacts:".cyan(), hunt.artifacts().join(", "));
    println!("  {} {}", "Sources:".cyan(), hunt.artifact_sources().join(", "));

    if let Some(stats) = &hunt.stats {
        println!();
        println!("{}", "Stats".bold());
        println!("  Scheduled: {}", stats.clients_scheduled);
        println!("  Completed: {}", stats.clients_completed);
        println!("  Errored:   {}", stats.clients_errored);
        if let Some(downloads) = stats.available_downloads.as_ref().filter(|d| !d.is_empty()) {
            println!();
            println!("{} ({} bytes)", "Downloads".bold(), downloads.total_size());
            for file in &downloads.files {
                let marker = if file.complete { "✓".green() } else { "…".yellow() };
                println!("  {} {} ({} bytes)", marker, file.name, file.size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_splits_on_last_dot() {
        let (artifact, name, value) =
            parse_param("Windows.System.Pslist.ProcessRegex=svchost").unwrap();
        assert_eq!(artifact, "Windows.System.Pslist");
        assert_eq!(name, "ProcessRegex");
        assert_eq!(value, "svchost");
    }

    #[test]
    fn test_parse_param_keeps_equals_in_value() {
        let (_, name, value) = parse_param("Generic.Client.Info.Filter=a=b").unwrap();
        assert_eq!(name, "Filter");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn test_parse_param_rejects_malformed() {
        assert!(parse_param("NoEquals").is_err());
        assert!(parse_param("NoDot=1").is_err());
        assert!(parse_param(".param=1").is_err());
        assert!(parse_param("Artifact.=1").is_err());
    }

    #[test]
    fn test_build_request() {
        let args = CreateArgs {
            artifacts: vec!["Windows.System.Pslist".to_string()],
            params: vec!["Windows.System.Pslist.ProcessRegex=svchost".to_string()],
            description: "triage".to_string(),
            expires_in_hours: Some(2),
            start: true,
        };
        let request = build_request(&args).unwrap();

        assert_eq!(request.description, "triage");
        assert_eq!(request.state, HuntState::Running);
        let start = request.start_request.unwrap();
        assert_eq!(start.artifacts, vec!["Windows.System.Pslist"]);
        assert_eq!(
            start
                .parameters_for("Windows.System.Pslist")
                .and_then(|p| p.get("ProcessRegex"))
                .map(String::as_str),
            Some("svchost")
        );
        let expires = request.expires.unwrap();
        assert!(expires > Utc::now() + Duration::minutes(119));
    }

    #[test]
    fn test_build_request_defaults_to_paused() {
        let args = CreateArgs {
            artifacts: vec!["Generic.Client.Info".to_string()],
            ..Default::default()
        };
        let request = build_request(&args).unwrap();
        assert_eq!(request.state, HuntState::Unset);
        assert!(request.expires.is_none());
    }
}
