//! Upgrade command

use anyhow::Result;
use phoenix_core::HierarchicalConfigLoader;
use phoenix_update::{
    registry_from_config, CancellationToken, Release, UpdateError, UpdateErrorKind, UpdateFailure,
    UpdateOutcome, Updater, Version,
};
use serde_json::json;
use std::process::ExitCode;

use super::EXIT_CANCELLED;
use crate::cli::UpgradeArgs;
use crate::output;
use crate::version::current_version;

pub async fn run(args: UpgradeArgs, cancel: &CancellationToken) -> Result<ExitCode> {
    let loader = HierarchicalConfigLoader::new()?;
    let mut config = loader.load_runtime_config()?;
    let matrix = loader.load_platform_matrix()?;

    // Progress bars would corrupt machine-readable output
    if args.json || args.no_progress {
        config.update.show_progress = false;
    }
    let slug = args.slug.clone().unwrap_or_else(|| config.project.slug.clone());

    let registry = registry_from_config(&config).await?;
    let updater = Updater::from_config(registry, &config, &matrix);
    let current = current_version();

    if args.check {
        return check_for_updates(&updater, cancel, &current, &slug, args.json).await;
    }

    if !args.json {
        output::info(&format!("Current version: {}", current));
    }
    let result = updater.update_from(cancel, &current, &slug).await;

    if args.json {
        let report = match &result {
            Ok(outcome) => serde_json::to_value(outcome)?,
            Err(failure) => failure_json(failure),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &result {
            Ok(outcome) => report_outcome(outcome),
            Err(failure) => report_failure(failure),
        }
    }

    Ok(match &result {
        Ok(_) => ExitCode::SUCCESS,
        Err(failure) => exit_code(failure.kind(), failure.error.is_soft()),
    })
}

/// Check for updates only
async fn check_for_updates(
    updater: &Updater,
    cancel: &CancellationToken,
    current: &Version,
    slug: &str,
    json: bool,
) -> Result<ExitCode> {
    let spinner = (!json).then(|| output::spinner("Checking for updates..."));
    let result = updater.check(cancel, current, slug).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let available = match result {
        Ok(available) => available,
        Err(e) => {
            let code = exit_code(e.kind(), e.is_soft());
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "status": "failed",
                        "kind": format!("{:?}", e.kind()),
                        "error": e.to_string(),
                    }))?
                );
            } else {
                report_error(&e);
            }
            return Ok(code);
        }
    };

    if json {
        let report = json!({
            "current": current,
            "update-available": available.is_some(),
            "release": available,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    output::info(&format!("Current version: {}", current));
    match available {
        Some(release) => {
            output::success(&format!("Update available: {}", release.version));
            show_release(&release);
            output::info("Run 'phoenix upgrade' to install the update");
        }
        None => output::success("Already on the latest version"),
    }

    Ok(ExitCode::SUCCESS)
}

fn report_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate { current, .. } => {
            output::success(&format!("Already on the latest version ({})", current));
        }
        UpdateOutcome::Updated { previous, release } => {
            output::success(&format!("Updated {} -> {}", previous, release.version));
            output::info("Restart phoenix to use the new version");
        }
    }
}

fn report_failure(failure: &UpdateFailure) {
    if failure.error.is_soft() || failure.is(UpdateErrorKind::Cancelled) {
        report_error(&failure.error);
        return;
    }

    output::error(&format!("{}: {}", failure, failure.error));
    if let Some(release) = &failure.release {
        output::kv("Release", release.version.as_str());
        output::kv("Asset", &release.asset_name);
    }
    output::info("The installed version was left unchanged");
}

fn report_error(error: &UpdateError) {
    match error.kind() {
        UpdateErrorKind::ReleaseNotDetected => {
            output::warning("No release is published for this platform yet, try again later");
        }
        UpdateErrorKind::Cancelled => output::warning("Upgrade cancelled"),
        _ => output::error(&error.to_string()),
    }
}

fn show_release(release: &Release) {
    output::header(&format!("Release {}", release.version));
    if !release.name.is_empty() {
        output::kv("Name", &release.name);
    }
    if let Some(published) = release.published_at {
        output::kv("Published", &published.format("%Y-%m-%d").to_string());
    }
    output::kv("Asset", &release.asset_name);
    if !release.url.is_empty() {
        output::kv("URL", &release.url);
    }

    if !release.release_notes.is_empty() {
        // Show first few lines of changelog
        let preview: String = release
            .release_notes
            .lines()
            .take(10)
            .collect::<Vec<_>>()
            .join("\n");
        println!("\nChangelog:\n{}\n", preview);
    }
}

fn failure_json(failure: &UpdateFailure) -> serde_json::Value {
    json!({
        "status": "failed",
        "stage": failure.stage.to_string(),
        "kind": format!("{:?}", failure.kind()),
        "error": failure.error.to_string(),
        "release": failure.release,
    })
}

/// Soft failures are not errors for the caller; cancellation maps to the
/// interrupt status
fn exit_code(kind: UpdateErrorKind, soft: bool) -> ExitCode {
    if soft {
        ExitCode::SUCCESS
    } else if kind == UpdateErrorKind::Cancelled {
        ExitCode::from(EXIT_CANCELLED)
    } else {
        ExitCode::FAILURE
    }
}
