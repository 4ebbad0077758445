//! The generate command

use anyhow::Result;
use espkeys_secrets::{generate, GenerateRequest};

use crate::cli::GenerateArgs;
use crate::output;

pub async fn run(args: GenerateArgs) -> Result<()> {
    // With neither --output nor --print, new entries go to stdout
    let emit = args.print || args.output.is_none();

    let request = GenerateRequest {
        root: args.folder.into_std_path_buf(),
        mode: args.mode,
        master_secret: args.master_secret,
        master_secret_file: args.master_secret_file.map(|p| p.into_std_path_buf()),
        output: args.output.map(|p| p.into_std_path_buf()),
        print_only: emit,
    };

    let spinner = output::spinner("Deriving device secrets...");
    let result = generate(&request).await;
    spinner.finish_and_clear();

    let report = result?;

    if args.json {
        let summary = serde_json::json!({
            "devices_found": report.devices_found,
            "devices_processed": report.devices_processed,
            "added": report.outcome.added,
            "skipped": report.outcome.skipped,
            "failures": report
                .failures
                .iter()
                .map(|f| serde_json::json!({
                    "source": f.source.display().to_string(),
                    "reason": f.reason,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if emit {
        // Plain key: "value" lines, pipe-friendly for appending to a store
        for (key, value) in &report.new_entries {
            println!("{}: \"{}\"", key, value);
        }
        if !report.outcome.skipped.is_empty() {
            output::info(&format!(
                "{} existing key(s) were skipped",
                report.outcome.skipped.len()
            ));
        }
    } else {
        let store = request
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        output::success(&format!(
            "Updated {} with {} new key(s)",
            store,
            report.outcome.added.len()
        ));
        output::kv("devices found", &report.devices_found.to_string());
        output::kv("keys added", &report.outcome.added.len().to_string());
        output::kv(
            "existing keys untouched",
            &report.outcome.skipped.len().to_string(),
        );
    }

    for failure in &report.failures {
        output::warning(&failure.to_string());
    }

    if !report.is_clean() {
        output::error(&format!(
            "{} of {} device configuration(s) failed",
            report.failures.len(),
            report.devices_found
        ));
        anyhow::bail!(
            "completed with {} failed device configuration(s)",
            report.failures.len()
        );
    }

    Ok(())
}
