//! Report command: fetch, aggregate, print

use colored::Colorize;

use crate::aggregate::{self, Diagnostics};
use crate::cache::Origin;
use crate::cli::{CommandContext, GlobalOptions, ReportArgs};
use crate::client::FetchRequest;
use crate::error::{Error, Result};
use crate::output::{self, Formattable, Report, SourceMetadata};

/// Run the fetch -> aggregate pipeline and print the monthly severity matrix
pub async fn run(opts: &GlobalOptions, args: &ReportArgs) -> Result<()> {
    let mut ctx = CommandContext::new(opts)?;
    if let Some(url) = &args.api_url {
        ctx.config.api_url = url.clone();
        ctx.config.validate()?;
    }

    let source = ctx.incident_source()?;
    let request = FetchRequest::new(ctx.config.api_url.clone());
    let fetched = source.fetch(&request).await?;

    if let Origin::StaleCache { stored_at, error } = &fetched.origin {
        eprintln!(
            "{} Status page refresh failed ({}); showing cached data from {}",
            "⚠".yellow(),
            error,
            stored_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
    }

    let aggregation = aggregate::process_payload(&fetched.payload)?;
    check_diagnostics(&aggregation.diagnostics)?;
    log::info!(
        "Report covers {} incidents across {} months",
        aggregation.table.total(),
        aggregation.table.len()
    );

    let report = Report {
        aggregation,
        source: SourceMetadata::new(request.url.clone(), &fetched.origin),
    };

    match &args.output {
        Some(path) => {
            let mut rendered = report.format(ctx.format)?;
            rendered.push('\n');
            std::fs::write(path, rendered)?;
            eprintln!("{} Wrote report to {}", "✓".green(), path.display());
            Ok(())
        }
        None => output::print(&report, ctx.format),
    }
}

/// Refuse an empty result built from records that all failed, and surface
/// partial skips on stderr
fn check_diagnostics(diagnostics: &Diagnostics) -> Result<()> {
    if diagnostics.all_rejected() {
        return Err(Error::AllRecordsRejected {
            skipped: diagnostics.skipped_total(),
            summary: diagnostics.summary(),
        });
    }

    if diagnostics.skipped_total() > 0 {
        eprintln!(
            "{} Skipped {} of {} incident records ({})",
            "⚠".yellow(),
            diagnostics.skipped_total(),
            diagnostics.accepted + diagnostics.skipped_total(),
            diagnostics.summary()
        );
    }
    Ok(())
}
