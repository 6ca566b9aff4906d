use inkwell_common::{Conf, Context as _, Report};
use inkwell_services::{audit::AuditReport, Catalog};

/// Audits the configured catalog and prints the report as JSON.
///
/// With an `output` directory the counters are reconciled first and the
/// repaired fixture set is written there.
pub async fn run(conf: &Conf, output: Option<&str>) -> Result<(), Report> {
    let catalog = inkwell_services::init_catalog(conf).await?;

    let report = check(&catalog, output).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("unable to serialize audit report")?
    );

    Ok(())
}

async fn check(catalog: &Catalog, output: Option<&str>) -> Result<AuditReport, Report> {
    let report = catalog.audit().await;

    for finding in &report.findings {
        tracing::warn!(?finding, "inconsistency");
    }

    if let Some(dir) = output {
        let changed = catalog.reconcile().await;

        catalog.snapshot().await.write_dir(dir).await?;

        tracing::info!(changed, dir, "wrote reconciled fixtures");
    }

    Ok(report)
}
