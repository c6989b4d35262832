//! `nbload import`: reconcile every CSV row in file order, then write the
//! failed and skipped tables and print a summary.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info};

use nbload_config::ImportDefaults;
use nbload_core::{
    Directory, DnsNameSource, ImportReport, ReconcileOptions, Reconciler, Summary,
};

use crate::cli::{DnsNameArg, GlobalOpts, ImportArgs};
use crate::config;
use crate::csv_io::{self, CsvInput};
use crate::error::CliError;
use crate::output;

/// What a finished run reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    #[serde(flatten)]
    pub summary: Summary,
    pub failed_file: Option<PathBuf>,
    pub skipped_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Outcome")]
    outcome: &'static str,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Merge `import` flags with the config file's import defaults.
pub fn reconcile_options(
    args: &ImportArgs,
    defaults: &ImportDefaults,
) -> Result<ReconcileOptions, CliError> {
    let dns_name = match args.dns_name {
        Some(DnsNameArg::Row) => DnsNameSource::Row,
        Some(DnsNameArg::DeviceName) => DnsNameSource::DeviceName,
        None => DnsNameSource::from_str(&defaults.dns_name).map_err(|_| CliError::Validation {
            field: "defaults.import.dns_name".into(),
            reason: format!(
                "expected 'row' or 'device-name', got '{}'",
                defaults.dns_name
            ),
        })?,
    };

    Ok(ReconcileOptions {
        interface_name: args
            .interface
            .clone()
            .unwrap_or_else(|| defaults.interface.clone()),
        dns_name,
        link_assets: args.link_assets || defaults.link_assets,
        ..ReconcileOptions::default()
    })
}

/// Reconcile each row in order and classify its outcome.
pub async fn run_rows<D: Directory>(
    directory: &D,
    options: ReconcileOptions,
    input: CsvInput,
) -> ImportReport {
    let reconciler = Reconciler::new(directory, options);
    let mut report = ImportReport::new(input.headers);

    for (index, row) in input.rows.into_iter().enumerate() {
        let result = reconciler.reconcile(&row).await;
        debug!(
            line = index + 2,
            device = %row.name(),
            outcome = ?result.outcome,
            mutations = result.mutations.len(),
            "row reconciled"
        );
        report.record(row, &result.outcome);
    }

    report
}

/// Write the failed and skipped tables, each only when it has rows.
pub fn write_outputs(
    report: &ImportReport,
    failed_path: &Path,
    skipped_path: &Path,
) -> Result<ImportSummary, CliError> {
    let mut summary = ImportSummary {
        summary: report.summary(),
        failed_file: None,
        skipped_file: None,
    };

    if !report.failed().is_empty() {
        csv_io::write_table(failed_path, report, report.failed())?;
        info!(path = %failed_path.display(), rows = report.failed().len(), "wrote failed rows");
        summary.failed_file = Some(failed_path.to_path_buf());
    }
    if !report.skipped().is_empty() {
        csv_io::write_table(skipped_path, report, report.skipped())?;
        info!(path = %skipped_path.display(), rows = report.skipped().len(), "wrote skipped rows");
        summary.skipped_file = Some(skipped_path.to_path_buf());
    }

    Ok(summary)
}

fn summary_detail(s: &ImportSummary) -> String {
    let rows = [
        SummaryRow {
            outcome: "applied",
            rows: s.summary.applied,
        },
        SummaryRow {
            outcome: "skipped",
            rows: s.summary.skipped,
        },
        SummaryRow {
            outcome: "failed",
            rows: s.summary.failed,
        },
        SummaryRow {
            outcome: "total",
            rows: s.summary.total,
        },
    ];
    let mut out = output::render_table(&rows);
    if let Some(ref path) = s.failed_file {
        out.push_str(&format!("\nFailed rows: {}", path.display()));
    }
    if let Some(ref path) = s.skipped_file {
        out.push_str(&format!("\nSkipped rows: {}", path.display()));
    }
    out
}

fn summary_plain(s: &ImportSummary) -> String {
    format!(
        "applied={} skipped={} failed={}",
        s.summary.applied, s.summary.skipped, s.summary.failed
    )
}

pub async fn handle(args: ImportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = nbload_config::load_config_or_default();
    let defaults = &cfg.defaults.import;

    let options = reconcile_options(&args, defaults)?;
    let failed_path = args
        .failed_file
        .clone()
        .unwrap_or_else(|| defaults.failed_file.clone());
    let skipped_path = args
        .skipped_file
        .clone()
        .unwrap_or_else(|| defaults.skipped_file.clone());

    let client = config::connect(global, &cfg)?;
    let input = csv_io::read_rows(&args.file)?;
    info!(
        file = %args.file.display(),
        rows = input.rows.len(),
        interface = %options.interface_name,
        "starting import"
    );

    let report = run_rows(&client, options, input).await;
    let summary = write_outputs(&report, &failed_path, &skipped_path)?;
    info!(
        applied = summary.summary.applied,
        skipped = summary.summary.skipped,
        failed = summary.summary.failed,
        "import finished"
    );

    let out = output::render_single(global.output, &summary, summary_detail, summary_plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use serde_json::json;

    use nbload_core::{MemoryDirectory, Op, Resource};

    use super::*;
    use crate::cli::{Cli, Command};

    fn import_args(args: &[&str]) -> ImportArgs {
        let mut argv = vec!["nbload", "import", "devices.csv"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Import(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn seeded() -> MemoryDirectory {
        let dir = MemoryDirectory::new();
        let cisco = dir.seed(Resource::Manufacturers, json!({ "name": "Cisco" }));
        dir.seed(
            Resource::DeviceTypes,
            json!({ "model": "C9300", "manufacturer": cisco }),
        );
        dir.seed(Resource::DeviceRoles, json!({ "name": "access" }));
        dir.seed(Resource::Sites, json!({ "name": "hq" }));
        dir
    }

    const CSV: &str = "\
name,manufacturer,device_type,role,site,address
sw1,Cisco,C9300,access,hq,10.1.1.1
sw2,Cisco,C9300,access,branch,10.1.1.2
sw3,Cisco,C9300,access,hq,10.1.1.1
";

    #[test]
    fn flags_win_over_config_defaults() {
        let defaults = ImportDefaults {
            interface: "WAN".into(),
            dns_name: "device-name".into(),
            ..ImportDefaults::default()
        };

        let options = reconcile_options(&import_args(&[]), &defaults).unwrap();
        assert_eq!(options.interface_name, "WAN");
        assert_eq!(options.dns_name, DnsNameSource::DeviceName);

        let options = reconcile_options(
            &import_args(&["--interface", "LAN", "--dns-name", "row", "--link-assets"]),
            &defaults,
        )
        .unwrap();
        assert_eq!(options.interface_name, "LAN");
        assert_eq!(options.dns_name, DnsNameSource::Row);
        assert!(options.link_assets);
    }

    #[test]
    fn bad_dns_name_default_is_rejected() {
        let defaults = ImportDefaults {
            dns_name: "hostname".into(),
            ..ImportDefaults::default()
        };
        let err = reconcile_options(&import_args(&[]), &defaults).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[tokio::test]
    async fn rows_are_classified_and_tables_written() {
        let dir = seeded();
        let input = csv_io::read_from(CSV.as_bytes()).unwrap();

        let report = run_rows(&dir, ReconcileOptions::default(), input).await;
        assert_eq!(
            report.summary(),
            Summary {
                total: 3,
                applied: 1,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(dir.count(Op::Create, Resource::Devices), 2);

        let tmp = tempfile::tempdir().unwrap();
        let failed = tmp.path().join("failed.csv");
        let skipped = tmp.path().join("skipped.csv");
        let summary = write_outputs(&report, &failed, &skipped).unwrap();
        assert_eq!(summary.failed_file.as_deref(), Some(failed.as_path()));

        let failed_text = std::fs::read_to_string(&failed).unwrap();
        assert_eq!(
            failed_text,
            "name,manufacturer,device_type,role,site,address,reason\n\
             sw2,Cisco,C9300,access,branch,10.1.1.2,Missing reference: site\n"
        );

        let skipped_text = std::fs::read_to_string(&skipped).unwrap();
        assert!(skipped_text.starts_with("name,manufacturer,device_type,role,site,address,reason\n"));
        assert!(skipped_text.contains("sw3"));
        assert!(skipped_text.contains("10.1.1.1/24 already exists and is assigned"));
    }

    #[tokio::test]
    async fn clean_run_writes_no_tables() {
        let dir = seeded();
        let input = csv_io::read_from(
            "name,manufacturer,device_type,role,site\nsw1,Cisco,C9300,access,hq\n".as_bytes(),
        )
        .unwrap();
        let report = run_rows(&dir, ReconcileOptions::default(), input).await;

        let tmp = tempfile::tempdir().unwrap();
        let failed = tmp.path().join("failed.csv");
        let skipped = tmp.path().join("skipped.csv");
        let summary = write_outputs(&report, &failed, &skipped).unwrap();

        assert_eq!(summary.summary.applied, 1);
        assert!(summary.failed_file.is_none());
        assert!(!failed.exists());
        assert!(!skipped.exists());
        assert_eq!(summary_plain(&summary), "applied=1 skipped=0 failed=0");
    }
}
