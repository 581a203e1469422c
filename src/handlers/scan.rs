use crate::analyzer::checks::imds;
use crate::analyzer::formatter::{self, OutputFormat, json};
use crate::analyzer::inventory::{Inventory, NamespaceScope};
use crate::analyzer::parser;
use crate::analyzer::types::{ClusterMeta, Report, Severity};
use crate::analyzer::{AuditOptions, audit};
use crate::cli::ScanArgs;
use crate::cluster::{self, ClusterClient};
use crate::config::types::Config;
use crate::error::Result;
use std::collections::BTreeMap;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

/// Fully resolved scan settings: command-line flags over config file values.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub input: Option<PathBuf>,
    pub context: Option<String>,
    pub page_size: u32,
    pub scope: NamespaceScope,
    pub probe_imds: bool,
    pub format: OutputFormat,
    pub out: Option<PathBuf>,
    pub fail_on: Severity,
    pub audit: AuditOptions,
    pub color: bool,
}

impl ScanOptions {
    pub fn resolve(args: ScanArgs, config: &Config) -> Self {
        let mut exclude_checks = config.scan.exclude_checks.clone();
        exclude_checks.extend(args.exclude_check);

        Self {
            input: args.input,
            context: args.context.or_else(|| config.scan.context.clone()),
            page_size: config.scan.page_size,
            scope: NamespaceScope {
                only: args.namespace.filter(|ns| !ns.trim().is_empty()),
                include_kube_system: args.include_kube_system || config.scan.include_kube_system,
            },
            probe_imds: args.probe_imds || config.scan.probe_imds,
            format: args.format.map(Into::into).unwrap_or(config.output.format),
            out: args.out,
            fail_on: args.fail_on.map(Into::into).unwrap_or(config.output.fail_on),
            audit: AuditOptions { exclude_checks },
            color: !args.no_color && config.output.color && std::io::stdout().is_terminal(),
        }
    }
}

/// Run a scan and print the report. Returns whether the fail threshold was
/// reached.
pub async fn handle_scan(options: ScanOptions) -> Result<bool> {
    for id in options.audit.unknown_checks() {
        log::warn!("Excluded check {} is not a known check id", id);
    }

    let (meta, mut inventory, notes) = match &options.input {
        Some(path) => load_snapshot(path)?,
        None => {
            let client =
                ClusterClient::connect(options.context.as_deref(), options.page_size).await?;
            let collected = client.collect().await?;
            (collected.cluster, collected.inventory, collected.notes)
        }
    };

    inventory.retain_scope(&options.scope);
    for (kind, count) in inventory.counts() {
        match count {
            Some(count) => log::debug!("{}: {} in scope", kind, count),
            None => log::debug!("{}: unavailable", kind),
        }
    }

    let mut findings = audit(&inventory, &options.audit);

    if options.probe_imds {
        let outcome = cluster::probe_imds(cluster::probe::DEFAULT_TIMEOUT).await;
        let finding = imds::evaluate(&outcome);
        if !options.audit.is_excluded(&finding.check_id) {
            findings.push(finding);
        }
    }

    let report = Report::new(meta, findings, notes);
    log::info!(
        "{} findings, highest severity {}",
        report.findings.len(),
        report
            .max_severity()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    write_output(&report, &options)?;
    Ok(report.should_fail(options.fail_on))
}

fn load_snapshot(path: &Path) -> Result<(ClusterMeta, Inventory, BTreeMap<String, String>)> {
    let inventory = if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        parser::parse_snapshot(&content)?
    } else {
        parser::parse_snapshot_file(path)?
    };
    log::info!("Loaded snapshot {}", path.display());

    let meta = ClusterMeta {
        server_version: None,
        api_server: format!("snapshot:{}", path.display()),
    };
    Ok((meta, inventory, BTreeMap::new()))
}

/// Text goes to stdout, with the JSON report also written to `--out` when
/// given. JSON goes to `--out` if given, stdout otherwise.
fn write_output(report: &Report, options: &ScanOptions) -> Result<()> {
    match (options.format, &options.out) {
        (OutputFormat::Text, out) => {
            print!("{}", formatter::format_report(report, OutputFormat::Text, options.color)?);
            if let Some(path) = out {
                json::write_report(report, path)?;
            }
        }
        (OutputFormat::Json, Some(path)) => json::write_report(report, path)?,
        (OutputFormat::Json, None) => println!("{}", json::format(report)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.scan.exclude_checks = vec!["K8S-NET-005".into()];
        config.scan.context = Some("staging".into());
        config.output.fail_on = Severity::Critical;
        config.output.format = OutputFormat::Json;

        let args = ScanArgs {
            fail_on: Some(crate::cli::SeverityThreshold::Medium),
            exclude_check: vec!["K8S-NET-006".into()],
            namespace: Some("shop".into()),
            ..Default::default()
        };
        let options = ScanOptions::resolve(args, &config);

        assert_eq!(options.fail_on, Severity::Medium);
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(options.context.as_deref(), Some("staging"));
        assert_eq!(options.audit.exclude_checks, vec!["K8S-NET-005", "K8S-NET-006"]);
        assert_eq!(options.scope.only.as_deref(), Some("shop"));
        assert!(!options.scope.include_kube_system);
    }

    #[test]
    fn test_config_defaults_apply() {
        let options = ScanOptions::resolve(ScanArgs::default(), &Config::default());
        assert_eq!(options.fail_on, Severity::High);
        assert_eq!(options.format, OutputFormat::Text);
        assert_eq!(options.page_size, 500);
        assert!(!options.probe_imds);
    }
}
