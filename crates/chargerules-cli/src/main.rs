use anyhow::{Context, Result};
use chargerules_core::{
    vendors_from_routing, ChargeTemplate, CombinationKind, LookupRequest, Order, RoutingRecord,
    RuleConfig, VendorType,
};
use chargerules_storage::{metrics, snapshot, ChargeRuleLookup, InMemoryStore};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chargerules")]
#[command(about="Charge template rule lookup CLI", long_about=None)]
struct Cli {
    /// Template group every lookup is scoped to (overrides CHARGE_TEMPLATE_GROUP_ID)
    #[arg(long, global = true)]
    template_group: Option<String>,
    /// Print Prometheus metrics to stderr when the command finishes
    #[arg(long, global = true)]
    metrics: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args)]
struct LookupInput {
    /// JSON array of orders
    #[arg(long)]
    routing: PathBuf,
    /// JSON lookup context (owner, vendorType, vendorList, groupInformation)
    #[arg(long)]
    info: Option<PathBuf>,
    /// Match on location keys instead of move-type-prefixed route keys
    #[arg(long)]
    location: bool,
}

impl LookupInput {
    fn kind(&self) -> CombinationKind {
        if self.location {
            CombinationKind::Location
        } else {
            CombinationKind::Route
        }
    }

    fn load(&self) -> Result<(Vec<Order>, Option<LookupRequest>)> {
        let routing: Vec<Order> = read_json(&self.routing)?;
        let info: Option<LookupRequest> = self.info.as_deref().map(read_json).transpose()?;
        Ok((routing, info))
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the filter a lookup would send to the store
    Filter {
        #[command(flatten)]
        input: LookupInput,
    },
    /// Run a lookup against a template snapshot
    Lookup {
        /// Snapshot file (.jsonl or .jsonl.zst)
        #[arg(long)]
        templates: PathBuf,
        #[command(flatten)]
        input: LookupInput,
        /// Fail instead of printing an empty result when the lookup errors
        #[arg(long)]
        strict: bool,
    },
    /// Print the unique vendors referenced by routing records
    Vendors {
        #[arg(long)]
        routing: PathBuf,
        #[arg(long, value_parser = parse_vendor_type)]
        vendor_type: VendorType,
    },
    /// Write a JSON array of templates as a snapshot
    Pack {
        input: PathBuf,
        out: PathBuf,
    },
}

fn parse_vendor_type(s: &str) -> std::result::Result<VendorType, String> {
    serde_json::from_value(serde_json::Value::String(s.to_uppercase())).map_err(|e| e.to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decoding {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = RuleConfig::from_env();
    if let Some(group) = cli.template_group {
        config = config.with_template_group(group);
    }

    let print_metrics = cli.metrics;
    match cli.cmd {
        Cmd::Filter { input } => {
            let (routing, info) = input.load()?;
            let lookup = ChargeRuleLookup::new(Arc::new(InMemoryStore::new()), config);
            match lookup.build_filter(input.kind(), Some(routing.as_slice()), info.as_ref()) {
                Some(filter) => print_json(&filter)?,
                None => tracing::warn!("routing is empty, no lookup would be issued"),
            }
        }
        Cmd::Lookup {
            templates,
            input,
            strict,
        } => {
            let store = snapshot::load_store(&templates)?;
            let (routing, info) = input.load()?;
            let lookup = ChargeRuleLookup::new(Arc::new(store), config);
            let found = if strict {
                lookup
                    .try_rule_based_charges_for(input.kind(), Some(routing.as_slice()), info.as_ref())
                    .await?
            } else {
                lookup
                    .rule_based_charges_for(input.kind(), Some(routing.as_slice()), info.as_ref())
                    .await
            };
            tracing::info!(matched = found.len(), "lookup complete");
            print_json(&found)?;
        }
        Cmd::Vendors {
            routing,
            vendor_type,
        } => {
            let records: Vec<RoutingRecord> = read_json(&routing)?;
            print_json(&vendors_from_routing(&records, Some(vendor_type)))?;
        }
        Cmd::Pack { input, out } => {
            let templates: Vec<ChargeTemplate> = read_json(&input)?;
            let mut w = snapshot::SnapshotWriter::create(out)?;
            for t in templates.iter() {
                w.write_template(t)?;
            }
            let path = w.path.clone();
            let n = w.finish()?;
            tracing::info!(templates = n, path = %path.display(), "snapshot written");
        }
    }
    if print_metrics {
        eprint!("{}", metrics::render());
    }
    Ok(())
}
