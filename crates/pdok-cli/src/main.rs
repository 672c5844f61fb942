mod spider;

use std::path::PathBuf;

use clap::Parser;
use pdok_catalog::{OutputLayout, WriteOptions};
use pdok_core::Protocol;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::spider::SpiderOptions;

#[derive(Debug, Parser)]
#[command(name = "pdok-spider")]
#[command(about = "Harvest the PDOK service catalog into a JSON layer list")]
struct Cli {
    /// Path of the JSON catalog to write.
    output: PathBuf,

    /// Maximum catalog records per protocol (0 = all).
    #[arg(short = 'n', long = "number", default_value_t = 0)]
    number: usize,

    /// Harvest a single service by its metadata identifier instead of
    /// querying the catalog per protocol.
    #[arg(short = 'i', long = "id")]
    id: Option<String>,

    /// Comma-separated protocols to query (default: wms,wfs,wcs,wmts).
    #[arg(short = 'p', long = "protocols", value_delimiter = ',')]
    protocols: Vec<Protocol>,

    /// Order entries by the layer-priority rules.
    #[arg(long)]
    sort: bool,

    /// YAML file replacing the built-in priority rules.
    #[arg(long, value_name = "PATH", requires = "sort")]
    sort_rules: Option<PathBuf>,

    /// Pretty-print the output with a four-space indent.
    #[arg(long)]
    pretty: bool,

    /// Wrap the entries in `{"services": [...]}`.
    #[arg(long)]
    services_object: bool,

    /// Show recoverable capabilities-document warnings.
    #[arg(long)]
    warnings: bool,
}

impl Cli {
    fn into_options(self) -> SpiderOptions {
        let mut protocols: Vec<Protocol> = Vec::with_capacity(Protocol::ALL.len());
        for protocol in self.protocols {
            if !protocols.contains(&protocol) {
                protocols.push(protocol);
            }
        }
        if protocols.is_empty() {
            protocols = Protocol::ALL.to_vec();
        }

        SpiderOptions {
            output: self.output,
            max_records: self.number,
            md_id: self.id,
            protocols,
            sort: self.sort,
            sort_rules: self.sort_rules,
            write: WriteOptions {
                pretty: self.pretty,
                layout: if self.services_object {
                    OutputLayout::ServicesObject
                } else {
                    OutputLayout::Array
                },
            },
        }
    }
}

fn init_tracing(log_level: &str, warnings: bool) -> anyhow::Result<()> {
    let mut env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    if !warnings {
        let quirks_off: Directive = format!("{}=off", pdok_harvest::QUIRKS_TARGET).parse()?;
        env_filter = env_filter.add_directive(quirks_off);
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = pdok_core::load_app_config()?;
    init_tracing(&config.log_level, cli.warnings)?;

    spider::run_spider(&config, &cli.into_options()).await?;
    Ok(())
}
