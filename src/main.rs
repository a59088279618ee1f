//! Generates a root CA and the service certificates for one application domain.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use devpki::bundle::generate_bundle;
use devpki::config::{
    CA_COMMON_NAME, DEFAULT_OUTPUT_DIR, MAX_VALIDITY_DAYS, PkiConfig, SerialNumberPolicy,
    VALIDITY_DAYS,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "devpki")]
#[command(about = "Generate a throwaway root CA and service certificates", long_about = None)]
struct Args {
    /// Application domain put in the subjectAltName of api, remote-console and ui
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    domain: String,

    /// Directory the PEM files are written into
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    out_dir: PathBuf,

    /// Common name of the root CA
    #[arg(long, default_value = CA_COMMON_NAME)]
    ca_name: String,

    /// Lifetime of every certificate, in days
    #[arg(
        long,
        default_value_t = VALIDITY_DAYS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_VALIDITY_DAYS),
    )]
    validity_days: i64,

    /// Give every certificate a random serial number instead of 0
    #[arg(long)]
    random_serials: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = PkiConfig::builder()
        .ca_common_name(args.ca_name)
        .validity(time::Duration::days(args.validity_days))
        .serial_numbers(if args.random_serials {
            SerialNumberPolicy::Random
        } else {
            SerialNumberPolicy::Zero
        })
        .build();
    config.validate().context("invalid certificate parameters")?;

    let bundle = generate_bundle(&config, &args.domain)
        .with_context(|| format!("generating certificates for {}", args.domain))?;
    let written = bundle
        .write_to(&args.out_dir)
        .with_context(|| format!("writing certificates to {}", args.out_dir.display()))?;

    info!(
        files = written.len(),
        dir = %args.out_dir.display(),
        "certificates ready"
    );
    Ok(())
}
