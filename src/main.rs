use cartax::application::aggregator::CartAggregator;
use cartax::domain::ports::ReferenceDataBox;
use cartax::domain::product::{Cart, DeliveryLocation};
use cartax::domain::tax::GeoContext;
use cartax::infrastructure::in_memory::InMemoryReferenceData;
use cartax::interfaces::csv::cart_reader::CartReader;
use chrono::NaiveDate;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Reference data fixture (JSON)
    fixtures: PathBuf,

    /// Cart CSV file with `sku,quantity` rows
    cart: PathBuf,

    /// Selling-channel identifier; omit to evaluate without channel context
    #[arg(long)]
    channel: Option<String>,

    /// Delivery country
    #[arg(long)]
    country: String,

    /// Delivery state/province
    #[arg(long, default_value = "")]
    state: String,

    /// Delivery postal code
    #[arg(long, default_value = "")]
    pincode: String,

    /// Tenant (seller) country
    #[arg(long)]
    tenant_country: String,

    /// Tenant (seller) state/province
    #[arg(long, default_value = "")]
    tenant_state: String,

    /// Evaluation date for tax-rule effective windows (defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let fixture_file = File::open(&cli.fixtures).into_diagnostic()?;
    let port: ReferenceDataBox =
        Box::new(InMemoryReferenceData::from_json_reader(fixture_file).into_diagnostic()?);

    let cart_file = File::open(&cli.cart).into_diagnostic()?;
    let mut cart: Cart = Vec::new();
    for item in CartReader::new(cart_file).items() {
        match item {
            Ok(item) => cart.push(item),
            Err(e) => {
                eprintln!("Error reading cart item: {}", e);
            }
        }
    }

    let aggregator = match cli.as_of {
        Some(as_of) => CartAggregator::with_as_of(port, as_of),
        None => CartAggregator::new(port),
    };

    let location = DeliveryLocation {
        country: cli.country.clone(),
        state: cli.state.clone(),
        pincode: cli.pincode,
    };
    let geo = GeoContext {
        tenant_country: cli.tenant_country,
        tenant_state: cli.tenant_state,
        delivery_country: cli.country,
        delivery_state: cli.state,
    };

    let breakdown = aggregator
        .aggregate(&cart, &location, cli.channel.as_deref(), &geo)
        .await
        .into_diagnostic()?;

    println!(
        "{}",
        serde_json::to_string_pretty(&breakdown).into_diagnostic()?
    );

    Ok(())
}
