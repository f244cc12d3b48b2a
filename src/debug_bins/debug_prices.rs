use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use walletwatch::config::{load_config_from_path, CONFIG_FILE_PATH};
use walletwatch::pricing::{validate_quote, JupiterPriceClient, PriceOracle, PriceService};

#[derive(Parser)]
#[command(name = "debug_prices")]
#[command(about = "Query the price oracle for a list of mints", long_about = None)]
struct Args {
    /// Mint addresses to price
    #[arg(required = true)]
    mints: Vec<String>,

    /// Config file path
    #[arg(long, default_value = CONFIG_FILE_PATH)]
    config: PathBuf,

    /// Show raw quotes and why any were rejected
    #[arg(short, long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = load_config_from_path(&args.config)?;

    println!("Price Oracle Debug Tool\n");
    println!("Endpoint: {}", config.pricing.endpoint);
    println!("{}", "=".repeat(80));

    let client = Arc::new(JupiterPriceClient::new(&config.pricing)?);

    if args.raw {
        println!("\n[RAW QUOTES]\n");
        let raw = client.fetch_batch(&args.mints).await?;
        let now = Utc::now();
        for mint in &args.mints {
            match raw.get(mint) {
                Some(quote) => {
                    let verdict = match validate_quote(mint, quote, &config.pricing, client.source(), now) {
                        Ok(_) => "accepted".to_string(),
                        Err(reason) => format!("rejected: {}", reason),
                    };
                    println!("{} price={} confidence={} ({})", mint, quote.price, quote.confidence, verdict);
                }
                None => println!("{} no quote", mint),
            }
        }
        println!("\n{}", "=".repeat(80));
    }

    println!("\n[VALIDATED PRICES]\n");
    let service = PriceService::new(client, &config.pricing);
    match service.get_prices(&args.mints).await {
        Ok(quotes) => {
            for mint in &args.mints {
                match quotes.get(mint) {
                    Some(q) => println!("{} ${} ({})", mint, q.price, q.confidence),
                    None => println!("{} -", mint),
                }
            }
            println!("\n{}/{} mints priced", quotes.len(), args.mints.len());
        }
        Err(e) => println!("Price lookup failed: {}", e),
    }

    Ok(())
}
