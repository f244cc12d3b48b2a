use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use walletwatch::config::{load_config_from_path, validate_address, CONFIG_FILE_PATH};
use walletwatch::utils::format_amount;
use walletwatch::wallet::{fetch_wallet_holdings, BalanceSource, FetchSettings, HeliusClient};

#[derive(Parser)]
#[command(name = "debug_balances")]
#[command(about = "Fetch and merge the balances of one wallet", long_about = None)]
struct Args {
    /// Wallet address
    wallet: String,

    /// Config file path
    #[arg(long, default_value = CONFIG_FILE_PATH)]
    config: PathBuf,

    /// Also print what each source returned before merging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    validate_address(&args.wallet)?;

    let config = load_config_from_path(&args.config)?;
    let client = HeliusClient::from_config(&config.sources)?;
    let settings = FetchSettings::from(&config.sources);

    println!("Balance Source Debug Tool\n");
    println!("Wallet: {}", args.wallet);
    println!("{}", "=".repeat(80));

    if args.verbose {
        println!("\n[INDEXED ASSETS]\n");
        match client.fetch_indexed(&args.wallet).await {
            Ok(indexed) => {
                println!("total={} native_lamports={}", indexed.total, indexed.native_lamports);
                for asset in &indexed.assets {
                    println!("{} {} {} ({} decimals)", asset.mint, asset.symbol, format_amount(asset.amount), asset.decimals);
                }
            }
            Err(e) => println!("Failed: {}", e),
        }

        println!("\n[RAW TOKEN ACCOUNTS]\n");
        match client.fetch_raw(&args.wallet).await {
            Ok(records) => {
                for record in &records {
                    println!("{} {} ({} decimals)", record.mint, format_amount(record.ui_amount()), record.decimals);
                }
            }
            Err(e) => println!("Failed: {}", e),
        }
        println!("\n{}", "=".repeat(80));
    }

    println!("\n[MERGED HOLDINGS]\n");
    match fetch_wallet_holdings(&client, &args.wallet, &settings).await {
        Ok(holdings) => {
            for (i, h) in holdings.iter().enumerate() {
                println!("{}. {} {} {}", i + 1, h.display_symbol(), format_amount(h.amount), h.mint);
            }
            println!("\n{} holdings", holdings.len());
        }
        Err(e) => println!("Fetch failed: {}", e),
    }

    Ok(())
}
