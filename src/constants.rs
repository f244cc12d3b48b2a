/// Global constants used across walletwatch
///
/// System-wide values that are not configurable.

// ============================================================================
// SOLANA CONSTANTS
// ============================================================================

/// SOL token mint address (wrapped SOL / WSOL), used for the native balance entry
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Number of decimal places for SOL token
pub const SOL_DECIMALS: u8 = 9;

/// Lamports per SOL (10^9)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// USDC mint, the quote currency for every price lookup
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// SPL token program owning the token accounts we enumerate
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

// ============================================================================
// METADATA SENTINELS
// ============================================================================

/// Symbol assigned to tokens only the raw enumeration source knows about
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Name assigned to tokens only the raw enumeration source knows about
pub const UNKNOWN_NAME: &str = "Unknown Token";

// ============================================================================
// UPSTREAM ENDPOINTS
// ============================================================================

/// Default price oracle endpoint
pub const JUPITER_PRICE_ENDPOINT: &str = "https://api.jup.ag/price/v2";

/// CSV header written once per report file
pub const CSV_HEADER: [&str; 5] = ["mint", "price", "value", "changeRate", "timestamp"];
