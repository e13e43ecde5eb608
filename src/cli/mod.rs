pub mod query;
pub mod tx;

use clap::{Parser, Subcommand};
use num_bigint::BigUint;

use crate::address::Address;
use crate::error::ExecError;
use crate::gateway::Resource;

#[derive(Parser)]
#[command(name = "tron-exec")]
#[command(about = "Sign and broadcast TRON transactions", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "tron-exec.toml")]
    pub config: String,

    /// Hex private key of the signing account
    #[arg(long, global = true, env = "TRON_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Keystore passphrase (empty means none)
    #[arg(long, global = true, default_value = "")]
    pub passphrase: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Approve a spender on a TRC20 contract
    Approve {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        spender: Address,
        /// Raw token units
        #[arg(long)]
        amount: BigUint,
    },
    /// Spend an allowance: move tokens from one account to another
    TransferFrom {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        from: Address,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: BigUint,
    },
    /// Burn TRC20 tokens held by the signer
    Burn {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        amount: BigUint,
    },
    /// Stake TRX for bandwidth or energy
    Freeze {
        /// Account credited with the resource (defaults to the signer)
        #[arg(long)]
        receiver: Option<Address>,
        #[arg(long, default_value = "energy")]
        resource: Resource,
        /// Amount in sun
        #[arg(long)]
        amount: u64,
    },
    /// Release staked TRX
    Unfreeze {
        #[arg(long)]
        receiver: Option<Address>,
        #[arg(long, default_value = "energy")]
        resource: Resource,
    },
    /// Show available bandwidth and energy
    Resource { address: Address },
    /// List resource delegations made by an account
    Delegations { address: Address },
    /// TRC20 balance of an account, in raw token units
    Balance {
        #[arg(long)]
        contract: Address,
        address: Address,
    },
    /// Remaining TRC20 allowance granted by OWNER to SPENDER
    Allowance {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        spender: Address,
    },
}

/// One-line failure report for the terminal.
///
/// Every [`ExecError`] message already carries its cause, so the source
/// chain is not walked again.
pub fn render_error(err: &ExecError) -> String {
    format!("Error [{}]: {}", err.kind(), err)
}
