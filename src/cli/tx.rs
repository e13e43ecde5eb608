use tracing::info;

use super::Commands;
use crate::crypto;
use crate::error::ExecError;
use crate::executor::TronExecutor;
use crate::gateway::{NodeGateway, Operation};

/// Turn a transaction subcommand into an [`Operation`].
///
/// `None` for read-only commands. Freeze and unfreeze credit the signer when
/// no receiver is given, which needs the key to know who that is.
pub fn operation_for(
    command: &Commands,
    private_key_hex: &str,
) -> Result<Option<Operation>, ExecError> {
    let op = match command {
        Commands::Approve {
            contract,
            spender,
            amount,
        } => Operation::Approve {
            contract: *contract,
            spender: *spender,
            amount: amount.clone(),
        },
        Commands::TransferFrom {
            contract,
            from,
            to,
            amount,
        } => Operation::TransferFrom {
            contract: *contract,
            from: *from,
            to: *to,
            amount: amount.clone(),
        },
        Commands::Burn { contract, amount } => Operation::Burn {
            contract: *contract,
            amount: amount.clone(),
        },
        Commands::Freeze {
            receiver,
            resource,
            amount,
        } => Operation::Freeze {
            receiver: receiver_or_signer(*receiver, private_key_hex)?,
            resource: *resource,
            amount: *amount,
        },
        Commands::Unfreeze { receiver, resource } => Operation::Unfreeze {
            receiver: receiver_or_signer(*receiver, private_key_hex)?,
            resource: *resource,
        },
        Commands::Resource { .. }
        | Commands::Delegations { .. }
        | Commands::Balance { .. }
        | Commands::Allowance { .. } => return Ok(None),
    };
    Ok(Some(op))
}

fn receiver_or_signer(
    receiver: Option<crate::address::Address>,
    private_key_hex: &str,
) -> Result<crate::address::Address, ExecError> {
    match receiver {
        Some(r) => Ok(r),
        None => crypto::address_from_private_key_hex(private_key_hex).map_err(ExecError::KeyFormat),
    }
}

pub async fn handle_operation<G: NodeGateway>(
    executor: &TronExecutor<G>,
    private_key: Option<&str>,
    passphrase: &str,
    command: &Commands,
) -> Result<(), ExecError> {
    let private_key = private_key.ok_or_else(|| {
        ExecError::KeyFormat("no private key (use --private-key or TRON_PRIVATE_KEY)".into())
    })?;
    let Some(operation) = operation_for(command, private_key)? else {
        return Ok(());
    };

    info!(operation = operation.name(), "executing");
    let txid = executor.execute(private_key, passphrase, operation).await?;
    println!("{}", txid);
    Ok(())
}
