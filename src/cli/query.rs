use crate::address::Address;
use crate::error::ExecError;
use crate::executor::TronExecutor;
use crate::gateway::NodeGateway;

pub async fn handle_resource_command<G: NodeGateway>(
    executor: &TronExecutor<G>,
    address: &Address,
) -> Result<(), ExecError> {
    let snapshot = executor.resource(address).await?;
    println!("Address:   {}", address);
    println!("Bandwidth: {}", snapshot.bandwidth_available);
    println!("Energy:    {}", snapshot.energy_available);
    if snapshot.bandwidth_available < 0 || snapshot.energy_available < 0 {
        println!("(negative values are node lag; treat as 0 available)");
    }
    Ok(())
}

pub async fn handle_delegations_command<G: NodeGateway>(
    executor: &TronExecutor<G>,
    address: &Address,
) -> Result<(), ExecError> {
    let records = executor.delegations(address).await?;
    if records.is_empty() {
        println!("No delegations from {}", address);
        return Ok(());
    }
    for r in &records {
        println!(
            "{} -> {}  bandwidth {} TRX (until {})  energy {} TRX (until {})",
            r.from,
            r.to,
            r.frozen_for_bandwidth,
            r.bandwidth_expiry.to_rfc3339(),
            r.frozen_for_energy,
            r.energy_expiry.to_rfc3339(),
        );
    }
    Ok(())
}

pub async fn handle_balance_command<G: NodeGateway>(
    executor: &TronExecutor<G>,
    contract: &Address,
    address: &Address,
) -> Result<(), ExecError> {
    let balance = executor.token_balance(contract, address).await?;
    println!("{}", balance);
    Ok(())
}

pub async fn handle_allowance_command<G: NodeGateway>(
    executor: &TronExecutor<G>,
    contract: &Address,
    owner: &Address,
    spender: &Address,
) -> Result<(), ExecError> {
    let allowance = executor.token_allowance(contract, owner, spender).await?;
    println!("{}", allowance);
    Ok(())
}
