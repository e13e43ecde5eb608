use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tron_exec::cli::{query, render_error, tx, Cli, Commands};
use tron_exec::config::ExecConfig;
use tron_exec::gateway::HttpGateway;
use tron_exec::{ExecError, KeyStore, TronExecutor};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let (config, source) = ExecConfig::load_or_default(&cli.config);

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.node.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    source.log(&cli.config);

    info!("Node: {}", config.node.url);
    info!("Keystore: {}", config.keystore.dir.display());

    let gateway = match HttpGateway::new(&config.node, &config.transaction) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: cannot create node client: {}", e);
            std::process::exit(2);
        }
    };
    let store = match KeyStore::open(&config.keystore.dir, config.keystore.kdf) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot open keystore: {}", e);
            std::process::exit(2);
        }
    };
    let executor = TronExecutor::new(gateway, store);

    if let Err(e) = run(&executor, &cli).await {
        eprintln!("{}", render_error(&e));
        std::process::exit(1);
    }
}

async fn run(executor: &TronExecutor<HttpGateway>, cli: &Cli) -> Result<(), ExecError> {
    match &cli.command {
        Commands::Resource { address } => query::handle_resource_command(executor, address).await,
        Commands::Delegations { address } => {
            query::handle_delegations_command(executor, address).await
        }
        Commands::Balance { contract, address } => {
            query::handle_balance_command(executor, contract, address).await
        }
        Commands::Allowance {
            contract,
            owner,
            spender,
        } => query::handle_allowance_command(executor, contract, owner, spender).await,
        command => {
            tx::handle_operation(executor, cli.private_key.as_deref(), &cli.passphrase, command)
                .await
        }
    }
}
