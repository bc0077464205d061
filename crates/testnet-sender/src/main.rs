use anyhow::Context;
use testnet_sender::{create_wallet, send_bitcoin, AppConfig, NodeClient, RpcNodeClient};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    log::debug!("loaded configuration: {config:?}");

    let (key_pair, from) = create_wallet(config.network, &config.wallet_file)?;

    println!("| Public Address | {from} |");
    println!("| Private Key | {} |", &*key_pair.secret_hex());

    let node = RpcNodeClient::new(&config.node)?;

    let txid = send_bitcoin(
        &node,
        &key_pair,
        &from,
        &config.destination,
        config.amount_sat,
        config.network,
    )?;
    println!("Transaction sent successfully! Transaction Hash: {txid}");

    let balance = node.confirmed_balance(&from)?;
    println!("Wallet Balance: {balance}");

    Ok(())
}
