//! Single-run testnet payment: generate a P2PKH key, spend its confirmed
//! outputs to a destination through a Bitcoin Core node, report the balance.

pub mod config;
pub mod error;
pub mod key_store;
pub mod node;
pub mod send;

pub use config::{AppConfig, NodeConfig};
pub use error::AppError;
pub use key_store::KeyRecord;
pub use node::{NodeClient, RpcNodeClient};
pub use send::{create_wallet, send_bitcoin};
