use std::path::PathBuf;

use p2pkh_tx::BtcNetwork;

use crate::error::AppError;

/// Default recipient of the demonstration payment (a testnet P2PKH address).
pub const DEFAULT_DESTINATION: &str = "mn96nX5NkZfrMmCV7TWQiNKfhgLM6VYQyY";

/// Default payment in satoshis.
pub const DEFAULT_AMOUNT_SAT: u64 = 1_000;

/// Default path of the generated key-material file.
pub const DEFAULT_WALLET_FILE: &str = "wallet.json";

/// Connection settings for the node's JSON-RPC interface.
#[derive(Clone)]
pub struct NodeConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:18332`.
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("rpc_url", &self.rpc_url)
            .field("rpc_user", &self.rpc_user)
            .field("rpc_password", &"<redacted>")
            .finish()
    }
}

/// Everything a single run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub network: BtcNetwork,
    pub destination: String,
    pub amount_sat: u64,
    pub wallet_file: PathBuf,
}

impl AppConfig {
    /// Load from the process environment, after merging a `.env` file from
    /// the working directory if one exists.
    pub fn from_env() -> Result<Self, AppError> {
        check_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// Required: `RPC_HOST`, `RPC_USER`, `RPC_PASSWORD`. Optional:
    /// `BTC_NETWORK`, `DESTINATION_ADDRESS`, `SEND_AMOUNT_SAT`, `WALLET_FILE`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} environment variable not set")))
        };

        let network = match lookup("BTC_NETWORK") {
            Some(name) => name.parse::<BtcNetwork>()?,
            None => BtcNetwork::Testnet,
        };

        let rpc_url = rpc_url_from_host(&required("RPC_HOST")?, network);
        let rpc_user = required("RPC_USER")?;
        let rpc_password = required("RPC_PASSWORD")?;

        let amount_sat = match lookup("SEND_AMOUNT_SAT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::Config(format!("invalid SEND_AMOUNT_SAT '{raw}': {e}")))?,
            None => DEFAULT_AMOUNT_SAT,
        };

        Ok(Self {
            node: NodeConfig {
                rpc_url,
                rpc_user,
                rpc_password,
            },
            network,
            destination: lookup("DESTINATION_ADDRESS")
                .unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
            amount_sat,
            wallet_file: lookup("WALLET_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WALLET_FILE)),
        })
    }
}

/// An absent `.env` file is fine; one that exists but cannot be read or
/// parsed aborts the run.
fn check_dotenv<T: std::fmt::Debug>(
    result: Result<T, dotenvy::Error>,
) -> Result<(), AppError> {
    match result {
        Ok(loaded) => {
            log::debug!("loaded .env from {loaded:?}");
            Ok(())
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no .env file found");
            Ok(())
        }
        Err(e) => Err(AppError::Config(format!("failed to load .env file: {e}"))),
    }
}

/// Plain HTTP (no TLS): `host` gains an `http://` scheme and, when it has
/// no port, the network's default RPC port. IPv6 literals may be given bare
/// (`::1`) or bracketed (`[::1]`, `[::1]:18332`).
fn rpc_url_from_host(host: &str, network: BtcNetwork) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        return host.to_string();
    }
    let port = network.default_rpc_port();

    if host.starts_with('[') {
        if host.contains("]:") {
            format!("http://{host}")
        } else {
            format!("http://{host}:{port}")
        }
    } else {
        match host.matches(':').count() {
            0 => format!("http://{host}:{port}"),
            1 => format!("http://{host}"),
            _ => format!("http://[{host}]:{port}"),
        }
    }
}
