pub const DEVNET: &str = "https://api.devnet.solana.com";
pub const LOCALHOST: &str = "http://127.0.0.1:8899";

pub const WS_DEVNET: &str = "wss://api.devnet.solana.com/";
pub const WS_LOCALHOST: &str = "ws://127.0.0.1:8900";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RpcCluster {
    Devnet,
    /// The local test validator we supervise
    #[default]
    Localhost,
    Custom(String, String),
}

impl RpcCluster {
    pub fn url(&self) -> &str {
        match self {
            RpcCluster::Devnet => DEVNET,
            RpcCluster::Localhost => LOCALHOST,
            RpcCluster::Custom(url, _) => url,
        }
    }

    pub fn ws_url(&self) -> &str {
        match self {
            RpcCluster::Devnet => WS_DEVNET,
            RpcCluster::Localhost => WS_LOCALHOST,
            RpcCluster::Custom(_, ws_url) => ws_url,
        }
    }

    /// Derives the websocket url the validator serves next to the given
    /// JSON RPC url, i.e. `http://host:8899` -> `ws://host:8900`.
    pub fn from_rpc_url(url: &str) -> Self {
        if url.trim_end_matches('/') == LOCALHOST {
            return Self::Localhost;
        }
        Self::Custom(url.to_string(), ws_url_from_rpc_url(url))
    }
}

fn ws_url_from_rpc_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let ws = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_string()
    };
    // The validator serves pubsub on the port after the RPC port
    match ws.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => format!("{host}:{}", port + 1),
            Err(_) => ws,
        },
        None => ws,
    }
}
