use solana_sdk::{pubkey, pubkey::Pubkey};

/// The port the REST transport of the relay listens on
pub const RELAY_PORT: u16 = 50474;

/// The port the websocket transport of the relay listens on
pub const RELAY_PUBSUB_PORT: u16 = 50475;

/// The host the relay binds to
pub const RELAY_HOST: &str = "127.0.0.1";

/// The URI REST clients use to reach the relay
pub const RELAY_URI: &str = "http://127.0.0.1:50474";

/// The URI websocket clients use to reach the relay
pub const RELAY_PUBSUB_URI: &str = "ws://127.0.0.1:50475";

/// The process exit code used when the supervisor is killed via the relay
pub const KILL_EXIT_CODE: i32 = 111;

/// The SPL Token program, owner of the accounts decoded by the built-in
/// fallback decoders
pub const TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
