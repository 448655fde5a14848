pub mod account_provider_stub;
pub mod accounts;
pub mod decoders;
pub mod relay;
pub mod transaction_provider_stub;
pub mod validator_controller_stub;
