mod account_history;
mod account_states;
pub mod diff;
mod events;

pub use account_history::*;
pub use account_states::*;
pub use events::*;
