use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use solana_sdk::clock::Slot;
use warden_decoders::DecodedAccount;

use crate::diff::{diff_chars, diff_pretty, AccountDiff, Change};

// -----------------
// AccountSnapshot
// -----------------
/// State of an account observed at a specific slot
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub decoded: Option<Arc<dyn DecodedAccount>>,
    pub data: Vec<u8>,
    pub slot: Slot,
    /// Milliseconds since the unix epoch, increasing within one history
    pub timestamp: u64,
    /// Diff against the previous snapshot, `None` unless both of them were
    /// decoded
    pub account_diff: Option<AccountDiff>,
    pub rendered: Option<String>,
    /// Diff against the previous rendered snapshot, `None` unless both of
    /// them were rendered
    pub rendered_diff: Option<Vec<Change>>,
}

/// The account state as it is sent to relay clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAccountState {
    pub account: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_diff: Option<AccountDiff>,
    pub slot: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_diff: Option<Vec<Change>>,
    pub timestamp: u64,
}

// -----------------
// AccountHistory
// -----------------
/// Append only history of the states of one account
#[derive(Debug, Default)]
pub struct AccountHistory {
    states: Vec<AccountSnapshot>,
}

impl AccountHistory {
    pub fn add(
        &mut self,
        decoded: Option<Arc<dyn DecodedAccount>>,
        data: Vec<u8>,
        slot: Slot,
        rendered: Option<String>,
    ) -> &AccountSnapshot {
        let last = self.states.last();

        let account_diff = match (last.and_then(|x| x.decoded.as_ref()), &decoded)
        {
            (Some(prev), Some(next)) => {
                Some(diff_pretty(&prev.pretty(), &next.pretty()))
            }
            _ => None,
        };
        let rendered_diff = match (last.and_then(|x| x.rendered.as_ref()), &rendered)
        {
            (Some(prev), Some(next)) => Some(diff_chars(prev, next)),
            _ => None,
        };

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|x| x.as_millis() as u64)
            .unwrap_or_default();
        let timestamp = match last {
            Some(last) if last.timestamp >= now => last.timestamp + 1,
            _ => now,
        };

        self.states.push(AccountSnapshot {
            decoded,
            data,
            slot,
            timestamp,
            account_diff,
            rendered,
            rendered_diff,
        });
        &self.states[self.states.len() - 1]
    }

    pub fn states(&self) -> &[AccountSnapshot] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States that could be decoded in the shape relay clients expect
    pub fn relay_states(&self) -> Vec<RelayAccountState> {
        self.states
            .iter()
            .filter_map(|state| {
                state.decoded.as_ref().map(|decoded| RelayAccountState {
                    account: decoded.pretty(),
                    account_diff: state.account_diff.clone(),
                    slot: state.slot,
                    rendered: state.rendered.clone(),
                    rendered_diff: state.rendered_diff.clone(),
                    timestamp: state.timestamp,
                })
            })
            .collect()
    }

    /// First state recorded for the slot
    pub fn state_for_slot(&self, slot: Slot) -> Option<&AccountSnapshot> {
        self.states.iter().find(|state| state.slot == slot)
    }

    pub fn data_for_slot(&self, slot: Slot) -> Option<&[u8]> {
        self.state_for_slot(slot).map(|state| state.data.as_slice())
    }
}
