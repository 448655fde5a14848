use std::{collections::HashMap, fmt, sync::Arc};

use log::*;
use solana_sdk::{account::Account, pubkey::Pubkey};

use crate::{
    token::{TokenAccountDecoder, TokenMintDecoder},
    AccountDecoder, DecodedAccount, DecoderByteSize,
};

/// Renders a decoded account into a human readable string which is diffed
/// char by char between consecutive account states.
pub type AccountRenderer =
    Arc<dyn Fn(&dyn DecodedAccount) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ResolvedAccount {
    pub decoder: String,
    pub decoded: Arc<dyn DecodedAccount>,
    pub rendered: Option<String>,
}

impl fmt::Debug for ResolvedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAccount")
            .field("decoder", &self.decoder)
            .field("decoded", &self.decoded)
            .field("rendered", &self.rendered)
            .finish()
    }
}

// -----------------
// AccountDecoderRegistry
// -----------------
pub struct AccountDecoderRegistry {
    by_byte_size: HashMap<usize, Vec<Arc<dyn AccountDecoder>>>,
    variable_size: Vec<Arc<dyn AccountDecoder>>,
    fallbacks: Vec<Arc<dyn AccountDecoder>>,
    renderers: HashMap<String, AccountRenderer>,
}

impl Default for AccountDecoderRegistry {
    fn default() -> Self {
        Self::new(vec![], HashMap::new())
    }
}

impl AccountDecoderRegistry {
    pub fn new(
        decoders: Vec<Arc<dyn AccountDecoder>>,
        renderers: HashMap<String, AccountRenderer>,
    ) -> Self {
        let mut registry = Self {
            by_byte_size: HashMap::new(),
            variable_size: vec![],
            fallbacks: vec![
                Arc::new(TokenMintDecoder),
                Arc::new(TokenAccountDecoder),
            ],
            renderers,
        };
        for decoder in decoders {
            registry.register(decoder);
        }
        debug!(
            "Registered {} decoders, {} of which have a renderer",
            registry.decoder_count(),
            registry.renderers.len()
        );
        registry
    }

    pub fn register(&mut self, decoder: Arc<dyn AccountDecoder>) {
        match decoder.byte_size() {
            DecoderByteSize::Fixed(size) => {
                self.by_byte_size.entry(size).or_default().push(decoder)
            }
            DecoderByteSize::Variable => self.variable_size.push(decoder),
        }
    }

    pub fn add_renderer(&mut self, decoder: &str, renderer: AccountRenderer) {
        self.renderers.insert(decoder.to_string(), renderer);
    }

    pub fn decoder_count(&self) -> usize {
        self.by_byte_size.values().map(Vec::len).sum::<usize>()
            + self.variable_size.len()
    }

    /// Finds a decoder for the account data and decodes it.
    /// Decoders are tried in this order, the first to succeed wins:
    ///
    /// 1. fixed size decoders registered for the exact data length
    /// 2. variable size decoders in registration order
    /// 3. the builtin token mint and token account decoders
    ///
    /// Accounts without lamports or data as well as executables are never
    /// decoded.
    pub fn resolve(
        &self,
        address: &Pubkey,
        account: &Account,
    ) -> Option<ResolvedAccount> {
        if account.lamports == 0
            || account.executable
            || account.data.is_empty()
        {
            return None;
        }

        let fixed = self
            .by_byte_size
            .get(&account.data.len())
            .map(Vec::as_slice)
            .unwrap_or_default();
        if fixed.is_empty() {
            trace!(
                "No decoder for {} bytes of account {}",
                account.data.len(),
                address
            );
        }

        fixed
            .iter()
            .chain(self.variable_size.iter())
            .chain(self.fallbacks.iter())
            .find_map(|decoder| self.try_resolve(decoder.as_ref(), address, account))
    }

    fn try_resolve(
        &self,
        decoder: &dyn AccountDecoder,
        address: &Pubkey,
        account: &Account,
    ) -> Option<ResolvedAccount> {
        match decoder.try_decode(&account.data) {
            Ok(decoded) => {
                let decoded: Arc<dyn DecodedAccount> = Arc::from(decoded);
                let rendered = self
                    .renderers
                    .get(decoder.name())
                    .map(|render| render(decoded.as_ref()));
                Some(ResolvedAccount {
                    decoder: decoder.name().to_string(),
                    decoded,
                    rendered,
                })
            }
            Err(err) => {
                trace!(
                    "Decoder '{}' rejected account {}: {}",
                    decoder.name(),
                    address,
                    err
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;
    use crate::errors::{DecodersError, DecodersResult};

    #[derive(Debug)]
    struct Counter(u8);

    impl DecodedAccount for Counter {
        fn pretty(&self) -> Map<String, Value> {
            let mut map = Map::new();
            map.insert("count".to_string(), self.0.into());
            map
        }
    }

    struct CounterDecoder {
        name: &'static str,
        size: DecoderByteSize,
        tag: u8,
    }

    impl AccountDecoder for CounterDecoder {
        fn name(&self) -> &str {
            self.name
        }
        fn byte_size(&self) -> DecoderByteSize {
            self.size
        }
        fn try_decode(
            &self,
            data: &[u8],
        ) -> DecodersResult<Box<dyn DecodedAccount>> {
            if data[0] != self.tag {
                return Err(DecodersError::InvalidData("tag".to_string()));
            }
            Ok(Box::new(Counter(data[data.len() - 1])))
        }
    }

    fn account(data: Vec<u8>) -> Account {
        Account {
            lamports: 1_000,
            data,
            ..Account::default()
        }
    }

    fn registry() -> AccountDecoderRegistry {
        let decoders: Vec<Arc<dyn AccountDecoder>> = vec![
            Arc::new(CounterDecoder {
                name: "first",
                size: DecoderByteSize::Fixed(3),
                tag: 1,
            }),
            Arc::new(CounterDecoder {
                name: "second",
                size: DecoderByteSize::Fixed(3),
                tag: 2,
            }),
            Arc::new(CounterDecoder {
                name: "variable",
                size: DecoderByteSize::Variable,
                tag: 3,
            }),
        ];
        let mut renderers: HashMap<String, AccountRenderer> = HashMap::new();
        renderers.insert(
            "second".to_string(),
            Arc::new(|acc: &dyn DecodedAccount| {
                format!("count: {}", acc.pretty()["count"])
            }),
        );
        AccountDecoderRegistry::new(decoders, renderers)
    }

    #[test]
    fn test_resolve_fixed_size_tries_each_candidate() {
        let registry = registry();
        let address = Pubkey::new_unique();

        let first = registry.resolve(&address, &account(vec![1, 0, 7])).unwrap();
        assert_eq!(first.decoder, "first");
        assert_eq!(first.rendered, None);

        let second =
            registry.resolve(&address, &account(vec![2, 0, 9])).unwrap();
        assert_eq!(second.decoder, "second");
        assert_eq!(second.rendered.as_deref(), Some("count: 9"));
    }

    #[test]
    fn test_resolve_falls_back_to_variable_size() {
        let registry = registry();
        let address = Pubkey::new_unique();

        let resolved = registry
            .resolve(&address, &account(vec![3, 0, 0, 0, 5]))
            .unwrap();
        assert_eq!(resolved.decoder, "variable");
        assert_eq!(resolved.decoded.pretty()["count"], 5);

        // Fixed size length but no fixed decoder accepts it
        let resolved =
            registry.resolve(&address, &account(vec![3, 0, 4])).unwrap();
        assert_eq!(resolved.decoder, "variable");
    }

    #[test]
    fn test_resolve_rejects_undecodable_accounts() {
        let registry = registry();
        let address = Pubkey::new_unique();

        let no_lamports = Account {
            lamports: 0,
            ..account(vec![1, 0, 7])
        };
        let executable = Account {
            executable: true,
            ..account(vec![1, 0, 7])
        };
        let no_data = account(vec![]);

        assert!(registry.resolve(&address, &no_lamports).is_none());
        assert!(registry.resolve(&address, &executable).is_none());
        assert!(registry.resolve(&address, &no_data).is_none());
        assert!(registry.resolve(&address, &account(vec![9, 9, 9])).is_none());
    }

    #[test]
    fn test_resolve_unmatched_token_sized_account() {
        let registry = AccountDecoderRegistry::default();
        let address = Pubkey::new_unique();

        // Token account sized, but state byte says uninitialized
        let resolved = registry.resolve(&address, &account(vec![0; 165]));
        assert!(resolved.is_none());
    }
}
