use std::sync::Arc;

use serde_json::{Map, Value};
use warden_decoders::{
    errors::{DecodersError, DecodersResult},
    AccountDecoder, AccountDecoderRegistry, DecodedAccount, DecoderByteSize,
};

pub const COUNTER_TAG: u8 = 7;
pub const COUNTER_DECODER: &str = "Counter";

#[derive(Debug)]
pub struct Counter {
    pub count: u8,
}

impl DecodedAccount for Counter {
    fn pretty(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("count".to_string(), self.count.into());
        map
    }
}

/// Decodes 2 byte accounts whose first byte is [COUNTER_TAG]
pub struct CounterDecoder;

impl AccountDecoder for CounterDecoder {
    fn name(&self) -> &str {
        COUNTER_DECODER
    }

    fn byte_size(&self) -> DecoderByteSize {
        DecoderByteSize::Fixed(2)
    }

    fn try_decode(&self, data: &[u8]) -> DecodersResult<Box<dyn DecodedAccount>> {
        match data {
            [COUNTER_TAG, count] => Ok(Box::new(Counter { count: *count })),
            _ => Err(DecodersError::InvalidData("not a counter".to_string())),
        }
    }
}

pub fn render_counter(account: &dyn DecodedAccount) -> String {
    format!("Counter {{ count: {} }}", account.pretty()["count"])
}

/// Registry with the [CounterDecoder] and its renderer
pub fn counter_registry() -> AccountDecoderRegistry {
    let mut registry = AccountDecoderRegistry::default();
    registry.register(Arc::new(CounterDecoder));
    registry.add_renderer(COUNTER_DECODER, Arc::new(render_counter));
    registry
}
