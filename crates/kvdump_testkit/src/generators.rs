//! Property-based test generators using proptest.

use crate::dump::Encoding;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for arbitrary payload bytes, weighted toward bytes that need
/// escaping: NUL, backslash, newline, space and high bytes.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    let byte = prop_oneof![
        4 => any::<u8>(),
        1 => Just(0u8),
        1 => Just(b'\\'),
        1 => Just(b'\n'),
        1 => Just(b' '),
        1 => 0x80u8..=0xff,
    ];
    prop::collection::vec(byte, 0..256)
}

/// Strategy for keys the store accepts (1 to 64 bytes).
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    payload_strategy()
        .prop_map(|mut bytes| {
            bytes.truncate(64);
            bytes
        })
        .prop_filter("keys must not be empty", |bytes| !bytes.is_empty())
}

/// Strategy for up to `max` records with distinct keys, in key order.
pub fn pairs_strategy(max: usize) -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    prop::collection::btree_map(key_strategy(), payload_strategy(), 0..max)
        .prop_map(|map: BTreeMap<Vec<u8>, Vec<u8>>| map.into_iter().collect())
}

/// Strategy for either payload encoding.
pub fn encoding_strategy() -> impl Strategy<Value = Encoding> {
    prop_oneof![Just(Encoding::Print), Just(Encoding::Bytevalue)]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn keys_fit_the_store(key in key_strategy()) {
            prop_assert!(!key.is_empty());
            prop_assert!(key.len() <= 64);
        }

        #[test]
        fn pairs_have_distinct_sorted_keys(pairs in pairs_strategy(20)) {
            prop_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }
}
