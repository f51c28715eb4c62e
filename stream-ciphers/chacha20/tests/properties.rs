use c2_chacha20::{Backend, ChaCha20, BLOCK_SIZE, KEY_SIZE};
use proptest::prelude::*;

fn nonce_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 8),
        prop::collection::vec(any::<u8>(), 12),
        prop::collection::vec(any::<u8>(), 24),
    ]
}

fn cipher(key: &[u8; KEY_SIZE], nonce: &[u8], backend: Backend, block: u64) -> ChaCha20 {
    let mut c = ChaCha20::with_backend(key, nonce, backend).unwrap();
    c.seek(block).unwrap();
    c
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn incremental_equivalence(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in nonce_strategy(),
        block in 0u64..1 << 20,
        skip in 0usize..200,
        splits in prop::collection::vec(0usize..300, 0..12),
    ) {
        let total: usize = splits.iter().sum();

        let mut whole = cipher(&key, &nonce, Backend::active(), block);
        whole.key_stream(&mut vec![0u8; skip]);
        let mut expected = vec![0u8; total];
        whole.key_stream(&mut expected);

        let mut pieces = cipher(&key, &nonce, Backend::active(), block);
        pieces.key_stream(&mut vec![0u8; skip]);
        let mut out = vec![0u8; total];
        let mut pos = 0;
        for len in splits {
            pieces.key_stream(&mut out[pos..pos + len]);
            pos += len;
        }
        prop_assert_eq!(out, expected);
        prop_assert_eq!(pieces.block_counter(), whole.block_counter());
    }

    #[test]
    fn xor_in_place_matches_key_stream(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in nonce_strategy(),
        msg in prop::collection::vec(any::<u8>(), 0..700),
        split in 0usize..700,
    ) {
        let split = split.min(msg.len());
        let mut ks = vec![0u8; msg.len()];
        cipher(&key, &nonce, Backend::active(), 0).key_stream(&mut ks);

        let mut c = cipher(&key, &nonce, Backend::active(), 0);
        let mut buf = msg.clone();
        c.apply_key_stream(&mut buf[..split]);
        let mut dst = vec![0u8; msg.len() - split];
        c.xor_key_stream(&mut dst, &msg[split..]).unwrap();
        buf[split..].copy_from_slice(&dst);

        for i in 0..msg.len() {
            prop_assert_eq!(buf[i], msg[i] ^ ks[i]);
        }
    }

    #[test]
    fn round_trip(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in nonce_strategy(),
        block in any::<u32>(),
        msg in prop::collection::vec(any::<u8>(), 0..500),
    ) {
        // stay clear of the end of the 32-bit counter
        let block = u64::from(block) / 2;
        let mut c = cipher(&key, &nonce, Backend::active(), block);
        let mut buf = msg.clone();
        c.apply_key_stream(&mut buf);
        c.seek(block).unwrap();
        c.apply_key_stream(&mut buf);
        prop_assert_eq!(buf, msg);
    }

    #[test]
    fn seek_is_deterministic(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in nonce_strategy(),
        history in prop::collection::vec((0u64..1 << 16, 0usize..300), 0..6),
        block in 0u64..1 << 16,
        len in 0usize..400,
    ) {
        let mut fresh = cipher(&key, &nonce, Backend::active(), block);
        let mut expected = vec![0u8; len];
        fresh.key_stream(&mut expected);

        let mut c = ChaCha20::new(&key, &nonce).unwrap();
        for (b, l) in history {
            c.seek(b).unwrap();
            c.key_stream(&mut vec![0u8; l]);
        }
        c.seek(block).unwrap();
        let mut out = vec![0u8; len];
        c.key_stream(&mut out);
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn backends_are_interchangeable(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in nonce_strategy(),
        block in any::<u32>(),
        len in 0usize..(8 * BLOCK_SIZE + 17),
    ) {
        let block = u64::from(block).saturating_sub(16);
        let mut expected = vec![0u8; len];
        cipher(&key, &nonce, Backend::portable(), block).key_stream(&mut expected);
        for backend in Backend::available() {
            let mut out = vec![0u8; len];
            cipher(&key, &nonce, backend, block).key_stream(&mut out);
            prop_assert_eq!(&out, &expected, "{}", backend.name());
        }
    }
}
