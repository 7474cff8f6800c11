#![no_main]

use std::sync::Arc;

use framecache::policy::adaptive::{AdaptiveCache, Lookup};
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on AdaptiveCache
//
// Interleaves lookups, inserts, removals, trims and resizes to find
// sequences that break the live/ghost split.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // Capacities 0-31 each
    let max_frames = (data[0] as usize) % 32;
    let max_history = (data[1] as usize) % 32;
    let mut cache: AdaptiveCache<u32, u32> = AdaptiveCache::new(max_frames, max_history, false);

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 8;
        let key = u32::from(data[idx + 1] % 64);

        match op {
            0 | 1 => {
                cache.insert(key, Arc::new(key));
            }
            2 | 3 => {
                if let Lookup::Hit(v) = cache.lookup(&key) {
                    assert_eq!(*v, key);
                }
            }
            4 => {
                let existed = cache.contains(&key);
                assert_eq!(cache.remove(&key), existed);
                assert!(!cache.contains(&key));
            }
            5 => {
                let frames = (data[idx + 1] as usize) % 32;
                cache.trim(frames, frames / 2);
                assert!(cache.live_len() <= frames);
            }
            6 => {
                let _ = cache.adjust_size(data[idx + 1] & 1 == 1);
            }
            7 => {
                cache.clear();
                assert!(cache.is_empty());
            }
            _ => unreachable!(),
        }

        assert!(cache.live_len() <= cache.max_frames());
        assert!(cache.ghost_len() <= cache.max_history());
        assert_eq!(cache.len(), cache.live_len() + cache.ghost_len());
        cache.check_invariants().unwrap();

        idx += 2;
    }
});
