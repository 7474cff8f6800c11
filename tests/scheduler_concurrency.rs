// ==============================================
// SCHEDULER + CACHE CONCURRENCY TESTS (integration)
// ==============================================
//
// Several worker threads drive one FrameScheduler the way a host thread
// pool does: slightly out of order, sharing one cache and one upstream.
// These need real threads and cannot live inline.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use framecache::manager::{CacheManager, CacheOptions, MediaKind};
use framecache::policy::adaptive::ConcurrentAdaptiveCache;
use framecache::scheduler::{Activation, FrameScheduler, SchedulerConfig};
use framecache::traits::{FrameIndex, FrameSource};

#[derive(Default)]
struct CountingSource {
    requests: Mutex<Vec<FrameIndex>>,
    produced: AtomicUsize,
}

impl CountingSource {
    fn requests(&self) -> Vec<FrameIndex> {
        self.requests.lock().unwrap().clone()
    }
}

impl FrameSource for CountingSource {
    type Frame = FrameIndex;
    type Error = String;

    fn request_frame(&self, n: FrameIndex) {
        self.requests.lock().unwrap().push(n);
    }

    fn frame(&self, n: FrameIndex) -> Result<Arc<FrameIndex>, String> {
        self.produced.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(n))
    }
}

// ==============================================
// Linearized playback
// ==============================================
//
// A consumer that skips every other frame still makes upstream see a
// strictly sequential stream.

mod linearized_playback {
    use super::*;

    #[test]
    fn stride_two_requests_every_frame_once_in_order() {
        let source = Arc::new(CountingSource::default());
        let scheduler = FrameScheduler::new(
            Arc::clone(&source),
            ConcurrentAdaptiveCache::new(200, 20, false),
            SchedulerConfig::new(true, 4),
        );

        for n in (0..100).step_by(2) {
            assert_eq!(*scheduler.get_frame(n).unwrap(), n);
        }

        let expected: Vec<FrameIndex> = (0..=98).collect();
        assert_eq!(source.requests(), expected);
        assert_eq!(source.produced.load(Ordering::Relaxed), expected.len());

        // the odd frames came along with the batches
        for n in (1..98).step_by(2) {
            assert!(
                matches!(scheduler.initial(n), Activation::Ready(_)),
                "frame {} was not prefetched",
                n
            );
        }
    }

    #[test]
    fn seek_breaks_the_batch() {
        let source = Arc::new(CountingSource::default());
        let scheduler = FrameScheduler::new(
            Arc::clone(&source),
            ConcurrentAdaptiveCache::new(64, 20, false),
            SchedulerConfig::new(true, 2),
        );

        scheduler.get_frame(0).unwrap();
        scheduler.get_frame(500).unwrap();
        scheduler.get_frame(503).unwrap();

        assert_eq!(source.requests(), vec![0, 500, 501, 502, 503]);
    }
}

// ==============================================
// Out-of-order Workers
// ==============================================

mod out_of_order_workers {
    use super::*;

    #[test]
    fn interleaved_workers_receive_their_own_frames() {
        const WORKERS: u32 = 8;
        const FRAMES: u32 = 400;

        let source = Arc::new(CountingSource::default());
        let scheduler = Arc::new(FrameScheduler::new(
            Arc::clone(&source),
            ConcurrentAdaptiveCache::new(30, 20, false),
            SchedulerConfig::new(true, WORKERS),
        ));
        let barrier = Arc::new(Barrier::new(WORKERS as usize));

        let handles: Vec<_> = (0..WORKERS)
            .map(|t| {
                let scheduler = Arc::clone(&scheduler);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for n in (t..FRAMES).step_by(WORKERS as usize) {
                        let frame = scheduler.get_frame(n).unwrap();
                        assert_eq!(*frame, n, "worker {} got the wrong frame", t);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let cache = scheduler.cache();
        assert!(cache.live_len() <= cache.max_frames());
        assert!(cache.ghost_len() <= cache.max_history());
        #[cfg(debug_assertions)]
        cache.with_lock(|c| c.check_invariants()).unwrap();

        // every frame was requested at least once
        let mut seen = source.requests();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), FRAMES as usize);
    }

    #[test]
    fn evicted_frames_stay_valid_for_holders() {
        let source = Arc::new(CountingSource::default());
        let scheduler = Arc::new(FrameScheduler::new(
            Arc::clone(&source),
            ConcurrentAdaptiveCache::new(4, 4, false),
            SchedulerConfig::new(false, 4),
        ));

        let held = scheduler.get_frame(0).unwrap();
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let scheduler = Arc::clone(&scheduler);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for n in 0..50u32 {
                        let _ = scheduler.get_frame(1 + t * 50 + n).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*held, 0);
        assert!(scheduler.cache().peek(&0).is_none());
    }
}

// ==============================================
// Resizing While Serving
// ==============================================
//
// The manager's periodic adjust_all runs on its own thread and must not
// disturb workers holding the same cache.

mod resize_while_serving {
    use super::*;

    #[test]
    fn adjust_all_races_with_workers() {
        let manager = Arc::new(CacheManager::new());
        let node = manager
            .create_node(
                CountingSource::default(),
                MediaKind::Video,
                &CacheOptions::new().linearize(true),
                4,
            )
            .unwrap();
        let scheduler = Arc::new(node.into_scheduler());
        let initial_max = scheduler.cache().max_frames();

        let stop = Arc::new(AtomicBool::new(false));
        let barrier = Arc::new(Barrier::new(5));
        let rounds = Arc::new(AtomicUsize::new(0));

        let resizer = {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            let stop = Arc::clone(&stop);
            let rounds = Arc::clone(&rounds);
            thread::spawn(move || {
                barrier.wait();
                while !stop.load(Ordering::Relaxed) {
                    assert_eq!(manager.adjust_all(false), 1);
                    rounds.fetch_add(1, Ordering::Relaxed);
                    thread::yield_now();
                }
            })
        };

        let workers: Vec<_> = (0..4u32)
            .map(|t| {
                let scheduler = Arc::clone(&scheduler);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for n in (t..2000).step_by(4) {
                        assert_eq!(*scheduler.get_frame(n).unwrap(), n);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        stop.store(true, Ordering::Relaxed);
        resizer.join().unwrap();

        let cache = scheduler.cache();
        let rounds = rounds.load(Ordering::Relaxed);
        // each round grows by at most two
        assert!(cache.max_frames() <= initial_max + 2 * rounds);
        assert!(cache.live_len() <= cache.max_frames());
        #[cfg(debug_assertions)]
        cache.with_lock(|c| c.check_invariants()).unwrap();
    }

    #[test]
    fn dropped_node_is_forgotten() {
        let manager = CacheManager::new();
        let options = CacheOptions::new();
        let nodes: Vec<_> = (0..3)
            .map(|_| {
                manager
                    .create_node(CountingSource::default(), MediaKind::Audio, &options, 1)
                    .unwrap()
            })
            .collect();
        assert_eq!(nodes[2].name(), "AudioCache3");
        assert_eq!(manager.adjust_all(false), 3);

        drop(nodes);
        assert_eq!(manager.adjust_all(false), 0);
        assert_eq!(manager.registered(), 0);
    }
}
