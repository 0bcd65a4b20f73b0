use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, mpsc};
use std::thread;

use dataset_cache::cache::{
    CacheConfig, CacheKey, CachePartition, CacheStore, CallArg, FULL_REFRESH, InFlightOperations,
    InMemoryCacheStore, InvalidationEngine, RefreshOutcome, generate_key,
};
use dataset_cache::domain::dataset::{Dataset, DatasetIdentity};

const CALLERS: usize = 8;

/// Engine with private refresh slots, so tests in this file do not contend.
fn isolated_engine<V>(
    store: Arc<InMemoryCacheStore<V>>,
) -> Arc<InvalidationEngine<InMemoryCacheStore<V>>>
where
    V: Clone + Send + Sync + 'static,
{
    Arc::new(InvalidationEngine::with_in_flight(
        store,
        CacheConfig::default(),
        InFlightOperations::new(),
    ))
}

#[test]
fn only_one_overlapping_refresh_runs() {
    let store = Arc::new(InMemoryCacheStore::<u8>::new());
    store
        .partition("study-Labs.summary")
        .expect("partition")
        .insert(CacheKey::Empty, 1)
        .expect("insert");
    let engine = isolated_engine(Arc::clone(&store));

    let start = Arc::new(Barrier::new(CALLERS));
    // The winning follow-up blocks until every other caller has been turned away.
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Arc::new(Mutex::new(release_rx));
    let follow_ups = Arc::new(AtomicUsize::new(0));
    let skipped = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let start = Arc::clone(&start);
            let release_rx = Arc::clone(&release_rx);
            let follow_ups = Arc::clone(&follow_ups);
            let skipped = Arc::clone(&skipped);
            let release_tx = release_tx.clone();
            thread::spawn(move || {
                start.wait();
                let outcome = engine
                    .try_full_refresh(|_| {
                        follow_ups.fetch_add(1, Ordering::SeqCst);
                        release_rx
                            .lock()
                            .expect("release lock")
                            .recv()
                            .expect("release signal");
                    })
                    .expect("refresh");
                if matches!(outcome, RefreshOutcome::AlreadyInProgress)
                    && skipped.fetch_add(1, Ordering::SeqCst) + 1 == CALLERS - 1
                {
                    release_tx.send(()).expect("send release");
                }
                outcome
            })
        })
        .collect();
    drop(release_tx);

    let outcomes: Vec<RefreshOutcome<()>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("caller thread"))
        .collect();

    let completed = outcomes.iter().filter(|o| o.is_completed()).count();
    assert_eq!(completed, 1);
    assert_eq!(skipped.load(Ordering::SeqCst), CALLERS - 1);
    assert_eq!(follow_ups.load(Ordering::SeqCst), 1);
    assert!(!engine.in_flight().is_running(FULL_REFRESH));

    let next = engine.try_full_refresh(|_| ()).expect("refresh");
    assert!(next.is_completed());
}

#[test]
fn slot_is_released_when_follow_up_panics() {
    let store = Arc::new(InMemoryCacheStore::<u8>::new());
    let engine = isolated_engine(store);

    let panicking = Arc::clone(&engine);
    let result = thread::spawn(move || {
        let _ = panicking.try_full_refresh::<(), _>(|_| panic!("recompute failed"));
    })
    .join();

    assert!(result.is_err());
    assert!(!engine.in_flight().is_running(FULL_REFRESH));
    assert!(engine.try_full_refresh(|_| ()).expect("refresh").is_completed());
}

#[test]
fn dataset_clears_run_concurrently_with_resolutions() {
    let store = Arc::new(InMemoryCacheStore::<u32>::new());
    let engine = Arc::new(InvalidationEngine::new(
        Arc::clone(&store),
        CacheConfig::default(),
    ));
    let barrier = Arc::new(Barrier::new(2));

    let writer = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let partition = store.partition("study-Labs.summary").expect("partition");
            for id in 0..200 {
                let key = generate_key(&[CallArg::Dataset(Dataset::study(id % 4))]);
                partition.insert(key, 1).expect("insert");
            }
        })
    };

    let clearer = {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                engine
                    .clear_for_dataset(&DatasetIdentity::single(Dataset::study(1)))
                    .expect("clear");
            }
        })
    };

    writer.join().expect("writer");
    clearer.join().expect("clearer");

    engine
        .clear_for_dataset(&DatasetIdentity::single(Dataset::study(1)))
        .expect("final clear");
    let partition = store
        .lookup("study-Labs.summary")
        .expect("lookup")
        .expect("partition");
    let remaining = partition.keys().expect("keys");
    assert!(remaining.iter().all(|key| {
        key.datasets()
            .is_some_and(|datasets| !datasets.contains(Dataset::study(1).id))
    }));
    assert_eq!(remaining.len(), 3);
}

#[test]
fn refresh_is_single_flight_across_engines() {
    let store = Arc::new(InMemoryCacheStore::<u8>::new());
    let first = Arc::new(InvalidationEngine::new(
        Arc::clone(&store),
        CacheConfig::default(),
    ));
    let second = InvalidationEngine::new(Arc::clone(&store), CacheConfig::default());

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let running = {
        let first = Arc::clone(&first);
        thread::spawn(move || {
            first
                .try_full_refresh(move |_| {
                    entered_tx.send(()).expect("signal entry");
                    release_rx.recv().expect("release signal");
                })
                .expect("refresh")
        })
    };

    entered_rx.recv().expect("first refresh running");
    let overlapping = second
        .try_full_refresh::<(), _>(|_| panic!("overlapping refresh must not run"))
        .expect("refresh");
    assert_eq!(overlapping, RefreshOutcome::AlreadyInProgress);

    release_tx.send(()).expect("send release");
    assert!(running.join().expect("first engine").is_completed());
    assert!(second.try_full_refresh(|_| ()).expect("refresh").is_completed());
}
