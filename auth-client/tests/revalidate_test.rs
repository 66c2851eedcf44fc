mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use auth_client::{AuthApi, RevalidationDriver, SessionStore};
use common::{spawn_fixture_backend, FixtureFlags};

async fn authenticated_store(flags: &Arc<FixtureFlags>) -> SessionStore {
    flags.validate_ok.store(true, Ordering::SeqCst);
    let base = spawn_fixture_backend(flags.clone()).await;
    let store = SessionStore::spawn(AuthApi::new(base).expect("Failed to build client"));
    store.login("admin", "admin123").await.expect("login failed");
    store
}

#[tokio::test]
async fn periodic_tick_revalidates_while_authenticated() {
    let flags = Arc::new(FixtureFlags::default());
    let store = authenticated_store(&flags).await;

    let driver = RevalidationDriver::start(store, Duration::from_millis(25));
    tokio::time::sleep(Duration::from_millis(300)).await;
    driver.stop();

    assert!(
        flags.validate_hits.load(Ordering::SeqCst) >= 2,
        "expected repeated background validation"
    );
}

#[tokio::test]
async fn no_revalidation_without_authentication() {
    let flags = Arc::new(FixtureFlags::default());
    let base = spawn_fixture_backend(flags.clone()).await;
    let store = SessionStore::spawn(AuthApi::new(base).expect("Failed to build client"));

    let driver = RevalidationDriver::start(store, Duration::from_millis(25));
    tokio::time::sleep(Duration::from_millis(200)).await;
    driver.stop();

    assert_eq!(flags.validate_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn visibility_signal_triggers_a_revalidation() {
    let flags = Arc::new(FixtureFlags::default());
    let store = authenticated_store(&flags).await;

    // Interval far beyond the test horizon: only the signal can fire.
    let driver = RevalidationDriver::start(store, Duration::from_secs(3600));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(flags.validate_hits.load(Ordering::SeqCst), 0);

    driver.notify_visible();
    tokio::time::sleep(Duration::from_millis(200)).await;
    driver.stop();

    assert_eq!(flags.validate_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_tears_the_timer_down() {
    let flags = Arc::new(FixtureFlags::default());
    let store = authenticated_store(&flags).await;

    let driver = RevalidationDriver::start(store, Duration::from_millis(25));
    tokio::time::sleep(Duration::from_millis(150)).await;
    driver.stop();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_stop = flags.validate_hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        flags.validate_hits.load(Ordering::SeqCst),
        after_stop,
        "no periodic work may leak past teardown"
    );
}

#[tokio::test]
async fn dropping_the_driver_also_tears_down() {
    let flags = Arc::new(FixtureFlags::default());
    let store = authenticated_store(&flags).await;

    {
        let _driver = RevalidationDriver::start(store, Duration::from_millis(25));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_drop = flags.validate_hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(flags.validate_hits.load(Ordering::SeqCst), after_drop);
}
