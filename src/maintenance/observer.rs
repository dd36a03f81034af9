//! Mode Observer: mirrors the maintenance document into local state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::config::{resolve_document, MaintenanceConfig, MaintenanceMode};
use super::store::ConfigStore;

/// Snapshot exposed by the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedState {
    pub config: MaintenanceConfig,
    /// True until the first snapshot (or error) arrives.
    pub loading: bool,
}

impl Default for ObservedState {
    fn default() -> Self {
        Self {
            config: MaintenanceConfig::default(),
            loading: true,
        }
    }
}

/// Lifecycle-scoped subscription to a [`ConfigStore`].
///
/// Created with [`MaintenanceObserver::activate`]; the subscription lives
/// until the observer is closed or dropped. A subscription error reverts the
/// state to the default (disabled) config, then the observer re-subscribes
/// with an exponential backoff so enforcement resumes once the store
/// recovers.
pub struct MaintenanceObserver {
    rx: watch::Receiver<ObservedState>,
    task: JoinHandle<()>,
}

impl MaintenanceObserver {
    /// Open the subscription. Must be called inside a tokio runtime.
    pub fn activate<S: ConfigStore>(store: Arc<S>) -> Self {
        let (tx, rx) = watch::channel(ObservedState::default());
        let task = tokio::spawn(observe(store, tx));
        Self { rx, task }
    }

    /// Current state.
    pub fn current(&self) -> ObservedState {
        self.rx.borrow().clone()
    }

    pub fn config(&self) -> MaintenanceConfig {
        self.rx.borrow().config.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.rx.borrow().config.enabled
    }

    pub fn message(&self) -> String {
        self.rx.borrow().config.message.clone()
    }

    pub fn mode(&self) -> MaintenanceMode {
        self.rx.borrow().config.mode
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    /// A receiver for push-style consumers.
    pub fn watch(&self) -> watch::Receiver<ObservedState> {
        self.rx.clone()
    }

    /// Wait for the next state change.
    ///
    /// Returns false once the subscription has ended.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until the first snapshot has been applied.
    pub async fn loaded(&mut self) -> MaintenanceConfig {
        // An ended subscription leaves its last state behind.
        let _ = self.rx.wait_for(|state| !state.loading).await;
        self.rx.borrow().config.clone()
    }

    /// Cancel the subscription. No further updates are applied.
    pub fn close(self) {}

    /// Whether the subscription task has stopped.
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MaintenanceObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// First wait before re-subscribing after an error.
const RETRY_INITIAL: Duration = Duration::from_millis(250);
/// Upper bound of the re-subscribe backoff.
const RETRY_MAX: Duration = Duration::from_secs(30);

async fn observe<S: ConfigStore>(store: Arc<S>, tx: watch::Sender<ObservedState>) {
    let mut delay = RETRY_INITIAL;
    loop {
        match follow(&*store, &tx, &mut delay).await {
            Ok(()) => {
                debug!("Maintenance subscription ended");
                return;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Maintenance subscription failed, assuming maintenance is off"
                );
                fall_back(&tx);
            }
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(RETRY_MAX);
        if tx.is_closed() {
            return;
        }
    }
}

/// Apply events until the store goes away (`Ok`) or reports an error.
/// A successful subscribe resets the backoff.
async fn follow<S: ConfigStore>(
    store: &S,
    tx: &watch::Sender<ObservedState>,
    delay: &mut Duration,
) -> std::result::Result<(), String> {
    let mut subscription = store.subscribe().await.map_err(|e| e.to_string())?;
    *delay = RETRY_INITIAL;

    while let Some(event) = subscription.next().await {
        let config = resolve_document(event?);
        debug!(
            enabled = config.enabled,
            mode = %config.mode,
            "Maintenance config updated"
        );
        tx.send_replace(ObservedState {
            config,
            loading: false,
        });
    }
    Ok(())
}

fn fall_back(tx: &watch::Sender<ObservedState>) {
    tx.send_replace(ObservedState {
        config: MaintenanceConfig::default(),
        loading: false,
    });
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::maintenance::config::PartialMaintenanceConfig;
    use crate::maintenance::store::test_support::FlakyStore;
    use crate::maintenance::store::ConfigStore;

    fn doc(enabled: bool, mode: &str, message: Option<&str>) -> PartialMaintenanceConfig {
        PartialMaintenanceConfig {
            enabled: Some(enabled),
            message: message.map(str::to_string),
            mode: Some(mode.to_string()),
            last_updated: None,
        }
    }

    #[tokio::test]
    async fn test_starts_loading_then_applies_snapshot() {
        let store = Arc::new(FlakyStore::new(Some(doc(true, "global", Some("Back soon")))));
        let mut observer = MaintenanceObserver::activate(store);

        let config = observer.loaded().await;
        assert!(config.enabled);
        assert_eq!(config.message, "Back soon");
        assert!(observer.is_enabled());
        assert_eq!(observer.mode(), MaintenanceMode::Global);
        assert!(!observer.is_loading());
    }

    #[tokio::test]
    async fn test_missing_document_is_default() {
        let store = Arc::new(FlakyStore::new(None));
        let mut observer = MaintenanceObserver::activate(store);

        assert_eq!(observer.loaded().await, MaintenanceConfig::default());
    }

    #[tokio::test]
    async fn test_missing_fields_are_filled() {
        let store = Arc::new(FlakyStore::new(Some(doc(true, "warning", None))));
        let mut observer = MaintenanceObserver::activate(store);

        observer.loaded().await;
        assert_eq!(observer.message(), crate::maintenance::DEFAULT_MESSAGE);
    }

    #[tokio::test]
    async fn test_follows_changes() {
        let store = Arc::new(FlakyStore::new(None));
        let mut observer = MaintenanceObserver::activate(store.clone());
        observer.loaded().await;

        store.save(&doc(true, "warning", Some("Heads up"))).await.unwrap();
        assert!(observer.changed().await);
        assert!(observer.is_enabled());
        assert_eq!(observer.message(), "Heads up");

        store.save(&doc(false, "warning", Some("Heads up"))).await.unwrap();
        assert!(observer.changed().await);
        assert!(!observer.is_enabled());
    }

    #[tokio::test]
    async fn test_subscription_error_reverts_then_recovers() {
        let store = Arc::new(FlakyStore::new(Some(doc(true, "global", Some("Down")))));
        let mut observer = MaintenanceObserver::activate(store.clone());
        assert!(observer.loaded().await.enabled);

        let mut rx = observer.watch();
        store.push_error("permission denied");
        rx.wait_for(|s| !s.config.enabled).await.unwrap();
        assert_eq!(rx.borrow().config, MaintenanceConfig::default());

        // The observer re-subscribes and picks the stored document up again.
        let recovered =
            tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.config.enabled))
                .await
                .map(|seen| seen.is_ok());
        assert!(matches!(recovered, Ok(true)));
        assert!(!observer.is_closed());

        store.save(&doc(false, "warning", None)).await.unwrap();
        rx.wait_for(|s| !s.config.enabled).await.unwrap();
        assert_eq!(observer.mode(), MaintenanceMode::Warning);
    }

    #[tokio::test]
    async fn test_subscribe_failure_falls_back_then_retries() {
        let store = Arc::new(FlakyStore::new(Some(doc(true, "global", None))));
        store.fail_subscribe.store(true, Ordering::SeqCst);

        let mut observer = MaintenanceObserver::activate(store.clone());
        let config = observer.loaded().await;
        assert!(!config.enabled);
        assert!(!observer.is_loading());

        store.fail_subscribe.store(false, Ordering::SeqCst);
        let mut rx = observer.watch();
        let recovered =
            tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.config.enabled))
                .await
                .map(|seen| seen.is_ok());
        assert!(matches!(recovered, Ok(true)));
    }

    #[tokio::test]
    async fn test_close_stops_updates() {
        let store = Arc::new(FlakyStore::new(None));
        let mut observer = MaintenanceObserver::activate(store.clone());
        observer.loaded().await;

        let mut rx = observer.watch();
        observer.close();
        store.save(&doc(true, "global", None)).await.unwrap();

        let result =
            tokio::time::timeout(Duration::from_millis(200), rx.wait_for(|s| s.config.enabled))
                .await;
        assert!(!matches!(result, Ok(Ok(_))));
        drop(result);
        assert!(!rx.borrow().config.enabled);
    }
}
