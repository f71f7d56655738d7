use crate::bus::{Event, EventBus};
use crate::chat::MoodLogEntry;
use crate::identity::IdentityProvider;
use crate::transport::Backend;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct HistoryState {
    visible: bool,
    entries: Vec<MoodLogEntry>,
    /// Bumped on every refresh so late responses can be recognised.
    generation: u64,
}

/// Best-effort mood history for the signed-in user.
///
/// Entries are only held while the panel is visible, and every failure
/// shows up as an empty list.
pub struct HistoryLoader {
    backend: Arc<dyn Backend>,
    identity: Arc<dyn IdentityProvider>,
    bus: Arc<EventBus>,
    state: Mutex<HistoryState>,
}

impl HistoryLoader {
    pub fn new(
        backend: Arc<dyn Backend>,
        identity: Arc<dyn IdentityProvider>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            backend,
            identity,
            bus,
            state: Mutex::new(HistoryState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn entries(&self) -> Vec<MoodLogEntry> {
        self.lock().entries.clone()
    }

    /// Show or hide the panel. A change of visibility triggers a refresh.
    pub async fn set_visible(&self, visible: bool) -> Vec<MoodLogEntry> {
        let changed = {
            let mut state = self.lock();
            let changed = state.visible != visible;
            state.visible = visible;
            changed
        };
        if changed {
            self.refresh().await
        } else {
            self.entries()
        }
    }

    /// Flip visibility and return the new value.
    pub async fn toggle(&self) -> bool {
        let visible = !self.is_visible();
        self.set_visible(visible).await;
        visible
    }

    /// Reload entries for the current user if the panel is visible.
    pub async fn refresh(&self) -> Vec<MoodLogEntry> {
        let (generation, email) = {
            let mut state = self.lock();
            state.generation += 1;
            let email = if state.visible {
                self.identity.current_user().map(|user| user.email)
            } else {
                None
            };
            match email {
                Some(email) => (state.generation, email),
                None => {
                    state.entries.clear();
                    self.bus.publish(Event::HistoryUpdated {
                        entries: Vec::new(),
                        visible: state.visible,
                    });
                    return Vec::new();
                }
            }
        };

        let entries = match self.backend.mood_logs(&email).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load mood logs: {}", e);
                Vec::new()
            }
        };

        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding mood logs from an outdated request");
            return state.entries.clone();
        }
        state.entries = entries.clone();
        self.bus.publish(Event::HistoryUpdated {
            entries: entries.clone(),
            visible: state.visible,
        });
        entries
    }

    /// Refresh whenever the signed-in user changes.
    pub fn watch_identity(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.identity.subscribe();
        let loader = self.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                loader.refresh().await;
            }
            debug!("Identity provider closed, history watcher stopping");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::UserIdentity;
    use crate::identity::LocalIdentityProvider;
    use crate::transport::testing::{server_error, FakeBackend};
    use std::time::Duration;

    fn entry(mood: &str, intensity: i64) -> MoodLogEntry {
        MoodLogEntry {
            timestamp: "2024-05-01T08:00:00".to_string(),
            mood: mood.to_string(),
            intensity,
        }
    }

    fn identity_for(email: Option<&str>) -> Arc<LocalIdentityProvider> {
        let identity = LocalIdentityProvider::new("/chat");
        identity.resolve(email.map(|e| UserIdentity::new(e, "Test")));
        Arc::new(identity)
    }

    fn loader(backend: Arc<FakeBackend>, identity: Arc<LocalIdentityProvider>) -> HistoryLoader {
        HistoryLoader::new(backend, identity, Arc::new(EventBus::new()))
    }

    #[tokio::test]
    async fn hidden_panel_never_fetches() {
        let backend = Arc::new(FakeBackend::new());
        let history = loader(backend.clone(), identity_for(Some("a@b.c")));

        assert!(history.refresh().await.is_empty());
        assert_eq!(backend.mood_calls(), 0);
    }

    #[tokio::test]
    async fn showing_the_panel_loads_the_users_logs() {
        let backend = Arc::new(FakeBackend::new().mood_reply(Ok(vec![entry("calm", 3)])));
        let history = loader(backend.clone(), identity_for(Some("a@b.c")));

        let entries = history.set_visible(true).await;

        assert_eq!(entries, vec![entry("calm", 3)]);
        assert_eq!(history.entries(), entries);
        assert_eq!(backend.mood_requests.lock().unwrap().as_slice(), &["a@b.c".to_string()]);
    }

    #[tokio::test]
    async fn no_user_means_no_fetch() {
        let backend = Arc::new(FakeBackend::new());
        let history = loader(backend.clone(), identity_for(None));

        assert!(history.set_visible(true).await.is_empty());
        assert_eq!(backend.mood_calls(), 0);
    }

    #[tokio::test]
    async fn toggling_off_and_on_fetches_again() {
        let backend = Arc::new(
            FakeBackend::new()
                .mood_reply(Ok(vec![entry("calm", 3)]))
                .mood_reply(Ok(vec![entry("calm", 3), entry("tired", 6)])),
        );
        let history = loader(backend.clone(), identity_for(Some("a@b.c")));

        assert!(history.toggle().await);
        assert_eq!(backend.mood_calls(), 1);

        assert!(!history.toggle().await);
        assert!(history.entries().is_empty());
        assert_eq!(backend.mood_calls(), 1);

        assert!(history.toggle().await);
        assert_eq!(backend.mood_calls(), 2);
        assert_eq!(history.entries().len(), 2);
    }

    #[tokio::test]
    async fn setting_the_same_visibility_does_not_refetch() {
        let backend = Arc::new(FakeBackend::new());
        let history = loader(backend.clone(), identity_for(Some("a@b.c")));

        history.set_visible(true).await;
        history.set_visible(true).await;

        assert_eq!(backend.mood_calls(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_shows_an_empty_list() {
        let backend = Arc::new(FakeBackend::new().mood_reply(Err(server_error())));
        let history = loader(backend.clone(), identity_for(Some("a@b.c")));

        assert!(history.set_visible(true).await.is_empty());
        assert!(history.is_visible());
        assert!(history.entries().is_empty());
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<(Vec<MoodLogEntry>, bool)> {
        let mut updates = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let Event::HistoryUpdated { entries, visible } = event {
                updates.push((entries, visible));
            }
        }
        updates
    }

    #[tokio::test]
    async fn late_response_after_hiding_is_dropped_silently() {
        let backend = Arc::new(FakeBackend::gated().mood_reply(Ok(vec![entry("calm", 3)])));
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        let history = Arc::new(HistoryLoader::new(
            backend.clone(),
            identity_for(Some("a@b.c")),
            bus,
        ));

        let pending = tokio::spawn({
            let history = history.clone();
            async move { history.set_visible(true).await }
        });
        backend.entered.notified().await;

        history.set_visible(false).await;
        backend.release.notify_one();
        pending.await.unwrap();

        assert!(!history.is_visible());
        assert!(history.entries().is_empty());
        // Only the hide is announced; the outdated response publishes nothing.
        assert_eq!(drain(&mut rx), vec![(Vec::new(), false)]);
    }

    #[tokio::test]
    async fn updates_carry_the_panel_visibility() {
        let backend = Arc::new(FakeBackend::new().mood_reply(Ok(vec![entry("calm", 3)])));
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        let history = HistoryLoader::new(backend, identity_for(Some("a@b.c")), bus);

        history.set_visible(true).await;
        history.set_visible(false).await;
        history.refresh().await;

        assert_eq!(
            drain(&mut rx),
            vec![
                (vec![entry("calm", 3)], true),
                (Vec::new(), false),
                (Vec::new(), false),
            ]
        );
    }

    #[tokio::test]
    async fn identity_change_refetches_for_the_new_user() {
        let backend = Arc::new(
            FakeBackend::new()
                .mood_reply(Ok(vec![entry("calm", 3)]))
                .mood_reply(Ok(vec![entry("joyful", 8)])),
        );
        let identity = identity_for(Some("first@example.com"));
        let bus = Arc::new(EventBus::new());
        let history = Arc::new(HistoryLoader::new(backend.clone(), identity.clone(), bus.clone()));
        history.set_visible(true).await;

        let mut rx = bus.subscribe();
        let watcher = history.watch_identity();
        identity.sign_in("second@example.com", None).await.unwrap();

        let updated = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(Event::HistoryUpdated { entries, visible }) = rx.recv().await {
                    assert!(visible);
                    return entries;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(updated, vec![entry("joyful", 8)]);
        assert_eq!(
            backend.mood_requests.lock().unwrap().as_slice(),
            &["first@example.com".to_string(), "second@example.com".to_string()]
        );
        watcher.abort();
    }
}
