use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use findor_core::{ApiKey, Session};
use findor_service::KeyService;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::refresh;
use crate::state::{ManagerState, Phase, CREATE_FAILED, DELETE_FAILED, FETCH_FAILED};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    /// Drives the phase and surfaces failures in the banner.
    Foreground,
    /// Only replaces the list on success; failures are logged.
    Background,
}

pub(crate) struct Inner {
    service: Arc<dyn KeyService>,
    state: watch::Sender<ManagerState>,
    mounted: AtomicBool,
    /// Bumped whenever the state is torn down. Work started under an older
    /// generation must not write its results.
    generation: AtomicU64,
    background_in_flight: AtomicUsize,
    refresh_interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(timer) = self.timer.get_mut() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

/// Controller behind the API key dashboard.
///
/// Cheap to clone; clones share the same state. Create and delete are
/// guarded so that a second request while one is pending is dropped.
/// Concurrent refreshes are not sequenced: the last response to land wins.
#[derive(Clone)]
pub struct KeyManager {
    inner: Arc<Inner>,
}

impl KeyManager {
    pub fn new(service: Arc<dyn KeyService>) -> Self {
        Self::with_refresh_interval(service, DEFAULT_REFRESH_INTERVAL)
    }

    pub fn with_refresh_interval(service: Arc<dyn KeyService>, refresh_interval: Duration) -> Self {
        let (state, _) = watch::channel(ManagerState::default());
        Self {
            inner: Arc::new(Inner {
                service,
                state,
                mounted: AtomicBool::new(true),
                generation: AtomicU64::new(0),
                background_in_flight: AtomicUsize::new(0),
                refresh_interval,
                timer: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub fn snapshot(&self) -> ManagerState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.inner.state.subscribe()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.inner.refresh_interval
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn email(&self) -> Option<String> {
        self.inner.state.borrow().email.clone()
    }

    /// Apply `f` if `generation` is still current. Returns whether the
    /// state changed.
    fn update(&self, generation: u64, f: impl FnOnce(&mut ManagerState) -> bool) -> bool {
        let inner = &self.inner;
        inner.state.send_if_modified(|state| {
            inner.mounted.load(Ordering::SeqCst)
                && inner.generation.load(Ordering::SeqCst) == generation
                && f(state)
        })
    }

    /// Drop everything and go back to `Uninitialized`. Work in flight from
    /// before the reset is discarded when it completes.
    fn reset(&self) {
        let inner = &self.inner;
        inner.state.send_modify(|state| {
            inner.generation.fetch_add(1, Ordering::SeqCst);
            inner.background_in_flight.store(0, Ordering::SeqCst);
            *state = ManagerState::default();
        });
    }

    /// React to the identity provider. A known email initializes the list
    /// and starts the background timer; no email stops the timer and
    /// clears the state.
    pub async fn set_identity(&self, email: Option<&str>) {
        match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => {
                self.initialize(email).await;
                self.start_background_refresh();
            }
            None => {
                self.stop_background_refresh();
                if self.email().is_some() {
                    debug!("identity cleared, resetting key manager");
                    self.reset();
                }
            }
        }
    }

    pub async fn mount(&self, session: &Session) {
        self.set_identity(session.email()).await;
    }

    /// Stop the timer and detach from the state. Anything still in flight
    /// finishes against the service but its result is dropped.
    pub fn shutdown(&self) {
        self.stop_background_refresh();
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Ensure the user exists, then load the key list in the foreground.
    ///
    /// A repeat call for the email that is already loading or loaded is a
    /// no-op. A different email discards the previous user's state first.
    pub async fn initialize(&self, email: &str) {
        let email = email.trim();
        if email.is_empty() || !self.is_mounted() {
            return;
        }
        if self.email().is_some_and(|current| current != email) {
            self.reset();
        }

        let generation = self.generation();
        let started = self.update(generation, |state| {
            if state.email.as_deref() == Some(email)
                && matches!(state.phase, Phase::Loading | Phase::Ready)
            {
                return false;
            }
            state.email = Some(email.to_string());
            state.phase = Phase::Loading;
            state.error = None;
            true
        });
        if !started {
            return;
        }

        // Fails when the user already exists; there is no way to tell that
        // apart from a real fault, so carry on either way.
        if let Err(e) = self.inner.service.create_user(email).await {
            debug!("create user {email} failed, assuming it exists: {e}");
        }

        self.fetch(generation, email, Fetch::Foreground).await;
    }

    /// Reload the list in the foreground without showing the loading state.
    pub async fn refresh(&self) {
        let Some(email) = self.email() else {
            return;
        };
        self.fetch(self.generation(), &email, Fetch::Foreground)
            .await;
    }

    /// Reload the list silently.
    pub async fn refresh_in_background(&self) {
        let Some(email) = self.email() else {
            return;
        };
        self.fetch(self.generation(), &email, Fetch::Background)
            .await;
    }

    async fn fetch(&self, generation: u64, email: &str, mode: Fetch) {
        if mode == Fetch::Background {
            self.inner.background_in_flight.fetch_add(1, Ordering::SeqCst);
            self.update(generation, |state| {
                let changed = !state.background_refreshing;
                state.background_refreshing = true;
                changed
            });
        }

        let result = self.inner.service.list_api_keys(email).await;

        if mode == Fetch::Background {
            // A reset zeroes the counter, so fetches from before it must not
            // decrement it again.
            let remaining = if self.generation() == generation {
                self.inner
                    .background_in_flight
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                        Some(n.saturating_sub(1))
                    })
                    .unwrap_or(0)
                    .saturating_sub(1)
            } else {
                0
            };
            self.update(generation, |state| {
                state.background_refreshing = remaining > 0;
                true
            });
        }

        match result {
            Ok(items) => {
                debug!("listed {} keys", items.len());
                let keys = ApiKey::from_list(items);
                self.update(generation, |state| {
                    state.keys = keys;
                    if mode == Fetch::Foreground {
                        state.phase = Phase::Ready;
                        state.error = None;
                    }
                    true
                });
            }
            Err(e) if mode == Fetch::Foreground => {
                warn!("fetching API keys failed: {e}");
                self.update(generation, |state| {
                    state.phase = Phase::Error;
                    state.error = Some(FETCH_FAILED.to_string());
                    true
                });
            }
            Err(e) => {
                warn!("background refresh failed: {e}");
            }
        }
    }

    pub fn open_create_dialog(&self) -> bool {
        self.update(self.generation(), |state| {
            if !state.can_open_create() || state.create_dialog_open {
                return false;
            }
            state.create_dialog_open = true;
            true
        })
    }

    /// Close the create dialog. Refused while a create is pending.
    pub fn close_create_dialog(&self) -> bool {
        self.update(self.generation(), |state| {
            if state.creating || !state.create_dialog_open {
                return false;
            }
            state.create_dialog_open = false;
            true
        })
    }

    /// Create a key labelled `name`. The label stays on this client; the
    /// backend only hands back the secret.
    ///
    /// On success the new key is staged for the reveal dialog and the list
    /// is refreshed in the background. Dropped if a create is pending.
    pub async fn create_key(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let Some(email) = self.email() else {
            debug!("create key ignored: no signed-in user");
            return;
        };

        let generation = self.generation();
        let acquired = self.update(generation, |state| {
            if state.creating {
                return false;
            }
            state.creating = true;
            state.error = None;
            true
        });
        if !acquired {
            debug!("create key ignored: another create is in flight");
            return;
        }

        match self.inner.service.create_api_key(&email).await {
            Ok(created) => {
                info!("created API key \"{name}\"");
                let key = ApiKey::from_created(name, &created);
                self.update(generation, |state| {
                    state.create_dialog_open = false;
                    state.pending_reveal = Some(key);
                    true
                });
                self.fetch(generation, &email, Fetch::Background).await;
            }
            Err(e) => {
                warn!("creating API key failed: {e}");
                self.update(generation, |state| {
                    state.error = Some(CREATE_FAILED.to_string());
                    true
                });
            }
        }

        self.update(generation, |state| {
            state.creating = false;
            true
        });
    }

    /// Hide the freshly created secret for good.
    pub fn dismiss_reveal(&self) -> bool {
        self.update(self.generation(), |state| state.pending_reveal.take().is_some())
    }

    /// Select `key` for deletion and open the confirmation dialog.
    pub fn request_delete(&self, key: ApiKey) -> bool {
        self.update(self.generation(), |state| {
            if state.deleting {
                return false;
            }
            state.pending_delete = Some(key);
            true
        })
    }

    /// Close the confirmation dialog. Refused while a delete is pending.
    pub fn cancel_delete(&self) -> bool {
        self.update(self.generation(), |state| {
            if state.deleting {
                return false;
            }
            state.pending_delete.take().is_some()
        })
    }

    /// Delete the key awaiting confirmation, addressed by its secret.
    ///
    /// On failure the dialog stays open and the banner shows an error.
    /// Dropped if a delete is pending.
    pub async fn confirm_delete(&self) {
        let Some(email) = self.email() else {
            return;
        };

        let generation = self.generation();
        let mut target = None;
        let acquired = self.update(generation, |state| {
            if state.deleting {
                return false;
            }
            let Some(key) = state.pending_delete.as_ref() else {
                return false;
            };
            target = Some(key.secret.clone());
            state.deleting = true;
            state.error = None;
            true
        });
        let Some(secret) = target.filter(|_| acquired) else {
            debug!("delete ignored: nothing selected or another delete is in flight");
            return;
        };

        match self.inner.service.delete_api_key(&email, &secret).await {
            Ok(_) => {
                info!("deleted API key ending {}", tail(&secret));
                self.update(generation, |state| {
                    state.pending_delete = None;
                    true
                });
                self.fetch(generation, &email, Fetch::Background).await;
            }
            Err(e) => {
                warn!("deleting API key failed: {e}");
                self.update(generation, |state| {
                    state.error = Some(DELETE_FAILED.to_string());
                    true
                });
            }
        }

        self.update(generation, |state| {
            state.deleting = false;
            true
        });
    }

    /// Start the periodic background refresh if it is not running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_background_refresh(&self) {
        if !self.is_mounted() {
            return;
        }
        let Ok(mut timer) = self.inner.timer.lock() else {
            return;
        };
        if timer.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let period = self.inner.refresh_interval;
        *timer = Some(tokio::spawn(refresh::run(
            Arc::downgrade(&self.inner),
            period,
        )));
        debug!("background refresh every {}s", period.as_secs());
    }

    pub fn stop_background_refresh(&self) {
        if let Ok(mut timer) = self.inner.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }

    pub fn background_refresh_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .map(|t| t.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// One timer tick. Skipped while the first load is running, without an
    /// identity, or while another background refresh is still out.
    pub(crate) async fn background_tick(&self) {
        let skip = {
            let state = self.inner.state.borrow();
            state.email.is_none() || state.is_loading() || state.background_refreshing
        };
        if skip {
            return;
        }
        self.refresh_in_background().await;
    }
}

fn tail(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}
