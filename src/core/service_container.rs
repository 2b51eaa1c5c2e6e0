//! Observable state of one asynchronous operation.
//!
//! A [`ServiceContainer`] wraps a single logical request (usually an HTTP
//! call) and exposes `data`, `loading` and `error`. Every [`ServiceContainer::run`]
//! gets a sequence number and only the most recently started invocation may
//! write its outcome, so a slow earlier response never overwrites a later one.
//!
//! ```rust,ignore
//! let builds = ServiceContainer::<Page<Value>>::new();
//! let page = builds.run(service.list(config)).await?;
//! assert_eq!(builds.data(), Some(page));
//! ```

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Payload of a container: either nothing fetched yet or the last good value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataState<T> {
    #[default]
    NotYetFetched,
    Fetched(T),
}

impl<T> DataState<T> {
    pub fn is_fetched(&self) -> bool {
        matches!(self, DataState::Fetched(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            DataState::Fetched(data) => Some(data),
            DataState::NotYetFetched => None,
        }
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            DataState::Fetched(data) => Some(data),
            DataState::NotYetFetched => None,
        }
    }
}

/// Snapshot handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceState<T> {
    pub data: DataState<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ServiceState<T> {
    fn default() -> Self {
        Self {
            data: DataState::NotYetFetched,
            loading: false,
            error: None,
        }
    }
}

impl<T> ServiceState<T> {
    /// Error worth rendering: present and not currently refreshing.
    pub fn visible_error(&self) -> Option<&str> {
        if self.loading {
            None
        } else {
            self.error.as_deref()
        }
    }
}

struct Inner<T> {
    latest: AtomicU64,
    state: watch::Sender<ServiceState<T>>,
    initial_delay: Option<Duration>,
}

/// Async request wrapper with stale-response suppression.
///
/// Cloning is cheap and every clone shares the same state.
pub struct ServiceContainer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ServiceContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ServiceContainer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ServiceContainer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::build(None)
    }

    /// `loading` is only exposed once a request has been pending for `delay`.
    pub fn with_initial_delay(delay: Duration) -> Self {
        Self::build(Some(delay))
    }

    fn build(initial_delay: Option<Duration>) -> Self {
        let (state, _) = watch::channel(ServiceState::default());
        Self {
            inner: Arc::new(Inner {
                latest: AtomicU64::new(0),
                state,
                initial_delay,
            }),
        }
    }

    /// Run `request` as the newest invocation of this container.
    ///
    /// The sequence number is taken and `loading` raised (or its delay timer
    /// started) when `run` is called, not when the returned future is first
    /// polled, so call order alone decides which invocation is the latest.
    /// Previous `data` and `error` stay visible while the request is pending.
    /// The outcome is committed only if no newer `run` has started meanwhile;
    /// the returned value is always this invocation's own outcome.
    pub fn run<F, E>(&self, request: F) -> impl Future<Output = Result<T, E>> + use<T, F, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut sequence = 0;
        let expose_now = self.inner.initial_delay.is_none();
        self.inner.state.send_if_modified(|state| {
            sequence = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
            if expose_now && !state.loading {
                state.loading = true;
                return true;
            }
            false
        });
        let loading_deadline = self
            .inner
            .initial_delay
            .map(|delay| Instant::now() + delay);

        let container = self.clone();
        async move {
            let outcome = match loading_deadline {
                None => request.await,
                Some(deadline) => {
                    tokio::pin!(request);
                    tokio::select! {
                        outcome = &mut request => outcome,
                        _ = tokio::time::sleep_until(deadline) => {
                            container.mark_loading(sequence);
                            request.await
                        }
                    }
                }
            };

            container.commit(sequence, &outcome);
            outcome
        }
    }

    fn mark_loading(&self, sequence: u64) {
        self.inner.state.send_if_modified(|state| {
            if self.inner.latest.load(Ordering::SeqCst) != sequence || state.loading {
                return false;
            }
            state.loading = true;
            true
        });
    }

    fn commit<E: Display>(&self, sequence: u64, outcome: &Result<T, E>) {
        let committed = self.inner.state.send_if_modified(|state| {
            if self.inner.latest.load(Ordering::SeqCst) != sequence {
                return false;
            }
            match outcome {
                Ok(data) => {
                    state.data = DataState::Fetched(data.clone());
                    state.error = None;
                }
                Err(error) => {
                    state.error = Some(error.to_string());
                }
            }
            state.loading = false;
            true
        });

        if !committed {
            log::debug!("discarding stale response of invocation {}", sequence);
        }
    }

    /// Change `data` locally, e.g. to splice in a pushed update.
    /// `loading` and `error` are left alone.
    pub fn set_data<F>(&self, update: F)
    where
        F: FnOnce(&mut DataState<T>),
    {
        self.inner.state.send_modify(|state| update(&mut state.data));
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState<T>> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ServiceState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.inner.state.borrow().data.as_ref().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }
}
