//! Async query abstraction for data fetching with cache-aware
//! invalidation.
//!
//! `Query<T>` encapsulates async data fetching, loading states, and
//! error handling; views own their queries, start them in `new()`, and
//! poll them in `tick()`. A query can be bound to a [`CacheKey`]: when
//! a completed invalidation group bumps the key's generation, the next
//! poll re-fetches automatically.
//!
//! `MutationOp<T>` is the write-side counterpart: it runs a single
//! async operation and implements the advisory in-flight lock (starting
//! is a no-op while a previous run is pending).

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::cache::{CacheKey, Invalidations};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query for data fetching with state management.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  fetched_at: Option<Instant>,
  stale_time: Duration,
  /// Cache key binding: re-fetch when the key's generation moves past
  /// the one observed at the last fetch.
  binding: Option<(CacheKey, Invalidations)>,
  seen_generation: u64,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time `fetch()` or `refetch()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      stale_time: Duration::from_secs(60),
      binding: None,
      seen_generation: 0,
    }
  }

  /// Bind this query to a cache key so completed invalidation groups
  /// trigger a re-fetch on the next poll.
  pub fn with_cache_key(mut self, key: CacheKey, invalidations: Invalidations) -> Self {
    self.seen_generation = invalidations.generation(&key);
    self.binding = Some((key, invalidations));
    self
  }

  /// Set the stale time for this query.
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = duration;
    self
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Check if the data is stale (older than stale_time).
  pub fn is_stale(&self) -> bool {
    match &self.state {
      QueryState::Success(_) => self
        .fetched_at
        .map(|t| t.elapsed() > self.stale_time)
        .unwrap_or(true),
      _ => false,
    }
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for invalidations and results from a pending fetch.
  ///
  /// Returns `true` if the state changed. Call this in the view's tick
  /// handler.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    // An invalidation group completed since our last fetch: re-fetch.
    let bumped = match &self.binding {
      Some((key, invalidations)) => {
        let generation = invalidations.generation(key);
        generation != self.seen_generation
      }
      None => false,
    };
    if bumped {
      self.refetch();
      changed = true;
    }

    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return changed,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => changed,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending - treat as error
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    if let Some((key, invalidations)) = &self.binding {
      self.seen_generation = invalidations.generation(key);
    }

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}

/// A single fire-and-poll mutation with an advisory in-flight lock.
///
/// `start` is a no-op while a previous run is pending, which is what
/// disables the triggering control against double submission. This is
/// advisory only; the server is assumed to enforce atomicity.
pub struct MutationOp<T> {
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> MutationOp<T> {
  pub fn idle() -> Self {
    Self { receiver: None }
  }

  /// Whether a run is pending.
  pub fn in_flight(&self) -> bool {
    self.receiver.is_some()
  }

  /// Run the operation unless one is already pending. Returns whether
  /// the operation was started.
  pub fn start<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.in_flight() {
      return false;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    tokio::spawn(async move {
      let result = future.await;
      let _ = tx.send(result);
    });
    true
  }

  /// Poll for completion; returns the result exactly once.
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    let receiver = self.receiver.as_mut()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        Some(Err("operation was cancelled".to_string()))
      }
    }
  }
}

impl<T> Default for MutationOp<T> {
  fn default() -> Self {
    Self { receiver: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    // Wait for the result
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("Something went wrong".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(query.error(), Some("Something went wrong"));
  }

  #[tokio::test]
  async fn test_query_stale() {
    let mut query = Query::new(|| async { Ok::<_, String>(42) }).with_stale_time(Duration::ZERO);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    // With zero stale time, should immediately be stale
    assert!(query.is_stale());
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    query.fetch();
    assert!(query.is_loading());

    // Second fetch should be no-op
    query.fetch();
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_invalidation_triggers_refetch() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let invalidations = Invalidations::new();
    let key = CacheKey::ProductsCached { device_id: 1 };
    let counter = Arc::new(AtomicU32::new(0));

    let counter_clone = counter.clone();
    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move { Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst)) }
    })
    .with_cache_key(key, invalidations.clone());

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&0));

    // A push-products invalidation group includes our key.
    invalidations.bump(&crate::cache::Mutation::PushProducts { device_id: 1 }.invalidates());

    assert!(query.poll());
    assert!(query.is_loading());
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    // Fresh data after the completed invalidation.
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_unrelated_invalidation_is_ignored() {
    let invalidations = Invalidations::new();
    let mut query = Query::new(|| async { Ok::<_, String>(7) })
      .with_cache_key(CacheKey::Devices, invalidations.clone());

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    invalidations.bump(&[CacheKey::AutoUpdate { device_id: 9 }]);
    assert!(!query.poll());
  }

  #[tokio::test]
  async fn test_mutation_op_in_flight_lock() {
    let mut op: MutationOp<u32> = MutationOp::idle();

    assert!(op.start(async {
      tokio::time::sleep(Duration::from_millis(50)).await;
      Ok(1)
    }));
    assert!(op.in_flight());

    // Double-submission is ignored while the first run is pending.
    assert!(!op.start(async { Ok(2) }));

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(op.poll(), Some(Ok(1)));
    assert!(!op.in_flight());
  }

  #[tokio::test]
  async fn test_mutation_op_reports_once() {
    let mut op: MutationOp<()> = MutationOp::idle();
    op.start(async { Err("boom".to_string()) });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(op.poll(), Some(Err("boom".to_string())));
    assert_eq!(op.poll(), None);
  }
}
