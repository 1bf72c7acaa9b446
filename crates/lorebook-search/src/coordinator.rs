//! Debounced, last-writer-wins search coordination
//!
//! All query/filter mutations and fetch resolutions are serialized onto one
//! spawned task. The public [`SearchCoordinator`] handle sends commands over
//! an unbounded channel; fetch completions loop back over the same channel
//! tagged with the generation they were issued under, so a result that was
//! superseded by a newer mutation can never touch state.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use lorebook_core::{CharacterSummary, FilterUpdate, SearchParams, SearchState};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::error::FetchError;
use crate::port::FetchPort;

/// Quiet window a mutation stream must hold before a fetch is issued
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Tuning knobs for a [`SearchCoordinator`]
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Debounce window applied uniformly to query and filter mutations
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Commands processed by the coordinator task
enum Command {
    UpdateQuery(String),
    UpdateFilters(FilterUpdate),
    ClearFilters,
    Subscribe(mpsc::UnboundedSender<SearchState>),
    FetchDone {
        generation: u64,
        outcome: Result<Vec<CharacterSummary>, FetchError>,
    },
    Dispose,
}

/// Handle to one search session
///
/// Owns the session's coordinator task. Mutators never block; they enqueue a
/// command and return. One instance is created per active UI session and torn
/// down with [`dispose`](Self::dispose) (also triggered by `Drop`), after
/// which no further state updates are delivered and mutators become no-ops.
pub struct SearchCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
}

impl SearchCoordinator {
    /// Spawn a coordinator over the given fetch boundary with default tuning
    pub fn new(port: Arc<dyn FetchPort>) -> Self {
        Self::with_config(port, SearchConfig::default())
    }

    /// Spawn a coordinator with explicit tuning
    pub fn with_config(port: Arc<dyn FetchPort>, config: SearchConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SearchState::Initial);

        let task = CoordinatorTask {
            port,
            commands: command_rx,
            loopback: command_tx.clone(),
            state_tx,
            subscribers: Vec::new(),
            params: SearchParams::default(),
            generation: 0,
            deadline: None,
            in_flight: None,
            debounce: config.debounce,
        };
        tokio::spawn(task.run());

        Self {
            commands: command_tx,
            state: state_rx,
        }
    }

    /// Replace the query portion of the current search input
    ///
    /// Accepts any string; it is trimmed on entry and empty is valid. Restarts
    /// the debounce window and supersedes any in-flight fetch.
    pub fn update_query(&self, text: impl Into<String>) {
        self.send(Command::UpdateQuery(text.into()));
    }

    /// Apply a partial filter update; unspecified fields keep their values
    ///
    /// Filter changes go through the same debounce/cancel/generation path as
    /// query changes.
    pub fn update_filters(&self, update: FilterUpdate) {
        self.send(Command::UpdateFilters(update));
    }

    /// Reset the filters to their defaults, leaving the query untouched
    pub fn clear_filters(&self) {
        self.send(Command::ClearFilters);
    }

    /// Snapshot of the current state
    pub fn current_state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions
    ///
    /// The stream first yields the current state as a snapshot, then every
    /// subsequent transition exactly once, in order. It ends when the session
    /// is disposed.
    pub fn subscribe(&self) -> StateUpdates {
        let (tx, rx) = mpsc::unbounded_channel();
        self.send(Command::Subscribe(tx));
        StateUpdates { rx }
    }

    /// Tear the session down
    ///
    /// Cancels the pending debounce and any in-flight fetch, closes all
    /// subscription streams and turns later mutator calls into no-ops.
    /// Idempotent.
    pub fn dispose(&self) {
        self.send(Command::Dispose);
    }

    fn send(&self, command: Command) {
        // Fails only after dispose; mutations on a dead session are no-ops
        let _ = self.commands.send(command);
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Ordered stream of [`SearchState`] transitions for one subscriber
pub struct StateUpdates {
    rx: mpsc::UnboundedReceiver<SearchState>,
}

impl StateUpdates {
    /// Next transition, or `None` once the session is disposed
    pub async fn next_state(&mut self) -> Option<SearchState> {
        self.rx.recv().await
    }
}

impl Stream for StateUpdates {
    type Item = SearchState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// State owned by the spawned coordinator task
struct CoordinatorTask {
    port: Arc<dyn FetchPort>,
    commands: mpsc::UnboundedReceiver<Command>,
    loopback: mpsc::UnboundedSender<Command>,
    state_tx: watch::Sender<SearchState>,
    subscribers: Vec<mpsc::UnboundedSender<SearchState>>,
    params: SearchParams,
    generation: u64,
    deadline: Option<Instant>,
    in_flight: Option<JoinHandle<()>>,
    debounce: Duration,
}

impl CoordinatorTask {
    async fn run(mut self) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle(command) {
                                break;
                            }
                        }
                        // All handles gone; nothing can mutate or observe us
                        None => break,
                    }
                }
                _ = sleep_until_deadline(deadline) => {
                    self.settle();
                }
            }
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        debug!("search coordinator stopped");
    }

    /// Process one command; returns `false` once the session is disposed
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::UpdateQuery(text) => {
                self.mutate(|params| params.set_query(&text));
            }
            Command::UpdateFilters(update) => {
                self.mutate(|params| params.update_filters(&update));
            }
            Command::ClearFilters => {
                self.mutate(SearchParams::clear_filters);
            }
            Command::Subscribe(tx) => {
                // Snapshot first, then every transition in order
                let _ = tx.send(self.state_tx.borrow().clone());
                self.subscribers.push(tx);
            }
            Command::FetchDone {
                generation,
                outcome,
            } => self.resolve(generation, outcome),
            Command::Dispose => {
                if let Some(handle) = self.in_flight.take() {
                    handle.abort();
                }
                self.deadline = None;
                self.generation += 1;
                self.subscribers.clear();
                debug!("search session disposed");
                return false;
            }
        }
        true
    }

    /// Apply a params mutation: supersede any in-flight fetch and restart
    /// the debounce window
    fn mutate(&mut self, apply: impl FnOnce(&mut SearchParams)) {
        if let Some(handle) = self.in_flight.take() {
            // Best effort; a result already in the channel is caught by the
            // generation check in resolve()
            handle.abort();
        }
        self.generation += 1;
        apply(&mut self.params);
        self.deadline = Some(Instant::now() + self.debounce);
    }

    /// The mutation stream has been quiet for a full window: decide what the
    /// settled params mean
    fn settle(&mut self) {
        self.deadline = None;

        if self.params.is_default() {
            debug!("settled on default input, skipping fetch");
            self.publish(SearchState::Initial);
            return;
        }

        self.publish(SearchState::Loading);

        self.generation += 1;
        let generation = self.generation;
        let port = Arc::clone(&self.port);
        let params = self.params.clone();
        let loopback = self.loopback.clone();
        debug!(generation, query = params.query(), "issuing search");

        self.in_flight = Some(tokio::spawn(async move {
            let outcome = port.search(&params).await;
            let _ = loopback.send(Command::FetchDone {
                generation,
                outcome,
            });
        }));
    }

    /// A fetch completed; apply it only if it is still the latest generation
    fn resolve(
        &mut self,
        generation: u64,
        outcome: Result<Vec<CharacterSummary>, FetchError>,
    ) {
        if generation != self.generation {
            debug!(
                generation,
                latest = self.generation,
                "discarding superseded fetch result"
            );
            return;
        }
        self.in_flight = None;

        let state = match outcome {
            Ok(results) if results.is_empty() => SearchState::Empty,
            Ok(results) => SearchState::Success(results),
            Err(err) => SearchState::Error(err.to_string()),
        };
        self.publish(state);
    }

    fn publish(&mut self, state: SearchState) {
        self.subscribers.retain(|tx| tx.send(state.clone()).is_ok());
        self.state_tx.send_replace(state);
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lorebook_core::{CharacterStatus, SearchParams};
    use tokio::sync::oneshot;

    use super::*;
    use crate::error::Result;

    enum Response {
        Now(Result<Vec<CharacterSummary>>),
        Wait(oneshot::Receiver<Result<Vec<CharacterSummary>>>),
    }

    /// Fetch double fed a fixed script of responses, recording every call
    struct ScriptedPort {
        calls: Mutex<Vec<SearchParams>>,
        responses: Mutex<VecDeque<Response>>,
    }

    impl ScriptedPort {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
            })
        }

        fn push_ok(&self, results: Vec<CharacterSummary>) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Response::Now(Ok(results)));
        }

        fn push_err(&self, err: FetchError) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Response::Now(Err(err)));
        }

        /// Script a response that parks until the returned sender fires
        fn push_gate(&self) -> oneshot::Sender<Result<Vec<CharacterSummary>>> {
            let (tx, rx) = oneshot::channel();
            self.responses
                .lock()
                .unwrap()
                .push_back(Response::Wait(rx));
            tx
        }

        fn calls(&self) -> Vec<SearchParams> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FetchPort for ScriptedPort {
        async fn search(&self, params: &SearchParams) -> Result<Vec<CharacterSummary>> {
            self.calls.lock().unwrap().push(params.clone());
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("search called without a scripted response");
            match response {
                Response::Now(outcome) => outcome,
                Response::Wait(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Transport("gate dropped".to_string()))),
            }
        }
    }

    fn character(id: u64, name: &str) -> CharacterSummary {
        CharacterSummary {
            id,
            name: name.to_string(),
            species: "Human".to_string(),
            status: "Alive".to_string(),
            origin: "Earth (C-137)".to_string(),
            image: format!("https://directory.test/avatar/{}.jpeg", id),
            kind: None,
            created: "2017-11-04T18:48:46.250Z".to_string(),
        }
    }

    /// Let the coordinator task and any fetch tasks catch up without moving
    /// the paused clock
    async fn drain() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance_ms(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_in_initial_state() {
        let port = ScriptedPort::new();
        let coordinator = SearchCoordinator::new(port.clone());
        drain().await;

        assert_eq!(coordinator.current_state(), SearchState::Initial);
        assert!(port.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_coalesces_into_one_fetch() {
        let port = ScriptedPort::new();
        port.push_ok(vec![character(1, "Rick Sanchez")]);
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("R");
        drain().await;
        advance_ms(100).await;
        coordinator.update_query("Ri");
        drain().await;
        advance_ms(150).await;
        coordinator.update_query("Rick");
        drain().await;

        // Still inside the window: nothing issued yet
        assert!(port.calls().is_empty());
        assert_eq!(coordinator.current_state(), SearchState::Initial);

        advance_ms(300).await;

        let calls = port.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].query(), "Rick");
        assert_eq!(
            coordinator.current_state(),
            SearchState::Success(vec![character(1, "Rick Sanchez")])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_input_settles_to_initial_without_fetch() {
        let port = ScriptedPort::new();
        let coordinator = SearchCoordinator::new(port.clone());

        // Scenario D: clearing filters while the query is also empty
        coordinator.clear_filters();
        drain().await;
        advance_ms(300).await;

        assert_eq!(coordinator.current_state(), SearchState::Initial);
        assert!(port.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_emptied_query_returns_to_initial() {
        let port = ScriptedPort::new();
        port.push_ok(vec![character(1, "Rick Sanchez")]);
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;
        assert!(matches!(coordinator.current_state(), SearchState::Success(_)));

        coordinator.update_query("   ");
        drain().await;
        advance_ms(300).await;

        assert_eq!(coordinator.current_state(), SearchState::Initial);
        assert_eq!(port.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_list_resolves_to_empty() {
        let port = ScriptedPort::new();
        port.push_ok(Vec::new());
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("Squanchy");
        drain().await;
        advance_ms(300).await;

        assert_eq!(coordinator.current_state(), SearchState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_resolves_to_error() {
        let port = ScriptedPort::new();
        port.push_err(FetchError::Transport("Network error".to_string()));
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;

        assert_eq!(
            coordinator.current_state(),
            SearchState::Error("Network error".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_debounces_and_refetches() {
        let port = ScriptedPort::new();
        port.push_ok(vec![character(1, "Rick Sanchez"), character(3, "Rick Prime")]);
        port.push_ok(vec![character(1, "Rick Sanchez")]);
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;
        assert_eq!(
            coordinator.current_state(),
            SearchState::Success(vec![character(1, "Rick Sanchez"), character(3, "Rick Prime")])
        );

        // Scenario C: refining an existing success by status
        coordinator.update_filters(FilterUpdate::status(CharacterStatus::Alive));
        drain().await;
        advance_ms(300).await;

        let calls = port.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].query(), "Rick");
        assert_eq!(calls[1].filters().status, CharacterStatus::Alive);

        // The previous list is fully replaced
        assert_eq!(
            coordinator.current_state(),
            SearchState::Success(vec![character(1, "Rick Sanchez")])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_and_filter_mutations_share_one_window() {
        let port = ScriptedPort::new();
        port.push_ok(vec![character(1, "Rick Sanchez")]);
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(200).await;
        coordinator.update_filters(FilterUpdate::species(Some("Human")));
        drain().await;
        advance_ms(200).await;

        // The filter mutation restarted the window; nothing issued yet
        assert!(port.calls().is_empty());

        advance_ms(100).await;

        let calls = port.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].query(), "Rick");
        assert_eq!(calls[0].filters().species.as_deref(), Some("Human"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_never_touches_state() {
        let port = ScriptedPort::new();
        let gate = port.push_gate();
        port.push_ok(vec![character(2, "Morty Smith")]);
        let coordinator = SearchCoordinator::new(port.clone());
        let mut updates = coordinator.subscribe();
        drain().await;

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;
        assert_eq!(coordinator.current_state(), SearchState::Loading);

        // Supersede the parked fetch, then let its result race in late
        coordinator.update_query("Morty");
        let _ = gate.send(Ok(vec![character(1, "Rick Sanchez")]));
        drain().await;
        assert_eq!(coordinator.current_state(), SearchState::Loading);

        advance_ms(300).await;

        assert_eq!(updates.next_state().await, Some(SearchState::Initial));
        assert_eq!(updates.next_state().await, Some(SearchState::Loading));
        assert_eq!(updates.next_state().await, Some(SearchState::Loading));
        assert_eq!(
            updates.next_state().await,
            Some(SearchState::Success(vec![character(2, "Morty Smith")]))
        );

        let calls = port.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].query(), "Rick");
        assert_eq!(calls[1].query(), "Morty");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_snapshot_then_ordered_transitions() {
        let port = ScriptedPort::new();
        port.push_ok(vec![character(1, "Rick Sanchez")]);
        let coordinator = SearchCoordinator::new(port.clone());

        let mut updates = coordinator.subscribe();
        drain().await;
        assert_eq!(updates.next_state().await, Some(SearchState::Initial));

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;

        assert_eq!(updates.next_state().await, Some(SearchState::Loading));
        assert_eq!(
            updates.next_state().await,
            Some(SearchState::Success(vec![character(1, "Rick Sanchez")]))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_subscriber_snapshot_reflects_current_state() {
        let port = ScriptedPort::new();
        port.push_err(FetchError::RemoteStatus(500));
        let coordinator = SearchCoordinator::new(port.clone());

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;

        let mut updates = coordinator.subscribe();
        drain().await;
        assert_eq!(
            updates.next_state().await,
            Some(SearchState::Error("Remote service returned HTTP 500".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_ends_streams_and_ignores_late_results() {
        let port = ScriptedPort::new();
        let gate = port.push_gate();
        let coordinator = SearchCoordinator::new(port.clone());
        let mut updates = coordinator.subscribe();
        drain().await;
        assert_eq!(updates.next_state().await, Some(SearchState::Initial));

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(300).await;
        assert_eq!(updates.next_state().await, Some(SearchState::Loading));

        coordinator.dispose();
        drain().await;
        let _ = gate.send(Ok(vec![character(1, "Rick Sanchez")]));
        drain().await;

        // Teardown closed the stream; the late result went nowhere
        assert_eq!(updates.next_state().await, None);
        assert_eq!(coordinator.current_state(), SearchState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutators_are_noops_after_dispose() {
        let port = ScriptedPort::new();
        let coordinator = SearchCoordinator::new(port.clone());
        drain().await;

        coordinator.dispose();
        drain().await;

        coordinator.update_query("Rick");
        coordinator.update_filters(FilterUpdate::status(CharacterStatus::Dead));
        drain().await;
        advance_ms(300).await;

        assert_eq!(coordinator.current_state(), SearchState::Initial);
        assert!(port.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_debounce_window_is_honored() {
        let port = ScriptedPort::new();
        port.push_ok(Vec::new());
        let coordinator = SearchCoordinator::with_config(
            port.clone(),
            SearchConfig {
                debounce: Duration::from_millis(50),
            },
        );

        coordinator.update_query("Rick");
        drain().await;
        advance_ms(49).await;
        assert!(port.calls().is_empty());

        advance_ms(1).await;
        assert_eq!(port.calls().len(), 1);
    }
}
