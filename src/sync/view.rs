use crate::core::Entity;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// What presentation layers observe: the last published merged view plus
/// the parameters and progress of the most recent `load`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub page: u32,
    pub query: String,
    pub loading: bool,
    pub characters: Vec<Entity>,
    pub total: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: 1,
            query: String::new(),
            loading: false,
            characters: Vec::new(),
            total: 0,
        }
    }
}

/// Owner of the published [`ViewState`].
///
/// Every change is applied as one `watch` update, so subscribers never
/// observe a half-written tuple. Each load is tagged with a generation and
/// only the newest issued load may publish or clear `loading`.
pub struct ViewHandle {
    tx: watch::Sender<ViewState>,
    generation: AtomicU64,
}

impl ViewHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ViewState::default());
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    /// Page and query of the most recently issued load.
    pub fn last_request(&self) -> (u32, String) {
        let state = self.tx.borrow();
        (state.page, state.query.clone())
    }

    /// Record a new load request and mark the view as loading.
    pub(crate) fn begin(&self, page: u32, query: &str) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.page = page;
            state.query = query.to_string();
            state.loading = true;
        });
        generation
    }

    /// Publish a merged view for load `generation`. Returns false, leaving
    /// the view untouched, when a newer load has been issued since.
    pub(crate) fn publish(&self, generation: u64, characters: Vec<Entity>, total: u64) -> bool {
        self.tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.characters = characters;
            state.total = total;
            state.loading = false;
            true
        })
    }

    /// Clear `loading` for a load that ended without publishing.
    pub(crate) fn settle(&self, generation: u64) {
        self.tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation || !state.loading {
                return false;
            }
            state.loading = false;
            true
        });
    }
}

impl Default for ViewHandle {
    fn default() -> Self {
        Self::new()
    }
}
