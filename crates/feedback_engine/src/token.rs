use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use feedback_core::TaskKind;
use tokio_util::sync::CancellationToken;

/// Monotonic per-kind task generation. Never reused.
pub type Generation = u64;

/// Source of generations for one task kind.
#[derive(Debug, Default)]
pub(crate) struct GenerationCounter {
    latest: AtomicU64,
}

impl GenerationCounter {
    /// Mints the next generation; every older token becomes superseded.
    pub(crate) fn mint(&self) -> Generation {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn latest(&self) -> Generation {
        self.latest.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Current,
    Cancelled,
    Superseded,
}

/// Identifies "the current task of this kind". Tasks poll it at every item
/// boundary, before every remote call and before every store mutation.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    kind: TaskKind,
    generation: Generation,
    counter: Arc<GenerationCounter>,
    cancel: CancellationToken,
}

impl GenerationToken {
    pub(crate) fn new(
        kind: TaskKind,
        generation: Generation,
        counter: Arc<GenerationCounter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            kind,
            generation,
            counter,
            cancel,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_superseded(&self) -> bool {
        self.counter.latest() != self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_current(&self) -> bool {
        self.state() == TokenState::Current
    }

    /// Supersession wins over cancellation: a superseded task exits silently.
    pub fn state(&self) -> TokenState {
        if self.is_superseded() {
            TokenState::Superseded
        } else if self.is_cancelled() {
            TokenState::Cancelled
        } else {
            TokenState::Current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(counter: &Arc<GenerationCounter>) -> (GenerationToken, CancellationToken) {
        let cancel = CancellationToken::new();
        let generation = counter.mint();
        (
            GenerationToken::new(TaskKind::Search, generation, counter.clone(), cancel.clone()),
            cancel,
        )
    }

    #[test]
    fn minting_supersedes_older_tokens() {
        let counter = Arc::new(GenerationCounter::default());
        let (first, _) = token(&counter);
        assert!(first.is_current());

        let (second, _) = token(&counter);
        assert_eq!(first.state(), TokenState::Superseded);
        assert_eq!(second.state(), TokenState::Current);
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn cancellation_is_observed_but_superseded_wins() {
        let counter = Arc::new(GenerationCounter::default());
        let (first, cancel) = token(&counter);
        cancel.cancel();
        assert_eq!(first.state(), TokenState::Cancelled);

        let _ = token(&counter);
        assert_eq!(first.state(), TokenState::Superseded);
    }
}
