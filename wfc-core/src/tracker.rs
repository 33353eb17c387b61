use crate::wave::Wave;

pub mod change;
pub mod entropy;
pub mod heap_entropy;
pub mod selected;

pub use change::ChangeTracker;
pub use entropy::EntropyTracker;
pub use heap_entropy::HeapEntropyTracker;
pub use selected::{Quadstate, SelectedTracker};

/// Observes bans and undone bans so derived state can be kept up to date
/// incrementally.
///
/// `do_ban` is called after the wave bit has been cleared and `undo_ban`
/// after it has been restored.
pub trait Tracker {
    /// Recomputes everything from scratch.
    fn reset(&mut self, wave: &Wave);

    fn do_ban(&mut self, wave: &Wave, index: usize, pattern: usize);

    fn undo_ban(&mut self, wave: &Wave, index: usize, pattern: usize);
}
