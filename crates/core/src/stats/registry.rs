//! Registry of running child processes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A registered child process.
///
/// Handles are compared by `id`, which the registry hands out; the OS pid is
/// only used to deliver termination requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    id: u64,
    pid: Option<u32>,
    label: String,
}

impl ProcessHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// OS process id; `None` if the child had already exited at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Set of running child processes plus outputs that have not reached a
/// terminal state.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    next_id: AtomicU64,
    active: Mutex<Vec<ProcessHandle>>,
    peak: AtomicUsize,
    unsettled: Mutex<Vec<PathBuf>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle with a fresh id. The handle is not registered yet.
    pub fn handle(&self, pid: Option<u32>, label: impl Into<String>) -> ProcessHandle {
        ProcessHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            pid,
            label: label.into(),
        }
    }

    /// Adds a handle to the active set. Returns `false` if it was already there.
    pub fn register(&self, handle: ProcessHandle) -> bool {
        let mut active = lock(&self.active);
        if active.iter().any(|h| h.id == handle.id) {
            return false;
        }
        active.push(handle);
        self.peak.fetch_max(active.len(), Ordering::SeqCst);
        true
    }

    /// Removes a handle. Removing an absent handle is a no-op returning `false`.
    pub fn remove(&self, handle: &ProcessHandle) -> bool {
        let mut active = lock(&self.active);
        let before = active.len();
        active.retain(|h| h.id != handle.id);
        active.len() != before
    }

    /// Copy of the active handles in registration order.
    pub fn snapshot(&self) -> Vec<ProcessHandle> {
        lock(&self.active).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.active).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest number of simultaneously registered processes.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Records an output file whose job has started but not finished.
    pub fn track_output(&self, path: &Path) {
        let mut unsettled = lock(&self.unsettled);
        if !unsettled.iter().any(|p| p == path) {
            unsettled.push(path.to_path_buf());
        }
    }

    /// Marks an output as having reached a terminal state.
    pub fn settle_output(&self, path: &Path) {
        lock(&self.unsettled).retain(|p| p != path);
    }

    /// Outputs still waiting for a terminal state.
    pub fn unsettled_outputs(&self) -> Vec<PathBuf> {
        lock(&self.unsettled).clone()
    }

    /// Drains the unsettled outputs.
    pub fn take_unsettled_outputs(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *lock(&self.unsettled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_register_and_remove() {
        let registry = ProcessRegistry::new();
        let a = registry.handle(Some(100), "a.mkv");
        let b = registry.handle(Some(101), "b.mkv");
        assert_ne!(a.id(), b.id());

        assert!(registry.register(a.clone()));
        assert!(registry.register(b.clone()));
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(&a));
        assert_eq!(registry.snapshot(), vec![b]);
    }

    #[test]
    fn test_double_register_and_remove_is_harmless() {
        let registry = ProcessRegistry::new();
        let handle = registry.handle(Some(42), "movie.mkv");

        assert!(registry.register(handle.clone()));
        assert!(!registry.register(handle.clone()));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&handle));
        assert!(!registry.remove(&handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_peak_tracks_high_water_mark() {
        let registry = ProcessRegistry::new();
        let handles: Vec<_> = (0..3).map(|i| registry.handle(Some(i), "x")).collect();
        for h in &handles {
            registry.register(h.clone());
        }
        for h in &handles {
            registry.remove(h);
        }
        registry.register(registry.handle(None, "y"));
        assert_eq!(registry.peak(), 3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_register_remove() {
        let registry = Arc::new(ProcessRegistry::new());
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let h = registry.handle(Some(t * 1000 + i), "job");
                        registry.register(h.clone());
                        registry.remove(&h);
                        registry.remove(&h);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert!(registry.is_empty());
        assert!(registry.peak() <= 4);
    }

    #[test]
    fn test_unsettled_outputs() {
        let registry = ProcessRegistry::new();
        let a = Path::new("/out/a.mkv");
        let b = Path::new("/out/b.mkv");

        registry.track_output(a);
        registry.track_output(a);
        registry.track_output(b);
        assert_eq!(registry.unsettled_outputs().len(), 2);

        registry.settle_output(a);
        assert_eq!(registry.unsettled_outputs(), vec![b.to_path_buf()]);

        assert_eq!(registry.take_unsettled_outputs(), vec![b.to_path_buf()]);
        assert!(registry.unsettled_outputs().is_empty());
    }
}
