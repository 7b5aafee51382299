use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::trace;

type TaskMap = Arc<DashMap<String, JoinHandle<()>>>;

/// Process-local registry of running background jobs, keyed by task
/// name.
///
/// An entry with an unfinished handle is the only evidence that a job
/// is in flight; there is no persisted status record. Registration is
/// atomic per name (the map's sharded entry lock covers the
/// check-and-spawn), so two jobs can never run under the same name at
/// once. Every job removes its own entry on the way out, whether it
/// succeeds, fails, or panics.
#[derive(Clone, Default)]
pub struct InflightJobs {
    tasks: TaskMap,
}

impl InflightJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and starts a job under `name`, unless a live job is
    /// already registered there.
    ///
    /// Returns `false` (and drops `job` unstarted) when the name is
    /// taken; a finished leftover handle is replaced.
    pub fn spawn<F>(&self, name: &str, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let job = deregister_on_completion(Arc::clone(&self.tasks), name.to_owned(), job);

        match self.tasks.entry(name.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_finished() {
                    trace!(name, "job already in flight, not spawning");
                    return false;
                }
                occupied.insert(tokio::spawn(job));
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(tokio::spawn(job));
                true
            }
        }
    }

    /// Whether a live job is currently registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.tasks
            .get(name)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of registered (possibly finished) entries.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Wraps `job` so its registry entry is removed when the job body
/// finishes, via a guard that drops on every exit path. The guard is
/// created before the body runs, so removal happens strictly after the
/// job's last effect.
fn deregister_on_completion<F>(
    tasks: TaskMap,
    name: String,
    job: F,
) -> impl Future<Output = ()> + Send + 'static
where
    F: Future<Output = ()> + Send + 'static,
{
    async move {
        let _deregister = Deregister { tasks, name };
        job.await;
    }
}

struct Deregister {
    tasks: TaskMap,
    name: String,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.tasks.remove(&self.name);
        trace!(name = %self.name, "job deregistered");
    }
}
