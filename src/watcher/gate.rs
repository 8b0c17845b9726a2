use crate::watcher::normalize;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Snapshot of the files present in the watched folder at startup.
///
/// Both "ignore what was already there" rules read from here: membership for
/// event-driven detections, and [`Baseline::predates_start`] for the sweep.
#[derive(Debug, Clone)]
pub struct Baseline {
    paths: HashSet<PathBuf>,
    started_at: SystemTime,
}

impl Baseline {
    /// Lists the regular files directly inside `dir`.
    pub fn capture(dir: &Path) -> io::Result<Self> {
        let started_at = SystemTime::now();
        let paths = fs::read_dir(dir)?
            .filter_map(|res| {
                let entry = res.ok()?;
                let ft = entry.file_type().ok()?;
                ft.is_file().then(|| normalize(&entry.path()))
            })
            .collect();

        Ok(Self { paths, started_at })
    }

    pub fn from_paths<I, P>(paths: I, started_at: SystemTime) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            paths: paths.into_iter().map(|p| normalize(p.as_ref())).collect(),
            started_at,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&normalize(path))
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// True if a file last modified at `mtime` was already there before startup.
    pub fn predates_start(&self, mtime: SystemTime) -> bool {
        mtime < self.started_at
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Decides whether a settled file should be surfaced at all.
///
/// Shared between debouncer workers and the sweep timer.
#[derive(Debug)]
pub struct SeenGate {
    baseline: Arc<Baseline>,
    process_existing_on_start: bool,
    seen: Mutex<HashSet<PathBuf>>,
}

impl SeenGate {
    pub fn new(baseline: Baseline, process_existing_on_start: bool) -> Self {
        Self {
            baseline: Arc::new(baseline),
            process_existing_on_start,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Returns false for startup files (unless configured to process them)
    /// and for paths already surfaced this session. Has no side effects.
    pub fn should_process(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.passes_baseline(&path) && !self.seen.lock().contains(&path)
    }

    /// Checks [`should_process`](Self::should_process) and marks the path
    /// seen in one step, so two callers can never both admit the same path.
    pub fn admit(&self, path: &Path) -> bool {
        let path = normalize(path);
        if !self.passes_baseline(&path) {
            return false;
        }
        self.seen.lock().insert(path)
    }

    /// Records `path` as handled. There is no way to forget a path.
    pub fn mark_seen(&self, path: &Path) {
        self.seen.lock().insert(normalize(path));
    }

    pub fn is_seen(&self, path: &Path) -> bool {
        self.seen.lock().contains(&normalize(path))
    }

    fn passes_baseline(&self, path: &Path) -> bool {
        self.process_existing_on_start || !self.baseline.contains(path)
    }
}
