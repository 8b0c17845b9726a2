use std::fs::{self, File};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Extensions browsers and download managers use for partial files.
pub const TEMP_EXTENSIONS: [&str; 4] = ["crdownload", "opdownload", "tmp", "part"];

/// Name prefixes of editor lock files (e.g. Office's `~$report.docx`).
pub const TEMP_PREFIXES: [&str; 1] = ["~$"];

const DEFAULT_SAMPLE_DELAY: Duration = Duration::from_millis(400);
const MIN_SAMPLE_COUNT: u32 = 6;

/// Returns true if `path` names a partial download or an editor lock file.
pub fn is_temporary(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();

    let temp_ext = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMP_EXTENSIONS.contains(&ext));

    temp_ext || TEMP_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// How long a file must stay the same size, and how it is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityWindow {
    pub quiet: Duration,
    pub sample_count: u32,
    pub sample_delay: Duration,
}

impl StabilityWindow {
    pub fn new(quiet: Duration, sample_count: u32, sample_delay: Duration) -> Self {
        Self {
            quiet,
            sample_count,
            sample_delay,
        }
    }

    /// Builds a window whose sampling budget is long enough to observe `quiet`.
    ///
    /// Samples every 400ms, at least 6 times, plus two spare samples beyond
    /// the quiet window so a plateau that starts on the first sample can be seen.
    pub fn for_quiet(quiet: Duration) -> Self {
        let needed = quiet.as_secs_f64() / DEFAULT_SAMPLE_DELAY.as_secs_f64();
        let sample_count = (needed.ceil() as u32).saturating_add(2).max(MIN_SAMPLE_COUNT);
        Self::new(quiet, sample_count, DEFAULT_SAMPLE_DELAY)
    }

    /// Total time a single probe may spend sampling.
    pub fn budget(&self) -> Duration {
        self.sample_delay.saturating_mul(self.sample_count)
    }

    pub fn is_stable(&self, path: &Path) -> bool {
        is_stable(path, self.quiet, self.sample_count, self.sample_delay)
    }
}

impl Default for StabilityWindow {
    fn default() -> Self {
        Self::for_quiet(Duration::from_millis(1500))
    }
}

/// Blocks while sampling `path`'s size and decides whether it has settled.
///
/// A file is settled when it is a regular, non-temporary file whose size has
/// not changed for at least `quiet` and which can be opened for reading.
/// Sizes are sampled up to `sample_count` times, `sample_delay` apart; running
/// out of samples, or any error reading the size, means "not yet".
///
/// Must not be called on the event-delivery thread.
pub fn is_stable(path: &Path, quiet: Duration, sample_count: u32, sample_delay: Duration) -> bool {
    if !path.is_file() || is_temporary(path) {
        return false;
    }

    let mut last_size: Option<u64> = None;
    let mut quiet_start = Instant::now();

    for _ in 0..sample_count {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "size query failed during probe");
                return false;
            }
        };

        if last_size != Some(size) {
            last_size = Some(size);
            quiet_start = Instant::now();
        } else if quiet_start.elapsed() >= quiet {
            // A writer holding an exclusive lock can keep the size constant.
            return match File::open(path) {
                Ok(_) => true,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "open probe failed");
                    false
                }
            };
        }

        thread::sleep(sample_delay);
    }

    debug!(path = %path.display(), "sampling budget exhausted before quiet window");
    false
}
