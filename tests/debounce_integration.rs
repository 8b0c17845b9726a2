use sloan_core::error::SloanError;
use sloan_core::watcher::ReadySink;
use sloan_core::watcher::debounce::Debouncer;
use sloan_core::watcher::stability::StabilityWindow;
use sloan_core::watcher::suppress::{self, LOCK_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

type Hits = Arc<Mutex<Vec<PathBuf>>>;

fn recording_sink() -> (Hits, Arc<dyn ReadySink>) {
    let hits: Hits = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&hits);
    let sink: Arc<dyn ReadySink> =
        Arc::new(move |path: &Path| recorder.lock().unwrap().push(path.to_path_buf()));
    (hits, sink)
}

fn fast_window() -> StabilityWindow {
    StabilityWindow::new(Duration::from_millis(60), 20, Duration::from_millis(20))
}

fn slow_window() -> StabilityWindow {
    StabilityWindow::new(Duration::from_millis(300), 30, Duration::from_millis(20))
}

#[test]
fn settled_file_is_reported_once() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path());

    let path = tmpdir.path().join("Jane Doe invoice.pdf");
    fs::write(&path, b"%PDF-1.7")?;

    assert!(debouncer.on_event(&path));
    thread::sleep(Duration::from_millis(600));

    let hits = hits.lock().unwrap();
    assert_eq!(hits.as_slice(), &[path]);
    Ok(())
}

#[test]
fn rapid_events_deliver_only_the_latest_check() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let seen: Arc<Mutex<Vec<(u64, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let sink: Arc<dyn ReadySink> = Arc::new(move |path: &Path| {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        recorder.lock().unwrap().push((size, Instant::now()));
    });
    let window = StabilityWindow::new(Duration::from_millis(200), 40, Duration::from_millis(20));
    let debouncer = Debouncer::new(window, sink).scoped_to(tmpdir.path());

    let path = tmpdir.path().join("report.pdf");
    fs::write(&path, b"report")?;
    assert!(debouncer.on_event(&path));

    thread::sleep(Duration::from_millis(100));
    fs::write(&path, b"report, revised")?;
    let second_event = Instant::now();
    assert!(debouncer.on_event(&path));
    assert_eq!(debouncer.pending_count(), 1, "only one pending check per path");

    thread::sleep(Duration::from_millis(900));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "superseded check must not deliver");
    let (size, delivered_at) = seen[0];
    assert_eq!(size, b"report, revised".len() as u64);
    assert!(
        delivered_at.duration_since(second_event) >= Duration::from_millis(200),
        "delivery waits a full quiet window after the latest event"
    );
    Ok(())
}

#[test]
fn sink_may_call_back_into_the_debouncer() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let handle: Arc<OnceLock<Arc<Debouncer>>> = Arc::new(OnceLock::new());
    let observed: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

    let sink_handle = Arc::clone(&handle);
    let recorder = Arc::clone(&observed);
    let sink: Arc<dyn ReadySink> = Arc::new(move |_: &Path| {
        if let Some(debouncer) = sink_handle.get() {
            recorder.lock().unwrap().push(debouncer.pending_count());
        }
    });
    let debouncer = Arc::new(Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path()));
    assert!(handle.set(Arc::clone(&debouncer)).is_ok());

    let path = tmpdir.path().join("callback.pdf");
    fs::write(&path, b"callback")?;
    assert!(debouncer.on_event(&path));

    thread::sleep(Duration::from_millis(600));
    assert_eq!(observed.lock().unwrap().as_slice(), &[0], "entry removed before the sink runs");
    assert!(!debouncer.is_pending(&path));
    Ok(())
}

#[test]
fn many_events_during_a_write_burst_still_deliver_once() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path());

    let path = tmpdir.path().join("stream.mov");
    for i in 0..5 {
        fs::write(&path, vec![0u8; 100 * (i + 1)])?;
        debouncer.on_event(&path);
        thread::sleep(Duration::from_millis(10));
    }

    thread::sleep(Duration::from_millis(800));
    assert_eq!(hits.lock().unwrap().len(), 1);
    assert!(!debouncer.is_pending(&path));
    Ok(())
}

#[test]
fn different_paths_are_checked_independently() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path());

    for i in 0..3 {
        let path = tmpdir.path().join(format!("Concurrent {i}.pdf"));
        fs::write(&path, format!("file {i}"))?;
        debouncer.on_event(&path);
    }
    assert_eq!(debouncer.pending_count(), 3);

    thread::sleep(Duration::from_millis(800));
    assert_eq!(hits.lock().unwrap().len(), 3);
    assert_eq!(debouncer.pending_count(), 0);
    Ok(())
}

#[test]
fn temporary_files_are_never_reported() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path());

    let path = tmpdir.path().join("setup.exe.crdownload");
    fs::write(&path, vec![0u8; 64])?;
    debouncer.on_event(&path);

    thread::sleep(Duration::from_millis(500));
    assert!(hits.lock().unwrap().is_empty());
    assert!(!debouncer.is_pending(&path), "entry removed even when nothing fires");
    Ok(())
}

#[test]
fn lock_acquired_mid_flight_suppresses_delivery() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(slow_window(), sink).scoped_to(tmpdir.path());

    let path = tmpdir.path().join("contract.pdf");
    fs::write(&path, b"contract")?;

    assert!(debouncer.on_event(&path));
    thread::sleep(Duration::from_millis(50));
    suppress::acquire(tmpdir.path())?;

    thread::sleep(Duration::from_millis(900));
    assert!(
        hits.lock().unwrap().is_empty(),
        "no notification while the rename lock exists"
    );

    suppress::release(tmpdir.path())?;
    Ok(())
}

#[test]
fn lock_present_at_schedule_time_suppresses_delivery() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path());

    suppress::acquire(tmpdir.path())?;
    let path = tmpdir.path().join("renamed.pdf");
    fs::write(&path, b"renamed")?;
    debouncer.on_event(&path);

    thread::sleep(Duration::from_millis(400));
    assert!(hits.lock().unwrap().is_empty());
    assert!(!debouncer.is_pending(&path));

    suppress::release(tmpdir.path())?;
    Ok(())
}

#[test]
fn non_children_and_lock_marker_are_not_scheduled() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (_hits, sink) = recording_sink();
    let debouncer = Debouncer::new(fast_window(), sink).scoped_to(tmpdir.path());

    let nested_dir = tmpdir.path().join("subdir");
    fs::create_dir(&nested_dir)?;
    let nested = nested_dir.join("nested.pdf");
    fs::write(&nested, b"nested")?;

    let lock = tmpdir.path().join(LOCK_FILE_NAME);
    fs::write(&lock, b"1")?;

    assert!(!debouncer.on_event(&nested), "subdirectory contents are out of scope");
    assert!(!debouncer.on_event(&nested_dir), "directories are ignored");
    assert!(!debouncer.on_event(&lock), "the lock marker is ignored");
    assert!(!debouncer.on_event(&tmpdir.path().join("missing.pdf")));
    assert_eq!(debouncer.pending_count(), 0);
    Ok(())
}

#[test]
fn cancel_all_discards_in_flight_checks() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let (hits, sink) = recording_sink();
    let debouncer = Debouncer::new(slow_window(), sink).scoped_to(tmpdir.path());

    let path = tmpdir.path().join("late.pdf");
    fs::write(&path, b"late")?;
    debouncer.on_event(&path);
    debouncer.cancel_all();
    assert_eq!(debouncer.pending_count(), 0);

    thread::sleep(Duration::from_millis(900));
    assert!(hits.lock().unwrap().is_empty());
    Ok(())
}
