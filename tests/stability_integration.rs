use sloan_core::error::SloanError;
use sloan_core::watcher::stability::{StabilityWindow, is_stable, is_temporary};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const DELAY: Duration = Duration::from_millis(30);

#[test]
fn temporary_names_are_classified() {
    assert!(is_temporary(Path::new("/dl/report.crdownload")));
    assert!(is_temporary(Path::new("/dl/report.opdownload")));
    assert!(is_temporary(Path::new("/dl/movie.PART")));
    assert!(is_temporary(Path::new("/dl/setup.tmp")));
    assert!(is_temporary(Path::new("/dl/~$Budget.xlsx")));

    assert!(!is_temporary(Path::new("/dl/report.pdf")));
    assert!(!is_temporary(Path::new("/dl/partial.pdf")));
    assert!(!is_temporary(Path::new("/dl/tmp")));
}

#[test]
fn temporary_files_never_stabilize() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    for name in ["report.crdownload", "~$Quote.docx", "video.part"] {
        let path = tmpdir.path().join(name);
        fs::write(&path, vec![0u8; 100])?;
        assert!(
            !is_stable(&path, Duration::ZERO, 4, DELAY),
            "{name} should never be considered stable"
        );
    }
    Ok(())
}

#[test]
fn unchanged_file_is_stable() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let path = tmpdir.path().join("Jane Doe quote.pdf");
    fs::write(&path, vec![7u8; 100])?;

    // Four samples of the same size span three delays.
    assert!(is_stable(&path, DELAY * 3, 4, DELAY));
    Ok(())
}

#[test]
fn missing_file_and_directories_are_not_stable() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    assert!(!is_stable(&tmpdir.path().join("gone.pdf"), Duration::ZERO, 3, DELAY));

    let dir = tmpdir.path().join("folder");
    fs::create_dir(&dir)?;
    assert!(!is_stable(&dir, Duration::ZERO, 3, DELAY));
    Ok(())
}

#[test]
fn file_growing_through_budget_is_not_stable() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let path = tmpdir.path().join("stream.mp4");
    fs::write(&path, vec![1u8; 100])?;

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_millis(600);
        while Instant::now() < deadline {
            let mut file = OpenOptions::new().append(true).open(&writer_path).unwrap();
            file.write_all(&[2u8; 50]).unwrap();
            thread::sleep(Duration::from_millis(10));
        }
    });

    let stable = is_stable(&path, Duration::from_millis(100), 10, DELAY);
    writer.join().unwrap();

    assert!(!stable, "a file still growing should not settle");
    Ok(())
}

#[test]
fn file_settles_once_writes_stop() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let path = tmpdir.path().join("download.zip");
    fs::write(&path, vec![1u8; 100])?;

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        for _ in 0..2 {
            thread::sleep(Duration::from_millis(20));
            let mut file = OpenOptions::new().append(true).open(&writer_path).unwrap();
            file.write_all(&[2u8; 50]).unwrap();
        }
    });

    let started = Instant::now();
    let stable = is_stable(&path, Duration::from_millis(100), 40, Duration::from_millis(25));
    writer.join().unwrap();

    assert!(stable, "file should settle after the tail plateau");
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(fs::metadata(&path)?.len(), 200);
    Ok(())
}

#[test]
fn plateau_shorter_than_quiet_window_is_not_stable() -> Result<(), SloanError> {
    let tmpdir = TempDir::new()?;
    let path = tmpdir.path().join("photo.jpg");
    fs::write(&path, vec![1u8; 100])?;

    // Budget of 4 samples 30ms apart can never observe a 1s quiet window.
    assert!(!is_stable(&path, Duration::from_secs(1), 4, DELAY));
    Ok(())
}

#[test]
fn window_for_quiet_covers_the_quiet_period() {
    let default = StabilityWindow::for_quiet(Duration::from_millis(1500));
    assert_eq!(default.sample_count, 6);
    assert_eq!(default.sample_delay, Duration::from_millis(400));
    assert_eq!(default.budget(), Duration::from_millis(2400));
    assert_eq!(StabilityWindow::default(), default);

    let long = StabilityWindow::for_quiet(Duration::from_secs(5));
    assert!(long.budget() > long.quiet);
    assert_eq!(long.sample_count, 15);
}
