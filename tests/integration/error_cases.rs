//! Integration tests for error handling and edge cases.

use pdfmerge::Config;
use pdfmerge::PdfMergeError;
use pdfmerge::app::App;
use pdfmerge::config::OverwriteMode;
use pdfmerge::engine::LopdfEngine;
use pdfmerge::merge::{MergePhase, MergeProgress, NoProgress};
use pdfmerge::output::{MessageLevel, OutputFormatter};
use pdfmerge::workspace::Workspace;
use std::time::Duration;
use tempfile::TempDir;

use crate::common::{memory_file, memory_pdf, write_pdf};

fn workspace() -> Workspace<LopdfEngine> {
    Workspace::new(LopdfEngine::default()).with_display_delay(Duration::ZERO)
}

fn disk_config(dir: &TempDir) -> Config {
    Config {
        output_dir: dir.path().to_path_buf(),
        display_delay: Duration::ZERO,
        quiet: true,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_single_file_is_not_enough() {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 1)]).unwrap();

    let mut updates = 0;
    let result = ws.merge(&mut |_: &MergeProgress| updates += 1).await;

    assert!(matches!(
        result,
        Err(PdfMergeError::InsufficientFiles { count: 1 })
    ));
    assert_eq!(updates, 0);
    assert_eq!(ws.list().len(), 1);
    assert!(!ws.is_merging());
}

#[tokio::test]
async fn test_second_file_parse_failure_aborts() {
    let mut ws = workspace();
    ws.add_files([
        memory_pdf("A", 2),
        memory_file("B.pdf", "application/pdf", b"definitely not a pdf"),
        memory_pdf("C", 1),
    ])
    .unwrap();

    let mut seen: Vec<MergeProgress> = Vec::new();
    let result = ws
        .merge(&mut |progress: &MergeProgress| seen.push(progress.clone()))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, PdfMergeError::Parse { ref name, .. } if name == "B.pdf"));
    assert!(err.is_merge_failure());

    let alert = OutputFormatter::quiet().render(MessageLevel::Error, &err.alert());
    assert!(alert.contains("Error merging PDFs: Failed to parse PDF: B.pdf"));

    let last = seen.last().unwrap();
    assert_eq!(last.phase, MergePhase::Failed);
    assert!(last.message.starts_with("Error merging PDFs: "));
    assert!(
        !seen.iter().any(|p| p.message.contains("C.pdf")),
        "files after the failure are never touched"
    );

    let names: Vec<_> = ws.rows().into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["A.pdf", "B.pdf", "C.pdf"]);
    assert!(ws.view().merge_enabled);
}

#[tokio::test]
async fn test_failed_merge_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "A", 1);
    let broken = dir.path().join("broken.pdf");
    std::fs::write(&broken, b"not a pdf either").unwrap();

    let mut app = App::new(disk_config(&dir));
    app.add_paths([a, broken.display().to_string()]).await.unwrap();

    let result = app.merge_to_disk(&mut |_: &str| true).await;

    assert!(matches!(result, Err(PdfMergeError::Parse { .. })));
    assert!(!dir.path().join("merged.pdf").exists());
    assert_eq!(app.workspace().list().len(), 2);
}

#[tokio::test]
async fn test_file_removed_after_staging() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "A", 1);
    let b = write_pdf(&dir, "B", 1);

    let mut app = App::new(disk_config(&dir));
    app.add_paths([a, b.clone()]).await.unwrap();
    std::fs::remove_file(&b).unwrap();

    let result = app.merge_to_disk(&mut |_: &str| true).await;

    let err = result.unwrap_err();
    assert!(matches!(err, PdfMergeError::ReadFailed { ref name, .. } if name == "B.pdf"));
    assert!(err.is_merge_failure());
}

#[tokio::test]
async fn test_no_clobber_protects_existing_output() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "A", 1);
    let b = write_pdf(&dir, "B", 1);
    let existing = dir.path().join("merged.pdf");
    std::fs::write(&existing, b"precious").unwrap();

    let mut config = disk_config(&dir);
    config.overwrite_mode = OverwriteMode::NoClobber;
    let mut app = App::new(config);
    app.add_paths([a, b]).await.unwrap();

    let err = app.merge_to_disk(&mut |_: &str| true).await.unwrap_err();

    assert!(matches!(err, PdfMergeError::OutputExists { .. }));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(std::fs::read(&existing).unwrap(), b"precious");
}

#[tokio::test]
async fn test_declined_overwrite_is_cancelled() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "A", 1);
    let b = write_pdf(&dir, "B", 1);
    std::fs::write(dir.path().join("merged.pdf"), b"keep").unwrap();

    let mut config = disk_config(&dir);
    config.quiet = false;
    let mut app = App::new(config);
    app.add_paths([a, b]).await.unwrap();

    let err = app.merge_to_disk(&mut |_: &str| false).await.unwrap_err();
    assert!(matches!(err, PdfMergeError::Cancelled));
    assert_eq!(err.exit_code(), 130);
}

#[tokio::test]
async fn test_merge_in_progress_guard() {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 1), memory_pdf("B", 1)]).unwrap();

    let job = ws.begin_merge().unwrap();
    assert!(matches!(
        ws.remove_at(0),
        Err(PdfMergeError::MergeInProgress)
    ));

    let artifact = job.run(&mut NoProgress).await.unwrap();
    ws.finish_merge();

    assert_eq!(artifact.statistics.files_merged, 2);
    assert!(ws.remove_at(0).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_output_fails_the_merge() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "A", 1);
    let b = write_pdf(&dir, "B", 1);
    std::fs::create_dir(dir.path().join("merged.pdf")).unwrap();

    let mut config = disk_config(&dir);
    config.overwrite_mode = OverwriteMode::Force;
    config.display_delay = Duration::from_millis(1500);
    let mut app = App::new(config);
    app.add_paths([a, b]).await.unwrap();

    let start = tokio::time::Instant::now();
    let err = app.merge_to_disk(&mut |_: &str| true).await.unwrap_err();

    assert!(matches!(err, PdfMergeError::FailedToWrite { .. }));
    assert!(start.elapsed() < Duration::from_millis(1500));
    assert!(err.alert().starts_with("Error merging PDFs: Failed to write"));
    assert_eq!(err.exit_code(), 5);
    assert!(dir.path().join("merged.pdf").is_dir());
}
