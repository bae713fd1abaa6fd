//! Integration tests for the merge pipeline.

use pdfmerge::Config;
use pdfmerge::app::App;
use pdfmerge::config::CompressionLevel;
use pdfmerge::engine::LopdfEngine;
use pdfmerge::merge::{MergePhase, MergeProgress, NoProgress};
use pdfmerge::workspace::Workspace;
use rstest::rstest;
use std::time::Duration;
use tempfile::TempDir;

use crate::common::{labels_of, memory_pdf, write_pdf};

fn workspace() -> Workspace<LopdfEngine> {
    Workspace::new(LopdfEngine::default()).with_display_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_pages_follow_list_order() {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 3), memory_pdf("B", 2)]).unwrap();

    let artifact = ws.merge(&mut NoProgress).await.unwrap();

    assert_eq!(
        labels_of(&artifact.bytes),
        ["A-1", "A-2", "A-3", "B-1", "B-2"]
    );
    assert_eq!(artifact.statistics.files_merged, 2);
    assert_eq!(artifact.statistics.total_pages, 5);
    assert_eq!(artifact.mime_type, "application/pdf");
}

#[tokio::test]
async fn test_reordered_list_reorders_pages() {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 1), memory_pdf("B", 1), memory_pdf("C", 2)])
        .unwrap();

    let rows = ws.rows();
    ws.drag_start(rows[2].id).unwrap();
    ws.drag_over(rows[0].id);
    ws.drop_on(rows[0].id).unwrap();

    let artifact = ws.merge(&mut NoProgress).await.unwrap();
    assert_eq!(labels_of(&artifact.bytes), ["C-1", "C-2", "A-1", "B-1"]);
}

#[rstest]
#[case("report", "report.pdf")]
#[case("  quarterly report  ", "quarterly report.pdf")]
#[case("   ", "merged.pdf")]
#[case("", "merged.pdf")]
#[tokio::test]
async fn test_artifact_naming(#[case] name: &str, #[case] expected: &str) {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 1), memory_pdf("B", 1)]).unwrap();
    ws.set_output_name(name);

    let artifact = ws.merge(&mut NoProgress).await.unwrap();
    assert_eq!(artifact.file_name, expected);
}

#[tokio::test]
async fn test_progress_sequence() {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 1), memory_pdf("B", 1), memory_pdf("C", 1)])
        .unwrap();

    let mut seen: Vec<MergeProgress> = Vec::new();
    let mut sink = |progress: &MergeProgress| seen.push(progress.clone());
    ws.merge(&mut sink).await.unwrap();

    let percents: Vec<u8> = seen.iter().map(|p| p.percent).collect();
    assert_eq!(percents, [0, 0, 30, 60, 95, 100]);

    assert_eq!(seen[0].message, "Loading PDF library...");
    assert_eq!(seen[2].message, "Processing B.pdf...");
    assert_eq!(seen[4].message, "Generating merged PDF...");
    assert_eq!(seen[5].message, "Done! PDF merged successfully!");
    assert_eq!(seen[5].phase, MergePhase::Done);
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_compression_levels_keep_pages(#[case] level: CompressionLevel) {
    let mut ws = Workspace::new(LopdfEngine::new(level)).with_display_delay(Duration::ZERO);
    ws.add_files([memory_pdf("A", 2), memory_pdf("B", 1)]).unwrap();

    let artifact = ws.merge(&mut NoProgress).await.unwrap();
    assert_eq!(labels_of(&artifact.bytes), ["A-1", "A-2", "B-1"]);
}

#[tokio::test]
async fn test_merge_from_disk_writes_named_file() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "A", 3);
    let b = write_pdf(&dir, "B", 2);

    let config = Config {
        output_dir: dir.path().to_path_buf(),
        output_name: "combined".to_string(),
        display_delay: Duration::ZERO,
        quiet: true,
        ..Config::default()
    };
    let mut app = App::new(config);
    app.add_paths([a, b]).await.unwrap();

    let outcome = app.merge_to_disk(&mut |_: &str| false).await.unwrap();

    let written = dir.path().join("combined.pdf");
    assert_eq!(outcome.write_stats.output_path, written);
    let bytes = std::fs::read(&written).unwrap();
    assert_eq!(labels_of(&bytes), ["A-1", "A-2", "A-3", "B-1", "B-2"]);

    let report = outcome.artifact.report();
    assert_eq!(report.file_name, "combined.pdf");
    assert_eq!(report.total_pages, 5);
    assert_eq!(report.output_size, bytes.len() as u64);
}

#[tokio::test]
async fn test_list_is_reusable_after_merge() {
    let mut ws = workspace();
    ws.add_files([memory_pdf("A", 1), memory_pdf("B", 1)]).unwrap();

    ws.merge(&mut NoProgress).await.unwrap();
    ws.add_files([memory_pdf("C", 1)]).unwrap();
    let artifact = ws.merge(&mut NoProgress).await.unwrap();

    assert_eq!(labels_of(&artifact.bytes), ["A-1", "B-1", "C-1"]);
}
