//! Merge pipeline.
//!
//! [`MergeOrchestrator`] turns an ordered snapshot of staged entries into one
//! PDF artifact. The pipeline is strictly sequential; each file goes through
//! read, parse and page copy before the next one is touched:
//!
//! ```text
//! Idle -> Loading -> Processing(0) -> ... -> Processing(n-1) -> Saving -> Done
//!            \____________________ any failure ____________________/-> Failed
//! ```
//!
//! Progress is reported through a [`ProgressSink`]. The serialized artifact
//! is handed to a [`Deliver`] before `Done` is reported, so a failed delivery
//! fails the merge. The first failure aborts the whole merge; work done for
//! earlier files is discarded and no artifact is produced. There is no
//! cancellation once a merge has started.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::output_file_name;
use crate::engine::PdfEngine;
use crate::error::{MERGE_FAILED_ALERT, PdfMergeError, Result};
use crate::list::{DocumentEntry, MIN_MERGE_FILES};
use crate::source::PDF_MIME_TYPE;
use crate::utils::format_file_size;

/// Share of the progress range spent on per-file processing.
const PROCESSING_SPAN: usize = 90;

/// Progress reported while the merged document is serialized.
const SAVING_PERCENT: u8 = 95;

/// Phase of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MergePhase {
    /// No merge running.
    Idle,
    /// Destination document is being prepared.
    Loading,
    /// Entry `index` of `total` is being read, parsed and copied.
    Processing {
        /// Zero-based entry position.
        index: usize,
        /// Number of entries in the merge.
        total: usize,
    },
    /// Merged document is being serialized.
    Saving,
    /// Artifact produced.
    Done,
    /// Merge aborted.
    Failed,
}

/// Progress shown to the user during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeProgress {
    /// Current phase.
    pub phase: MergePhase,
    /// Completion in percent, `0..=100`.
    pub percent: u8,
    /// Status line.
    pub message: String,
}

impl MergeProgress {
    fn new(phase: MergePhase, percent: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent,
            message: message.into(),
        }
    }

    /// Initial progress before any file is touched.
    pub fn loading() -> Self {
        Self::new(MergePhase::Loading, 0, "Loading PDF library...")
    }

    /// Progress when entry `index` of `total` starts.
    pub fn processing(index: usize, total: usize, name: &str) -> Self {
        let percent = (index * PROCESSING_SPAN / total.max(1)) as u8;
        Self::new(
            MergePhase::Processing { index, total },
            percent,
            format!("Processing {name}..."),
        )
    }

    /// Progress while the merged document is serialized.
    pub fn saving() -> Self {
        Self::new(MergePhase::Saving, SAVING_PERCENT, "Generating merged PDF...")
    }

    /// Final progress on success.
    pub fn done() -> Self {
        Self::new(MergePhase::Done, 100, "Done! PDF merged successfully!")
    }

    /// Progress after an abort at `percent`.
    pub fn failed(percent: u8, error: &PdfMergeError) -> Self {
        Self::new(
            MergePhase::Failed,
            percent,
            format!("{MERGE_FAILED_ALERT}: {error}"),
        )
    }
}

/// Receiver of merge progress updates.
pub trait ProgressSink: Send {
    /// A new progress state is available.
    fn update(&mut self, progress: &MergeProgress);

    /// Progress is no longer relevant and should be hidden.
    fn reset(&mut self) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&MergeProgress) + Send,
{
    fn update(&mut self, progress: &MergeProgress) {
        self(progress)
    }
}

/// A sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _progress: &MergeProgress) {}
}

/// Destination of a finished artifact.
///
/// Called once per successful merge, after serialization and before `Done`
/// is reported. An error aborts the merge like any other step.
pub trait Deliver: Send {
    /// Hand `artifact` over to its destination.
    fn deliver<'a>(&'a mut self, artifact: &'a MergedArtifact) -> BoxFuture<'a, Result<()>>;
}

/// Leaves the artifact with the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepArtifact;

impl Deliver for KeepArtifact {
    fn deliver<'a>(&'a mut self, _artifact: &'a MergedArtifact) -> BoxFuture<'a, Result<()>> {
        futures::future::ready(Ok(())).boxed()
    }
}

/// Statistics about a merge operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStatistics {
    /// Number of files merged.
    pub files_merged: usize,
    /// Total number of pages in the merged document.
    pub total_pages: usize,
    /// Bytes read from all sources.
    pub input_size: u64,
    /// Wall time from start to serialized artifact.
    pub merge_time: Duration,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }
}

/// The downloadable result of a merge.
#[derive(Debug, Clone)]
pub struct MergedArtifact {
    /// File name, always ending in `.pdf`.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Serialized PDF.
    pub bytes: Vec<u8>,
    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

impl MergedArtifact {
    /// Machine-readable summary.
    pub fn report(&self) -> MergeReport {
        MergeReport {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type,
            files_merged: self.statistics.files_merged,
            total_pages: self.statistics.total_pages,
            input_size: self.statistics.input_size,
            output_size: self.bytes.len() as u64,
            merge_time_ms: self.statistics.merge_time.as_millis() as u64,
        }
    }
}

/// Serializable summary of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Artifact file name.
    pub file_name: String,
    /// Artifact MIME type.
    pub mime_type: &'static str,
    /// Number of files merged.
    pub files_merged: usize,
    /// Total pages in the artifact.
    pub total_pages: usize,
    /// Bytes read from all sources.
    pub input_size: u64,
    /// Size of the artifact in bytes.
    pub output_size: u64,
    /// Merge duration in milliseconds.
    pub merge_time_ms: u64,
}

/// Sequential merge pipeline over a [`PdfEngine`].
#[derive(Debug)]
pub struct MergeOrchestrator<E> {
    engine: Arc<E>,
}

impl<E> Clone for MergeOrchestrator<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: PdfEngine> MergeOrchestrator<E> {
    /// Create an orchestrator driving `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// The engine used for parse/copy/save.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Merge `entries`, in order, into one artifact named after `output_name`.
    ///
    /// `entries` should be a snapshot of the file list taken when the merge
    /// was triggered; the pipeline never looks at the live list.
    ///
    /// # Errors
    ///
    /// - [`PdfMergeError::InsufficientFiles`] if fewer than two entries are
    ///   given. Nothing is reported to `sink` in that case.
    /// - [`PdfMergeError::ReadFailed`], [`PdfMergeError::Parse`],
    ///   [`PdfMergeError::Encrypted`] or [`PdfMergeError::MergeFailed`] if any
    ///   step fails. `sink` receives a [`MergePhase::Failed`] update.
    pub async fn merge(
        &self,
        entries: &[DocumentEntry],
        output_name: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<MergedArtifact> {
        self.merge_into(entries, output_name, sink, &mut KeepArtifact)
            .await
    }

    /// Like [`MergeOrchestrator::merge`], handing the artifact to `delivery`
    /// before reporting `Done`.
    ///
    /// # Errors
    ///
    /// Everything [`MergeOrchestrator::merge`] returns, plus whatever
    /// `delivery` fails with. A delivery failure is reported to `sink` as
    /// [`MergePhase::Failed`] and `Done` is never reported.
    pub async fn merge_into(
        &self,
        entries: &[DocumentEntry],
        output_name: &str,
        sink: &mut dyn ProgressSink,
        delivery: &mut dyn Deliver,
    ) -> Result<MergedArtifact> {
        if entries.len() < MIN_MERGE_FILES {
            return Err(PdfMergeError::InsufficientFiles {
                count: entries.len(),
            });
        }

        tracing::info!(files = entries.len(), "starting merge");
        let mut progress = Tracked { sink, percent: 0 };

        match self.run(entries, output_name, &mut progress, delivery).await {
            Ok(artifact) => {
                tracing::info!(
                    file_name = %artifact.file_name,
                    pages = artifact.statistics.total_pages,
                    "merge finished"
                );
                Ok(artifact)
            }
            Err(err) => {
                tracing::warn!(error = %err, "merge aborted");
                let failed = MergeProgress::failed(progress.percent, &err);
                progress.sink.update(&failed);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        entries: &[DocumentEntry],
        output_name: &str,
        progress: &mut Tracked<'_>,
        delivery: &mut dyn Deliver,
    ) -> Result<MergedArtifact> {
        let start = Instant::now();
        progress.report(MergeProgress::loading());

        let engine = Arc::clone(&self.engine);
        let mut merged = run_blocking(move || engine.create()).await?;

        let total = entries.len();
        let mut input_size = 0;

        for (index, entry) in entries.iter().enumerate() {
            progress.report(MergeProgress::processing(index, total, entry.name()));

            let bytes = entry.read_content().await?;
            input_size += bytes.len() as u64;
            tracing::debug!(name = entry.name(), bytes = bytes.len(), "read source");

            let engine = Arc::clone(&self.engine);
            let name = entry.name().to_string();
            merged = run_blocking(move || {
                let source = engine.load(&name, &bytes)?;
                let indices = engine.page_indices(&source);
                let pages = engine.copy_pages(&mut merged, &source, &indices)?;
                for page in pages {
                    engine.add_page(&mut merged, page)?;
                }
                Ok(merged)
            })
            .await?;
        }

        progress.report(MergeProgress::saving());

        let engine = Arc::clone(&self.engine);
        let (bytes, total_pages) = run_blocking(move || {
            let total_pages = engine.page_count(&merged);
            let bytes = engine.save(&mut merged)?;
            Ok((bytes, total_pages))
        })
        .await?;

        let artifact = MergedArtifact {
            file_name: output_file_name(output_name),
            mime_type: PDF_MIME_TYPE,
            bytes,
            statistics: MergeStatistics {
                files_merged: total,
                total_pages,
                input_size,
                merge_time: start.elapsed(),
            },
        };

        delivery.deliver(&artifact).await?;
        tracing::debug!(file_name = %artifact.file_name, "artifact delivered");

        progress.report(MergeProgress::done());
        Ok(artifact)
    }
}

/// Sink wrapper remembering the last reported percentage.
struct Tracked<'a> {
    sink: &'a mut dyn ProgressSink,
    percent: u8,
}

impl Tracked<'_> {
    fn report(&mut self, progress: MergeProgress) {
        self.percent = progress.percent;
        self.sink.update(&progress);
    }
}

/// Run CPU-bound engine work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| PdfMergeError::merge_failed(format!("Engine task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::FileList;
    use crate::source::{FileSource, MemoryFile};
    use rstest::rstest;
    use std::io;
    use std::sync::Mutex;

    /// Engine over a toy format: `"<label>:<pages>"`.
    #[derive(Debug, Default)]
    struct FakeEngine {
        loads: Mutex<Vec<String>>,
        fail_save: bool,
    }

    impl PdfEngine for FakeEngine {
        type Document = Vec<String>;
        type Page = String;

        fn create(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn load(&self, name: &str, bytes: &[u8]) -> Result<Vec<String>> {
            self.loads.lock().unwrap().push(name.to_string());
            let text = String::from_utf8_lossy(bytes);
            let (label, pages) = text
                .split_once(':')
                .ok_or_else(|| PdfMergeError::parse(name, "invalid file header"))?;
            let pages: usize = pages
                .parse()
                .map_err(|_| PdfMergeError::parse(name, "bad page count"))?;
            Ok((1..=pages).map(|n| format!("{label}.p{n}")).collect())
        }

        fn page_indices(&self, doc: &Vec<String>) -> Vec<usize> {
            (0..doc.len()).collect()
        }

        fn copy_pages(
            &self,
            _dest: &mut Vec<String>,
            src: &Vec<String>,
            indices: &[usize],
        ) -> Result<Vec<String>> {
            Ok(indices.iter().map(|&i| src[i].clone()).collect())
        }

        fn add_page(&self, dest: &mut Vec<String>, page: String) -> Result<()> {
            dest.push(page);
            Ok(())
        }

        fn save(&self, doc: &mut Vec<String>) -> Result<Vec<u8>> {
            if self.fail_save {
                return Err(PdfMergeError::merge_failed("disk full"));
            }
            Ok(doc.join(",").into_bytes())
        }
    }

    #[derive(Debug)]
    struct UnreadableFile;

    impl FileSource for UnreadableFile {
        fn name(&self) -> &str {
            "gone.pdf"
        }

        fn size(&self) -> u64 {
            0
        }

        fn mime_type(&self) -> &str {
            PDF_MIME_TYPE
        }

        fn read_all(&self) -> BoxFuture<'_, io::Result<Vec<u8>>> {
            futures::future::ready(Err(io::Error::new(io::ErrorKind::NotFound, "removed")))
                .boxed()
        }
    }

    fn entries(files: &[(&str, &str)]) -> Vec<DocumentEntry> {
        let mut list = FileList::new();
        list.add(files.iter().map(|(name, content)| {
            Arc::new(MemoryFile::pdf(*name, content.as_bytes().to_vec())) as Arc<dyn FileSource>
        }))
        .unwrap();
        list.snapshot()
    }

    fn recorder() -> (Arc<Mutex<Vec<MergeProgress>>>, impl FnMut(&MergeProgress) + Send) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink_log = Arc::clone(&log);
        (log, move |p: &MergeProgress| {
            sink_log.lock().unwrap().push(p.clone())
        })
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_list_order() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:3"), ("B.pdf", "B:2")]);

        let artifact = orchestrator
            .merge(&entries, "report", &mut NoProgress)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(artifact.bytes).unwrap(),
            "A.p1,A.p2,A.p3,B.p1,B.p2"
        );
        assert_eq!(artifact.file_name, "report.pdf");
        assert_eq!(artifact.mime_type, "application/pdf");
        assert_eq!(artifact.statistics.files_merged, 2);
        assert_eq!(artifact.statistics.total_pages, 5);
        assert_eq!(artifact.statistics.input_size, 6);
    }

    #[rstest]
    #[case("  ", "merged.pdf")]
    #[case("", "merged.pdf")]
    #[case(" report ", "report.pdf")]
    #[tokio::test]
    async fn test_output_naming(#[case] raw: &str, #[case] expected: &str) {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:1"), ("B.pdf", "B:1")]);

        let artifact = orchestrator
            .merge(&entries, raw, &mut NoProgress)
            .await
            .unwrap();
        assert_eq!(artifact.file_name, expected);
    }

    #[tokio::test]
    async fn test_insufficient_files() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:3")]);
        let (log, mut sink) = recorder();

        let result = orchestrator.merge(&entries, "", &mut sink).await;

        assert!(matches!(
            result,
            Err(PdfMergeError::InsufficientFiles { count: 1 })
        ));
        assert!(log.lock().unwrap().is_empty());
        assert!(orchestrator.engine().loads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_sequence() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:1"), ("B.pdf", "B:1"), ("C.pdf", "C:1")]);
        let (log, mut sink) = recorder();

        orchestrator.merge(&entries, "", &mut sink).await.unwrap();

        let log = log.lock().unwrap();
        let steps: Vec<(u8, &str)> = log
            .iter()
            .map(|p| (p.percent, p.message.as_str()))
            .collect();
        assert_eq!(
            steps,
            vec![
                (0, "Loading PDF library..."),
                (0, "Processing A.pdf..."),
                (30, "Processing B.pdf..."),
                (60, "Processing C.pdf..."),
                (95, "Generating merged PDF..."),
                (100, "Done! PDF merged successfully!"),
            ]
        );
        assert_eq!(log[2].phase, MergePhase::Processing { index: 1, total: 3 });
        assert_eq!(log.last().unwrap().phase, MergePhase::Done);
    }

    #[rstest]
    #[case(0, 2, 0)]
    #[case(1, 2, 45)]
    #[case(1, 3, 30)]
    #[case(2, 3, 60)]
    #[case(6, 7, 77)]
    fn test_processing_percent_floors(
        #[case] index: usize,
        #[case] total: usize,
        #[case] expected: u8,
    ) {
        assert_eq!(MergeProgress::processing(index, total, "x").percent, expected);
    }

    #[tokio::test]
    async fn test_parse_failure_aborts_remaining_files() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:2"), ("B.pdf", "corrupt"), ("C.pdf", "C:1")]);
        let (log, mut sink) = recorder();

        let result = orchestrator.merge(&entries, "out", &mut sink).await;

        assert!(matches!(result, Err(PdfMergeError::Parse { ref name, .. }) if name == "B.pdf"));
        assert_eq!(
            *orchestrator.engine().loads.lock().unwrap(),
            vec!["A.pdf", "B.pdf"]
        );

        let log = log.lock().unwrap();
        let last = log.last().unwrap();
        assert_eq!(last.phase, MergePhase::Failed);
        assert_eq!(last.percent, 30);
        assert!(last.message.starts_with("Error merging PDFs:"));
        assert!(last.message.contains("B.pdf"));
    }

    #[tokio::test]
    async fn test_read_failure_is_merge_failure() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let mut list = FileList::new();
        list.add(vec![
            Arc::new(MemoryFile::pdf("A.pdf", b"A:1".to_vec())) as Arc<dyn FileSource>,
            Arc::new(UnreadableFile),
        ])
        .unwrap();

        let result = orchestrator
            .merge(&list.snapshot(), "", &mut NoProgress)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, PdfMergeError::ReadFailed { .. }));
        assert!(err.is_merge_failure());
    }

    #[tokio::test]
    async fn test_save_failure_reports_failed() {
        let engine = FakeEngine {
            fail_save: true,
            ..FakeEngine::default()
        };
        let orchestrator = MergeOrchestrator::new(engine);
        let entries = entries(&[("A.pdf", "A:1"), ("B.pdf", "B:1")]);
        let (log, mut sink) = recorder();

        let result = orchestrator.merge(&entries, "", &mut sink).await;

        assert!(matches!(result, Err(PdfMergeError::MergeFailed { .. })));
        let log = log.lock().unwrap();
        assert_eq!(log.last().unwrap().phase, MergePhase::Failed);
        assert_eq!(log.last().unwrap().percent, 95);
        assert!(log.iter().all(|p| p.phase != MergePhase::Done));
    }

    /// Records the last progress seen when the artifact arrives.
    struct Inbox {
        log: Arc<Mutex<Vec<MergeProgress>>>,
        seen_at_delivery: Option<MergePhase>,
        fail: bool,
    }

    impl Deliver for Inbox {
        fn deliver<'a>(&'a mut self, artifact: &'a MergedArtifact) -> BoxFuture<'a, Result<()>> {
            self.seen_at_delivery = self.log.lock().unwrap().last().map(|p| p.phase);
            let result = if self.fail {
                Err(PdfMergeError::merge_failed(format!(
                    "cannot store {}",
                    artifact.file_name
                )))
            } else {
                Ok(())
            };
            futures::future::ready(result).boxed()
        }
    }

    #[tokio::test]
    async fn test_delivery_happens_before_done() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:1"), ("B.pdf", "B:1")]);
        let (log, mut sink) = recorder();
        let mut inbox = Inbox {
            log: Arc::clone(&log),
            seen_at_delivery: None,
            fail: false,
        };

        orchestrator
            .merge_into(&entries, "", &mut sink, &mut inbox)
            .await
            .unwrap();

        assert_eq!(inbox.seen_at_delivery, Some(MergePhase::Saving));
        assert_eq!(log.lock().unwrap().last().unwrap().phase, MergePhase::Done);
    }

    #[tokio::test]
    async fn test_failed_delivery_never_reports_done() {
        let orchestrator = MergeOrchestrator::new(FakeEngine::default());
        let entries = entries(&[("A.pdf", "A:1"), ("B.pdf", "B:1")]);
        let (log, mut sink) = recorder();
        let mut inbox = Inbox {
            log: Arc::clone(&log),
            seen_at_delivery: None,
            fail: true,
        };

        let result = orchestrator
            .merge_into(&entries, "out", &mut sink, &mut inbox)
            .await;

        assert!(matches!(result, Err(PdfMergeError::MergeFailed { ref reason }) if reason.contains("out.pdf")));
        let log = log.lock().unwrap();
        assert!(log.iter().all(|p| p.phase != MergePhase::Done));
        let last = log.last().unwrap();
        assert_eq!(last.phase, MergePhase::Failed);
        assert_eq!(last.percent, 95);
    }

    #[test]
    fn test_report_serializes() {
        let artifact = MergedArtifact {
            file_name: "merged.pdf".to_string(),
            mime_type: PDF_MIME_TYPE,
            bytes: vec![0; 10],
            statistics: MergeStatistics {
                files_merged: 2,
                total_pages: 5,
                input_size: 2048,
                merge_time: Duration::from_millis(1500),
            },
        };

        let json = serde_json::to_value(artifact.report()).unwrap();
        assert_eq!(json["file_name"], "merged.pdf");
        assert_eq!(json["output_size"], 10);
        assert_eq!(json["merge_time_ms"], 1500);
        assert_eq!(artifact.statistics.format_input_size(), "2 KB");
    }
}
