//! End-to-end integration tests for the PandaTools file pipeline.
//!
//! These tests drive a tool page the way a user would:
//! - Selecting and removing files
//! - Previewing, reordering and committing the order
//! - Submitting and classifying the service response
//! - Saving the resulting artifact

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use client::config::GalleryConfig;
use client::files::capture_paths;
use client::gallery::{GalleryItem, NoHitTest, YieldFrames};
use client::protocol::{
    Artifact, FileHandle, GestureEvent, Point, Result, ToolId, TransferEvent, TransferOutcome,
    TransferRequest,
};
use client::session::{FileListView, ToolContext, ToolPage, ViewerMode};
use client::transfer::{
    ArtifactSink, DirectorySink, ProgressReporter, ServiceResponse, TransferState, Transport,
};
use client::{GalleryLayout, ReorderMode};
use tempfile::TempDir;

const MIB: usize = 1024 * 1024;

/// What the transport saw for one request.
#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    tool: ToolId,
    field: &'static str,
    files: Vec<String>,
    params: BTreeMap<&'static str, String>,
}

/// Records every request and answers from a queue of canned responses.
#[derive(Default)]
struct RecordingTransport {
    requests: RefCell<Vec<Recorded>>,
    responses: RefCell<VecDeque<Result<ServiceResponse>>>,
}

impl RecordingTransport {
    fn answering(responses: Vec<Result<ServiceResponse>>) -> Self {
        Self {
            requests: RefCell::default(),
            responses: RefCell::new(responses.into()),
        }
    }

    fn recorded(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    async fn send(
        &self,
        request: &TransferRequest,
        progress: ProgressReporter,
    ) -> Result<ServiceResponse> {
        self.requests.borrow_mut().push(Recorded {
            tool: request.tool(),
            field: request.file_field(),
            files: request.files().iter().map(|f| f.name().to_string()).collect(),
            params: request.parameters().clone(),
        });
        progress.report(request.total_bytes() / 2);
        tokio::task::yield_now().await;
        progress.report(request.total_bytes());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(ServiceResponse::new(200, "%PDF")))
    }
}

fn tool_page(tool: ToolId, transport: &RecordingTransport) -> ToolPage<&RecordingTransport> {
    ToolPage::new(ToolContext::new(tool), transport, GalleryConfig::default())
}

fn pdf(name: &str, size: usize) -> FileHandle {
    FileHandle::from_bytes(name, "application/pdf", vec![0u8; size])
}

fn jpg(name: &str) -> FileHandle {
    FileHandle::from_bytes(name, "image/jpeg", vec![0u8; 256])
}

fn no_params() -> BTreeMap<String, String> {
    BTreeMap::new()
}

// =============================================================================
// Merge Scenario
// =============================================================================

#[tokio::test]
async fn test_merge_sends_files_in_selection_order() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::MergePdf, &transport);
    page.select(vec![pdf("A.pdf", MIB), pdf("B.pdf", 2 * MIB)])
        .unwrap();

    let outcome = page.submit(&no_params()).await;

    assert!(outcome.is_success());
    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].field, "files");
    assert_eq!(recorded[0].files, vec!["A.pdf", "B.pdf"]);
    assert!(recorded[0].params.is_empty());
}

#[tokio::test]
async fn test_merge_swap_before_submit_reverses_order() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::MergePdf, &transport);
    page.select(vec![pdf("A.pdf", MIB), pdf("B.pdf", 2 * MIB)])
        .unwrap();

    let mode = page.open_viewer().unwrap().clone();
    assert_eq!(mode, ViewerMode::Gallery(GalleryLayout::PdfRows));

    let viewer = page.viewer_mut().unwrap();
    let mut items: Vec<GalleryItem> = Vec::new();
    viewer.render(&mut items, &mut YieldFrames).await;
    assert_eq!(viewer.toggle_reorder(), Some(ReorderMode::Armed));
    viewer.render(&mut items, &mut YieldFrames).await;

    viewer.handle_gesture(GestureEvent::DragStart { index: 0 }, &NoHitTest);
    let response = viewer.handle_gesture(GestureEvent::Drop { index: 1 }, &NoHitTest);
    assert_eq!(response.swap, Some((0, 1)));
    viewer.render(&mut items, &mut YieldFrames).await;

    let outcome = page.submit(&no_params()).await;

    assert!(outcome.is_success());
    assert_eq!(transport.recorded()[0].files, vec!["B.pdf", "A.pdf"]);
    let names: Vec<_> = page.selection().files().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["B.pdf", "A.pdf"]);
}

#[tokio::test]
async fn test_touch_reorder_of_images() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::JpgToPdf, &transport);
    page.select(vec![jpg("1.jpg"), jpg("2.jpg"), jpg("3.jpg")])
        .unwrap();
    page.open_viewer().unwrap();

    let viewer = page.viewer_mut().unwrap();
    let mut items: Vec<GalleryItem> = Vec::new();
    viewer.toggle_reorder();
    viewer.render(&mut items, &mut YieldFrames).await;

    // 100px rows; drag the first image down onto the third.
    let rows = |p: Point| Some((p.y / 100.0) as usize).filter(|i| *i < 3);
    viewer.handle_gesture(
        GestureEvent::TouchStart {
            index: 0,
            point: Point::new(40.0, 50.0),
        },
        &rows,
    );
    let moved = viewer.handle_gesture(
        GestureEvent::TouchMove {
            point: Point::new(42.0, 120.0),
        },
        &rows,
    );
    assert!(moved.suppress_default);
    viewer.handle_gesture(
        GestureEvent::TouchEnd {
            point: Point::new(42.0, 250.0),
        },
        &rows,
    );

    page.submit(&no_params()).await;
    assert_eq!(transport.recorded()[0].files, vec!["3.jpg", "2.jpg", "1.jpg"]);
}

#[tokio::test]
async fn test_small_touch_does_not_reorder() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::JpgToPdf, &transport);
    page.select(vec![jpg("1.jpg"), jpg("2.jpg")]).unwrap();
    page.open_viewer().unwrap();

    let viewer = page.viewer_mut().unwrap();
    let mut items: Vec<GalleryItem> = Vec::new();
    viewer.toggle_reorder();
    viewer.render(&mut items, &mut YieldFrames).await;

    let rows = |p: Point| Some((p.y / 100.0) as usize).filter(|i| *i < 2);
    viewer.handle_gesture(
        GestureEvent::TouchStart {
            index: 0,
            point: Point::new(10.0, 95.0),
        },
        &rows,
    );
    viewer.handle_gesture(
        GestureEvent::TouchMove {
            point: Point::new(10.0, 103.0),
        },
        &rows,
    );
    viewer.handle_gesture(
        GestureEvent::TouchEnd {
            point: Point::new(10.0, 103.0),
        },
        &rows,
    );

    page.submit(&no_params()).await;
    assert_eq!(transport.recorded()[0].files, vec!["1.jpg", "2.jpg"]);
}

// =============================================================================
// Validation Scenarios
// =============================================================================

#[tokio::test]
async fn test_oversize_selection_rejected() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::MergePdf, &transport);

    let err = page
        .select(vec![pdf("a.pdf", 20 * MIB), pdf("b.pdf", 6 * MIB)])
        .unwrap_err();

    assert_eq!(err.to_string(), "Maximum allowed size is 25.0 MB");
    assert!(page.selection().is_empty());
    assert_eq!(page.file_list_view(), FileListView::Oversize);

    let outcome = page.submit(&no_params()).await;
    assert_eq!(outcome.message(), Some("Please select a file."));
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn test_compress_uses_elevated_ceiling() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::CompressPdf, &transport);
    page.select(vec![pdf("big.pdf", 40 * MIB)]).unwrap();

    let mut params = no_params();
    params.insert("level".into(), "high".into());
    let outcome = page.submit(&params).await;

    assert!(outcome.is_success());
    assert_eq!(transport.recorded()[0].field, "file");
    assert_eq!(transport.recorded()[0].params.get("level").map(String::as_str), Some("high"));
}

#[tokio::test]
async fn test_single_file_tool_refuses_several_files() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::RotatePdf, &transport);

    let err = page
        .select(vec![pdf("a.pdf", 100), pdf("b.pdf", 100)])
        .unwrap_err();

    assert_eq!(err.to_string(), "Please select only one file.");
    assert!(page.selection().is_empty());
    assert_eq!(page.status(), Some("Please select only one file."));

    let mut params = no_params();
    params.insert("angle".into(), "90".into());
    let outcome = page.submit(&params).await;
    assert_eq!(outcome.message(), Some("Please select a file."));
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn test_password_reaches_service_untrimmed() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::UnlockPdf, &transport);
    page.select(vec![pdf("locked.pdf", 100)]).unwrap();

    let mut params = no_params();
    params.insert("password".into(), " pass phrase ".into());
    let outcome = page.submit(&params).await;

    assert!(outcome.is_success());
    assert_eq!(
        transport.recorded()[0].params.get("password").map(String::as_str),
        Some(" pass phrase ")
    );
}

#[tokio::test]
async fn test_invalid_pages_never_reach_service() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::PdfToJpg, &transport);
    page.select(vec![pdf("doc.pdf", 100)]).unwrap();

    for pages in ["1,,3", "a-3", "5-"] {
        let mut params = no_params();
        params.insert("pages".into(), pages.into());
        let outcome = page.submit(&params).await;
        assert_eq!(outcome.message(), Some("Invalid format. Example: 1,3,5-7"));
    }
    assert!(transport.recorded().is_empty());

    let mut params = no_params();
    params.insert("pages".into(), "1,3,5-7".into());
    assert!(page.submit(&params).await.is_success());
    assert_eq!(
        transport.recorded()[0].params.get("pages").map(String::as_str),
        Some("1,3,5-7")
    );
}

#[tokio::test]
async fn test_empty_pages_means_all() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::PdfToJpg, &transport);
    page.select(vec![pdf("doc.pdf", 100)]).unwrap();

    assert!(page.submit(&no_params()).await.is_success());
    assert_eq!(
        transport.recorded()[0].params.get("pages").map(String::as_str),
        Some("")
    );
}

#[tokio::test]
async fn test_only_declared_parameters_are_sent() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::RotatePdf, &transport);
    page.select(vec![pdf("doc.pdf", 100)]).unwrap();

    let mut params = no_params();
    params.insert("angle".into(), "90".into());
    params.insert("password".into(), "ignored".into());
    page.submit(&params).await;

    let recorded = transport.recorded();
    assert_eq!(recorded[0].params.len(), 1);
    assert_eq!(recorded[0].params.get("angle").map(String::as_str), Some("90"));
}

// =============================================================================
// Response Classification Scenarios
// =============================================================================

#[tokio::test]
async fn test_extract_text_empty_result_fails() {
    let transport =
        RecordingTransport::answering(vec![Ok(ServiceResponse::new(200, r#"{"text": ""}"#))]);
    let mut page = tool_page(ToolId::ExtractText, &transport);
    page.select(vec![pdf("scan.pdf", 100)]).unwrap();

    let outcome = page.submit(&no_params()).await;

    assert_eq!(outcome.message(), Some("No text found in the document."));
    assert_eq!(page.transfer_state(), TransferState::Failed);
    assert_eq!(page.progress(), 0);
    assert!(page.download_offer().is_none());
}

#[tokio::test]
async fn test_service_error_message() {
    let transport = RecordingTransport::answering(vec![Ok(ServiceResponse::new(
        422,
        r#"{"error":"Wrong password"}"#,
    ))]);
    let mut page = tool_page(ToolId::UnlockPdf, &transport);
    page.select(vec![pdf("locked.pdf", 100)]).unwrap();

    let mut params = no_params();
    params.insert("password".into(), "hunter2".into());
    let outcome = page.submit(&params).await;

    assert_eq!(
        outcome,
        TransferOutcome::Failure {
            message: "Wrong password".into()
        }
    );
    assert_eq!(page.status(), Some("Wrong password"));
}

#[tokio::test]
async fn test_resubmit_after_failure_succeeds() {
    let transport = RecordingTransport::answering(vec![
        Ok(ServiceResponse::new(500, "<h1>Internal Server Error</h1>")),
        Ok(ServiceResponse::new(200, "%PDF").with_filename("fixed.pdf")),
    ]);
    let mut page = tool_page(ToolId::WordToPdf, &transport);
    page.select(vec![FileHandle::from_bytes("memo.docx", "", vec![1u8; 64])])
        .unwrap();

    let first = page.submit(&no_params()).await;
    assert_eq!(first.message(), Some("Internal Server Error"));

    let second = page.submit(&no_params()).await;
    assert!(second.is_success());
    assert_eq!(page.download_offer().unwrap().filename, "fixed.pdf");
    assert_eq!(page.status(), None);
}

#[tokio::test]
async fn test_progress_events_reach_observers() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::MergePdf, &transport);
    page.select(vec![pdf("a.pdf", 1000), pdf("b.pdf", 1000)])
        .unwrap();
    let mut events = page.subscribe();

    page.submit(&no_params()).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.first(), Some(&TransferEvent::Started { total_bytes: 2000 }));
    assert!(seen.contains(&TransferEvent::ProgressTick { percent: 50 }));
    assert!(seen.contains(&TransferEvent::ProgressTick { percent: 100 }));
    assert!(matches!(seen.last(), Some(TransferEvent::Succeeded { .. })));
    assert_eq!(page.progress(), 100);
}

// =============================================================================
// Resource Lifecycle
// =============================================================================

#[tokio::test]
async fn test_submit_closes_open_viewer() {
    let transport = RecordingTransport::answering(vec![Ok(ServiceResponse::new(
        400,
        r#"{"detail":"Bad input"}"#,
    ))]);
    let mut page = tool_page(ToolId::JpgToPdf, &transport);
    page.select(vec![jpg("1.jpg"), jpg("2.jpg")]).unwrap();
    page.open_viewer().unwrap();

    let mut items: Vec<GalleryItem> = Vec::new();
    let viewer = page.viewer_mut().unwrap();
    viewer.render(&mut items, &mut YieldFrames).await;
    assert_eq!(viewer.tracked_resources(), 2);

    let outcome = page.submit(&no_params()).await;

    assert_eq!(outcome.message(), Some("Bad input"));
    assert!(page.viewer().is_none());
}

#[tokio::test]
async fn test_teardown_abandons_result() {
    let transport = RecordingTransport::default();
    let mut page = tool_page(ToolId::MergePdf, &transport);
    page.select(vec![pdf("a.pdf", 10), pdf("b.pdf", 10)]).unwrap();
    page.open_viewer().unwrap();

    page.teardown();

    assert!(page.viewer().is_none());
    let outcome = page.submit(&no_params()).await;
    assert!(!outcome.is_success());
    assert!(page.download_offer().is_none());
}

// =============================================================================
// Files on Disk
// =============================================================================

#[tokio::test]
async fn test_files_from_disk_and_download() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("first.pdf");
    let b = temp.path().join("second.pdf");
    std::fs::write(&a, b"%PDF-a").unwrap();
    std::fs::write(&b, b"%PDF-b").unwrap();

    let transport = RecordingTransport::answering(vec![Ok(ServiceResponse::new(
        200,
        "%PDF-merged",
    ))]);
    let mut page = tool_page(ToolId::MergePdf, &transport);
    page.select(capture_paths(&[a, b]).await.unwrap()).unwrap();

    let outcome = page.submit(&no_params()).await;
    assert!(outcome.is_success());

    let sink = DirectorySink::new(temp.path().join("out"));
    let first = page.save_download(&sink).await.unwrap().unwrap();
    let second = page.save_download(&sink).await.unwrap().unwrap();

    assert_eq!(first.file_name().unwrap(), "merged.pdf");
    assert_eq!(second.file_name().unwrap(), "merged (1).pdf");
    assert_eq!(std::fs::read(&first).unwrap(), b"%PDF-merged");
}

#[tokio::test]
async fn test_sink_trait_is_usable_directly() {
    let temp = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp.path());
    let artifact = Artifact {
        filename: "report_rotated.pdf".into(),
        content_type: "application/pdf".into(),
        bytes: "rotated".into(),
    };
    let path = sink.save(&artifact).await.unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "rotated");
}
