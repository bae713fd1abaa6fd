//! Integration tests for staging, removing and reordering files.

use pdfmerge::PdfMergeError;
use pdfmerge::engine::LopdfEngine;
use pdfmerge::list::{CLEAR_ALL_PROMPT, FileList};
use pdfmerge::workspace::Workspace;

use crate::common::{memory_file, memory_pdf};

fn names(list: &FileList) -> Vec<&str> {
    list.entries().iter().map(|e| e.name()).collect()
}

#[test]
fn test_names_stay_unique_across_adds() {
    let mut list = FileList::new();
    list.add([memory_pdf("A", 1), memory_pdf("B", 1)]).unwrap();
    let outcome = list.add([memory_pdf("B", 5), memory_pdf("C", 1), memory_pdf("A", 2)])
        .unwrap();

    assert_eq!(names(&list), ["A.pdf", "B.pdf", "C.pdf"]);
    assert_eq!(outcome.duplicates, ["B.pdf", "A.pdf"]);
    assert_eq!(outcome.added.len(), 1);
}

#[test]
fn test_selection_without_pdfs_changes_nothing() {
    let mut list = FileList::new();
    list.add([memory_pdf("A", 1)]).unwrap();

    let result = list.add([
        memory_file("photo.png", "image/png", b"png"),
        memory_file("fake.pdf", "", b"%PDF"),
    ]);

    assert!(matches!(result, Err(PdfMergeError::NoValidFiles { rejected: 2 })));
    assert_eq!(names(&list), ["A.pdf"]);
}

#[test]
fn test_mixed_selection_keeps_only_pdfs() {
    let mut list = FileList::new();
    let outcome = list
        .add([memory_file("notes.txt", "text/plain", b"hi"), memory_pdf("A", 1)])
        .unwrap();

    assert_eq!(outcome.rejected, 1);
    assert_eq!(names(&list), ["A.pdf"]);
}

#[test]
fn test_remove_keeps_relative_order() {
    let mut list = FileList::new();
    list.add(["A", "B", "C", "D"].map(|l| memory_pdf(l, 1))).unwrap();

    let removed = list.remove_at(1).unwrap();

    assert_eq!(removed.name(), "B.pdf");
    assert_eq!(names(&list), ["A.pdf", "C.pdf", "D.pdf"]);
}

#[test]
fn test_reorder_is_a_single_move() {
    let mut list = FileList::new();
    list.add(["A", "B", "C", "D", "E"].map(|l| memory_pdf(l, 1))).unwrap();

    assert!(list.reorder(0, 3).unwrap());
    assert_eq!(names(&list), ["B.pdf", "C.pdf", "D.pdf", "A.pdf", "E.pdf"]);

    assert!(list.reorder(4, 1).unwrap());
    assert_eq!(names(&list), ["B.pdf", "E.pdf", "C.pdf", "D.pdf", "A.pdf"]);

    assert!(!list.reorder(2, 2).unwrap());
    assert_eq!(list.len(), 5);
}

#[test]
fn test_out_of_range_leaves_list_intact() {
    let mut list = FileList::new();
    list.add([memory_pdf("A", 1), memory_pdf("B", 1)]).unwrap();

    assert!(matches!(
        list.remove_at(2),
        Err(PdfMergeError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(list.reorder(0, 9).is_err());
    assert_eq!(names(&list), ["A.pdf", "B.pdf"]);
}

#[test]
fn test_visibility_follows_length() {
    let mut list = FileList::new();
    let expected = [(false, false), (true, false), (true, true), (true, true)];

    for (count, (list_visible, merge_enabled)) in expected.into_iter().enumerate() {
        if count > 0 {
            list.add([memory_pdf(&format!("F{count}"), 1)]).unwrap();
        }
        let visibility = list.visibility();
        assert_eq!(visibility.list_visible, list_visible, "len {count}");
        assert_eq!(visibility.merge_enabled, merge_enabled, "len {count}");
    }
}

#[test]
fn test_clear_all_asks_first() {
    let mut list = FileList::new();
    list.add([memory_pdf("A", 1)]).unwrap();

    let mut asked = Vec::new();
    let cleared = list.clear_all(&mut |prompt: &str| {
        asked.push(prompt.to_string());
        false
    });

    assert!(!cleared);
    assert_eq!(asked, [CLEAR_ALL_PROMPT]);
    assert_eq!(list.len(), 1);

    assert!(list.clear_all(&mut |_: &str| true));
    assert!(list.is_empty());
}

#[test]
fn test_abandoned_drag_changes_nothing() {
    let mut ws = Workspace::new(LopdfEngine::default());
    ws.add_files([memory_pdf("A", 1), memory_pdf("B", 1)]).unwrap();
    let rows = ws.rows();

    ws.drag_start(rows[0].id).unwrap();
    assert!(ws.drag_over(rows[1].id));
    assert!(!ws.drag_over(rows[0].id), "source is never a drop target");
    ws.drag_end();

    assert!(ws.drag().drop_targets().is_empty());
    assert_eq!(names(ws.list()), ["A.pdf", "B.pdf"]);
}

#[test]
fn test_rows_are_numbered_from_one() {
    let mut list = FileList::new();
    list.add([memory_file("big.pdf", "application/pdf", &[0; 1536]), memory_pdf("A", 1)])
        .unwrap();

    let rows = list.rows();
    assert_eq!(rows[0].position, 1);
    assert_eq!(rows[0].size_display, "1.5 KB");
    assert_eq!(rows[1].position, 2);
}
