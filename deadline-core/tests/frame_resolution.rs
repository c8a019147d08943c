mod common;

use common::{config, empty_page, insert_row, FRAME};
use deadline_core::memory::{MemoryHost, MemoryPage};
use deadline_core::{locate, resolve_frame, DocumentAddressResolver, RowAddress, ScanTarget};

fn marker_page(marker: &str) -> MemoryPage {
    let page = empty_page(&config(1, 1));
    insert_row(&page, 1, 0, marker);
    page
}

fn marker_of(target: &ScanTarget<MemoryPage>) -> String {
    let cfg = config(1, 1);
    let address = cfg.address_template().unwrap().address_for(1);
    target
        .document()
        .resolve(&address)
        .unwrap()
        .map(|cell| cell.text())
        .unwrap_or_default()
}

#[test]
fn named_frame_wins() {
    let host = MemoryHost::new()
        .with_top(marker_page("top"))
        .with_frame("other", marker_page("other"))
        .with_frame(FRAME, marker_page("frame"));

    let target = resolve_frame(&host, FRAME).unwrap();
    assert!(!target.is_degraded());
    assert_eq!(marker_of(&target), "frame");
}

#[test]
fn child_frames_are_walked_past_cross_origin_ones() {
    let host = MemoryHost::new()
        .without_named_lookup()
        .with_top(marker_page("top"))
        .with_cross_origin_frame("ads")
        .with_frame(FRAME, marker_page("frame"));

    let target = resolve_frame(&host, FRAME).unwrap();
    assert!(matches!(target, ScanTarget::Frame(_)));
    assert_eq!(marker_of(&target), "frame");
}

#[test]
fn missing_frame_falls_back_to_top_document() {
    let host = MemoryHost::new()
        .with_top(marker_page("top"))
        .with_cross_origin_frame(FRAME)
        .with_frame("other", marker_page("other"));

    let target = resolve_frame(&host, FRAME).unwrap();
    assert!(target.is_degraded());
    assert_eq!(marker_of(&target), "top");
}

#[test]
fn no_document_at_all_is_none() {
    assert!(resolve_frame(&MemoryHost::new(), FRAME).is_none());
}

#[test]
fn locate_degrades_failures_to_absent() {
    let cfg = config(1, 3);
    let page = empty_page(&cfg);
    insert_row(&page, 1, 0, "05-03-2024 14:30");
    insert_row(&page, 2, 0, "06-03-2024 14:30");
    page.fail_row(2);
    let template = cfg.address_template().unwrap();

    assert!(locate(&page, &template.address_for(1)).is_some());
    assert!(locate(&page, &template.address_for(2)).is_none());
    assert!(locate(&page, &template.address_for(3)).is_none());

    let foreign = RowAddress {
        row: 1,
        path: "//div[1]".to_string(),
    };
    assert!(locate(&page, &foreign).is_none());

    page.detach();
    assert!(locate(&page, &template.address_for(1)).is_none());
}
