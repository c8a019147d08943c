mod common;

use common::{at, config, empty_page, insert_row};
use deadline_core::annotator::Annotation;
use deadline_core::memory::MemoryElement;
use deadline_core::{
    annotate, clear_all, collect_row_group, parse_timestamp, StatusPalette, Urgency,
    HIGHLIGHT_CLASS,
};

fn snapshot(group: &[MemoryElement]) -> Vec<(Vec<String>, String, Vec<(String, String)>)> {
    group
        .iter()
        .map(|cell| {
            (
                cell.classes(),
                cell.title(),
                cell.styles().into_iter().collect(),
            )
        })
        .collect()
}

#[test]
fn huge_row_width_stops_at_the_first_cell() {
    let page = empty_page(&config(1, 1));
    insert_row(&page, 1, 2, "05-03-2024 14:30");

    let group = collect_row_group(&page.deadline_cell(1).unwrap(), usize::MAX);
    let columns: Vec<usize> = group.iter().map(MemoryElement::column).collect();
    assert_eq!(columns, vec![2, 1, 0]);
}

#[test]
fn row_group_walks_back_a_fixed_width() {
    let page = empty_page(&config(1, 2));
    insert_row(&page, 1, 14, "05-03-2024 14:30");
    insert_row(&page, 2, 3, "05-03-2024 14:30");

    let long = collect_row_group(&page.deadline_cell(1).unwrap(), 10);
    assert_eq!(long.len(), 11);
    assert_eq!(long[0].column(), 14);
    assert_eq!(long[10].column(), 4);

    let short = collect_row_group(&page.deadline_cell(2).unwrap(), 10);
    let columns: Vec<usize> = short.iter().map(MemoryElement::column).collect();
    assert_eq!(columns, vec![3, 2, 1, 0]);
}

#[test]
fn annotation_carries_palette_and_tooltip() {
    let deadline = parse_timestamp("05-03-2024 14:30").unwrap();
    let palette = StatusPalette::default();

    let warning = Annotation::new(&deadline, at(5, 3, 2024, 10, 0), &palette);
    assert_eq!(warning.urgency, Urgency::Warning);
    assert_eq!(warning.background, palette.warning);
    assert_eq!(warning.border, palette.border);
    assert!(warning.title.starts_with("Deadline: Tue 05 Mar 2024 14:30\n"));
    assert!(warning
        .title
        .ends_with("Status: Due within 24 hours\nTime remaining: 0d 4h 30m"));

    let overdue = Annotation::new(&deadline, at(7, 3, 2024, 16, 45), &palette);
    assert_eq!(overdue.background, palette.overdue);
    assert!(overdue.title.ends_with("Overdue by: 2d 2h"));
}

#[test]
fn annotate_is_idempotent() {
    let page = empty_page(&config(1, 1));
    insert_row(&page, 1, 4, "05-03-2024 14:30");
    let group = collect_row_group(&page.deadline_cell(1).unwrap(), 10);
    let annotation = Annotation::new(
        &parse_timestamp("05-03-2024 14:30").unwrap(),
        at(1, 3, 2024, 8, 0),
        &StatusPalette::default(),
    );

    annotate(&group, &annotation);
    let once = snapshot(&group);
    annotate(&group, &annotation);
    assert_eq!(snapshot(&group), once);

    let classes = &once[0].0;
    assert_eq!(
        classes,
        &vec![HIGHLIGHT_CLASS.to_string(), "status-upcoming".to_string()]
    );
    assert_eq!(
        group[0].style("box-shadow").as_deref(),
        Some("0 2px 4px rgba(0,0,0,0.1)")
    );
}

#[test]
fn clear_all_resets_only_marked_cells() {
    let page = empty_page(&config(1, 2));
    insert_row(&page, 1, 2, "05-03-2024 14:30");
    insert_row(&page, 2, 2, "06-03-2024 14:30");
    let annotation = Annotation::new(
        &parse_timestamp("05-03-2024 14:30").unwrap(),
        at(6, 3, 2024, 8, 0),
        &StatusPalette::default(),
    );
    annotate(
        &collect_row_group(&page.deadline_cell(1).unwrap(), 10),
        &annotation,
    );

    assert_eq!(clear_all(&page).unwrap(), 3);
    for cell in page.row_cells(1).iter().chain(page.row_cells(2).iter()) {
        assert!(cell.classes().is_empty());
        assert!(cell.styles().is_empty());
        assert_eq!(cell.title(), "");
    }
    assert_eq!(clear_all(&page).unwrap(), 0);
}

#[test]
fn clear_all_reports_detached_documents() {
    let page = empty_page(&config(1, 1));
    page.detach();
    assert!(clear_all(&page).is_err());
}
