//! Row highlighting and its removal.

use chrono::NaiveDateTime;

use crate::{
    classify, format_remaining, DeadlineError, DocumentAddressResolver, PageElement,
    ParsedDeadline, StatusPalette, Urgency,
};

/// Marker class shared by every annotated cell.
pub const HIGHLIGHT_CLASS: &str = "deadline-highlighted";

const TRANSITION: &str = "all 0.3s ease-in-out";
const BORDER_WIDTH: &str = "1px";
const BORDER_STYLE: &str = "solid";
const BOX_SHADOW: &str = "0 2px 4px rgba(0,0,0,0.1)";

/// Inline style properties written by [`annotate`] and reset by [`clear_all`].
const STYLE_PROPERTIES: [&str; 6] = [
    "transition",
    "background-color",
    "border-color",
    "border-width",
    "border-style",
    "box-shadow",
];

/// Everything [`annotate`] writes onto a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub urgency: Urgency,
    pub background: String,
    pub border: String,
    pub title: String,
}

impl Annotation {
    pub fn new(deadline: &ParsedDeadline, now: NaiveDateTime, palette: &StatusPalette) -> Self {
        let status = classify(deadline.instant(), now);
        let background = match status.urgency {
            Urgency::Upcoming => &palette.upcoming,
            Urgency::Warning => &palette.warning,
            Urgency::Overdue => &palette.overdue,
        };
        let title = format!(
            "Deadline: {}\nStatus: {}\n{}",
            deadline.instant().format("%a %d %b %Y %H:%M"),
            status.urgency.message(),
            format_remaining(deadline.instant(), now)
        );
        Self {
            urgency: status.urgency,
            background: background.clone(),
            border: palette.border.clone(),
            title,
        }
    }
}

/// The deadline cell followed by up to `width` preceding siblings, nearest
/// first. Short rows simply yield fewer cells.
pub fn collect_row_group<E: PageElement>(cell: &E, width: usize) -> Vec<E> {
    let mut group = Vec::with_capacity(width.saturating_add(1));
    group.push(cell.clone());

    let mut current = cell.clone();
    for _ in 0..width {
        let Some(previous) = current.previous_element_sibling() else {
            break;
        };
        group.push(previous.clone());
        current = previous;
    }
    group
}

/// Paints every cell of `row_group`. Applying the same annotation twice
/// leaves the cells exactly as a single application would.
pub fn annotate<E: PageElement>(row_group: &[E], annotation: &Annotation) {
    for element in row_group {
        if let Err(err) = paint(element, annotation) {
            log::debug!("could not annotate cell: {err}");
        }
    }
}

fn paint<E: PageElement>(element: &E, annotation: &Annotation) -> Result<(), DeadlineError> {
    element.set_style("transition", TRANSITION)?;
    element.set_style("background-color", &annotation.background)?;
    element.set_style("border-color", &annotation.border)?;
    element.set_style("border-width", BORDER_WIDTH)?;
    element.set_style("border-style", BORDER_STYLE)?;
    element.set_style("box-shadow", BOX_SHADOW)?;
    element.set_title(&annotation.title)?;

    for urgency in Urgency::ALL {
        if urgency != annotation.urgency {
            element.remove_class(urgency.css_class())?;
        }
    }
    element.add_class(HIGHLIGHT_CLASS)?;
    element.add_class(annotation.urgency.css_class())
}

/// Strips every annotation from `document`.
pub fn clear_all<D: DocumentAddressResolver>(document: &D) -> Result<usize, DeadlineError> {
    let marked = document.find_marked(HIGHLIGHT_CLASS)?;
    for element in &marked {
        if let Err(err) = unpaint(element) {
            log::debug!("could not clear cell: {err}");
        }
    }
    Ok(marked.len())
}

fn unpaint<E: PageElement>(element: &E) -> Result<(), DeadlineError> {
    for property in STYLE_PROPERTIES {
        element.remove_style(property)?;
    }
    element.set_title("")?;
    element.remove_class(HIGHLIGHT_CLASS)?;
    for urgency in Urgency::ALL {
        element.remove_class(urgency.css_class())?;
    }
    Ok(())
}
