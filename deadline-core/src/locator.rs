//! Finding the scan target and resolving row addresses inside it.

use crate::{DeadlineError, RowAddress};

/// Live handle to one element of the host page.
///
/// Handles are only valid for the tick that produced them. Presentation
/// mutators take `&self` because the element is owned by the page, not by us.
pub trait PageElement: Clone {
    fn text_content(&self) -> Option<String>;
    fn previous_element_sibling(&self) -> Option<Self>;
    fn set_style(&self, property: &str, value: &str) -> Result<(), DeadlineError>;
    fn remove_style(&self, property: &str) -> Result<(), DeadlineError>;
    fn set_title(&self, title: &str) -> Result<(), DeadlineError>;
    fn add_class(&self, class: &str) -> Result<(), DeadlineError>;
    fn remove_class(&self, class: &str) -> Result<(), DeadlineError>;
}

/// A document that can evaluate structural addresses.
pub trait DocumentAddressResolver {
    type Element: PageElement;

    /// First element matching `address`, if any.
    fn resolve(&self, address: &RowAddress) -> Result<Option<Self::Element>, DeadlineError>;

    /// Every element currently carrying `class`.
    fn find_marked(&self, class: &str) -> Result<Vec<Self::Element>, DeadlineError>;
}

/// A child frame as seen from the top-level window.
#[derive(Debug, Clone)]
pub struct ChildFrame<D> {
    pub name: String,
    pub document: Option<D>,
}

/// The window hierarchy the scanner runs in.
pub trait FrameHost {
    type Document: DocumentAddressResolver + Clone;

    fn named_frame(&self, name: &str) -> Result<Option<Self::Document>, DeadlineError>;
    fn child_frame_count(&self) -> usize;
    /// Fails when the frame belongs to another origin.
    fn child_frame(&self, index: usize) -> Result<ChildFrame<Self::Document>, DeadlineError>;
    fn top_document(&self) -> Option<Self::Document>;
}

/// Where a scan runs: inside the named frame, or on the top-level document
/// when the frame could not be found.
#[derive(Debug, Clone)]
pub enum ScanTarget<D> {
    Frame(D),
    TopLevel(D),
}

impl<D> ScanTarget<D> {
    pub fn document(&self) -> &D {
        match self {
            ScanTarget::Frame(document) | ScanTarget::TopLevel(document) => document,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ScanTarget::TopLevel(_))
    }
}

/// Looks the frame up by name, then by walking the child frames, and falls
/// back to the top-level document. Never fails; `None` only when no document
/// is reachable at all.
pub fn resolve_frame<H: FrameHost>(host: &H, frame_name: &str) -> Option<ScanTarget<H::Document>> {
    match host.named_frame(frame_name) {
        Ok(Some(document)) => return Some(ScanTarget::Frame(document)),
        Ok(None) => {}
        Err(err) => log::debug!("named frame lookup for {frame_name:?} failed: {err}"),
    }

    for index in 0..host.child_frame_count() {
        match host.child_frame(index) {
            Ok(ChildFrame {
                name,
                document: Some(document),
            }) if name == frame_name => return Some(ScanTarget::Frame(document)),
            Ok(_) => {}
            Err(err) => log::debug!("skipping child frame {index}: {err}"),
        }
    }

    log::warn!("target frame {frame_name:?} not found, scanning the top-level document");
    host.top_document().map(ScanTarget::TopLevel)
}

/// Resolves one address, degrading every failure to `None`.
pub fn locate<D: DocumentAddressResolver>(
    document: &D,
    address: &RowAddress,
) -> Option<D::Element> {
    match document.resolve(address) {
        Ok(element) => element,
        Err(err) => {
            log::debug!("row {} could not be resolved: {err}", address.row);
            None
        }
    }
}
