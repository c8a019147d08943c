#![cfg(target_arch = "wasm32")]

//! web-sys adapters for the scanner's host traits.

use deadline_core::{
    ChildFrame, DeadlineError, DocumentAddressResolver, FrameHost, PageElement, RowAddress,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, HtmlElement, HtmlFrameElement, HtmlIFrameElement, Node, NodeList, Window,
    XPathResult,
};

const FRAME_SELECTOR: &str = "frame, iframe";

fn js_error(err: JsValue) -> DeadlineError {
    DeadlineError::Host(format!("{err:?}"))
}

/// A `<frame>` or `<iframe>` of the top-level document.
#[derive(Clone)]
pub enum FrameElement {
    Frame(HtmlFrameElement),
    IFrame(HtmlIFrameElement),
}

impl FrameElement {
    fn from_node(node: Node) -> Option<Self> {
        match node.dyn_into::<HtmlFrameElement>() {
            Ok(frame) => Some(FrameElement::Frame(frame)),
            Err(node) => node.dyn_into::<HtmlIFrameElement>().ok().map(FrameElement::IFrame),
        }
    }

    fn name(&self) -> String {
        match self {
            FrameElement::Frame(frame) => frame.name(),
            FrameElement::IFrame(frame) => frame.name(),
        }
    }

    /// `None` when the frame is cross-origin or not loaded yet.
    fn content_document(&self) -> Option<Document> {
        match self {
            FrameElement::Frame(frame) => frame.content_document(),
            FrameElement::IFrame(frame) => frame.content_document(),
        }
    }
}

/// The browser window the content script runs in.
#[derive(Clone)]
pub struct WebFrameHost {
    window: Window,
}

impl WebFrameHost {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn document(&self) -> Result<Document, DeadlineError> {
        self.window.document().ok_or(DeadlineError::NoDocument)
    }

    fn frame_elements(&self) -> Vec<FrameElement> {
        let Ok(document) = self.document() else {
            return Vec::new();
        };
        match document.query_selector_all(FRAME_SELECTOR) {
            Ok(nodes) => nodes_of(&nodes)
                .into_iter()
                .filter_map(FrameElement::from_node)
                .collect(),
            Err(err) => {
                log::debug!("frame query failed: {err:?}");
                Vec::new()
            }
        }
    }
}

impl FrameHost for WebFrameHost {
    type Document = WebDocument;

    fn named_frame(&self, name: &str) -> Result<Option<WebDocument>, DeadlineError> {
        let named = self.document()?.get_elements_by_name(name);
        Ok(nodes_of(&named)
            .into_iter()
            .filter_map(FrameElement::from_node)
            .find(|frame| frame.content_document().is_some())
            .map(WebDocument::Frame))
    }

    fn child_frame_count(&self) -> usize {
        self.frame_elements().len()
    }

    fn child_frame(&self, index: usize) -> Result<ChildFrame<WebDocument>, DeadlineError> {
        let frame = self
            .frame_elements()
            .into_iter()
            .nth(index)
            .ok_or_else(|| DeadlineError::Host(format!("no child frame at {index}")))?;
        if frame.content_document().is_none() {
            return Err(DeadlineError::AccessDenied(format!(
                "frame {:?} has no readable document",
                frame.name()
            )));
        }
        Ok(ChildFrame {
            name: frame.name(),
            document: Some(WebDocument::Frame(frame)),
        })
    }

    fn top_document(&self) -> Option<WebDocument> {
        self.window
            .document()
            .map(|_| WebDocument::TopLevel(self.window.clone()))
    }
}

/// Scan target. The live document is looked up on every call so a frame that
/// navigated is followed.
#[derive(Clone)]
pub enum WebDocument {
    Frame(FrameElement),
    TopLevel(Window),
}

impl WebDocument {
    fn current(&self) -> Result<Document, DeadlineError> {
        match self {
            WebDocument::Frame(frame) => frame.content_document().ok_or_else(|| {
                DeadlineError::AccessDenied(format!("frame {:?} is not readable", frame.name()))
            }),
            WebDocument::TopLevel(window) => window.document().ok_or(DeadlineError::NoDocument),
        }
    }
}

impl DocumentAddressResolver for WebDocument {
    type Element = WebElement;

    fn resolve(&self, address: &RowAddress) -> Result<Option<WebElement>, DeadlineError> {
        let document = self.current()?;
        let result = document
            .evaluate_with_opt_callback_and_type(
                &address.path,
                &document,
                None,
                XPathResult::FIRST_ORDERED_NODE_TYPE,
            )
            .map_err(js_error)?;
        let node = result.single_node_value().map_err(js_error)?;
        Ok(node.and_then(WebElement::from_node))
    }

    fn find_marked(&self, class: &str) -> Result<Vec<WebElement>, DeadlineError> {
        let nodes = self
            .current()?
            .query_selector_all(&format!(".{class}"))
            .map_err(js_error)?;
        Ok(nodes_of(&nodes)
            .into_iter()
            .filter_map(WebElement::from_node)
            .collect())
    }
}

/// An element of the scanned document.
#[derive(Clone)]
pub struct WebElement(HtmlElement);

impl WebElement {
    // Elements of a child frame come from another realm, so `instanceof`
    // based casts fail on them; check the node type instead.
    fn from_node(node: Node) -> Option<Self> {
        (node.node_type() == Node::ELEMENT_NODE).then(|| WebElement(node.unchecked_into()))
    }
}

impl PageElement for WebElement {
    fn text_content(&self) -> Option<String> {
        self.0.text_content()
    }

    fn previous_element_sibling(&self) -> Option<Self> {
        self.0
            .previous_element_sibling()
            .map(|element| WebElement(element.unchecked_into()))
    }

    fn set_style(&self, property: &str, value: &str) -> Result<(), DeadlineError> {
        self.0.style().set_property(property, value).map_err(js_error)
    }

    fn remove_style(&self, property: &str) -> Result<(), DeadlineError> {
        self.0
            .style()
            .remove_property(property)
            .map(|_| ())
            .map_err(js_error)
    }

    fn set_title(&self, title: &str) -> Result<(), DeadlineError> {
        self.0.set_title(title);
        Ok(())
    }

    fn add_class(&self, class: &str) -> Result<(), DeadlineError> {
        self.0.class_list().add_1(class).map_err(js_error)
    }

    fn remove_class(&self, class: &str) -> Result<(), DeadlineError> {
        self.0.class_list().remove_1(class).map_err(js_error)
    }
}

fn nodes_of(list: &NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|index| list.get(index)).collect()
}
