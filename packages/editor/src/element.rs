//! # Element Model
//!
//! The unit of the document tree. Elements live in a flat, id-keyed store;
//! parent/child relationships are expressed purely as id lists.
//!
//! ```text
//! body
//!  ├── section ─── section-content ─── container ─── text
//!  └── container ─── image
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Class marking an element the stage must not let the user drag
pub const PREVENT_DRAGGABLE_CLASS: &str = "prevent-draggable";

/// Class locking an element's width to the website width
pub const WIDTH_LOCKED_CLASS: &str = "website-width";

/// Opaque element identifier, stable for the element's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Closed set of element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Container,
    Text,
    Image,
    HtmlBlock,
    Section,
    SectionContent,
    Component,
}

impl ElementType {
    /// Whether elements of this type may hold children
    pub fn accepts_children(self) -> bool {
        matches!(self, ElementType::Container | ElementType::SectionContent)
    }

    /// Default surface tag for a freshly created element
    pub fn default_tag(self) -> &'static str {
        match self {
            ElementType::Section => "section",
            ElementType::Image => "img",
            _ => "div",
        }
    }
}

/// Responsive breakpoints the editor styles independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    #[default]
    Desktop,
    Mobile,
}

/// CSS-like property map, ordered for stable rendering
pub type StyleMap = BTreeMap<String, String>;

/// Breakpoint-scoped styles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSet {
    #[serde(default)]
    pub desktop: StyleMap,
    #[serde(default)]
    pub mobile: StyleMap,
}

impl StyleSet {
    pub fn get(&self, breakpoint: Breakpoint) -> &StyleMap {
        match breakpoint {
            Breakpoint::Desktop => &self.desktop,
            Breakpoint::Mobile => &self.mobile,
        }
    }

    pub fn get_mut(&mut self, breakpoint: Breakpoint) -> &mut StyleMap {
        match breakpoint {
            Breakpoint::Desktop => &mut self.desktop,
            Breakpoint::Mobile => &mut self.mobile,
        }
    }
}

/// Per-breakpoint visibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub desktop: bool,
    pub mobile: bool,
}

impl Visibility {
    pub fn get(&self, breakpoint: Breakpoint) -> bool {
        match breakpoint {
            Breakpoint::Desktop => self.desktop,
            Breakpoint::Mobile => self.mobile,
        }
    }

    pub fn set(&mut self, breakpoint: Breakpoint, visible: bool) {
        match breakpoint {
            Breakpoint::Desktop => self.desktop = visible,
            Breakpoint::Mobile => self.mobile = visible,
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            desktop: true,
            mobile: true,
        }
    }
}

/// Navigation target attached to an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,

    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Surface tag (div, img, section...)
    pub tag_name: String,

    /// Ordered child ids
    #[serde(default)]
    pub children: Vec<ElementId>,

    /// Ordered set of class names
    #[serde(default)]
    pub class_list: Vec<String>,

    #[serde(default)]
    pub style: StyleSet,

    #[serde(default)]
    pub visibility: Visibility,

    /// Pages this element shows on; empty means all pages
    #[serde(default)]
    pub page_names: Vec<String>,

    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub inner_html: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,

    #[serde(default)]
    pub is_section_content: bool,

    #[serde(default)]
    pub is_body: bool,
}

impl Element {
    /// Create a bare element of the given type
    pub fn new(id: impl Into<ElementId>, element_type: ElementType) -> Self {
        Self {
            id: id.into(),
            element_type,
            tag_name: element_type.default_tag().to_string(),
            children: Vec::new(),
            class_list: Vec::new(),
            style: StyleSet::default(),
            visibility: Visibility::default(),
            page_names: Vec::new(),
            selected: false,
            inner_html: String::new(),
            data: None,
            link: None,
            is_section_content: element_type == ElementType::SectionContent,
            is_body: false,
        }
    }

    /// Create the document body
    pub fn body(id: impl Into<ElementId>) -> Self {
        let mut body = Self::new(id, ElementType::Container);
        body.tag_name = "body".to_string();
        body.is_body = true;
        body
    }

    /// Inner wrapper paired with a section
    pub fn section_content(id: impl Into<ElementId>) -> Self {
        let mut content = Self::new(id, ElementType::SectionContent);
        content.class_list = vec![
            PREVENT_DRAGGABLE_CLASS.to_string(),
            WIDTH_LOCKED_CLASS.to_string(),
        ];
        content
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ElementId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_style(mut self, breakpoint: Breakpoint, key: &str, value: &str) -> Self {
        self.style
            .get_mut(breakpoint)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_pages(mut self, pages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.page_names = pages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = html.into();
        self
    }

    /// Whether the element is limited to specific pages
    pub fn is_page_scoped(&self) -> bool {
        !self.page_names.is_empty()
    }

    /// Whether the element shows on `page` (`None` means no page is open)
    pub fn is_on_page(&self, page: Option<&str>) -> bool {
        match page {
            Some(page) => self.page_names.is_empty() || self.page_names.iter().any(|p| p == page),
            None => true,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list.iter().any(|c| c == class)
    }

    /// Whether new children may be appended to this element
    pub fn accepts_children(&self) -> bool {
        self.is_body || self.element_type.accepts_children()
    }
}

/// A `{from, to}` pair of full element snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct ElementChange {
    pub from: Element,
    pub to: Element,
}

impl ElementChange {
    pub fn new(from: Element, to: Element) -> Self {
        Self { from, to }
    }

    /// Build a change by editing a copy of `element`
    pub fn edit(element: &Element, edit: impl FnOnce(&mut Element)) -> Self {
        let mut to = element.clone();
        edit(&mut to);
        Self {
            from: element.clone(),
            to,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.to.id
    }
}
