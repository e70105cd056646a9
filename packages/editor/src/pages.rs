//! Page scoping.
//!
//! An element normally belongs to the page open when it was created. When it
//! lands inside a container that is itself limited to some pages, it takes
//! the scoping of the first page-scoped ancestor instead, so it can never be
//! hidden relative to its own visible container.

use crate::element::{Element, ElementId};
use crate::selection::ancestors;
use crate::store::ElementTree;

/// Query surface of the page store
pub trait PageStore {
    /// Id of the page currently open in the editor
    fn current_page(&self) -> Option<String>;

    fn is_open(&self, page: &str) -> bool {
        self.current_page().as_deref() == Some(page)
    }
}

/// Fixed page context, for callers without a page store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenPage(pub Option<String>);

impl OpenPage {
    pub fn new(page: impl Into<String>) -> Self {
        Self(Some(page.into()))
    }
}

impl PageStore for OpenPage {
    fn current_page(&self) -> Option<String> {
        self.0.clone()
    }
}

/// First ancestor of `parent` (inclusive) scoped to specific pages
pub fn first_paged_ancestor<'a>(tree: &'a ElementTree, parent: &ElementId) -> Option<&'a Element> {
    let start = tree.get(parent)?;
    std::iter::once(start)
        .chain(ancestors(tree, parent))
        .find(|element| element.is_page_scoped())
}

/// Page names for an element inserted under `parent`
pub fn inherited_page_names(tree: &ElementTree, parent: &ElementId, pages: &dyn PageStore) -> Vec<String> {
    if let Some(scoped) = first_paged_ancestor(tree, parent) {
        return scoped.page_names.clone();
    }
    pages.current_page().into_iter().collect()
}

/// Whether `id` and every ancestor show on `page`
pub fn is_visible_on_page(tree: &ElementTree, id: &ElementId, page: Option<&str>) -> bool {
    let Some(element) = tree.get(id) else {
        return false;
    };
    element.is_on_page(page) && ancestors(tree, id).iter().all(|a| a.is_on_page(page))
}

/// Whether container `id` belongs to `page`
pub fn belongs_to_page(tree: &ElementTree, id: &ElementId, page: &str) -> bool {
    is_visible_on_page(tree, id, Some(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;

    fn tree() -> ElementTree {
        ElementTree::from_elements(vec![
            Element::body("body").with_children(["home", "free"]),
            Element::new("home", ElementType::Container)
                .with_pages(["home-page"])
                .with_children(["inner"]),
            Element::new("inner", ElementType::Container),
            Element::new("free", ElementType::Container),
        ])
        .unwrap()
    }

    #[test]
    fn test_inherits_from_scoped_ancestor() {
        let tree = tree();
        let pages = OpenPage::new("about");
        let names = inherited_page_names(&tree, &"inner".into(), &pages);
        assert_eq!(names, vec!["home-page".to_string()]);
    }

    #[test]
    fn test_falls_back_to_open_page() {
        let tree = tree();
        let pages = OpenPage::new("about");
        assert_eq!(inherited_page_names(&tree, &"free".into(), &pages), vec!["about".to_string()]);
        assert!(inherited_page_names(&tree, &"free".into(), &OpenPage::default()).is_empty());
    }

    #[test]
    fn test_visibility_follows_ancestors() {
        let tree = tree();
        assert!(is_visible_on_page(&tree, &"inner".into(), Some("home-page")));
        assert!(!is_visible_on_page(&tree, &"inner".into(), Some("about")));
        assert!(belongs_to_page(&tree, &"free".into(), "about"));
    }

    #[test]
    fn test_page_store_is_open() {
        let pages = OpenPage::new("home");
        assert!(pages.is_open("home"));
        assert!(!pages.is_open("about"));
    }
}
