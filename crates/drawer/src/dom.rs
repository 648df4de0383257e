//! Element handles the drawer renders into.
//!
//! The controller never touches a page directly. It is handed element
//! handles looked up by id through an [`ElementSource`], plus a [`Page`] for
//! the body scroll lock. Any handle may be missing; the feature it backs is
//! then skipped.
//!
//! [`MemoryDocument`] and [`MemoryElement`] are in-memory implementations
//! used by tests and by the command-line front end.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Element ids the drawer binds to.
pub mod ids {
    /// Header button that opens the drawer.
    pub const CART_TOGGLE: &str = "cart-toggle";
    /// The slide-in drawer panel.
    pub const CART_SIDEBAR: &str = "cart-sidebar";
    /// Backdrop behind the drawer.
    pub const CART_OVERLAY: &str = "cart-overlay";
    /// Close button inside the drawer.
    pub const CART_CLOSE: &str = "cart-close";
    /// Container for line item rows.
    pub const CART_ITEMS: &str = "cart-items";
    /// Cart total label.
    pub const CART_TOTAL: &str = "cart-total";
    /// Header count badge.
    pub const HEADER_CART_COUNT: &str = "header-cart-count";

    /// Every id the drawer looks up.
    pub const ALL: [&str; 7] = [
        CART_TOGGLE,
        CART_SIDEBAR,
        CART_OVERLAY,
        CART_CLOSE,
        CART_ITEMS,
        CART_TOTAL,
        HEADER_CART_COUNT,
    ];
}

/// Class toggled on the drawer and overlay while open.
pub const ACTIVE_CLASS: &str = "active";

/// Body `overflow` value applied while the drawer is open.
pub const SCROLL_LOCKED: &str = "hidden";

/// A handle to a rendered element.
///
/// Handles behave like page references: shared, and mutated through `&self`.
pub trait Element: Send + Sync {
    /// Replace the element's text content.
    fn set_text(&self, text: &str);
    /// Replace the element's children with parsed markup.
    fn set_inner_html(&self, html: &str);
    /// Add a class; a no-op if already present.
    fn add_class(&self, class: &str);
    /// Remove a class; a no-op if absent.
    fn remove_class(&self, class: &str);
}

/// Page-level state outside any single element.
pub trait Page: Send + Sync {
    /// Set the body's `overflow` style. An empty value clears it.
    fn set_body_overflow(&self, value: &str);
}

/// Looks elements up by id.
pub trait ElementSource {
    type Element: Element;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
}

/// Element handles bound at construction.
#[derive(Debug, Clone)]
pub struct DrawerElements<E> {
    pub toggle: Option<E>,
    pub sidebar: Option<E>,
    pub overlay: Option<E>,
    pub close: Option<E>,
    pub items: Option<E>,
    pub total: Option<E>,
    pub count: Option<E>,
}

impl<E> Default for DrawerElements<E> {
    fn default() -> Self {
        Self {
            toggle: None,
            sidebar: None,
            overlay: None,
            close: None,
            items: None,
            total: None,
            count: None,
        }
    }
}

impl<E: Element> DrawerElements<E> {
    /// Look up every drawer element in `source`.
    pub fn query<S>(source: &S) -> Self
    where
        S: ElementSource<Element = E>,
    {
        Self {
            toggle: source.element_by_id(ids::CART_TOGGLE),
            sidebar: source.element_by_id(ids::CART_SIDEBAR),
            overlay: source.element_by_id(ids::CART_OVERLAY),
            close: source.element_by_id(ids::CART_CLOSE),
            items: source.element_by_id(ids::CART_ITEMS),
            total: source.element_by_id(ids::CART_TOTAL),
            count: source.element_by_id(ids::HEADER_CART_COUNT),
        }
    }

    /// Whether UI events should be wired.
    ///
    /// Without the toggle there is no way to open the drawer, so the page
    /// is treated as having no cart drawer at all.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.toggle.is_some()
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct ElementState {
    text: String,
    html: String,
    classes: BTreeSet<String>,
}

/// An in-memory element. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryElement {
    state: Arc<Mutex<ElementState>>,
}

impl MemoryElement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text content.
    #[must_use]
    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    /// Current inner markup.
    #[must_use]
    pub fn html(&self) -> String {
        lock(&self.state).html.clone()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        lock(&self.state).classes.contains(class)
    }

    /// Classes in sorted order.
    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        lock(&self.state).classes.iter().cloned().collect()
    }
}

impl Element for MemoryElement {
    fn set_text(&self, text: &str) {
        text.clone_into(&mut lock(&self.state).text);
    }

    fn set_inner_html(&self, html: &str) {
        html.clone_into(&mut lock(&self.state).html);
    }

    fn add_class(&self, class: &str) {
        lock(&self.state).classes.insert(class.to_string());
    }

    fn remove_class(&self, class: &str) {
        lock(&self.state).classes.remove(class);
    }
}

/// An in-memory page holding elements by id. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: Arc<HashMap<String, MemoryElement>>,
    body_overflow: Arc<Mutex<String>>,
    overflow_writes: Arc<Mutex<Vec<String>>>,
}

impl MemoryDocument {
    /// A page with the given element ids.
    #[must_use]
    pub fn with_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            elements: Arc::new(
                ids.into_iter()
                    .map(|id| (id.to_string(), MemoryElement::new()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// A page with every drawer element present.
    #[must_use]
    pub fn drawer() -> Self {
        Self::with_ids(ids::ALL)
    }

    /// Element by id, if present.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&MemoryElement> {
        self.elements.get(id)
    }

    /// Current body `overflow` style.
    #[must_use]
    pub fn body_overflow(&self) -> String {
        lock(&self.body_overflow).clone()
    }

    /// Every value written to the body `overflow` style, oldest first.
    #[must_use]
    pub fn overflow_writes(&self) -> Vec<String> {
        lock(&self.overflow_writes).clone()
    }
}

impl ElementSource for MemoryDocument {
    type Element = MemoryElement;

    fn element_by_id(&self, id: &str) -> Option<MemoryElement> {
        self.elements.get(id).cloned()
    }
}

impl Page for MemoryDocument {
    fn set_body_overflow(&self, value: &str) {
        value.clone_into(&mut lock(&self.body_overflow));
        lock(&self.overflow_writes).push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_binds_present_elements() {
        let doc = MemoryDocument::with_ids([ids::CART_TOGGLE, ids::CART_ITEMS]);
        let elements = DrawerElements::query(&doc);

        assert!(elements.is_bound());
        assert!(elements.items.is_some());
        assert!(elements.sidebar.is_none());
        assert!(elements.count.is_none());
    }

    #[test]
    fn test_unbound_without_toggle() {
        let doc = MemoryDocument::with_ids([ids::CART_ITEMS, ids::CART_SIDEBAR]);
        assert!(!DrawerElements::query(&doc).is_bound());
    }

    #[test]
    fn test_element_handles_share_state() {
        let doc = MemoryDocument::drawer();
        let handle = doc.element_by_id(ids::CART_TOTAL).unwrap_or_default();
        handle.set_text("$1.99");
        handle.add_class("active");
        handle.add_class("active");

        let seen = doc.element(ids::CART_TOTAL).cloned().unwrap_or_default();
        assert_eq!(seen.text(), "$1.99");
        assert_eq!(seen.classes(), vec!["active".to_string()]);

        handle.remove_class("active");
        handle.remove_class("active");
        assert!(!seen.has_class("active"));
    }

    #[test]
    fn test_body_overflow_records_writes() {
        let doc = MemoryDocument::drawer();
        doc.set_body_overflow(SCROLL_LOCKED);
        doc.set_body_overflow("");
        assert_eq!(doc.body_overflow(), "");
        assert_eq!(doc.overflow_writes(), vec!["hidden".to_string(), String::new()]);
    }
}
