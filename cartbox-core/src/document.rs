//! Read/write access to the rendered page.
//!
//! The interceptor never walks a real DOM. It sees the page through the
//! [`Document`] trait, which exposes just the three facts it depends on:
//!
//! - the configuration controls rendered for a product (price tabs, RAM or
//!   storage pickers), each with a selected flag and a link to its
//!   configuration
//! - the text content of an element by id (the cart item counter)
//! - writing that text content back
//!
//! [`MemoryDocument`] is an in-memory page model, used by tests and by
//! adapters that keep their own snapshot of the page.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::target::ProductId;

/// A configuration-selection control, such as one price tab of a product card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationControl {
    attribute: SmolStr,
    link: String,
    selected: bool,
}

impl ConfigurationControl {
    /// Creates an unselected control in the `attribute` group linking to `link`.
    ///
    /// The link is typically the `hx-get` target of the control, e.g.
    /// `/products/42/prices/7`.
    pub fn new(attribute: impl Into<SmolStr>, link: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            link: link.into(),
            selected: false,
        }
    }

    /// Marks the control as selected.
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Attribute group the control belongs to.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Link identifying the configuration this control selects.
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Whether the control is currently selected.
    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

/// The page as seen by the interceptor.
pub trait Document {
    /// Configuration controls rendered within `product`'s selector scope.
    ///
    /// Controls of other products must not be returned.
    fn configuration_controls(&self, product: ProductId) -> Vec<ConfigurationControl>;

    /// Text content of the element with id `element_id`, if it exists.
    fn text_content(&self, element_id: &str) -> Option<String>;

    /// Replaces the text content of `element_id`.
    ///
    /// Returns `false` when no such element exists.
    fn set_text_content(&mut self, element_id: &str, text: &str) -> bool;
}

impl<T> Document for &mut T
where
    T: Document + ?Sized,
{
    fn configuration_controls(&self, product: ProductId) -> Vec<ConfigurationControl> {
        (**self).configuration_controls(product)
    }

    fn text_content(&self, element_id: &str) -> Option<String> {
        (**self).text_content(element_id)
    }

    fn set_text_content(&mut self, element_id: &str, text: &str) -> bool {
        (**self).set_text_content(element_id, text)
    }
}

impl<T> Document for Box<T>
where
    T: Document + ?Sized,
{
    fn configuration_controls(&self, product: ProductId) -> Vec<ConfigurationControl> {
        self.as_ref().configuration_controls(product)
    }

    fn text_content(&self, element_id: &str) -> Option<String> {
        self.as_ref().text_content(element_id)
    }

    fn set_text_content(&mut self, element_id: &str, text: &str) -> bool {
        self.as_mut().set_text_content(element_id, text)
    }
}

/// In-memory page model.
///
/// # Example
///
/// ```
/// use cartbox_core::{ConfigurationControl, Document, MemoryDocument, ProductId};
///
/// let page = MemoryDocument::new()
///     .with_control(42, ConfigurationControl::new("price", "/products/42/prices/7").selected())
///     .with_control(42, ConfigurationControl::new("price", "/products/42/prices/8"))
///     .with_element("cart-counter", "3");
///
/// assert_eq!(page.configuration_controls(ProductId::new(42)).len(), 2);
/// assert_eq!(page.text_content("cart-counter").as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    controls: HashMap<ProductId, Vec<ConfigurationControl>>,
    elements: HashMap<String, String>,
}

impl MemoryDocument {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configuration control to `product`'s scope.
    pub fn with_control(
        mut self,
        product: impl Into<ProductId>,
        control: ConfigurationControl,
    ) -> Self {
        self.add_control(product, control);
        self
    }

    /// Adds a text element.
    pub fn with_element(mut self, element_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.elements.insert(element_id.into(), text.into());
        self
    }

    /// Adds a configuration control to `product`'s scope.
    pub fn add_control(&mut self, product: impl Into<ProductId>, control: ConfigurationControl) {
        self.controls.entry(product.into()).or_default().push(control);
    }

    /// Selects the control linking to `link`, the way clicking a tab does.
    ///
    /// Every other control of the same attribute group of that product is
    /// deselected. Returns `false` if no control links to `link`.
    pub fn select(&mut self, product: impl Into<ProductId>, link: &str) -> bool {
        let Some(controls) = self.controls.get_mut(&product.into()) else {
            return false;
        };
        let Some(attribute) = controls
            .iter()
            .find(|control| control.link == link)
            .map(|control| control.attribute.clone())
        else {
            return false;
        };
        for control in controls
            .iter_mut()
            .filter(|control| control.attribute == attribute)
        {
            control.selected = control.link == link;
        }
        true
    }

    /// Deselects every control of `product`.
    pub fn clear_selection(&mut self, product: impl Into<ProductId>) {
        if let Some(controls) = self.controls.get_mut(&product.into()) {
            controls
                .iter_mut()
                .for_each(|control| control.selected = false);
        }
    }

    /// Removes an element from the page.
    pub fn remove_element(&mut self, element_id: &str) -> Option<String> {
        self.elements.remove(element_id)
    }
}

impl Document for MemoryDocument {
    fn configuration_controls(&self, product: ProductId) -> Vec<ConfigurationControl> {
        self.controls.get(&product).cloned().unwrap_or_default()
    }

    fn text_content(&self, element_id: &str) -> Option<String> {
        self.elements.get(element_id).cloned()
    }

    fn set_text_content(&mut self, element_id: &str, text: &str) -> bool {
        match self.elements.get_mut(element_id) {
            Some(content) => {
                text.clone_into(content);
                true
            }
            None => false,
        }
    }
}
