use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, UnwrapThrowExt};
use web_sys::{Document, Element, Event, EventTarget, NodeList};

pub fn document() -> Document {
	web_sys::window()
		.expect_throw("storefront-widgets: No `window` in this environment.")
		.document()
		.expect_throw("storefront-widgets: No `document` on `window`.")
}

/// Scoped [***querySelector***](https://developer.mozilla.org/en-US/docs/Web/API/Element/querySelector).
///
/// Selectors are compile-time constants throughout this crate, so a syntax error throws.
pub fn query(scope: &Element, selector: &str) -> Option<Element> {
	scope.query_selector(selector).unwrap_throw()
}

pub fn query_all(scope: &Element, selector: &str) -> Vec<Element> {
	collect_elements(&scope.query_selector_all(selector).unwrap_throw())
}

pub fn query_all_document(document: &Document, selector: &str) -> Vec<Element> {
	collect_elements(&document.query_selector_all(selector).unwrap_throw())
}

fn collect_elements(nodes: &NodeList) -> Vec<Element> {
	(0..nodes.length())
		.filter_map(|i| nodes.get(i))
		.filter_map(|node| node.dyn_into::<Element>().ok())
		.collect()
}

/// Reads `data-<name>`, i.e. `data_attr(element, "section-id")` reads `data-section-id`.
pub fn data_attr(element: &Element, name: &str) -> Option<String> {
	element.get_attribute(&format!("data-{}", name))
}

/// `true` iff `data-<name>` is present and exactly `"true"`.
pub fn data_flag(element: &Element, name: &str) -> bool {
	data_attr(element, name).as_deref() == Some("true")
}

pub fn toggle_class(element: &Element, class: &str, on: bool) {
	element.class_list().toggle_with_force(class, on).unwrap_throw();
}

pub fn event_element(event: &Event) -> Option<Element> {
	event.target()?.dyn_into::<Element>().ok()
}

/// A DOM event listener that stays attached exactly as long as this handle is alive.
///
/// The wrapped [`Closure`] is owned here rather than leaked or parked in a global registry,
/// so dropping the owning widget detaches everything it wired up.
pub struct Listener {
	target: EventTarget,
	name: &'static str,
	closure: Closure<dyn FnMut(Event)>,
}
impl Listener {
	pub fn attach(target: &EventTarget, name: &'static str, handler: impl FnMut(Event) + 'static) -> Self {
		let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
		target
			.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
			.unwrap_throw();
		trace!("Attached `{}` listener.", name);
		Self {
			target: target.clone(),
			name,
			closure,
		}
	}
}
impl Drop for Listener {
	fn drop(&mut self) {
		if self
			.target
			.remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref())
			.is_err()
		{
			error!("Failed to detach `{}` listener.", self.name);
		} else {
			trace!("Detached `{}` listener.", self.name);
		}
	}
}
impl core::fmt::Debug for Listener {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Listener").field("name", &self.name).finish()
	}
}
