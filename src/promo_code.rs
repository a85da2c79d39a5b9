use crate::{
	cart::{CartDiscounts, CartTransport},
	config::PromoCodeStrings,
	dispatch::{Channel, Dispatcher, Notification, Subscription},
	dom::{self, Listener},
	widget::Widget,
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, warn};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlButtonElement, HtmlInputElement, KeyboardEvent};

const INPUT_SELECTOR: &str = ".js-promo-code-input";
const APPLY_SELECTOR: &str = ".js-promo-code-apply";
const WRAPPER_SELECTOR: &str = ".js-promo-code-input-wrapper";
const ERROR_SELECTOR: &str = ".js-promo-code-error";
const REMOVE_SELECTOR: &str = ".js-promo-code-remove";

/// Parses a comma-separated seed list: entries are trimmed, empty entries dropped,
/// duplicates keep their first position.
#[must_use]
pub fn parse_discount_codes(raw: &str) -> Vec<String> {
	let mut codes = Vec::new();
	for code in raw.split(',') {
		let code = code.trim();
		if !code.is_empty() && !codes.iter().any(|existing| existing == code) {
			codes.push(code.to_string());
		}
	}
	codes
}

struct Elements {
	input: Option<HtmlInputElement>,
	apply_button: Option<HtmlButtonElement>,
	input_wrapper: Option<Element>,
	error_display: Option<Element>,
	remove_buttons: Vec<Element>,
}
impl Elements {
	fn bind(root: &Element) -> Self {
		Self {
			input: dom::query(root, INPUT_SELECTOR).and_then(|element| element.dyn_into().ok()),
			apply_button: dom::query(root, APPLY_SELECTOR).and_then(|element| element.dyn_into().ok()),
			input_wrapper: dom::query(root, WRAPPER_SELECTOR),
			error_display: dom::query(root, ERROR_SELECTOR),
			remove_buttons: dom::query_all(root, REMOVE_SELECTOR),
		}
	}
}

struct State {
	root: Element,
	strings: PromoCodeStrings,
	section_id: String,
	debug: bool,
	codes: Vec<String>,
	loading: bool,
	elements: Elements,
	listeners: Vec<Listener>,
	dispatcher: Dispatcher,
	transport: Rc<dyn CartTransport>,
}

/// Promo code entry and removal, bound to one `<cart-promo-code>` subtree.
///
/// Keeps the locally-known applied code set, posts the whole set to the cart on every
/// change, and publishes [`Notification::PromoCodeUpdated`] once the server accepts.
/// Validation failures and server rejections render inline; the markup contract is the
/// `js-promo-code-*` class set.
pub struct PromoCodeWidget {
	state: Rc<RefCell<State>>,
	_rebind: Subscription,
}
impl PromoCodeWidget {
	pub const TAG: &'static str = "cart-promo-code";

	/// Attaches to `root`. Missing child elements degrade the affected behavior to a
	/// no-op rather than failing the mount, since the section may render without the
	/// promo form (e.g. an empty cart).
	#[must_use]
	pub fn mount(root: Element, dispatcher: &Dispatcher, transport: Rc<dyn CartTransport>, strings: PromoCodeStrings) -> Self {
		let state = Rc::new(RefCell::new(State {
			strings,
			section_id: dom::data_attr(&root, "section-id").unwrap_or_default(),
			debug: dom::data_flag(&root, "debug-mode"),
			codes: parse_discount_codes(&dom::data_attr(&root, "discount-codes").unwrap_or_default()),
			loading: false,
			elements: Elements::bind(&root),
			root,
			listeners: Vec::new(),
			dispatcher: dispatcher.clone(),
			transport,
		}));
		attach_listeners(&state);

		let rebind = {
			let weak = Rc::downgrade(&state);
			dispatcher.subscribe(Channel::CartRequestEnded, move |_| {
				if let Some(state) = weak.upgrade() {
					rebind(&state);
				}
			})
		};

		log_verbose(&state.borrow(), "mounted");
		Self { state, _rebind: rebind }
	}

	/// Validates and applies `code`; see the module tests for the exact outcomes.
	pub async fn apply(&self, code: &str) {
		apply(&self.state, code).await;
	}

	/// Removes `code` (a no-op removal still syncs the cart, matching the markup's
	/// remove buttons which may outlive the set).
	pub async fn remove(&self, code: &str) {
		remove(&self.state, code).await;
	}

	/// The locally-known applied set, in application order.
	#[must_use]
	pub fn discount_codes(&self) -> Vec<String> {
		self.state.borrow().codes.clone()
	}

	#[must_use]
	pub fn is_loading(&self) -> bool {
		self.state.borrow().loading
	}
}
impl Widget for PromoCodeWidget {
	fn name(&self) -> &'static str {
		Self::TAG
	}

	fn rebind(&self) {
		rebind(&self.state);
	}
}
impl core::fmt::Debug for PromoCodeWidget {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("PromoCodeWidget")
			.field("section_id", &state.section_id)
			.field("codes", &state.codes)
			.field("loading", &state.loading)
			.finish()
	}
}

fn attach_listeners(state: &Rc<RefCell<State>>) {
	let mut listeners = Vec::new();
	{
		let s = state.borrow();

		if let Some(button) = &s.elements.apply_button {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(button.as_ref(), "click", move |_| {
				if let Some(state) = weak.upgrade() {
					spawn_apply_from_input(&state);
				}
			}));
		}

		if let Some(input) = &s.elements.input {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(input.as_ref(), "keypress", move |event| {
				if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
					if event.key() == "Enter" {
						event.prevent_default();
						if let Some(state) = weak.upgrade() {
							spawn_apply_from_input(&state);
						}
					}
				}
			}));
		}

		for button in &s.elements.remove_buttons {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(button.as_ref(), "click", move |event| {
				let state = match weak.upgrade() {
					Some(state) => state,
					None => return,
				};
				let code = dom::event_element(&event)
					.and_then(|element| element.closest(REMOVE_SELECTOR).ok().flatten())
					.and_then(|button| dom::data_attr(&button, "promo-code"));
				if let Some(code) = code {
					log_verbose(&state.borrow(), "remove requested");
					wasm_bindgen_futures::spawn_local(async move { remove(&state, &code).await });
				}
			}));
		}
	}
	state.borrow_mut().listeners = listeners;
}

fn spawn_apply_from_input(state: &Rc<RefCell<State>>) {
	let code = input_value(&state.borrow());
	log_verbose(&state.borrow(), "apply requested");
	let state = Rc::clone(state);
	wasm_bindgen_futures::spawn_local(async move { apply(&state, &code).await });
}

/// Drops the stale element references and listeners, then re-resolves both against the
/// current subtree and re-seeds the code set from `data-discount-codes`. This is the
/// re-binding hook for externally replaced markup: the ajax-cart library re-renders the
/// section wholesale, so every previously held element may be detached.
fn rebind(state: &Rc<RefCell<State>>) {
	{
		let mut s = state.borrow_mut();
		s.listeners.clear();
		let elements = Elements::bind(&s.root);
		s.elements = elements;
		s.section_id = dom::data_attr(&s.root, "section-id").unwrap_or_default();
		s.codes = parse_discount_codes(&dom::data_attr(&s.root, "discount-codes").unwrap_or_default());
	}
	attach_listeners(state);
	log_verbose(&state.borrow(), "rebound");
}

async fn apply(state: &Rc<RefCell<State>>, code: &str) {
	let code = code.trim();
	{
		let mut s = state.borrow_mut();
		// Rejected before validation so a blocked trigger leaves the set untouched.
		if s.loading {
			warn!("Discount update already in flight; ignoring apply of {:?}.", code);
			return;
		}
		if code.is_empty() {
			let message = s.strings.empty.clone();
			show_error(&s, &message);
			log_verbose(&s, "validation failed: empty code");
			return;
		}
		if s.codes.iter().any(|existing| existing == code) {
			let message = s.strings.already_applied.clone();
			show_error(&s, &message);
			log_verbose(&s, "validation failed: code already applied");
			return;
		}
		clear_error(&s);
		s.codes.push(code.to_string());
	}
	sync_cart(state, Some(code.to_string())).await;
}

async fn remove(state: &Rc<RefCell<State>>, code: &str) {
	{
		let mut s = state.borrow_mut();
		if s.loading {
			warn!("Discount update already in flight; ignoring removal of {:?}.", code);
			return;
		}
		s.codes.retain(|existing| existing != code);
	}
	sync_cart(state, None).await;
}

/// Pushes the full code set to the cart and reconciles the outcome.
///
/// `submitted` is the code the user just typed, if any; only that code's applicability
/// verdict matters for the inline error. Removals submit no code, so they always reach
/// the updated notification.
async fn sync_cart(state: &Rc<RefCell<State>>, submitted: Option<String>) {
	let (transport, discounts) = {
		let mut s = state.borrow_mut();
		if s.loading {
			warn!("Discount update already in flight; ignoring this trigger.");
			return;
		}
		s.loading = true;
		render_loading(&s);
		(s.transport.clone(), s.codes.join(","))
	};

	let result = transport.update_discounts(discounts).await;

	let mut s = state.borrow_mut();
	s.loading = false;
	render_loading(&s);
	match result {
		Ok(response) => {
			if submitted_code_rejected(&response, submitted.as_deref()) {
				let message = s.strings.not_applicable.clone();
				show_error(&s, &message);
				log_verbose(&s, "server rejected the submitted code");
				return;
			}
			clear_input(&s);
			clear_error(&s);
			let notification = Notification::PromoCodeUpdated {
				discount_codes: s.codes.clone(),
				section_id: s.section_id.clone(),
			};
			let dispatcher = s.dispatcher.clone();
			log_verbose(&s, "cart discounts updated");
			// Release the borrow first: subscribers may call back into this widget.
			drop(s);
			dispatcher.publish(&notification);
		}
		Err(error) => {
			error!("Discount update failed: {}", error);
			let message = s.strings.error.clone();
			show_error(&s, &message);
		}
	}
}

fn submitted_code_rejected(response: &CartDiscounts, submitted: Option<&str>) -> bool {
	let submitted = match submitted {
		Some(submitted) => submitted.to_lowercase(),
		None => return false,
	};
	response
		.discount_codes
		.iter()
		.find(|entry| entry.code.to_lowercase() == submitted)
		.map_or(false, |entry| !entry.applicable)
}

fn input_value(s: &State) -> String {
	s.elements.input.as_ref().map(|input| input.value().trim().to_string()).unwrap_or_default()
}

fn render_loading(s: &State) {
	if let Some(button) = &s.elements.apply_button {
		button.set_disabled(s.loading);
		button.set_text_content(Some(if s.loading {
			s.strings.loading.as_str()
		} else {
			s.strings.button.as_str()
		}));
	}
}

fn show_error(s: &State, message: &str) {
	if let Some(wrapper) = &s.elements.input_wrapper {
		dom::toggle_class(wrapper, "error", true);
	}
	if let Some(display) = &s.elements.error_display {
		display.set_text_content(Some(message));
	}
}

fn clear_error(s: &State) {
	if let Some(wrapper) = &s.elements.input_wrapper {
		dom::toggle_class(wrapper, "error", false);
	}
	if let Some(display) = &s.elements.error_display {
		display.set_text_content(Some(""));
	}
}

fn clear_input(s: &State) {
	if let Some(input) = &s.elements.input {
		input.set_value("");
	}
}

fn log_verbose(s: &State, message: &str) {
	if s.debug {
		debug!("[{}] {}", PromoCodeWidget::TAG, message);
	}
}
