use crate::{
	dom::{self, Listener},
	widget::Widget,
};
use core::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

const PLAN_INPUT_SELECTOR: &str = ".js-selling-plan";
const RADIO_SELECTOR: &str = ".js-selling-plan-radio";
const CHECKED_RADIO_SELECTOR: &str = ".js-selling-plan-radio:checked";
const SELECT_SELECTOR: &str = ".js-selling-plan-select";
const DISCOUNT_PRICE_SELECTOR: &str = ".js-selling-plan-discount-price";

const ONE_TIME: &str = "onetime";
const SUBSCRIBE: &str = "subscribe";

struct Elements {
	plan_input: Option<HtmlInputElement>,
	radios: Vec<Element>,
	select: Option<HtmlSelectElement>,
	discount_price: Option<HtmlElement>,
}
impl Elements {
	fn bind(root: &Element) -> Self {
		Self {
			plan_input: dom::query(root, PLAN_INPUT_SELECTOR).and_then(|element| element.dyn_into().ok()),
			radios: dom::query_all(root, RADIO_SELECTOR),
			select: dom::query(root, SELECT_SELECTOR).and_then(|element| element.dyn_into().ok()),
			discount_price: dom::query(root, DISCOUNT_PRICE_SELECTOR).and_then(|element| element.dyn_into().ok()),
		}
	}
}

struct State {
	root: Element,
	elements: Elements,
	listeners: Vec<Listener>,
}

/// Product form selling plan chooser, bound to a `<selling-plan>` subtree.
///
/// Purely client-side: mirrors the one-time/subscribe radio pair and the plan dropdown
/// into the hidden `.js-selling-plan` input the surrounding form submits, and shows the
/// selected plan's `data-price`. Any missing control silently no-ops.
pub struct SellingPlanWidget {
	state: Rc<RefCell<State>>,
}
impl SellingPlanWidget {
	pub const TAG: &'static str = "selling-plan";

	/// Attaches to `root` and synchronizes once, so the hidden input is coherent before
	/// the first user interaction.
	#[must_use]
	pub fn mount(root: Element) -> Self {
		let state = Rc::new(RefCell::new(State {
			elements: Elements::bind(&root),
			root,
			listeners: Vec::new(),
		}));
		attach_listeners(&state);
		synchronize(&state.borrow());
		Self { state }
	}

	/// Re-runs the radio/dropdown → hidden input synchronization.
	pub fn synchronize(&self) {
		synchronize(&self.state.borrow());
	}
}
impl Widget for SellingPlanWidget {
	fn name(&self) -> &'static str {
		Self::TAG
	}

	fn rebind(&self) {
		{
			let mut s = self.state.borrow_mut();
			s.listeners.clear();
			s.elements = Elements::bind(&s.root);
		}
		attach_listeners(&self.state);
		synchronize(&self.state.borrow());
	}
}
impl core::fmt::Debug for SellingPlanWidget {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("SellingPlanWidget")
			.field("radios", &state.elements.radios.len())
			.field("bound", &state.elements.plan_input.is_some())
			.finish()
	}
}

fn attach_listeners(state: &Rc<RefCell<State>>) {
	let mut listeners = Vec::new();
	{
		let s = state.borrow();
		for radio in &s.elements.radios {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(radio.as_ref(), "change", move |_| {
				if let Some(state) = weak.upgrade() {
					synchronize(&state.borrow());
				}
			}));
		}
		if let Some(select) = &s.elements.select {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(select.as_ref(), "change", move |_| {
				if let Some(state) = weak.upgrade() {
					synchronize(&state.borrow());
				}
			}));
		}
	}
	state.borrow_mut().listeners = listeners;
}

/// One-time clears the hidden input; subscribe copies the dropdown's selected plan id
/// into it and mirrors that option's `data-price` into the discount price display.
///
/// The checked radio is queried live rather than cached: radio state is DOM state.
fn synchronize(s: &State) {
	let input = match &s.elements.plan_input {
		Some(input) => input,
		None => return,
	};
	let checked = match dom::query(&s.root, CHECKED_RADIO_SELECTOR) {
		Some(checked) => checked,
		None => return,
	};

	match checked.get_attribute("value").unwrap_or_default().as_str() {
		ONE_TIME => input.set_value(""),
		SUBSCRIBE => {
			let select = match &s.elements.select {
				Some(select) => select,
				None => return,
			};
			input.set_value(&select.value());
			if let Some(display) = &s.elements.discount_price {
				let price = dom::query(select.as_ref(), "option:checked")
					.and_then(|option| dom::data_attr(&option, "price"))
					.unwrap_or_default();
				display.set_inner_text(&price);
			}
		}
		_ => {}
	}
}
