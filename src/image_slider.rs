use crate::{
	dom::{self, Listener},
	flickity::Flickity,
	widget::Widget,
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{error, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};
use web_sys::{Element, HtmlElement};

const SLIDER_SELECTOR: &str = ".js-text-with-image-slider__slider";
const TITLES_PANEL_SELECTOR: &str = ".js-text-with-image-slider__block-titles";
const TAB_SELECTOR: &str = ".js-text-with-image-slider__block-title";
const ARROW_PREV_SELECTOR: &str = ".js-arrow-prev";
const ARROW_NEXT_SELECTOR: &str = ".js-arrow-next";
const CELL_SELECTOR: &str = ".js-text-with-image-slider__slide-wrapper";

/// Carousel options read from the widget element's data attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderOptions {
	pub draggable: bool,
	/// Autoplay interval in milliseconds; `None` leaves autoplay off.
	pub autoplay_ms: Option<f64>,
}
impl SliderOptions {
	/// `data-draggable`, `data-autoplay` and `data-autoplay-speed`. An autoplay flag
	/// without a parseable speed falls back to the carousel's default interval.
	#[must_use]
	pub fn from_element(element: &Element) -> Self {
		Self {
			draggable: dom::data_flag(element, "draggable"),
			autoplay_ms: if dom::data_flag(element, "autoplay") {
				Some(
					dom::data_attr(element, "autoplay-speed")
						.and_then(|speed| speed.parse().ok())
						.unwrap_or(f64::NAN),
				)
			} else {
				None
			},
		}
	}

	/// The Flickity constructor options object. Arrows, dots and cell selection are
	/// fixed by the markup contract; only dragging and autoplay are configurable.
	#[must_use]
	pub fn to_js(&self) -> JsValue {
		let options = js_sys::Object::new();
		let set = |key: &str, value: &JsValue| {
			js_sys::Reflect::set(&options, &JsValue::from_str(key), value).unwrap_throw();
		};
		set("cellAlign", &JsValue::from_str("center"));
		set("cellSelector", &JsValue::from_str(CELL_SELECTOR));
		set("prevNextButtons", &JsValue::FALSE);
		set("pageDots", &JsValue::FALSE);
		set("draggable", &JsValue::from_bool(self.draggable));
		match self.autoplay_ms {
			Some(interval) if !interval.is_nan() => set("autoPlay", &JsValue::from_f64(interval)),
			Some(_) => set("autoPlay", &JsValue::TRUE),
			None => {}
		}
		options.into()
	}
}

/// Disabled states for the prev/next affordances at a carousel position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArrowState {
	pub previous_disabled: bool,
	pub next_disabled: bool,
}
impl ArrowState {
	#[must_use]
	pub fn at(selected_index: usize, last_index: usize) -> Self {
		Self {
			previous_disabled: selected_index == 0,
			next_disabled: selected_index >= last_index,
		}
	}
}

struct State {
	slider: Flickity,
	tabs: Vec<Element>,
	titles_panel: Option<HtmlElement>,
	arrow_prev: Option<Element>,
	arrows_next: Vec<Element>,
	listeners: Vec<Listener>,
	// Flickity holds a reference to this for the instance's lifetime.
	_change_handler: Option<Closure<dyn FnMut(JsValue)>>,
}

/// Tabbed image carousel, bound to a `<s-text-with-image-slider>` subtree and wrapping
/// one Flickity instance.
///
/// Tabs select slides, arrows step one slide with wrap and animation suppressed, and
/// every position change re-marks the active tab, recolors the shared titles panel from
/// that tab's `data-block-bg-color` and recomputes the arrow [`ArrowState`].
pub struct ImageSliderWidget {
	state: Rc<RefCell<State>>,
	root: Element,
}
impl ImageSliderWidget {
	pub const TAG: &'static str = "s-text-with-image-slider";

	/// Attaches to `root`, constructing the carousel. Returns `None` (and logs) without
	/// a gallery element or with the Flickity global absent; the markup then stays a
	/// static column of slides.
	#[must_use]
	pub fn mount(root: Element) -> Option<Self> {
		let gallery = match dom::query(&root, SLIDER_SELECTOR) {
			Some(gallery) => gallery,
			None => {
				warn!("No gallery element under `{}`; leaving the slider static.", Self::TAG);
				return None;
			}
		};
		let options = SliderOptions::from_element(&root);
		let slider = match Flickity::new(&gallery, &options.to_js()) {
			Ok(slider) => slider,
			Err(error) => {
				error!("Flickity construction failed ({:?}); leaving the slider static.", error);
				return None;
			}
		};

		let state = Rc::new(RefCell::new(State {
			slider,
			tabs: dom::query_all(&root, TAB_SELECTOR),
			titles_panel: dom::query(&root, TITLES_PANEL_SELECTOR).and_then(|element| element.dyn_into().ok()),
			arrow_prev: dom::query(&root, ARROW_PREV_SELECTOR),
			arrows_next: dom::query_all(&root, ARROW_NEXT_SELECTOR),
			listeners: Vec::new(),
			_change_handler: None,
		}));

		// Wire the carousel's change event back into tab/arrow state.
		{
			let weak = Rc::downgrade(&state);
			let handler = Closure::wrap(Box::new(move |index: JsValue| {
				if let Some(state) = weak.upgrade() {
					let s = state.borrow();
					if let Some(index) = index.as_f64() {
						#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
						set_active_tab(&s, index as usize);
					}
					update_arrows(&s);
				}
			}) as Box<dyn FnMut(JsValue)>);
			let mut s = state.borrow_mut();
			s.slider.on("change", handler.as_ref().unchecked_ref());
			s._change_handler = Some(handler);
		}

		attach_listeners(&state);
		update_arrows(&state.borrow());
		Some(Self { state, root })
	}

	/// The wrapped carousel's current slide index.
	#[must_use]
	pub fn selected_index(&self) -> u32 {
		self.state.borrow().slider.selected_index()
	}
}
impl Widget for ImageSliderWidget {
	fn name(&self) -> &'static str {
		Self::TAG
	}

	fn rebind(&self) {
		{
			let mut s = self.state.borrow_mut();
			s.listeners.clear();
			s.tabs = dom::query_all(&self.root, TAB_SELECTOR);
			s.titles_panel = dom::query(&self.root, TITLES_PANEL_SELECTOR).and_then(|element| element.dyn_into().ok());
			s.arrow_prev = dom::query(&self.root, ARROW_PREV_SELECTOR);
			s.arrows_next = dom::query_all(&self.root, ARROW_NEXT_SELECTOR);
		}
		attach_listeners(&self.state);
		update_arrows(&self.state.borrow());
	}
}
impl Drop for ImageSliderWidget {
	fn drop(&mut self) {
		let s = self.state.borrow();
		if let Some(handler) = &s._change_handler {
			s.slider.off("change", handler.as_ref().unchecked_ref());
		}
		s.slider.destroy();
	}
}
impl core::fmt::Debug for ImageSliderWidget {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("ImageSliderWidget").field("tabs", &state.tabs.len()).finish()
	}
}

fn attach_listeners(state: &Rc<RefCell<State>>) {
	let mut listeners = Vec::new();
	{
		let s = state.borrow();

		for tab in &s.tabs {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(tab.as_ref(), "click", move |event| {
				let state = match weak.upgrade() {
					Some(state) => state,
					None => return,
				};
				let index = dom::event_element(&event)
					.and_then(|element| element.closest(TAB_SELECTOR).ok().flatten())
					.and_then(|tab| dom::data_attr(&tab, "slide-index"))
					.and_then(|index| index.parse::<u32>().ok());
				if let Some(index) = index {
					state.borrow().slider.select(index, false, false);
				}
			}));
		}

		if let Some(arrow) = &s.arrow_prev {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(arrow.as_ref(), "click", move |_| {
				if let Some(state) = weak.upgrade() {
					let s = state.borrow();
					s.slider.previous(false, false);
					update_arrows(&s);
				}
			}));
		}

		for arrow in &s.arrows_next {
			let weak = Rc::downgrade(state);
			listeners.push(Listener::attach(arrow.as_ref(), "click", move |_| {
				if let Some(state) = weak.upgrade() {
					let s = state.borrow();
					s.slider.next(false, false);
					update_arrows(&s);
				}
			}));
		}
	}
	state.borrow_mut().listeners = listeners;
}

fn set_active_tab(s: &State, index: usize) {
	for tab in &s.tabs {
		let tab_index = dom::data_attr(tab, "slide-index").and_then(|tab_index| tab_index.parse::<usize>().ok());
		let active = tab_index == Some(index);
		dom::toggle_class(tab, "is-active", active);
		if active {
			if let (Some(panel), Some(color)) = (&s.titles_panel, dom::data_attr(tab, "block-bg-color")) {
				if panel.style().set_property("background-color", &color).is_err() {
					warn!("Could not apply tab background color {:?}.", color);
				}
			}
		}
	}
}

fn update_arrows(s: &State) {
	let slide_count = s.slider.slides().length();
	if slide_count == 0 {
		return;
	}
	#[allow(clippy::cast_possible_truncation)]
	let arrows = ArrowState::at(s.slider.selected_index() as usize, slide_count as usize - 1);
	if let Some(arrow) = &s.arrow_prev {
		dom::toggle_class(arrow, "is-disabled", arrows.previous_disabled);
	}
	for arrow in &s.arrows_next {
		dom::toggle_class(arrow, "is-disabled", arrows.next_disabled);
	}
}
