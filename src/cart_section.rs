use crate::{
	cart::{self, CartTransport},
	dispatch::{Channel, Dispatcher, Notification, Subscription},
	dom,
	widget::Widget,
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, warn};
use wasm_bindgen::{JsCast, JsValue, UnwrapThrowExt};
use web_sys::Element;

const FORM_SELECTOR: &str = ".js-cart-form";
const CONTENT_WRAPPER_SELECTOR: &str = ".js-content-wrapper";

struct State {
	root: Element,
	section_id: String,
	debug: bool,
	content_wrapper: Option<Element>,
	cart_form: Option<Element>,
	refreshing: bool,
	refresh_pending: bool,
	transport: Rc<dyn CartTransport>,
}

/// Server-rendered cart markup that re-fetches itself, bound to one `<cart-section>`
/// subtree.
///
/// This widget is the *sole* owner of its `.js-content-wrapper` subtree: everything else
/// (including [`PromoCodeWidget`](`crate::promo_code::PromoCodeWidget`)) only ever asks
/// for a refresh through [`Notification::PromoCodeUpdated`], never writes the markup
/// itself. Refresh failures are logged and leave the stale markup standing; there is no
/// user-visible error surface here.
pub struct CartSectionWidget {
	state: Rc<RefCell<State>>,
	_subscriptions: Vec<Subscription>,
}
impl CartSectionWidget {
	pub const TAG: &'static str = "cart-section";

	#[must_use]
	pub fn mount(root: Element, dispatcher: &Dispatcher, transport: Rc<dyn CartTransport>) -> Self {
		let state = Rc::new(RefCell::new(State {
			section_id: dom::data_attr(&root, "section-id").unwrap_or_default(),
			debug: dom::data_flag(&root, "debug-mode"),
			content_wrapper: dom::query(&root, CONTENT_WRAPPER_SELECTOR),
			cart_form: dom::query(&root, FORM_SELECTOR),
			root,
			refreshing: false,
			refresh_pending: false,
			transport,
		}));

		// The ajax-cart library re-fetches the cart whenever the window regains focus,
		// which fights the refreshes this widget issues itself. The library may load
		// after us, so retry once it announces itself.
		if !disable_update_on_window_focus() {
			debug!("ajax-cart library not ready; deferring configuration.");
		}

		let subscriptions = vec![
			{
				let weak = Rc::downgrade(&state);
				dispatcher.subscribe(Channel::CartRequestEnded, move |_| {
					if let Some(state) = weak.upgrade() {
						rebind(&state);
					}
				})
			},
			{
				let weak = Rc::downgrade(&state);
				dispatcher.subscribe(Channel::PromoCodeUpdated, move |notification| {
					let state = match weak.upgrade() {
						Some(state) => state,
						None => return,
					};
					if let Notification::PromoCodeUpdated { section_id, .. } = notification {
						if *section_id == state.borrow().section_id {
							let state = Rc::clone(&state);
							wasm_bindgen_futures::spawn_local(async move { refresh(&state).await });
						}
					}
				})
			},
			dispatcher.subscribe(Channel::AjaxCartReady, move |_| {
				if !disable_update_on_window_focus() {
					warn!("ajax-cart library announced init but exposes no configuration handle.");
				}
			}),
		];

		log_verbose(&state.borrow(), "mounted");
		Self {
			state,
			_subscriptions: subscriptions,
		}
	}

	/// Re-fetches this section's markup and splices it in; normally driven by
	/// [`Notification::PromoCodeUpdated`], public for direct use.
	pub async fn refresh(&self) {
		refresh(&self.state).await;
	}

	#[must_use]
	pub fn section_id(&self) -> String {
		self.state.borrow().section_id.clone()
	}

	/// The section's cart form, if the current markup renders one. Re-resolved on every
	/// rebind and refresh, so the reference is never stale.
	#[must_use]
	pub fn cart_form(&self) -> Option<Element> {
		self.state.borrow().cart_form.clone()
	}
}
impl Widget for CartSectionWidget {
	fn name(&self) -> &'static str {
		Self::TAG
	}

	fn rebind(&self) {
		rebind(&self.state);
	}
}
impl core::fmt::Debug for CartSectionWidget {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("CartSectionWidget")
			.field("section_id", &state.section_id)
			.field("refreshing", &state.refreshing)
			.finish()
	}
}

fn rebind(state: &Rc<RefCell<State>>) {
	let mut s = state.borrow_mut();
	s.content_wrapper = dom::query(&s.root, CONTENT_WRAPPER_SELECTOR);
	s.cart_form = dom::query(&s.root, FORM_SELECTOR);
	log_verbose(&s, "rebound");
}

/// At most one fetch runs at a time; a trigger landing mid-flight marks the refresh
/// pending and it runs once more afterwards, so the final markup always reflects the
/// last trigger.
async fn refresh(state: &Rc<RefCell<State>>) {
	loop {
		let (transport, url) = {
			let mut s = state.borrow_mut();
			if s.refreshing {
				s.refresh_pending = true;
				log_verbose(&s, "refresh already in flight; queueing one re-run");
				return;
			}
			s.refreshing = true;
			let href = dom::document()
				.location()
				.expect_throw("storefront-widgets: Document has no location.")
				.href()
				.unwrap_throw();
			(s.transport.clone(), cart::section_url(&href, &s.section_id))
		};
		log_verbose(&state.borrow(), "refreshing section");

		let result = transport.fetch_section(url).await;

		let run_again = {
			let mut s = state.borrow_mut();
			s.refreshing = false;
			match result {
				Ok(html) => splice_fragment(&mut s, &html),
				Err(error) => error!("Cart section refresh failed: {}", error),
			}
			core::mem::take(&mut s.refresh_pending)
		};
		if !run_again {
			return;
		}
	}
}

/// Replaces the content wrapper's inner markup with the matching fragment of the
/// freshly fetched section HTML. The fragment is parsed off-document; nothing is
/// patched node-by-node.
fn splice_fragment(s: &mut State, html: &str) {
	let staging = dom::document().create_element("div").unwrap_throw();
	staging.set_inner_html(html);
	let incoming = dom::query(&staging, CONTENT_WRAPPER_SELECTOR);
	match (incoming, &s.content_wrapper) {
		(Some(incoming), Some(wrapper)) => {
			wrapper.set_inner_html(&incoming.inner_html());
			log_verbose(s, "section markup replaced");
			// Everything inside the wrapper is new; refresh our own references too.
			s.cart_form = dom::query(&s.root, FORM_SELECTOR);
		}
		(incoming, wrapper) => warn!(
			"Cart section refresh found no splice target (fetched fragment: {}, local wrapper: {}); keeping stale markup.",
			incoming.is_some(),
			wrapper.is_some()
		),
	}
}

/// `true` if the ajax-cart library was found and configured.
///
/// The library hangs a `liquidAjaxCart` handle off the global object once initialized;
/// `conf("updateOnWindowFocus", false)` goes through that handle.
fn disable_update_on_window_focus() -> bool {
	let window = match web_sys::window() {
		Some(window) => window,
		None => return false,
	};
	let handle = match js_sys::Reflect::get(window.as_ref(), &JsValue::from_str("liquidAjaxCart")) {
		Ok(handle) if !handle.is_undefined() && !handle.is_null() => handle,
		_ => return false,
	};
	if !js_sys::Reflect::get(&handle, &JsValue::from_str("init")).map(|init| init.is_truthy()).unwrap_or(false) {
		return false;
	}
	let conf = match js_sys::Reflect::get(&handle, &JsValue::from_str("conf")) {
		Ok(conf) => conf,
		Err(_) => return false,
	};
	match conf.dyn_ref::<js_sys::Function>() {
		Some(conf) => {
			if conf.call2(&handle, &JsValue::from_str("updateOnWindowFocus"), &JsValue::FALSE).is_err() {
				error!("ajax-cart `conf` call failed.");
			}
			true
		}
		None => false,
	}
}

fn log_verbose(s: &State, message: &str) {
	if s.debug {
		debug!("[{}] {}", CartSectionWidget::TAG, message);
	}
}
