#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::collections::VecDeque;
use storefront_widgets::cart::{CartDiscounts, CartError, CartTransport, DiscountCode, LineChange};
use wasm_bindgen::UnwrapThrowExt;
use web_sys::{Document, Element};

pub fn init_tracing() {
	static INIT: std::sync::Once = std::sync::Once::new();
	INIT.call_once(tracing_wasm::set_as_global_default);
}

pub fn document() -> Document {
	web_sys::window().unwrap_throw().document().unwrap_throw()
}

/// Replaces the test document's body with `html` and returns the element matching
/// `selector`.
pub fn fixture(html: &str, selector: &str) -> Element {
	let document = document();
	document.body().unwrap_throw().set_inner_html(html);
	document.query_selector(selector).unwrap_throw().unwrap_throw()
}

pub fn query(selector: &str) -> Element {
	document().query_selector(selector).unwrap_throw().unwrap_throw()
}

/// Parks the test task behind the macrotask queue once, letting everything spawned onto
/// the microtask queue (i.e. every widget-internal request round trip against a fake
/// transport) run to completion.
pub async fn settle() {
	gloo_timers::future::TimeoutFuture::new(0).await;
}

/// A recording, scriptable [`CartTransport`].
///
/// Every call is logged with its payload; results are popped from the matching queue
/// and default to benign successes, so tests only script what they assert.
#[derive(Default)]
pub struct FakeTransport {
	pub discount_calls: RefCell<Vec<String>>,
	pub discount_results: RefCell<VecDeque<Result<CartDiscounts, CartError>>>,
	pub change_calls: RefCell<Vec<LineChange>>,
	pub change_results: RefCell<VecDeque<Result<serde_json::Value, CartError>>>,
	pub section_calls: RefCell<Vec<String>>,
	pub section_results: RefCell<VecDeque<Result<String, CartError>>>,
	/// Invoked during every discount call, i.e. while the caller's request is in flight.
	pub discount_probe: RefCell<Option<Box<dyn Fn()>>>,
	/// While set, discount requests never resolve.
	pub stall_discounts: Cell<bool>,
}
impl FakeTransport {
	pub fn applicable(code: &str) -> Result<CartDiscounts, CartError> {
		Ok(CartDiscounts {
			discount_codes: vec![DiscountCode {
				code: code.to_string(),
				applicable: true,
			}],
		})
	}

	pub fn not_applicable(code: &str) -> Result<CartDiscounts, CartError> {
		Ok(CartDiscounts {
			discount_codes: vec![DiscountCode {
				code: code.to_string(),
				applicable: false,
			}],
		})
	}
}
impl CartTransport for FakeTransport {
	fn update_discounts(&self, discounts: String) -> LocalBoxFuture<'static, Result<CartDiscounts, CartError>> {
		self.discount_calls.borrow_mut().push(discounts);
		if let Some(probe) = self.discount_probe.borrow().as_ref() {
			probe();
		}
		if self.stall_discounts.get() {
			return future::pending().boxed_local();
		}
		let result = self.discount_results.borrow_mut().pop_front().unwrap_or_else(|| Ok(CartDiscounts::default()));
		future::ready(result).boxed_local()
	}

	fn change_line(&self, change: LineChange) -> LocalBoxFuture<'static, Result<serde_json::Value, CartError>> {
		self.change_calls.borrow_mut().push(change);
		let result = self.change_results.borrow_mut().pop_front().unwrap_or_else(|| Ok(serde_json::json!({})));
		future::ready(result).boxed_local()
	}

	fn fetch_section(&self, url: String) -> LocalBoxFuture<'static, Result<String, CartError>> {
		self.section_calls.borrow_mut().push(url);
		let result = self.section_results.borrow_mut().pop_front().unwrap_or_else(|| Ok(String::new()));
		future::ready(result).boxed_local()
	}
}
