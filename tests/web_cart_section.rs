#![cfg(target_arch = "wasm32")]

mod common;

use common::{settle, FakeTransport};
use std::rc::Rc;
use storefront_widgets::{
	cart::{section_url, CartError},
	cart_section::CartSectionWidget,
	dispatch::{Dispatcher, Notification},
};
use wasm_bindgen::UnwrapThrowExt;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::CustomEvent;

wasm_bindgen_test_configure!(run_in_browser);

const MARKUP: &str = r#"
	<cart-section data-section-id="main-cart">
		<div class="js-content-wrapper">
			<form class="js-cart-form"></form>
			<p>OLD</p>
		</div>
	</cart-section>
"#;

fn mount(transport: Rc<FakeTransport>) -> (CartSectionWidget, Dispatcher) {
	common::init_tracing();
	let root = common::fixture(MARKUP, "cart-section");
	let dispatcher = Dispatcher::new(&common::document());
	let widget = CartSectionWidget::mount(root, &dispatcher, transport);
	(widget, dispatcher)
}

fn wrapper_html() -> String {
	common::query(".js-content-wrapper").inner_html()
}

fn updated(section_id: &str) -> Notification {
	Notification::PromoCodeUpdated {
		discount_codes: Vec::new(),
		section_id: section_id.to_string(),
	}
}

#[wasm_bindgen_test]
fn section_url_sets_the_query_parameter() {
	assert_eq!(
		section_url("https://shop.example/cart?foo=1", "main-cart"),
		"https://shop.example/cart?foo=1&section_id=main-cart"
	);
	// An existing parameter is replaced, not duplicated.
	assert_eq!(
		section_url("https://shop.example/cart?section_id=other", "main-cart"),
		"https://shop.example/cart?section_id=main-cart"
	);
}

#[wasm_bindgen_test]
async fn matching_update_replaces_the_wrapper_markup() {
	let transport = Rc::new(FakeTransport::default());
	transport
		.section_results
		.borrow_mut()
		.push_back(Ok(r#"<section><div class="js-content-wrapper"><p>NEW</p></div></section>"#.to_string()));
	let (_widget, dispatcher) = mount(transport.clone());

	dispatcher.publish(&updated("main-cart"));
	settle().await;

	assert_eq!(transport.section_calls.borrow().len(), 1);
	assert!(
		transport.section_calls.borrow()[0].contains("section_id=main-cart"),
		"refresh URL must carry the section id: {}",
		transport.section_calls.borrow()[0]
	);
	assert_eq!(wrapper_html(), "<p>NEW</p>");
}

#[wasm_bindgen_test]
async fn mismatched_section_ids_do_not_refresh() {
	let transport = Rc::new(FakeTransport::default());
	let (_widget, dispatcher) = mount(transport.clone());

	dispatcher.publish(&updated("other-section"));
	settle().await;

	assert_eq!(transport.section_calls.borrow().len(), 0);
	assert!(wrapper_html().contains("OLD"));
}

#[wasm_bindgen_test]
async fn failed_refreshes_keep_the_stale_markup() {
	let transport = Rc::new(FakeTransport::default());
	transport.section_results.borrow_mut().push_back(Err(CartError::Status(502)));
	let (_widget, dispatcher) = mount(transport.clone());

	dispatcher.publish(&updated("main-cart"));
	settle().await;

	assert!(wrapper_html().contains("OLD"));
}

#[wasm_bindgen_test]
async fn responses_without_the_fragment_keep_the_stale_markup() {
	let transport = Rc::new(FakeTransport::default());
	transport.section_results.borrow_mut().push_back(Ok("<section>no wrapper here</section>".to_string()));
	let (_widget, dispatcher) = mount(transport.clone());

	dispatcher.publish(&updated("main-cart"));
	settle().await;

	assert!(wrapper_html().contains("OLD"));
}

#[wasm_bindgen_test]
async fn the_form_reference_survives_a_refresh() {
	let transport = Rc::new(FakeTransport::default());
	transport
		.section_results
		.borrow_mut()
		.push_back(Ok(r#"<div class="js-content-wrapper"><form class="js-cart-form" data-fresh="true"></form></div>"#.to_string()));
	let (widget, dispatcher) = mount(transport.clone());

	dispatcher.publish(&updated("main-cart"));
	settle().await;

	let form = widget.cart_form().unwrap_throw();
	assert_eq!(form.get_attribute("data-fresh").as_deref(), Some("true"));
}

#[wasm_bindgen_test]
async fn ajax_cart_request_end_rebinds_the_references() {
	let transport = Rc::new(FakeTransport::default());
	let (widget, _dispatcher) = mount(transport.clone());
	let root = common::query("cart-section");

	root.set_inner_html(r#"<div class="js-content-wrapper"><form class="js-cart-form" data-generation="2"></form></div>"#);
	let event = CustomEvent::new("liquid-ajax-cart:request-end").unwrap_throw();
	common::document().dispatch_event(&event).unwrap_throw();

	let form = widget.cart_form().unwrap_throw();
	assert_eq!(form.get_attribute("data-generation").as_deref(), Some("2"));
}
