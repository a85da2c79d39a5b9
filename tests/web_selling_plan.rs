#![cfg(target_arch = "wasm32")]

mod common;

use storefront_widgets::selling_plan::SellingPlanWidget;
use wasm_bindgen::{JsCast, UnwrapThrowExt};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Event, HtmlInputElement, HtmlSelectElement};

wasm_bindgen_test_configure!(run_in_browser);

const MARKUP: &str = r#"
	<selling-plan>
		<input class="js-selling-plan" type="hidden" value="stale">
		<label><input class="js-selling-plan-radio" type="radio" name="purchase" value="onetime" checked></label>
		<label><input class="js-selling-plan-radio" type="radio" name="purchase" value="subscribe"></label>
		<select class="js-selling-plan-select">
			<option value="841" data-price="$17.10" selected>Every month</option>
			<option value="842" data-price="$15.20">Every three months</option>
		</select>
		<span class="js-selling-plan-discount-price"></span>
	</selling-plan>
"#;

fn mount() -> SellingPlanWidget {
	common::init_tracing();
	let root = common::fixture(MARKUP, "selling-plan");
	SellingPlanWidget::mount(root)
}

fn hidden_input() -> HtmlInputElement {
	common::query(".js-selling-plan").dyn_into().unwrap_throw()
}

fn radio(value: &str) -> HtmlInputElement {
	common::query(&format!(".js-selling-plan-radio[value='{}']", value)).dyn_into().unwrap_throw()
}

fn select() -> HtmlSelectElement {
	common::query(".js-selling-plan-select").dyn_into().unwrap_throw()
}

fn price_text() -> String {
	common::query(".js-selling-plan-discount-price").text_content().unwrap_or_default()
}

fn change(target: &web_sys::EventTarget) {
	target.dispatch_event(&Event::new("change").unwrap_throw()).unwrap_throw();
}

#[wasm_bindgen_test]
fn mounting_synchronizes_immediately() {
	let _widget = mount();
	// The one-time radio is checked in the markup, so the stale value is cleared.
	assert_eq!(hidden_input().value(), "");
}

#[wasm_bindgen_test]
fn subscribing_copies_the_selected_plan_and_price() {
	let _widget = mount();

	radio("subscribe").set_checked(true);
	change(radio("subscribe").as_ref());

	assert_eq!(hidden_input().value(), "841");
	assert_eq!(price_text(), "$17.10");
}

#[wasm_bindgen_test]
fn changing_the_plan_while_subscribed_follows_the_dropdown() {
	let _widget = mount();

	radio("subscribe").set_checked(true);
	change(radio("subscribe").as_ref());
	select().set_value("842");
	change(select().as_ref());

	assert_eq!(hidden_input().value(), "842");
	assert_eq!(price_text(), "$15.20");
}

#[wasm_bindgen_test]
fn one_time_always_clears_the_hidden_input() {
	let _widget = mount();

	radio("subscribe").set_checked(true);
	change(radio("subscribe").as_ref());
	assert_eq!(hidden_input().value(), "841");

	radio("onetime").set_checked(true);
	change(radio("onetime").as_ref());
	assert_eq!(hidden_input().value(), "");
}

#[wasm_bindgen_test]
fn missing_controls_no_op() {
	common::init_tracing();
	let root = common::fixture("<selling-plan><p>bare</p></selling-plan>", "selling-plan");
	let widget = SellingPlanWidget::mount(root);
	// Nothing to synchronize and nothing to panic over.
	widget.synchronize();
}
