#![cfg(target_arch = "wasm32")]

mod common;

use common::{settle, FakeTransport};
use core::cell::RefCell;
use std::rc::Rc;
use storefront_widgets::{
	cart::{CartError, LineChange},
	dispatch::{Channel, Dispatcher, Notification, Subscription},
	subscription_item::{SubscriptionItemWidget, SOURCE},
};
use wasm_bindgen::{JsCast, UnwrapThrowExt};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Event, HtmlSelectElement};

wasm_bindgen_test_configure!(run_in_browser);

const MARKUP: &str = r#"
	<cart-subscription-item>
		<select class="js-selling-plan" data-key="line-item-key-1" data-quantity="2" data-line="3">
			<option value="" selected>One-time purchase</option>
			<option value="841">Every month</option>
		</select>
	</cart-subscription-item>
"#;

fn mount(transport: Rc<FakeTransport>) -> (SubscriptionItemWidget, Dispatcher) {
	common::init_tracing();
	let root = common::fixture(MARKUP, "cart-subscription-item");
	let dispatcher = Dispatcher::new(&common::document());
	let widget = SubscriptionItemWidget::mount(root, &dispatcher, transport);
	(widget, dispatcher)
}

fn select() -> HtmlSelectElement {
	common::query(".js-selling-plan").dyn_into().unwrap_throw()
}

/// Records every notification on the three channels this widget publishes, in order.
fn collect(dispatcher: &Dispatcher) -> (Rc<RefCell<Vec<Notification>>>, Vec<Subscription>) {
	let received = Rc::new(RefCell::new(Vec::new()));
	let subscriptions = [Channel::SubscriptionChangeStarted, Channel::CartUpdated, Channel::SubscriptionChangeEnded]
		.iter()
		.map(|channel| {
			dispatcher.subscribe(*channel, {
				let received = received.clone();
				move |notification| received.borrow_mut().push(notification.clone())
			})
		})
		.collect();
	(received, subscriptions)
}

#[wasm_bindgen_test]
async fn a_plan_change_posts_and_brackets_with_notifications() {
	let transport = Rc::new(FakeTransport::default());
	transport.change_results.borrow_mut().push_back(Ok(serde_json::json!({ "item_count": 2 })));
	let (_widget, dispatcher) = mount(transport.clone());
	let (received, _subscriptions) = collect(&dispatcher);

	select().set_value("841");
	select().dispatch_event(&Event::new("change").unwrap_throw()).unwrap_throw();
	settle().await;

	assert_eq!(
		*transport.change_calls.borrow(),
		vec![LineChange {
			id: "line-item-key-1".to_string(),
			quantity: 2,
			selling_plan: Some("841".to_string()),
		}]
	);
	assert_eq!(
		received.borrow().as_slice(),
		&[
			Notification::SubscriptionChangeStarted { line: "3".to_string() },
			Notification::CartUpdated {
				source: SOURCE.to_string(),
				cart_data: serde_json::json!({ "item_count": 2 }),
			},
			Notification::SubscriptionChangeEnded { line: "3".to_string() },
		]
	);
}

#[wasm_bindgen_test]
async fn the_one_time_option_detaches_the_selling_plan() {
	let transport = Rc::new(FakeTransport::default());
	let (widget, _dispatcher) = mount(transport.clone());

	select().set_value("");
	widget.submit_change().await;

	assert_eq!(
		*transport.change_calls.borrow(),
		vec![LineChange {
			id: "line-item-key-1".to_string(),
			quantity: 2,
			selling_plan: None,
		}]
	);
}

#[wasm_bindgen_test]
async fn a_failed_change_still_ends_exactly_once() {
	let transport = Rc::new(FakeTransport::default());
	transport.change_results.borrow_mut().push_back(Err(CartError::Status(500)));
	let (widget, dispatcher) = mount(transport.clone());
	let (received, _subscriptions) = collect(&dispatcher);

	widget.submit_change().await;

	assert_eq!(
		received.borrow().as_slice(),
		&[
			Notification::SubscriptionChangeStarted { line: "3".to_string() },
			Notification::SubscriptionChangeEnded { line: "3".to_string() },
		]
	);
	assert!(!widget.is_loading());
}

#[wasm_bindgen_test]
async fn selling_plan_changes_serialize_none_as_null() {
	let change = LineChange {
		id: "k".to_string(),
		quantity: 1,
		selling_plan: None,
	};
	assert_eq!(
		serde_json::to_value(&change).unwrap_throw(),
		serde_json::json!({ "id": "k", "quantity": 1, "selling_plan": null })
	);
}
