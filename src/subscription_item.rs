use crate::{
	cart::{CartTransport, LineChange},
	dispatch::{Dispatcher, Notification},
	dom::{self, Listener},
	widget::Widget,
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{error, warn};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlSelectElement};

const SELECT_SELECTOR: &str = ".js-selling-plan";

/// `source` value carried by the [`Notification::CartUpdated`] this widget publishes.
pub const SOURCE: &str = "cart-subscription-item";

struct State {
	root: Element,
	select: Option<HtmlSelectElement>,
	listeners: Vec<Listener>,
	loading: bool,
	dispatcher: Dispatcher,
	transport: Rc<dyn CartTransport>,
}

/// Selling plan switcher for one cart line, bound to a `<cart-subscription-item>`
/// subtree.
///
/// A dropdown change posts the new plan to the cart and republishes the server's cart
/// state on the generic cart-update channel. Listeners that need to bracket the change
/// (spinners, row locks) get [`Notification::SubscriptionChangeStarted`] first and
/// [`Notification::SubscriptionChangeEnded`] exactly once afterwards, success or not.
pub struct SubscriptionItemWidget {
	state: Rc<RefCell<State>>,
}
impl SubscriptionItemWidget {
	pub const TAG: &'static str = "cart-subscription-item";

	/// Attaches to `root`. Without a `.js-selling-plan` select the widget mounts inert.
	#[must_use]
	pub fn mount(root: Element, dispatcher: &Dispatcher, transport: Rc<dyn CartTransport>) -> Self {
		let state = Rc::new(RefCell::new(State {
			select: dom::query(&root, SELECT_SELECTOR).and_then(|element| element.dyn_into().ok()),
			root,
			listeners: Vec::new(),
			loading: false,
			dispatcher: dispatcher.clone(),
			transport,
		}));
		attach_listeners(&state);
		Self { state }
	}

	/// Submits the select's current value as this line's selling plan; normally driven
	/// by the `change` listener, public for direct use.
	pub async fn submit_change(&self) {
		submit_change(&self.state).await;
	}

	#[must_use]
	pub fn is_loading(&self) -> bool {
		self.state.borrow().loading
	}
}
impl Widget for SubscriptionItemWidget {
	fn name(&self) -> &'static str {
		Self::TAG
	}

	fn rebind(&self) {
		{
			let mut s = self.state.borrow_mut();
			s.listeners.clear();
			s.select = dom::query(&s.root, SELECT_SELECTOR).and_then(|element| element.dyn_into().ok());
		}
		attach_listeners(&self.state);
	}
}
impl core::fmt::Debug for SubscriptionItemWidget {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("SubscriptionItemWidget")
			.field("bound", &state.select.is_some())
			.field("loading", &state.loading)
			.finish()
	}
}

fn attach_listeners(state: &Rc<RefCell<State>>) {
	let listener = state.borrow().select.as_ref().map(|select| {
		let weak = Rc::downgrade(state);
		Listener::attach(select.as_ref(), "change", move |_| {
			if let Some(state) = weak.upgrade() {
				wasm_bindgen_futures::spawn_local(async move { submit_change(&state).await });
			}
		})
	});
	state.borrow_mut().listeners = listener.into_iter().collect();
}

async fn submit_change(state: &Rc<RefCell<State>>) {
	let (dispatcher, transport, change, line) = {
		let mut s = state.borrow_mut();
		let select = match &s.select {
			Some(select) => select.clone(),
			None => return,
		};
		if s.loading {
			warn!("Selling plan change already in flight; ignoring this trigger.");
			return;
		}

		let line = dom::data_attr(select.as_ref(), "line").unwrap_or_default();
		let id = match dom::data_attr(select.as_ref(), "key") {
			Some(id) => id,
			None => return error!("Selling plan select carries no `data-key`; cannot address the cart line."),
		};
		let quantity = match dom::data_attr(select.as_ref(), "quantity").map(|quantity| quantity.parse::<u32>()) {
			Some(Ok(quantity)) => quantity,
			raw => return error!("Selling plan select carries no usable `data-quantity` ({:?}).", raw),
		};
		let value = select.value();
		let selling_plan = if value.is_empty() { None } else { Some(value) };

		s.loading = true;
		(
			s.dispatcher.clone(),
			s.transport.clone(),
			LineChange { id, quantity, selling_plan },
			line,
		)
	};

	dispatcher.publish(&Notification::SubscriptionChangeStarted { line: line.clone() });

	let result = transport.change_line(change).await;
	state.borrow_mut().loading = false;

	match result {
		Ok(cart_data) => dispatcher.publish(&Notification::CartUpdated {
			source: SOURCE.to_string(),
			cart_data,
		}),
		Err(error) => error!("Selling plan change failed: {}", error),
	}

	// Completion is part of the contract: fires on every path past the started signal.
	dispatcher.publish(&Notification::SubscriptionChangeEnded { line });
}
