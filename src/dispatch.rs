use crate::dom::Listener;
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, error, trace};
use wasm_bindgen::UnwrapThrowExt;
use web_sys::{CustomEvent, CustomEventInit, Document};

/// A cross-widget notification.
///
/// This is the typed replacement for the ad hoc `CustomEvent` names the widgets used to
/// scatter through the DOM tree: widgets publish and subscribe here, and the
/// [`Dispatcher`] keeps the DOM-level wire contract alive at the edges (see
/// [`Channel::dom_event_name`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
	/// The applied promo code set changed and dependent markup should refresh.
	PromoCodeUpdated {
		/// The full applied set, in application order.
		discount_codes: Vec<String>,
		/// The section owning the markup that triggered the change.
		section_id: String,
	},
	/// Server-side cart state changed; `cart_data` is forwarded verbatim.
	CartUpdated { source: String, cart_data: serde_json::Value },
	/// A selling plan change request for a cart line was sent.
	SubscriptionChangeStarted { line: String },
	/// The matching completion signal; fires exactly once per started change.
	SubscriptionChangeEnded { line: String },
	/// The ajax-cart library finished one of its own requests.
	CartRequestEnded,
	/// The ajax-cart library finished initializing.
	AjaxCartReady,
}
impl Notification {
	#[must_use]
	pub fn channel(&self) -> Channel {
		match self {
			Notification::PromoCodeUpdated { .. } => Channel::PromoCodeUpdated,
			Notification::CartUpdated { .. } => Channel::CartUpdated,
			Notification::SubscriptionChangeStarted { .. } => Channel::SubscriptionChangeStarted,
			Notification::SubscriptionChangeEnded { .. } => Channel::SubscriptionChangeEnded,
			Notification::CartRequestEnded => Channel::CartRequestEnded,
			Notification::AjaxCartReady => Channel::AjaxCartReady,
		}
	}

	/// The `detail` payload mirrored onto the DOM event, `None` for inbound-only channels.
	fn detail(&self) -> Option<serde_json::Value> {
		match self {
			Notification::PromoCodeUpdated {
				discount_codes,
				section_id,
			} => Some(serde_json::json!({ "discountCodes": discount_codes, "sectionId": section_id })),
			Notification::CartUpdated { source, cart_data } => Some(serde_json::json!({ "source": source, "cartData": cart_data })),
			Notification::SubscriptionChangeStarted { line } | Notification::SubscriptionChangeEnded { line } => Some(serde_json::json!({ "line": line })),
			Notification::CartRequestEnded | Notification::AjaxCartReady => None,
		}
	}
}

/// The closed set of notification channels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Channel {
	PromoCodeUpdated,
	CartUpdated,
	SubscriptionChangeStarted,
	SubscriptionChangeEnded,
	CartRequestEnded,
	AjaxCartReady,
}
impl Channel {
	/// The DOM event name carrying this channel.
	///
	/// These names are the wire contract with the rest of the theme and with the
	/// externally-owned ajax-cart library; renaming one breaks listeners this crate
	/// never sees.
	#[must_use]
	pub fn dom_event_name(self) -> &'static str {
		match self {
			Channel::PromoCodeUpdated => "cart-promo-code:updated",
			Channel::CartUpdated => "cart-update",
			Channel::SubscriptionChangeStarted => "cart-subscription-item-change:start",
			Channel::SubscriptionChangeEnded => "cart-subscription-item-change:end",
			Channel::CartRequestEnded => "liquid-ajax-cart:request-end",
			Channel::AjaxCartReady => "liquid-ajax-cart:init",
		}
	}

	/// Inbound channels are owned by the ajax-cart library: bridged from the DOM into the
	/// dispatcher, never mirrored back out (that would echo the library's own events).
	fn inbound(self) -> bool {
		matches!(self, Channel::CartRequestEnded | Channel::AjaxCartReady)
	}

	fn bridged_notification(self) -> Option<Notification> {
		match self {
			Channel::CartRequestEnded => Some(Notification::CartRequestEnded),
			Channel::AjaxCartReady => Some(Notification::AjaxCartReady),
			_ => None,
		}
	}
}

type Handler = Rc<dyn Fn(&Notification)>;

struct DispatcherInner {
	document: Document,
	handlers: RefCell<HashMap<Channel, Vec<(usize, Handler)>>>,
	next_handle: Cell<usize>,
	bridges: RefCell<Vec<Listener>>,
}

/// Routes [`Notification`]s between widgets and keeps the DOM wire contract alive.
///
/// Publishing delivers to local subscribers in registration order, then dispatches the
/// matching [`CustomEvent`] on the document for outbound channels. The two
/// `liquid-ajax-cart:*` signals travel the other way: document-level listeners translate
/// them into notifications.
#[derive(Clone)]
pub struct Dispatcher {
	inner: Rc<DispatcherInner>,
}
impl Dispatcher {
	#[must_use]
	pub fn new(document: &Document) -> Self {
		let inner = Rc::new(DispatcherInner {
			document: document.clone(),
			handlers: RefCell::new(HashMap::new()),
			next_handle: Cell::new(0),
			bridges: RefCell::new(Vec::new()),
		});

		for channel in [Channel::CartRequestEnded, Channel::AjaxCartReady].iter().copied() {
			let weak = Rc::downgrade(&inner);
			let listener = Listener::attach(document.as_ref(), channel.dom_event_name(), move |_| {
				if let (Some(inner), Some(notification)) = (weak.upgrade(), channel.bridged_notification()) {
					trace!("Bridging `{}` into the dispatcher.", channel.dom_event_name());
					Dispatcher { inner }.publish(&notification);
				}
			});
			inner.bridges.borrow_mut().push(listener);
		}

		Self { inner }
	}

	/// Delivers `notification` to every current subscriber of its channel, then mirrors
	/// outbound channels to the DOM.
	///
	/// Handlers registered or dropped *while* a publish is running take effect from the
	/// next publish on.
	pub fn publish(&self, notification: &Notification) {
		let channel = notification.channel();
		debug!("Publishing on {:?}.", channel);

		let handlers: Vec<Handler> = self
			.inner
			.handlers
			.borrow()
			.get(&channel)
			.map(|handlers| handlers.iter().map(|(_, handler)| handler.clone()).collect())
			.unwrap_or_default();
		for handler in handlers {
			handler(notification);
		}

		if !channel.inbound() {
			self.mirror(notification, channel);
		}
	}

	fn mirror(&self, notification: &Notification, channel: Channel) {
		let init = CustomEventInit::new();
		init.set_bubbles(true);
		if let Some(detail) = notification.detail() {
			let json = serde_json::to_string(&detail).expect_throw("storefront-widgets: Unrepresentable notification detail.");
			match js_sys::JSON::parse(&json) {
				Ok(detail) => init.set_detail(&detail),
				Err(error) => return error!("Failed to build `{}` detail: {:?}", channel.dom_event_name(), error),
			}
		}
		let event = CustomEvent::new_with_event_init_dict(channel.dom_event_name(), &init)
			.expect_throw("storefront-widgets: Invalid notification event name.");
		if self.inner.document.dispatch_event(&event).is_err() {
			error!("Failed to dispatch `{}`.", channel.dom_event_name());
		}
	}

	/// Registers `handler` for `channel`. The registration lives exactly as long as the
	/// returned [`Subscription`].
	pub fn subscribe(&self, channel: Channel, handler: impl Fn(&Notification) + 'static) -> Subscription {
		let handle = self.inner.next_handle.get();
		self.inner.next_handle.set(handle + 1);
		self.inner
			.handlers
			.borrow_mut()
			.entry(channel)
			.or_default()
			.push((handle, Rc::new(handler)));
		trace!("Subscribed #{} to {:?}.", handle, channel);
		Subscription {
			dispatcher: Rc::downgrade(&self.inner),
			channel,
			handle,
		}
	}
}
impl core::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("channels", &self.inner.handlers.borrow().keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Handle to one [`Dispatcher::subscribe`] registration; dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
	dispatcher: Weak<DispatcherInner>,
	channel: Channel,
	handle: usize,
}
impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(inner) = self.dispatcher.upgrade() {
			if let Some(handlers) = inner.handlers.borrow_mut().get_mut(&self.channel) {
				handlers.retain(|(handle, _)| *handle != self.handle);
			}
			trace!("Unsubscribed #{} from {:?}.", self.handle, self.channel);
		}
	}
}
