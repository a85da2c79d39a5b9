use crate::{
	cart::{CartTransport, HttpCartTransport},
	cart_section::CartSectionWidget,
	config::PromoCodeStrings,
	dispatch::Dispatcher,
	dom,
	image_slider::ImageSliderWidget,
	promo_code::PromoCodeWidget,
	selling_plan::SellingPlanWidget,
	subscription_item::SubscriptionItemWidget,
};
use std::rc::Rc;
use tracing::info;
use web_sys::Document;

/// The capability every widget exposes, replacing the custom-element inheritance of the
/// theme era with plain composable values.
///
/// Mounting is each widget's constructor and unmounting is `Drop` (every DOM listener
/// detaches with its owning handle); what remains is identification and the one
/// lifecycle event that cannot be RAII: re-binding after someone else replaced the
/// widget's subtree.
pub trait Widget {
	/// The tag name the widget instantiates from.
	fn name(&self) -> &'static str;

	/// Drops and re-resolves the widget's internal element references (and the
	/// listeners attached to them) against the current subtree.
	///
	/// Widgets that consume [`Channel::CartRequestEnded`](`crate::dispatch::Channel`)
	/// call this themselves when the ajax-cart library re-renders; it is public for
	/// hosts that replace markup through other means.
	fn rebind(&self);
}

/// All widgets instantiated by [`boot`], alive exactly as long as this value.
pub struct Widgets {
	widgets: Vec<Box<dyn Widget>>,
	dispatcher: Dispatcher,
}
impl Widgets {
	#[must_use]
	pub fn len(&self) -> usize {
		self.widgets.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.widgets.is_empty()
	}

	/// The dispatcher shared by every widget, for hosts that publish or subscribe
	/// themselves.
	#[must_use]
	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	pub fn iter(&self) -> impl Iterator<Item = &dyn Widget> + '_ {
		self.widgets.iter().map(|widget| &**widget)
	}
}
impl core::fmt::Debug for Widgets {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_list().entries(self.widgets.iter().map(|widget| widget.name())).finish()
	}
}

/// Declaratively instantiates every widget in `document`, scanning for the five tag
/// names and wiring each instance to a shared [`Dispatcher`] and [`HttpCartTransport`].
///
/// Hold on to the returned [`Widgets`] for the lifetime of the page (or of the markup,
/// if the host tears regions down): dropping it detaches every listener.
#[must_use]
pub fn boot(document: &Document) -> Widgets {
	#[cfg(feature = "panic-hook")]
	console_error_panic_hook::set_once();

	let dispatcher = Dispatcher::new(document);
	let transport: Rc<dyn CartTransport> = Rc::new(HttpCartTransport::new());

	let mut widgets: Vec<Box<dyn Widget>> = Vec::new();
	for element in dom::query_all_document(document, PromoCodeWidget::TAG) {
		let strings = PromoCodeStrings::from_element(&element);
		widgets.push(Box::new(PromoCodeWidget::mount(element, &dispatcher, transport.clone(), strings)));
	}
	for element in dom::query_all_document(document, CartSectionWidget::TAG) {
		widgets.push(Box::new(CartSectionWidget::mount(element, &dispatcher, transport.clone())));
	}
	for element in dom::query_all_document(document, SubscriptionItemWidget::TAG) {
		widgets.push(Box::new(SubscriptionItemWidget::mount(element, &dispatcher, transport.clone())));
	}
	for element in dom::query_all_document(document, SellingPlanWidget::TAG) {
		widgets.push(Box::new(SellingPlanWidget::mount(element)));
	}
	for element in dom::query_all_document(document, ImageSliderWidget::TAG) {
		if let Some(widget) = ImageSliderWidget::mount(element) {
			widgets.push(Box::new(widget));
		}
	}

	info!("Mounted {} widget(s).", widgets.len());
	Widgets { widgets, dispatcher }
}
