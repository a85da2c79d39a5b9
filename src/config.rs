use crate::dom;
use web_sys::Element;

/// User-facing strings for [`PromoCodeWidget`](`crate::promo_code::PromoCodeWidget`),
/// passed in at construction instead of being pulled from a page-global.
///
/// Each field falls back to the English literal the storefront shipped with, so a theme
/// only overrides what it translates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PromoCodeStrings {
	/// Validation message for an empty or whitespace-only code.
	pub empty: String,
	/// Validation message for a code that is already in the applied set.
	pub already_applied: String,
	/// Message for a code the server reports as not applicable to this cart.
	pub not_applicable: String,
	/// Generic message for transport or server failures.
	pub error: String,
	/// Apply button label while an update request is in flight.
	pub loading: String,
	/// Apply button label at rest.
	pub button: String,
}
impl Default for PromoCodeStrings {
	fn default() -> Self {
		Self {
			empty: "Please enter a promo code".to_string(),
			already_applied: "Promo code already applied".to_string(),
			not_applicable: "This promo code is not applicable".to_string(),
			error: "An error occurred while applying the promo code".to_string(),
			loading: "Applying...".to_string(),
			button: "Apply".to_string(),
		}
	}
}
impl PromoCodeStrings {
	/// Reads overrides from `data-string-empty`, `data-string-already-applied`,
	/// `data-string-not-applicable`, `data-string-error`, `data-string-loading` and
	/// `data-string-button` on `element`, defaulting field-wise.
	#[must_use]
	pub fn from_element(element: &Element) -> Self {
		let defaults = Self::default();
		Self {
			empty: dom::data_attr(element, "string-empty").unwrap_or(defaults.empty),
			already_applied: dom::data_attr(element, "string-already-applied").unwrap_or(defaults.already_applied),
			not_applicable: dom::data_attr(element, "string-not-applicable").unwrap_or(defaults.not_applicable),
			error: dom::data_attr(element, "string-error").unwrap_or(defaults.error),
			loading: dom::data_attr(element, "string-loading").unwrap_or(defaults.loading),
			button: dom::data_attr(element, "string-button").unwrap_or(defaults.button),
		}
	}
}
