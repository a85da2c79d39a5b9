//! Bindings to the [***Flickity***](https://flickity.metafizzy.co/api.html) carousel,
//! which the theme loads as a page global. The carousel itself is a black box: this
//! crate only drives navigation and listens for position changes.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
	/// One carousel instance, attached to a gallery element at construction.
	pub type Flickity;

	/// Throws if the `Flickity` global is absent, so this is `catch` rather than
	/// trusting the theme to have loaded the library first.
	#[wasm_bindgen(constructor, catch)]
	pub fn new(element: &web_sys::Element, options: &JsValue) -> Result<Flickity, JsValue>;

	/// Selects the slide at `index`. `is_wrapped` allows wrap-around from the ends,
	/// `is_instant` skips the transition animation.
	#[wasm_bindgen(method)]
	pub fn select(this: &Flickity, index: u32, is_wrapped: bool, is_instant: bool);

	#[wasm_bindgen(method)]
	pub fn previous(this: &Flickity, is_wrapped: bool, is_instant: bool);

	#[wasm_bindgen(method)]
	pub fn next(this: &Flickity, is_wrapped: bool, is_instant: bool);

	/// Registers `listener` for a named carousel event; `change` listeners receive the
	/// new slide index.
	#[wasm_bindgen(method)]
	pub fn on(this: &Flickity, event_name: &str, listener: &js_sys::Function);

	#[wasm_bindgen(method, js_name = off)]
	pub fn off(this: &Flickity, event_name: &str, listener: &js_sys::Function);

	#[wasm_bindgen(method, getter, js_name = selectedIndex)]
	pub fn selected_index(this: &Flickity) -> u32;

	/// The slide list; its length bounds every index this crate hands to [`select`](`Flickity::select`).
	#[wasm_bindgen(method, getter)]
	pub fn slides(this: &Flickity) -> js_sys::Array;

	#[wasm_bindgen(method)]
	pub fn destroy(this: &Flickity);
}
