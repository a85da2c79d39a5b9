use core::fmt::{self, Display, Formatter};
use futures::future::{select, Either, LocalBoxFuture};
use gloo_net::http::{Request, Response};
use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wasm_bindgen::UnwrapThrowExt;
use web_sys::{AbortController, FormData};

/// Cart discount endpoint; takes the *full* comma-joined code set as the form field
/// `discount` and answers with the per-code applicability below.
pub const CART_UPDATE_URL: &str = "/cart/update.js";
/// Cart line change endpoint; takes a JSON [`LineChange`] and answers with the whole
/// cart state, which this crate treats as opaque.
pub const CART_CHANGE_URL: &str = "/cart/change.js";

const DEFAULT_TIMEOUT_MS: u32 = 10_000;

/// One entry of the server's `discount_codes` response list.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct DiscountCode {
	pub code: String,
	/// Whether the code can actually discount the current cart. The server keeps
	/// inapplicable codes around, so submission success alone proves nothing.
	pub applicable: bool,
}

/// The slice of the `/cart/update.js` response this crate consumes.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CartDiscounts {
	#[serde(default)]
	pub discount_codes: Vec<DiscountCode>,
}

/// JSON body for [`CART_CHANGE_URL`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LineChange {
	/// Line item key.
	pub id: String,
	pub quantity: u32,
	/// `None` serializes as `null`, which detaches the line from its selling plan.
	pub selling_plan: Option<String>,
}

#[derive(Debug)]
pub enum CartError {
	/// The server answered with a non-success status.
	Status(u16),
	/// Transport or decoding failure.
	Net(gloo_net::Error),
	/// The request outlived the transport's timeout and was aborted.
	TimedOut,
}
impl Display for CartError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			CartError::Status(status) => write!(f, "cart request failed with status {}", status),
			CartError::Net(error) => write!(f, "cart request failed: {}", error),
			CartError::TimedOut => write!(f, "cart request timed out"),
		}
	}
}
impl std::error::Error for CartError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			CartError::Net(error) => Some(error),
			CartError::Status(_) | CartError::TimedOut => None,
		}
	}
}
impl From<gloo_net::Error> for CartError {
	fn from(error: gloo_net::Error) -> Self {
		CartError::Net(error)
	}
}

/// The network seam of every widget that talks to the cart.
///
/// Widgets only ever hold `Rc<dyn CartTransport>`, so tests substitute recording fakes
/// the same way the real pages use [`HttpCartTransport`].
pub trait CartTransport {
	/// `POST`s the comma-joined code set (empty string to clear all codes).
	fn update_discounts(&self, discounts: String) -> LocalBoxFuture<'static, Result<CartDiscounts, CartError>>;
	/// `POST`s a line item selling plan change; the response cart state is forwarded verbatim.
	fn change_line(&self, change: LineChange) -> LocalBoxFuture<'static, Result<serde_json::Value, CartError>>;
	/// `GET`s `url` and returns the raw response HTML.
	fn fetch_section(&self, url: String) -> LocalBoxFuture<'static, Result<String, CartError>>;
}

/// [`CartTransport`] over `fetch`, with every request raced against a timeout.
///
/// A request that exceeds the timeout is aborted and reported as
/// [`CartError::TimedOut`], so a stalled server can never strand a widget in its
/// loading state.
#[derive(Clone, Copy, Debug)]
pub struct HttpCartTransport {
	timeout_ms: u32,
}
impl Default for HttpCartTransport {
	fn default() -> Self {
		Self {
			timeout_ms: DEFAULT_TIMEOUT_MS,
		}
	}
}
impl HttpCartTransport {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_timeout_ms(timeout_ms: u32) -> Self {
		Self { timeout_ms }
	}

	async fn send(request: Request, controller: AbortController, timeout_ms: u32) -> Result<Response, CartError> {
		let fetch = request.send();
		let timeout = TimeoutFuture::new(timeout_ms);
		futures::pin_mut!(fetch);
		futures::pin_mut!(timeout);
		match select(fetch, timeout).await {
			Either::Left((result, _)) => {
				let response = result?;
				if response.ok() {
					Ok(response)
				} else {
					Err(CartError::Status(response.status()))
				}
			}
			Either::Right(((), _)) => {
				controller.abort();
				Err(CartError::TimedOut)
			}
		}
	}
}
impl CartTransport for HttpCartTransport {
	fn update_discounts(&self, discounts: String) -> LocalBoxFuture<'static, Result<CartDiscounts, CartError>> {
		let timeout_ms = self.timeout_ms;
		Box::pin(async move {
			debug!("POST {} discount={:?}", CART_UPDATE_URL, discounts);
			let body = FormData::new().unwrap_throw();
			body.append_with_str("discount", &discounts).unwrap_throw();
			let controller = AbortController::new().unwrap_throw();
			let request = Request::post(CART_UPDATE_URL).abort_signal(Some(&controller.signal())).body(body)?;
			let response = Self::send(request, controller, timeout_ms).await?;
			Ok(response.json::<CartDiscounts>().await?)
		})
	}

	fn change_line(&self, change: LineChange) -> LocalBoxFuture<'static, Result<serde_json::Value, CartError>> {
		let timeout_ms = self.timeout_ms;
		Box::pin(async move {
			debug!("POST {} {:?}", CART_CHANGE_URL, change);
			let controller = AbortController::new().unwrap_throw();
			let request = Request::post(CART_CHANGE_URL).abort_signal(Some(&controller.signal())).json(&change)?;
			let response = Self::send(request, controller, timeout_ms).await?;
			Ok(response.json::<serde_json::Value>().await?)
		})
	}

	fn fetch_section(&self, url: String) -> LocalBoxFuture<'static, Result<String, CartError>> {
		let timeout_ms = self.timeout_ms;
		Box::pin(async move {
			debug!("GET {}", url);
			let controller = AbortController::new().unwrap_throw();
			let request = Request::get(&url).abort_signal(Some(&controller.signal())).build()?;
			let response = Self::send(request, controller, timeout_ms).await?;
			Ok(response.text().await?)
		})
	}
}

/// `href` with its `section_id` query parameter set to `section_id`, preserving
/// everything else about the URL.
#[must_use]
pub fn section_url(href: &str, section_id: &str) -> String {
	let url = web_sys::Url::new(href).expect_throw("storefront-widgets: Unparseable page URL.");
	url.search_params().set("section_id", section_id);
	url.href()
}
