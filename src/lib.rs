#![doc(html_root_url = "https://docs.rs/storefront-widgets/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod cart;
pub mod cart_section;
pub mod config;
pub mod dispatch;
mod dom;
pub mod flickity;
pub mod image_slider;
pub mod promo_code;
pub mod selling_plan;
pub mod subscription_item;
pub mod widget;

pub use widget::{boot, Widget, Widgets};
