//! Record extractors: raw source content in, validated [`DrawRecord`] out.
//!
//! [`DrawRecord`]: crate::draw::DrawRecord

pub mod api;
pub mod markup;

pub use api::extract_api_record;
pub use markup::{extract_markup_record, BallReading, BallStrategy, BALL_STRATEGIES};
