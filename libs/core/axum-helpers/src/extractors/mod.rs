//! Extractors that reject with [`AppError`](crate::AppError) bodies.

mod json_body;

pub use json_body::JsonBody;
