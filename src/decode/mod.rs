//! Response decoder module
//!
//! Decodes registry list responses: a JSON array whose elements are
//! deserialized one by one so a bad element is reported by index.

mod json;

pub use json::{decode_array, decode_values};
