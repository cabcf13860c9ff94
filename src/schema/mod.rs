//! Field schema and the canonical form-data object.

pub mod fields;
pub mod form;
pub mod value;
pub mod vocab;

pub use fields::{FieldDefault, FieldSpec, FIELDS};
pub use form::{FieldError, FormData, OtherInputs};
pub use value::{FieldShape, FieldValue};
