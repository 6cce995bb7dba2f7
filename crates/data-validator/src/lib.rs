//! Landmark Validation
//!
//! Checks raw eye landmark sets at the boundary with the landmark
//! collaborator before they reach the decision core.

mod error;
mod landmark;
mod validator;

pub use error::ValidationError;
pub use landmark::{EyeSide, Point2D, EYE_LANDMARK_COUNT};
pub use validator::{ValidationConfig, Validator};
