pub mod media_type;
pub mod range;
pub mod validation;
