pub mod conversions;
pub mod convert;
