pub mod convert;
pub mod fetch;
