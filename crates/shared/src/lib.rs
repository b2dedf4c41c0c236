pub mod domain;
pub mod error;
pub mod lists;
pub mod protocol;
