pub mod bookmark;
pub mod error;
pub mod repositories;
pub mod tag;
