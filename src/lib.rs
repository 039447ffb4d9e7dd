pub mod api;
pub mod comment;
pub mod config;
pub mod display;
pub mod error;
pub mod feed;
pub mod form;
pub mod model;
pub mod optimistic;
pub mod session;
pub mod viewer;


pub use error::{Error, Result};
