#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod claims;
pub mod credential;
pub mod flow;
pub mod store;
pub mod token;
pub mod types;
pub mod validation;

pub mod prelude;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
