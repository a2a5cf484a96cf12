#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate lazy_static;

pub mod capture;
pub mod classifier;
pub mod client;
pub mod credentials;
pub mod errors;
pub mod link_header;
pub mod options;
pub mod poller;
pub mod queue;
pub mod types;
pub mod utils;

pub use client::{SavePageNow, SavePageNowOptions, SavePageNowOptionsBuilder};
pub use errors::{ErrorKind, Result, SavePageNowError};
