pub mod actions;
pub mod card;
pub mod config;
pub mod dashboard;
pub mod epoch;
pub mod error;
pub mod filter;
pub mod header;
pub mod io;
pub mod paths;
pub mod ports;
pub mod scheduler;
pub mod session;
pub mod types;
pub mod view;

pub use error::{PortalError, RenderFailure, Result, ServiceFailure, ServiceResult};
