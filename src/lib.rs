//! Timetable feeds from CELCAT, ADE Campus and Hyperplanning, normalized
//! into one event model.

pub mod cache;
pub mod config;
pub mod conversion;
pub mod description;
pub mod error;
pub mod event;
pub mod fetch;
pub mod filter;
pub mod ics;
pub mod logging;
pub mod merge;
pub mod rules;
pub mod service;
pub mod utils;

pub use error::{CampuscalError, Result};
pub use event::{DomainEvent, EventType};
