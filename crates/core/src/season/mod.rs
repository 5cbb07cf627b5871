//! Trading seasons: tagging, activation and closing.

pub mod service;
pub mod types;


pub use service::SeasonService;
pub use types::{Season, SeasonClosing, SeasonRequest, SeasonStatus};
