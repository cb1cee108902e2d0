pub mod wistia;

pub use wistia::{WistiaParser, WistiaProvider};
