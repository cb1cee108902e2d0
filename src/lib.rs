pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod utils;

pub use core::{Metadata, MetadataResolver, ParseError, Provider, ProviderRegistry, VideoReference};
pub use extractors::{WistiaParser, WistiaProvider};
