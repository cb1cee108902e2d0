pub mod cache;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod provider;
pub mod reference;
pub mod resolver;

pub use cache::{Clock, InMemoryCache, ManualClock, MetadataCache, SystemClock};
pub use error::ParseError;
pub use fetcher::{HttpFetcher, ReqwestFetcher};
pub use metadata::Metadata;
pub use provider::{Provider, ProviderRegistry};
pub use reference::{Dimensions, EmbedType, VideoReference};
pub use resolver::MetadataResolver;
