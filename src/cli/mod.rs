use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::{Provider, ProviderRegistry, VideoReference};
use crate::extractors::WistiaProvider;

#[derive(Parser)]
#[command(name = "wistia-probe")]
#[command(about = "Recognize Wistia links and embed codes and look up their metadata")]
#[command(version)]
pub struct Cli {
    /// Link, iframe embed code or async embed code
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Also fetch oEmbed metadata (thumbnail, embed HTML)
    #[arg(short, long)]
    pub resolve: bool,

    /// Print the parsed reference as JSON
    #[arg(long)]
    pub json: bool,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let mut registry = ProviderRegistry::new();
        registry.register_provider(Box::new(WistiaProvider::new(&config)?));

        let (provider, reference) = registry.parse(&self.input)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reference)?);
        } else {
            print_reference(provider, &reference);
        }

        if self.resolve {
            println!("Resolving metadata...");
            match provider.thumbnail(&reference).await {
                Some(thumbnail) => println!("Thumbnail: {}", thumbnail),
                None => println!("Thumbnail: unavailable"),
            }
            match provider.embed_code(&reference).await {
                Some(html) => println!("Embed code: {}", html),
                None => println!("Embed code: unavailable"),
            }
        }

        Ok(())
    }
}

fn print_reference(provider: &dyn Provider, reference: &VideoReference) {
    println!("Provider: {}", provider.name());
    println!("Video ID: {}", reference.video_id());
    println!("Type: {}", provider.video_type(reference));
    println!("Domain: {}", reference.domain());
    println!(
        "Link: {}",
        provider.link(reference).as_deref().unwrap_or("none")
    );
    println!("Embed URL: {}", provider.embed_url(reference));

    let dimensions = reference.dimensions();
    if !dimensions.is_empty() {
        println!(
            "Size: {}x{}",
            reference.width(),
            reference.height()
        );
    }

    for (name, value) in reference.params() {
        println!("  {} = {}", name, value);
    }
}
