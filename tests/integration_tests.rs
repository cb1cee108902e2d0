use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wistia_probe::config::Config;
use wistia_probe::core::{
    HttpFetcher, InMemoryCache, ManualClock, MetadataCache, MetadataResolver, ParseError,
    Provider, ProviderRegistry, VideoReference,
};
use wistia_probe::extractors::{WistiaParser, WistiaProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OEMBED_BODY: &str = r#"{
    "version": "1.0",
    "type": "video",
    "html": "<iframe src=\"https://fast.wistia.net/embed/iframe/b0767e8ebb\"></iframe>",
    "thumbnail_url": "https://embed-ssl.wistia.com/deliveries/b0767e8ebb.jpg",
    "title": "Demo"
}"#;

/// Fetcher that answers every request with the same canned result and
/// remembers what it was asked for.
struct CountingFetcher {
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    body: Option<String>,
}

impl CountingFetcher {
    fn returning(body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            body: Some(body.to_string()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            body: None,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpFetcher for CountingFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => anyhow::bail!("connection refused"),
        }
    }
}

fn resolver_with(fetcher: Arc<CountingFetcher>, cache: Arc<InMemoryCache>) -> MetadataResolver {
    MetadataResolver::new(fetcher, cache, "https://fast.wistia.net/oembed")
}

fn video(input: &str) -> VideoReference {
    WistiaParser::new().parse(input).expect("input should parse")
}

#[tokio::test]
async fn test_all_input_families() -> Result<()> {
    let parser = WistiaParser::new();

    let test_cases = vec![
        ("http://fast.wistia.net/embed/iframe/b0767e8ebb?videoFoam=true", "b0767e8ebb", "iframe", "fast.wistia.net"),
        ("http://fast.wistia.net/embed/playlists/fbe3880a4e", "fbe3880a4e", "playlists", "fast.wistia.net"),
        ("http://home.wistia.com/medias/e4a27b971d", "e4a27b971d", "iframe", "home.wistia.com"),
        (r#"<iframe src="//fast.wistia.net/embed/iframe/tku5yxdmqa"></iframe>"#, "tku5yxdmqa", "iframe", "fast.wistia.net"),
        (r#"<iframe src="//fast.wistia.net/embed/playlists/fbe3880a4e"></iframe>"#, "fbe3880a4e", "playlists", "fast.wistia.net"),
        (r#"<div class="wistia_embed wistia_async_tku5yxdmqa" style="height:360px;width:640px"></div>"#, "tku5yxdmqa", "iframe", "home.wistia.com"),
    ];

    for (input, id, kind, domain) in test_cases {
        let reference = parser.parse(input)?;
        assert_eq!(reference.video_id(), id, "{}", input);
        assert_eq!(reference.video_type(), kind, "{}", input);
        assert_eq!(reference.domain(), domain, "{}", input);
    }

    Ok(())
}

#[tokio::test]
async fn test_unrelated_host_is_not_recognized() -> Result<()> {
    let parser = WistiaParser::new();
    assert_eq!(
        parser.parse("https://example.com/video/123"),
        Err(ParseError::NoMatch)
    );
    Ok(())
}

#[tokio::test]
async fn test_query_params_round_trip() -> Result<()> {
    let reference = video("http://fast.wistia.net/embed/iframe/abc?a=1&amp;b=2");
    assert_eq!(reference.params().get("a").map(String::as_str), Some("1"));
    assert_eq!(reference.params().get("b").map(String::as_str), Some("2"));

    let embed_url = reference.embed_url();
    let query = embed_url.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let mut pairs: Vec<&str> = query.split('&').collect();
    pairs.sort();
    assert_eq!(pairs, vec!["a=1", "b=2"]);

    Ok(())
}

#[tokio::test]
async fn test_registry_routes_to_first_accepting_provider() -> Result<()> {
    let fetcher = CountingFetcher::returning(OEMBED_BODY);
    let resolver = resolver_with(fetcher, Arc::new(InMemoryCache::new()));

    let mut registry = ProviderRegistry::new();
    registry.register_provider(Box::new(WistiaProvider::with_resolver(
        WistiaParser::new(),
        resolver,
    )));
    assert_eq!(registry.providers.len(), 1);

    let (provider, reference) = registry.parse("https://wi.st/medias/abc")?;
    assert_eq!(provider.name(), "wistia");
    assert_eq!(reference.video_id(), "abc");
    assert_eq!(provider.link(&reference).as_deref(), Some("//wi.st/medias/abc"));
    assert_eq!(provider.video_type(&reference), "iframe");

    assert_eq!(
        registry.parse("https://vimeo.com/123456").err(),
        Some(ParseError::NoProvider)
    );
    // Passes the pre-filter but has no video in it.
    assert_eq!(
        registry.parse("https://home.wistia.com/").err(),
        Some(ParseError::NoMatch)
    );

    Ok(())
}

#[tokio::test]
async fn test_resolve_is_cached() -> Result<()> {
    let fetcher = CountingFetcher::returning(OEMBED_BODY);
    let resolver = resolver_with(fetcher.clone(), Arc::new(InMemoryCache::new()));
    let reference = video("http://fast.wistia.net/embed/iframe/b0767e8ebb");

    let first = resolver.resolve(&reference).await;
    let second = resolver.resolve(&reference).await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(first.title.as_deref(), Some("Demo"));
    assert_eq!(
        resolver.thumbnail(&reference).await.as_deref(),
        Some("https://embed-ssl.wistia.com/deliveries/b0767e8ebb.jpg")
    );
    assert!(resolver.embed_code(&reference).await.is_some());
    assert_eq!(fetcher.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_cache_key_and_lookup_url() -> Result<()> {
    let fetcher = CountingFetcher::returning(OEMBED_BODY);
    let cache = Arc::new(InMemoryCache::new());
    let resolver = resolver_with(fetcher.clone(), cache.clone());
    let reference = video("http://fast.wistia.net/embed/iframe/b0767e8ebb?videoFoam=true");

    assert_eq!(resolver.cache_key(&reference), "wistia_video_b0767e8ebb");

    resolver.resolve(&reference).await;
    assert!(cache.get("wistia_video_b0767e8ebb").await.is_some());

    let urls = fetcher.urls.lock().unwrap().clone();
    assert_eq!(
        urls,
        vec![
            "https://fast.wistia.net/oembed?url=https%3A%2F%2Ffast.wistia.net%2Fembed%2Fiframe%2Fb0767e8ebb%3FvideoFoam%3Dtrue"
                .to_string()
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_cache_ttl_boundary() -> Result<()> {
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(InMemoryCache::with_clock(clock.clone()));
    let fetcher = CountingFetcher::returning(OEMBED_BODY);
    let resolver = resolver_with(fetcher.clone(), cache);
    let reference = video("http://home.wistia.com/medias/e4a27b971d");

    assert_eq!(resolver.ttl(), Duration::from_secs(6 * 60 * 60));

    resolver.resolve(&reference).await;
    clock.advance(resolver.ttl() - Duration::from_secs(1));
    resolver.resolve(&reference).await;
    assert_eq!(fetcher.calls(), 1);

    clock.advance(Duration::from_secs(2));
    resolver.resolve(&reference).await;
    assert_eq!(fetcher.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_failed_lookup_is_cached_and_non_fatal() -> Result<()> {
    let fetcher = CountingFetcher::failing();
    let cache = Arc::new(InMemoryCache::new());
    let resolver = resolver_with(fetcher.clone(), cache.clone());
    let reference = video("http://home.wistia.com/medias/e4a27b971d");

    assert!(resolver.resolve(&reference).await.is_empty());
    assert_eq!(resolver.embed_code(&reference).await, None);
    assert_eq!(resolver.thumbnail(&reference).await, None);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(
        cache.get("wistia_video_e4a27b971d").await,
        Some(serde_json::Value::Null)
    );

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_yields_empty_metadata() -> Result<()> {
    let fetcher = CountingFetcher::returning("<html>502 Bad Gateway</html>");
    let resolver = resolver_with(fetcher.clone(), Arc::new(InMemoryCache::new()));
    let reference = video("http://fast.wistia.net/embed/iframe/abc");

    let metadata = resolver.resolve(&reference).await;
    assert!(metadata.is_empty());
    assert_eq!(resolver.thumbnail(&reference).await, None);
    assert_eq!(fetcher.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_different_ids_are_cached_separately() -> Result<()> {
    let fetcher = CountingFetcher::returning(OEMBED_BODY);
    let resolver = resolver_with(fetcher.clone(), Arc::new(InMemoryCache::new()));

    resolver.resolve(&video("http://home.wistia.com/medias/one")).await;
    resolver.resolve(&video("http://home.wistia.com/medias/two")).await;
    resolver.resolve(&video("http://home.wistia.com/medias/one")).await;

    assert_eq!(fetcher.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_provider_against_mock_oembed_server() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oembed"))
        .and(query_param("url", "https://fast.wistia.net/embed/iframe/b0767e8ebb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "video",
            "html": "<iframe src=\"https://fast.wistia.net/embed/iframe/b0767e8ebb\"></iframe>",
            "thumbnail_url": "https://embed-ssl.wistia.com/deliveries/b0767e8ebb.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        oembed_endpoint: format!("{}/oembed", server.uri()),
        ..Config::default()
    };
    let provider = WistiaProvider::new(&config)?;
    let reference = provider.parse("http://fast.wistia.net/embed/iframe/b0767e8ebb")?;

    assert_eq!(
        provider.image(&reference).await.as_deref(),
        Some("https://embed-ssl.wistia.com/deliveries/b0767e8ebb.jpg")
    );
    assert!(provider
        .embed_code(&reference)
        .await
        .is_some_and(|html| html.contains("b0767e8ebb")));

    Ok(())
}

#[tokio::test]
async fn test_provider_with_server_error() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oembed"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        oembed_endpoint: format!("{}/oembed", server.uri()),
        ..Config::default()
    };
    let provider = WistiaProvider::new(&config)?;
    let reference = provider.parse("http://home.wistia.com/medias/missing")?;

    assert_eq!(provider.thumbnail(&reference).await, None);
    assert_eq!(provider.embed_code(&reference).await, None);

    Ok(())
}
