//! Pipeline for WikiVox.
//!
//! Wires resolution, fetching, normalization and synthesis together from
//! one [`Settings`] value.

use crate::audio::{map_headings, AudioMetadata, AudioResult};
use crate::config::Settings;
use crate::error::{Result, WikiVoxError};
use crate::text::{NormalizeOptions, NormalizedArticle, TextNormalizer};
use crate::tts::{AudioSynthesizer, OpenAiSpeechClient, SpeechClient, SynthesisOptions};
use crate::wiki::{
    ArticleFetcher, ArticleIdentifier, ArticleResolver, FetchOptions, PageSource, RawArticle, ResolveOptions,
    SearchProvider, SearchResult, SectionSelection, WikiClient, WikiEndpoint,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything produced for one article before any audio is made.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub identifier: ArticleIdentifier,
    pub article: RawArticle,
    pub normalized: NormalizedArticle,
}

/// The main pipeline, holding one wiki client and one speech client.
pub struct Pipeline {
    settings: Settings,
    endpoint: WikiEndpoint,
    search: Arc<dyn SearchProvider>,
    resolver: ArticleResolver,
    fetcher: ArticleFetcher,
    normalizer: TextNormalizer,
    synthesizer: AudioSynthesizer,
}

impl Pipeline {
    /// Create a pipeline talking to the configured wiki and TTS server.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let wiki = Arc::new(WikiClient::from_settings(&settings)?);
        let speech: Arc<dyn SpeechClient> = Arc::new(OpenAiSpeechClient::from_settings(&settings)?);
        info!(
            "Using {} and TTS server {}",
            wiki.endpoint().api_url(),
            speech.server_url()
        );

        let search: Arc<dyn SearchProvider> = wiki.clone();
        let pages: Arc<dyn PageSource> = wiki;
        Ok(Self::with_components(settings, search, pages, speech))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        search: Arc<dyn SearchProvider>,
        pages: Arc<dyn PageSource>,
        speech: Arc<dyn SpeechClient>,
    ) -> Self {
        let endpoint = WikiEndpoint::from_settings(&settings);
        let resolver = ArticleResolver::new(endpoint.clone(), search.clone());
        let fetcher = ArticleFetcher::with_backoff(pages, settings.backoff_base());
        let synthesizer = AudioSynthesizer::new(speech, settings.tts_retry_policy());

        Self {
            settings,
            endpoint,
            search,
            resolver,
            fetcher,
            normalizer: TextNormalizer::default(),
            synthesizer,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn endpoint(&self) -> &WikiEndpoint {
        &self.endpoint
    }

    /// Resolve free text or a URL to one article.
    pub async fn resolve(&self, input: &str) -> Result<ArticleIdentifier> {
        self.resolver
            .resolve(input, &ResolveOptions::from_settings(&self.settings))
            .await
    }

    /// Raw search results in provider order.
    pub async fn search(&self, term: &str, limit: u32) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Err(WikiVoxError::InvalidInput(
                "Search limit must be greater than zero".to_string(),
            ));
        }
        self.search
            .search(term.trim(), limit, self.settings.http_timeout())
            .await
    }

    pub async fn fetch(&self, id: &ArticleIdentifier) -> Result<RawArticle> {
        self.fetcher
            .fetch(id, &FetchOptions::from_settings(&self.settings))
            .await
    }

    pub fn normalize(&self, raw: &RawArticle) -> NormalizedArticle {
        self.normalizer
            .normalize(raw, &NormalizeOptions::from_settings(&self.settings))
    }

    /// Resolve, fetch, select sections and normalize.
    #[instrument(skip(self, selection), fields(input = %input))]
    pub async fn extract(&self, input: &str, selection: &SectionSelection) -> Result<Extraction> {
        let identifier = self.resolve(input).await?;
        let article = self.fetch(&identifier).await?.select_sections(selection)?;
        let normalized = self.normalize(&article);

        info!(
            "Extracted '{}': {} sections, {} speech chars",
            article.title,
            article.sections.len(),
            normalized.tts_text.chars().count()
        );

        Ok(Extraction {
            identifier,
            article,
            normalized,
        })
    }

    /// Synthesize a normalized article into the configured audio format.
    ///
    /// Chapter marks are placed only for formats that can carry them.
    #[instrument(skip(self, normalized), fields(title = %title))]
    pub async fn synthesize(&self, normalized: &NormalizedArticle, title: &str, url: Option<&str>) -> Result<AudioResult> {
        let mut options = SynthesisOptions::from_settings(&self.settings)?;
        options.metadata = Some(AudioMetadata::for_article(title, url.map(str::to_string)));

        let seeds = options
            .format
            .supports_chapters()
            .then(|| map_headings(&normalized.tts_text, &normalized.heading_offsets));

        self.synthesizer
            .synthesize(&normalized.tts_text, seeds.as_deref(), &options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{encode_wav, AudioFormat, WavFormat};
    use crate::tts::SpeechRequest;
    use crate::wiki::PagePayload;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedWiki {
        results: Vec<SearchResult>,
        extract: String,
    }

    #[async_trait]
    impl SearchProvider for FixedWiki {
        async fn search(&self, _query: &str, limit: u32, _timeout: Duration) -> Result<Vec<SearchResult>> {
            Ok(self.results.iter().take(limit as usize).cloned().collect())
        }
    }

    #[async_trait]
    impl PageSource for FixedWiki {
        async fn fetch_page(&self, title: &str, _lead_only: bool, _timeout: Duration) -> Result<PagePayload> {
            Ok(PagePayload {
                title: title.to_string(),
                extract: Some(self.extract.clone()),
                is_disambiguation: false,
                links: Vec::new(),
            })
        }

        fn article_url(&self, title: &str) -> String {
            format!("https://en.wikipedia.org/wiki/{}", title)
        }
    }

    struct SilentSpeech {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechClient for SilentSpeech {
        async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
            self.inputs.lock().unwrap().push(request.input.clone());
            let samples = request.input.chars().count() * 160;
            Ok(encode_wav(&WavFormat::pcm16(16_000, 1), &vec![0u8; samples * 2]))
        }

        fn server_url(&self) -> &str {
            "http://tts"
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn pipeline(results: Vec<SearchResult>) -> (Pipeline, Arc<SilentSpeech>) {
        let wiki = Arc::new(FixedWiki {
            results,
            extract: "Homer was a poet.\n\n== Works ==\nThe Iliad.\n\n== References ==\n".to_string(),
        });
        let speech = Arc::new(SilentSpeech {
            inputs: Mutex::new(Vec::new()),
        });
        let mut settings = Settings::default();
        settings.tts.format = "wav".to_string();
        let pipeline = Pipeline::with_components(settings, wiki.clone(), wiki, speech.clone());
        (pipeline, speech)
    }

    fn hit(title: &str, rank: usize) -> SearchResult {
        SearchResult::new(title, "", format!("https://en.wikipedia.org/wiki/{}", title), rank)
    }

    #[tokio::test]
    async fn test_extract_single_hit() {
        let (pipeline, _) = pipeline(vec![hit("Homer", 0)]);
        let extraction = pipeline.extract("homer", &SectionSelection::All).await.unwrap();

        assert_eq!(extraction.article.title, "Homer");
        assert!(extraction.normalized.markdown_text.starts_with("# Homer"));
        assert!(extraction.normalized.markdown_text.contains("## Works"));
        assert!(!extraction.normalized.markdown_text.contains("References"));
        assert!(extraction.normalized.tts_text.contains("The Iliad."));
    }

    #[tokio::test]
    async fn test_extract_ambiguous_surfaces_candidates() {
        let (pipeline, _) = pipeline(vec![hit("Homer", 0), hit("Homer Simpson", 1)]);
        let err = pipeline.extract("homer", &SectionSelection::All).await.unwrap_err();
        assert_eq!(err.candidates().map(|c| c.len()), Some(2));
    }

    #[tokio::test]
    async fn test_search_rejects_zero_limit() {
        let (pipeline, _) = pipeline(vec![hit("Homer", 0)]);
        assert!(matches!(
            pipeline.search("homer", 0).await,
            Err(WikiVoxError::InvalidInput(_))
        ));
        assert_eq!(pipeline.search("homer", 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_synthesize_wav_has_no_chapters() {
        let (pipeline, speech) = pipeline(vec![hit("Homer", 0)]);
        let extraction = pipeline.extract("homer", &SectionSelection::All).await.unwrap();
        let audio = pipeline
            .synthesize(&extraction.normalized, &extraction.article.title, None)
            .await
            .unwrap();

        assert_eq!(audio.format, AudioFormat::Wav);
        assert!(audio.chapters.is_empty());
        assert!(audio.duration_ms > 0);
        assert!(!speech.inputs.lock().unwrap().is_empty());
    }
}
