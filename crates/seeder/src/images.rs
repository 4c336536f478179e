//! Image generation and persistence.
//!
//! Two shapes of work: the golden-scene gallery runs its fixed scene
//! set with bounded concurrency as its rate limit, while per-room
//! images run sequentially behind the shared image pacer. In both shapes a failed image becomes
//! a deterministic placeholder URL; image trouble degrades a style, it
//! never fails one.
//!
//! Persisted values are always URLs. Inline base64 payloads stop here:
//! if upload (or decode) fails, the slot gets a placeholder instead.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::distr::Alphanumeric;
use rand::Rng;

use maison_ai::{Gateway, GatewayError, ImageRequest, InlineImage};
use maison_core::content::{PriceLevel, SceneImage, GOLDEN_SCENES};
use maison_core::pace::Pacer;
use maison_core::placeholder::placeholder_url;
use maison_core::retry::RetryPolicy;

use crate::prompts;

use futures::StreamExt;

/// Concurrency bound for the golden-scene gallery.
const GALLERY_CONCURRENCY: usize = 20;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub model: String,
    pub aspect_ratio: String,
    /// Outer retry around each image call; the gateway itself makes a
    /// single attempt per backend for images.
    pub retry: RetryPolicy,
}

impl ImageConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            aspect_ratio: "4:3".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct ImageGenerator {
    gateway: Arc<Gateway>,
    storage: Arc<dyn maison_store::ObjectStorage>,
    pacer: Arc<Pacer>,
    http: reqwest::Client,
    config: ImageConfig,
}

/// Tally of real versus substituted images for one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTally {
    pub generated: usize,
    pub placeholders: usize,
}

impl ImageTally {
    fn count(&mut self, url: &str) {
        if url.starts_with(maison_core::placeholder::PLACEHOLDER_BASE_URL) {
            self.placeholders += 1;
        } else {
            self.generated += 1;
        }
    }

    pub fn merge(&mut self, other: ImageTally) {
        self.generated += other.generated;
        self.placeholders += other.placeholders;
    }
}

impl ImageGenerator {
    pub fn new(
        gateway: Arc<Gateway>,
        storage: Arc<dyn maison_store::ObjectStorage>,
        pacer: Arc<Pacer>,
        config: ImageConfig,
    ) -> Self {
        Self {
            gateway,
            storage,
            pacer,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Generate the fixed golden-scene gallery for one style.
    ///
    /// Scenes run with bounded concurrency; the returned gallery keeps
    /// the curated scene order regardless of completion order, and every
    /// scene gets a slot (placeholder on failure).
    pub async fn golden_scene_gallery(
        &self,
        style_id: &str,
        style_title_en: &str,
        palette: &[String],
        price_level: PriceLevel,
    ) -> (Vec<SceneImage>, ImageTally) {
        let mut indexed: Vec<(usize, SceneImage)> =
            futures::stream::iter(GOLDEN_SCENES.iter().enumerate().map(
                |(index, (scene_tag, fragment))| {
                    let prompt =
                        prompts::scene_image_prompt(style_title_en, fragment, palette, price_level);
                    async move {
                        let url = self
                            .generate_and_persist(
                                "golden_scene",
                                &prompt,
                                None,
                                "styles",
                                style_id,
                                scene_tag,
                                index,
                                false,
                            )
                            .await;
                        (
                            index,
                            SceneImage {
                                url,
                                scene_tag: (*scene_tag).to_string(),
                            },
                        )
                    }
                },
            ))
            .buffer_unordered(GALLERY_CONCURRENCY)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);

        let mut tally = ImageTally::default();
        let gallery: Vec<SceneImage> = indexed
            .into_iter()
            .map(|(_, image)| {
                tally.count(&image.url);
                image
            })
            .collect();
        (gallery, tally)
    }

    /// Generate the per-room images for one profile, sequentially.
    ///
    /// `reference_url` points at the style's hero image; when it can be
    /// fetched it is passed as an inline reference so room shots stay
    /// visually consistent with the gallery.
    pub async fn room_images(
        &self,
        style_id: &str,
        room_slug: &str,
        room_prompt: &str,
        count: usize,
        reference_url: Option<&str>,
    ) -> (Vec<String>, ImageTally) {
        let reference = match reference_url {
            Some(url) => self.fetch_reference(url).await,
            None => None,
        };

        let mut urls = Vec::with_capacity(count);
        let mut tally = ImageTally::default();
        for index in 0..count {
            let url = self
                .generate_and_persist(
                    "room_image",
                    room_prompt,
                    reference.clone(),
                    "styles",
                    style_id,
                    room_slug,
                    index,
                    true,
                )
                .await;
            tally.count(&url);
            urls.push(url);
        }
        (urls, tally)
    }

    /// One image slot end-to-end: retry the generation call, then
    /// persist. Any terminal failure yields a placeholder URL.
    ///
    /// The gallery path sets `pace` to false: its concurrency bound is
    /// the rate limit there, and routing the fan-out through the shared
    /// pacer would serialize it back to the sequential interval.
    #[allow(clippy::too_many_arguments)]
    async fn generate_and_persist(
        &self,
        function_id: &str,
        prompt: &str,
        reference: Option<InlineImage>,
        entity_type: &str,
        entity_id: &str,
        tag: &str,
        index: usize,
        pace: bool,
    ) -> String {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            model: self.config.model.clone(),
            aspect_ratio: Some(self.config.aspect_ratio.clone()),
            reference,
        };

        let generated: Result<InlineImage, GatewayError> = self
            .config
            .retry
            .run(|_attempt| {
                let request = &request;
                async move {
                    if pace {
                        self.pacer.pause().await;
                    }
                    self.gateway.generate_image(function_id, request, true).await
                }
            })
            .await;

        let slot_key = format!("{entity_id}/{tag}");
        match generated {
            Ok(image) => self.persist(image, entity_type, entity_id, tag, index).await,
            Err(e) => {
                tracing::warn!(
                    entity_id,
                    tag,
                    error = %e,
                    "Image generation exhausted retries; using placeholder",
                );
                placeholder_url(&slot_key, index)
            }
        }
    }

    /// Upload an inline image and return its URL, or a placeholder when
    /// decode or upload fails. Inline data never escapes this function.
    pub async fn persist(
        &self,
        image: InlineImage,
        entity_type: &str,
        entity_id: &str,
        tag: &str,
        index: usize,
    ) -> String {
        let slot_key = format!("{entity_id}/{tag}");
        let bytes = match BASE64.decode(image.data.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(entity_id, tag, error = %e, "Undecodable image payload");
                return placeholder_url(&slot_key, index);
            }
        };

        let filename = unique_filename(tag, &image.mime_type);
        match self
            .storage
            .upload(bytes, &image.mime_type, entity_type, entity_id, &filename)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(entity_id, tag, error = %e, "Image upload failed; using placeholder");
                placeholder_url(&slot_key, index)
            }
        }
    }

    /// Fetch a previously uploaded image for use as a generation
    /// reference. Best-effort; failures just drop the reference.
    async fn fetch_reference(&self, url: &str) -> Option<InlineImage> {
        let response = match self.http.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(url, status = %r.status(), "Reference image fetch rejected");
                return None;
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "Reference image fetch failed");
                return None;
            }
        };

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/webp")
            .to_string();
        let bytes = response.bytes().await.ok()?;
        Some(InlineImage {
            data: BASE64.encode(&bytes),
            mime_type,
        })
    }
}

/// Collision-safe object name: tag, millisecond timestamp, random
/// suffix, extension from the mime type.
fn unique_filename(tag: &str, mime_type: &str) -> String {
    let ext = match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "webp",
    };
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{tag}-{}-{suffix}.{ext}", chrono::Utc::now().timestamp_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api_error, stub_gateway, StubBackend};
    use maison_store::InMemoryObjectStorage;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn generator(
        backend: Arc<StubBackend>,
        storage: Arc<InMemoryObjectStorage>,
    ) -> ImageGenerator {
        ImageGenerator::new(
            stub_gateway(backend),
            storage,
            Arc::new(Pacer::new(Duration::ZERO)),
            ImageConfig {
                retry: fast_retry(),
                ..ImageConfig::new("image-model")
            },
        )
    }

    #[tokio::test]
    async fn gallery_covers_every_golden_scene_in_order() {
        let backend = StubBackend::new();
        let storage = Arc::new(InMemoryObjectStorage::default());
        let (gallery, tally) = generator(backend, storage)
            .golden_scene_gallery("style-1", "Japandi Calm", &["Sand".into()], PriceLevel::Regular)
            .await;

        assert_eq!(gallery.len(), GOLDEN_SCENES.len());
        let tags: Vec<&str> = gallery.iter().map(|s| s.scene_tag.as_str()).collect();
        let expected: Vec<&str> = GOLDEN_SCENES.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(tags, expected);
        assert_eq!(tally.generated, GOLDEN_SCENES.len());
        assert_eq!(tally.placeholders, 0);
    }

    #[tokio::test]
    async fn failed_scene_becomes_placeholder_not_error() {
        let backend = StubBackend::new();
        // First scene burns its full retry budget; the rest succeed.
        backend.push_image(Err(api_error()));
        backend.push_image(Err(api_error()));
        let storage = Arc::new(InMemoryObjectStorage::default());
        let (gallery, tally) = generator(backend, storage)
            .golden_scene_gallery("style-1", "Japandi Calm", &[], PriceLevel::Regular)
            .await;

        assert_eq!(gallery.len(), GOLDEN_SCENES.len());
        assert_eq!(tally.placeholders, 1);
        assert_eq!(tally.generated, GOLDEN_SCENES.len() - 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gallery_scenes_are_not_serialized_by_the_pacer() {
        let backend = StubBackend::new();
        let storage = Arc::new(InMemoryObjectStorage::default());
        let generator = ImageGenerator::new(
            stub_gateway(backend),
            storage,
            Arc::new(Pacer::new(Duration::from_secs(2))),
            ImageConfig {
                retry: fast_retry(),
                ..ImageConfig::new("image-model")
            },
        );

        let start = tokio::time::Instant::now();
        let (gallery, _) = generator
            .golden_scene_gallery("style-1", "Japandi Calm", &[], PriceLevel::Regular)
            .await;

        assert_eq!(gallery.len(), GOLDEN_SCENES.len());
        // A paced fan-out would advance the clock one interval per scene.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn upload_failure_falls_back_to_placeholder() {
        let backend = StubBackend::new();
        let storage = Arc::new(InMemoryObjectStorage::failing());
        let (urls, tally) = generator(backend, storage)
            .room_images("style-1", "living-room", "a living room", 2, None)
            .await;

        assert_eq!(urls.len(), 2);
        assert_eq!(tally.placeholders, 2);
        for url in &urls {
            assert!(url.starts_with(maison_core::placeholder::PLACEHOLDER_BASE_URL));
        }
    }

    #[tokio::test]
    async fn persisted_urls_never_carry_inline_payloads() {
        let backend = StubBackend::new();
        let storage = Arc::new(InMemoryObjectStorage::default());
        let (urls, _) = generator(backend, storage)
            .room_images("style-1", "bedroom", "a bedroom", 2, None)
            .await;

        for url in &urls {
            assert!(url.starts_with("https://"));
            assert!(!url.contains("base64"));
        }
    }

    #[tokio::test]
    async fn undecodable_payload_yields_placeholder() {
        let backend = StubBackend::new();
        let storage = Arc::new(InMemoryObjectStorage::default());
        let url = generator(backend, storage)
            .persist(
                InlineImage {
                    data: "not!!valid@@base64".into(),
                    mime_type: "image/webp".into(),
                },
                "styles",
                "style-1",
                "living-hero",
                0,
            )
            .await;
        assert!(url.starts_with(maison_core::placeholder::PLACEHOLDER_BASE_URL));
    }

    #[test]
    fn filenames_differ_across_calls() {
        assert_ne!(
            unique_filename("living-hero", "image/webp"),
            unique_filename("living-hero", "image/webp")
        );
    }
}
