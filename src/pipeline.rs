//! Batch analysis: preprocess every upload, then query the model once per
//! image in upload order.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gemini::{InferenceError, InferenceService};
use crate::preprocess::{ImageError, Preprocessing, UploadedImage};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Please enter a query before analyzing.")]
    EmptyPrompt,

    #[error("Please upload at least one image.")]
    NoImages,

    #[error("Image {number}: {source}")]
    Image {
        number: usize,
        #[source]
        source: ImageError,
    },

    #[error("Image {number}: {source}")]
    Inference {
        number: usize,
        #[source]
        source: InferenceError,
    },
}

impl AnalysisError {
    /// True for errors caused by missing user input.
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::EmptyPrompt | AnalysisError::NoImages)
    }
}

/// Model output for one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnalysis {
    /// Zero-based upload position.
    pub index: usize,
    pub text: String,
}

impl ImageAnalysis {
    /// Display label, e.g. `Image 1`.
    pub fn label(&self) -> String {
        image_label(self.index)
    }
}

pub fn image_label(index: usize) -> String {
    format!("Image {}", index + 1)
}

/// Ordered results of one analysis action, one entry per upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    entries: Vec<ImageAnalysis>,
}

impl AnalysisResult {
    /// Build from texts already in upload order.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| ImageAnalysis {
                index,
                text: text.into(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ImageAnalysis] {
        &self.entries
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ImageAnalysis> {
        self.entries
    }
}

/// Reject a batch that must not run.
pub fn validate(prompt: &str, images: &[UploadedImage]) -> Result<(), AnalysisError> {
    if prompt.trim().is_empty() {
        return Err(AnalysisError::EmptyPrompt);
    }
    if images.is_empty() {
        return Err(AnalysisError::NoImages);
    }
    Ok(())
}

/// Analyze every image with the same prompt.
///
/// All uploads are decoded and encoded before the first remote call, so an
/// unreadable image aborts the batch without spending any requests. Remote
/// calls run one at a time; the first failure aborts the batch and no
/// partial results are returned.
pub async fn run_batch(
    service: &dyn InferenceService,
    preprocessing: Preprocessing,
    prompt: &str,
    images: &[UploadedImage],
) -> Result<AnalysisResult, AnalysisError> {
    validate(prompt, images)?;

    let mut encoded = Vec::with_capacity(images.len());
    for (index, upload) in images.iter().enumerate() {
        let image = preprocessing
            .prepare(upload)
            .map_err(|source| AnalysisError::Image {
                number: index + 1,
                source,
            })?;
        debug!(
            "Prepared {} ({}): {} PNG bytes",
            image_label(index),
            upload.name().unwrap_or("unnamed"),
            image.bytes.len()
        );
        encoded.push(image);
    }

    info!(
        "🤖 Analyzing {} image(s) with {}",
        encoded.len(),
        service.model_name()
    );

    let mut texts = Vec::with_capacity(encoded.len());
    for (index, image) in encoded.iter().enumerate() {
        let text = service.query(prompt, image).await.map_err(|source| {
            warn!("{} failed: {}", image_label(index), source);
            AnalysisError::Inference {
                number: index + 1,
                source,
            }
        })?;
        texts.push(text);
    }

    Ok(AnalysisResult::from_texts(texts))
}
