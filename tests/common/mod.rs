//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use visionary_ai::{EncodedImage, InferenceError, InferenceService};

/// PNG of the given width, one pixel tall.
pub fn png_of_width(width: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 1, Rgb([40, 80, 120])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

pub fn jpeg_of_width(width: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 4, Rgb([200, 30, 60])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(90))
        .unwrap();
    bytes
}

/// Records every call and answers with the received image's width.
///
/// Earlier calls are slower than later ones so that any reordering by
/// completion time would be visible.
pub struct MockInference {
    calls: Mutex<Vec<(String, EncodedImage)>>,
    fail_on_call: Option<usize>,
    base_delay_ms: u64,
}

impl MockInference {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: None,
            base_delay_ms: 0,
        }
    }

    /// Fail the given 1-based call with a quota error.
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn images(&self) -> Vec<EncodedImage> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, i)| i.clone())
            .collect()
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn query(&self, prompt: &str, image: &EncodedImage) -> Result<String, InferenceError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), image.clone()));
            calls.len()
        };

        if self.base_delay_ms > 0 {
            let delay = self.base_delay_ms.saturating_sub(call as u64 * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_on_call == Some(call) {
            return Err(InferenceError::Api {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }

        let width = image::load_from_memory(&image.bytes)
            .map(|img| img.width())
            .map_err(|_| InferenceError::EmptyResponse)?;
        Ok(format!("{}px", width))
    }

    fn model_name(&self) -> &str {
        "mock-vision"
    }
}
