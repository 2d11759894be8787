//! Visionary AI: upload images, ask a question, get Gemini's answer for
//! each image as text or CSV.

pub mod config;
pub mod export;
pub mod gemini;
pub mod page;
pub mod pipeline;
pub mod preprocess;
pub mod server;

pub use config::Config;
pub use gemini::{GeminiClient, InferenceError, InferenceService};
pub use pipeline::{run_batch, AnalysisError, AnalysisResult, ImageAnalysis};
pub use preprocess::{enhance, encode, EncodedImage, ImageError, Preprocessing, UploadedImage};
pub use server::{create_app, AppState};
