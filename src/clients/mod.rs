pub mod image_extractor;
pub mod image_fetcher;
pub mod llm_client;

pub use image_extractor::{ImageTextExtractor, LlmImageExtractor};
pub use image_fetcher::{HttpImageFetcher, ImageFetcher};
pub use llm_client::LlmClient;
