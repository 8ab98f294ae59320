pub mod gemini;
pub mod storage;

pub use gemini::GeminiGateway;
pub use storage::JsonFileStore;
