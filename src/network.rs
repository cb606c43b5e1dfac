//! Default endpoint URLs for the external services.

/// NYT Top Stories feed (home section).
pub const DEFAULT_NEWS_URL: &str = "https://api.nytimes.com/svc/topstories/v2/home.json";

/// Hugging Face inference router, FLUX.1-schnell text-to-image model.
pub const DEFAULT_IMAGE_URL: &str =
    "https://router.huggingface.co/hf-inference/models/black-forest-labs/FLUX.1-schnell";

/// Pinata multipart file upload.
pub const DEFAULT_PIN_FILE_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// Pinata JSON upload.
pub const DEFAULT_PIN_JSON_URL: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";
