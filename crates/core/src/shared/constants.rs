pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
pub const DETECT_ENDPOINT: &str = "boxes";
pub const MATCH_ENDPOINT: &str = "match";

/// The services expect a bare base64 string, not a data URL.
pub const PAYLOAD_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "FaceOverlay";
pub const CONFIG_FILE_NAME: &str = "overlay.json";
