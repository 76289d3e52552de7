pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Side length every face image is resized to before comparison.
pub const CANONICAL_FACE_SIZE: u32 = 200;

/// Smallest source crop side accepted by the normalizer.
pub const MIN_SOURCE_SIDE: u32 = 8;

/// Smallest detected face side kept by the locator, in frame pixels.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 80;

/// Default acceptance bound on the mean absolute pixel difference.
pub const DEFAULT_MAX_DISTANCE: f64 = 70.0;

/// Seconds between two alerts for the same flagged person.
pub const DEFAULT_ALERT_COOLDOWN_SECS: u64 = 10;

/// Fewer reference photos than this per person is worth a warning.
pub const RECOMMENDED_PHOTOS_PER_PERSON: usize = 10;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
