use std::io;
use std::path::PathBuf;

/// Failure to resolve one of the named viewer assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset '{name}' was not found under {root}")]
    Missing { name: String, root: PathBuf },
    #[error("failed to read asset '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("asset '{0}' is not valid UTF-8")]
    Encoding(String),
    #[error("asset name '{0}' must be a plain file name")]
    InvalidName(String),
}

/// Fatal errors raised while bringing up or reconfiguring the renderer.
///
/// Shader and palette problems are programming or packaging errors: there is
/// no useful fallback image, so they abort initialisation instead of being
/// retried per frame.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to compile {stage} shader '{name}': {message}")]
    ShaderCompile {
        name: String,
        stage: &'static str,
        message: String,
    },
    #[error("fractal program does not match its binding contract: {0}")]
    ShaderLink(String),
    #[error("palette '{asset}' is invalid: {reason}")]
    Palette { asset: String, reason: String },
    #[error("GPU setup failed: {0}")]
    Device(String),
}

/// Errors delivered to whoever requested a frame capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("render target is not ready yet")]
    NotReady,
    #[error("failed to read the render target back: {0}")]
    Readback(String),
    #[error("readback of {width}x{height} needs {expected} bytes but only {actual} were mapped")]
    Layout {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write capture to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("capture was dropped before the render thread served it")]
    Dropped,
}
