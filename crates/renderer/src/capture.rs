//! Frame capture: turning a raw render-target readback into a PNG.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::CaptureError;

/// Byte order of each texel in a readback buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}

/// Whether the first row of a readback buffer is the top or bottom of the
/// picture as seen on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

/// Raw texels copied out of the render target, rows padded to the copy
/// alignment.
#[derive(Debug, Clone)]
pub struct ReadbackFrame {
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    channel_order: ChannelOrder,
    row_order: RowOrder,
    data: Vec<u8>,
}

impl ReadbackFrame {
    pub fn new(
        width: u32,
        height: u32,
        padded_bytes_per_row: u32,
        channel_order: ChannelOrder,
        row_order: RowOrder,
        data: Vec<u8>,
    ) -> Result<Self, CaptureError> {
        let unpadded = width as usize * 4;
        let expected = padded_bytes_per_row as usize * height as usize;
        if (padded_bytes_per_row as usize) < unpadded || data.len() < expected {
            return Err(CaptureError::Layout {
                width,
                height,
                expected: expected.max(unpadded * height as usize),
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            padded_bytes_per_row,
            channel_order,
            row_order,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Strips row padding, converts to RGBA and orders rows top to bottom.
    pub fn into_rgba_image(self) -> Result<RgbaImage, CaptureError> {
        let row_bytes = self.width as usize * 4;
        let stride = self.padded_bytes_per_row as usize;
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);

        for row in 0..self.height as usize {
            let source_row = match self.row_order {
                RowOrder::TopDown => row,
                RowOrder::BottomUp => self.height as usize - 1 - row,
            };
            let start = source_row * stride;
            let texels = &self.data[start..start + row_bytes];
            match self.channel_order {
                ChannelOrder::Rgba => pixels.extend_from_slice(texels),
                ChannelOrder::Bgra => {
                    for texel in texels.chunks_exact(4) {
                        pixels.extend_from_slice(&[texel[2], texel[1], texel[0], texel[3]]);
                    }
                }
            }
        }

        let expected = pixels.len();
        RgbaImage::from_raw(self.width, self.height, pixels).ok_or(CaptureError::Layout {
            width: self.width,
            height: self.height,
            expected,
            actual: expected,
        })
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(png)
}

/// Encoded capture handed back to the requester.
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    /// Where the PNG was written, if the request named a destination.
    pub path: Option<PathBuf>,
}

pub type CaptureResult = Result<CaptureOutput, CaptureError>;

/// Queued request for the next rendered frame.
#[derive(Debug)]
pub struct CaptureRequest {
    destination: Option<PathBuf>,
    reply: Sender<CaptureResult>,
}

impl CaptureRequest {
    pub fn new(destination: Option<PathBuf>) -> (Self, CaptureTicket) {
        let (reply, receiver) = bounded(1);
        (Self { destination, reply }, CaptureTicket { receiver })
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Delivers the outcome. A requester that stopped waiting is not an error.
    pub fn complete(self, result: CaptureResult) {
        if self.reply.send(result).is_err() {
            tracing::debug!("capture requester went away before the result arrived");
        }
    }
}

/// Receiving half of a [`CaptureRequest`].
#[derive(Debug)]
pub struct CaptureTicket {
    receiver: Receiver<CaptureResult>,
}

impl CaptureTicket {
    /// Blocks until the render thread has served the request.
    pub fn wait(self) -> CaptureResult {
        self.receiver.recv().unwrap_or(Err(CaptureError::Dropped))
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<CaptureResult> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(CaptureError::Dropped)),
        }
    }

    /// Non-blocking poll; `None` while the capture is still pending.
    pub fn try_take(&self) -> Option<CaptureResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CaptureError::Dropped)),
        }
    }
}

/// Where capture files end up.
pub trait FileSink: Send + Sync {
    /// Opens `path` for writing, replacing any existing file.
    fn open_for_write(&self, path: &Path) -> io::Result<Box<dyn Write>>;
}

/// Writes straight to the local filesystem, creating parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl FileSink for FsSink {
    fn open_for_write(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(Box::new(File::create(path)?))
    }
}

/// Normalises a readback, encodes it and writes it when a destination was
/// requested.
pub fn encode_capture(
    frame: ReadbackFrame,
    destination: Option<&Path>,
    sink: &dyn FileSink,
) -> CaptureResult {
    let image = frame.into_rgba_image()?;
    let png = encode_png(&image)?;

    if let Some(path) = destination {
        let write = |path: &Path| -> io::Result<()> {
            let mut file = sink.open_for_write(path)?;
            file.write_all(&png)?;
            file.flush()
        };
        write(path).map_err(|source| CaptureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "saved frame capture");
    }

    Ok(CaptureOutput {
        width: image.width(),
        height: image.height(),
        png,
        path: destination.map(Path::to_path_buf),
    })
}

/// Default file name for an interactive capture, e.g.
/// `mandelgl-20241019-153012.png`.
pub fn timestamped_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("mandelgl-{}.png", now.format("%Y%m%d-%H%M%S"))
}
