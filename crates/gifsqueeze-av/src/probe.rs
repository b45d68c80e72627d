//! Animation probing.
//!
//! Reads just enough of a GIF to plan strategies: canvas size, frame count
//! and per-frame display delays in centiseconds (the GIF delay tick).

use crate::{Error, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageDecoder};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Metadata for a probed animation.
#[derive(Debug, Clone, Serialize)]
pub struct AnimationInfo {
    /// Path the animation was read from.
    pub path: PathBuf,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Display delay of every frame, in centiseconds.
    pub frame_delays_cs: Vec<u16>,
    /// Size of the file on disk in bytes.
    pub file_size: u64,
}

impl AnimationInfo {
    /// Number of frames in the animation.
    pub fn frame_count(&self) -> usize {
        self.frame_delays_cs.len()
    }

    /// Total display time of one loop, in centiseconds.
    pub fn duration_cs(&self) -> u64 {
        self.frame_delays_cs.iter().map(|&d| u64::from(d)).sum()
    }
}

/// Probe a GIF file.
///
/// # Errors
///
/// - [`Error::FileNotFound`] if `path` does not exist.
/// - [`Error::Decode`] if the file is not a GIF or holds no frames.
pub fn probe_animation(path: &Path) -> Result<AnimationInfo> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let file_size = std::fs::metadata(path)?.len();
    let file = File::open(path)?;
    let decoder =
        GifDecoder::new(BufReader::new(file)).map_err(|e| Error::decode(path, e.to_string()))?;
    let (width, height) = decoder.dimensions();

    let mut frame_delays_cs = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame.map_err(|e| Error::decode(path, e.to_string()))?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        frame_delays_cs.push(ms_ratio_to_cs(numer, denom));
    }

    if frame_delays_cs.is_empty() {
        return Err(Error::decode(path, "no frames"));
    }

    tracing::debug!(
        "Probed {}: {}x{}, {} frames, {} bytes",
        path.display(),
        width,
        height,
        frame_delays_cs.len(),
        file_size
    );

    Ok(AnimationInfo {
        path: path.to_path_buf(),
        width,
        height,
        frame_delays_cs,
        file_size,
    })
}

/// Convert a millisecond ratio to whole centiseconds, rounding half up.
fn ms_ratio_to_cs(numer: u32, denom: u32) -> u16 {
    if denom == 0 {
        return 0;
    }
    let numer = u64::from(numer);
    let denom = u64::from(denom);
    let cs = (numer + 5 * denom) / (10 * denom);
    u16::try_from(cs).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, Frame, Rgba, RgbaImage};

    fn write_gif(path: &Path, delays_ms: &[u32]) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = delays_ms.iter().enumerate().map(|(i, &ms)| {
            let shade = (i * 40 % 256) as u8;
            let image = RgbaImage::from_pixel(8, 6, Rgba([shade, 0, 255 - shade, 255]));
            Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(ms, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }

    #[test]
    fn probe_reads_frames_and_delays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        write_gif(&path, &[100, 100, 200, 50]);

        let info = probe_animation(&path).unwrap();
        assert_eq!(info.frame_count(), 4);
        assert_eq!(info.frame_delays_cs, vec![10, 10, 20, 5]);
        assert_eq!(info.duration_cs(), 45);
        assert_eq!((info.width, info.height), (8, 6));
        assert_eq!(info.file_size, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn probe_missing_file() {
        let err = probe_animation(Path::new("/nonexistent/anim.gif")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn probe_rejects_non_gif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.gif");
        std::fs::write(&path, b"definitely not a gif").unwrap();
        let err = probe_animation(&path).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn ms_ratio_rounding() {
        assert_eq!(ms_ratio_to_cs(100, 1), 10);
        assert_eq!(ms_ratio_to_cs(15, 1), 2);
        assert_eq!(ms_ratio_to_cs(14, 1), 1);
        assert_eq!(ms_ratio_to_cs(1000, 3), 33);
        assert_eq!(ms_ratio_to_cs(5, 0), 0);
    }
}
