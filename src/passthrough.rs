//! Copy-through for inputs that are already under target.

use crate::search::{CompressionTarget, RunReport, RunStatus, Stage, Strategy};
use crate::{Error, Result};
use gifsqueeze_av::{probe_animation, AnimationInfo};
use std::path::Path;

/// Probe `input` and, if it is already strictly below the target, copy it
/// to `output` unchanged.
///
/// Returns `Ok(None)` when the input needs compressing. The input is always
/// probed first, so a file that is small but not an animation is still an
/// [`Error::Input`].
pub fn try_passthrough(
    input: &Path,
    output: &Path,
    target: &CompressionTarget,
) -> Result<Option<RunReport>> {
    let info = probe_animation(input).map_err(|e| Error::input(input, e.to_string()))?;
    if info.file_size >= target.target_size_bytes() {
        return Ok(None);
    }

    tracing::info!(
        "{} is {} bytes, already under the {} byte target; copying",
        input.display(),
        info.file_size,
        target.target_size_bytes()
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(Error::resource)?;
    }
    std::fs::copy(input, output).map_err(Error::resource)?;

    Ok(Some(report(&info, output, target)))
}

fn report(info: &AnimationInfo, output: &Path, target: &CompressionTarget) -> RunReport {
    RunReport {
        status: RunStatus::Success,
        target_bytes: target.target_size_bytes(),
        achieved_bytes: info.file_size,
        original_bytes: info.file_size,
        original_frames: info.frame_count(),
        retained_frames: info.frame_count(),
        winner: Strategy::BASELINE,
        stage: Stage::Baseline,
        evaluated: 0,
        failed: 0,
        output: output.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, Frame, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_gif(path: &Path, frames: usize) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for i in 0..frames {
            let buffer = RgbaImage::from_pixel(4, 4, Rgba([(i * 40) as u8, 0, 0, 255]));
            let frame = Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }

    #[test]
    fn small_input_is_copied() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.gif");
        let output = dir.path().join("nested/out.gif");
        write_gif(&input, 3);

        let target = CompressionTarget::new(1024 * 1024, 0.1, 1).unwrap();
        let report = try_passthrough(&input, &output, &target).unwrap().unwrap();

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.evaluated, 0);
        assert_eq!(report.original_frames, 3);
        assert_eq!(std::fs::read(&input).unwrap(), std::fs::read(&output).unwrap());
    }

    #[test]
    fn large_input_is_left_alone() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.gif");
        let output = dir.path().join("out.gif");
        write_gif(&input, 3);

        let target = CompressionTarget::new(1, 0.1, 1).unwrap();
        assert!(try_passthrough(&input, &output, &target).unwrap().is_none());
        assert!(!output.exists());
    }

    #[test]
    fn non_animation_is_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.gif");
        std::fs::write(&input, b"not a gif").unwrap();

        let target = CompressionTarget::new(1024, 0.1, 1).unwrap();
        let err = try_passthrough(&input, &dir.path().join("out.gif"), &target).unwrap_err();
        assert_eq!(err.kind(), "InputError");
    }
}
