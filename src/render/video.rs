// Scrolling video writer: slides a fixed viewport down a tall image and pipes
// raw RGB frames into ffmpeg

use anyhow::Context;
use image::RgbImage;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::VideoConfig;
use crate::error::RenderError;
use crate::render::compositor::resize_to_width;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    /// Scroll from the top towards the bottom once
    Scroll,
    /// Scroll through the image and wrap back to its top so playback can repeat
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_secs: f64,
    pub mode: VideoMode,
}

impl Default for VideoSpec {
    fn default() -> Self {
        Self::from(&VideoConfig::default())
    }
}

impl From<&VideoConfig> for VideoSpec {
    fn from(config: &VideoConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps,
            duration_secs: config.duration_secs,
            mode: if config.looping {
                VideoMode::Loop
            } else {
                VideoMode::Scroll
            },
        }
    }
}

impl VideoSpec {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidVideo(format!(
                "frame size {}x{} must be positive",
                self.width, self.height
            )));
        }
        // libx264 with yuv420p needs even dimensions
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(RenderError::InvalidVideo(format!(
                "frame size {}x{} must be even",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(RenderError::InvalidVideo("fps must be positive".to_string()));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(RenderError::InvalidVideo(format!(
                "duration {} must be positive",
                self.duration_secs
            )));
        }
        Ok(())
    }

    pub fn total_frames(&self) -> u32 {
        ((self.duration_secs * f64::from(self.fps)).round() as u32).max(1)
    }
}

/// Resize to the viewport width and, in loop mode, append the first viewport to the end
pub fn prepare_source(img: &RgbImage, spec: &VideoSpec) -> RgbImage {
    let resized = resize_to_width(img, spec.width);
    match spec.mode {
        VideoMode::Scroll => resized,
        VideoMode::Loop => {
            let wrap = resized.height().min(spec.height);
            let mut out = RgbImage::new(spec.width, resized.height() + wrap);
            image::imageops::replace(&mut out, &resized, 0, 0);
            let head = image::imageops::crop_imm(&resized, 0, 0, spec.width, wrap).to_image();
            image::imageops::replace(&mut out, &head, 0, i64::from(resized.height()));
            out
        }
    }
}

/// Top row of the viewport for each frame, moving at a constant rate.
///
/// In loop mode the frame after the last one is the first frame again, so
/// the final offset stops one step short of the appended copy.
pub fn viewport_offsets(source_height: u32, spec: &VideoSpec) -> Vec<u32> {
    let total = spec.total_frames();
    let range = u64::from(source_height.saturating_sub(spec.height));
    (0..total)
        .map(|i| (range * u64::from(i) / u64::from(total)) as u32)
        .collect()
}

/// Raw rgb24 bytes of the viewport starting at `offset`, padded with black below the image
pub fn frame_at(source: &RgbImage, offset: u32, spec: &VideoSpec) -> Vec<u8> {
    let row_bytes = spec.width as usize * 3;
    let mut frame = vec![0u8; row_bytes * spec.height as usize];
    let copy_width = source.width().min(spec.width) as usize * 3;
    let src_row_bytes = source.width() as usize * 3;
    let raw = source.as_raw();

    for row in 0..spec.height {
        let src_y = offset + row;
        if src_y >= source.height() {
            break;
        }
        let src_start = src_y as usize * src_row_bytes;
        let dst_start = row as usize * row_bytes;
        frame[dst_start..dst_start + copy_width]
            .copy_from_slice(&raw[src_start..src_start + copy_width]);
    }

    frame
}

/// ffmpeg arguments reading rgb24 frames from stdin
pub fn encoder_args(spec: &VideoSpec, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-s".to_string(),
        format!("{}x{}", spec.width, spec.height),
        "-r".to_string(),
        spec.fps.to_string(),
        "-i".to_string(),
        "-".to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "medium".to_string(),
        "-crf".to_string(),
        "18".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Encode a scrolling MP4 from a tall image. Blocks until ffmpeg exits.
pub fn write_video(
    ffmpeg: &Path,
    img: &RgbImage,
    spec: &VideoSpec,
    output: &Path,
) -> Result<(), RenderError> {
    spec.validate()?;
    if img.width() == 0 || img.height() == 0 {
        return Err(RenderError::Empty("source image has no pixels".to_string()));
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let source = prepare_source(img, spec);
    let offsets = viewport_offsets(source.height(), spec);
    tracing::info!(
        "Encoding {} frames ({}x{} @ {} fps) to {}",
        offsets.len(),
        spec.width,
        spec.height,
        spec.fps,
        output.display()
    );

    let mut child = Command::new(ffmpeg)
        .args(encoder_args(spec, output))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RenderError::FfmpegNotFound(ffmpeg.to_path_buf()),
            _ => RenderError::Io(e),
        })?;

    let write_result = match child.stdin.take() {
        Some(mut stdin) => offsets
            .iter()
            .try_for_each(|&offset| stdin.write_all(&frame_at(&source, offset, spec))),
        None => Ok(()),
    };

    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }
    let status = child.wait()?;

    if !status.success() {
        return Err(RenderError::ffmpeg_failed(status, stderr.trim()));
    }
    write_result?;

    tracing::info!("Wrote video {}", output.display());
    Ok(())
}

/// Run [`write_video`] on the blocking thread pool
pub async fn write_video_async(
    ffmpeg: PathBuf,
    img: RgbImage,
    spec: VideoSpec,
    output: PathBuf,
) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || write_video(&ffmpeg, &img, &spec, &output))
        .await
        .context("Video writer task failed")??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn spec(mode: VideoMode) -> VideoSpec {
        VideoSpec {
            width: 4,
            height: 4,
            fps: 2,
            duration_secs: 2.0,
            mode,
        }
    }

    /// Each row filled with its own index as the red channel
    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| Rgb([y as u8, 0, 0]))
    }

    #[test]
    fn test_default_spec() {
        let spec = VideoSpec::default();
        assert_eq!((spec.width, spec.height, spec.fps), (1080, 1920, 60));
        assert_eq!(spec.total_frames(), 600);
        assert_eq!(spec.mode, VideoMode::Scroll);
    }

    #[test]
    fn test_offsets_move_at_constant_rate() {
        let offsets = viewport_offsets(12, &spec(VideoMode::Scroll));
        assert_eq!(offsets, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_short_image_does_not_scroll() {
        let offsets = viewport_offsets(3, &spec(VideoMode::Scroll));
        assert_eq!(offsets, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_pads_with_black() {
        let source = gradient(4, 6);
        let frame = frame_at(&source, 4, &spec(VideoMode::Scroll));

        assert_eq!(frame.len(), 4 * 4 * 3);
        // rows 4 and 5 of the source, then padding
        assert_eq!(frame[0], 4);
        assert_eq!(frame[4 * 3], 5);
        assert!(frame[2 * 4 * 3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_loop_appends_first_viewport() {
        let spec = spec(VideoMode::Loop);
        let source = prepare_source(&gradient(4, 10), &spec);

        assert_eq!(source.height(), 14);
        assert_eq!(source.get_pixel(0, 10).0, [0, 0, 0]);
        assert_eq!(source.get_pixel(0, 13).0, [3, 0, 0]);

        // offset 10 would show the appended copy, which is frame 0 again
        let offsets = viewport_offsets(source.height(), &spec);
        assert_eq!(offsets, vec![0, 2, 5, 7]);
    }

    #[test]
    fn test_invalid_specs() {
        let mut bad = spec(VideoMode::Scroll);
        bad.fps = 0;
        assert!(matches!(bad.validate(), Err(RenderError::InvalidVideo(_))));

        let mut odd = spec(VideoMode::Scroll);
        odd.width = 5;
        assert!(odd.validate().is_err());

        let mut zero = spec(VideoMode::Scroll);
        zero.duration_secs = 0.0;
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_encoder_args() {
        let args = encoder_args(&VideoSpec::default(), Path::new("/tmp/out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 1080x1920 -r 60 -i -"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.ends_with("-pix_fmt yuv420p -movflags +faststart /tmp/out.mp4"));
    }

    #[test]
    fn test_missing_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_video(
            Path::new("/nonexistent/ffmpeg"),
            &gradient(4, 8),
            &spec(VideoMode::Scroll),
            &dir.path().join("out.mp4"),
        );
        assert!(matches!(result, Err(RenderError::FfmpegNotFound(_))));
    }
}
