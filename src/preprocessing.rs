// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame preprocessing for pose inference.
//!
//! Frames are letterbox-resized into the detector's square input resolution,
//! normalized to [0, 1] and laid out as an NCHW tensor. The letterbox
//! transform (scale + padding) is returned so decoded keypoints can be mapped
//! back into original frame space.

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{PoseError, Result};

/// Letterbox padding color (gray), normalized.
const LETTERBOX_NORM: f32 = 114.0 / 255.0;

/// Result of preprocessing a frame, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed frame tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// Original frame dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Preprocess a frame for pose inference.
///
/// # Arguments
///
/// * `frame` - Input frame.
/// * `imgsz` - Square target resolution (e.g. 192 or 256).
///
/// # Errors
///
/// Returns an error if the frame has zero dimensions or cannot be resized.
pub fn preprocess_frame(frame: &DynamicImage, imgsz: usize) -> Result<PreprocessResult> {
    let (orig_width, orig_height) = frame.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Err(PoseError::Image("frame has zero dimensions".to_string()));
    }

    let orig_shape = (orig_height, orig_width);
    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, imgsz);

    // Resize to the scaled inner dimensions.
    let src_rgb = frame.to_rgb8();
    let src_image = Image::from_vec_u8(orig_width, orig_height, src_rgb.into_raw(), PixelType::U8x3)
        .map_err(|e| PoseError::Image(format!("failed to wrap frame pixels: {e}")))?;

    let mut dst_image = Image::new(new_width.max(1), new_height.max(1), PixelType::U8x3);
    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| PoseError::Image(format!("failed to resize frame: {e}")))?;

    // Paste into the letterboxed tensor, normalizing as we go.
    let resized = dst_image.into_vec();
    let mut tensor = Array4::from_elem((1, 3, imgsz, imgsz), LETTERBOX_NORM);

    let (new_w, new_h) = (new_width as usize, new_height as usize);
    let (pad_l, pad_t) = (pad_left as usize, pad_top as usize);
    for y in 0..new_h {
        for x in 0..new_w {
            let offset = (y * new_w + x) * 3;
            for c in 0..3 {
                tensor[[0, c, pad_t + y, pad_l + x]] = f32::from(resized[offset + c]) / 255.0;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let padding = (pad_top as f32, pad_left as f32);

    Ok(PreprocessResult {
        tensor,
        orig_shape,
        scale,
        padding,
    })
}

/// Calculate letterbox parameters for resizing.
///
/// Computes scaled inner dimensions and centered padding to fit the frame
/// within a square target while maintaining aspect ratio.
///
/// # Returns
///
/// Tuple containing:
/// 1. `new_width`: Scaled width.
/// 2. `new_height`: Scaled height.
/// 3. `pad_left`: Left padding.
/// 4. `pad_top`: Top padding.
/// 5. `(scale_y, scale_x)`: Scale factors.
#[must_use]
pub fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    imgsz: usize,
) -> (u32, u32, u32, u32, (f32, f32)) {
    #[allow(clippy::cast_precision_loss)]
    let target = imgsz as f32;
    #[allow(clippy::cast_precision_loss)]
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    let scale = (target / orig_h).min(target / orig_w);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_w = (orig_w * scale).round() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_h = (orig_h * scale).round() as u32;

    #[allow(clippy::cast_possible_truncation)]
    let pad_w = (imgsz as u32).saturating_sub(new_w);
    #[allow(clippy::cast_possible_truncation)]
    let pad_h = (imgsz as u32).saturating_sub(new_h);

    // Center alignment: divide padding equally on both sides.
    let pad_left = pad_w / 2;
    let pad_top = pad_h / 2;

    #[allow(clippy::cast_precision_loss)]
    let scale_x = new_w as f32 / orig_w;
    #[allow(clippy::cast_precision_loss)]
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_left, pad_top, (scale_y, scale_x))
}

/// Map a point from letterboxed model space back to original frame space.
///
/// # Arguments
///
/// * `x`, `y` - Point in model input space (after letterbox).
/// * `scale` - Scale factors (`scale_y`, `scale_x`) from preprocessing.
/// * `padding` - Padding (`pad_top`, `pad_left`) from preprocessing.
#[must_use]
pub fn unletterbox_point(x: f32, y: f32, scale: (f32, f32), padding: (f32, f32)) -> (f32, f32) {
    let (scale_y, scale_x) = scale;
    let (pad_top, pad_left) = padding;
    ((x - pad_left) / scale_x, (y - pad_top) / scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_params_square() {
        let (new_w, new_h, pad_left, pad_top, _scale) = calculate_letterbox_params(256, 256, 256);

        assert_eq!(new_w, 256);
        assert_eq!(new_h, 256);
        assert_eq!(pad_left, 0);
        assert_eq!(pad_top, 0);
    }

    #[test]
    fn test_letterbox_params_wide() {
        let (new_w, new_h, pad_left, pad_top, _scale) = calculate_letterbox_params(1280, 720, 256);

        assert_eq!(new_w, 256);
        assert_eq!(new_h, 144);
        assert_eq!(pad_left, 0);
        assert_eq!(pad_top, (256 - 144) / 2);
    }

    #[test]
    fn test_unletterbox_point() {
        let (x, y) = unletterbox_point(100.0, 100.0, (1.0, 1.0), (10.0, 10.0));
        assert!((x - 90.0).abs() < 1e-6);
        assert!((y - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_tensor_shape_and_range() {
        let frame = DynamicImage::new_rgb8(640, 360);
        let result = preprocess_frame(&frame, 256).unwrap();

        assert_eq!(result.tensor.shape(), &[1, 3, 256, 256]);
        assert_eq!(result.orig_shape, (360, 640));
        for &v in result.tensor.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
        // Padded rows carry the letterbox gray.
        assert!((result.tensor[[0, 0, 0, 0]] - LETTERBOX_NORM).abs() < 1e-6);
    }
}
