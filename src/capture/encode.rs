use std::path::Path;

use anyhow::Context as _;

use crate::{
    channel::{ChannelKind, PixelLayout},
    config::DepthRange,
    host::bake::BakedImage,
};

/// Stored pixels of one channel image, ready for the PNG encoder.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EncodedPixels {
    Rgb8(Vec<u8>),
    Luma8(Vec<u8>),
    Luma16(Vec<u16>),
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert raw bake samples into the channel's storage layout.
///
/// Base color is sRGB-encoded, normals are packed from `[-1,1]` into `[0,1]`, depth is remapped
/// through `depth` into the full 16-bit range. Everything else is stored as-is.
pub(crate) fn encode_samples(kind: ChannelKind, img: &BakedImage, depth: DepthRange) -> EncodedPixels {
    match (kind, kind.spec().layout) {
        (ChannelKind::BaseColor, _) => EncodedPixels::Rgb8(
            img.samples
                .iter()
                .map(|&c| unit_to_u8(linear_to_srgb(c)))
                .collect(),
        ),
        (ChannelKind::Normal, _) => EncodedPixels::Rgb8(
            img.samples
                .iter()
                .map(|&n| unit_to_u8(n * 0.5 + 0.5))
                .collect(),
        ),
        (_, PixelLayout::Luma16) => EncodedPixels::Luma16(
            img.samples
                .iter()
                .map(|&d| (depth.remap(f64::from(d)) * 65535.0).round() as u16)
                .collect(),
        ),
        (_, PixelLayout::Rgb8) => {
            EncodedPixels::Rgb8(img.samples.iter().map(|&v| unit_to_u8(v)).collect())
        }
        (_, PixelLayout::Luma8) => {
            EncodedPixels::Luma8(img.samples.iter().map(|&v| unit_to_u8(v)).collect())
        }
    }
}

/// Encode and write one channel image as PNG, overwriting any previous file.
pub(crate) fn write_channel_png(
    path: &Path,
    kind: ChannelKind,
    img: &BakedImage,
    depth: DepthRange,
) -> anyhow::Result<()> {
    let (w, h) = (img.width, img.height);
    match encode_samples(kind, img, depth) {
        EncodedPixels::Rgb8(data) => image::save_buffer_with_format(
            path,
            &data,
            w,
            h,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        ),
        EncodedPixels::Luma8(data) => image::save_buffer_with_format(
            path,
            &data,
            w,
            h,
            image::ColorType::L8,
            image::ImageFormat::Png,
        ),
        EncodedPixels::Luma16(data) => {
            let buf = image::ImageBuffer::<image::Luma<u16>, _>::from_raw(w, h, data)
                .context("depth buffer does not match image dimensions")?;
            buf.save_with_format(path, image::ImageFormat::Png)
        }
    }
    .with_context(|| format!("write png '{}'", path.display()))
}

/// Write depth samples as signed scene-unit heights above the range's zero plane, as a float EXR
/// replicated into RGB.
pub(crate) fn write_raw_depth_exr(
    path: &Path,
    img: &BakedImage,
    depth: DepthRange,
) -> anyhow::Result<()> {
    let rgb: Vec<f32> = img
        .samples
        .iter()
        .flat_map(|&d| {
            let h = depth.signed_height(f64::from(d)) as f32;
            [h, h, h]
        })
        .collect();
    let buf = image::Rgb32FImage::from_raw(img.width, img.height, rgb)
        .context("raw depth buffer does not match image dimensions")?;
    image::DynamicImage::ImageRgb32F(buf)
        .save_with_format(path, image::ImageFormat::OpenExr)
        .with_context(|| format!("write exr '{}'", path.display()))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/encode.rs"]
mod tests;
