//! Image loading and GPU textures

use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::{self, FilterType};
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::scene::TextureSlot;

/// Errors raised while loading meshes, textures or the skybox
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load mesh {}: {source}", .path.display())]
    Mesh {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("mesh {} has no geometry", .path.display())]
    EmptyMesh { path: PathBuf },

    #[error("skybox face {} is {width}x{height}, expected {expected}x{expected}", .path.display())]
    SkyboxFace {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Decodes an image file to 8-bit RGBA
pub fn load_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Texel used for a slot before (or instead of) a real texture
///
/// Chosen to be neutral: white albedo, no specular, a flat normal, no glow.
pub fn placeholder_texel(slot: TextureSlot) -> [u8; 4] {
    match slot {
        TextureSlot::Diffuse | TextureSlot::Height => [255, 255, 255, 255],
        TextureSlot::Specular | TextureSlot::Emissive => [0, 0, 0, 255],
        TextureSlot::Normal => [128, 128, 255, 255],
    }
}

/// The image followed by successively halved levels down to 1x1
pub fn mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let mut levels = vec![image.clone()];
    loop {
        let (width, height) = levels[levels.len() - 1].dimensions();
        if width <= 1 && height <= 1 {
            break;
        }
        let next = imageops::resize(
            &levels[levels.len() - 1],
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );
        levels.push(next);
    }
    levels
}

fn slot_format(slot: TextureSlot) -> wgpu::TextureFormat {
    if slot.is_color() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

/// A sampled 2D texture; the view keeps the texture alive
pub struct GpuTexture {
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Uploads an image with its full mip chain for the given slot
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        slot: TextureSlot,
        label: &str,
    ) -> Self {
        let levels = mip_chain(image);
        let data: Vec<u8> = levels.iter().flat_map(|l| l.as_raw().iter().copied()).collect();
        let (width, height) = image.dimensions();
        Self::from_rgba(
            device,
            queue,
            &data,
            [width, height, levels.len() as u32],
            slot_format(slot),
            label,
        )
    }

    /// 1x1 texture holding the slot's placeholder texel
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, slot: TextureSlot) -> Self {
        Self::from_rgba(
            device,
            queue,
            &placeholder_texel(slot),
            [1, 1, 1],
            slot_format(slot),
            "Placeholder Texture",
        )
    }

    /// `rgba` holds every mip level, largest first
    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        [width, height, mip_level_count]: [u32; 3],
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rgba_reads_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bark.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("write png");

        let image = load_rgba(&path).expect("decode png");
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_image_reports_path() {
        let err = load_rgba(Path::new("does/not/exist.png")).expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.png"));
    }

    #[test]
    fn test_mip_chain_halves_to_one_texel() {
        let image = RgbaImage::from_pixel(8, 2, image::Rgba([200, 100, 50, 255]));
        let sizes: Vec<(u32, u32)> = mip_chain(&image).iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);

        let last = mip_chain(&image).pop().expect("levels");
        assert_eq!(last.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_single_texel_has_one_level() {
        let image = RgbaImage::new(1, 1);
        assert_eq!(mip_chain(&image).len(), 1);
    }

    #[test]
    fn test_placeholder_normal_is_flat() {
        assert_eq!(placeholder_texel(TextureSlot::Normal), [128, 128, 255, 255]);
        assert_eq!(placeholder_texel(TextureSlot::Emissive), [0, 0, 0, 255]);
    }
}
