use crate::AssetError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel, Rgba, RgbaImage};
use std::path::Path;

/// How a 2D texture is prepared after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    /// Flip rows so the first row in memory is the bottom of the image.
    pub flip_vertically: bool,
    pub generate_mips: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: true,
            generate_mips: true,
        }
    }
}

/// Pixel layout of decoded texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single 8-bit channel.
    R8,
    /// Four 8-bit channels, sRGB colour.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Decoded texture with its full mip chain, largest level first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub mips: Vec<Vec<u8>>,
}

impl TextureImage {
    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }

    /// Size of mip `level`, never smaller than 1x1.
    pub fn mip_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    /// Magenta/black checkerboard used when a texture cannot be loaded.
    pub fn fallback() -> Self {
        let checker = RgbaImage::from_fn(8, 8, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 {
                Rgba([255, 0, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        Self {
            width: 8,
            height: 8,
            format: PixelFormat::Rgba8,
            mips: mip_chain(checker, true),
        }
    }
}

/// Number of mip levels in a full chain for a `width` x `height` image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Decode an encoded image (PNG or JPEG) into a texture.
///
/// Single-channel images stay single-channel; everything else is expanded
/// to RGBA because GPUs have no packed three-byte format.
pub fn decode_texture(
    bytes: &[u8],
    opts: &TextureOptions,
) -> Result<TextureImage, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    Ok(prepare(img, opts))
}

/// Read and decode a texture file.
pub fn load_texture(
    path: impl AsRef<Path>,
    opts: &TextureOptions,
) -> Result<TextureImage, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let texture = decode_texture(&bytes, opts).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        "loaded texture {} ({}x{}, {:?}, {} mips)",
        path.display(),
        texture.width,
        texture.height,
        texture.format,
        texture.mip_count()
    );
    Ok(texture)
}

/// Load a texture, substituting [`TextureImage::fallback`] on any failure.
pub fn load_texture_or_fallback(path: impl AsRef<Path>, opts: &TextureOptions) -> TextureImage {
    match load_texture(path.as_ref(), opts) {
        Ok(texture) => texture,
        Err(e) => {
            tracing::warn!("texture failed to load at {}: {e}", path.as_ref().display());
            TextureImage::fallback()
        }
    }
}

fn prepare(img: DynamicImage, opts: &TextureOptions) -> TextureImage {
    let img = if opts.flip_vertically { img.flipv() } else { img };
    let (width, height) = (img.width(), img.height());

    if img.color().channel_count() == 1 {
        TextureImage {
            width,
            height,
            format: PixelFormat::R8,
            mips: mip_chain(img.to_luma8(), opts.generate_mips),
        }
    } else {
        TextureImage {
            width,
            height,
            format: PixelFormat::Rgba8,
            mips: mip_chain(img.to_rgba8(), opts.generate_mips),
        }
    }
}

fn mip_chain<P>(base: ImageBuffer<P, Vec<u8>>, generate: bool) -> Vec<Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = base.dimensions();
    let levels = if generate { mip_level_count(width, height) } else { 1 };

    let mut mips = Vec::with_capacity(levels as usize);
    for level in 1..levels {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        mips.push(imageops::resize(&base, w, h, FilterType::Triangle).into_raw());
    }
    mips.insert(0, base.into_raw());
    mips
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, GrayImage, Luma, LumaA, Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, img: DynamicImage) -> std::path::PathBuf {
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn mip_level_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(8, 8), 4);
        assert_eq!(mip_level_count(512, 256), 10);
        assert_eq!(mip_level_count(5, 3), 3);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn rgb_expands_to_rgba_with_full_chain() {
        let tmp = tempfile::tempdir().unwrap();
        let img = RgbImage::from_pixel(16, 4, Rgb([10, 20, 30]));
        let path = write_png(tmp.path(), "rgb.png", DynamicImage::ImageRgb8(img));

        let tex = load_texture(&path, &TextureOptions::default()).unwrap();
        assert_eq!(tex.format, PixelFormat::Rgba8);
        assert_eq!((tex.width, tex.height), (16, 4));
        assert_eq!(tex.mip_count(), 5);
        assert_eq!(tex.mips[0].len(), 16 * 4 * 4);
        assert_eq!(&tex.mips[0][..4], &[10, 20, 30, 255]);

        for level in 0..tex.mip_count() {
            let (w, h) = tex.mip_size(level);
            assert_eq!(tex.mips[level as usize].len(), (w * h * 4) as usize);
        }
        assert_eq!(tex.mip_size(4), (1, 1));
    }

    #[test]
    fn gray_alpha_expands_to_rgba() {
        let tmp = tempfile::tempdir().unwrap();
        let img = GrayAlphaImage::from_pixel(8, 8, LumaA([100, 50]));
        let path = write_png(tmp.path(), "la.png", DynamicImage::ImageLumaA8(img));

        let tex = load_texture(&path, &TextureOptions::default()).unwrap();
        assert_eq!(tex.format, PixelFormat::Rgba8);
        assert_eq!(tex.mip_count(), 4);
        assert_eq!(tex.mips[0].len(), 8 * 8 * 4);
        assert_eq!(&tex.mips[0][..4], &[100, 100, 100, 50]);
    }

    #[test]
    fn grayscale_stays_single_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let img = GrayImage::from_pixel(4, 4, Luma([200]));
        let path = write_png(tmp.path(), "gray.png", DynamicImage::ImageLuma8(img));

        let tex = load_texture(&path, &TextureOptions::default()).unwrap();
        assert_eq!(tex.format, PixelFormat::R8);
        assert_eq!(tex.mips[0], vec![200; 16]);
    }

    #[test]
    fn flip_reverses_row_order() {
        let img = RgbaImage::from_fn(1, 2, |_, y| {
            if y == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let flipped = decode_texture(&bytes, &TextureOptions::default()).unwrap();
        assert_eq!(&flipped.mips[0][..4], &[0, 0, 255, 255]);

        let upright = decode_texture(
            &bytes,
            &TextureOptions {
                flip_vertically: false,
                generate_mips: false,
            },
        )
        .unwrap();
        assert_eq!(&upright.mips[0][..4], &[255, 0, 0, 255]);
        assert_eq!(upright.mip_count(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_texture("/no/such/texture.png", &TextureOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.to_string().contains("texture.png"));
    }

    #[test]
    fn garbage_is_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not a png at all").unwrap();
        let err = load_texture(&path, &TextureOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn fallback_replaces_missing_texture() {
        let tex = load_texture_or_fallback("/no/such/texture.png", &TextureOptions::default());
        assert_eq!(tex, TextureImage::fallback());
        assert_eq!(tex.mip_count(), 4);
        assert_eq!(&tex.mips[0][..4], &[255, 0, 255, 255]);
    }
}
