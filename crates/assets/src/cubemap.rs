use crate::AssetError;
use std::path::{Path, PathBuf};

/// File stems of the six faces in GPU layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Paths of the six cubemap faces, in layer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapFaces {
    pub paths: [PathBuf; 6],
}

impl CubemapFaces {
    /// `dir/right.<ext>`, `dir/left.<ext>`, ...
    pub fn in_dir(dir: impl AsRef<Path>, extension: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            paths: CUBE_FACE_NAMES.map(|name| dir.join(format!("{name}.{extension}"))),
        }
    }
}

/// Six square RGBA8 faces of equal size.
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapImage {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

impl CubemapImage {
    /// Procedural sky used when the face images are unavailable.
    ///
    /// The top face is pale, the bottom dark, and the sides blend between
    /// the two from top row to bottom row.
    pub fn gradient() -> Self {
        const SIZE: u32 = 16;
        const ZENITH: [u8; 3] = [186, 214, 255];
        const HORIZON: [u8; 3] = [96, 140, 200];
        const NADIR: [u8; 3] = [40, 48, 64];

        let solid = |color: [u8; 3]| -> Vec<u8> {
            (0..SIZE * SIZE)
                .flat_map(|_| [color[0], color[1], color[2], 255])
                .collect()
        };
        let side = || -> Vec<u8> {
            let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
            for y in 0..SIZE {
                let t = y as f32 / (SIZE - 1) as f32;
                let (from, to, t) = if t < 0.5 {
                    (ZENITH, HORIZON, t * 2.0)
                } else {
                    (HORIZON, NADIR, (t - 0.5) * 2.0)
                };
                let px = [
                    lerp(from[0], to[0], t),
                    lerp(from[1], to[1], t),
                    lerp(from[2], to[2], t),
                    255,
                ];
                for _ in 0..SIZE {
                    data.extend_from_slice(&px);
                }
            }
            data
        };

        Self {
            size: SIZE,
            faces: [side(), side(), solid(ZENITH), solid(NADIR), side(), side()],
        }
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Load all six faces. Faces are not flipped: cube sampling expects
/// top-left origin rows.
pub fn load_cubemap(faces: &CubemapFaces) -> Result<CubemapImage, AssetError> {
    let mut size = 0;
    let mut data: [Vec<u8>; 6] = Default::default();

    for (i, path) in faces.paths.iter().enumerate() {
        let img = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(source) => AssetError::Io {
                path: path.clone(),
                source,
            },
            source => AssetError::Decode {
                path: path.clone(),
                source,
            },
        })?;
        let (w, h) = (img.width(), img.height());
        if i == 0 {
            size = w;
        }
        if w != h || w != size {
            return Err(AssetError::CubemapFace {
                face: CUBE_FACE_NAMES[i],
                expected: size,
                found: (w, h),
            });
        }
        data[i] = img.to_rgba8().into_raw();
    }

    tracing::debug!("loaded cubemap with {size}x{size} faces");
    Ok(CubemapImage { size, faces: data })
}

/// Load a cubemap, substituting [`CubemapImage::gradient`] on any failure.
pub fn load_cubemap_or_fallback(faces: &CubemapFaces) -> CubemapImage {
    match load_cubemap(faces) {
        Ok(cubemap) => cubemap,
        Err(e) => {
            tracing::warn!("cubemap failed to load: {e}");
            CubemapImage::gradient()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_faces(dir: &Path, size_of: impl Fn(usize) -> (u32, u32)) -> CubemapFaces {
        let faces = CubemapFaces::in_dir(dir, "png");
        for (i, path) in faces.paths.iter().enumerate() {
            let (w, h) = size_of(i);
            RgbImage::from_pixel(w, h, Rgb([i as u8 * 40, 0, 0]))
                .save(path)
                .unwrap();
        }
        faces
    }

    #[test]
    fn face_paths_follow_layer_order() {
        let faces = CubemapFaces::in_dir("sky", "jpg");
        assert_eq!(faces.paths[0], Path::new("sky/right.jpg"));
        assert_eq!(faces.paths[2], Path::new("sky/top.jpg"));
        assert_eq!(faces.paths[5], Path::new("sky/back.jpg"));
    }

    #[test]
    fn loads_six_matching_faces() {
        let tmp = tempfile::tempdir().unwrap();
        let faces = write_faces(tmp.path(), |_| (4, 4));

        let cube = load_cubemap(&faces).unwrap();
        assert_eq!(cube.size, 4);
        for (i, face) in cube.faces.iter().enumerate() {
            assert_eq!(face.len(), 4 * 4 * 4);
            assert_eq!(&face[..4], &[i as u8 * 40, 0, 0, 255]);
        }
    }

    #[test]
    fn mismatched_face_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let faces = write_faces(tmp.path(), |i| if i == 3 { (8, 8) } else { (4, 4) });

        match load_cubemap(&faces) {
            Err(AssetError::CubemapFace { face, expected, found }) => {
                assert_eq!(face, "bottom");
                assert_eq!(expected, 4);
                assert_eq!(found, (8, 8));
            }
            other => panic!("expected face size error, got {other:?}"),
        }
    }

    #[test]
    fn non_square_face_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let faces = write_faces(tmp.path(), |_| (4, 2));
        assert!(matches!(
            load_cubemap(&faces),
            Err(AssetError::CubemapFace { face: "right", .. })
        ));
    }

    #[test]
    fn missing_faces_fall_back_to_gradient() {
        let tmp = tempfile::tempdir().unwrap();
        let faces = CubemapFaces::in_dir(tmp.path(), "jpg");
        assert!(matches!(load_cubemap(&faces), Err(AssetError::Io { .. })));

        let cube = load_cubemap_or_fallback(&faces);
        assert_eq!(cube, CubemapImage::gradient());
    }

    #[test]
    fn gradient_is_brighter_above() {
        let sky = CubemapImage::gradient();
        let size = sky.size as usize;
        for face in &sky.faces {
            assert_eq!(face.len(), size * size * 4);
        }
        let side = &sky.faces[0];
        let top_row = side[2];
        let bottom_row = side[(size - 1) * size * 4 + 2];
        assert!(top_row > bottom_row);
        assert!(sky.faces[2][0] > sky.faces[3][0]);
    }
}
