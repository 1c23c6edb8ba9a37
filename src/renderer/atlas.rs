use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::error::EngineError;

// ── TileUv ───────────────────────────────────────────────────────────────────

/// Normalised UV rectangle of one atlas cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileUv {
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

// ── DialogAtlas ──────────────────────────────────────────────────────────────

/// The dialogue tile atlas: a single image sliced into a fixed grid of
/// `tile_w × tile_h` cells, indexed row-major.
///
/// The dialogue box expects the 4×3 layout (12 cells): corners at
/// 0/2/8/10, horizontal borders at 1/9, vertical borders at 4/6, fill at
/// 5, and the continuation indicator at 11.
#[derive(Debug)]
pub struct DialogAtlas {
    image: RgbaImage,
    pub cols: u32,
    pub rows: u32,
    pub tile_w: u32,
    pub tile_h: u32,
}

impl DialogAtlas {
    /// Slice an already-decoded image. Fails with `AssetLoad` when the
    /// image dimensions are not an exact multiple of the cell size —
    /// a partial cell would mean every UV after it is wrong.
    pub fn from_image(image: RgbaImage, tile_w: u32, tile_h: u32) -> Result<Self, EngineError> {
        if tile_w == 0 || tile_h == 0 {
            return Err(EngineError::AssetLoad(format!(
                "atlas cell size {tile_w}x{tile_h} must be non-zero"
            )));
        }
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 || w % tile_w != 0 || h % tile_h != 0 {
            return Err(EngineError::AssetLoad(format!(
                "atlas is {w}x{h}, not a whole multiple of the {tile_w}x{tile_h} cell size"
            )));
        }
        Ok(Self {
            image,
            cols: w / tile_w,
            rows: h / tile_h,
            tile_w,
            tile_h,
        })
    }

    pub fn from_bytes(png_bytes: &[u8], tile_w: u32, tile_h: u32) -> Result<Self, EngineError> {
        let img = image::load_from_memory(png_bytes)
            .map_err(|e| EngineError::AssetLoad(format!("atlas decode: {e}")))?
            .to_rgba8();
        Self::from_image(img, tile_w, tile_h)
    }

    pub fn from_file(path: &str, tile_w: u32, tile_h: u32) -> Result<Self, EngineError> {
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::AssetLoad(format!("atlas {path}: {e}")))?;
        Self::from_bytes(&bytes, tile_w, tile_h)
    }

    pub fn tile_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// Returns the UV rectangle for a tile index (row-major order).
    /// Any index at or past `tile_count` fails with `TileIndexOutOfRange`.
    pub fn tile_at(&self, index: u32) -> Result<TileUv, EngineError> {
        if index >= self.tile_count() {
            return Err(EngineError::TileIndexOutOfRange {
                index,
                count: self.tile_count(),
            });
        }
        let col = index % self.cols;
        let row = index / self.cols;
        let total_w = (self.cols * self.tile_w) as f32;
        let total_h = (self.rows * self.tile_h) as f32;

        Ok(TileUv {
            uv_min: [
                (col * self.tile_w) as f32 / total_w,
                (row * self.tile_h) as f32 / total_h,
            ],
            uv_max: [
                ((col + 1) * self.tile_w) as f32 / total_w,
                ((row + 1) * self.tile_h) as f32 / total_h,
            ],
        })
    }

    /// Upload the atlas image to the GPU. Nearest-neighbour sampling keeps
    /// the pixel-art cells crisp at any overlay scale.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> (wgpu::TextureView, wgpu::Sampler) {
        let (w, h) = self.image.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("dialog_atlas"),
                size: wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &self.image,
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        (texture_view, sampler)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas_4x3() -> DialogAtlas {
        // 4 columns × 3 rows of 16×8 cells = 64×24 image.
        DialogAtlas::from_image(RgbaImage::new(64, 24), 16, 8).unwrap()
    }

    #[test]
    fn slices_into_expected_grid() {
        let a = atlas_4x3();
        assert_eq!(a.cols, 4);
        assert_eq!(a.rows, 3);
        assert_eq!(a.tile_count(), 12);
    }

    #[test]
    fn rejects_width_not_multiple_of_cell() {
        let err = DialogAtlas::from_image(RgbaImage::new(60, 24), 16, 8).unwrap_err();
        assert!(matches!(err, EngineError::AssetLoad(_)));
    }

    #[test]
    fn rejects_height_not_multiple_of_cell() {
        let err = DialogAtlas::from_image(RgbaImage::new(64, 20), 16, 8).unwrap_err();
        assert!(matches!(err, EngineError::AssetLoad(_)));
    }

    #[test]
    fn rejects_empty_image() {
        assert!(DialogAtlas::from_image(RgbaImage::new(0, 0), 16, 8).is_err());
    }

    #[test]
    fn rejects_zero_cell_size() {
        assert!(DialogAtlas::from_image(RgbaImage::new(64, 24), 0, 8).is_err());
    }

    #[test]
    fn first_tile_spans_top_left_cell() {
        let uv = atlas_4x3().tile_at(0).unwrap();
        assert_eq!(uv.uv_min, [0.0, 0.0]);
        assert_eq!(uv.uv_max, [0.25, 1.0 / 3.0]);
    }

    #[test]
    fn index_is_row_major() {
        let a = atlas_4x3();
        // Index 5 = row 1, col 1.
        let uv = a.tile_at(5).unwrap();
        assert_eq!(uv.uv_min, [0.25, 1.0 / 3.0]);
        // Index 11 = row 2, col 3 (bottom-right cell).
        let last = a.tile_at(11).unwrap();
        assert_eq!(last.uv_max, [1.0, 1.0]);
    }

    #[test]
    fn index_past_grid_is_out_of_range() {
        let err = atlas_4x3().tile_at(12).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TileIndexOutOfRange { index: 12, count: 12 }
        ));
    }

    #[test]
    fn all_valid_indices_have_uvs_in_unit_range() {
        let a = atlas_4x3();
        for i in 0..a.tile_count() {
            let uv = a.tile_at(i).unwrap();
            for v in uv.uv_min.iter().chain(uv.uv_max.iter()) {
                assert!(*v >= 0.0 && *v <= 1.0, "index {i}: uv {v} out of [0,1]");
            }
            assert!(uv.uv_min[0] < uv.uv_max[0]);
            assert!(uv.uv_min[1] < uv.uv_max[1]);
        }
    }
}
