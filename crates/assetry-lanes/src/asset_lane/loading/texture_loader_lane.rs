// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Texture decoding.

use super::AssetLoaderLane;
use anyhow::Context;
use assetry_core::asset::Asset;

/// A decoded texture in CPU memory: tightly packed RGBA8 rows, sRGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Asset for CpuTexture {}

/// A lane dedicated to decoding image files on the CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureLoaderLane;

impl AssetLoaderLane<CpuTexture> for TextureLoaderLane {
    fn load(
        &self,
        bytes: &[u8],
    ) -> Result<CpuTexture, Box<dyn std::error::Error + Send + Sync + 'static>> {
        let img = image::load_from_memory(bytes).context("Failed to decode image from memory")?;

        // Convert to RGBA8 (keep in sRGB space)
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(CpuTexture {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let texture = TextureLoaderLane.load(&png(2, 3)).unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(texture.pixels.len(), 2 * 3 * 4);
        assert_eq!(&texture.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(TextureLoaderLane.load(b"not an image").is_err());
    }
}
