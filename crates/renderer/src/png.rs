//! PNG encoding for colorized tiles.
//!
//! Threshold color scales produce at most one color per band plus
//! transparency, so most tiles fit an indexed palette (color type 3). Tiles
//! with more than 256 distinct colors fall back to RGBA (color type 6).

use raster_common::{RasterError, RasterResult};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::colorize::PixelBuffer;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

type Palette = Vec<[u8; 4]>;

/// Encode a pixel buffer, choosing indexed or RGBA output.
pub fn encode_tile(buffer: &PixelBuffer) -> RasterResult<Vec<u8>> {
    check_dimensions(buffer)?;

    let palette = if buffer.width * buffer.height >= PARALLEL_THRESHOLD {
        extract_palette_parallel(&buffer.data)
    } else {
        extract_palette_sequential(&buffer.data)
    };

    match palette {
        Some((palette, indices)) => {
            create_png_indexed(buffer.width, buffer.height, &palette, &indices)
        }
        None => create_png_rgba(buffer),
    }
}

/// A fully transparent square tile.
pub fn blank_tile(tile_size: usize) -> RasterResult<Vec<u8>> {
    let indices = vec![0u8; tile_size * tile_size];
    create_png_indexed(tile_size, tile_size, &[[0, 0, 0, 0]], &indices)
}

fn check_dimensions(buffer: &PixelBuffer) -> RasterResult<()> {
    if buffer.width == 0 || buffer.height == 0 {
        return Err(RasterError::Internal("cannot encode an empty image".into()));
    }
    if buffer.data.len() != buffer.width * buffer.height * 4 {
        return Err(RasterError::Internal(format!(
            "pixel buffer holds {} bytes, expected {}",
            buffer.data.len(),
            buffer.width * buffer.height * 4
        )));
    }
    Ok(())
}

#[inline(always)]
fn pack(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

/// Single pass palette build for small tiles.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let key = pack(px);
        let index = match lookup.get(&key) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push([px[0], px[1], px[2], px[3]]);
                lookup.insert(key, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Two pass palette build: gather distinct colors per chunk, then index.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let distinct: Vec<u32> = pixels
        .par_chunks(chunk_pixels * 4)
        .flat_map_iter(|chunk| {
            let mut local = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                local.insert(pack(px));
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_iter()
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for key in distinct {
        if lookup.contains_key(&key) {
            continue;
        }
        if palette.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(key, palette.len() as u8);
        palette.push(key.to_le_bytes());
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|px| lookup.get(&pack(px)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Indexed PNG (color type 3) with a tRNS chunk when any entry is translucent.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> RasterResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(RasterError::Internal("cannot encode an empty image".into()));
    }
    if indices.len() != width * height {
        return Err(RasterError::Internal(format!(
            "{} palette indices for a {}x{} image",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Truecolor-with-alpha PNG (color type 6).
pub fn create_png_rgba(buffer: &PixelBuffer) -> RasterResult<Vec<u8>> {
    check_dimensions(buffer)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(buffer.width, buffer.height, 6));

    let idat = deflate_scanlines(&buffer.data, buffer.width * 4, buffer.height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression
    data.push(0); // filter
    data.push(0); // interlace
    data
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(bytes: &[u8], row_len: usize, height: usize) -> RasterResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_len + 1));
    for row in bytes.chunks_exact(row_len).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    let compress_err =
        |e: std::io::Error| RasterError::Internal(format!("IDAT compression failed: {}", e));
    encoder.write_all(&raw).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
