//! Tile-based frame rendering.
//!
//! Divides the image into tiles that can be traced independently and in
//! parallel using rayon. Each tile owns its random stream, so a pass is
//! reproducible no matter how tiles are scheduled across threads.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{Camera, Color, Image, RayTracer, Scene};

/// A rectangular region of the image.
///
/// Coordinates are in image space with `y` counting up from the bottom row,
/// the same space `Camera::get_ray` and `Image::add_to_pixel` use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of the tile's first column
    pub x: u32,
    /// Y coordinate of the tile's first row
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position of this tile in the render order
    pub index: usize,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Generate tiles covering an image, sorted outward from the center.
///
/// A `tile_size` of zero is treated as one.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let mut tiles = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, tiles.len()));
            x += tile_size;
        }
        y += tile_size;
    }

    sort_from_center(&mut tiles, width, height);

    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Sort tiles by distance from the image center. Stable, so ties keep
/// grid order.
fn sort_from_center(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let distance = |t: &Tile| {
        let dx = t.x as f64 + t.width as f64 / 2.0 - center_x;
        let dy = t.y as f64 + t.height as f64 / 2.0 - center_y;
        dx * dx + dy * dy
    };

    tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Random stream for one tile of one pass.
pub fn tile_rng(seed: u64, pass: u32, tile_index: usize) -> StdRng {
    let stream = mix(mix(seed ^ mix(pass as u64)) ^ tile_index as u64);
    StdRng::seed_from_u64(stream)
}

/// SplitMix64 finalizer.
fn mix(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Trace one radiance sample per pixel of a tile.
///
/// `width` and `height` are the full image size. Returns pixels in
/// row-major order within the tile, starting from its first row.
pub fn render_tile(
    tile: &Tile,
    camera: &Camera,
    scene: &Scene,
    width: u32,
    height: u32,
    rng: &mut StdRng,
) -> Vec<Color> {
    let tracer = RayTracer::new(scene);
    let mut pixels = Vec::with_capacity(tile.pixel_count() as usize);

    for local_y in 0..tile.height {
        for local_x in 0..tile.width {
            let ray = camera.get_ray(tile.x + local_x, tile.y + local_y, width, height, rng);
            pixels.push(tracer.radiance(&ray, rng, None));
        }
    }

    pixels
}

/// Samples traced for one tile.
#[derive(Debug, Clone)]
pub struct TileResult {
    pub tile: Tile,
    /// Radiance samples in row-major order
    pub pixels: Vec<Color>,
}

impl TileResult {
    pub fn new(tile: Tile, pixels: Vec<Color>) -> Self {
        Self { tile, pixels }
    }

    /// Add the samples into the image they were traced for.
    pub fn accumulate_into(&self, image: &mut Image) {
        let mut samples = self.pixels.iter();
        for local_y in 0..self.tile.height {
            for local_x in 0..self.tile.width {
                if let Some(&radiance) = samples.next() {
                    image.add_to_pixel(self.tile.x + local_x, self.tile.y + local_y, radiance);
                }
            }
        }
    }
}
