//! Progressive render loop.
//!
//! Each pass adds one radiance sample to every pixel of the image. Passes
//! run either on the calling thread with a caller-supplied random source,
//! or split into tiles and traced in parallel with rayon.

use std::ops::ControlFlow;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::tile::{generate_tiles, render_tile, tile_rng, TileResult, DEFAULT_TILE_SIZE};
use crate::{Camera, Image, Scene};

/// Run parameters for a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Number of passes (samples per pixel)
    pub passes: u32,
    /// Seed for the random source
    pub seed: u64,
    /// Trace tiles in parallel
    pub parallel: bool,
    /// Tile size in pixels for parallel passes
    pub tile_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            passes: 10,
            seed: 0,
            parallel: false,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// Render `passes` passes into `image` and return it.
pub fn render(
    image: Image,
    passes: u32,
    camera: &Camera,
    scene: &Scene,
    rng: &mut dyn RngCore,
) -> Image {
    render_with(image, passes, camera, scene, rng, |_, _| ControlFlow::Continue(()))
}

/// Render on the calling thread, calling `on_pass(pass, &image)` after each
/// pass. `pass` is zero-based, ready to hand to `Image::tone_mapper`.
/// Stops early when the callback breaks.
pub fn render_with<F>(
    mut image: Image,
    passes: u32,
    camera: &Camera,
    scene: &Scene,
    rng: &mut dyn RngCore,
    mut on_pass: F,
) -> Image
where
    F: FnMut(u32, &Image) -> ControlFlow<()>,
{
    for pass in 0..passes {
        camera.get_frame(scene, &mut image, rng);
        log::debug!("Pass {}/{} complete", pass + 1, passes);

        if on_pass(pass, &image).is_break() {
            log::info!("Render stopped after {} of {} passes", pass + 1, passes);
            break;
        }
    }

    image
}

/// Render with tiles traced in parallel.
///
/// Every tile of every pass draws from its own stream derived from `seed`,
/// and results are added to the image on the calling thread, so output is
/// identical for a given seed, tile size and pass count whatever the
/// thread count.
pub fn render_parallel<F>(
    mut image: Image,
    passes: u32,
    camera: &Camera,
    scene: &Scene,
    seed: u64,
    tile_size: u32,
    mut on_pass: F,
) -> Image
where
    F: FnMut(u32, &Image) -> ControlFlow<()>,
{
    let (width, height) = (image.width(), image.height());
    let tiles = generate_tiles(width, height, tile_size);
    log::debug!(
        "Parallel render: {} tiles of {}px on {} threads",
        tiles.len(),
        tile_size,
        rayon::current_num_threads()
    );

    for pass in 0..passes {
        let results: Vec<TileResult> = tiles
            .par_iter()
            .map(|tile| {
                let mut rng = tile_rng(seed, pass, tile.index);
                let pixels = render_tile(tile, camera, scene, width, height, &mut rng);
                TileResult::new(*tile, pixels)
            })
            .collect();

        for result in &results {
            result.accumulate_into(&mut image);
        }
        log::debug!("Pass {}/{} complete", pass + 1, passes);

        if on_pass(pass, &image).is_break() {
            log::info!("Render stopped after {} of {} passes", pass + 1, passes);
            break;
        }
    }

    image
}

/// Render according to a `RenderConfig`.
pub fn render_with_config<F>(
    image: Image,
    config: &RenderConfig,
    camera: &Camera,
    scene: &Scene,
    on_pass: F,
) -> Image
where
    F: FnMut(u32, &Image) -> ControlFlow<()>,
{
    if config.parallel {
        render_parallel(image, config.passes, camera, scene, config.seed, config.tile_size, on_pass)
    } else {
        let mut rng = StdRng::seed_from_u64(config.seed);
        render_with(image, config.passes, camera, scene, &mut rng, on_pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use lux_core::SceneDescription;
    use lux_math::Vec3;

    fn sky_only() -> (Scene, Camera) {
        let scene = Scene::new(Color::ONE, Color::ZERO, Vec::new(), Vec3::ZERO);
        let camera = Camera::new(Vec3::ZERO, Vec3::Y, 20.0);
        (scene, camera)
    }

    fn example() -> (SceneDescription, Scene, Camera) {
        let description = SceneDescription::example();
        let scene = Scene::from_description(&description);
        let camera = Camera::from_description(&description.camera);
        (description, scene, camera)
    }

    fn ppm_bytes(image: &Image, iteration: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_ppm(&mut bytes, iteration).unwrap();
        bytes
    }

    #[test]
    fn test_render_accumulates_passes() {
        let (scene, camera) = sky_only();
        let mut rng = StdRng::seed_from_u64(3);

        let image = render(Image::new(4, 3), 5, &camera, &scene, &mut rng);
        assert!(image.pixels().iter().all(|&p| p == Color::splat(5.0)));
    }

    #[test]
    fn test_zero_passes_leave_image_black() {
        let (scene, camera) = sky_only();
        let mut rng = StdRng::seed_from_u64(3);

        let image = render(Image::new(4, 3), 0, &camera, &scene, &mut rng);
        assert!(image.pixels().iter().all(|&p| p == Color::ZERO));
    }

    #[test]
    fn test_on_pass_can_stop_early() {
        let (scene, camera) = sky_only();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = Vec::new();

        let image = render_with(Image::new(2, 2), 10, &camera, &scene, &mut rng, |pass, image| {
            seen.push((pass, image.pixel(0, 0)));
            if pass == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(
            seen,
            vec![(0, Color::splat(1.0)), (1, Color::splat(2.0)), (2, Color::splat(3.0))]
        );
        assert_eq!(image.pixel(1, 1), Color::splat(3.0));
    }

    #[test]
    fn test_example_scene_is_reproducible() {
        let (description, scene, camera) = example();
        let passes = 2;

        let first = render(
            Image::new(description.width, description.height),
            passes,
            &camera,
            &scene,
            &mut StdRng::seed_from_u64(42),
        );
        let second = render(
            Image::new(description.width, description.height),
            passes,
            &camera,
            &scene,
            &mut StdRng::seed_from_u64(42),
        );

        let bytes = ppm_bytes(&first, passes - 1);
        let header = b"P6\n# lux_renderer\n\n200 150\n255\n";
        assert!(bytes.starts_with(header));
        assert_eq!(bytes.len(), header.len() + 200 * 150 * 3);
        assert_eq!(bytes, ppm_bytes(&second, passes - 1));

        // Sky, ground and the lit triangle all show up
        let distinct: std::collections::HashSet<&[u8]> =
            bytes[header.len()..].chunks_exact(3).collect();
        assert!(distinct.len() > 10);
    }

    #[test]
    fn test_parallel_matches_serial_on_deterministic_scene() {
        let (scene, camera) = sky_only();
        let image = render_parallel(Image::new(9, 7), 3, &camera, &scene, 5, 4, |_, _| {
            ControlFlow::Continue(())
        });
        assert!(image.pixels().iter().all(|&p| p == Color::splat(3.0)));
    }

    #[test]
    fn test_parallel_is_independent_of_thread_count() {
        let (_, scene, camera) = example();
        let run = || {
            render_parallel(Image::new(40, 30), 2, &camera, &scene, 11, 8, |_, _| {
                ControlFlow::Continue(())
            })
        };

        let single = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(run);
        let many = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(run);

        assert_eq!(single.pixels(), many.pixels());
        assert_eq!(ppm_bytes(&single, 1), ppm_bytes(&many, 1));
    }

    #[test]
    fn test_render_with_config_dispatch() {
        let (_, scene, camera) = example();
        let config = RenderConfig {
            passes: 1,
            seed: 9,
            parallel: false,
            tile_size: 16,
        };

        let serial = render_with_config(Image::new(20, 15), &config, &camera, &scene, |_, _| {
            ControlFlow::Continue(())
        });
        let direct = render(Image::new(20, 15), 1, &camera, &scene, &mut StdRng::seed_from_u64(9));
        assert_eq!(serial.pixels(), direct.pixels());

        let parallel_config = RenderConfig { parallel: true, ..config };
        let parallel = render_with_config(Image::new(20, 15), &parallel_config, &camera, &scene, |_, _| {
            ControlFlow::Continue(())
        });
        let direct = render_parallel(Image::new(20, 15), 1, &camera, &scene, 9, 16, |_, _| {
            ControlFlow::Continue(())
        });
        assert_eq!(parallel.pixels(), direct.pixels());
    }

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
        assert!(!config.parallel);
    }
}
