//! `lux` - render a model file to an image.

mod cli;
mod logger;

use std::ops::ControlFlow;

use anyhow::{Context, Result};
use clap::Parser;
use lux_core::{load_model, SceneDescription};
use lux_renderer::{render_with_config, Camera, Image, Scene};

use crate::cli::{should_save, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_logger(args.log_level.into());

    let description = match &args.model {
        Some(path) => load_model(path)
            .with_context(|| format!("Failed to load model {}", path.display()))?,
        None => {
            log::info!("No model given, rendering the built-in example scene");
            SceneDescription::example()
        }
    };

    let config = args.render_config(description.iterations);
    let output = args.output_path();

    let scene = Scene::from_description(&description);
    let camera = Camera::from_description(&description.camera);
    let image = Image::new(description.width, description.height);

    log::info!(
        "Rendering {}x{} for {} passes{} to {}",
        description.width,
        description.height,
        config.passes,
        if config.parallel { " (parallel)" } else { "" },
        output.display()
    );

    let mut save_error = None;
    render_with_config(image, &config, &camera, &scene, |pass, image| {
        let completed = pass + 1;
        if !should_save(completed, config.passes) {
            return ControlFlow::Continue(());
        }
        match image.save(&output, pass) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                save_error = Some(err);
                ControlFlow::Break(())
            }
        }
    });

    if let Some(err) = save_error {
        return Err(err).with_context(|| format!("Failed to write {}", output.display()));
    }

    log::info!("Finished");
    Ok(())
}
