//! Model file loading.
//!
//! Two encodings of a [`SceneDescription`] are supported:
//!
//! - JSON (any path ending in `.json`), via serde
//! - the plain-text model format, used for everything else
//!
//! # Text format
//!
//! ```text
//! #MiniLight
//!
//! 100
//!
//! 200 150
//!
//! (0.278 0.275 -0.789) (0 0 1) 40
//!
//! (3626 5572 5802) (0.1 0.09 0.07)
//!
//! (0 0 0) (0 0 0.559) (0.556 0 0.559) (0.7 0.7 0.7) (0 0 0)
//! ```
//!
//! In order: magic, iterations, image size, camera (position, direction,
//! view angle in degrees), sky emission and ground reflection, then any
//! number of triangles (three vertices, reflectivity, emissivity). Line
//! breaks carry no meaning; they only feed error messages.

use std::path::Path;

use lux_math::Vec3;
use thiserror::Error;

use crate::description::{CameraDescription, SceneDescription, TriangleDescription};

/// First token of every text model file.
pub const MODEL_MAGIC: &str = "#MiniLight";

/// Upper limit for either image dimension.
pub const MAX_IMAGE_DIMENSION: u32 = 10000;

/// Errors that can occur while loading a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing '#MiniLight' header")]
    MissingMagic,

    #[error("Unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("Invalid number '{token}' at line {line}")]
    InvalidNumber { token: String, line: usize },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Result type for model loading.
pub type ModelResult<T> = Result<T, ModelError>;

/// Load a model file, choosing the decoder from the extension.
pub fn load_model(path: impl AsRef<Path>) -> ModelResult<SceneDescription> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

    let scene = if is_json {
        let scene: SceneDescription = serde_json::from_str(&content)?;
        sanitize(scene)
    } else {
        parse_model(&content)?
    };

    log::info!(
        "Loaded model {}: {}x{}, {} iterations, {} triangles ({} emitting)",
        path.display(),
        scene.width,
        scene.height,
        scene.iterations,
        scene.triangles.len(),
        scene.emitter_count()
    );

    Ok(scene)
}

/// Parse the text model format.
pub fn parse_model(content: &str) -> ModelResult<SceneDescription> {
    let mut tokens = Tokenizer::new(content);

    match tokens.next() {
        Some((_, Token::Word(magic))) if magic == MODEL_MAGIC => {}
        _ => return Err(ModelError::MissingMagic),
    }

    let iterations = tokens.integer("iteration count")?;
    let width = tokens.integer("image width")?;
    let height = tokens.integer("image height")?;

    let camera = CameraDescription {
        position: tokens.vector("camera position")?,
        direction: tokens.vector("camera direction")?,
        view_angle: tokens.number("camera view angle")?,
    };

    let sky_emission = tokens.vector("sky emission")?;
    let ground_reflection = tokens.vector("ground reflection")?;

    let mut triangles = Vec::new();
    while !tokens.is_empty() {
        triangles.push(TriangleDescription {
            vertices: [
                tokens.vector("triangle vertex")?,
                tokens.vector("triangle vertex")?,
                tokens.vector("triangle vertex")?,
            ],
            reflectivity: tokens.vector("triangle reflectivity")?,
            emissivity: tokens.vector("triangle emissivity")?,
        });
    }

    Ok(SceneDescription {
        iterations: clamp_count(iterations, 1, u32::MAX, "iterations"),
        width: clamp_count(width, 1, MAX_IMAGE_DIMENSION, "width"),
        height: clamp_count(height, 1, MAX_IMAGE_DIMENSION, "height"),
        camera,
        sky_emission,
        ground_reflection,
        triangles,
    })
}

/// Apply the text-format range limits to a JSON description.
fn sanitize(mut scene: SceneDescription) -> SceneDescription {
    scene.iterations = clamp_count(scene.iterations as i64, 1, u32::MAX, "iterations");
    scene.width = clamp_count(scene.width as i64, 1, MAX_IMAGE_DIMENSION, "width");
    scene.height = clamp_count(scene.height as i64, 1, MAX_IMAGE_DIMENSION, "height");
    scene
}

fn clamp_count(value: i64, min: u32, max: u32, what: &str) -> u32 {
    let clamped = value.clamp(min as i64, max as i64);
    if clamped != value {
        log::warn!("Model {} {} out of range, using {}", what, value, clamped);
    }
    clamped as u32
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
}

/// Splits model text into words and parentheses, tracking line numbers.
struct Tokenizer {
    tokens: Vec<(usize, Token)>,
    position: usize,
}

impl Tokenizer {
    fn new(content: &str) -> Self {
        let mut tokens = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_num = index + 1;
            let mut word = String::new();

            for c in line.chars() {
                if c == '(' || c == ')' || c.is_whitespace() {
                    if !word.is_empty() {
                        tokens.push((line_num, Token::Word(std::mem::take(&mut word))));
                    }
                    match c {
                        '(' => tokens.push((line_num, Token::Open)),
                        ')' => tokens.push((line_num, Token::Close)),
                        _ => {}
                    }
                } else {
                    word.push(c);
                }
            }
            if !word.is_empty() {
                tokens.push((line_num, Token::Word(word)));
            }
        }

        Self {
            tokens,
            position: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn expect(&mut self, expected: &'static str) -> ModelResult<(usize, Token)> {
        self.next().ok_or(ModelError::UnexpectedEof { expected })
    }

    fn number(&mut self, expected: &'static str) -> ModelResult<f64> {
        match self.expect(expected)? {
            (line, Token::Word(token)) => token
                .parse::<f64>()
                .map_err(|_| ModelError::InvalidNumber { token, line }),
            (line, token) => Err(ModelError::Parse {
                line,
                message: format!("expected {}, found {:?}", expected, token),
            }),
        }
    }

    fn integer(&mut self, expected: &'static str) -> ModelResult<i64> {
        match self.expect(expected)? {
            (line, Token::Word(token)) => token
                .parse::<i64>()
                .map_err(|_| ModelError::InvalidNumber { token, line }),
            (line, token) => Err(ModelError::Parse {
                line,
                message: format!("expected {}, found {:?}", expected, token),
            }),
        }
    }

    fn vector(&mut self, expected: &'static str) -> ModelResult<Vec3> {
        match self.expect(expected)? {
            (_, Token::Open) => {}
            (line, token) => {
                return Err(ModelError::Parse {
                    line,
                    message: format!("expected '(' to start {}, found {:?}", expected, token),
                })
            }
        }

        let x = self.number(expected)?;
        let y = self.number(expected)?;
        let z = self.number(expected)?;

        match self.expect(expected)? {
            (_, Token::Close) => Ok(Vec3::new(x, y, z)),
            (line, token) => Err(ModelError::Parse {
                line,
                message: format!("expected ')' to end {}, found {:?}", expected, token),
            }),
        }
    }
}
