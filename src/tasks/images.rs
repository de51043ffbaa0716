//! Image optimisation
//!
//! PNG files are re-encoded losslessly with the strongest compression and
//! the smaller of original and re-encoded bytes is written. JPEG and other
//! formats are copied as they are, since re-encoding a JPEG loses detail.

use crate::assets::{self, SourceFile};
use crate::config::AssetCategory;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{Outcome, TaskContext};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use std::fs;
use std::path::Path;

pub const IMAGEMIN_SOURCES: &[AssetCategory] = &[AssetCategory::ClientImg];

/// What happened to one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageResult {
    Recompressed { before: usize, after: usize },
    Unchanged,
    Copied,
}

pub fn imagemin(ctx: &TaskContext) -> ExecutionResult<Outcome> {
    let files = assets::expand(&ctx.working_dir, &ctx.patterns(AssetCategory::ClientImg))?;
    let out_dir = ctx.path(&ctx.config.output.dist).join("img");

    let mut saved = 0usize;
    for file in &files {
        let target = out_dir.join(file.relative_to_base());
        match optimize(file, &target)? {
            ImageResult::Recompressed { before, after } => {
                saved += before - after;
                ctx.print_debug(&format!(
                    "{}: {} -> {} bytes",
                    file.slash_path(),
                    before,
                    after
                ));
            }
            ImageResult::Unchanged | ImageResult::Copied => {}
        }
    }

    ctx.print_info(&format!(
        "{} images, saved {} bytes",
        files.len(),
        saved
    ));
    Ok(Outcome::Done)
}

/// Optimise one image into `target`
pub fn optimize(file: &SourceFile, target: &Path) -> ExecutionResult<ImageResult> {
    let original = fs::read(&file.path).map_err(|e| ExecutionError::io(&file.path, e))?;

    if !matches!(ImageFormat::from_path(&file.path), Ok(ImageFormat::Png)) {
        assets::write_file(target, &original)?;
        return Ok(ImageResult::Copied);
    }

    let img = image::load_from_memory_with_format(&original, ImageFormat::Png)
        .map_err(|e| ExecutionError::transform(&file.path, e))?;
    let encoded = encode_png(&img).map_err(|e| ExecutionError::transform(&file.path, e))?;

    if encoded.len() < original.len() {
        assets::write_file(target, &encoded)?;
        Ok(ImageResult::Recompressed {
            before: original.len(),
            after: encoded.len(),
        })
    } else {
        assets::write_file(target, &original)?;
        Ok(ImageResult::Unchanged)
    }
}

fn encode_png(img: &DynamicImage) -> image::ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    let (w, h) = (img.width(), img.height());

    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    if img.color().has_alpha() {
        encoder.write_image(img.to_rgba8().as_raw(), w, h, ExtendedColorType::Rgba8)?;
    } else {
        encoder.write_image(img.to_rgb8().as_raw(), w, h, ExtendedColorType::Rgb8)?;
    }

    Ok(out)
}
