//! 图层合成

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use super::selection::{LayerCategory, LayerSelection};
use crate::error::{AppError, Result};

fn load_layer(category: LayerCategory, path: &Path) -> Result<RgbaImage> {
    image::open(path).map(|img| img.to_rgba8()).map_err(|e| {
        AppError::AssetMissing(format!(
            "cannot load {} layer {}: {}",
            category.label(),
            path.display(),
            e
        ))
    })
}

/// 按选择结果自底向上叠加，返回合成后的 RGBA 图像
///
/// 底色决定画布尺寸；其余图层以左上角对齐做 alpha-over 混合。
pub fn flatten(selection: &LayerSelection) -> Result<RgbaImage> {
    let mut layers = selection.layers().into_iter();
    let (base_category, base_path) = layers
        .next()
        .ok_or_else(|| AppError::Internal("empty layer selection".to_string()))?;

    let mut canvas = load_layer(base_category, base_path)?;
    for (category, path) in layers {
        let layer = load_layer(category, path)?;
        debug!("Applying {} layer {}", category.label(), path.display());
        blend_layer(&mut canvas, &layer);
    }
    Ok(canvas)
}

/// 左上角对齐叠加，超出画布的部分裁掉
fn blend_layer(canvas: &mut RgbaImage, layer: &RgbaImage) {
    let width = canvas.width().min(layer.width());
    let height = canvas.height().min(layer.height());
    for y in 0..height {
        for x in 0..width {
            blend_over(canvas.get_pixel_mut(x, y), layer.get_pixel(x, y));
        }
    }
}

/// 非预乘 alpha 的 source-over，整数运算并四舍五入
///
/// 底层不透明时结果必然不透明。
pub(crate) fn blend_over(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    let src_a = u32::from(src[3]);
    match src_a {
        0 => return,
        255 => {
            *dst = *src;
            return;
        }
        _ => {}
    }

    let dst_weight = u32::from(dst[3]) * (255 - src_a);
    // out_a * 255
    let out_scaled = src_a * 255 + dst_weight;
    for i in 0..3 {
        let premultiplied = u32::from(src[i]) * src_a * 255 + u32::from(dst[i]) * dst_weight;
        dst[i] = ((premultiplied + out_scaled / 2) / out_scaled) as u8;
    }
    dst[3] = ((out_scaled + 127) / 255) as u8;
}

/// 编码为 PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image.clone()).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// 合成并编码；配置了调试目录时写入快照
pub fn render_png(selection: &LayerSelection, debug_dir: Option<&Path>) -> Result<Vec<u8>> {
    let canvas = flatten(selection)?;
    let png = encode_png(&canvas)?;
    info!(
        layers = selection.layers().len(),
        bytes = png.len(),
        "Cat image composed"
    );

    if let Some(dir) = debug_dir {
        write_debug_snapshots(dir, selection, &png);
    }
    Ok(png)
}

/// 调试快照只用于诊断，失败时记录日志
fn write_debug_snapshots(dir: &Path, selection: &LayerSelection, png: &[u8]) {
    let result = fs::create_dir_all(dir)
        .and_then(|_| fs::copy(&selection.base_color, dir.join("1-base-color.png")).map(|_| ()))
        .and_then(|_| fs::write(dir.join("final-cat-image.png"), png));

    match result {
        Ok(()) => debug!("Saved debug images to {}", dir.display()),
        Err(e) => warn!("Failed to save debug images to {}: {}", dir.display(), e),
    }
}
