//! 图层随机选择

use rand::Rng;
use rand::seq::SliceRandom;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::AssetConfig;
use crate::error::{AppError, Result};

/// 图层分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerCategory {
    BaseColor,
    FurPattern,
    Eyes,
    Mouth,
    Lines,
    HeadAccessory,
}

impl LayerCategory {
    pub fn label(&self) -> &'static str {
        match self {
            LayerCategory::BaseColor => "base color",
            LayerCategory::FurPattern => "fur pattern",
            LayerCategory::Eyes => "eyes",
            LayerCategory::Mouth => "mouth",
            LayerCategory::Lines => "lines",
            LayerCategory::HeadAccessory => "head accessory",
        }
    }
}

/// 解析后的素材目录布局
#[derive(Debug, Clone)]
pub struct AssetLayout {
    pub base_colors: PathBuf,
    pub eyes: PathBuf,
    pub mouths: PathBuf,
    pub lines: PathBuf,
    pub patterns: PathBuf,
    pub accessories: PathBuf,
    pub accessory_probability: f64,
}

impl AssetLayout {
    pub fn from_config(config: &AssetConfig) -> Self {
        let root = &config.root;
        Self {
            base_colors: root.join(&config.base_colors),
            eyes: root.join(&config.eyes),
            mouths: root.join(&config.mouths),
            lines: root.join(&config.lines),
            patterns: root.join(&config.patterns),
            accessories: root.join(&config.accessories),
            accessory_probability: config.accessory_probability,
        }
    }

    /// 为一次生成随机挑选图层
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<LayerSelection> {
        let base_color = pick_required(&self.base_colors, LayerCategory::BaseColor, rng)?;
        let eyes = pick_required(&self.eyes, LayerCategory::Eyes, rng)?;
        let mouth = pick_required(&self.mouths, LayerCategory::Mouth, rng)?;
        let lines = pick_required(&self.lines, LayerCategory::Lines, rng)?;

        let fur_pattern = pick_nested(&self.patterns, rng);

        let head_accessory = if rng.gen_bool(self.accessory_probability.clamp(0.0, 1.0)) {
            pick_nested(&self.accessories, rng)
        } else {
            None
        };

        let selection = LayerSelection {
            base_color,
            fur_pattern,
            eyes,
            mouth,
            lines,
            head_accessory,
        };
        debug!(?selection, "Selected cat layers");
        Ok(selection)
    }
}

/// 一次生成所选的图层文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSelection {
    pub base_color: PathBuf,
    pub fur_pattern: Option<PathBuf>,
    pub eyes: PathBuf,
    pub mouth: PathBuf,
    pub lines: PathBuf,
    pub head_accessory: Option<PathBuf>,
}

impl LayerSelection {
    /// 自底向上的合成顺序
    pub fn layers(&self) -> Vec<(LayerCategory, &Path)> {
        let mut layers = vec![(LayerCategory::BaseColor, self.base_color.as_path())];
        if let Some(pattern) = &self.fur_pattern {
            layers.push((LayerCategory::FurPattern, pattern.as_path()));
        }
        layers.push((LayerCategory::Eyes, self.eyes.as_path()));
        layers.push((LayerCategory::Mouth, self.mouth.as_path()));
        layers.push((LayerCategory::Lines, self.lines.as_path()));
        if let Some(accessory) = &self.head_accessory {
            layers.push((LayerCategory::HeadAccessory, accessory.as_path()));
        }
        layers
    }
}

fn is_png(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|n| n.starts_with('.'));
    !hidden
        && path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// 目录中的 PNG 文件，按路径排序以便固定种子可复现
fn list_pngs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_png(path))
        .collect();
    files.sort();
    Ok(files)
}

fn list_subdirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn pick_required<R: Rng + ?Sized>(
    dir: &Path,
    category: LayerCategory,
    rng: &mut R,
) -> Result<PathBuf> {
    let files = list_pngs(dir).map_err(|e| {
        AppError::AssetMissing(format!(
            "cannot read {} directory {}: {}",
            category.label(),
            dir.display(),
            e
        ))
    })?;

    files.choose(rng).cloned().ok_or_else(|| {
        AppError::AssetMissing(format!(
            "no PNG files found for {} in {}",
            category.label(),
            dir.display()
        ))
    })
}

/// 先随机选一个子目录，再在其中随机选一个文件；任一步为空则不选
fn pick_nested<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> Option<PathBuf> {
    let categories = match list_subdirs(dir) {
        Ok(categories) => categories,
        Err(e) => {
            debug!("Optional layer directory {} unavailable: {}", dir.display(), e);
            return None;
        }
    };

    let category = categories.choose(rng)?;
    match list_pngs(category) {
        Ok(files) => files.choose(rng).cloned(),
        Err(e) => {
            warn!("Failed to list {}: {}", category.display(), e);
            None
        }
    }
}
