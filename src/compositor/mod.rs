//! 素材合成模块
//!
//! 从固定目录布局中随机挑选透明 PNG 图层（底色、花纹、眼睛、嘴巴、线稿、头饰），
//! 按固定顺序叠加成一张猫咪肖像。每次调用都重新扫描目录并重新渲染。

pub mod render;
pub mod selection;

use rand::Rng;
use std::path::PathBuf;

use crate::config::AssetConfig;
use crate::error::Result;

pub use render::{encode_png, flatten, render_png};
pub use selection::{AssetLayout, LayerCategory, LayerSelection};

/// 猫咪肖像合成器
#[derive(Debug, Clone)]
pub struct CatCompositor {
    layout: AssetLayout,
    debug_dir: Option<PathBuf>,
}

impl CatCompositor {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            layout: AssetLayout::from_config(config),
            debug_dir: config.debug_dir.clone(),
        }
    }

    /// 随机挑选并合成一张 PNG
    pub fn compose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<u8>> {
        let selection = self.layout.select(rng)?;
        render_png(&selection, self.debug_dir.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const WIDTH: u32 = 6;

    /// 第 `position` 层从第 `position` 列开始不透明，其余透明；
    /// 顺序正确时第 i 列恰好显示第 i 层的颜色。
    fn staircase_layer(position: u32, color: [u8; 3]) -> RgbaImage {
        RgbaImage::from_fn(WIDTH, 1, |x, _| {
            if x >= position {
                Rgba([color[0], color[1], color[2], 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    fn color_for(category: LayerCategory) -> [u8; 3] {
        match category {
            LayerCategory::BaseColor => [200, 10, 10],
            LayerCategory::FurPattern => [10, 200, 10],
            LayerCategory::Eyes => [10, 10, 200],
            LayerCategory::Mouth => [200, 200, 10],
            LayerCategory::Lines => [10, 200, 200],
            LayerCategory::HeadAccessory => [200, 10, 200],
        }
    }

    fn write_png(path: &Path, image: &RgbaImage) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        image.save(path).unwrap();
    }

    fn fixture(with_pattern: bool, with_accessory: bool) -> (TempDir, LayerSelection) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let mut position = 0;
        let mut layer = |category: LayerCategory, rel: &str| {
            let path = root.join(rel);
            write_png(&path, &staircase_layer(position, color_for(category)));
            position += 1;
            path
        };

        let base_color = layer(LayerCategory::BaseColor, "base/orange.png");
        let fur_pattern = with_pattern.then(|| layer(LayerCategory::FurPattern, "patterns/stripes/a.png"));
        let eyes = layer(LayerCategory::Eyes, "eyes/green.png");
        let mouth = layer(LayerCategory::Mouth, "mouth/smile.png");
        let lines = layer(LayerCategory::Lines, "lines/lines.png");
        let head_accessory = with_accessory.then(|| layer(LayerCategory::HeadAccessory, "accs/hats/top.png"));

        let selection = LayerSelection {
            base_color,
            fur_pattern,
            eyes,
            mouth,
            lines,
            head_accessory,
        };
        (dir, selection)
    }

    fn assert_layer_order(selection: &LayerSelection) {
        let canvas = flatten(selection).unwrap();
        for (column, (category, _)) in selection.layers().iter().enumerate() {
            let pixel = canvas.get_pixel(column as u32, 0);
            let [r, g, b] = color_for(*category);
            assert_eq!(pixel.0, [r, g, b, 255], "column {column} should show {}", category.label());
        }
    }

    #[test]
    fn test_layer_order_all_layers() {
        let (_dir, selection) = fixture(true, true);
        let order: Vec<_> = selection.layers().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                LayerCategory::BaseColor,
                LayerCategory::FurPattern,
                LayerCategory::Eyes,
                LayerCategory::Mouth,
                LayerCategory::Lines,
                LayerCategory::HeadAccessory,
            ]
        );
        assert_layer_order(&selection);
    }

    #[test]
    fn test_layer_order_without_optional_layers() {
        let (_dir, selection) = fixture(false, false);
        assert_eq!(selection.layers().len(), 4);
        assert_layer_order(&selection);
    }

    #[test]
    fn test_semi_transparent_layer_blends_over() {
        let dir = TempDir::new().unwrap();
        let solid = |rgba: [u8; 4]| RgbaImage::from_pixel(1, 1, Rgba(rgba));
        let base = dir.path().join("base.png");
        write_png(&base, &solid([0, 0, 0, 255]));
        let half = dir.path().join("half.png");
        write_png(&half, &solid([255, 255, 255, 128]));
        let clear = dir.path().join("clear.png");
        write_png(&clear, &solid([0, 0, 0, 0]));

        let selection = LayerSelection {
            base_color: base,
            fur_pattern: None,
            eyes: half,
            mouth: clear.clone(),
            lines: clear,
            head_accessory: None,
        };
        let pixel = *flatten(&selection).unwrap().get_pixel(0, 0);
        assert!(pixel.0[0] > 100 && pixel.0[0] < 160, "got {:?}", pixel);
        assert_eq!(pixel.0[3], 255);
    }

    fn asset_tree(root: &Path) -> AssetConfig {
        let one_px = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        for rel in [
            "base/a.png",
            "base/b.png",
            "eyes/a.png",
            "mouth/a.png",
            "lines/lines.png",
            "patterns/spots/a.png",
            "patterns/stripes/a.png",
            "accs/hats/a.png",
            "accs/bows/a.png",
        ] {
            write_png(&root.join(rel), &one_px);
        }
        fs::write(root.join("base/.hidden.png"), b"not a png").unwrap();
        fs::write(root.join("base/readme.txt"), b"ignored").unwrap();

        AssetConfig {
            root: root.to_path_buf(),
            base_colors: "base".into(),
            eyes: "eyes".into(),
            mouths: "mouth".into(),
            lines: "lines".into(),
            patterns: "patterns".into(),
            accessories: "accs".into(),
            accessory_probability: 0.8,
            debug_dir: None,
        }
    }

    #[test]
    fn test_accessory_frequency_near_eighty_percent() {
        let dir = TempDir::new().unwrap();
        let layout = AssetLayout::from_config(&asset_tree(dir.path()));
        let mut rng = StdRng::seed_from_u64(7);

        let runs = 1000;
        let with_accessory = (0..runs)
            .filter(|_| layout.select(&mut rng).unwrap().head_accessory.is_some())
            .count();
        assert!(
            (750..=850).contains(&with_accessory),
            "accessory present in {with_accessory}/{runs} generations"
        );
    }

    #[test]
    fn test_selection_skips_hidden_and_non_png() {
        let dir = TempDir::new().unwrap();
        let layout = AssetLayout::from_config(&asset_tree(dir.path()));
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let selection = layout.select(&mut rng).unwrap();
            let name = selection.base_color.file_name().unwrap().to_str().unwrap();
            assert!(name == "a.png" || name == "b.png");
            assert!(selection.fur_pattern.is_some());
        }
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let layout = AssetLayout::from_config(&asset_tree(dir.path()));
        let first = layout.select(&mut StdRng::seed_from_u64(99)).unwrap();
        let second = layout.select(&mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_mandatory_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = asset_tree(dir.path());
        fs::remove_dir_all(dir.path().join("eyes")).unwrap();
        fs::create_dir_all(dir.path().join("eyes")).unwrap();

        let compositor = CatCompositor::new(&config);
        let err = compositor.compose(&mut StdRng::seed_from_u64(3)).unwrap_err();
        assert!(matches!(err, crate::error::AppError::AssetMissing(_)));

        config.eyes = "does-not-exist".into();
        let err = CatCompositor::new(&config)
            .compose(&mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::AssetMissing(_)));
    }

    #[test]
    fn test_optional_layers_absent_when_directories_missing() {
        let dir = TempDir::new().unwrap();
        let mut config = asset_tree(dir.path());
        config.patterns = "nope".into();
        config.accessory_probability = 1.0;
        config.accessories = "nope-either".into();

        let selection = AssetLayout::from_config(&config)
            .select(&mut StdRng::seed_from_u64(5))
            .unwrap();
        assert!(selection.fur_pattern.is_none());
        assert!(selection.head_accessory.is_none());
    }

    #[test]
    fn test_compose_produces_png_and_debug_snapshots() {
        let dir = TempDir::new().unwrap();
        let mut config = asset_tree(dir.path());
        let debug_dir = dir.path().join("debug");
        config.debug_dir = Some(debug_dir.clone());

        let png = CatCompositor::new(&config)
            .compose(&mut StdRng::seed_from_u64(11))
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert!(debug_dir.join("final-cat-image.png").exists());
        assert!(debug_dir.join("1-base-color.png").exists());
    }

    #[test]
    fn test_unreadable_layer_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let config = asset_tree(dir.path());
        fs::write(dir.path().join("mouth/a.png"), b"corrupt").unwrap();

        let err = CatCompositor::new(&config)
            .compose(&mut StdRng::seed_from_u64(2))
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::AssetMissing(_)));
    }
}
