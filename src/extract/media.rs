//! Embedded media loading and size filtering.

use crate::model::ImageAsset;
use rayon::prelude::*;
use std::io::Cursor;

/// Pixel dimensions of an encoded image, if its header can be read.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Build assets for loaded media parts, probing dimensions in parallel.
///
/// Output order matches input order.
pub fn build_assets(parts: Vec<(String, Vec<u8>)>) -> Vec<ImageAsset> {
    parts
        .into_par_iter()
        .map(|(part, data)| {
            let dims = probe_dimensions(&data);
            let asset = ImageAsset::new(data, part);
            match dims {
                Some((w, h)) => asset.with_dimensions(w, h),
                None => asset,
            }
        })
        .collect()
}

/// Whether an asset passes the minimum-size filter, logging discards.
pub fn retain(asset: &ImageAsset, min_size: u32) -> bool {
    let keep = asset.meets_min_size(min_size);
    if !keep {
        log::debug!(
            "discarding {} ({}x{} below {}px)",
            asset.source_part,
            asset.width.unwrap_or(0),
            asset.height.unwrap_or(0),
            min_size
        );
    }
    keep
}

/// Format an image id from its 1-based ordinal.
pub fn image_id(ordinal: usize) -> String {
    format!("img_{:04}", ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_probe_png() {
        assert_eq!(probe_dimensions(&png(64, 32)), Some((64, 32)));
        assert_eq!(probe_dimensions(b"not an image"), None);
    }

    #[test]
    fn test_build_assets_keeps_order() {
        let assets = build_assets(vec![
            ("word/media/a.png".into(), png(10, 10)),
            ("word/media/b.emf".into(), vec![1, 0, 0, 0, 0, 0]),
            ("word/media/c.png".into(), png(80, 60)),
        ]);
        assert_eq!(assets[0].source_part, "word/media/a.png");
        assert_eq!(assets[1].width, None);
        assert_eq!((assets[2].width, assets[2].height), (Some(80), Some(60)));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at = ImageAsset::new(png(50, 50), "a.png").with_dimensions(50, 50);
        let one_side = ImageAsset::new(png(50, 49), "b.png").with_dimensions(50, 49);
        let below = ImageAsset::new(png(49, 49), "c.png").with_dimensions(49, 49);
        let unknown = ImageAsset::new(vec![0; 4], "d.emf");
        assert!(retain(&at, 50));
        assert!(retain(&one_side, 50));
        assert!(!retain(&below, 50));
        assert!(retain(&unknown, 50));
    }

    #[test]
    fn test_image_id() {
        assert_eq!(image_id(1), "img_0001");
        assert_eq!(image_id(42), "img_0042");
    }
}
