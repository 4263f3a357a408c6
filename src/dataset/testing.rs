//! Image-folder fixtures for tests

use std::path::Path;

use image::{ImageBuffer, Rgb};

/// Write `train/`, `valid/` and `test/` splits with classes "1" and "2",
/// two small generated PNGs per class.
pub(crate) fn make_dataset(root: &Path) {
    for split in ["train", "valid", "test"] {
        for (class, shade) in [("1", 30u8), ("2", 220u8)] {
            let dir = root.join(split).join(class);
            std::fs::create_dir_all(&dir).unwrap();
            for i in 0..2u8 {
                let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(80, 72, |x, y| {
                    Rgb([
                        shade,
                        shade.wrapping_add((x % 7) as u8),
                        (y as u8).wrapping_add(i * 9),
                    ])
                });
                img.save(dir.join(format!("{}.png", i))).unwrap();
            }
        }
    }
}
