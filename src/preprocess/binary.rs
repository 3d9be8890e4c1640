//! Grayscale conversion and band thresholding.

use crate::image::{ColorImage, OwnedImage};

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

/// Converts RGB to luma with fixed-point `0.299 R + 0.587 G + 0.114 B`.
pub fn to_gray(src: &ColorImage) -> OwnedImage {
    let data = src
        .data()
        .chunks_exact(ColorImage::CHANNELS)
        .map(|px| {
            let y = u32::from(px[0]) * GRAY_R
                + u32::from(px[1]) * GRAY_G
                + u32::from(px[2]) * GRAY_B
                + (1 << (GRAY_SHIFT - 1));
            (y >> GRAY_SHIFT) as u8
        })
        .collect();
    OwnedImage::new(data, src.width(), src.height()).expect("gray output matches input geometry")
}

/// Foreground where `lower < v <= upper`.
pub fn band(gray: &OwnedImage, lower: u8, upper: u8) -> OwnedImage {
    threshold_with(gray, |v| v > lower && v <= upper)
}

/// Foreground where `v <= lower` or `v > upper`.
pub fn band_inverted(gray: &OwnedImage, lower: u8, upper: u8) -> OwnedImage {
    threshold_with(gray, |v| !(v > lower && v <= upper))
}

fn threshold_with<F: Fn(u8) -> bool>(gray: &OwnedImage, keep: F) -> OwnedImage {
    let data = gray
        .data()
        .iter()
        .map(|&v| if keep(v) { 255 } else { 0 })
        .collect();
    OwnedImage::new(data, gray.width(), gray.height()).expect("mask matches input geometry")
}

#[cfg(test)]
mod tests {
    use super::{band, band_inverted, to_gray};
    use crate::image::{ColorImage, OwnedImage};

    #[test]
    fn gray_matches_luma_weights() {
        let img = ColorImage::from_fn(3, 1, |x, _| match x {
            0 => [255, 0, 0],
            1 => [0, 255, 0],
            _ => [255, 255, 255],
        })
        .unwrap();
        assert_eq!(to_gray(&img).data(), &[76, 150, 255]);
    }

    #[test]
    fn band_uses_exclusive_lower_and_inclusive_upper() {
        let gray = OwnedImage::new(vec![10, 11, 200, 201], 4, 1).unwrap();
        assert_eq!(band(&gray, 10, 200).data(), &[0, 255, 255, 0]);
        assert_eq!(band_inverted(&gray, 10, 200).data(), &[255, 0, 0, 255]);
    }
}
