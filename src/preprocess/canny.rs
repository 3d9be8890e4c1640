//! Canny edge detection on grayscale planes.
//!
//! Gradients use 3x3 Sobel operators with replicated borders and the L1 norm
//! `|dx| + |dy|`. Non-maximum suppression quantizes the gradient direction into
//! four sectors; hysteresis keeps weak pixels 8-connected to a strong one.

use crate::image::OwnedImage;
use crate::util::math::replicate;

const TAN_22_5: f32 = 0.414_213_57;

/// Returns a 0/255 edge map of `gray` using `low`/`high` hysteresis thresholds.
///
/// The thresholds are swapped when given in the wrong order.
pub fn canny(gray: &OwnedImage, low: u8, high: u8) -> OwnedImage {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let width = gray.width();
    let height = gray.height();
    let (dx, dy) = sobel(gray);

    let mag: Vec<i32> = dx
        .iter()
        .zip(dy.iter())
        .map(|(gx, gy)| gx.abs() + gy.abs())
        .collect();
    let mag_at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0
        } else {
            mag[y as usize * width + x as usize]
        }
    };

    let low = i32::from(low);
    let high = i32::from(high);
    // 0 = suppressed, 1 = weak candidate, 2 = strong edge
    let mut state = vec![0u8; width * height];
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let m = mag[idx];
            if m <= low {
                continue;
            }
            let gx = dx[idx];
            let gy = dy[idx];
            let xs = gx.abs() as f32;
            let ys = gy.abs() as f32;
            let tg22x = xs * TAN_22_5;
            let (xi, yi) = (x as isize, y as isize);

            let is_max = if ys < tg22x {
                m > mag_at(xi - 1, yi) && m >= mag_at(xi + 1, yi)
            } else {
                let tg67x = tg22x + 2.0 * xs;
                if ys > tg67x {
                    m > mag_at(xi, yi - 1) && m >= mag_at(xi, yi + 1)
                } else {
                    let s: isize = if (gx ^ gy) < 0 { -1 } else { 1 };
                    m > mag_at(xi - s, yi - 1) && m > mag_at(xi + s, yi + 1)
                }
            };
            if !is_max {
                continue;
            }
            if m > high {
                state[idx] = 2;
                stack.push(idx);
            } else {
                state[idx] = 1;
            }
        }
    }

    while let Some(idx) = stack.pop() {
        let x = (idx % width) as isize;
        let y = (idx / width) as isize;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let nidx = ny as usize * width + nx as usize;
                if state[nidx] == 1 {
                    state[nidx] = 2;
                    stack.push(nidx);
                }
            }
        }
    }

    let data = state
        .into_iter()
        .map(|s| if s == 2 { 255 } else { 0 })
        .collect();
    OwnedImage::new(data, width, height).expect("edge map matches input geometry")
}

fn sobel(gray: &OwnedImage) -> (Vec<i32>, Vec<i32>) {
    let width = gray.width();
    let height = gray.height();
    let px = |x: isize, y: isize| -> i32 {
        i32::from(gray.at(replicate(x, width), replicate(y, height)))
    };

    let mut dx = vec![0i32; width * height];
    let mut dy = vec![0i32; width * height];
    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (x as isize, y as isize);
            let tl = px(xi - 1, yi - 1);
            let t = px(xi, yi - 1);
            let tr = px(xi + 1, yi - 1);
            let l = px(xi - 1, yi);
            let r = px(xi + 1, yi);
            let bl = px(xi - 1, yi + 1);
            let b = px(xi, yi + 1);
            let br = px(xi + 1, yi + 1);
            dx[y * width + x] = (tr + 2 * r + br) - (tl + 2 * l + bl);
            dy[y * width + x] = (bl + 2 * b + br) - (tl + 2 * t + tr);
        }
    }
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::canny;
    use crate::image::OwnedImage;

    fn step_image(level: u8) -> OwnedImage {
        let width = 12;
        let height = 8;
        let data = (0..width * height)
            .map(|i| if i % width < 6 { 0 } else { level })
            .collect();
        OwnedImage::new(data, width, height).unwrap()
    }

    #[test]
    fn vertical_step_yields_single_column_edge() {
        let edges = canny(&step_image(200), 50, 100);
        for y in 0..8 {
            let row: Vec<u8> = (0..12).map(|x| edges.at(x, y)).collect();
            assert_eq!(row.iter().filter(|&&v| v == 255).count(), 1, "row {y}: {row:?}");
            assert_eq!(row[5], 255);
        }
    }

    #[test]
    fn flat_image_has_no_edges() {
        let flat = OwnedImage::filled(10, 10, 77).unwrap();
        assert_eq!(canny(&flat, 10, 20).count_nonzero(), 0);
    }

    #[test]
    fn thresholds_above_gradient_suppress_everything() {
        // a step of 20 gives an L1 magnitude of 80
        assert_eq!(canny(&step_image(20), 100, 200).count_nonzero(), 0);
        assert_eq!(canny(&step_image(20), 200, 100).count_nonzero(), 0);
        assert_eq!(canny(&step_image(20), 40, 60).count_nonzero(), 8);
    }
}
