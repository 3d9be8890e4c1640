//! Suzuki-Abe topological border following.
//!
//! The mask is copied into a zero-padded `i32` label plane (0 background,
//! 1 unvisited foreground). Every border start found by the raster scan gets a
//! fresh sequential border number `nbd`; pixels on a traced border are relabeled
//! `nbd` or `-nbd` (when their east neighbor is background) so the scan never
//! starts the same border twice. The image frame itself is border 1, a hole.

use crate::image::ImageView;

/// Neighbor directions in counterclockwise screen order, starting east.
const DIRS: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const EAST: usize = 0;
const WEST: usize = 4;
const FRAME: usize = 1;

#[derive(Clone, Copy, Debug)]
struct BorderInfo {
    is_hole: bool,
    parent: usize,
}

/// Raw traced border in image coordinates.
#[derive(Clone, Debug)]
pub(crate) struct Border {
    pub(crate) points: Vec<(i32, i32)>,
    pub(crate) is_hole: bool,
    pub(crate) parent: usize,
}

impl Border {
    /// True for outer borders whose parent is the image frame.
    pub(crate) fn is_external(&self) -> bool {
        !self.is_hole && self.parent == FRAME
    }
}

struct LabelPlane {
    labels: Vec<i32>,
    stride: usize,
    offsets: [isize; 8],
}

impl LabelPlane {
    fn from_mask(mask: ImageView<'_, u8>) -> Self {
        let stride = mask.width() + 2;
        let rows = mask.height() + 2;
        let mut labels = vec![0i32; stride * rows];
        for y in 0..mask.height() {
            if let Some(row) = mask.row(y) {
                let base = (y + 1) * stride + 1;
                for (x, &v) in row.iter().enumerate() {
                    if v != 0 {
                        labels[base + x] = 1;
                    }
                }
            }
        }
        let mut offsets = [0isize; 8];
        for (slot, (dx, dy)) in offsets.iter_mut().zip(DIRS.iter()) {
            *slot = dy * stride as isize + dx;
        }
        Self {
            labels,
            stride,
            offsets,
        }
    }

    #[inline]
    fn neighbor(&self, idx: usize, dir: usize) -> usize {
        (idx as isize + self.offsets[dir]) as usize
    }

    fn to_point(&self, idx: usize) -> (i32, i32) {
        let x = (idx % self.stride) as i32 - 1;
        let y = (idx / self.stride) as i32 - 1;
        (x, y)
    }

    /// Traces one border starting at `start`, entering from direction `from`.
    fn follow(&mut self, start: usize, from: usize, nbd: i32, collect: bool) -> Vec<(i32, i32)> {
        let mut points = Vec::new();

        let mut first = None;
        for k in 0..8 {
            let dir = (from + 8 - k) % 8;
            if self.labels[self.neighbor(start, dir)] != 0 {
                first = Some(dir);
                break;
            }
        }
        let Some(first_dir) = first else {
            self.labels[start] = -nbd;
            if collect {
                points.push(self.to_point(start));
            }
            return points;
        };
        let last = self.neighbor(start, first_dir);

        let mut current = start;
        let mut back_dir = first_dir;
        loop {
            let mut east_is_background = false;
            let mut next_dir = back_dir;
            for k in 1..=8 {
                let dir = (back_dir + k) % 8;
                let value = self.labels[self.neighbor(current, dir)];
                if value == 0 {
                    if dir == EAST {
                        east_is_background = true;
                    }
                    continue;
                }
                next_dir = dir;
                break;
            }
            let next = self.neighbor(current, next_dir);

            if east_is_background {
                self.labels[current] = -nbd;
            } else if self.labels[current] == 1 {
                self.labels[current] = nbd;
            }
            if collect {
                points.push(self.to_point(current));
            }

            if next == start && current == last {
                break;
            }
            back_dir = (next_dir + 4) % 8;
            current = next;
        }

        points
    }
}

/// Follows every border of `mask` and returns those accepted by `keep`.
///
/// `keep` receives `(is_hole, parent)` before tracing so rejected borders are
/// relabeled without collecting their points.
pub(crate) fn follow_borders<F>(mask: ImageView<'_, u8>, keep: F) -> Vec<Border>
where
    F: Fn(bool, usize) -> bool,
{
    let mut plane = LabelPlane::from_mask(mask);
    let stride = plane.stride;
    let rows = mask.height() + 2;

    // index 0 is unused, index 1 is the frame
    let mut infos = vec![
        BorderInfo {
            is_hole: true,
            parent: 0,
        },
        BorderInfo {
            is_hole: true,
            parent: 0,
        },
    ];
    let mut borders = Vec::new();
    let mut nbd: i32 = 1;

    for row in 1..rows - 1 {
        let mut lnbd: usize = FRAME;
        for col in 1..stride - 1 {
            let idx = row * stride + col;
            let value = plane.labels[idx];
            if value == 0 {
                continue;
            }

            let start = if value == 1 && plane.labels[idx - 1] == 0 {
                Some((WEST, false))
            } else if value >= 1 && plane.labels[idx + 1] == 0 {
                if value > 1 {
                    lnbd = value as usize;
                }
                Some((EAST, true))
            } else {
                None
            };

            if let Some((from, is_hole)) = start {
                nbd += 1;
                let prior = infos[lnbd];
                let parent = match (is_hole, prior.is_hole) {
                    (false, false) | (true, true) => prior.parent,
                    (false, true) | (true, false) => lnbd,
                };
                infos.push(BorderInfo { is_hole, parent });

                let collect = keep(is_hole, parent);
                let points = plane.follow(idx, from, nbd, collect);
                if collect {
                    borders.push(Border {
                        points,
                        is_hole,
                        parent,
                    });
                }
            }

            let value = plane.labels[idx];
            if value != 1 {
                lnbd = value.unsigned_abs() as usize;
            }
        }
    }

    borders
}

/// Follows borders and keeps only the outer borders of top-level regions.
pub(crate) fn follow_external_borders(mask: ImageView<'_, u8>) -> Vec<Border> {
    follow_borders(mask, |is_hole, parent| !is_hole && parent == FRAME)
}
