/// Integer offsets covered by a disc of the given radius, centre included.
/// Ordered row by row so accumulation over the disc is deterministic.
pub fn rasterized_circle(radius: i32) -> Vec<(i32, i32)> {
    let r = radius.max(0);
    let r2 = r * r;
    let mut cells = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r2 {
                cells.push((dx, dy));
            }
        }
    }
    cells
}

/// Same as [`rasterized_circle`] but with a fractional radius, for pad
/// diameters that do not land on whole grid cells.
pub fn rasterized_circle_f(radius: f64) -> Vec<(i32, i32)> {
    let r = radius.max(0.0);
    let bound = r.floor() as i32;
    let mut cells = Vec::new();
    for dy in -bound..=bound {
        for dx in -bound..=bound {
            if ((dx * dx + dy * dy) as f64) <= r * r {
                cells.push((dx, dy));
            }
        }
    }
    cells
}

/// Offsets of an axis-aligned rectangle with the given half extents.
pub fn rasterized_rect(half_w: i32, half_h: i32) -> Vec<(i32, i32)> {
    let (hw, hh) = (half_w.max(0), half_h.max(0));
    let mut cells = Vec::with_capacity(((2 * hw + 1) * (2 * hh + 1)) as usize);
    for dy in -hh..=hh {
        for dx in -hw..=hw {
            cells.push((dx, dy));
        }
    }
    cells
}

/// Grows a set of offsets by `inflate` cells in every direction (square dilation).
pub fn inflate_offsets(offsets: &[(i32, i32)], inflate: i32) -> Vec<(i32, i32)> {
    if inflate <= 0 {
        return offsets.to_vec();
    }
    let mut out: Vec<(i32, i32)> = offsets
        .iter()
        .flat_map(|&(x, y)| {
            (-inflate..=inflate)
                .flat_map(move |dy| (-inflate..=inflate).map(move |dx| (x + dx, y + dy)))
        })
        .collect();
    out.sort_by_key(|&(x, y)| (y, x));
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_radius_is_single_cell() {
        assert_eq!(rasterized_circle(0), vec![(0, 0)]);
        assert_eq!(rasterized_circle(-3), vec![(0, 0)]);
    }

    #[test]
    fn radius_one_is_plus_shape() {
        let c = rasterized_circle(1);
        assert_eq!(c.len(), 5);
        assert!(c.contains(&(0, -1)) && c.contains(&(1, 0)));
        assert!(!c.contains(&(1, 1)));
    }

    #[test]
    fn radius_two_has_thirteen_cells() {
        assert_eq!(rasterized_circle(2).len(), 13);
    }

    #[test]
    fn fractional_radius_includes_diagonals_past_sqrt2() {
        assert_eq!(rasterized_circle_f(1.5).len(), 9);
        assert_eq!(rasterized_circle_f(0.4), vec![(0, 0)]);
    }

    #[test]
    fn inflate_dedups_overlap() {
        let grown = inflate_offsets(&[(0, 0), (1, 0)], 1);
        assert_eq!(grown.len(), 12);
        assert_eq!(inflate_offsets(&rasterized_rect(1, 0), 0).len(), 3);
    }
}
