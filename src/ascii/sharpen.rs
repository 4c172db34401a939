//! Unsharp masking on the per-cell luminance grid.
//!
//! Averaging whole cells softens edges; pushing each cell away from its
//! 3x3 neighbourhood mean restores some of that contrast. Works on the grid,
//! never on source pixels.

/// Default unsharp strength.
pub const DEFAULT_UNSHARP_AMOUNT: f32 = 0.6;

/// 3x3 box blur. Edge cells average only their in-bounds neighbours.
/// A grid whose length doesn't match `columns * rows` comes back unchanged.
pub fn box_blur(cells: &[u8], columns: usize, rows: usize) -> Vec<u8> {
    if columns == 0 || rows == 0 || cells.len() != columns * rows {
        return cells.to_vec();
    }
    let mut out = vec![0u8; cells.len()];

    for r in 0..rows {
        let y_lo = r.saturating_sub(1);
        let y_hi = (r + 1).min(rows - 1);
        for c in 0..columns {
            let x_lo = c.saturating_sub(1);
            let x_hi = (c + 1).min(columns - 1);

            let mut sum = 0u32;
            let mut n = 0u32;
            for y in y_lo..=y_hi {
                for x in x_lo..=x_hi {
                    sum += cells[y * columns + x] as u32;
                    n += 1;
                }
            }
            out[r * columns + c] = (sum / n) as u8;
        }
    }

    out
}

/// Sharpen in place: `v + (v - blurred) * amount`, clamped to 0-255.
pub fn unsharp(cells: &mut [u8], columns: usize, rows: usize, amount: f32) {
    if columns == 0 || rows == 0 || cells.len() != columns * rows {
        return;
    }
    let amount = if amount.is_finite() { amount.clamp(0.0, 4.0) } else { 0.0 };
    if amount == 0.0 {
        return;
    }

    let blurred = box_blur(cells, columns, rows);
    for (v, &b) in cells.iter_mut().zip(blurred.iter()) {
        let cur = *v as i32;
        let delta = ((cur - b as i32) as f32 * amount) as i32;
        *v = (cur + delta).clamp(0, 255) as u8;
    }
}
