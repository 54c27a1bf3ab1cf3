//! Savitzky–Golay smoothing for plotted series.
//!
//! Interior points are the least-squares polynomial fit of their window,
//! evaluated at the window center. The first and last half-windows are
//! evaluated on the polynomial fitted to the first and last full window.

/// Smooth `y` with a window chosen by `factor` in `[0, 1]`.
///
/// `factor = 0` uses the smallest valid odd window (`poly_order + 1`, rounded
/// up to odd) and `factor = 1` the largest (`y.len()`, rounded down to odd).
/// Series too short for a valid window are returned unchanged.
pub fn savgol(y: &[f64], factor: f64, poly_order: usize) -> Vec<f64> {
    let Some(window) = window_size(y.len(), factor, poly_order) else {
        return y.to_vec();
    };
    let Some(weights) = center_weights(window, poly_order) else {
        return y.to_vec();
    };
    let (Some(head), Some(tail)) = (
        y.get(..window),
        y.len().checked_sub(window).and_then(|start| y.get(start..)),
    ) else {
        return y.to_vec();
    };
    let half = window / 2;

    let mut out = Vec::with_capacity(y.len());
    match fit(head, poly_order) {
        Some(poly) => out.extend((0..half).map(|i| poly.at(coord(i, half)))),
        None => out.extend_from_slice(&head[..half]),
    }
    out.extend(
        y.windows(window)
            .map(|w| w.iter().zip(&weights).map(|(v, c)| v * c).sum::<f64>()),
    );
    let tail_positions = (0..window).skip(half).skip(1);
    match fit(tail, poly_order) {
        Some(poly) => out.extend(tail_positions.map(|i| poly.at(coord(i, half)))),
        None => out.extend(tail_positions.filter_map(|i| tail.get(i).copied())),
    }
    out
}

fn ensure_odd(n: usize, round_up: bool) -> usize {
    match (n % 2 == 0, round_up) {
        (false, _) => n,
        (true, true) => n.saturating_add(1),
        (true, false) => n.saturating_sub(1),
    }
}

/// Odd window length for `len` samples, or `None` if no valid window exists.
pub fn window_size(len: usize, factor: f64, poly_order: usize) -> Option<usize> {
    let min = ensure_odd(poly_order.saturating_add(1), true);
    let max = ensure_odd(len, false);
    if min >= max {
        return None;
    }
    let span = max.checked_sub(min)?;
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )] // window lengths are small; the product is clamped to [0, span]
    let extra = (factor.clamp(0.0, 1.0) * span as f64).floor() as usize;
    Some(ensure_odd(min.checked_add(extra.min(span))?, false))
}

/// Position `i` of a window mapped to `[-1, 1]`.
fn coord(i: usize, half: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)] // window positions are small
    let (i, half) = (i as f64, half.max(1) as f64);
    (i - half) / half
}

fn powers(t: f64, order: usize) -> impl Iterator<Item = f64> {
    std::iter::successors(Some(1.0), move |p| Some(p * t)).take(order.saturating_add(1))
}

struct Polynomial(Vec<f64>);

impl Polynomial {
    fn at(&self, t: f64) -> f64 {
        self.0.iter().zip(powers(t, self.0.len())).map(|(c, p)| c * p).sum()
    }
}

fn normal_matrix(window: usize, poly_order: usize) -> Vec<Vec<f64>> {
    let half = window / 2;
    let terms = poly_order.saturating_add(1);
    let mut matrix = vec![vec![0.0; terms]; terms];
    for i in 0..window {
        let p: Vec<f64> = powers(coord(i, half), poly_order).collect();
        for (row, pa) in matrix.iter_mut().zip(&p) {
            for (cell, pb) in row.iter_mut().zip(&p) {
                *cell += pa * pb;
            }
        }
    }
    matrix
}

/// Least-squares polynomial through `values` on window coordinates.
fn fit(values: &[f64], poly_order: usize) -> Option<Polynomial> {
    let half = values.len() / 2;
    let mut rhs = vec![0.0; poly_order.saturating_add(1)];
    for (i, v) in values.iter().enumerate() {
        for (slot, p) in rhs.iter_mut().zip(powers(coord(i, half), poly_order)) {
            *slot += p * v;
        }
    }
    solve(normal_matrix(values.len(), poly_order), rhs).map(Polynomial)
}

/// Convolution weights giving the fitted value at the window center.
fn center_weights(window: usize, poly_order: usize) -> Option<Vec<f64>> {
    let mut unit = vec![0.0; poly_order.saturating_add(1)];
    *unit.first_mut()? = 1.0;
    let z = solve(normal_matrix(window, poly_order), unit)?;
    let half = window / 2;
    Some(
        (0..window)
            .map(|i| {
                z.iter()
                    .zip(powers(coord(i, half), poly_order))
                    .map(|(a, p)| a * p)
                    .sum()
            })
            .collect(),
    )
}

/// Gauss-Jordan elimination with partial pivoting; `None` if singular.
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot =
            (col..n).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col].abs() < 1e-12 {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);
        let pivot_row = matrix[col].clone();
        let pivot_rhs = rhs[col];
        for (row, (cells, value)) in matrix.iter_mut().zip(rhs.iter_mut()).enumerate() {
            if row == col {
                continue;
            }
            let f = cells[col] / pivot_row[col];
            for (cell, p) in cells.iter_mut().zip(&pivot_row) {
                *cell -= f * p;
            }
            *value -= f * pivot_rhs;
        }
    }
    Some(
        matrix
            .iter()
            .zip(&rhs)
            .enumerate()
            .map(|(i, (row, v))| v / row[i])
            .collect(),
    )
}
