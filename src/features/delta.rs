//! Delta and delta-delta features.
//!
//! First and second time-derivatives of a per-frame coefficient sequence,
//! estimated with a Savitzky-Golay filter: a least-squares polynomial fit
//! over a sliding window, differentiated at the window center. Edge frames
//! are handled by fitting the polynomial to the first/last full window and
//! evaluating its derivative at the edge positions, matching the estimator
//! used when the classifier was trained.

/// Default Savitzky-Golay window width
pub const DEFAULT_WIDTH: usize = 9;

/// Compute the `order`-th derivative of each coefficient row across frames.
///
/// `data` is coefficient-major (`data[c][t]`); `order` is 1 for delta,
/// 2 for delta-delta. The fit uses a polynomial of degree `order`.
pub fn delta(data: &[Vec<f32>], width: usize, order: usize) -> Vec<Vec<f32>> {
    data.iter()
        .map(|row| savgol_derivative(row, width, order))
        .collect()
}

/// Savitzky-Golay derivative of a single sequence.
///
/// Sequences shorter than `width` fall back to the largest odd window that
/// fits; sequences shorter than 3 frames get a zero derivative.
fn savgol_derivative(y: &[f32], width: usize, order: usize) -> Vec<f32> {
    let n = y.len();
    if n < 3 {
        return vec![0.0; n];
    }

    let width = if n < width {
        // largest odd window <= n
        if n % 2 == 0 { n - 1 } else { n }
    } else {
        width
    };
    let half = width / 2;

    let mut out = vec![0.0f32; n];

    // Interior frames: fixed convolution weights centered in the window
    let center_weights = derivative_weights(width, order, half as f64);
    for t in half..n - half {
        let window = &y[t - half..t - half + width];
        out[t] = dot(&center_weights, window);
    }

    // Leading edge: polynomial over the first full window, derivative
    // evaluated at each edge position
    for t in 0..half {
        let weights = derivative_weights(width, order, t as f64);
        out[t] = dot(&weights, &y[..width]);
    }

    // Trailing edge: same with the last full window
    for t in n - half..n {
        let pos = t - (n - width);
        let weights = derivative_weights(width, order, pos as f64);
        out[t] = dot(&weights, &y[n - width..]);
    }

    out
}

fn dot(weights: &[f64], window: &[f32]) -> f32 {
    weights
        .iter()
        .zip(window.iter())
        .map(|(&w, &x)| w * x as f64)
        .sum::<f64>() as f32
}

/// Weights `w` such that the `deriv`-th derivative at `pos` of the
/// least-squares polynomial of degree `deriv` through points
/// `(0, y_0) .. (width-1, y_{width-1})` equals `w . y`.
fn derivative_weights(width: usize, deriv: usize, pos: f64) -> Vec<f64> {
    let degree = deriv;
    let n_coef = degree + 1;

    // Normal equations G a = A^T y with A[j][k] = j^k
    let mut gram = vec![vec![0.0f64; n_coef]; n_coef];
    for j in 0..width {
        for r in 0..n_coef {
            for c in 0..n_coef {
                gram[r][c] += (j as f64).powi(r as i32) * (j as f64).powi(c as i32);
            }
        }
    }

    // v_k = d^deriv/dx^deriv x^k evaluated at pos
    let mut v = vec![0.0f64; n_coef];
    for (k, vk) in v.iter_mut().enumerate() {
        if k >= deriv {
            let mut factor = 1.0;
            for i in 0..deriv {
                factor *= (k - i) as f64;
            }
            *vk = factor * pos.powi((k - deriv) as i32);
        }
    }

    // Solve G z = v, then w_j = sum_k z_k j^k
    let z = solve(gram, v);
    (0..width)
        .map(|j| {
            z.iter()
                .enumerate()
                .map(|(k, &zk)| zk * (j as f64).powi(k as i32))
                .sum()
        })
        .collect()
}

/// Gaussian elimination with partial pivoting for the small normal-equation
/// systems (at most 3x3)
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    x
}
