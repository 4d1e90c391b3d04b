use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

pub type Matrix = Vec<Vec<f32>>;

pub fn zeros(rows: usize, cols: usize) -> Matrix {
    vec![vec![0.0; cols]; rows]
}

/// positive-random initialization, matching the teacher's hash-seeded
/// `SmallRng::seed_from_u64` idiom (`workers/worker.rs::rng`).
pub fn positive_random(rows: usize, cols: usize, seed: u64) -> Matrix {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.random_range(0.1..1.0)).collect())
        .collect()
}

pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
    let rows = a.len();
    let inner = if rows == 0 { 0 } else { a[0].len() };
    let cols = if b.is_empty() { 0 } else { b[0].len() };
    let mut out = zeros(rows, cols);
    for i in 0..rows {
        for k in 0..inner {
            let aik = a[i][k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..cols {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

pub fn transpose(a: &Matrix) -> Matrix {
    if a.is_empty() {
        return Vec::new();
    }
    let rows = a.len();
    let cols = a[0].len();
    let mut out = zeros(cols, rows);
    for i in 0..rows {
        for j in 0..cols {
            out[j][i] = a[i][j];
        }
    }
    out
}

pub fn hadamard_div(a: &Matrix, num: &Matrix, den: &Matrix, eps: f32) -> Matrix {
    a.iter()
        .zip(num.iter())
        .zip(den.iter())
        .map(|((a_row, n_row), d_row)| {
            a_row
                .iter()
                .zip(n_row.iter())
                .zip(d_row.iter())
                .map(|((a, n), d)| a * n / (d + eps))
                .collect()
        })
        .collect()
}
