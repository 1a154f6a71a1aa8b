//! Crossover detection between two aligned series.

/// +1 when `a` crosses above `b` at `i`, -1 when it crosses below, else 0.
/// Index 0 and any undefined value among the four compared points give 0.
pub fn cross_at(a: &[Option<f64>], b: &[Option<f64>], i: usize) -> i8 {
    if i == 0 {
        return 0;
    }
    let values = (
        a.get(i - 1).copied().flatten(),
        b.get(i - 1).copied().flatten(),
        a.get(i).copied().flatten(),
        b.get(i).copied().flatten(),
    );
    let (Some(prev_a), Some(prev_b), Some(cur_a), Some(cur_b)) = values else {
        return 0;
    };

    if prev_a <= prev_b && cur_a > cur_b {
        1
    } else if prev_a >= prev_b && cur_a < cur_b {
        -1
    } else {
        0
    }
}

pub fn crossover(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<i8> {
    (0..a.len()).map(|i| cross_at(a, b, i)).collect()
}
