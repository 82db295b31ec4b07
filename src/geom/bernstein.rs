//! Binomial coefficients for Bernstein bases up to degree 9.

/// Number of rows in [`BERNSTEIN_TABLE`]; also the largest supported control
/// grid dimension.
pub const MAX_BASIS_SIZE: usize = 10;

/// Highest polynomial degree covered by the table.
pub const MAX_DEGREE: usize = MAX_BASIS_SIZE - 1;

/// Pascal's triangle: `BERNSTEIN_TABLE[n][k] == C(n, k)` for `k <= n`, zero above
/// the diagonal.
pub const BERNSTEIN_TABLE: [[u32; MAX_BASIS_SIZE]; MAX_BASIS_SIZE] = [
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 2, 1, 0, 0, 0, 0, 0, 0, 0],
    [1, 3, 3, 1, 0, 0, 0, 0, 0, 0],
    [1, 4, 6, 4, 1, 0, 0, 0, 0, 0],
    [1, 5, 10, 10, 5, 1, 0, 0, 0, 0],
    [1, 6, 15, 20, 15, 6, 1, 0, 0, 0],
    [1, 7, 21, 35, 35, 21, 7, 1, 0, 0],
    [1, 8, 28, 56, 70, 56, 28, 8, 1, 0],
    [1, 9, 36, 84, 126, 126, 84, 36, 9, 1],
];

/// Returns `C(n, k)` for `k <= n <= 9`.
///
/// Callers outside that domain get whatever the table holds (zero for `k > n`)
/// or a panic for `n > 9`; the evaluator never asks for either.
#[must_use]
pub const fn coefficient(n: usize, k: usize) -> u32 {
    BERNSTEIN_TABLE[n][k]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binomial(n: u32, k: u32) -> u32 {
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn table_matches_binomial_formula() {
        for n in 0..MAX_BASIS_SIZE {
            for k in 0..=n {
                assert_eq!(
                    coefficient(n, k),
                    binomial(n as u32, k as u32),
                    "C({n}, {k})"
                );
            }
        }
    }

    #[test]
    fn rows_sum_to_powers_of_two() {
        for (n, row) in BERNSTEIN_TABLE.iter().enumerate() {
            let sum: u32 = row.iter().sum();
            assert_eq!(sum, 1 << n);
        }
    }

    #[test]
    fn entries_above_diagonal_are_zero() {
        for n in 0..MAX_BASIS_SIZE {
            for k in (n + 1)..MAX_BASIS_SIZE {
                assert_eq!(coefficient(n, k), 0);
            }
        }
    }
}
