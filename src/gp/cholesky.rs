use crate::error::GpError;
use crate::float_trait::Float;

use ndarray::{Array1, Array2, ArrayView1, s};

/// Lower-triangular Cholesky factor $L$ of a symmetric positive-definite matrix $A = L L^T$
#[derive(Clone, Debug)]
pub(crate) struct Cholesky<T> {
    l: Array2<T>,
}

impl<T> Cholesky<T>
where
    T: Float,
{
    /// Only the lower triangle of `a` is read
    pub(crate) fn new(mut a: Array2<T>) -> Result<Self, GpError> {
        let n = a.nrows();
        assert_eq!(n, a.ncols(), "matrix must be square");
        for j in 0..n {
            let diag = a[[j, j]] - {
                let row = a.slice(s![j, ..j]);
                row.dot(&row)
            };
            if !(diag > T::zero() && diag.is_finite()) {
                return Err(GpError::NotPositiveDefinite { row: j });
            }
            let diag = diag.sqrt();
            a[[j, j]] = diag;
            for i in (j + 1)..n {
                let value = a[[i, j]] - a.slice(s![i, ..j]).dot(&a.slice(s![j, ..j]));
                a[[i, j]] = value / diag;
            }
            a.slice_mut(s![j, (j + 1)..]).fill(T::zero());
        }
        Ok(Self { l: a })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.l.nrows()
    }

    /// Solves $L z = b$
    pub(crate) fn solve_lower(&self, b: ArrayView1<T>) -> Array1<T> {
        let n = self.len();
        let mut z = Array1::zeros(n);
        for i in 0..n {
            let value = b[i] - self.l.slice(s![i, ..i]).dot(&z.slice(s![..i]));
            z[i] = value / self.l[[i, i]];
        }
        z
    }

    /// Solves $A x = b$
    pub(crate) fn solve(&self, b: ArrayView1<T>) -> Array1<T> {
        let n = self.len();
        let mut x = self.solve_lower(b);
        for i in (0..n).rev() {
            let value = x[i] - self.l.slice(s![(i + 1).., i]).dot(&x.slice(s![(i + 1)..]));
            x[i] = value / self.l[[i, i]];
        }
        x
    }

    /// Gaussian log-likelihood of the first $k$ values of `m` for every $k$ in $0..=n$
    ///
    /// A leading principal submatrix of $A$ is factorized by the leading block of $L$, so all
    /// prefix likelihoods come from a single factorization: the $i$-th observation adds
    /// $-z_i^2/2 - \ln L_{ii} - \ln(2\pi)/2$ where $z = L^{-1} m$.
    pub(crate) fn prefix_ln_likelihoods(&self, m: ArrayView1<T>) -> Array1<T> {
        let half_ln_two_pi = T::half() * T::ln(T::two() * T::PI());
        let z = self.solve_lower(m);
        let mut acc = T::zero();
        std::iter::once(T::zero())
            .chain(z.iter().zip(self.l.diag()).map(|(&z, &l)| {
                acc -= T::half() * z * z + l.ln() + half_ln_two_pi;
                acc
            }))
            .collect()
    }

    pub(crate) fn ln_likelihood(&self, m: ArrayView1<T>) -> T {
        self.prefix_ln_likelihoods(m)[self.len()]
    }
}
