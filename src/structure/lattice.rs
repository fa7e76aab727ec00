/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Lattice representation and lattice algebra
//!
//! A lattice is stored as a row-major 3×3 matrix: each row is one lattice
//! vector in Cartesian Ångström. Everything the pipeline needs lives here:
//! volume rescaling before a run, the integer scaling-matrix search used to
//! relate the mcsqs supercell back to the input cell, and a lattice-system
//! classification used as a symmetry label on assimilated records.

use nalgebra::{Matrix3, RowVector3};
use serde::{Deserialize, Serialize};

use super::errors::{Result, StructureError};

/// Angle tolerance (degrees) for the lattice-system classification.
const ANGLE_TOL: f64 = 1e-3;
/// Relative length tolerance for the lattice-system classification.
const LENGTH_TOL: f64 = 1e-5;

/// A crystal lattice: three row vectors in Cartesian coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl From<[[f64; 3]; 3]> for Lattice {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        Lattice::from_rows(rows)
    }
}

impl From<Lattice> for [[f64; 3]; 3] {
    fn from(lattice: Lattice) -> Self {
        lattice.rows()
    }
}

impl Lattice {
    /// Create a lattice from three row vectors.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        let matrix = Matrix3::from_rows(&[
            RowVector3::new(rows[0][0], rows[0][1], rows[0][2]),
            RowVector3::new(rows[1][0], rows[1][1], rows[1][2]),
            RowVector3::new(rows[2][0], rows[2][1], rows[2][2]),
        ]);
        Self { matrix }
    }

    /// Create a lattice from cell parameters (lengths in Å, angles in
    /// degrees), using the standard crystallographic orientation with `a`
    /// along x and `b` in the xy plane.
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        let (alpha_r, beta_r, gamma_r) = (
            alpha.to_radians(),
            beta.to_radians(),
            gamma.to_radians(),
        );
        let cx = c * beta_r.cos();
        let cy = c * (alpha_r.cos() - beta_r.cos() * gamma_r.cos()) / gamma_r.sin();
        let cz_sq = c * c - cx * cx - cy * cy;
        if cz_sq <= 0.0 || gamma_r.sin().abs() < 1e-12 {
            return Err(StructureError::InvalidLattice(format!(
                "cell parameters do not define a 3D cell: a={} b={} c={} alpha={} beta={} gamma={}",
                a, b, c, alpha, beta, gamma
            )));
        }
        Ok(Self::from_rows([
            [a, 0.0, 0.0],
            [b * gamma_r.cos(), b * gamma_r.sin(), 0.0],
            [cx, cy, cz_sq.sqrt()],
        ]))
    }

    /// The underlying row-major matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The three lattice vectors as rows.
    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Lengths of the three lattice vectors.
    pub fn abc(&self) -> [f64; 3] {
        [
            self.matrix.row(0).norm(),
            self.matrix.row(1).norm(),
            self.matrix.row(2).norm(),
        ]
    }

    /// Cell angles (alpha, beta, gamma) in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let [a, b, c] = self.abc();
        let ab = self.matrix.row(0).dot(&self.matrix.row(1));
        let ac = self.matrix.row(0).dot(&self.matrix.row(2));
        let bc = self.matrix.row(1).dot(&self.matrix.row(2));
        [
            (bc / (b * c)).clamp(-1.0, 1.0).acos().to_degrees(),
            (ac / (a * c)).clamp(-1.0, 1.0).acos().to_degrees(),
            (ab / (a * b)).clamp(-1.0, 1.0).acos().to_degrees(),
        ]
    }

    /// Cell volume in Å³.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Length of the shortest lattice vector.
    pub fn shortest_vector(&self) -> f64 {
        let [a, b, c] = self.abc();
        a.min(b).min(c)
    }

    /// A new lattice with the same shape, isotropically rescaled so the cell
    /// volume equals `volume`.
    pub fn scaled_to_volume(&self, volume: f64) -> Result<Self> {
        let current = self.volume();
        if current < 1e-12 {
            return Err(StructureError::InvalidLattice(
                "cannot rescale a degenerate lattice".to_string(),
            ));
        }
        if volume <= 0.0 {
            return Err(StructureError::InvalidLattice(format!(
                "target volume must be positive, got {}",
                volume
            )));
        }
        let factor = (volume / current).cbrt();
        Ok(Self {
            matrix: self.matrix * factor,
        })
    }

    /// Find the integer matrix `M` with `S = M · L`, where `L` is this
    /// lattice and `S` the supercell lattice.
    ///
    /// mcsqs emits its supercell in the same Cartesian frame as the input
    /// cell, so an exact solve followed by integer rounding is sufficient;
    /// `None` when the rounded solution misses by more than `tol` or the
    /// lattice is singular.
    pub fn scaling_matrix_to(&self, supercell: &Lattice, tol: f64) -> Option<[[i64; 3]; 3]> {
        let inverse = self.matrix.try_inverse()?;
        let m = supercell.matrix * inverse;
        let mut result = [[0i64; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                let entry = m[(i, j)];
                let rounded = entry.round();
                if (entry - rounded).abs() > tol {
                    return None;
                }
                result[i][j] = rounded as i64;
            }
        }
        Some(result)
    }

    /// Classify the cell into one of the seven lattice systems from its
    /// metric parameters.
    pub fn lattice_system(&self) -> &'static str {
        let [a, b, c] = self.abc();
        let [alpha, beta, gamma] = self.angles();
        let scale = a.max(b).max(c);
        let len_eq = |x: f64, y: f64| (x - y).abs() < LENGTH_TOL * scale;
        let ang_eq = |x: f64, y: f64| (x - y).abs() < ANGLE_TOL;

        let all_right = ang_eq(alpha, 90.0) && ang_eq(beta, 90.0) && ang_eq(gamma, 90.0);

        if all_right {
            if len_eq(a, b) && len_eq(b, c) {
                "cubic"
            } else if len_eq(a, b) || len_eq(b, c) || len_eq(a, c) {
                "tetragonal"
            } else {
                "orthorhombic"
            }
        } else if len_eq(a, b) && ang_eq(alpha, 90.0) && ang_eq(beta, 90.0) && ang_eq(gamma, 120.0)
        {
            "hexagonal"
        } else if len_eq(a, b)
            && len_eq(b, c)
            && ang_eq(alpha, beta)
            && ang_eq(beta, gamma)
        {
            "rhombohedral"
        } else if (ang_eq(alpha, 90.0) && ang_eq(gamma, 90.0))
            || (ang_eq(alpha, 90.0) && ang_eq(beta, 90.0))
            || (ang_eq(beta, 90.0) && ang_eq(gamma, 90.0))
        {
            "monoclinic"
        } else {
            "triclinic"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cubic(a: f64) -> Lattice {
        Lattice::from_rows([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    #[test]
    fn test_abc_angles_volume() {
        let lattice = cubic(2.0);
        let [a, b, c] = lattice.abc();
        assert_relative_eq!(a, 2.0);
        assert_relative_eq!(b, 2.0);
        assert_relative_eq!(c, 2.0);
        for angle in lattice.angles() {
            assert_relative_eq!(angle, 90.0, epsilon = 1e-10);
        }
        assert_relative_eq!(lattice.volume(), 8.0);
        assert_relative_eq!(lattice.shortest_vector(), 2.0);
    }

    #[test]
    fn test_from_parameters_round_trip() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 80.0, 95.0, 110.0).unwrap();
        let [a, b, c] = lattice.abc();
        assert_relative_eq!(a, 3.0, epsilon = 1e-10);
        assert_relative_eq!(b, 4.0, epsilon = 1e-10);
        assert_relative_eq!(c, 5.0, epsilon = 1e-10);
        let [alpha, beta, gamma] = lattice.angles();
        assert_relative_eq!(alpha, 80.0, epsilon = 1e-8);
        assert_relative_eq!(beta, 95.0, epsilon = 1e-8);
        assert_relative_eq!(gamma, 110.0, epsilon = 1e-8);
    }

    #[test]
    fn test_from_parameters_rejects_flat_cell() {
        assert!(Lattice::from_parameters(3.0, 3.0, 3.0, 180.0, 90.0, 90.0).is_err());
    }

    #[test]
    fn test_scaled_to_volume() {
        let lattice = cubic(2.0);
        let unit = lattice.scaled_to_volume(1.0).unwrap();
        assert_relative_eq!(unit.volume(), 1.0, epsilon = 1e-12);
        // shape preserved
        for angle in unit.angles() {
            assert_relative_eq!(angle, 90.0, epsilon = 1e-10);
        }
        // original untouched
        assert_relative_eq!(lattice.volume(), 8.0);
    }

    #[test]
    fn test_scaling_matrix_exact_supercell() {
        let lattice = cubic(2.0);
        let supercell = Lattice::from_rows([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 2.0]]);
        let m = lattice.scaling_matrix_to(&supercell, 1e-4).unwrap();
        assert_eq!(m, [[2, 0, 0], [0, 2, 0], [0, 0, 1]]);
    }

    #[test]
    fn test_scaling_matrix_rejects_non_integer_mapping() {
        let lattice = cubic(2.0);
        let skewed = Lattice::from_rows([[3.1, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 2.0]]);
        assert!(lattice.scaling_matrix_to(&skewed, 1e-4).is_none());
    }

    #[test]
    fn test_lattice_system_classification() {
        assert_eq!(cubic(3.0).lattice_system(), "cubic");
        assert_eq!(
            Lattice::from_rows([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 5.0]])
                .lattice_system(),
            "tetragonal"
        );
        assert_eq!(
            Lattice::from_rows([[3.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 5.0]])
                .lattice_system(),
            "orthorhombic"
        );
        assert_eq!(
            Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0)
                .unwrap()
                .lattice_system(),
            "hexagonal"
        );
        assert_eq!(
            Lattice::from_parameters(3.0, 3.0, 3.0, 75.0, 75.0, 75.0)
                .unwrap()
                .lattice_system(),
            "rhombohedral"
        );
        assert_eq!(
            Lattice::from_parameters(3.0, 4.0, 5.0, 90.0, 100.0, 90.0)
                .unwrap()
                .lattice_system(),
            "monoclinic"
        );
        assert_eq!(
            Lattice::from_parameters(3.0, 4.0, 5.0, 80.0, 95.0, 110.0)
                .unwrap()
                .lattice_system(),
            "triclinic"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let lattice = Lattice::from_rows([[1.0, 0.5, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]]);
        let json = serde_json::to_string(&lattice).unwrap();
        let back: Lattice = serde_json::from_str(&json).unwrap();
        assert_eq!(lattice, back);
    }
}
