//! Remeshing and displacement parameters.
//!
//! Four scalars, valid only together:
//!
//! ```text
//!   0 < minEdgeLength <= maxEdgeLength / 2
//!   dMove <= (dThickness - maxEdgeLength / sqrt(3)) / 2
//! ```
//!
//! The first keeps collapse and split from undoing each other: halves of a
//! split edge are never short, and a collapse never starts from a long edge.
//! The second bounds one deformation step by the thickness of the surface
//! layer, so a displaced shell cannot pass through its neighbour.

use sculpt_config::SculptConfig;
use tracing::warn;

/// Why a parameter set was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("parameters must be finite")]
    NotFinite,
    #[error("minEdgeLength {0} must be positive")]
    NonPositiveMinEdge(f32),
    #[error("minEdgeLength {min} exceeds maxEdgeLength / 2 = {half_max}")]
    MinAboveHalfMax { min: f32, half_max: f32 },
    #[error("dMove {d_move} exceeds the non-intersection bound {bound}")]
    DisplacementTooLarge { d_move: f32, bound: f32 },
}

/// Validated remeshing parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Parameters {
    min_edge_length: f32,
    max_edge_length: f32,
    d_move: f32,
    d_thickness: f32,
}

impl Parameters {
    /// Build a parameter set, or report which constraint fails.
    pub fn new(
        min_edge_length: f32,
        max_edge_length: f32,
        d_move: f32,
        d_thickness: f32,
    ) -> Result<Self, ParameterError> {
        Self::check(min_edge_length, max_edge_length, d_move, d_thickness)?;
        Ok(Self {
            min_edge_length,
            max_edge_length,
            d_move,
            d_thickness,
        })
    }

    /// The all-zero set. Never [`valid`](Self::valid).
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Replace all four values at once. On failure nothing changes.
    pub fn set(
        &mut self,
        min_edge_length: f32,
        max_edge_length: f32,
        d_move: f32,
        d_thickness: f32,
    ) -> Result<(), ParameterError> {
        match Self::new(min_edge_length, max_edge_length, d_move, d_thickness) {
            Ok(params) => {
                *self = params;
                Ok(())
            }
            Err(err) => {
                warn!("Parameters::set: rejected ({}), keeping {:?}", err, self);
                Err(err)
            }
        }
    }

    /// The joint predicate, with the failing constraint as the error.
    pub fn check(
        min_edge_length: f32,
        max_edge_length: f32,
        d_move: f32,
        d_thickness: f32,
    ) -> Result<(), ParameterError> {
        if ![min_edge_length, max_edge_length, d_move, d_thickness]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ParameterError::NotFinite);
        }
        if min_edge_length <= 0.0 {
            return Err(ParameterError::NonPositiveMinEdge(min_edge_length));
        }
        let half_max = max_edge_length / 2.0;
        if min_edge_length > half_max {
            return Err(ParameterError::MinAboveHalfMax {
                min: min_edge_length,
                half_max,
            });
        }
        let bound = displacement_bound(max_edge_length, d_thickness);
        if d_move > bound {
            return Err(ParameterError::DisplacementTooLarge { d_move, bound });
        }
        Ok(())
    }

    /// Re-evaluate the predicate on the current values.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`valid`](Self::valid), with the reason.
    pub fn validate(&self) -> Result<(), ParameterError> {
        Self::check(
            self.min_edge_length,
            self.max_edge_length,
            self.d_move,
            self.d_thickness,
        )
    }

    /// Derive a parameter set from a mesh's average edge length.
    ///
    /// `max = L * max_edge_ratio`, `min = L * min_edge_ratio`,
    /// `dThickness = max * thickness_ratio`, and `dMove` takes
    /// `displacement_fraction` of the largest value the bound allows.
    pub fn from_average_edge_length(
        average_edge_length: f32,
        config: &SculptConfig,
    ) -> Result<Self, ParameterError> {
        let max_edge_length = average_edge_length * config.max_edge_ratio;
        let min_edge_length = average_edge_length * config.min_edge_ratio;
        let d_thickness = max_edge_length * config.thickness_ratio;
        let d_move =
            displacement_bound(max_edge_length, d_thickness) * config.displacement_fraction;
        Self::new(min_edge_length, max_edge_length, d_move, d_thickness)
    }

    pub fn min_edge_length(&self) -> f32 {
        self.min_edge_length
    }

    pub fn max_edge_length(&self) -> f32 {
        self.max_edge_length
    }

    /// Largest displacement of one deformation step
    pub fn d_move(&self) -> f32 {
        self.d_move
    }

    pub fn d_thickness(&self) -> f32 {
        self.d_thickness
    }
}

/// `(dThickness - maxEdgeLength / sqrt(3)) / 2`
pub fn displacement_bound(max_edge_length: f32, d_thickness: f32) -> f32 {
    (d_thickness - max_edge_length / 3.0_f32.sqrt()) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_parameters() {
        let params = Parameters::new(0.5, 1.0, 0.1, 1.0).unwrap();
        assert!(params.valid());
        assert_eq!(params.min_edge_length(), 0.5);
        assert_eq!(params.max_edge_length(), 1.0);
        assert_eq!(params.d_move(), 0.1);
        assert_eq!(params.d_thickness(), 1.0);
    }

    #[test]
    fn test_min_must_be_positive() {
        assert_eq!(
            Parameters::new(0.0, 1.0, 0.1, 1.0),
            Err(ParameterError::NonPositiveMinEdge(0.0))
        );
    }

    #[test]
    fn test_min_bounded_by_half_max() {
        assert!(matches!(
            Parameters::new(0.6, 1.0, 0.1, 1.0),
            Err(ParameterError::MinAboveHalfMax { .. })
        ));
        // Exactly half is allowed
        assert!(Parameters::new(0.5, 1.0, 0.1, 1.0).is_ok());
    }

    #[test]
    fn test_displacement_bound() {
        // bound = (1 - 1/sqrt(3)) / 2 ~= 0.2113
        assert!(Parameters::new(0.5, 1.0, 0.21, 1.0).is_ok());
        assert!(matches!(
            Parameters::new(0.5, 1.0, 0.22, 1.0),
            Err(ParameterError::DisplacementTooLarge { .. })
        ));
    }

    #[test]
    fn test_predicate_matches_definition() {
        let samples = [0.0_f32, 0.1, 0.3, 0.5, 0.7, 1.0, 2.0, -0.2];
        for &min in &samples {
            for &max in &samples {
                for &d_move in &samples {
                    for &d_thickness in &samples {
                        let expected = 0.0 < min
                            && min <= max / 2.0
                            && d_move <= (d_thickness - max / 3.0_f32.sqrt()) / 2.0;
                        assert_eq!(
                            Parameters::check(min, max, d_move, d_thickness).is_ok(),
                            expected,
                            "min={min} max={max} d_move={d_move} d_thickness={d_thickness}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_failed_set_keeps_previous() {
        let mut params = Parameters::new(0.5, 1.0, 0.1, 1.0).unwrap();
        let before = params;
        assert!(params.set(0.9, 1.0, 0.1, 1.0).is_err());
        assert_eq!(params, before);
        assert!(params.valid());

        assert!(params.set(0.25, 0.5, 0.05, 0.5).is_ok());
        assert_eq!(params.max_edge_length(), 0.5);
    }

    #[test]
    fn test_invalid_is_all_zero() {
        let params = Parameters::invalid();
        assert!(!params.valid());
        assert_eq!(params.min_edge_length(), 0.0);
        assert_eq!(params.d_move(), 0.0);
    }

    #[test]
    fn test_rejects_nan() {
        assert_eq!(
            Parameters::new(f32::NAN, 1.0, 0.1, 1.0),
            Err(ParameterError::NotFinite)
        );
    }

    #[test]
    fn test_derived_from_unit_edge_length() {
        let params = Parameters::from_average_edge_length(1.0, &SculptConfig::default()).unwrap();
        assert!((params.min_edge_length() - 0.5).abs() < 1e-6);
        assert!((params.max_edge_length() - 1.0).abs() < 1e-6);
        assert!(params.d_move() > 0.0);
        assert!(params.d_move() <= displacement_bound(1.0, params.d_thickness()));
        assert!(params.valid());
    }

    #[test]
    fn test_derivation_scales_with_edge_length() {
        let config = SculptConfig::default();
        let small = Parameters::from_average_edge_length(0.1, &config).unwrap();
        let large = Parameters::from_average_edge_length(10.0, &config).unwrap();
        assert!((large.d_move() / small.d_move() - 100.0).abs() < 1e-2);
        assert!(Parameters::from_average_edge_length(0.0, &config).is_err());
    }
}
