//! Tests for preprocessing module.

use super::*;

fn column_stats(m: &Matrix<f32>, j: usize) -> (f32, f32) {
    let n = m.n_rows() as f32;
    let mean = (0..m.n_rows()).map(|i| m.get(i, j)).sum::<f32>() / n;
    let var = (0..m.n_rows())
        .map(|i| (m.get(i, j) - mean).powi(2))
        .sum::<f32>()
        / n;
    (mean, var)
}

#[test]
fn test_new_is_unfitted() {
    let scaler = StandardScaler::new();
    assert!(!scaler.is_fitted());
    assert!(scaler.mean().is_none());
    assert!(scaler.floored_features().is_empty());
}

#[test]
fn test_fit_basic() {
    let data = Matrix::from_vec(3, 2, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0])
        .expect("valid matrix dimensions");

    let mut scaler = StandardScaler::new();
    scaler.fit(&data).expect("fit should succeed with valid data");

    let mean = scaler.mean().expect("fitted");
    assert!((mean[0] - 2.0).abs() < 1e-6);
    assert!((mean[1] - 20.0).abs() < 1e-6);

    // Population std: sqrt(2/3)
    let std = scaler.std().expect("fitted");
    let expected_std = (2.0_f32 / 3.0).sqrt();
    assert!((std[0] - expected_std).abs() < 1e-4);
    assert!((std[1] - expected_std * 10.0).abs() < 1e-3);
}

#[test]
fn test_columns_have_zero_mean_unit_variance() {
    let data = Matrix::from_vec(
        5,
        3,
        vec![
            1.0, 500.0, -3.0, //
            4.0, 350.0, -1.0, //
            2.0, 900.0, 0.5, //
            8.0, 120.0, 2.0, //
            5.0, 610.0, 7.5,
        ],
    )
    .expect("valid matrix dimensions");

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&data).expect("fit_transform");

    for j in 0..3 {
        let (mean, var) = column_stats(&scaled, j);
        assert!(mean.abs() < 1e-5, "column {j} mean {mean}");
        assert!((var - 1.0).abs() < 1e-4, "column {j} variance {var}");
    }
}

#[test]
fn test_constant_column_is_floored_not_nan() {
    let data = Matrix::from_vec(4, 2, vec![1.0, 7.0, 2.0, 7.0, 3.0, 7.0, 4.0, 7.0])
        .expect("valid matrix dimensions");

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&data).expect("fit_transform");

    assert_eq!(scaler.floored_features(), &[1]);
    assert_eq!(scaler.std().expect("fitted")[1], 1.0);
    assert!(scaled.is_finite());
    for i in 0..4 {
        assert_eq!(scaled.get(i, 1), 0.0);
    }
    let (_, var) = column_stats(&scaled, 0);
    assert!((var - 1.0).abs() < 1e-4);
}

#[test]
fn test_refit_clears_floored() {
    let constant = Matrix::from_vec(2, 1, vec![3.0, 3.0]).expect("valid");
    let varying = Matrix::from_vec(2, 1, vec![3.0, 4.0]).expect("valid");

    let mut scaler = StandardScaler::new();
    scaler.fit(&constant).expect("fit");
    assert_eq!(scaler.floored_features(), &[0]);
    scaler.fit(&varying).expect("fit");
    assert!(scaler.floored_features().is_empty());
}

#[test]
fn test_inverse_transform_round_trip() {
    let data = Matrix::from_vec(3, 2, vec![1.0, -4.0, 2.5, 0.0, 6.0, 9.0])
        .expect("valid matrix dimensions");

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&data).expect("fit_transform");
    let restored = scaler.inverse_transform(&scaled).expect("inverse");

    for (a, b) in restored.as_slice().iter().zip(data.as_slice()) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn test_transform_before_fit() {
    let scaler = StandardScaler::new();
    let data = Matrix::<f32>::zeros(2, 2);
    assert!(matches!(
        scaler.transform(&data),
        Err(LandfallError::NotFitted(_))
    ));
    assert!(scaler.inverse_transform(&data).is_err());
}

#[test]
fn test_transform_width_mismatch() {
    let mut scaler = StandardScaler::new();
    scaler
        .fit(&Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("valid"))
        .expect("fit");
    let err = scaler.transform(&Matrix::<f32>::zeros(2, 3)).unwrap_err();
    assert!(matches!(err, LandfallError::DimensionMismatch { .. }));
}

#[test]
fn test_fit_empty() {
    let mut scaler = StandardScaler::new();
    assert!(scaler.fit(&Matrix::<f32>::zeros(0, 3)).is_err());
}

#[test]
fn test_transform_applies_training_statistics() {
    let train = Matrix::from_vec(2, 1, vec![0.0, 2.0]).expect("valid");
    let mut scaler = StandardScaler::new();
    scaler.fit(&train).expect("fit");

    let other = Matrix::from_vec(1, 1, vec![3.0]).expect("valid");
    let out = scaler.transform(&other).expect("transform");
    assert!((out.get(0, 0) - 2.0).abs() < 1e-6);
}
