use super::*;

fn assert_partition(splits: &[Split], n_samples: usize) {
    let mut seen = vec![0usize; n_samples];
    for (train, valid) in splits {
        assert_eq!(train.len() + valid.len(), n_samples);
        for &i in valid {
            seen[i] += 1;
            assert!(!train.contains(&i), "index {i} on both sides");
        }
    }
    assert!(seen.iter().all(|&c| c == 1), "each sample validates once: {seen:?}");
}

#[test]
fn test_kfold_no_shuffle() {
    let splits = KFold::new(3).split(9);
    assert_eq!(splits.len(), 3);
    assert_eq!(splits[0].1, vec![0, 1, 2]);
    assert_eq!(splits[1].1, vec![3, 4, 5]);
    assert_eq!(splits[2].0, vec![0, 1, 2, 3, 4, 5]);
    assert_partition(&splits, 9);
}

#[test]
fn test_kfold_uneven_split() {
    let splits = KFold::new(3).split(10);
    let sizes: Vec<usize> = splits.iter().map(|(_, v)| v.len()).collect();
    assert_eq!(sizes, vec![4, 3, 3]);
    assert_partition(&splits, 10);
}

#[test]
fn test_kfold_shuffle_reproducible() {
    let a = KFold::new(4).with_random_state(7).split(20);
    let b = KFold::new(4).with_random_state(7).split(20);
    assert_eq!(a, b);
    assert_ne!(a, KFold::new(4).split(20));
    assert_partition(&a, 20);
}

#[test]
fn test_stratified_preserves_class_ratio() {
    // 12 negatives, 6 positives
    let y: Vec<usize> = (0..18).map(|i| usize::from(i % 3 == 0)).collect();
    let splits = StratifiedKFold::new(3).split(&y);
    for (_, valid) in &splits {
        let positives = valid.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(valid.len(), 6);
        assert_eq!(positives, 2);
    }
    assert_partition(&splits, 18);
}

#[test]
fn test_stratified_fold_sizes_differ_by_at_most_one() {
    // 37 / 35 split mimics a 72-sample training partition
    let y: Vec<usize> = (0..72).map(|i| usize::from(i < 35)).collect();
    let splits = StratifiedKFold::new(10).split(&y);
    let sizes: Vec<usize> = splits.iter().map(|(_, v)| v.len()).collect();
    let (min, max) = (
        sizes.iter().min().copied().unwrap_or(0),
        sizes.iter().max().copied().unwrap_or(0),
    );
    assert!(max - min <= 1, "fold sizes {sizes:?}");
    assert_partition(&splits, 72);
}

#[test]
fn test_stratified_sorted_and_deterministic() {
    let y = [1, 0, 1, 0, 0, 1, 1, 0, 1, 0];
    let a = StratifiedKFold::new(2).split(&y);
    assert_eq!(a, StratifiedKFold::new(2).split(&y));
    for (train, valid) in &a {
        assert!(train.windows(2).all(|w| w[0] < w[1]));
        assert!(valid.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_stratified_shuffle_seeded() {
    let y: Vec<usize> = (0..30).map(|i| i % 2).collect();
    let a = StratifiedKFold::new(5).with_random_state(3).split(&y);
    let b = StratifiedKFold::new(5).with_random_state(3).split(&y);
    assert_eq!(a, b);
    assert_ne!(a, StratifiedKFold::new(5).split(&y));
    assert_partition(&a, 30);
}

#[test]
fn test_cv_strategy_rejects_bad_fold_counts() {
    let y = [0, 1, 0, 1];
    for cv in [CvStrategy::stratified(1), CvStrategy::kfold(5)] {
        assert!(matches!(
            cv.split(&y),
            Err(LandfallError::EmptyPartition { .. })
        ));
    }
    assert_eq!(CvStrategy::kfold(4).split(&y).expect("leave-one-out").len(), 4);
}

#[test]
fn test_cross_validation_result_stats() {
    let result = CrossValidationResult {
        scores: vec![0.5, 1.0, 0.75, 0.75],
    };
    assert!((result.mean() - 0.75).abs() < 1e-6);
    assert!((result.std() - 0.176_776_7).abs() < 1e-5);
    assert_eq!(result.min(), 0.5);
    assert_eq!(result.max(), 1.0);

    let empty = CrossValidationResult { scores: vec![] };
    assert_eq!(empty.mean(), 0.0);
    assert_eq!(empty.std(), 0.0);
}

#[test]
fn test_ceil_rounding_of_test_size() {
    assert_eq!(test_count(90, 0.2), 18);
    assert_eq!(test_count(10, 0.25), 3);
    assert_eq!(test_count(7, 0.1), 1);
}

#[test]
fn test_train_test_split_indices_partition() {
    let (train, test) = train_test_split_indices(90, 0.2, 2).expect("split");
    assert_eq!(test.len(), 18);
    assert_eq!(train.len(), 72);
    let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..90).collect::<Vec<_>>());
}

#[test]
fn test_train_test_split_reproducible() {
    let a = train_test_split_indices(50, 0.3, 11).expect("split");
    let b = train_test_split_indices(50, 0.3, 11).expect("split");
    assert_eq!(a, b);
    let c = train_test_split_indices(50, 0.3, 12).expect("split");
    assert_ne!(a, c);
}

#[test]
fn test_train_test_split_rows_follow_indices() {
    let x = Matrix::from_vec(10, 1, (0..10).map(|i| i as f32).collect()).expect("10x1");
    let y: Vec<usize> = (0..10).map(|i| i % 2).collect();
    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).expect("split");
    let (train_idx, test_idx) = train_test_split_indices(10, 0.2, 42).expect("split");

    for (row, &idx) in test_idx.iter().enumerate() {
        assert_eq!(x_test.get(row, 0), idx as f32);
        assert_eq!(y_test[row], y[idx]);
    }
    for (row, &idx) in train_idx.iter().enumerate() {
        assert_eq!(x_train.get(row, 0), idx as f32);
        assert_eq!(y_train[row], y[idx]);
    }
}

#[test]
fn test_train_test_split_errors() {
    let x = Matrix::<f32>::zeros(4, 1);
    assert!(matches!(
        train_test_split(&x, &[0, 1, 0], 0.2, 0),
        Err(LandfallError::DataShape { .. })
    ));
    for bad in [0.0, 1.0, -0.5, f64::NAN] {
        assert!(matches!(
            train_test_split(&x, &[0, 1, 0, 1], bad, 0),
            Err(LandfallError::EmptyPartition { .. })
        ));
    }
    // ceil(1 * 0.5) = 1 leaves no training sample
    assert!(train_test_split_indices(1, 0.5, 0).is_err());
}
