use std::time::Duration;

use super::*;
use crate::classification::KNearestNeighbors;
use crate::config::FamilyFolds;
use crate::error::LandfallError;
use crate::metrics::ConfusionCounts;
use crate::model_selection::{ParamSet, SearchStatus};
use crate::traits::Classifier;

fn small_grids(selector: ModelSelector) -> ModelSelector {
    selector
        .with_grid(
            ClassifierFamily::LogisticRegression,
            ParamGrid::new()
                .add("C", [0.1, 1.0])
                .add("penalty", ["l2"])
                .add("solver", ["lbfgs"]),
        )
        .with_grid(
            ClassifierFamily::Svm,
            ParamGrid::new()
                .add("kernel", ["linear", "rbf"])
                .add("C", [1.0])
                .add("gamma", [0.1]),
        )
        .with_grid(
            ClassifierFamily::DecisionTree,
            ParamGrid::new()
                .add("criterion", ["gini"])
                .add("splitter", ["best", "random"])
                .add("max_depth", [2usize, 4])
                .add("max_features", ["all"])
                .add("min_samples_leaf", [1usize])
                .add("min_samples_split", [2usize]),
        )
        .with_grid(
            ClassifierFamily::Knn,
            ParamGrid::new()
                .add("n_neighbors", [3usize, 5])
                .add("algorithm", ["auto"])
                .add("p", [2usize]),
        )
}

fn result(family: ClassifierFamily, test_accuracy: f32) -> SearchResult {
    SearchResult {
        family,
        best_params: ParamSet::new(),
        cv_score: 0.5,
        cv_std: 0.0,
        n_folds: 5,
        test_accuracy,
        confusion: ConfusionCounts::default(),
        status: SearchStatus::Complete,
        candidates: Vec::new(),
    }
}

#[test]
fn test_leaderboard_sorts_descending() {
    let board = Leaderboard::from_results(
        vec![
            result(ClassifierFamily::LogisticRegression, 0.7),
            result(ClassifierFamily::Svm, 0.9),
            result(ClassifierFamily::DecisionTree, 0.8),
        ],
        Vec::new(),
    );
    let families: Vec<_> = board.entries().iter().map(|e| e.family).collect();
    assert_eq!(
        families,
        vec![
            ClassifierFamily::Svm,
            ClassifierFamily::DecisionTree,
            ClassifierFamily::LogisticRegression
        ]
    );
    assert_eq!(board.best().map(|b| b.family), Some(ClassifierFamily::Svm));
}

#[test]
fn test_leaderboard_ties_keep_declaration_order() {
    let board = Leaderboard::from_results(
        ClassifierFamily::ALL
            .iter()
            .map(|&f| result(f, 0.8333))
            .collect(),
        Vec::new(),
    );
    let families: Vec<_> = board.entries().iter().map(|e| e.family).collect();
    assert_eq!(families, ClassifierFamily::ALL.to_vec());
}

#[test]
fn test_leaderboard_ties_follow_family_order_not_input_order() {
    let board = Leaderboard::from_results(
        vec![
            result(ClassifierFamily::Knn, 0.8),
            result(ClassifierFamily::DecisionTree, 0.9),
            result(ClassifierFamily::LogisticRegression, 0.8),
            result(ClassifierFamily::Svm, 0.8),
        ],
        Vec::new(),
    );
    let families: Vec<_> = board.entries().iter().map(|e| e.family).collect();
    assert_eq!(
        families,
        vec![
            ClassifierFamily::DecisionTree,
            ClassifierFamily::LogisticRegression,
            ClassifierFamily::Svm,
            ClassifierFamily::Knn
        ]
    );
}

#[test]
fn test_reordered_families_rank_ties_by_declaration() {
    let dataset = Dataset::synthetic_binary(40, 3, 5).expect("dataset");
    let forward = small_grids(ModelSelector::new(SelectionConfig::new().with_families(vec![
        ClassifierFamily::DecisionTree,
        ClassifierFamily::Knn,
    ])))
    .run(&dataset)
    .expect("forward");
    let reversed = small_grids(ModelSelector::new(SelectionConfig::new().with_families(vec![
        ClassifierFamily::Knn,
        ClassifierFamily::DecisionTree,
    ])))
    .run(&dataset)
    .expect("reversed");
    assert_eq!(forward.leaderboard, reversed.leaderboard);
}

#[test]
fn test_empty_leaderboard() {
    let board = Leaderboard::from_results(
        Vec::new(),
        vec![UnavailableFamily {
            family: ClassifierFamily::Knn,
            reason: "no grid point".to_string(),
        }],
    );
    assert!(board.is_empty());
    assert!(board.best().is_none());
    assert!(board.to_string().contains("unavailable: no grid point"));
}

#[test]
fn test_evaluate_rejects_bad_partitions() {
    let x = Matrix::from_vec(2, 1, vec![0.0, 1.0]).expect("2x1");
    let mut model = KNearestNeighbors::new(1);
    model.fit(&x, &[0, 1]).expect("fit");

    assert!(matches!(
        evaluate(&model, &Matrix::zeros(0, 1), &[]),
        Err(LandfallError::EmptyPartition { .. })
    ));
    assert!(matches!(
        evaluate(&model, &x, &[0]),
        Err(LandfallError::DimensionMismatch { .. })
    ));

    let eval = evaluate(&model, &x, &[0, 1]).expect("evaluate");
    assert_eq!(eval.accuracy, 1.0);
    assert_eq!(eval.confusion.true_positive, 1);
    assert_eq!(eval.confusion.true_negative, 1);
}

#[test]
fn test_run_ranks_every_family() {
    let dataset = Dataset::synthetic_binary(60, 4, 11).expect("dataset");
    let report = small_grids(ModelSelector::new(SelectionConfig::default()))
        .run(&dataset)
        .expect("run");

    assert_eq!(report.n_test, 12);
    assert_eq!(report.n_train, 48);
    assert_eq!(report.leaderboard.len(), 4);
    assert!(report.leaderboard.unavailable().is_empty());

    let accuracies: Vec<f32> = report
        .leaderboard
        .entries()
        .iter()
        .map(|e| e.test_accuracy)
        .collect();
    assert!(accuracies.windows(2).all(|w| w[0] >= w[1]));
    for entry in report.leaderboard.entries() {
        assert!((0.0..=1.0).contains(&entry.test_accuracy));
        assert_eq!(entry.confusion.total(), 12);
        assert_eq!(entry.n_folds, entry.family.default_folds());
        assert!(entry.status.is_complete());
        // The winner scores at least as well as every other fittable point.
        for candidate in &entry.candidates {
            if let Some(score) = candidate.mean_score {
                assert!(score <= entry.cv_score);
            }
        }
    }
}

#[test]
fn test_all_invalid_family_is_unavailable() {
    let dataset = Dataset::synthetic_binary(40, 3, 5).expect("dataset");
    let config = SelectionConfig::new().with_families(vec![
        ClassifierFamily::LogisticRegression,
        ClassifierFamily::Knn,
    ]);
    let report = small_grids(ModelSelector::new(config))
        .with_grid(
            ClassifierFamily::LogisticRegression,
            ParamGrid::new()
                .add("C", [1.0])
                .add("penalty", ["l1"])
                .add("solver", ["lbfgs"]),
        )
        .run(&dataset)
        .expect("an unfittable family is not fatal");

    assert_eq!(report.leaderboard.len(), 1);
    assert_eq!(
        report.best().map(|b| b.family),
        Some(ClassifierFamily::Knn)
    );
    let missing = report.leaderboard.unavailable();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].family, ClassifierFamily::LogisticRegression);
}

#[test]
fn test_invalid_points_are_skipped() {
    let dataset = Dataset::synthetic_binary(40, 3, 5).expect("dataset");
    let config =
        SelectionConfig::new().with_families(vec![ClassifierFamily::LogisticRegression]);
    let report = ModelSelector::new(config)
        .with_grid(
            ClassifierFamily::LogisticRegression,
            ParamGrid::new()
                .add("C", [1.0])
                .add("penalty", ["l1", "l2"])
                .add("solver", ["lbfgs"]),
        )
        .run(&dataset)
        .expect("run");

    let best = report.best().expect("logistic regression ranked");
    assert_eq!(best.best_params.get_str("penalty").expect("penalty"), "l2");
    assert!(best.candidates[0].mean_score.is_none());
    assert!(best.candidates[0].error.is_some());
}

#[test]
fn test_too_many_folds_fails_before_search() {
    let dataset = Dataset::synthetic_binary(12, 2, 1).expect("dataset");
    // 12 samples leave 9 for training, fewer than the 10 folds SVM uses.
    let err = ModelSelector::new(SelectionConfig::default())
        .run(&dataset)
        .unwrap_err();
    assert!(matches!(err, LandfallError::EmptyPartition { .. }));
}

#[test]
fn test_degenerate_partitions_are_rejected_before_search() {
    let dataset = Dataset::synthetic_binary(20, 2, 1).expect("dataset");
    for config in [
        SelectionConfig::new().with_test_fraction(0.0),
        SelectionConfig::new().with_test_fraction(1.0),
        SelectionConfig::new().with_folds(FamilyFolds::uniform(1)),
    ] {
        let err = ModelSelector::new(config).run(&dataset).unwrap_err();
        assert!(matches!(err, LandfallError::EmptyPartition { .. }), "{err}");
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let dataset = Dataset::synthetic_binary(20, 2, 1).expect("dataset");
    let err = ModelSelector::new(SelectionConfig::new().with_families(Vec::new()))
        .run(&dataset)
        .unwrap_err();
    assert!(matches!(err, LandfallError::Config(_)));
}

#[test]
fn test_unrepresentable_time_budget_is_rejected() {
    let dataset = Dataset::synthetic_binary(20, 2, 1).expect("dataset");
    let config = SelectionConfig {
        time_budget_secs: Some(1e30),
        ..SelectionConfig::default()
    };
    let err = ModelSelector::new(config).run(&dataset).unwrap_err();
    assert!(matches!(err, LandfallError::Config(_)));
}

#[test]
fn test_parallel_matches_sequential() {
    let dataset = Dataset::synthetic_binary(50, 4, 3).expect("dataset");
    let sequential = small_grids(ModelSelector::new(SelectionConfig::default()))
        .run(&dataset)
        .expect("sequential");
    let parallel = small_grids(ModelSelector::new(
        SelectionConfig::default().with_parallel(true),
    ))
    .run(&dataset)
    .expect("parallel");
    assert_eq!(sequential, parallel);
}

#[test]
fn test_train_only_scaling_reports_floored_columns() {
    let rows: Vec<Vec<f32>> = (0..30)
        .map(|i| vec![i as f32, 3.0, (i % 7) as f32])
        .collect();
    let labels: Vec<usize> = (0..30).map(|i| usize::from(i >= 15)).collect();
    let dataset = Dataset::from_rows(&rows, labels).expect("dataset");

    for scaling in [ScalingMode::FullDataset, ScalingMode::TrainOnly] {
        let config = SelectionConfig::new()
            .with_scaling(scaling)
            .with_families(vec![ClassifierFamily::Knn]);
        let report = small_grids(ModelSelector::new(config))
            .run(&dataset)
            .expect("run");
        assert_eq!(report.floored_features, vec![1], "{scaling:?}");
        assert_eq!(report.n_test, 6);
    }
}

#[test]
fn test_zero_time_budget_evaluates_first_point_only() {
    let dataset = Dataset::synthetic_binary(40, 3, 9).expect("dataset");
    let config = SelectionConfig::new()
        .with_families(vec![ClassifierFamily::Knn])
        .with_time_budget(Duration::ZERO);
    let report = small_grids(ModelSelector::new(config))
        .run(&dataset)
        .expect("run");
    let knn = report.best().expect("ranked");
    assert_eq!(
        knn.status,
        SearchStatus::Incomplete {
            evaluated: 1,
            total: 2
        }
    );
    assert_eq!(knn.candidates.len(), 1);
    assert!(report.to_string().contains("(incomplete)"));
}

#[test]
fn test_report_display_and_json() {
    let dataset = Dataset::synthetic_binary(40, 3, 4).expect("dataset");
    let config = SelectionConfig::new().with_families(vec![
        ClassifierFamily::DecisionTree,
        ClassifierFamily::Knn,
    ]);
    let report = small_grids(ModelSelector::new(config))
        .run(&dataset)
        .expect("run");

    let text = report.to_string();
    assert!(text.contains("Decision Tree"));
    assert!(text.contains("KNN"));
    assert!(text.contains("test data accuracy"));
    assert!(text.contains("best model:"));

    let json = report.to_json_string().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["n_test"], 8);
    assert_eq!(value["leaderboard"]["entries"].as_array().map(Vec::len), Some(2));
    assert!(value["leaderboard"]["entries"][0]["confusion"]["true_positive"].is_number());
}
