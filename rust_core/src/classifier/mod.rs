//! Team win classifier.
//!
//! A logistic regression over the five-feature vector, trained once from the
//! whole historical store and cached for the life of the process. The
//! [`ClassifierService`] owns the cache; callers share it behind an `Arc`.

pub mod logistic;

use crate::error::ClassifierUnavailable;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::store::HistoricalStore;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

pub use logistic::{FitOptions, LogisticRegression};

/// Minimum usable rows before the classifier is considered available
pub const MIN_TRAINING_ROWS: usize = 100;

/// How one feature moved a team's logit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: &'static str,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    /// "WIN" when the weight is positive, otherwise "LOSS"
    pub leans: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainedModel {
    pub model: LogisticRegression,
    pub training_rows: usize,
    /// In-sample accuracy at a 0.5 threshold
    pub training_accuracy: f64,
}

impl TrainedModel {
    /// Fit on every store row with complete features and an outcome.
    pub fn train(store: &HistoricalStore) -> Result<Self, ClassifierUnavailable> {
        Self::train_with(store, FitOptions::default())
    }

    pub fn train_with(
        store: &HistoricalStore,
        options: FitOptions,
    ) -> Result<Self, ClassifierUnavailable> {
        let (rows, labels): (Vec<FeatureVector>, Vec<bool>) = store
            .records()
            .iter()
            .map(|record| (FeatureVector::from_record(record), record.win))
            .filter(|(features, _)| features.is_finite())
            .unzip();

        if rows.len() < MIN_TRAINING_ROWS {
            return Err(ClassifierUnavailable::InsufficientData {
                usable_rows: rows.len(),
                required: MIN_TRAINING_ROWS,
            });
        }

        let model = LogisticRegression::fit(&rows, &labels, options)?;

        let correct = rows
            .par_iter()
            .zip(labels.par_iter())
            .filter(|(features, label)| (model.predict_proba(features) >= 0.5) == **label)
            .count();
        let training_accuracy = correct as f64 / rows.len() as f64;

        Ok(Self {
            model,
            training_rows: rows.len(),
            training_accuracy,
        })
    }

    /// P(win) for a team's feature vector
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.model.predict_proba(features)
    }

    pub fn intercept(&self) -> f64 {
        self.model.raw_intercept()
    }

    /// Per-feature logit contributions in raw units
    pub fn contributions(&self, features: &FeatureVector) -> Vec<FeatureContribution> {
        let weights = self.model.raw_coefficients();
        (0..FEATURE_COUNT)
            .map(|j| FeatureContribution {
                feature: FEATURE_NAMES[j],
                value: features.0[j],
                weight: weights[j],
                contribution: features.0[j] * weights[j],
                leans: if weights[j] > 0.0 { "WIN" } else { "LOSS" },
            })
            .collect()
    }
}

/// Lazily trained, build-once classifier.
///
/// The first caller trains; concurrent first callers block until that build
/// finishes and then share its outcome. A failed build (too little data,
/// no convergence) is cached too, since the store never changes underneath it.
#[derive(Debug)]
pub struct ClassifierService {
    store: Arc<HistoricalStore>,
    options: FitOptions,
    model: OnceLock<Result<Arc<TrainedModel>, ClassifierUnavailable>>,
}

impl ClassifierService {
    pub fn new(store: Arc<HistoricalStore>) -> Self {
        Self::with_options(store, FitOptions::default())
    }

    pub fn with_options(store: Arc<HistoricalStore>, options: FitOptions) -> Self {
        Self {
            store,
            options,
            model: OnceLock::new(),
        }
    }

    /// The trained model, training it on first access.
    pub fn model(&self) -> Result<Arc<TrainedModel>, ClassifierUnavailable> {
        self.model
            .get_or_init(|| {
                let outcome = TrainedModel::train_with(&self.store, self.options);
                match &outcome {
                    Ok(trained) => info!(
                        "Classifier trained on {} rows in {} iterations (accuracy {:.3})",
                        trained.training_rows,
                        trained.model.iterations,
                        trained.training_accuracy
                    ),
                    Err(ClassifierUnavailable::InsufficientData {
                        usable_rows,
                        required,
                    }) => warn!(
                        "Classifier unavailable: not enough training data ({} usable rows, {} required)",
                        usable_rows, required
                    ),
                    Err(reason) => error!("Classifier unavailable: {}", reason),
                }
                outcome.map(Arc::new)
            })
            .clone()
    }

    /// Whether a build has been attempted (successfully or not)
    pub fn is_initialized(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn store(&self) -> &Arc<HistoricalStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::trainable_store;

    #[test]
    fn test_insufficient_rows_unavailable() {
        let store = trainable_store(MIN_TRAINING_ROWS - 1);
        let err = TrainedModel::train(&store).unwrap_err();
        assert_eq!(
            err,
            ClassifierUnavailable::InsufficientData {
                usable_rows: 99,
                required: 100
            }
        );
        assert_eq!(err.reason(), "not enough training data");
    }

    #[test]
    fn test_trains_at_threshold() {
        let store = trainable_store(MIN_TRAINING_ROWS * 3);
        let trained = TrainedModel::train(&store).unwrap();
        assert_eq!(trained.training_rows, 300);
        assert!(trained.training_accuracy > 0.6 && trained.training_accuracy <= 1.0);
    }

    #[test]
    fn test_contributions_follow_weights() {
        let store = trainable_store(300);
        let trained = TrainedModel::train(&store).unwrap();
        let fv = FeatureVector([110.0, 44.0, 25.0, 13.0, 1.0]);
        let contributions = trained.contributions(&fv);

        assert_eq!(contributions.len(), FEATURE_COUNT);
        assert_eq!(contributions[0].feature, "points");
        assert_eq!(contributions[0].leans, "WIN");
        let logit = trained.intercept() + contributions.iter().map(|c| c.contribution).sum::<f64>();
        assert!((logistic::logistic(logit) - trained.predict(&fv)).abs() < 1e-9);
    }

    #[test]
    fn test_service_builds_once_and_caches() {
        let service = ClassifierService::new(Arc::new(trainable_store(300)));
        assert!(!service.is_initialized());
        let first = service.model().unwrap();
        let second = service.model().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(service.is_initialized());
    }

    #[test]
    fn test_service_caches_unavailability() {
        let service = ClassifierService::new(Arc::new(trainable_store(10)));
        assert!(service.model().is_err());
        assert!(service.is_initialized());
        assert!(matches!(
            service.model(),
            Err(ClassifierUnavailable::InsufficientData { usable_rows: 10, .. })
        ));
    }

    #[test]
    fn test_concurrent_first_access_shares_one_model() {
        let service = Arc::new(ClassifierService::new(Arc::new(trainable_store(300))));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || service.model().unwrap())
            })
            .collect();
        let models: Vec<Arc<TrainedModel>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
