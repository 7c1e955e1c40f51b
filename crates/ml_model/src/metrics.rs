//! Evaluation metrics for the fitted classifier.
//!
//! Computes a per-class confusion-matrix report from predicted and
//! ground-truth labels.

use std::fmt;

use feature_extractor::TrainingData;
use loan_structs::LoanStatus;

use crate::{Classifier, PredictError, StandardScaler};

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy and per-class metrics, indexed by class code.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub per_class: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    /// `confusion[actual][predicted]`.
    pub confusion: [[usize; 2]; 2],
}

impl ClassificationReport {
    /// Metrics for a single label.
    #[must_use]
    pub fn class(&self, status: LoanStatus) -> &ClassMetrics {
        &self.per_class[usize::from(status.class())]
    }

    /// Number of evaluated samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 { num as f64 / den as f64 } else { 0.0 }
}

/// Builds a classification report.
///
/// # Panics
///
/// Panics if `predictions` and `labels` differ in length.
#[must_use]
pub fn classification_report(predictions: &[LoanStatus], labels: &[LoanStatus]) -> ClassificationReport {
    assert_eq!(
        predictions.len(),
        labels.len(),
        "predictions and labels must have same length"
    );

    let mut confusion = [[0usize; 2]; 2];
    for (pred, label) in predictions.iter().zip(labels) {
        confusion[usize::from(label.class())][usize::from(pred.class())] += 1;
    }

    let per_class = [0, 1].map(|c| {
        let tp = confusion[c][c];
        let predicted = confusion[0][c] + confusion[1][c];
        let support = confusion[c][0] + confusion[c][1];

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ClassMetrics {
            precision,
            recall,
            f1,
            support,
        }
    });

    let total = labels.len();
    let accuracy = ratio(confusion[0][0] + confusion[1][1], total);

    let average = |weight: &dyn Fn(&ClassMetrics) -> f64| {
        let norm: f64 = per_class.iter().map(weight).sum();
        let avg = |f: fn(&ClassMetrics) -> f64| {
            if norm > 0.0 {
                per_class.iter().map(|m| f(m) * weight(m)).sum::<f64>() / norm
            } else {
                0.0
            }
        };
        ClassMetrics {
            precision: avg(|m| m.precision),
            recall: avg(|m| m.recall),
            f1: avg(|m| m.f1),
            support: total,
        }
    };

    let macro_avg = average(&|_| 1.0);
    let weighted_avg = average(&|m| m.support as f64);

    ClassificationReport {
        accuracy,
        per_class,
        macro_avg,
        weighted_avg,
        confusion,
    }
}

/// Scores a classifier on held-out samples.
///
/// # Errors
///
/// Returns an error if the classifier produces a non-finite decision value.
pub fn evaluate(
    classifier: &Classifier,
    scaler: &StandardScaler,
    data: &TrainingData,
) -> Result<ClassificationReport, PredictError> {
    let predictions = data
        .samples
        .iter()
        .map(|s| {
            classifier
                .predict(&scaler.transform(&s.features))
                .map(|r| r.loan_status)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(classification_report(&predictions, &data.labels()))
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{name:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )
        };

        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for status in LoanStatus::ALL {
            row(f, &status.to_string(), self.class(status))?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>29.2} {:>9}", "accuracy", self.accuracy, self.total())?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use feature_extractor::TrainingSample;
    use loan_structs::FEATURE_COUNT;
    use loan_structs::LoanStatus::{Approved, Rejected};

    use super::*;
    use crate::LinearWeights;

    #[test]
    fn test_perfect_predictions() {
        let labels = [Rejected, Rejected, Approved, Approved];
        let report = classification_report(&labels, &labels);

        assert!((report.accuracy - 1.0).abs() < 1e-9);
        for m in &report.per_class {
            assert!((m.precision - 1.0).abs() < 1e-9);
            assert!((m.recall - 1.0).abs() < 1e-9);
            assert!((m.f1 - 1.0).abs() < 1e-9);
            assert_eq!(m.support, 2);
        }
    }

    #[test]
    fn test_mixed_predictions() {
        let preds = [Approved, Rejected, Approved, Rejected, Rejected];
        let labels = [Approved, Approved, Rejected, Rejected, Rejected];
        let report = classification_report(&preds, &labels);

        assert_eq!(report.confusion, [[2, 1], [1, 1]]);
        assert!((report.accuracy - 0.6).abs() < 1e-9);

        let approved = report.class(Approved);
        assert!((approved.precision - 0.5).abs() < 1e-9);
        assert!((approved.recall - 0.5).abs() < 1e-9);
        assert_eq!(approved.support, 2);

        let rejected = report.class(Rejected);
        assert!((rejected.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((rejected.recall - 2.0 / 3.0).abs() < 1e-9);

        assert!((report.macro_avg.f1 - (0.5 + 2.0 / 3.0) / 2.0).abs() < 1e-9);
        let weighted = (0.5 * 2.0 + 2.0 / 3.0 * 3.0) / 5.0;
        assert!((report.weighted_avg.f1 - weighted).abs() < 1e-9);
        assert_eq!(report.total(), 5);
    }

    #[test]
    fn test_class_never_predicted() {
        let preds = [Rejected, Rejected];
        let labels = [Approved, Rejected];
        let report = classification_report(&preds, &labels);

        let approved = report.class(Approved);
        assert!(approved.precision.abs() < 1e-9);
        assert!(approved.f1.abs() < 1e-9);
    }

    #[test]
    fn test_empty() {
        let report = classification_report(&[], &[]);
        assert!(report.accuracy.abs() < 1e-9);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_evaluate() {
        let mut weights = [0.0; FEATURE_COUNT];
        weights[4] = 1.0;
        let classifier = Classifier::Linear(LinearWeights { weights, bias: 0.0 });
        let scaler = StandardScaler {
            mean: [0.0, 0.0, 0.0, 0.0, 600.0, 0.0, 0.0],
            scale: [1.0; FEATURE_COUNT],
        };

        let mut data = TrainingData::new();
        data.add_samples([750.0, 450.0, 650.0].map(|cibil| {
            let mut features = [0.0; FEATURE_COUNT];
            features[4] = cibil;
            TrainingSample {
                features,
                label: Approved,
            }
        }));

        let report = evaluate(&classifier, &scaler, &data).unwrap();
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_lists_classes() {
        let report = classification_report(&[Approved, Rejected], &[Approved, Rejected]);
        let text = report.to_string();
        assert!(text.contains("Approved"));
        assert!(text.contains("Rejected"));
        assert!(text.contains("weighted avg"));
    }
}
