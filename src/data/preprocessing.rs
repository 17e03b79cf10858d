use crate::data::{Dataset, FeatureRow, SplitConfig};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Split feature rows into train/test partitions with a seeded shuffle.
///
/// No stratification is performed; the test size is the rounded fraction of
/// the total row count, so `train.len() + test.len() == rows.len()` always
/// holds.
pub fn split_rows(mut rows: Vec<FeatureRow>, config: &SplitConfig) -> Dataset {
    info!("Splitting dataset with seed {}", config.seed);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    rows.shuffle(&mut rng);

    let n = rows.len();
    let n_test = ((n as f32) * config.test_ratio).round() as usize;
    let n_test = n_test.min(n);

    let test = rows.split_off(n - n_test);
    let dataset = Dataset { train: rows, test };

    info!(
        "Dataset split: train={}, test={}",
        dataset.train.len(),
        dataset.test.len()
    );

    let log_distribution = |name: &str, rows: &[FeatureRow]| {
        let pos = rows.iter().filter(|r| r.label == 1).count();
        info!(
            "{} distribution: positive={}, negative={}",
            name,
            pos,
            rows.len() - pos
        );
    };
    log_distribution("Train", &dataset.train);
    log_distribution("Test", &dataset.test);

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rows(n: usize) -> Vec<FeatureRow> {
        (0..n)
            .map(|i| FeatureRow::new((i % 2) as f32, ((i % 5) * 10) as f32, 20.0 + i as f32, (i % 2) as u8))
            .collect()
    }

    #[test]
    fn test_split_preserves_row_count() {
        for n in [1usize, 10, 54, 541] {
            let config = SplitConfig::default();
            let dataset = split_rows(make_rows(n), &config);

            assert_eq!(dataset.train.len() + dataset.test.len(), n);
        }
    }

    #[test]
    fn test_split_test_fraction() {
        let config = SplitConfig {
            test_ratio: 0.2,
            seed: 1,
        };
        let dataset = split_rows(make_rows(500), &config);

        assert_eq!(dataset.test.len(), 100);
        assert_eq!(dataset.train.len(), 400);
    }

    #[test]
    fn test_split_is_seeded() {
        let config = SplitConfig {
            test_ratio: 0.2,
            seed: 9,
        };
        let a = split_rows(make_rows(100), &config);
        let b = split_rows(make_rows(100), &config);

        let bmis = |rows: &[FeatureRow]| rows.iter().map(|r| r.features[4]).collect::<Vec<_>>();
        assert_eq!(bmis(&a.train), bmis(&b.train));
        assert_eq!(bmis(&a.test), bmis(&b.test));
    }
}
