use super::registry::{Aggregation, AGGREGATIONS};

/// Mean, min, max and population standard deviation of a feature sequence,
/// in [`AGGREGATIONS`] order.
///
/// Non-finite inputs propagate: a NaN anywhere makes every statistic NaN, an
/// infinity makes the mean infinite and the deviation NaN. An empty sequence
/// yields four NaNs.
pub fn aggregate(values: &[f64]) -> [f64; 4] {
    AGGREGATIONS.map(|aggregation| reduce(values, aggregation))
}

fn reduce(values: &[f64], aggregation: Aggregation) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    match aggregation {
        Aggregation::Mean => mean(values),
        Aggregation::Min => fold_propagating(values, f64::min),
        Aggregation::Max => fold_propagating(values, f64::max),
        Aggregation::Std => {
            let mean = mean(values);
            let variance =
                values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
            variance.sqrt()
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// `f64::min`/`f64::max` skip NaN operands; a feature table must not.
fn fold_propagating(values: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = values[0];
    for &value in values {
        if value.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, value);
    }
    acc
}
