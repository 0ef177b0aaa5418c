use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use freq_pick::scale::linear_to_db;

const OUTPUT_PATH: &str = "demo_spectrum.parquet";
const REALISATIONS: usize = 32;

/// (centre Hz, width Hz, linear amplitude)
const PEAKS: [(f64, f64, f64); 4] = [
    (25.0, 0.8, 1.0),
    (60.0, 1.2, 0.45),
    (120.0, 0.6, 0.7),
    (175.0, 2.0, 0.25),
];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// One noisy realisation of the linear magnitude spectrum.
fn generate_spectrum(frequencies: &[f64], noise_level: f64, rng: &mut StdRng) -> Vec<f64> {
    frequencies
        .iter()
        .map(|&f| {
            let signal: f64 = PEAKS
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(f, mu, sigma, amp))
                .sum();
            // Noise floor with a gentle 1/f tilt; magnitudes stay positive.
            let floor = 0.02 / (1.0 + f / 50.0);
            (signal + floor + gauss(rng, noise_level)).abs()
        })
        .collect()
}

/// Normal sample via Box-Muller.
fn gauss(rng: &mut StdRng, std_dev: f64) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

// ---------------------------------------------------------------------------
// Per-bin statistics across realisations
// ---------------------------------------------------------------------------

/// Linear-interpolated percentile of an ascending slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

struct BinStats {
    mean: Vec<f64>,
    median: Vec<f64>,
    p10: Vec<f64>,
    p25: Vec<f64>,
    p75: Vec<f64>,
    p90: Vec<f64>,
}

fn bin_stats(realisations: &[Vec<f64>], bins: usize) -> BinStats {
    let mut stats = BinStats {
        mean: Vec::with_capacity(bins),
        median: Vec::with_capacity(bins),
        p10: Vec::with_capacity(bins),
        p25: Vec::with_capacity(bins),
        p75: Vec::with_capacity(bins),
        p90: Vec::with_capacity(bins),
    };
    for i in 0..bins {
        let mut column: Vec<f64> = realisations.iter().map(|r| r[i]).collect();
        column.sort_by(f64::total_cmp);
        stats
            .mean
            .push(column.iter().sum::<f64>() / column.len() as f64);
        stats.median.push(percentile(&column, 0.5));
        stats.p10.push(percentile(&column, 0.10));
        stats.p25.push(percentile(&column, 0.25));
        stats.p75.push(percentile(&column, 0.75));
        stats.p90.push(percentile(&column, 0.90));
    }
    stats
}

// ---------------------------------------------------------------------------
// Parquet output
// ---------------------------------------------------------------------------

fn list_column(values: &[f64]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    builder.values().append_slice(values);
    builder.append(true);
    Arc::new(builder.finish())
}

fn list_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
        false,
    )
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    // 0 → 199.5 Hz, step 0.5
    let frequencies: Vec<f64> = (0..400).map(|i| i as f64 * 0.5).collect();

    let realisations: Vec<Vec<f64>> = (0..REALISATIONS)
        .map(|_| generate_spectrum(&frequencies, 0.01, &mut rng))
        .collect();
    let stats = bin_stats(&realisations, frequencies.len());
    let measured = generate_spectrum(&frequencies, 0.01, &mut rng);

    // Everything is written in dB against the loudest measured bin.
    let reference = measured.iter().copied().fold(f64::MIN_POSITIVE, f64::max);
    let to_db = |values: &[f64]| -> Vec<f64> {
        values.iter().map(|&v| linear_to_db(v, reference)).collect()
    };

    let columns: Vec<(&str, Vec<f64>)> = vec![
        ("f_hz", frequencies.clone()),
        ("mag", to_db(&measured)),
        ("mean", to_db(&stats.mean)),
        ("median", to_db(&stats.median)),
        ("p10", to_db(&stats.p10)),
        ("p25", to_db(&stats.p25)),
        ("p75", to_db(&stats.p75)),
        ("p90", to_db(&stats.p90)),
    ];

    let mut fields: Vec<Field> = columns.iter().map(|(name, _)| list_field(name)).collect();
    let mut arrays: Vec<ArrayRef> = columns.iter().map(|(_, v)| list_column(v)).collect();

    fields.push(Field::new("display_domain", DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(vec!["dB"])));
    fields.push(Field::new("source", DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(vec!["synthetic"])));
    fields.push(Field::new("realisations", DataType::Int64, false));
    arrays.push(Arc::new(Int64Array::from(vec![REALISATIONS as i64])));
    fields.push(Field::new("noise_level", DataType::Float64, false));
    arrays.push(Arc::new(Float64Array::from(vec![0.01])));

    let schema = Arc::new(Schema::new(fields));
    let batch =
        RecordBatch::try_new(schema.clone(), arrays).context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(OUTPUT_PATH).context("Failed to create output file")?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;

    println!(
        "Wrote spectrum ({} bins, peaks at {:?} Hz) to {OUTPUT_PATH}",
        frequencies.len(),
        PEAKS.iter().map(|p| p.0).collect::<Vec<_>>()
    );
    Ok(())
}
