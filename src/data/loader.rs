use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DisplayDomain, Metadata, MetadataValue, Spectrum};
use super::overlay::{validate_context, OverlayContext, OverlaySeries};

const FREQ_COLUMN: &str = "f_hz";
const MAG_COLUMN: &str = "mag";
const DOMAIN_KEY: &str = "display_domain";
const META_KEY: &str = "meta";

// ---------------------------------------------------------------------------
// Raw file contents
// ---------------------------------------------------------------------------

/// Series and metadata read from a file, not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSpectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    pub display_domain: Option<DisplayDomain>,
    pub metadata: Metadata,
    pub context: OverlayContext,
}

impl RawSpectrum {
    /// Validate into a [`Spectrum`] plus its overlay context.
    ///
    /// `domain` overrides the domain stored in the file; with neither, dB is assumed.
    pub fn into_spectrum(
        self,
        domain: Option<DisplayDomain>,
    ) -> Result<(Spectrum, Option<OverlayContext>)> {
        let display_domain = domain.or(self.display_domain).unwrap_or(DisplayDomain::Db);
        let spectrum = Spectrum::with_metadata(
            self.frequencies,
            self.magnitudes,
            display_domain,
            self.metadata,
        )?;
        let context = self.context.has_any().then_some(self.context);
        validate_context(spectrum.frequencies(), context.as_ref())?;
        Ok((spectrum, context))
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectrum from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `f_hz` / `mag` as list columns (first row) or plain float columns
/// * `.json`    – `{ "f_hz": [...], "mag": [...], "meta": {...}, "mean": [...], ... }`
/// * `.csv`     – one sample per row with `f_hz`, `mag` and optional overlay columns
pub fn load_file(path: &Path) -> Result<RawSpectrum> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} bins from {} (overlays: {:?})",
        raw.frequencies.len(),
        path.display(),
        raw.context.present().map(|(s, _)| s.name()).collect::<Vec<_>>()
    );
    Ok(raw)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// {
///   "f_hz": [0.0, 0.5, ...],
///   "mag":  [-40.1, -38.2, ...],
///   "display_domain": "dB",
///   "meta": { "source": "bench" },
///   "mean": [...], "p25": [...], "p75": [...]
/// }
/// ```
///
/// Top-level scalars other than `display_domain` are folded into the metadata.
pub fn parse_json(text: &str) -> Result<RawSpectrum> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let obj = root
        .as_object()
        .context("Expected top-level JSON object")?;

    let mut raw = RawSpectrum {
        frequencies: json_array_to_f64(obj.get(FREQ_COLUMN), FREQ_COLUMN)?,
        magnitudes: json_array_to_f64(obj.get(MAG_COLUMN), MAG_COLUMN)?,
        ..Default::default()
    };

    for (key, val) in obj {
        if key == FREQ_COLUMN || key == MAG_COLUMN {
            continue;
        }
        if key == DOMAIN_KEY {
            let name = val.as_str().context("display_domain must be a string")?;
            raw.display_domain = Some(name.parse()?);
        } else if key == META_KEY {
            let meta = val.as_object().context("'meta' must be a JSON object")?;
            for (k, v) in meta {
                raw.metadata.insert(k.clone(), json_to_metadata(v));
            }
        } else if let Some(series) = OverlaySeries::from_name(key) {
            raw.context.set(series, json_array_to_f64(Some(val), key)?);
        } else if !val.is_array() && !val.is_object() {
            raw.metadata.insert(key.clone(), json_to_metadata(val));
        } else {
            log::debug!("Ignoring JSON key '{key}'");
        }
    }
    Ok(raw)
}

fn load_json(path: &Path) -> Result<RawSpectrum> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn json_array_to_f64(val: Option<&JsonValue>, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("{col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, then one sample per row.
///   `f_hz,mag,mean,p25,p75`
///   `0.0,-40.1,-39.8,-41.0,-38.7`
/// Unknown columns are ignored.
pub fn parse_csv<R: std::io::Read>(reader: R) -> Result<RawSpectrum> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let f_idx = headers
        .iter()
        .position(|h| h == FREQ_COLUMN)
        .context("CSV missing 'f_hz' column")?;
    let m_idx = headers
        .iter()
        .position(|h| h == MAG_COLUMN)
        .context("CSV missing 'mag' column")?;
    let overlay_cols: Vec<(usize, OverlaySeries)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| OverlaySeries::from_name(h).map(|s| (i, s)))
        .collect();

    let mut raw = RawSpectrum::default();
    let mut overlays: Vec<Vec<f64>> = vec![Vec::new(); overlay_cols.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize, col: &str| -> Result<f64> {
            let tok = record.get(idx).unwrap_or("").trim();
            tok.parse::<f64>()
                .with_context(|| format!("Row {row_no}, {col}: '{tok}' is not a number"))
        };
        raw.frequencies.push(cell(f_idx, FREQ_COLUMN)?);
        raw.magnitudes.push(cell(m_idx, MAG_COLUMN)?);
        for (slot, (idx, series)) in overlays.iter_mut().zip(&overlay_cols) {
            slot.push(cell(*idx, series.name())?);
        }
    }

    for (values, (_, series)) in overlays.into_iter().zip(overlay_cols) {
        raw.context.set(series, values);
    }
    Ok(raw)
}

fn load_csv(path: &Path) -> Result<RawSpectrum> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    parse_csv(file)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one spectrum.
///
/// Two layouts are accepted:
/// - `f_hz` / `mag` (and overlays) as `List<Float64>` columns: the first row is
///   used and other columns of that row become metadata.
/// - `f_hz` / `mag` (and overlays) as plain float columns, one sample per row.
fn load_parquet(path: &Path) -> Result<RawSpectrum> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut raw = RawSpectrum::default();
    let mut list_layout: Option<bool> = None;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        if batch.num_rows() == 0 {
            continue;
        }
        let f_col = column(&batch, FREQ_COLUMN)?;
        let is_list = matches!(f_col.data_type(), DataType::List(_) | DataType::LargeList(_));

        match list_layout {
            Some(true) => {
                log::warn!("Parquet file holds more than one spectrum row; using the first");
                break;
            }
            Some(false) if is_list => bail!("Parquet batches mix list and flat layouts"),
            _ => {}
        }
        list_layout = Some(is_list);

        if is_list {
            if batch.num_rows() > 1 {
                log::warn!("Parquet file holds {} spectrum rows; using the first", batch.num_rows());
            }
            read_list_row(&batch, &mut raw)?;
        } else {
            read_flat_rows(&batch, &mut raw)?;
        }
    }

    if list_layout.is_none() {
        bail!("Parquet file contains no rows");
    }
    Ok(raw)
}

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn read_list_row(batch: &RecordBatch, raw: &mut RawSpectrum) -> Result<()> {
    let schema = batch.schema();
    for (i, field) in schema.fields().iter().enumerate() {
        let name = field.name().as_str();
        let col = batch.column(i);
        if name == FREQ_COLUMN {
            raw.frequencies = extract_f64_list(col, 0).context("failed to read 'f_hz'")?;
        } else if name == MAG_COLUMN {
            raw.magnitudes = extract_f64_list(col, 0).context("failed to read 'mag'")?;
        } else if let Some(series) = OverlaySeries::from_name(name) {
            if !col.is_null(0) {
                let values = extract_f64_list(col, 0)
                    .with_context(|| format!("failed to read '{name}'"))?;
                raw.context.set(series, values);
            }
        } else if name == DOMAIN_KEY {
            if let MetadataValue::String(s) = extract_metadata_value(col, 0) {
                raw.display_domain = Some(s.parse()?);
            }
        } else {
            raw.metadata
                .insert(name.to_string(), extract_metadata_value(col, 0));
        }
    }
    Ok(())
}

fn read_flat_rows(batch: &RecordBatch, raw: &mut RawSpectrum) -> Result<()> {
    raw.frequencies
        .extend(extract_f64_column(column(batch, FREQ_COLUMN)?).context("reading 'f_hz'")?);
    raw.magnitudes
        .extend(extract_f64_column(column(batch, MAG_COLUMN)?).context("reading 'mag'")?);
    for series in OverlaySeries::ALL {
        if let Ok(col) = column(batch, series.name()) {
            let values = extract_f64_column(col)
                .with_context(|| format!("reading '{}'", series.name()))?;
            let mut merged = raw.context.get(series).map(<[f64]>::to_vec).unwrap_or_default();
            merged.extend(values);
            raw.context.set(series, merged);
        }
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    extract_f64_column(&values_array)
}

/// Read a Float64 / Float32 array; nulls become NaN and are rejected by validation.
fn extract_f64_column(values: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if let Some(f64_arr) = values.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "column type is {:?}, expected Float64 or Float32",
            values.data_type()
        )
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => Some(MetadataValue::String(
            col.as_string::<i64>().value(row).to_string(),
        )),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| MetadataValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| MetadataValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| MetadataValue::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| MetadataValue::String(format!("{:?}", col.data_type())))
}
