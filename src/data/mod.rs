/// Data layer: validated input types and file loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawSpectrum
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────────────┐
///   │ Spectrum + OverlayContext │  validated, immutable
///   └──────────────────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod overlay;
