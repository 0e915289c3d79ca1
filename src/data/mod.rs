/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / bundled
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, grouping index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selection → DerivedView
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
