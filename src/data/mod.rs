/// Data layer: core types, loading, and exploration.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ListingTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ ListingTable  │  Vec<Listing>, column order, unique values
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ explore   │  describe / missing counts
///   └──────────┘
/// ```

pub mod explore;
pub mod loader;
pub mod model;
