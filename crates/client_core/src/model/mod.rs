mod filter;
mod points;

pub use filter::{FilterEvent, FilterStore};
pub use points::{PointsEvent, PointsStore, StoreError};
