mod series;
pub use series::{ObservationSeries, chunk_ranges};

mod sorted_array;
pub use sorted_array::SortedArray;
