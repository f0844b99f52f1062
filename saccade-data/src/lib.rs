pub mod loader;
pub mod synthetic;

pub use loader::{DataConfig, load_labels, load_matrix, load_optional, parse_csv, write_csv};
pub use synthetic::{SyntheticConfig, SyntheticDataset, generate};
