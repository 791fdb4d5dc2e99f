pub mod bar;

pub use bar::{clean_bars, load_bars_from_csv, Bar, MIN_BARS};
