pub mod columns;
pub mod power_csv_file;
pub mod split;
pub mod weather_csv_file;

pub use power_csv_file::PowerCsvFileSource;
pub use split::{split_csv_by_date, SplitCounts};
pub use weather_csv_file::{read_weather_csv, WeatherIndex};
