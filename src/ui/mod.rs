pub mod output;
pub mod progress;
pub mod table;

pub use output::{check_failed, check_passed, error, header, info, section, success, summary_row, warn, Icons};
pub use progress::Spinner;
pub use table::{stats_table, TableBuilder};
