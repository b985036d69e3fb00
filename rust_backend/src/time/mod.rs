pub mod date_range;

pub use date_range::{format_key, iso_weekday, parse_key, DateRange, Days, DATE_KEY_FORMAT};
