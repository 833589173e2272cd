mod date;
mod export;
mod parse;

pub use date::{local_midnight, local_to_utc, parse_ics_date};
pub use export::{event_to_ics, export_file_name};
pub use parse::{FieldToken, RawEventRecord, parse_ical, reduce, tokenize, unescape_ical};
