//! Transport adapter: loosely-shaped FHIR JSON to canonical records, chart series and summaries.

mod extract;
mod normalize;
mod summary;

pub use extract::{extract_series, extract_status_series};
pub use normalize::{
    normalize, normalize_all, normalize_payload, normalize_str, parse_datetime, to_transport,
    UNKNOWN_MEDICATION,
};
pub use summary::{count_active, count_taken_on, latest_value, summarize};
