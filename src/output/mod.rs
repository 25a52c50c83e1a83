pub mod formatter;

pub use formatter::{
    format_age, format_derived, format_json, format_results_table, format_score, format_status,
    format_training_report, format_tsv, should_use_colors,
};
