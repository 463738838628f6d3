//! CSV export of form responses

use chrono::{NaiveDate, Utc};
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;
use tracing::{debug, warn};

use crate::types::{Form, FormResponse};
use crate::utils::to_iso_string;
use crate::{Error, Result};

/// Columns written before the per-question columns
pub const FIXED_COLUMNS: [&str; 3] = ["Response ID", "Department", "Submitted At"];

/// Write `responses` to `writer` as CSV, one row per response and one
/// column per question of `form`. Every field is quoted.
///
/// Returns the number of data rows written. With no responses nothing is
/// written and [`Error::NoResponses`] is returned.
pub fn export_responses_csv<W: Write>(
    form: &Form,
    responses: &[FormResponse],
    writer: W,
) -> Result<usize> {
    if responses.is_empty() {
        warn!(form_id = form.id, "No responses to export");
        return Err(Error::NoResponses);
    }

    let questions = &form.form_data.questions;
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    let header = FIXED_COLUMNS
        .iter()
        .copied()
        .chain(questions.iter().map(|question| question.label()));
    csv.write_record(header)?;

    for response in responses {
        let mut record = Vec::with_capacity(FIXED_COLUMNS.len() + questions.len());
        record.push(response.id.to_string());
        record.push(response.department_name.clone().unwrap_or_default());
        record.push(
            response
                .submitted_at
                .as_ref()
                .map(to_iso_string)
                .unwrap_or_default(),
        );
        for question in questions {
            record.push(
                response
                    .response_data
                    .get(&question.id)
                    .map(|answer| answer.display())
                    .unwrap_or_default(),
            );
        }
        csv.write_record(&record)?;
    }

    csv.flush()?;
    debug!(
        form_id = form.id,
        rows = responses.len(),
        columns = FIXED_COLUMNS.len() + questions.len(),
        "Exported responses"
    );

    Ok(responses.len())
}

/// Suggested file name for an export: `form_<id>_responses_<YYYY-MM-DD>.csv`
pub fn export_file_name(form_id: i64, date: NaiveDate) -> String {
    format!("form_{form_id}_responses_{}.csv", date.format("%Y-%m-%d"))
}

/// [`export_file_name`] for today's date
pub fn export_file_name_today(form_id: i64) -> String {
    export_file_name(form_id, Utc::now().date_naive())
}
