use alumnet_db::models::Meeting;
use chrono::FixedOffset;
use rust_xlsxwriter::{Format, Workbook};

const HEADERS: [(&str, f64); 9] = [
    ("Student", 22.0),
    ("Topic", 28.0),
    ("Date", 18.0),
    ("Time", 8.0),
    ("Duration", 12.0),
    ("Platform", 14.0),
    ("Status", 12.0),
    ("Rating", 8.0),
    ("Notes", 50.0),
];

/// Export a mentor's meetings to an Excel file, one row per meeting.
pub fn export_meetings(
    meetings: &[Meeting],
    offset: FixedOffset,
) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Meetings")?;

    let header_format = Format::new().set_bold();
    for (col, (title, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &header_format)?;
        worksheet.set_column_width(col, *width)?;
    }

    for (i, meeting) in meetings.iter().enumerate() {
        let row = (i + 1) as u32;

        worksheet.write_string(row, 0, &meeting.student_name)?;
        worksheet.write_string(row, 1, &meeting.topic)?;
        worksheet.write_string(row, 2, &meeting.date_string(offset))?;
        worksheet.write_string(row, 3, &meeting.time_string(offset))?;
        // Completed sessions report the time actually spent
        let duration = match meeting.actual_duration_minutes {
            Some(minutes) => format!("{} min", minutes),
            None => meeting.duration.clone(),
        };
        worksheet.write_string(row, 4, &duration)?;
        worksheet.write_string(row, 5, &meeting.platform)?;
        worksheet.write_string(row, 6, meeting.status.as_str())?;
        if let Some(rating) = meeting.rating {
            worksheet.write_number(row, 7, rating as f64)?;
        }
        worksheet.write_string(row, 8, meeting.notes.as_deref().unwrap_or(""))?;
    }

    workbook.save_to_buffer()
}
