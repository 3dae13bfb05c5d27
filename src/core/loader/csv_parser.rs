//! CSV parser for enrollment exports

use crate::core::enrollment::EnrollmentRecord;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Accepted headers for the student column
const STUDENT_HEADERS: [&str; 3] = ["Roll Number", "Student", "Student ID"];
/// Header of the course code column
const CODE_HEADER: &str = "Course Code";
/// Header of the optional course name column
const NAME_HEADER: &str = "Course Name";

/// Parse an enrollment CSV file, one `(student, course)` pair per row
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Errors
/// Returns an error if the file cannot be read or a row is malformed
pub fn parse_enrollment_csv<P: AsRef<Path>>(path: P) -> Result<Vec<EnrollmentRecord>, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    parse_enrollment_csv_str(&content)
}

/// Parse enrollment CSV content
///
/// The first non-blank line is the header. It must name a student column
/// (`Roll Number` or `Student`) and a `Course Code` column; `Course Name` is
/// optional. Header matching ignores case.
///
/// # Errors
/// Returns an error naming the line when a required column is missing or a
/// row lacks a student or course code
pub fn parse_enrollment_csv_str(content: &str) -> Result<Vec<EnrollmentRecord>, Box<dyn Error>> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or("Enrollment CSV is empty")?;
    let headers = parse_csv_line(header_line.trim_start_matches('\u{feff}'));

    let student_col = STUDENT_HEADERS
        .iter()
        .find_map(|name| column(&headers, name))
        .ok_or("Missing 'Roll Number' column in enrollment CSV")?;
    let code_col = column(&headers, CODE_HEADER).ok_or("Missing 'Course Code' column in enrollment CSV")?;
    let name_col = column(&headers, NAME_HEADER);

    let mut records = Vec::new();
    for (line_idx, line) in lines {
        let line_no = line_idx + 1;
        let fields = parse_csv_line(line);

        let student = get_field(&fields, student_col).ok_or_else(|| format!("Line {line_no}: missing student"))?;
        let code = get_field(&fields, code_col).ok_or_else(|| format!("Line {line_no}: missing course code"))?;

        let mut record = EnrollmentRecord::new(student, code);
        if let Some(name) = name_col.and_then(|col| get_field(&fields, col)) {
            record = record.with_name(name);
        }
        records.push(record);
    }

    Ok(records)
}

/// Position of a header, ignoring case
fn column(headers: &[String], header_name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(header_name))
}

/// Parse a CSV line into trimmed fields
///
/// Double-quoted fields may contain commas; `""` inside quotes is a literal
/// quote.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Non-empty field at a column
fn get_field(fields: &[String], idx: usize) -> Option<&str> {
    fields
        .get(idx)
        .map(String::as_str)
        .filter(|f| !f.is_empty())
}
