use crate::models::{ExtractionMethod, MrzFieldSet, PassengerRecord};
use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Builds the canonical record from a raw field set. Pure field-level
/// cleanup; never fails — anything a rule does not recognize passes
/// through unchanged.
pub fn normalize_record(
    fields: &MrzFieldSet,
    method: ExtractionMethod,
    source_image: &Path,
) -> PassengerRecord {
    PassengerRecord {
        full_name: full_name(&fields.surname, &fields.given_names),
        passport_number: fields.document_number.clone(),
        dob: normalize_date(&fields.birth_date),
        gender: map_gender(&fields.sex),
        issuing_country: fields.issuing_country.clone(),
        nationality: fields.nationality.clone(),
        expiry_date: normalize_date(&fields.expiry_date),
        source_image: source_image.display().to_string(),
        method,
        scanned_at: Local::now().format("%H:%M:%S").to_string(),
    }
}

pub fn full_name(surname: &str, given_names: &str) -> String {
    format!("{} {}", clean_name(surname), clean_name(given_names))
        .trim()
        .to_string()
}

/// Strips filler noise out of a name segment.
///
/// `<` is padding. `K` is treated as padding too: the structured engine
/// misreads the filler glyph as a literal K, and matching its output takes
/// precedence over keeping genuine K characters (see DESIGN.md). Runs of
/// three or more identical characters are stray filler sequences, not name
/// content.
pub fn clean_name(name: &str) -> String {
    let replaced = name.replace('<', " ").replace('K', " ");
    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    strip_repeat_runs(collapsed.trim()).trim().to_string()
}

// The regex crate has no backreferences, so run removal is a plain scan.
fn strip_repeat_runs(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        let mut j = i;
        while j < chars.len() && chars[j] == chars[i] {
            j += 1;
        }
        if j - i < 3 {
            for _ in i..j {
                out.push(chars[i]);
            }
        }
        i = j;
    }
    out
}

/// Maps the MRZ sex code to the output gender value. Anything other than
/// `M` or `F` (fillers, misreads, unspecified) becomes empty.
pub fn map_gender(sex: &str) -> String {
    match sex {
        "M" => "M".to_string(),
        "F" => "F".to_string(),
        _ => String::new(),
    }
}

/// Unifies date strings into `dd/mm/yyyy`.
///
/// Accepted inputs: `dd/mm/yyyy` (returned as-is), `yyyy/mm/dd`,
/// `yyyy-mm-dd` and 6-digit `YYMMDD`. Anything else passes through
/// unchanged — best effort, never an error.
pub fn normalize_date(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }

    if date.contains('/') {
        let parts: Vec<&str> = date.split('/').collect();
        if parts.len() == 3 {
            if parts[0].len() <= 2 && parts[1].len() <= 2 && parts[2].len() == 4 {
                return date.to_string();
            }
            if parts[0].len() == 4 {
                return format!("{}/{}/{}", parts[2], parts[1], parts[0]);
            }
        }
    }

    if date.contains('-') && date.len() == 10 {
        let parts: Vec<&str> = date.split('-').collect();
        if parts.len() == 3 && parts[0].len() == 4 {
            return format!("{}/{}/{}", parts[2], parts[1], parts[0]);
        }
    }

    if date.len() == 6 && date.chars().all(|c| c.is_ascii_digit()) {
        return expand_yymmdd(date);
    }

    date.to_string()
}

/// Expands `YYMMDD` to `dd/mm/yyyy`. Two-digit years up to 30 land in the
/// 2000s, the rest in the 1900s.
fn expand_yymmdd(date: &str) -> String {
    let yy: u32 = date[0..2].parse().unwrap_or(0);
    let mm: u32 = date[2..4].parse().unwrap_or(0);
    let dd: u32 = date[4..6].parse().unwrap_or(0);
    let year = if yy <= 30 { 2000 + yy } else { 1900 + yy };
    format!("{:02}/{:02}/{}", dd, mm, year)
}
