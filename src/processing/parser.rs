use crate::models::MrzFieldSet;

/// Decodes two TD3 MRZ lines into raw fields using the fixed character
/// offsets of the layout.
///
/// Line 1: `[2:5]` issuing country, `[5:44]` name block split on the first
/// `<<` into surname and given names. Line 2: `[0:9]` document number,
/// `[10:13]` nationality, `[13:19]` birth date, `[20]` sex, `[21:27]`
/// expiry date. Check digits are not validated; whatever sits in a range
/// is taken as-is.
pub fn parse_td3(line1: &str, line2: &str) -> MrzFieldSet {
    let name_block = slice(line1, 5, 44);
    let (surname, given_names) = match name_block.split_once("<<") {
        Some((surname, given)) => (surname, given),
        None => (name_block, ""),
    };

    MrzFieldSet {
        issuing_country: slice(line1, 2, 5).to_string(),
        surname: surname.replace('<', " ").trim().to_string(),
        given_names: given_names.replace('<', " ").trim().to_string(),
        document_number: slice(line2, 0, 9).replace('<', "").trim().to_string(),
        nationality: slice(line2, 10, 13).to_string(),
        birth_date: slice(line2, 13, 19).to_string(),
        sex: slice(line2, 20, 21).to_string(),
        expiry_date: slice(line2, 21, 27).to_string(),
    }
}

/// Byte-range slice that yields "" instead of panicking on short input.
/// Candidate lines are always 44 ASCII characters, but the structured
/// decoder path may hand over lines it did not length-check.
fn slice(line: &str, start: usize, end: usize) -> &str {
    if start >= line.len() {
        return "";
    }
    line.get(start..end.min(line.len())).unwrap_or("")
}
