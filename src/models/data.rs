use serde::Serialize;

/// Characters per MRZ line in the TD3 (passport booklet) layout.
pub const TD3_LINE_LEN: usize = 44;

/// Document-type prefixes accepted on the first MRZ line.
pub const TD3_DOC_PREFIXES: [&str; 3] = ["P<", "V<", "I<"];

/// A recognized line that satisfies the MRZ shape constraints (exactly 44
/// characters from the MRZ alphabet), tagged with the crop that produced it.
/// Not yet validated as a genuine field-bearing line.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLine {
    pub text: String,
    /// Fraction of image height where the producing crop started (e.g. 0.85
    /// for the bottom 15% of the image).
    pub crop_start: f32,
}

/// Raw field values as sliced out of the MRZ, before any normalization.
/// Dates are still in whatever form the decoder produced (usually YYMMDD).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MrzFieldSet {
    pub surname: String,
    pub given_names: String,
    pub document_number: String,
    pub nationality: String,
    pub issuing_country: String,
    pub birth_date: String,
    pub sex: String,
    pub expiry_date: String,
}

impl MrzFieldSet {
    pub fn is_empty(&self) -> bool {
        self.surname.is_empty()
            && self.given_names.is_empty()
            && self.document_number.is_empty()
            && self.nationality.is_empty()
            && self.issuing_country.is_empty()
            && self.birth_date.is_empty()
            && self.sex.is_empty()
            && self.expiry_date.is_empty()
    }
}

/// Which of the two decode paths produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Structured,
    Manual,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Structured => "structured",
            ExtractionMethod::Manual => "manual",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical normalized output of one successful extraction.
///
/// Dates are `dd/mm/yyyy`, gender is `M`, `F` or empty. Immutable once
/// created; ownership passes to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PassengerRecord {
    pub full_name: String,
    pub passport_number: String,
    pub dob: String,
    pub gender: String,
    pub issuing_country: String,
    pub nationality: String,
    pub expiry_date: String,
    pub source_image: String,
    pub method: ExtractionMethod,
    pub scanned_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_field_set() {
        assert!(MrzFieldSet::default().is_empty());

        let fields = MrzFieldSet {
            document_number: "L898902C3".to_string(),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::Structured).unwrap(),
            "\"structured\""
        );
        assert_eq!(ExtractionMethod::Manual.as_str(), "manual");
    }

    #[test]
    fn test_record_json_keys() {
        let record = PassengerRecord {
            full_name: "ERIKSSON ANNA MARIA".to_string(),
            passport_number: "L898902C3".to_string(),
            dob: "12/08/1974".to_string(),
            gender: "F".to_string(),
            issuing_country: "UTO".to_string(),
            nationality: "UTO".to_string(),
            expiry_date: "15/04/2012".to_string(),
            source_image: "passport.jpg".to_string(),
            method: ExtractionMethod::Manual,
            scanned_at: "12:34:56".to_string(),
        };

        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(json["full_name"], "ERIKSSON ANNA MARIA");
        assert_eq!(json["passport_number"], "L898902C3");
        assert_eq!(json["dob"], "12/08/1974");
        assert_eq!(json["gender"], "F");
        assert_eq!(json["issuing_country"], "UTO");
        assert_eq!(json["nationality"], "UTO");
        assert_eq!(json["expiry_date"], "15/04/2012");
        assert_eq!(json["method"], "manual");
    }
}
