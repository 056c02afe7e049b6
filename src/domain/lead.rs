use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder stored for any field that could not be extracted
pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed column layout of every city table
pub const LEAD_HEADERS: [&str; 8] = [
    "Clinic Name",
    "City",
    "Website",
    "Email",
    "Phone",
    "Instagram",
    "Source URL",
    "Date Added",
];

pub const WEBSITE_COLUMN: &str = "Website";
pub const EMAIL_COLUMN: &str = "Email";
pub const DATE_ADDED_COLUMN: &str = "Date Added";
pub const CLINIC_NAME_COLUMN: &str = "Clinic Name";

/// ISO calendar date format used for the "Date Added" column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One scraped clinic contact record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub city: String,
    pub website: String,
    pub email: String,
    pub phone: String,
    pub instagram: String,
    pub source_url: String,
    pub date_added: NaiveDate,
}

impl Lead {
    /// Lead with every optional field set to "N/A"
    pub fn unknown(city: &str, source_url: &str, date_added: NaiveDate) -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
            city: city.to_string(),
            website: NOT_AVAILABLE.to_string(),
            email: NOT_AVAILABLE.to_string(),
            phone: NOT_AVAILABLE.to_string(),
            instagram: NOT_AVAILABLE.to_string(),
            source_url: source_url.to_string(),
            date_added,
        }
    }

    /// Cells in [`LEAD_HEADERS`] order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.city.clone(),
            self.website.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.instagram.clone(),
            self.source_url.clone(),
            self.date_added.format(DATE_FORMAT).to_string(),
        ]
    }

    pub fn has_website(&self) -> bool {
        is_present(&self.website)
    }

    pub fn has_email(&self) -> bool {
        is_present(&self.email)
    }
}

/// Header row as owned strings
pub fn header_row() -> Vec<String> {
    LEAD_HEADERS.iter().map(|h| (*h).to_string()).collect()
}

/// True when a cell carries a real value rather than a blank or "N/A"
pub fn is_present(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != NOT_AVAILABLE
}

/// Wrap an optional extracted value, degrading to "N/A"
pub fn or_not_available(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Trim and title-case a city name ("new york" -> "New York")
pub fn normalize_city(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_was_letter = false;
    for ch in raw.trim().chars() {
        if ch.is_alphabetic() {
            if previous_was_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_was_letter = true;
        } else {
            out.push(ch);
            previous_was_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_row_follows_header_order() {
        let lead = Lead {
            name: "Smile Dental".into(),
            city: "Lahore".into(),
            website: "https://smile.pk".into(),
            email: "info@smile.pk".into(),
            phone: "+92 42 1234567".into(),
            instagram: NOT_AVAILABLE.into(),
            source_url: "https://directory.test/lahore".into(),
            date_added: date(),
        };
        let row = lead.to_row();
        assert_eq!(row.len(), LEAD_HEADERS.len());
        assert_eq!(row[2], "https://smile.pk");
        assert_eq!(row[7], "2024-05-17");
    }

    #[test]
    fn test_unknown_lead_is_all_placeholders() {
        let lead = Lead::unknown("Karachi", "https://src.test", date());
        assert!(!lead.has_website());
        assert!(!lead.has_email());
        assert_eq!(lead.phone, NOT_AVAILABLE);
    }

    #[test]
    fn test_is_present() {
        assert!(is_present("a@b.co"));
        assert!(!is_present("N/A"));
        assert!(!is_present("   "));
    }

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("  lahore "), "Lahore");
        assert_eq!(normalize_city("NEW YORK"), "New York");
        assert_eq!(normalize_city("rawalpindi-islamabad"), "Rawalpindi-Islamabad");
    }

    #[test]
    fn test_or_not_available() {
        assert_eq!(or_not_available(Some("  x ".into())), "x");
        assert_eq!(or_not_available(Some("   ".into())), NOT_AVAILABLE);
        assert_eq!(or_not_available(None), NOT_AVAILABLE);
    }
}
