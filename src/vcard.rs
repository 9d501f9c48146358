//! vCard 3.0 contact cards for the "save contact" links.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};

pub const CONTENT_TYPE: &str = "text/vcard; name=\"contact.vcf\"";
pub const CONTENT_DISPOSITION: &str = "inline; filename=\"contact.vcf\"";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub cell_phone: String,
}

impl Contact {
    /// Splits a display name on spaces. Three or more parts give a middle
    /// name and a last name made of the rest.
    pub fn from_name(name: &str, phone: &str) -> Self {
        let parts: Vec<&str> = name.split(' ').collect();
        let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();

        let (middle_name, last_name) = if parts.len() > 2 {
            (part(1), parts[2..].join(" "))
        } else {
            (String::new(), part(1))
        };

        Self {
            first_name: part(0),
            middle_name,
            last_name,
            cell_phone: phone.to_string(),
        }
    }

    fn formatted_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_vcard(&self, revision: DateTime<Utc>) -> String {
        let mut card = String::new();
        let _ = write!(card, "BEGIN:VCARD\r\n");
        let _ = write!(card, "VERSION:3.0\r\n");
        let _ = write!(
            card,
            "FN;CHARSET=UTF-8:{}\r\n",
            escape(&self.formatted_name())
        );
        let _ = write!(
            card,
            "N;CHARSET=UTF-8:{};{};{};;\r\n",
            escape(&self.last_name),
            escape(&self.first_name),
            escape(&self.middle_name)
        );
        if !self.cell_phone.is_empty() {
            let _ = write!(card, "TEL;TYPE=CELL:{}\r\n", self.cell_phone);
        }
        let _ = write!(
            card,
            "REV:{}\r\n",
            revision.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let _ = write!(card, "END:VCARD\r\n");
        card
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn revision() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn two_part_names_split_into_first_and_last() {
        let contact = Contact::from_name("שרה לוי", "0501234567");
        assert_eq!(contact.first_name, "שרה");
        assert_eq!(contact.last_name, "לוי");
        assert_eq!(contact.middle_name, "");

        let card = contact.to_vcard(revision());
        assert!(card.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\n"));
        assert!(card.contains("FN;CHARSET=UTF-8:שרה לוי\r\n"));
        assert!(card.contains("N;CHARSET=UTF-8:לוי;שרה;;;\r\n"));
        assert!(card.contains("TEL;TYPE=CELL:0501234567\r\n"));
        assert!(card.contains("REV:2026-10-14T09:30:00.000Z\r\n"));
        assert!(card.ends_with("END:VCARD\r\n"));
    }

    #[test]
    fn long_names_get_a_middle_name() {
        let contact = Contact::from_name("אנה מריה דה לה קרוז", "050");
        assert_eq!(contact.first_name, "אנה");
        assert_eq!(contact.middle_name, "מריה");
        assert_eq!(contact.last_name, "דה לה קרוז");
    }

    #[test]
    fn single_names_have_no_last_name() {
        let contact = Contact::from_name("מיכל", "");
        assert_eq!(contact.first_name, "מיכל");
        assert_eq!(contact.last_name, "");

        let card = contact.to_vcard(revision());
        assert!(card.contains("N;CHARSET=UTF-8:;מיכל;;;\r\n"));
        assert!(!card.contains("TEL"));
    }

    #[test]
    fn separators_are_escaped() {
        let contact = Contact::from_name("כהן, דנה", "050");
        let card = contact.to_vcard(revision());
        assert!(card.contains("N;CHARSET=UTF-8:דנה;כהן\\,;;;\r\n"));
    }
}
