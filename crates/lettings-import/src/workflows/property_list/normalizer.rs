/// Maximum length, in characters, of any sanitized field.
pub const MAX_FIELD_CHARS: usize = 250;

const STRIPPED: [char; 9] = ['<', '>', '\'', '"', ';', '&', '=', '\\', '\u{feff}'];

/// Strip markup-ish characters, collapse whitespace, trim and truncate.
///
/// Applied to every string pulled out of a page before it reaches the
/// reconciler. Running it on its own output changes nothing.
pub fn sanitize(value: &str) -> String {
    let cleaned = value.replace(STRIPPED, "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_FIELD_CHARS) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}

/// Sanitize, mapping an empty result to `None`.
pub fn sanitize_field(value: &str) -> Option<String> {
    let sanitized = sanitize(value);
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Case-insensitive, whitespace-collapsed identity key for names.
pub fn name_key(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Identity key for a full address. Commas and full stops are dropped so
/// `10 Elm Road, W9 1AB` and `10 Elm Road W9 1AB` agree.
pub fn address_key(value: &str) -> String {
    name_key(&value.replace([',', '.'], " "))
}

/// Digits of a phone number, keeping a leading `+`.
pub fn phone_key(value: &str) -> String {
    let trimmed = value.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_reserved_characters_and_whitespace() {
        let raw = "  Smith &   Sons;\tO'Brien <Ltd>=\\ ";
        assert_eq!(sanitize(raw), "Smith Sons OBrien Ltd");
    }

    #[test]
    fn sanitize_truncates_to_limit() {
        let long = "a".repeat(MAX_FIELD_CHARS + 40);
        assert_eq!(sanitize(&long).chars().count(), MAX_FIELD_CHARS);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "  Flat 3,  10 Elm Road\n London W9 1AB  ",
            "<script>alert('x')</script>",
            "Acme Properties Ltd & Co; Acc=1",
            "",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once);
        }

        let long = format!("{} tail", "word ".repeat(80));
        let once = sanitize(&long);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn sanitize_field_maps_blank_to_none() {
        assert_eq!(sanitize_field("  ;;  "), None);
        assert_eq!(sanitize_field(" Barclays "), Some("Barclays".to_string()));
    }

    #[test]
    fn keys_ignore_case_and_spacing() {
        assert_eq!(name_key("  Mr  JOHN   Smith "), "mr john smith");
        assert_eq!(
            address_key("10 Elm Road, London W9 1AB"),
            address_key("10  elm road london  w9 1ab")
        );
        assert_eq!(phone_key("07700 900 123"), "07700900123");
        assert_eq!(phone_key("+44 7700 900123"), "+447700900123");
    }
}
