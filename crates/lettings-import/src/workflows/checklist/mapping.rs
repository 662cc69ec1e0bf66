use crate::workflows::property_list::domain::ChecklistItemKind;
use crate::workflows::property_list::normalizer::name_key;
use std::collections::HashMap;
use std::sync::OnceLock;

static CHECKLIST_LABEL_MAP: OnceLock<HashMap<String, ChecklistItemKind>> = OnceLock::new();

pub(crate) fn kind_for_label(label: &str) -> Option<ChecklistItemKind> {
    let normalized = normalize_label(label);
    checklist_label_map().get(&normalized).copied()
}

/// Lower-case, drop punctuation other than `/`, collapse whitespace.
fn normalize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '/' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    name_key(&cleaned)
}

fn checklist_label_map() -> &'static HashMap<String, ChecklistItemKind> {
    CHECKLIST_LABEL_MAP.get_or_init(|| {
        use ChecklistItemKind::*;

        const LABEL_TO_KIND: &[(&str, ChecklistItemKind)] = &[
            // Gas
            ("Gas Safety", GasSafetyCertificate),
            ("Gas Safety Certificate", GasSafetyCertificate),
            ("Gas Safety Cert", GasSafetyCertificate),
            ("Gas Safe", GasSafetyCertificate),
            ("Gas Cert", GasSafetyCertificate),
            ("CP12", GasSafetyCertificate),
            ("LGSR", GasSafetyCertificate),
            // Energy
            ("EPC", EnergyPerformanceCertificate),
            ("Energy Performance Certificate", EnergyPerformanceCertificate),
            ("Energy Performance", EnergyPerformanceCertificate),
            // Electrical
            ("EICR", ElectricalSafetyReport),
            ("Electrical Safety", ElectricalSafetyReport),
            ("Electrical Safety Certificate", ElectricalSafetyReport),
            ("Electrical Certificate", ElectricalSafetyReport),
            (
                "Electrical Installation Condition Report",
                ElectricalSafetyReport,
            ),
            // Deposit
            ("Deposit Protected", DepositProtection),
            ("Deposit Protection", DepositProtection),
            ("Deposit Protection Scheme", DepositProtection),
            ("Deposit Registered", DepositProtection),
            ("Prescribed Information", DepositProtection),
            // Move-in paperwork
            ("Inventory", Inventory),
            ("Inventory / Check In", Inventory),
            ("Check In", Inventory),
            ("Right to Rent", RightToRent),
            ("Right to Rent Check", RightToRent),
            ("How to Rent", HowToRentGuide),
            ("How to Rent Guide", HowToRentGuide),
            ("Smoke Alarms", SmokeAndCoAlarms),
            ("Smoke Alarm", SmokeAndCoAlarms),
            ("Smoke and CO Alarms", SmokeAndCoAlarms),
            ("Smoke & CO Alarms", SmokeAndCoAlarms),
            ("CO Alarm", SmokeAndCoAlarms),
        ];

        let mut map = HashMap::with_capacity(LABEL_TO_KIND.len() + 8);
        for (label, kind) in LABEL_TO_KIND {
            map.insert(normalize_label(label), *kind);
        }
        for kind in ChecklistItemKind::ordered() {
            map.entry(normalize_label(kind.label())).or_insert(kind);
            map.entry(normalize_label(kind.key())).or_insert(kind);
        }
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_labels() {
        assert_eq!(
            kind_for_label("GAS SAFETY"),
            Some(ChecklistItemKind::GasSafetyCertificate)
        );
        assert_eq!(
            kind_for_label("  epc "),
            Some(ChecklistItemKind::EnergyPerformanceCertificate)
        );
        assert_eq!(
            kind_for_label("Smoke & CO alarms"),
            Some(ChecklistItemKind::SmokeAndCoAlarms)
        );
        assert_eq!(
            kind_for_label("right_to_rent"),
            Some(ChecklistItemKind::RightToRent)
        );
        assert_eq!(
            kind_for_label("Electrical installation condition report"),
            Some(ChecklistItemKind::ElectricalSafetyReport)
        );
    }

    #[test]
    fn unknown_labels_are_ignored() {
        assert_eq!(kind_for_label("Management"), None);
        assert_eq!(kind_for_label(""), None);
    }
}
