mod support;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use lettings_import::config::ImportConfig;
use lettings_import::workflows::property_list::domain::{
    DepositScheme, LandlordKind, PaymentFrequency, RowCounts, TenancyStatus,
};
use lettings_import::workflows::property_list::{
    AmountOrder, InMemoryLettingsRepository, LettingsRepository, PropertyListImporter,
};

use support::{importer, options, ScriptedRepository, SAMPLE};

const TWO_PAGES: &str = "=== Page 1 ===\n\
PROPERTY 10 Elm Road W9 1AB\n\
MANAGEMENT 12%\n\
LANDLORD Mr John Smith 45 Oak Street London NW1 2CD\n\
TENANT Ms Jane Doe MOBILE 07700 900456\n\
500.00 2200.00 01/01/2024 31/12/2024\n\
=== Page 2 ===\n\
PROPERTY 22 Cedar Avenue N8 7QT\n\
MANAGEMENT 10%\n\
LANDLORD Mr John Smith\n\
TENANT Mr Sam Hill MOBILE 07700 900999\n\
650.00 1500.00 01/04/2024 31/03/2025\n";

#[test]
fn shared_landlord_across_pages_is_created_once() {
    let repository = InMemoryLettingsRepository::new();
    let summary = importer()
        .import(&repository, TWO_PAGES, options())
        .expect("import succeeds");

    assert_eq!(summary.records_imported, 2);
    assert_eq!(summary.created.landlords, 1);
    assert_eq!(summary.created.properties, 2);

    let landlords = repository.landlords();
    assert_eq!(landlords.len(), 1);
    let landlord_id = landlords[0].0;
    assert_eq!(landlords[0].1.name, "Mr John Smith");

    let tenancies = repository.tenancies();
    assert_eq!(tenancies.len(), 2);
    assert!(tenancies
        .iter()
        .all(|(_, tenancy)| tenancy.landlord_id == landlord_id));
    assert!(repository
        .properties()
        .iter()
        .all(|(_, property)| property.landlord_id == Some(landlord_id)));
}

#[test]
fn street_word_surnames_stay_distinct_landlords() {
    let text = "=== Page 1 ===\n\
PROPERTY 10 Elm Road W9 1AB\n\
LANDLORD Mr Tom Lane 45 Oak Road London NW1 2CD\n\
500.00 2200.00 01/01/2024 31/12/2024\n\
=== Page 2 ===\n\
PROPERTY 22 Cedar Avenue N8 7QT\n\
LANDLORD Mr Bob Close 9 Pine Road London N4 1BB\n\
650.00 1500.00 01/04/2024 31/03/2025\n";
    let repository = InMemoryLettingsRepository::new();
    importer()
        .import(&repository, text, options())
        .expect("import succeeds");

    let mut names: Vec<String> = repository
        .landlords()
        .into_iter()
        .map(|(_, landlord)| landlord.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Mr Bob Close", "Mr Tom Lane"]);

    let landlords = repository.landlords();
    let tenancies = repository.tenancies();
    assert_eq!(tenancies.len(), 2);
    assert_ne!(tenancies[0].1.landlord_id, tenancies[1].1.landlord_id);
    assert_eq!(
        landlords
            .iter()
            .find(|(_, landlord)| landlord.name == "Mr Tom Lane")
            .and_then(|(_, landlord)| landlord.address.clone())
            .as_deref(),
        Some("45 Oak Road London NW1 2CD")
    );
}

#[test]
fn address_only_property_takes_landlord_from_later_page() {
    let text = "=== Page 1 ===\n\
PROPERTY 7 Birch Lane E2 8AA\n\
MANAGEMENT 10%\n\
=== Page 2 ===\n\
PROPERTY 7 Birch Lane E2 8AA\n\
LANDLORD Mr John Smith 45 Oak Street London NW1 2CD\n\
750.00 1500.00 01/05/2024 30/04/2025\n";
    let repository = InMemoryLettingsRepository::new();
    let summary = importer()
        .import(&repository, text, options())
        .expect("import succeeds");

    assert_eq!(summary.records_imported, 1);
    let properties = repository.properties();
    assert_eq!(properties.len(), 1);
    let landlord_id = repository.landlords()[0].0;
    assert_eq!(properties[0].1.landlord_id, Some(landlord_id));
    assert_eq!(repository.tenancies()[0].1.landlord_id, landlord_id);
}

#[test]
fn sample_export_imports_with_expected_counts() {
    let repository = InMemoryLettingsRepository::new();
    let summary = importer()
        .import(&repository, SAMPLE, options())
        .expect("import succeeds");

    assert_eq!(summary.pages_found, 5);
    assert_eq!(summary.pages_processed, 5);
    assert_eq!(summary.records_imported, 3);
    assert!(!summary.interrupted);

    let skipped: Vec<(u32, &str)> = summary
        .skipped
        .iter()
        .map(|page| (page.page, page.reason.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![(4, "missing landlord name"), (6, "missing property address")]
    );

    assert_eq!(
        repository.counts().expect("counts"),
        RowCounts {
            landlords: 2,
            properties: 4,
            tenants: 2,
            tenancies: 3,
            checklist_items: 3,
        }
    );
    assert_eq!(summary.created.tenancies, 3);
    assert_eq!(summary.created.checklist_items, 3);
}

#[test]
fn sample_export_fields_land_in_rows() {
    let repository = InMemoryLettingsRepository::new();
    importer()
        .import(&repository, SAMPLE, options())
        .expect("import succeeds");

    let landlords = repository.landlords();
    let acme = landlords
        .iter()
        .find(|(_, landlord)| landlord.name == "Acme Properties Ltd")
        .expect("company landlord");
    assert_eq!(acme.1.kind, LandlordKind::Company);
    assert_eq!(acme.1.sort_code.as_deref(), Some("40-11-62"));
    assert_eq!(acme.1.bank_account_number.as_deref(), Some("87654321"));
    assert_eq!(
        acme.1.email.as_deref(),
        Some("lettings@acme-properties.co.uk")
    );

    let tenancies = repository.tenancies();
    let first = tenancies
        .iter()
        .find(|(_, tenancy)| tenancy.source_page == 1)
        .expect("page 1 tenancy");
    assert_eq!(first.1.deposit_pence, Some(50_000));
    assert_eq!(first.1.rent_pence, Some(220_000));
    assert_eq!(first.1.rent_frequency, Some(PaymentFrequency::Monthly));
    assert_eq!(first.1.deposit_scheme, Some(DepositScheme::Dps));
    assert_eq!(first.1.status, TenancyStatus::Active);
    assert!(first.1.tenant_id.is_some());

    let void = tenancies
        .iter()
        .find(|(_, tenancy)| tenancy.source_page == 2)
        .expect("page 2 tenancy");
    assert_eq!(void.1.tenant_id, None);
    assert_eq!(void.1.deposit_pence, Some(0));

    let expired = tenancies
        .iter()
        .find(|(_, tenancy)| tenancy.source_page == 3)
        .expect("page 3 tenancy");
    assert_eq!(expired.1.status, TenancyStatus::Expired);
    assert_eq!(expired.1.deposit_scheme, Some(DepositScheme::Tds));

    let postcodes: Vec<Option<String>> = repository
        .properties()
        .into_iter()
        .map(|(_, property)| property.postcode)
        .collect();
    assert_eq!(
        postcodes
            .iter()
            .filter(|postcode| postcode.as_deref() == Some("W9 1AB"))
            .count(),
        2
    );
}

#[test]
fn reimport_creates_no_duplicates() {
    let repository = InMemoryLettingsRepository::new();
    let importer = importer();

    importer
        .import(&repository, SAMPLE, options())
        .expect("first import");
    let after_first = repository.counts().expect("counts");

    let second = importer
        .import(&repository, SAMPLE, options())
        .expect("second import");

    assert_eq!(repository.counts().expect("counts"), after_first);
    assert_eq!(second.records_imported, 0);
    assert_eq!(second.tenancies_already_present, 3);
    assert_eq!(second.created.landlords, 0);
    assert_eq!(second.created.properties, 0);
    assert_eq!(second.created.tenants, 0);
}

#[test]
fn rent_first_convention_swaps_amounts() {
    let repository = InMemoryLettingsRepository::new();
    let importer = PropertyListImporter::new(&ImportConfig {
        amount_order: AmountOrder::RentFirst,
        ..ImportConfig::default()
    })
    .expect("importer");

    importer
        .import(&repository, TWO_PAGES, options())
        .expect("import succeeds");

    let tenancies = repository.tenancies();
    let first = tenancies
        .iter()
        .find(|(_, tenancy)| tenancy.source_page == 1)
        .expect("page 1 tenancy");
    assert_eq!(first.1.rent_pence, Some(50_000));
    assert_eq!(first.1.deposit_pence, Some(220_000));
}

#[test]
fn failed_page_rolls_back_without_poisoning_later_pages() {
    let repository = ScriptedRepository {
        fail_tenancy_on_page: Some(1),
        ..ScriptedRepository::default()
    };

    let summary = importer()
        .import(&repository, TWO_PAGES, options())
        .expect("run completes");

    assert_eq!(summary.records_imported, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].page, 1);
    assert!(summary.skipped[0].reason.starts_with("storage error"));

    let counts = repository.counts().expect("counts");
    assert_eq!(counts.landlords, 1);
    assert_eq!(counts.properties, 1);
    assert_eq!(counts.tenancies, 1);
    assert_eq!(summary.created.landlords, 1);
    assert_eq!(summary.created.properties, 1);

    let properties = repository.inner.properties();
    assert_eq!(properties[0].1.address, "22 Cedar Avenue N8 7QT");
    let landlord_id = repository.inner.landlords()[0].0;
    assert_eq!(repository.inner.tenancies()[0].1.landlord_id, landlord_id);
}

#[test]
fn cancellation_keeps_committed_pages() {
    let cancel = Arc::new(AtomicBool::new(false));
    let repository = ScriptedRepository {
        cancel_after_commit: Some(cancel.clone()),
        ..ScriptedRepository::default()
    };

    let summary = importer()
        .import_with_cancel(&repository, TWO_PAGES, options(), &cancel)
        .expect("run completes");

    assert!(summary.interrupted);
    assert_eq!(summary.pages_found, 2);
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(repository.counts().expect("counts").tenancies, 1);
}

#[test]
fn preview_shows_leading_records_only() {
    let preview = importer().preview(SAMPLE).expect("preview");

    assert_eq!(preview.len(), 3);
    assert_eq!(preview[0].landlord_name.as_deref(), Some("Mr John Smith"));
    assert_eq!(preview[1].tenant_name, None);
    assert_eq!(preview[2].landlord_name.as_deref(), Some("Acme Properties Ltd"));
    assert_eq!(preview[2].rent_amount, Some(1100.0));
}
