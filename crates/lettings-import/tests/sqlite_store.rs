mod support;

use lettings_import::storage::SqliteLettingsRepository;
use lettings_import::workflows::property_list::domain::RowCounts;
use lettings_import::workflows::property_list::LettingsRepository;

use support::{importer, options, SAMPLE};

#[test]
fn import_persists_and_reimport_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lettings.sqlite");
    let expected = RowCounts {
        landlords: 2,
        properties: 4,
        tenants: 2,
        tenancies: 3,
        checklist_items: 3,
    };

    {
        let repository = SqliteLettingsRepository::open(&path).expect("open database");
        let summary = importer()
            .import(&repository, SAMPLE, options())
            .expect("first import");
        assert_eq!(summary.records_imported, 3);
        assert_eq!(repository.counts().expect("counts"), expected);
    }

    let reopened = SqliteLettingsRepository::open(&path).expect("reopen database");
    assert_eq!(reopened.counts().expect("counts"), expected);

    let second = importer()
        .import(&reopened, SAMPLE, options())
        .expect("second import");

    assert_eq!(second.records_imported, 0);
    assert_eq!(second.tenancies_already_present, 3);
    assert_eq!(second.created.landlords, 0);
    assert_eq!(second.created.properties, 0);
    assert_eq!(reopened.counts().expect("counts"), expected);
}
