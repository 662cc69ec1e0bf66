use std::collections::HashMap;

use serde::Serialize;

use super::domain::{LandlordId, LandlordKind, NewLandlord, NewProperty, NewTenant, PropertyId, TenantId};
use super::extractor::ExtractedRecord;
use super::normalizer::{address_key, name_key, phone_key};
use super::repository::{LettingsRepository, RepositoryError};

/// Rows created while processing a page or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CreatedRows {
    pub landlords: usize,
    pub properties: usize,
    pub tenants: usize,
    pub tenancies: usize,
    pub checklist_items: usize,
}

impl CreatedRows {
    pub fn absorb(&mut self, other: CreatedRows) {
        self.landlords += other.landlords;
        self.properties += other.properties;
        self.tenants += other.tenants;
        self.tenancies += other.tenancies;
        self.checklist_items += other.checklist_items;
    }
}

#[derive(Debug, Clone, Default)]
struct IdentityMaps {
    landlords: HashMap<String, LandlordId>,
    properties: HashMap<String, PropertyId>,
    tenants: HashMap<String, TenantId>,
}

impl IdentityMaps {
    fn absorb(&mut self, other: IdentityMaps) {
        self.landlords.extend(other.landlords);
        self.properties.extend(other.properties);
        self.tenants.extend(other.tenants);
    }
}

/// Run-scoped identity cache.
///
/// Entries recorded while a page is in flight stay staged until the page
/// commits. A rolled-back page discards them, so later pages never see ids of
/// rows that no longer exist.
#[derive(Debug, Clone, Default)]
pub struct IdentityCache {
    committed: IdentityMaps,
    staged: IdentityMaps,
}

fn cached<V: Copy>(
    staged: &HashMap<String, V>,
    committed: &HashMap<String, V>,
    key: &str,
) -> Option<V> {
    staged.get(key).or_else(|| committed.get(key)).copied()
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn landlord(&self, key: &str) -> Option<LandlordId> {
        cached(&self.staged.landlords, &self.committed.landlords, key)
    }

    pub fn property(&self, key: &str) -> Option<PropertyId> {
        cached(&self.staged.properties, &self.committed.properties, key)
    }

    pub fn tenant(&self, key: &str) -> Option<TenantId> {
        cached(&self.staged.tenants, &self.committed.tenants, key)
    }

    fn stage_landlord(&mut self, key: String, id: LandlordId) {
        self.staged.landlords.insert(key, id);
    }

    fn stage_property(&mut self, key: String, id: PropertyId) {
        self.staged.properties.insert(key, id);
    }

    fn stage_tenant(&mut self, key: String, id: TenantId) {
        self.staged.tenants.insert(key, id);
    }

    pub fn commit_page(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        self.committed.absorb(staged);
    }

    pub fn discard_page(&mut self) {
        self.staged = IdentityMaps::default();
    }
}

/// Landlord for the record: run cache by normalized name, then storage by
/// exact name, then insert. `None` when the page names no landlord.
pub fn resolve_landlord<R>(
    repository: &R,
    cache: &mut IdentityCache,
    record: &ExtractedRecord,
    created: &mut CreatedRows,
) -> Result<Option<LandlordId>, RepositoryError>
where
    R: LettingsRepository + ?Sized,
{
    let Some(name) = record.landlord_name.as_deref() else {
        return Ok(None);
    };
    let key = name_key(name);
    if let Some(id) = cache.landlord(&key) {
        return Ok(Some(id));
    }

    let id = match repository.find_landlord_by_name(name)? {
        Some(id) => id,
        None => {
            let id = repository.insert_landlord(&NewLandlord {
                name: name.to_string(),
                kind: LandlordKind::classify(name),
                address: record.landlord_address.clone(),
                phone: record.landlord_phone.clone(),
                mobile: record.landlord_mobile.clone(),
                email: record.landlord_email.clone(),
                bank_name: record.bank_name.clone(),
                bank_account_number: record.bank_account_number.clone(),
                sort_code: record.sort_code.clone(),
            })?;
            created.landlords += 1;
            tracing::debug!(page = record.page, landlord_id = %id, name, "created landlord");
            id
        }
    };

    cache.stage_landlord(key, id);
    Ok(Some(id))
}

/// Property keyed on the full normalized address. Distinct flats sharing a
/// postcode stay distinct.
pub fn resolve_property<R>(
    repository: &R,
    cache: &mut IdentityCache,
    record: &ExtractedRecord,
    landlord: Option<LandlordId>,
    created: &mut CreatedRows,
) -> Result<Option<PropertyId>, RepositoryError>
where
    R: LettingsRepository + ?Sized,
{
    let Some(address) = record.property_address.as_deref() else {
        return Ok(None);
    };
    let key = address_key(address);
    if let Some(id) = cache.property(&key) {
        adopt_landlord(repository, record, id, landlord)?;
        return Ok(Some(id));
    }

    let id = match repository.find_property_by_address(&key)? {
        Some(id) => {
            adopt_landlord(repository, record, id, landlord)?;
            id
        }
        None => {
            let id = repository.insert_property(&NewProperty {
                address: address.to_string(),
                address_key: key.clone(),
                postcode: record.postcode.clone(),
                landlord_id: landlord,
                management_fee_percent: record.management_fee_percent,
            })?;
            created.properties += 1;
            tracing::debug!(page = record.page, property_id = %id, address, "created property");
            id
        }
    };

    cache.stage_property(key, id);
    Ok(Some(id))
}

/// A property first seen on a page without a landlord takes the landlord of
/// the first later page that names one.
fn adopt_landlord<R>(
    repository: &R,
    record: &ExtractedRecord,
    property: PropertyId,
    landlord: Option<LandlordId>,
) -> Result<(), RepositoryError>
where
    R: LettingsRepository + ?Sized,
{
    if let Some(landlord) = landlord {
        if repository.assign_property_landlord(property, landlord)? {
            tracing::debug!(
                page = record.page,
                property_id = %property,
                landlord_id = %landlord,
                "assigned property landlord"
            );
        }
    }
    Ok(())
}

/// Tenant keyed on mobile digits when present, else on the normalized name.
/// No tenant name means a void period.
pub fn resolve_tenant<R>(
    repository: &R,
    cache: &mut IdentityCache,
    record: &ExtractedRecord,
    created: &mut CreatedRows,
) -> Result<Option<TenantId>, RepositoryError>
where
    R: LettingsRepository + ?Sized,
{
    let Some(name) = record.tenant_name.as_deref() else {
        return Ok(None);
    };
    let mobile = record
        .tenant_mobile
        .as_deref()
        .map(phone_key)
        .filter(|digits| !digits.is_empty());

    let key = match &mobile {
        Some(digits) => format!("mobile:{digits}"),
        None => format!("name:{}", name_key(name)),
    };
    if let Some(id) = cache.tenant(&key) {
        return Ok(Some(id));
    }

    let existing = match &mobile {
        Some(digits) => repository.find_tenant_by_mobile(digits)?,
        None => repository.find_tenant_by_name(name)?,
    };
    let id = match existing {
        Some(id) => id,
        None => {
            let id = repository.insert_tenant(&NewTenant {
                name: name.to_string(),
                mobile: record.tenant_mobile.clone(),
            })?;
            created.tenants += 1;
            tracing::debug!(page = record.page, tenant_id = %id, "created tenant");
            id
        }
    };

    cache.stage_tenant(key, id);
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::property_list::repository::InMemoryLettingsRepository;

    fn record(address: &str, landlord: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            page: 1,
            property_address: Some(address.to_string()),
            landlord_name: landlord.map(str::to_string),
            ..ExtractedRecord::default()
        }
    }

    #[test]
    fn same_landlord_name_resolves_once_per_run() {
        let repository = InMemoryLettingsRepository::new();
        let mut cache = IdentityCache::new();
        let mut created = CreatedRows::default();

        let first = resolve_landlord(&repository, &mut cache, &record("1 A Road", Some("Mr John Smith")), &mut created)
            .expect("resolve");
        let second = resolve_landlord(&repository, &mut cache, &record("2 B Road", Some("MR  JOHN SMITH")), &mut created)
            .expect("resolve");

        assert_eq!(first, second);
        assert_eq!(created.landlords, 1);
        assert_eq!(repository.counts().expect("counts").landlords, 1);
    }

    #[test]
    fn landlord_found_in_storage_is_not_recreated() {
        let repository = InMemoryLettingsRepository::new();
        let mut created = CreatedRows::default();
        let existing = resolve_landlord(
            &repository,
            &mut IdentityCache::new(),
            &record("1 A Road", Some("Acme Properties Ltd")),
            &mut created,
        )
        .expect("resolve");

        let mut fresh_run = IdentityCache::new();
        let mut created_again = CreatedRows::default();
        let found = resolve_landlord(
            &repository,
            &mut fresh_run,
            &record("1 A Road", Some("Acme Properties Ltd")),
            &mut created_again,
        )
        .expect("resolve");

        assert_eq!(existing, found);
        assert_eq!(created_again.landlords, 0);
        assert_eq!(repository.landlords()[0].1.kind, LandlordKind::Company);
    }

    #[test]
    fn property_without_landlord_adopts_the_next_named_landlord() {
        let repository = InMemoryLettingsRepository::new();
        let mut cache = IdentityCache::new();
        let mut created = CreatedRows::default();

        let property = resolve_property(&repository, &mut cache, &record("7 Birch Lane E2 8AA", None), None, &mut created)
            .expect("resolve")
            .expect("property");
        assert_eq!(repository.properties()[0].1.landlord_id, None);

        let owner = LandlordId(41);
        let other = LandlordId(42);
        resolve_property(&repository, &mut cache, &record("7 Birch Lane E2 8AA", None), Some(owner), &mut created)
            .expect("resolve");
        resolve_property(&repository, &mut cache, &record("7 Birch Lane E2 8AA", None), Some(other), &mut created)
            .expect("resolve");

        let properties = repository.properties();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].0, property);
        assert_eq!(properties[0].1.landlord_id, Some(owner));
    }

    #[test]
    fn shared_postcode_does_not_merge_properties() {
        let repository = InMemoryLettingsRepository::new();
        let mut cache = IdentityCache::new();
        let mut created = CreatedRows::default();

        let mut flat_one = record("Flat 1, 10 Elm Road W9 1AB", None);
        flat_one.postcode = Some("W9 1AB".to_string());
        let mut flat_two = record("Flat 2, 10 Elm Road W9 1AB", None);
        flat_two.postcode = Some("W9 1AB".to_string());

        let one = resolve_property(&repository, &mut cache, &flat_one, None, &mut created).expect("one");
        let two = resolve_property(&repository, &mut cache, &flat_two, None, &mut created).expect("two");
        let again = resolve_property(
            &repository,
            &mut cache,
            &record("flat 1 10 elm road w9 1ab", None),
            None,
            &mut created,
        )
        .expect("again");

        assert_ne!(one, two);
        assert_eq!(one, again);
        assert_eq!(created.properties, 2);
    }

    #[test]
    fn tenant_prefers_mobile_and_allows_void_periods() {
        let repository = InMemoryLettingsRepository::new();
        let mut cache = IdentityCache::new();
        let mut created = CreatedRows::default();

        let mut jane = record("1 A Road", None);
        jane.tenant_name = Some("Ms Jane Doe".to_string());
        jane.tenant_mobile = Some("07700 900456".to_string());
        let mut renamed = jane.clone();
        renamed.tenant_name = Some("Mrs Jane Doe-Smith".to_string());
        renamed.tenant_mobile = Some("07700900456".to_string());

        let first = resolve_tenant(&repository, &mut cache, &jane, &mut created).expect("tenant");
        let second = resolve_tenant(&repository, &mut cache, &renamed, &mut created).expect("tenant");
        let void = resolve_tenant(&repository, &mut cache, &record("1 A Road", None), &mut created)
            .expect("void");

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(void, None);
        assert_eq!(created.tenants, 1);
    }

    #[test]
    fn discarded_page_entries_are_forgotten() {
        let mut cache = IdentityCache::new();
        cache.stage_landlord("mr john smith".to_string(), LandlordId(1));
        assert_eq!(cache.landlord("mr john smith"), Some(LandlordId(1)));

        cache.discard_page();
        assert_eq!(cache.landlord("mr john smith"), None);

        cache.stage_property("10 elm road".to_string(), PropertyId(2));
        cache.commit_page();
        cache.discard_page();
        assert_eq!(cache.property("10 elm road"), Some(PropertyId(2)));
    }
}
