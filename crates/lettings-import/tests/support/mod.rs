#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use lettings_import::config::ImportConfig;
use lettings_import::workflows::property_list::domain::{
    ChecklistItemId, ChecklistItemKind, ChecklistItemRecord, LandlordId, NewChecklistItem,
    NewLandlord, NewProperty, NewTenancy, NewTenant, PropertyId, RowCounts, TenancyId, TenantId,
};
use lettings_import::workflows::property_list::{
    InMemoryLettingsRepository, LettingsRepository, PropertyListImporter, RepositoryError,
    RunOptions,
};

pub const SAMPLE: &str = include_str!("../../property_list_sample.txt");

pub fn options() -> RunOptions {
    RunOptions {
        as_of: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid as-of date"),
    }
}

pub fn importer() -> PropertyListImporter {
    PropertyListImporter::new(&ImportConfig::default()).expect("default config builds")
}

/// Wraps the in-memory repository to fail tenancy writes for chosen source
/// pages, or to raise a cancellation flag after the first committed page.
#[derive(Default)]
pub struct ScriptedRepository {
    pub inner: InMemoryLettingsRepository,
    pub fail_tenancy_on_page: Option<u32>,
    pub cancel_after_commit: Option<Arc<AtomicBool>>,
}

impl LettingsRepository for ScriptedRepository {
    fn begin(&self) -> Result<(), RepositoryError> {
        self.inner.begin()
    }

    fn commit(&self) -> Result<(), RepositoryError> {
        self.inner.commit()?;
        if let Some(flag) = &self.cancel_after_commit {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), RepositoryError> {
        self.inner.rollback()
    }

    fn find_landlord_by_name(&self, name: &str) -> Result<Option<LandlordId>, RepositoryError> {
        self.inner.find_landlord_by_name(name)
    }

    fn insert_landlord(&self, landlord: &NewLandlord) -> Result<LandlordId, RepositoryError> {
        self.inner.insert_landlord(landlord)
    }

    fn find_property_by_address(
        &self,
        address_key: &str,
    ) -> Result<Option<PropertyId>, RepositoryError> {
        self.inner.find_property_by_address(address_key)
    }

    fn insert_property(&self, property: &NewProperty) -> Result<PropertyId, RepositoryError> {
        self.inner.insert_property(property)
    }

    fn assign_property_landlord(
        &self,
        property: PropertyId,
        landlord: LandlordId,
    ) -> Result<bool, RepositoryError> {
        self.inner.assign_property_landlord(property, landlord)
    }

    fn find_tenant_by_mobile(&self, mobile_key: &str) -> Result<Option<TenantId>, RepositoryError> {
        self.inner.find_tenant_by_mobile(mobile_key)
    }

    fn find_tenant_by_name(&self, name: &str) -> Result<Option<TenantId>, RepositoryError> {
        self.inner.find_tenant_by_name(name)
    }

    fn insert_tenant(&self, tenant: &NewTenant) -> Result<TenantId, RepositoryError> {
        self.inner.insert_tenant(tenant)
    }

    fn find_tenancy(
        &self,
        property: PropertyId,
        start_date: Option<NaiveDate>,
    ) -> Result<Option<TenancyId>, RepositoryError> {
        self.inner.find_tenancy(property, start_date)
    }

    fn latest_tenancy_for_property(
        &self,
        property: PropertyId,
    ) -> Result<Option<TenancyId>, RepositoryError> {
        self.inner.latest_tenancy_for_property(property)
    }

    fn insert_tenancy(&self, tenancy: &NewTenancy) -> Result<TenancyId, RepositoryError> {
        if self.fail_tenancy_on_page == Some(tenancy.source_page) {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        self.inner.insert_tenancy(tenancy)
    }

    fn find_checklist_item(
        &self,
        tenancy: TenancyId,
        kind: ChecklistItemKind,
    ) -> Result<Option<ChecklistItemRecord>, RepositoryError> {
        self.inner.find_checklist_item(tenancy, kind)
    }

    fn insert_checklist_item(
        &self,
        item: &NewChecklistItem,
    ) -> Result<ChecklistItemId, RepositoryError> {
        self.inner.insert_checklist_item(item)
    }

    fn complete_checklist_item(
        &self,
        id: ChecklistItemId,
        document_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.inner.complete_checklist_item(id, document_ref)
    }

    fn counts(&self) -> Result<RowCounts, RepositoryError> {
        self.inner.counts()
    }
}
