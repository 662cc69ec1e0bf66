use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use super::domain::{
    ChecklistItemId, ChecklistItemKind, ChecklistItemRecord, LandlordId, NewChecklistItem,
    NewLandlord, NewProperty, NewTenancy, NewTenant, PropertyId, RowCounts, TenancyId, TenantId,
};
use super::normalizer::phone_key;

/// Storage boundary for the import pipeline.
///
/// Writes between `begin` and `commit` belong to one source page; `rollback`
/// discards every write since the matching `begin`.
pub trait LettingsRepository: Send + Sync {
    fn begin(&self) -> Result<(), RepositoryError>;
    fn commit(&self) -> Result<(), RepositoryError>;
    fn rollback(&self) -> Result<(), RepositoryError>;

    /// Exact (sanitized) name match.
    fn find_landlord_by_name(&self, name: &str) -> Result<Option<LandlordId>, RepositoryError>;
    fn insert_landlord(&self, landlord: &NewLandlord) -> Result<LandlordId, RepositoryError>;

    /// Lookup by normalized full address, never by postcode.
    fn find_property_by_address(
        &self,
        address_key: &str,
    ) -> Result<Option<PropertyId>, RepositoryError>;
    fn insert_property(&self, property: &NewProperty) -> Result<PropertyId, RepositoryError>;
    /// Fill in the landlord of a property stored without one. An existing
    /// landlord is never replaced; returns whether the row changed.
    fn assign_property_landlord(
        &self,
        property: PropertyId,
        landlord: LandlordId,
    ) -> Result<bool, RepositoryError>;

    /// `mobile_key` is the digits-only form produced by `phone_key`.
    fn find_tenant_by_mobile(&self, mobile_key: &str) -> Result<Option<TenantId>, RepositoryError>;
    fn find_tenant_by_name(&self, name: &str) -> Result<Option<TenantId>, RepositoryError>;
    fn insert_tenant(&self, tenant: &NewTenant) -> Result<TenantId, RepositoryError>;

    /// Tenancy on `property` starting on `start_date`; a missing start date
    /// only matches another missing start date.
    fn find_tenancy(
        &self,
        property: PropertyId,
        start_date: Option<NaiveDate>,
    ) -> Result<Option<TenancyId>, RepositoryError>;
    /// Most recent tenancy by start date, then by id.
    fn latest_tenancy_for_property(
        &self,
        property: PropertyId,
    ) -> Result<Option<TenancyId>, RepositoryError>;
    fn insert_tenancy(&self, tenancy: &NewTenancy) -> Result<TenancyId, RepositoryError>;

    fn find_checklist_item(
        &self,
        tenancy: TenancyId,
        kind: ChecklistItemKind,
    ) -> Result<Option<ChecklistItemRecord>, RepositoryError>;
    fn insert_checklist_item(
        &self,
        item: &NewChecklistItem,
    ) -> Result<ChecklistItemId, RepositoryError>;
    /// Mark an item complete, keeping the existing document reference when
    /// `document_ref` is `None`.
    fn complete_checklist_item(
        &self,
        id: ChecklistItemId,
        document_ref: Option<&str>,
    ) -> Result<(), RepositoryError>;

    fn counts(&self) -> Result<RowCounts, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Default)]
struct MemoryTables {
    next_id: i64,
    landlords: Vec<(LandlordId, NewLandlord)>,
    properties: Vec<(PropertyId, NewProperty)>,
    tenants: Vec<(TenantId, NewTenant)>,
    tenancies: Vec<(TenancyId, NewTenancy)>,
    checklist_items: Vec<ChecklistItemRecord>,
}

impl MemoryTables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: MemoryTables,
    snapshot: Option<MemoryTables>,
}

/// Process-local repository. `begin` takes a snapshot that `rollback`
/// restores.
#[derive(Debug, Default)]
pub struct InMemoryLettingsRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryLettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }

    fn tables<T>(&self, read: impl FnOnce(&MemoryTables) -> T) -> T {
        match self.state.lock() {
            Ok(guard) => read(&guard.tables),
            Err(poisoned) => read(&poisoned.into_inner().tables),
        }
    }

    pub fn landlords(&self) -> Vec<(LandlordId, NewLandlord)> {
        self.tables(|tables| tables.landlords.clone())
    }

    pub fn properties(&self) -> Vec<(PropertyId, NewProperty)> {
        self.tables(|tables| tables.properties.clone())
    }

    pub fn tenants(&self) -> Vec<(TenantId, NewTenant)> {
        self.tables(|tables| tables.tenants.clone())
    }

    pub fn tenancies(&self) -> Vec<(TenancyId, NewTenancy)> {
        self.tables(|tables| tables.tenancies.clone())
    }

    pub fn checklist_items(&self) -> Vec<ChecklistItemRecord> {
        self.tables(|tables| tables.checklist_items.clone())
    }
}

impl LettingsRepository for InMemoryLettingsRepository {
    fn begin(&self) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.snapshot.is_some() {
            return Err(RepositoryError::Conflict);
        }
        state.snapshot = Some(state.tables.clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.snapshot.take().ok_or(RepositoryError::NotFound)?;
        Ok(())
    }

    fn rollback(&self) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let snapshot = state.snapshot.take().ok_or(RepositoryError::NotFound)?;
        state.tables = snapshot;
        Ok(())
    }

    fn find_landlord_by_name(&self, name: &str) -> Result<Option<LandlordId>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .landlords
            .iter()
            .find(|(_, landlord)| landlord.name == name)
            .map(|(id, _)| *id))
    }

    fn insert_landlord(&self, landlord: &NewLandlord) -> Result<LandlordId, RepositoryError> {
        let mut state = self.state()?;
        let tables = &mut state.tables;
        if tables.landlords.iter().any(|(_, row)| row.name == landlord.name) {
            return Err(RepositoryError::Conflict);
        }
        let id = LandlordId(tables.next_id());
        tables.landlords.push((id, landlord.clone()));
        Ok(id)
    }

    fn find_property_by_address(
        &self,
        address_key: &str,
    ) -> Result<Option<PropertyId>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .properties
            .iter()
            .find(|(_, property)| property.address_key == address_key)
            .map(|(id, _)| *id))
    }

    fn insert_property(&self, property: &NewProperty) -> Result<PropertyId, RepositoryError> {
        let mut state = self.state()?;
        let tables = &mut state.tables;
        if tables
            .properties
            .iter()
            .any(|(_, row)| row.address_key == property.address_key)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = PropertyId(tables.next_id());
        tables.properties.push((id, property.clone()));
        Ok(id)
    }

    fn assign_property_landlord(
        &self,
        property: PropertyId,
        landlord: LandlordId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state()?;
        let row = state
            .tables
            .properties
            .iter_mut()
            .find(|(id, row)| *id == property && row.landlord_id.is_none());
        Ok(match row {
            Some((_, row)) => {
                row.landlord_id = Some(landlord);
                true
            }
            None => false,
        })
    }

    fn find_tenant_by_mobile(&self, mobile_key: &str) -> Result<Option<TenantId>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .tenants
            .iter()
            .find(|(_, tenant)| {
                tenant
                    .mobile
                    .as_deref()
                    .map(phone_key)
                    .is_some_and(|key| key == mobile_key)
            })
            .map(|(id, _)| *id))
    }

    fn find_tenant_by_name(&self, name: &str) -> Result<Option<TenantId>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .tenants
            .iter()
            .find(|(_, tenant)| tenant.name == name)
            .map(|(id, _)| *id))
    }

    fn insert_tenant(&self, tenant: &NewTenant) -> Result<TenantId, RepositoryError> {
        let mut state = self.state()?;
        let id = TenantId(state.tables.next_id());
        state.tables.tenants.push((id, tenant.clone()));
        Ok(id)
    }

    fn find_tenancy(
        &self,
        property: PropertyId,
        start_date: Option<NaiveDate>,
    ) -> Result<Option<TenancyId>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .tenancies
            .iter()
            .find(|(_, tenancy)| {
                tenancy.property_id == property && tenancy.start_date == start_date
            })
            .map(|(id, _)| *id))
    }

    fn latest_tenancy_for_property(
        &self,
        property: PropertyId,
    ) -> Result<Option<TenancyId>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .tenancies
            .iter()
            .filter(|(_, tenancy)| tenancy.property_id == property)
            .max_by_key(|(id, tenancy)| (tenancy.start_date, *id))
            .map(|(id, _)| *id))
    }

    fn insert_tenancy(&self, tenancy: &NewTenancy) -> Result<TenancyId, RepositoryError> {
        let mut state = self.state()?;
        let tables = &mut state.tables;
        if !tables
            .properties
            .iter()
            .any(|(id, _)| *id == tenancy.property_id)
            || !tables
                .landlords
                .iter()
                .any(|(id, _)| *id == tenancy.landlord_id)
        {
            return Err(RepositoryError::NotFound);
        }
        let id = TenancyId(tables.next_id());
        tables.tenancies.push((id, tenancy.clone()));
        Ok(id)
    }

    fn find_checklist_item(
        &self,
        tenancy: TenancyId,
        kind: ChecklistItemKind,
    ) -> Result<Option<ChecklistItemRecord>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .tables
            .checklist_items
            .iter()
            .find(|item| item.tenancy_id == tenancy && item.kind == kind)
            .cloned())
    }

    fn insert_checklist_item(
        &self,
        item: &NewChecklistItem,
    ) -> Result<ChecklistItemId, RepositoryError> {
        let mut state = self.state()?;
        let tables = &mut state.tables;
        if tables
            .checklist_items
            .iter()
            .any(|row| row.tenancy_id == item.tenancy_id && row.kind == item.kind)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = ChecklistItemId(tables.next_id());
        tables.checklist_items.push(ChecklistItemRecord {
            id,
            tenancy_id: item.tenancy_id,
            kind: item.kind,
            completed: item.completed,
            document_ref: item.document_ref.clone(),
        });
        Ok(id)
    }

    fn complete_checklist_item(
        &self,
        id: ChecklistItemId,
        document_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let item = state
            .tables
            .checklist_items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepositoryError::NotFound)?;
        item.completed = true;
        if let Some(document_ref) = document_ref {
            item.document_ref = Some(document_ref.to_string());
        }
        Ok(())
    }

    fn counts(&self) -> Result<RowCounts, RepositoryError> {
        let state = self.state()?;
        let tables = &state.tables;
        Ok(RowCounts {
            landlords: tables.landlords.len(),
            properties: tables.properties.len(),
            tenants: tables.tenants.len(),
            tenancies: tables.tenancies.len(),
            checklist_items: tables.checklist_items.len(),
        })
    }
}
