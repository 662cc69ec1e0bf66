//! SQLite-backed repository.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{ffi, params, Connection, OptionalExtension};

use crate::workflows::property_list::domain::{
    ChecklistItemId, ChecklistItemKind, ChecklistItemRecord, LandlordId, NewChecklistItem,
    NewLandlord, NewProperty, NewTenancy, NewTenant, PropertyId, RowCounts, TenancyId, TenantId,
};
use crate::workflows::property_list::normalizer::phone_key;
use crate::workflows::property_list::repository::{LettingsRepository, RepositoryError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS landlords (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    address TEXT,
    phone TEXT,
    mobile TEXT,
    email TEXT,
    bank_name TEXT,
    bank_account_number TEXT,
    sort_code TEXT
);

CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY,
    address TEXT NOT NULL,
    address_key TEXT NOT NULL UNIQUE,
    postcode TEXT,
    landlord_id INTEGER REFERENCES landlords(id),
    management_fee_percent REAL
);

CREATE TABLE IF NOT EXISTS tenants (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    mobile TEXT,
    mobile_key TEXT
);

CREATE TABLE IF NOT EXISTS tenancies (
    id INTEGER PRIMARY KEY,
    property_id INTEGER NOT NULL REFERENCES properties(id),
    landlord_id INTEGER NOT NULL REFERENCES landlords(id),
    tenant_id INTEGER REFERENCES tenants(id),
    rent_pence INTEGER,
    rent_frequency TEXT,
    deposit_pence INTEGER,
    deposit_scheme TEXT,
    deposit_held_by TEXT,
    start_date TEXT,
    end_date TEXT,
    period_months INTEGER,
    status TEXT NOT NULL,
    source_page INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS checklist_items (
    id INTEGER PRIMARY KEY,
    tenancy_id INTEGER NOT NULL REFERENCES tenancies(id),
    kind TEXT NOT NULL,
    completed INTEGER NOT NULL,
    document_ref TEXT,
    UNIQUE (tenancy_id, kind)
);

CREATE INDEX IF NOT EXISTS idx_tenants_mobile_key ON tenants(mobile_key);
CREATE INDEX IF NOT EXISTS idx_tenants_name ON tenants(name);
CREATE INDEX IF NOT EXISTS idx_tenancies_property ON tenancies(property_id, start_date);
"#;

const ISO_DATE: &str = "%Y-%m-%d";

fn iso(date: Option<NaiveDate>) -> Option<String> {
    date.map(|date| date.format(ISO_DATE).to_string())
}

/// Unique violations become `Conflict`, missing parents `NotFound`.
fn write_error(err: rusqlite::Error) -> RepositoryError {
    match err.sqlite_error() {
        Some(ffi::Error { extended_code, .. })
            if *extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || *extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            RepositoryError::Conflict
        }
        Some(ffi::Error { extended_code, .. })
            if *extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            RepositoryError::NotFound
        }
        _ => RepositoryError::Sqlite(err),
    }
}

pub struct SqliteLettingsRepository {
    conn: Mutex<Connection>,
}

impl SqliteLettingsRepository {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn count(conn: &Connection, table: &str) -> Result<usize, RepositoryError> {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl LettingsRepository for SqliteLettingsRepository {
    fn begin(&self) -> Result<(), RepositoryError> {
        self.conn()?.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&self) -> Result<(), RepositoryError> {
        self.conn()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<(), RepositoryError> {
        self.conn()?.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn find_landlord_by_name(&self, name: &str) -> Result<Option<LandlordId>, RepositoryError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM landlords WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(LandlordId))
    }

    fn insert_landlord(&self, landlord: &NewLandlord) -> Result<LandlordId, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO landlords (name, kind, address, phone, mobile, email, bank_name, bank_account_number, sort_code) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                landlord.name,
                landlord.kind.label(),
                landlord.address,
                landlord.phone,
                landlord.mobile,
                landlord.email,
                landlord.bank_name,
                landlord.bank_account_number,
                landlord.sort_code,
            ],
        )
        .map_err(write_error)?;
        Ok(LandlordId(conn.last_insert_rowid()))
    }

    fn find_property_by_address(
        &self,
        address_key: &str,
    ) -> Result<Option<PropertyId>, RepositoryError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM properties WHERE address_key = ?1",
                params![address_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(PropertyId))
    }

    fn insert_property(&self, property: &NewProperty) -> Result<PropertyId, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO properties (address, address_key, postcode, landlord_id, management_fee_percent) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                property.address,
                property.address_key,
                property.postcode,
                property.landlord_id.map(|id| id.0),
                property.management_fee_percent,
            ],
        )
        .map_err(write_error)?;
        Ok(PropertyId(conn.last_insert_rowid()))
    }

    fn assign_property_landlord(
        &self,
        property: PropertyId,
        landlord: LandlordId,
    ) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE properties SET landlord_id = ?2 WHERE id = ?1 AND landlord_id IS NULL",
                params![property.0, landlord.0],
            )
            .map_err(write_error)?;
        Ok(updated > 0)
    }

    fn find_tenant_by_mobile(&self, mobile_key: &str) -> Result<Option<TenantId>, RepositoryError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM tenants WHERE mobile_key = ?1 ORDER BY id LIMIT 1",
                params![mobile_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(TenantId))
    }

    fn find_tenant_by_name(&self, name: &str) -> Result<Option<TenantId>, RepositoryError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM tenants WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(TenantId))
    }

    fn insert_tenant(&self, tenant: &NewTenant) -> Result<TenantId, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tenants (name, mobile, mobile_key) VALUES (?1, ?2, ?3)",
            params![
                tenant.name,
                tenant.mobile,
                tenant.mobile.as_deref().map(phone_key),
            ],
        )
        .map_err(write_error)?;
        Ok(TenantId(conn.last_insert_rowid()))
    }

    fn find_tenancy(
        &self,
        property: PropertyId,
        start_date: Option<NaiveDate>,
    ) -> Result<Option<TenancyId>, RepositoryError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM tenancies WHERE property_id = ?1 AND start_date IS ?2 ORDER BY id LIMIT 1",
                params![property.0, iso(start_date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(TenancyId))
    }

    fn latest_tenancy_for_property(
        &self,
        property: PropertyId,
    ) -> Result<Option<TenancyId>, RepositoryError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM tenancies WHERE property_id = ?1 \
                 ORDER BY start_date IS NULL, start_date DESC, id DESC LIMIT 1",
                params![property.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(TenancyId))
    }

    fn insert_tenancy(&self, tenancy: &NewTenancy) -> Result<TenancyId, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tenancies (property_id, landlord_id, tenant_id, rent_pence, rent_frequency, \
             deposit_pence, deposit_scheme, deposit_held_by, start_date, end_date, period_months, status, source_page) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                tenancy.property_id.0,
                tenancy.landlord_id.0,
                tenancy.tenant_id.map(|id| id.0),
                tenancy.rent_pence,
                tenancy.rent_frequency.map(|frequency| frequency.label()),
                tenancy.deposit_pence,
                tenancy.deposit_scheme.map(|scheme| scheme.label()),
                tenancy.deposit_held_by,
                iso(tenancy.start_date),
                iso(tenancy.end_date),
                tenancy.period_months,
                tenancy.status.label(),
                tenancy.source_page,
            ],
        )
        .map_err(write_error)?;
        Ok(TenancyId(conn.last_insert_rowid()))
    }

    fn find_checklist_item(
        &self,
        tenancy: TenancyId,
        kind: ChecklistItemKind,
    ) -> Result<Option<ChecklistItemRecord>, RepositoryError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, completed, document_ref FROM checklist_items WHERE tenancy_id = ?1 AND kind = ?2",
                params![tenancy.0, kind.key()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(id, completed, document_ref)| ChecklistItemRecord {
            id: ChecklistItemId(id),
            tenancy_id: tenancy,
            kind,
            completed,
            document_ref,
        }))
    }

    fn insert_checklist_item(
        &self,
        item: &NewChecklistItem,
    ) -> Result<ChecklistItemId, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO checklist_items (tenancy_id, kind, completed, document_ref) VALUES (?1, ?2, ?3, ?4)",
            params![
                item.tenancy_id.0,
                item.kind.key(),
                item.completed,
                item.document_ref,
            ],
        )
        .map_err(write_error)?;
        Ok(ChecklistItemId(conn.last_insert_rowid()))
    }

    fn complete_checklist_item(
        &self,
        id: ChecklistItemId,
        document_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE checklist_items SET completed = 1, document_ref = COALESCE(?2, document_ref) WHERE id = ?1",
            params![id.0, document_ref],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn counts(&self) -> Result<RowCounts, RepositoryError> {
        let conn = self.conn()?;
        Ok(RowCounts {
            landlords: Self::count(&conn, "landlords")?,
            properties: Self::count(&conn, "properties")?,
            tenants: Self::count(&conn, "tenants")?,
            tenancies: Self::count(&conn, "tenancies")?,
            checklist_items: Self::count(&conn, "checklist_items")?,
        })
    }
}
