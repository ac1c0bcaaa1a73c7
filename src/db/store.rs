//! Persistence seam used by the analysis orchestrator and the API.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use uuid::Uuid;

use super::{repository, sqlite, DatabaseError};
use crate::models::ScanRecord;

/// Storage for scan records. Implementations must make `create` atomic.
pub trait ScanStore: Send + Sync {
    fn create(&self, record: &ScanRecord) -> Result<(), DatabaseError>;
    fn list(&self, owner_id: &str, include_deleted: bool) -> Result<Vec<ScanRecord>, DatabaseError>;
    fn get(&self, owner_id: &str, id: &Uuid) -> Result<Option<ScanRecord>, DatabaseError>;
    fn soft_delete(&self, owner_id: &str, id: &Uuid) -> Result<(), DatabaseError>;
    fn restore(&self, owner_id: &str, id: &Uuid) -> Result<ScanRecord, DatabaseError>;
}

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct SqliteScanStore {
    conn: Mutex<Connection>,
}

impl SqliteScanStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(sqlite::open_database(path)?),
        })
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(sqlite::open_memory_database()?),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

impl ScanStore for SqliteScanStore {
    fn create(&self, record: &ScanRecord) -> Result<(), DatabaseError> {
        self.with_conn(|conn| repository::insert_scan(conn, record))
    }

    fn list(&self, owner_id: &str, include_deleted: bool) -> Result<Vec<ScanRecord>, DatabaseError> {
        self.with_conn(|conn| repository::list_scans(conn, owner_id, include_deleted))
    }

    fn get(&self, owner_id: &str, id: &Uuid) -> Result<Option<ScanRecord>, DatabaseError> {
        self.with_conn(|conn| repository::get_scan(conn, owner_id, id))
    }

    fn soft_delete(&self, owner_id: &str, id: &Uuid) -> Result<(), DatabaseError> {
        self.with_conn(|conn| repository::soft_delete_scan(conn, owner_id, id).map(|_| ()))
    }

    fn restore(&self, owner_id: &str, id: &Uuid) -> Result<ScanRecord, DatabaseError> {
        self.with_conn(|conn| repository::restore_scan(conn, owner_id, id))
    }
}

/// Store that rejects every write. Used to exercise persistence failures.
pub struct FailingScanStore;

impl ScanStore for FailingScanStore {
    fn create(&self, _record: &ScanRecord) -> Result<(), DatabaseError> {
        Err(DatabaseError::LockPoisoned)
    }

    fn list(&self, _owner_id: &str, _include_deleted: bool) -> Result<Vec<ScanRecord>, DatabaseError> {
        Err(DatabaseError::LockPoisoned)
    }

    fn get(&self, _owner_id: &str, _id: &Uuid) -> Result<Option<ScanRecord>, DatabaseError> {
        Err(DatabaseError::LockPoisoned)
    }

    fn soft_delete(&self, _owner_id: &str, _id: &Uuid) -> Result<(), DatabaseError> {
        Err(DatabaseError::LockPoisoned)
    }

    fn restore(&self, _owner_id: &str, _id: &Uuid) -> Result<ScanRecord, DatabaseError> {
        Err(DatabaseError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisPath, Category, ScanOutcome, ScanType};

    fn record(owner: &str) -> ScanRecord {
        let outcome = ScanOutcome::new(Category::Healthy, 10, "Skin appears healthy.", vec![], vec![]);
        ScanRecord::new(owner, ScanType::Skin, outcome, "sha256:00", AnalysisPath::Heuristic)
    }

    #[test]
    fn sqlite_store_create_list_delete_restore() {
        let store = SqliteScanStore::in_memory().unwrap();
        let scan = record("owner-1");
        store.create(&scan).unwrap();
        assert_eq!(store.list("owner-1", false).unwrap().len(), 1);

        store.soft_delete("owner-1", &scan.id).unwrap();
        assert!(store.list("owner-1", false).unwrap().is_empty());
        assert!(store.get("owner-1", &scan.id).unwrap().is_none());

        let restored = store.restore("owner-1", &scan.id).unwrap();
        assert_eq!(restored, scan);
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scans.db");
        let scan = record("owner-1");
        {
            let store = SqliteScanStore::open(&path).unwrap();
            store.create(&scan).unwrap();
        }
        let store = SqliteScanStore::open(&path).unwrap();
        assert_eq!(store.get("owner-1", &scan.id).unwrap(), Some(scan));
    }

    #[test]
    fn failing_store_rejects_create() {
        assert!(FailingScanStore.create(&record("owner-1")).is_err());
    }
}
