use crate::domain::application::{
    ApplicationId, ApplicationNumber, ApplicationStatus, MortgageApplication,
};
use crate::domain::ports::ApplicationStore;
use crate::domain::property::UserId;
use crate::error::{MortgageError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for application records, keyed by application id.
pub const CF_APPLICATIONS: &str = "applications";
/// Column Family mapping application numbers to ids; the uniqueness index.
pub const CF_APPLICATION_NUMBERS: &str = "application_numbers";

/// A persistent application store backed by RocksDB.
///
/// Records are stored as JSON. Writes go through one async mutex so the
/// number uniqueness check and the conditional status update each happen
/// as a single step. `Clone` shares both the `DB` and the mutex.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_applications = ColumnFamilyDescriptor::new(CF_APPLICATIONS, Options::default());
        let cf_numbers = ColumnFamilyDescriptor::new(CF_APPLICATION_NUMBERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_applications, cf_numbers])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| MortgageError::Storage(format!("column family {name} not found")))
    }

    fn encode(application: &MortgageApplication) -> Result<Vec<u8>> {
        serde_json::to_vec(application)
            .map_err(|e| MortgageError::Storage(format!("Serialization error: {e}")))
    }

    fn decode(bytes: &[u8]) -> Result<MortgageApplication> {
        serde_json::from_slice(bytes)
            .map_err(|e| MortgageError::Storage(format!("Deserialization error: {e}")))
    }

    fn read(&self, id: ApplicationId) -> Result<Option<MortgageApplication>> {
        let cf = self.cf(CF_APPLICATIONS)?;
        match self.db.get_cf(cf, id.0.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ApplicationStore for RocksDBStore {
    async fn insert(&self, application: MortgageApplication) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let apps = self.cf(CF_APPLICATIONS)?;
        let numbers = self.cf(CF_APPLICATION_NUMBERS)?;

        let number_key = application.number.as_str().as_bytes();
        if self.db.get_pinned_cf(numbers, number_key)?.is_some() {
            return Err(MortgageError::Conflict(format!(
                "application number {} already exists",
                application.number
            )));
        }
        let id_key = application.id.0.as_bytes();
        if self.db.get_pinned_cf(apps, id_key)?.is_some() {
            return Err(MortgageError::Conflict(format!(
                "application {} already exists",
                application.id
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(numbers, number_key, id_key);
        batch.put_cf(apps, id_key, Self::encode(&application)?);
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, id: ApplicationId) -> Result<Option<MortgageApplication>> {
        self.read(id)
    }

    async fn get_by_number(&self, number: &ApplicationNumber) -> Result<Option<MortgageApplication>> {
        let numbers = self.cf(CF_APPLICATION_NUMBERS)?;
        let Some(id_bytes) = self.db.get_cf(numbers, number.as_str().as_bytes())? else {
            return Ok(None);
        };
        let id = uuid::Uuid::from_slice(&id_bytes)
            .map_err(|e| MortgageError::Storage(format!("corrupt number index: {e}")))?;
        self.read(ApplicationId(id))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<MortgageApplication>> {
        let apps = self.cf(CF_APPLICATIONS)?;
        let mut found = Vec::new();
        for item in self.db.iterator_cf(apps, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let application = Self::decode(&value)?;
            if application.user_id == user_id {
                found.push(application);
            }
        }
        Ok(found)
    }

    async fn update_if_status(
        &self,
        application: MortgageApplication,
        expected: ApplicationStatus,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.read(application.id)? {
            Some(stored) if stored.status == expected => {
                let apps = self.cf(CF_APPLICATIONS)?;
                self.db
                    .put_cf(apps, application.id.0.as_bytes(), Self::encode(&application)?)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
