//! Persistence backends for the NetworkState registry.
//!
//! All registry state lives in a single sled tree under prefixed keys so that
//! a record and the event describing it land in one atomic transaction.

use anyhow::Result;
use netstate_types::{
    Address, Deployment, Member, RegistryEvent, Territory, TerritoryId, ADDRESS_BYTES,
};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Db, Tree};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const DEPLOYMENT_KEY: &[u8] = b"deployment";
const TERRITORY_PREFIX: &[u8] = b"t/";
const MEMBER_PREFIX: &[u8] = b"m/";
const EVENT_PREFIX: &[u8] = b"e/";

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt key in registry tree: {0}")]
    CorruptKey(String),
    #[error("Already written: {0}")]
    Conflict(String),
}

/// Record half of a [`StateWrite`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateRecord {
    Deployment(Deployment),
    Territory(Territory),
    Member { address: Address, member: Member },
}

impl StateRecord {
    fn label(&self) -> String {
        match self {
            StateRecord::Deployment(_) => "deployment".to_string(),
            StateRecord::Territory(t) => format!("territory {}", t.id),
            StateRecord::Member { address, .. } => format!("member {address}"),
        }
    }
}

/// A record plus the event it produces, committed together or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWrite {
    pub record: StateRecord,
    pub event: RegistryEvent,
}

/// Abstract storage trait
///
/// Records and events are write-once: `commit` refuses a write whose record
/// key or event sequence is already present with [`StorageError::Conflict`].
pub trait Storage: Send + Sync {
    fn get_deployment(&self) -> Result<Option<Deployment>>;
    fn list_territories(&self) -> Result<Vec<Territory>>;
    fn list_members(&self) -> Result<Vec<(Address, Member)>>;
    fn list_events(&self) -> Result<Vec<RegistryEvent>>;

    /// Apply `write` atomically, unless any of its keys already exist.
    fn commit(&self, write: &StateWrite) -> Result<()>;

    fn flush(&self) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_deployment(&self) -> Result<Option<Deployment>> {
        (**self).get_deployment()
    }

    fn list_territories(&self) -> Result<Vec<Territory>> {
        (**self).list_territories()
    }

    fn list_members(&self) -> Result<Vec<(Address, Member)>> {
        (**self).list_members()
    }

    fn list_events(&self) -> Result<Vec<RegistryEvent>> {
        (**self).list_events()
    }

    fn commit(&self, write: &StateWrite) -> Result<()> {
        (**self).commit(write)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

fn prefixed(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

fn territory_key(id: TerritoryId) -> Vec<u8> {
    prefixed(TERRITORY_PREFIX, &id.to_be_bytes())
}

fn member_key(address: &Address) -> Vec<u8> {
    prefixed(MEMBER_PREFIX, address.as_bytes())
}

fn event_key(sequence: u64) -> Vec<u8> {
    prefixed(EVENT_PREFIX, &sequence.to_be_bytes())
}

fn record_key(record: &StateRecord) -> Vec<u8> {
    match record {
        StateRecord::Deployment(_) => DEPLOYMENT_KEY.to_vec(),
        StateRecord::Territory(t) => territory_key(t.id),
        StateRecord::Member { address, .. } => member_key(address),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode_record(record: &StateRecord) -> Result<Vec<u8>, StorageError> {
    match record {
        StateRecord::Deployment(d) => encode(d),
        StateRecord::Territory(t) => encode(t),
        StateRecord::Member { member, .. } => encode(member),
    }
}

/// Sled-backed implementation
pub struct SledStorage {
    db: Db,
    state: Tree,
}

impl SledStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path).map_err(StorageError::Database)?;
        Ok(Self::from_db(db)?)
    }

    /// Use an already opened database. Handles built from clones of the same
    /// `Db` see each other's writes.
    pub fn from_db(db: Db) -> Result<Self, StorageError> {
        let state = db.open_tree("registry")?;
        Ok(Self { db, state })
    }

    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StorageError> {
        self.state
            .get(key)?
            .map(|v| decode(&v))
            .transpose()
    }

    fn scan<T, F>(&self, prefix: &[u8], mut decode_entry: F) -> Result<Vec<T>, StorageError>
    where
        F: FnMut(&[u8], &[u8]) -> Result<T, StorageError>,
    {
        self.state
            .scan_prefix(prefix)
            .map(|entry| {
                let (k, v) = entry?;
                decode_entry(&k[prefix.len()..], &v)
            })
            .collect()
    }
}

impl Storage for SledStorage {
    fn get_deployment(&self) -> Result<Option<Deployment>> {
        Ok(self.read(DEPLOYMENT_KEY)?)
    }

    fn list_territories(&self) -> Result<Vec<Territory>> {
        Ok(self.scan(TERRITORY_PREFIX, |_, v| decode(v))?)
    }

    fn list_members(&self) -> Result<Vec<(Address, Member)>> {
        Ok(self.scan(MEMBER_PREFIX, |k, v| {
            let bytes: [u8; ADDRESS_BYTES] = k
                .try_into()
                .map_err(|_| StorageError::CorruptKey(hex::encode(k)))?;
            Ok((Address(bytes), decode(v)?))
        })?)
    }

    fn list_events(&self) -> Result<Vec<RegistryEvent>> {
        Ok(self.scan(EVENT_PREFIX, |_, v| decode(v))?)
    }

    fn commit(&self, write: &StateWrite) -> Result<()> {
        let record_key = record_key(&write.record);
        let record_value = encode_record(&write.record)?;
        let event_key = event_key(write.event.sequence);
        let event_value = encode(&write.event)?;

        self.state
            .transaction(|tx| -> ConflictableTransactionResult<(), StorageError> {
                if tx.get(record_key.as_slice())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StorageError::Conflict(
                        write.record.label(),
                    )));
                }
                if tx.get(event_key.as_slice())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StorageError::Conflict(
                        format!("event {}", write.event.sequence),
                    )));
                }
                tx.insert(record_key.as_slice(), record_value.as_slice())?;
                tx.insert(event_key.as_slice(), event_value.as_slice())?;
                Ok(())
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StorageError::Database(err),
            })?;

        tracing::debug!(sequence = write.event.sequence, "committed registry write");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush().map_err(StorageError::Database)?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    deployment: Option<Deployment>,
    territories: BTreeMap<TerritoryId, Territory>,
    members: HashMap<Address, Member>,
    events: BTreeMap<u64, RegistryEvent>,
}

impl MemoryState {
    fn apply(&mut self, write: &StateWrite) -> Result<(), StorageError> {
        let taken = match &write.record {
            StateRecord::Deployment(_) => self.deployment.is_some(),
            StateRecord::Territory(t) => self.territories.contains_key(&t.id),
            StateRecord::Member { address, .. } => self.members.contains_key(address),
        };
        if taken {
            return Err(StorageError::Conflict(write.record.label()));
        }
        if self.events.contains_key(&write.event.sequence) {
            return Err(StorageError::Conflict(format!(
                "event {}",
                write.event.sequence
            )));
        }
        self.insert(write);
        Ok(())
    }

    fn insert(&mut self, write: &StateWrite) {
        match &write.record {
            StateRecord::Deployment(d) => self.deployment = Some(*d),
            StateRecord::Territory(t) => {
                self.territories.insert(t.id, t.clone());
            }
            StateRecord::Member { address, member } => {
                self.members.insert(*address, *member);
            }
        }
        self.events.insert(write.event.sequence, write.event.clone());
    }
}

/// In-memory testing backend
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh store holding exactly `write`.
    pub fn with_write(write: &StateWrite) -> Self {
        let mut state = MemoryState::default();
        state.insert(write);
        Self {
            state: RwLock::new(state),
        }
    }
}

impl Storage for MemoryStorage {
    fn get_deployment(&self) -> Result<Option<Deployment>> {
        Ok(self.state.read().deployment)
    }

    fn list_territories(&self) -> Result<Vec<Territory>> {
        Ok(self.state.read().territories.values().cloned().collect())
    }

    fn list_members(&self) -> Result<Vec<(Address, Member)>> {
        let mut members: Vec<_> = self
            .state
            .read()
            .members
            .iter()
            .map(|(a, m)| (*a, *m))
            .collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(members)
    }

    fn list_events(&self) -> Result<Vec<RegistryEvent>> {
        Ok(self.state.read().events.values().cloned().collect())
    }

    fn commit(&self, write: &StateWrite) -> Result<()> {
        self.state.write().apply(write)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
