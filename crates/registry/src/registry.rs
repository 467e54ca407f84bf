//! NetworkState registry implementation
//!
//! Holds the owner identity, the territory and member collections and the
//! event log. Every mutation runs under one write lock, so calls are applied
//! in a single total order and a rejected call changes nothing.

use crate::errors::*;
use netstate_storage::{MemoryStorage, StateRecord, StateWrite, Storage, StorageError};
use netstate_types::{
    unix_now, Address, Amount, Deployment, Member, RegistryEvent, RegistryEventKind, Territory,
    TerritoryId,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct RegistryState {
    territories: HashMap<TerritoryId, Territory>,
    members: HashMap<Address, Member>,
    events: Vec<RegistryEvent>,
}

impl RegistryState {
    fn next_sequence(&self) -> u64 {
        self.events.len() as u64
    }
}

/// Single-owner registry of territories and community members.
///
/// The registry owns its store. Use [`NetworkStateRegistry::into_storage`]
/// to hand it to a later [`NetworkStateRegistry::open`].
pub struct NetworkStateRegistry {
    /// Fixed at construction; never replaced.
    deployment: Deployment,
    state: RwLock<RegistryState>,
    storage: Box<dyn Storage>,
}

impl NetworkStateRegistry {
    /// Construct a registry owned by `deployer`, backed by memory only.
    pub fn new(deployer: Address) -> Self {
        let deployment = Deployment::new(deployer, unix_now());
        let event = deployed_event(&deployment);
        let storage = MemoryStorage::with_write(&deployment_write(deployment, &event));
        Self::deployed(deployment, event, Box::new(storage))
    }

    /// Construct a registry owned by `deployer` on top of `storage`.
    ///
    /// A store holds at most one deployment; a second attempt fails with
    /// [`RegistryError::AlreadyDeployed`].
    pub fn deploy<S: Storage + 'static>(deployer: Address, storage: S) -> Result<Self> {
        if let Some(existing) = storage.get_deployment()? {
            return Err(already_deployed(&existing));
        }

        let deployment = Deployment::new(deployer, unix_now());
        let event = deployed_event(&deployment);
        if let Err(err) = storage.commit(&deployment_write(deployment, &event)) {
            // Lost a race with another deployer on the same store.
            if let Some(StorageError::Conflict(_)) = err.downcast_ref::<StorageError>() {
                if let Some(existing) = storage.get_deployment()? {
                    return Err(already_deployed(&existing));
                }
            }
            return Err(err.into());
        }
        Ok(Self::deployed(deployment, event, Box::new(storage)))
    }

    /// Reload a registry previously deployed into `storage`.
    pub fn open<S: Storage + 'static>(storage: S) -> Result<Self> {
        let deployment = storage
            .get_deployment()?
            .ok_or(RegistryError::NotDeployed)?;

        let territories: HashMap<_, _> = storage
            .list_territories()?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let members: HashMap<_, _> = storage.list_members()?.into_iter().collect();
        let events = storage.list_events()?;

        debug!(
            address = %deployment.address,
            territories = territories.len(),
            members = members.len(),
            events = events.len(),
            "reloaded NetworkState registry"
        );

        Ok(Self {
            deployment,
            state: RwLock::new(RegistryState {
                territories,
                members,
                events,
            }),
            storage: Box::new(storage),
        })
    }

    fn deployed(deployment: Deployment, event: RegistryEvent, storage: Box<dyn Storage>) -> Self {
        info!(
            owner = %deployment.owner,
            address = %deployment.address,
            "NetworkState deployed"
        );
        Self {
            deployment,
            state: RwLock::new(RegistryState {
                events: vec![event],
                ..Default::default()
            }),
            storage,
        }
    }

    /// Mint a territory. Owner only; each identifier can be minted once.
    pub fn mint_territory(
        &self,
        caller: &Address,
        id: TerritoryId,
        name: impl Into<String>,
        price: Amount,
    ) -> Result<()> {
        let mut state = self.state.write();

        if *caller != self.deployment.owner {
            return Err(rejected("mintTerritory", caller, RegistryError::NotOwner));
        }
        if state.territories.get(&id).is_some_and(|t| t.exists) {
            return Err(rejected(
                "mintTerritory",
                caller,
                RegistryError::DuplicateTerritory { id },
            ));
        }

        let territory = Territory::minted(id, name, price);
        let event = RegistryEvent {
            sequence: state.next_sequence(),
            kind: RegistryEventKind::TerritoryMinted {
                id,
                name: territory.name.clone(),
                price,
            },
        };
        self.persist(StateRecord::Territory(territory.clone()), &event)
            .map_err(|e| rejected("mintTerritory", caller, e))?;

        info!(id = %id, name = %territory.name, price = %price, "territory minted");
        state.territories.insert(id, territory);
        state.events.push(event);
        Ok(())
    }

    /// Join the community as `caller`. Open to everyone, once per identity.
    pub fn join_community(&self, caller: &Address) -> Result<()> {
        let mut state = self.state.write();

        if state.members.get(caller).is_some_and(|m| m.exists) {
            return Err(rejected(
                "joinCommunity",
                caller,
                RegistryError::DuplicateMember { member: *caller },
            ));
        }

        let member = Member::joined(unix_now());
        let event = RegistryEvent {
            sequence: state.next_sequence(),
            kind: RegistryEventKind::MemberJoined { member: *caller },
        };
        self.persist(
            StateRecord::Member {
                address: *caller,
                member,
            },
            &event,
        )
        .map_err(|e| rejected("joinCommunity", caller, e))?;

        info!(member = %caller, "member joined community");
        state.members.insert(*caller, member);
        state.events.push(event);
        Ok(())
    }

    fn persist(&self, record: StateRecord, event: &RegistryEvent) -> Result<()> {
        let write = StateWrite {
            record,
            event: event.clone(),
        };
        self.storage.commit(&write)?;
        Ok(())
    }

    /// Territory stored at `id`, or the absent sentinel.
    pub fn territory(&self, id: TerritoryId) -> Territory {
        self.state
            .read()
            .territories
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Membership of `identity`, or the absent sentinel.
    pub fn member(&self, identity: &Address) -> Member {
        self.state
            .read()
            .members
            .get(identity)
            .copied()
            .unwrap_or_default()
    }

    pub fn owner(&self) -> Address {
        self.deployment.owner
    }

    /// Handle recorded by the deployer.
    pub fn address(&self) -> Address {
        self.deployment.address
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    pub fn territory_count(&self) -> usize {
        self.state.read().territories.len()
    }

    pub fn member_count(&self) -> usize {
        self.state.read().members.len()
    }

    pub fn events(&self) -> Vec<RegistryEvent> {
        self.state.read().events.clone()
    }

    /// Flush the backing store.
    pub fn flush(&self) -> Result<()> {
        self.storage.flush()?;
        Ok(())
    }

    /// Give up the registry and return its store.
    pub fn into_storage(self) -> Box<dyn Storage> {
        self.storage
    }
}

impl fmt::Debug for NetworkStateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkStateRegistry")
            .field("deployment", &self.deployment)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

fn deployed_event(deployment: &Deployment) -> RegistryEvent {
    RegistryEvent {
        sequence: 0,
        kind: RegistryEventKind::Deployed {
            owner: deployment.owner,
            address: deployment.address,
        },
    }
}

fn deployment_write(deployment: Deployment, event: &RegistryEvent) -> StateWrite {
    StateWrite {
        record: StateRecord::Deployment(deployment),
        event: event.clone(),
    }
}

fn already_deployed(existing: &Deployment) -> RegistryError {
    warn!(owner = %existing.owner, "registry already deployed in this store");
    RegistryError::AlreadyDeployed {
        owner: existing.owner,
    }
}

fn rejected(operation: &str, caller: &Address, err: RegistryError) -> RegistryError {
    warn!(operation, caller = %caller, kind = err.kind(), "call rejected: {}", err);
    err
}
