//! End-to-end behaviour of the NetworkState registry: deployment, owner-gated
//! minting, open community membership, and reload from a sled directory.

use ed25519_dalek::SigningKey;
use netstate_registry::{NetworkStateRegistry, RegistryError};
use netstate_storage::{MemoryStorage, SledStorage};
use netstate_types::{Address, Amount, RegistryCall, SignedCall, TerritoryId};
use proptest::prelude::*;
use tempfile::TempDir;

/// Deterministic test accounts; index 0 deploys.
fn accounts() -> Vec<SigningKey> {
    (1u8..=4).map(|seed| SigningKey::from_bytes(&[seed; 32])).collect()
}

fn address(key: &SigningKey) -> Address {
    Address::from(&key.verifying_key())
}

fn deploy(accounts: &[SigningKey]) -> NetworkStateRegistry {
    NetworkStateRegistry::new(address(&accounts[0]))
}

#[test]
fn should_set_the_right_owner() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    assert_eq!(registry.owner(), address(&accounts[0]));
}

#[test]
fn should_mint_a_territory_correctly() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    registry
        .mint_territory(
            &address(&accounts[0]),
            TerritoryId(1),
            "Territory 1",
            Amount::parse_units("1").unwrap(),
        )
        .unwrap();
    assert!(registry.territory(TerritoryId(1)).exists);
}

#[test]
fn should_not_allow_non_owners_to_mint_territories() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    let err = registry
        .mint_territory(
            &address(&accounts[1]),
            TerritoryId(2),
            "Territory 2",
            Amount::parse_units("1").unwrap(),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Ownable: caller is not the owner");
    assert!(!registry.territory(TerritoryId(2)).exists);
}

#[test]
fn should_allow_a_user_to_join_the_community() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    registry.join_community(&address(&accounts[1])).unwrap();
    assert!(registry.member(&address(&accounts[1])).exists);
}

#[test]
fn should_not_allow_a_member_to_join_twice() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    registry.join_community(&address(&accounts[1])).unwrap();
    let err = registry.join_community(&address(&accounts[1])).unwrap_err();
    assert_eq!(err.to_string(), "Member already exists");
}

#[test]
fn concrete_scenario_through_signed_calls() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    let one = Amount::from_whole_units(1);

    registry
        .submit(&SignedCall::sign(
            &accounts[0],
            RegistryCall::MintTerritory {
                id: TerritoryId(1),
                name: "Territory 1".into(),
                price: one,
            },
        ))
        .unwrap();
    assert!(registry.territory(TerritoryId(1)).exists);

    let err = registry
        .submit(&SignedCall::sign(
            &accounts[1],
            RegistryCall::MintTerritory {
                id: TerritoryId(2),
                name: "Territory 2".into(),
                price: one,
            },
        ))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotOwner));
    assert!(!registry.territory(TerritoryId(2)).exists);

    let join = SignedCall::sign(&accounts[2], RegistryCall::JoinCommunity);
    registry.submit(&join).unwrap();
    assert!(registry.member(&address(&accounts[2])).exists);
    assert!(matches!(
        registry.submit(&join),
        Err(RegistryError::DuplicateMember { .. })
    ));
}

#[test]
fn territories_and_members_share_no_namespace() {
    let accounts = accounts();
    let registry = deploy(&accounts);
    let owner = address(&accounts[0]);

    registry.join_community(&owner).unwrap();
    registry
        .mint_territory(&owner, TerritoryId(0), "Zero", Amount::ZERO)
        .unwrap();
    assert!(registry.member(&owner).exists);
    assert!(registry.territory(TerritoryId(0)).exists);
    assert!(!registry.member(&address(&accounts[3])).exists);
}

#[test]
fn deploy_is_once_per_store() {
    let accounts = accounts();
    let registry =
        NetworkStateRegistry::deploy(address(&accounts[0]), MemoryStorage::new()).unwrap();

    let err =
        NetworkStateRegistry::deploy(address(&accounts[1]), registry.into_storage()).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::AlreadyDeployed { owner } if owner == address(&accounts[0])
    ));
}

#[test]
fn open_requires_a_deployment() {
    assert!(matches!(
        NetworkStateRegistry::open(MemoryStorage::new()),
        Err(RegistryError::NotDeployed)
    ));
}

#[test]
fn registry_reloads_from_sled() {
    let accounts = accounts();
    let owner = address(&accounts[0]);
    let member = address(&accounts[1]);
    let temp_dir = TempDir::new().unwrap();
    let db = sled::open(temp_dir.path()).unwrap();

    let deployed_address = {
        let storage = SledStorage::from_db(db.clone()).unwrap();
        let registry = NetworkStateRegistry::deploy(owner, storage).unwrap();
        registry
            .mint_territory(&owner, TerritoryId(7), "Harbor", Amount::parse_units("2.5").unwrap())
            .unwrap();
        registry.join_community(&member).unwrap();
        registry.flush().unwrap();
        registry.address()
    };

    let registry = NetworkStateRegistry::open(SledStorage::from_db(db).unwrap()).unwrap();

    assert_eq!(registry.owner(), owner);
    assert_eq!(registry.address(), deployed_address);
    let territory = registry.territory(TerritoryId(7));
    assert_eq!(territory.name, "Harbor");
    assert_eq!(territory.price, Amount::parse_units("2.5").unwrap());
    assert!(registry.member(&member).exists);
    assert_eq!(registry.events().len(), 3);

    // Reloaded state still enforces first-writer-wins.
    assert!(matches!(
        registry.mint_territory(&owner, TerritoryId(7), "Other", Amount::ZERO),
        Err(RegistryError::DuplicateTerritory { .. })
    ));
    assert!(matches!(
        registry.join_community(&member),
        Err(RegistryError::DuplicateMember { .. })
    ));
    registry
        .mint_territory(&owner, TerritoryId(8), "Ridge", Amount::ZERO)
        .unwrap();
    assert_eq!(registry.events().last().unwrap().sequence, 3);
}

#[test]
fn minted_prices_reload_exactly() {
    let accounts = accounts();
    let owner = address(&accounts[0]);
    let temp_dir = TempDir::new().unwrap();
    let registry =
        NetworkStateRegistry::deploy(owner, SledStorage::new(temp_dir.path()).unwrap()).unwrap();
    registry
        .mint_territory(&owner, TerritoryId(1), "Territory 1", Amount(u128::MAX))
        .unwrap();
    let before = registry.events();

    let reopened = NetworkStateRegistry::open(registry.into_storage()).unwrap();
    assert_eq!(reopened.territory(TerritoryId(1)).price, Amount(u128::MAX));
    assert_eq!(reopened.events(), before);
}

#[test]
fn second_handle_on_one_database_cannot_overwrite() {
    let accounts = accounts();
    let owner = address(&accounts[0]);
    let temp_dir = TempDir::new().unwrap();
    let db = sled::open(temp_dir.path()).unwrap();

    let handle = || SledStorage::from_db(db.clone()).unwrap();

    let first = NetworkStateRegistry::deploy(owner, handle()).unwrap();
    let second = NetworkStateRegistry::open(handle()).unwrap();
    assert!(matches!(
        NetworkStateRegistry::deploy(address(&accounts[1]), handle()),
        Err(RegistryError::AlreadyDeployed { .. })
    ));

    first
        .mint_territory(&owner, TerritoryId(1), "Territory 1", Amount::from_whole_units(1))
        .unwrap();
    // The stale handle does not see the mint, but the store refuses the overwrite.
    assert!(matches!(
        second.mint_territory(&owner, TerritoryId(1), "Hijacked", Amount::ZERO),
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        second.join_community(&address(&accounts[2])),
        Err(RegistryError::Storage(_))
    ));

    let reloaded = NetworkStateRegistry::open(handle()).unwrap();
    assert_eq!(reloaded.territory(TerritoryId(1)).name, "Territory 1");
    assert!(!reloaded.member(&address(&accounts[2])).exists);
    let sequences: Vec<u64> = reloaded.events().iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![0, 1]);
}

proptest! {
    #[test]
    fn second_mint_never_overwrites(
        id in any::<u64>(),
        first in "[a-zA-Z ]{0,16}",
        second in "[a-zA-Z ]{0,16}",
        p1 in any::<u64>(),
        p2 in any::<u64>(),
    ) {
        let owner = Address([1u8; 32]);
        let registry = NetworkStateRegistry::new(owner);
        registry.mint_territory(&owner, TerritoryId(id), first.clone(), Amount(p1 as u128)).unwrap();
        let second_result =
            registry.mint_territory(&owner, TerritoryId(id), second, Amount(p2 as u128));
        prop_assert!(
            matches!(second_result, Err(RegistryError::DuplicateTerritory { .. })),
            "second mint must be rejected as a duplicate"
        );

        let territory = registry.territory(TerritoryId(id));
        prop_assert_eq!(territory.name, first);
        prop_assert_eq!(territory.price, Amount(p1 as u128));
    }

    #[test]
    fn non_owner_mint_never_creates(seed in 2u8..=255, id in any::<u64>()) {
        let owner = Address([1u8; 32]);
        let registry = NetworkStateRegistry::new(owner);
        let result = registry.mint_territory(&Address([seed; 32]), TerritoryId(id), "x", Amount::ZERO);
        prop_assert!(matches!(result, Err(RegistryError::NotOwner)), "non-owner mint must be rejected");
        prop_assert!(!registry.territory(TerritoryId(id)).exists);
        prop_assert_eq!(registry.owner(), owner);
    }

    #[test]
    fn join_is_one_shot(seed in any::<u8>()) {
        let registry = NetworkStateRegistry::new(Address([0u8; 32]));
        let user = Address([seed; 32]);
        prop_assert!(registry.join_community(&user).is_ok());
        prop_assert!(
            matches!(registry.join_community(&user), Err(RegistryError::DuplicateMember { .. })),
            "second join must be rejected"
        );
        prop_assert!(registry.member(&user).exists);
    }
}
