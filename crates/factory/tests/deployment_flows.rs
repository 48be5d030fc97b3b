//! End-to-end deployment flow tests over in-memory collaborators.

use crucible_factory::{
    CallError, ExecutionEnvironment, FactoryError, FlowKind, PermissionManagerRequest,
    PriceFeedParam, TaskRequest, VaultRequest,
};
use crucible_test_helpers::{
    CountingTaskBehavior, Fixture, PermissionManagerBehavior, RevertingBehavior, VaultBehavior,
    AUTHORIZER_KEY, COUNTER_KEY, FEED_COUNT_KEY, OWNERS_KEY,
};
use crucible_types::Address;
use std::sync::Arc;

fn task_request(namespace: &str, name: &str, implementation: Address) -> TaskRequest {
    TaskRequest {
        namespace: namespace.to_string(),
        name: name.to_string(),
        implementation,
        custom: false,
        initialize_data: Vec::new(),
    }
}

#[tokio::test]
async fn predicted_address_matches_deployed_instance() {
    let fixture = Fixture::new();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));
    let caller = Address::new_unique();

    let predicted = fixture.orchestrator.get_address(&caller, "ns", "t1");
    assert!(!fixture.environment.has_code(&predicted).await);

    let instance = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "t1", implementation))
        .await
        .unwrap();

    assert_eq!(instance, predicted);
    assert!(fixture.environment.has_code(&instance).await);
    assert_eq!(
        fixture.environment.proxy_implementation(&instance),
        Some(implementation)
    );
}

#[tokio::test]
async fn get_salt_agrees_with_deployment_inputs() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();

    let salt = fixture.orchestrator.get_salt(&caller, "ns", "t1");
    assert_eq!(salt, fixture.orchestrator.get_salt(&caller, "ns", "t1"));
    assert_ne!(salt, fixture.orchestrator.get_salt(&caller, "ns", "t2"));
}

#[tokio::test]
async fn redeploying_same_triple_fails() {
    let fixture = Fixture::new();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));
    let caller = Address::new_unique();

    fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "t1", implementation))
        .await
        .unwrap();

    let second = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "t1", implementation))
        .await;
    let expected = fixture.orchestrator.get_address(&caller, "ns", "t1");
    assert!(matches!(second, Err(FactoryError::AddressOccupied(a)) if a == expected));
}

#[tokio::test]
async fn distinct_callers_do_not_collide() {
    let fixture = Fixture::new();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));
    let alice = Address::new_unique();
    let bob = Address::new_unique();

    let a = fixture
        .orchestrator
        .deploy_task(&alice, task_request("ns", "t1", implementation))
        .await
        .unwrap();
    let b = fixture
        .orchestrator
        .deploy_task(&bob, task_request("ns", "t1", implementation))
        .await
        .unwrap();

    assert_ne!(a, b);
    assert_eq!(a, fixture.orchestrator.get_address(&alice, "ns", "t1"));
    assert_eq!(b, fixture.orchestrator.get_address(&bob, "ns", "t1"));
}

#[tokio::test]
async fn permission_manager_flow_gates_and_initializes() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let owners = vec![Address::new_unique(), Address::new_unique()];

    let request = |implementation| PermissionManagerRequest {
        namespace: "ns".to_string(),
        name: "pm".to_string(),
        implementation,
        owners: owners.clone(),
    };

    // Unregistered implementation is rejected
    let unregistered = fixture.unregistered_implementation(Arc::new(PermissionManagerBehavior));
    let result = fixture
        .orchestrator
        .deploy_permission_manager(&caller, request(unregistered))
        .await;
    assert!(matches!(result, Err(FactoryError::NotRegistered(a)) if a == unregistered));

    // Deprecated implementation is rejected
    let deprecated = fixture.approved_implementation(Arc::new(PermissionManagerBehavior));
    fixture.registry.deprecate(&deprecated).unwrap();
    let result = fixture
        .orchestrator
        .deploy_permission_manager(&caller, request(deprecated))
        .await;
    assert!(matches!(result, Err(FactoryError::Deprecated(a)) if a == deprecated));

    // Approved implementation deploys and the initializer ran
    let approved = fixture.approved_implementation(Arc::new(PermissionManagerBehavior));
    let instance = fixture
        .orchestrator
        .deploy_permission_manager(&caller, request(approved))
        .await
        .unwrap();

    let stored = fixture
        .environment
        .storage_value(&instance, OWNERS_KEY)
        .expect("owners recorded");
    let stored: Vec<Address> = serde_json::from_slice(&stored).unwrap();
    assert_eq!(stored, owners);
}

#[tokio::test]
async fn vault_flow_initializes_with_feeds() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(VaultBehavior));
    let authorizer = Address::new_unique();

    let instance = fixture
        .orchestrator
        .deploy_vault(
            &caller,
            VaultRequest {
                namespace: "ns".to_string(),
                name: "vault".to_string(),
                implementation,
                authorizer,
                price_oracle: Some(Address::new_unique()),
                price_feeds: vec![
                    PriceFeedParam {
                        base: Address::new_unique(),
                        quote: Address::new_unique(),
                        feed: Address::new_unique(),
                    },
                    PriceFeedParam {
                        base: Address::new_unique(),
                        quote: Address::new_unique(),
                        feed: Address::new_unique(),
                    },
                ],
            },
        )
        .await
        .unwrap();

    assert_eq!(
        fixture.environment.storage_value(&instance, AUTHORIZER_KEY),
        Some(authorizer.as_bytes().to_vec())
    );
    assert_eq!(
        fixture.environment.storage_value(&instance, FEED_COUNT_KEY),
        Some(2u64.to_le_bytes().to_vec())
    );
}

#[tokio::test]
async fn custom_task_bypasses_registry() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.unregistered_implementation(Arc::new(CountingTaskBehavior));

    let mut request = task_request("ns", "custom", implementation);
    request.custom = true;
    fixture
        .orchestrator
        .deploy_task(&caller, request)
        .await
        .unwrap();

    // The same implementation fails the standard path
    let result = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "standard", implementation))
        .await;
    assert!(matches!(result, Err(FactoryError::NotRegistered(_))));
}

#[tokio::test]
async fn empty_task_payload_skips_initialization() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));

    let instance = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "t1", implementation))
        .await
        .unwrap();

    assert_eq!(fixture.environment.storage_value(&instance, COUNTER_KEY), None);
}

#[tokio::test]
async fn nonempty_task_payload_runs_once() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));

    let mut request = task_request("ns", "t1", implementation);
    request.initialize_data = b"kick".to_vec();
    let instance = fixture
        .orchestrator
        .deploy_task(&caller, request)
        .await
        .unwrap();

    assert_eq!(
        fixture.environment.storage_value(&instance, COUNTER_KEY),
        Some(1u64.to_le_bytes().to_vec())
    );
}

#[tokio::test]
async fn failed_initializer_leaves_nothing_behind() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(RevertingBehavior("boom")));
    let mut records = fixture.orchestrator.subscribe();

    let predicted = fixture.orchestrator.get_address(&caller, "ns", "t1");
    let mut request = task_request("ns", "t1", implementation);
    request.initialize_data = b"init".to_vec();

    let result = fixture.orchestrator.deploy_task(&caller, request).await;
    match result {
        Err(FactoryError::InitializationFailed { reason }) => assert_eq!(reason, "boom"),
        other => panic!("expected initialization failure, got {other:?}"),
    }

    // No code at the predicted address, no audit record
    assert!(!fixture.environment.has_code(&predicted).await);
    assert!(records.try_recv().is_err());
}

#[tokio::test]
async fn failed_vault_initializer_aborts_flow() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(RevertingBehavior("vault down")));

    let predicted = fixture.orchestrator.get_address(&caller, "ns", "v1");
    let result = fixture
        .orchestrator
        .deploy_vault(
            &caller,
            VaultRequest {
                namespace: "ns".to_string(),
                name: "v1".to_string(),
                implementation,
                authorizer: Address::new_unique(),
                price_oracle: None,
                price_feeds: Vec::new(),
            },
        )
        .await;

    match result {
        Err(FactoryError::InitializationFailed { reason }) => assert_eq!(reason, "vault down"),
        other => panic!("expected initialization failure, got {other:?}"),
    }
    assert!(!fixture.environment.has_code(&predicted).await);
}

#[tokio::test]
async fn audit_record_describes_deployment() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));
    let mut records = fixture.orchestrator.subscribe();

    let instance = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "t1", implementation))
        .await
        .unwrap();

    let record = records.try_recv().unwrap();
    assert_eq!(record.kind, FlowKind::Task);
    assert_eq!(record.namespace, "ns");
    assert_eq!(record.name, "t1");
    assert_eq!(record.instance, instance);
    assert_eq!(record.implementation, implementation);

    // Exactly one record per successful flow
    assert!(records.try_recv().is_err());
}

#[tokio::test]
async fn instances_keep_independent_state() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(CountingTaskBehavior));

    let a = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "a", implementation))
        .await
        .unwrap();
    let b = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "b", implementation))
        .await
        .unwrap();

    // Drive the two instances unevenly
    fixture.environment.call(&a, b"tick").await.unwrap();
    fixture.environment.call(&a, b"tick").await.unwrap();
    let echoed = fixture.environment.call(&b, b"tock").await.unwrap();
    assert_eq!(echoed, b"tock");

    assert_eq!(
        fixture.environment.storage_value(&a, COUNTER_KEY),
        Some(2u64.to_le_bytes().to_vec())
    );
    assert_eq!(
        fixture.environment.storage_value(&b, COUNTER_KEY),
        Some(1u64.to_le_bytes().to_vec())
    );
}

#[tokio::test]
async fn delegation_forwards_failures_verbatim() {
    let fixture = Fixture::new();
    let caller = Address::new_unique();
    let implementation = fixture.approved_implementation(Arc::new(RevertingBehavior("nope")));

    let instance = fixture
        .orchestrator
        .deploy_task(&caller, task_request("ns", "t1", implementation))
        .await
        .unwrap();

    match fixture.environment.call(&instance, b"go").await {
        Err(CallError::Reverted(reason)) => assert_eq!(reason, "nope"),
        other => panic!("expected revert, got {other:?}"),
    }
}
