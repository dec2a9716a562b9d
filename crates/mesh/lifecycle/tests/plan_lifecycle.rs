//! End-to-end lifecycle of generated plan resources over the in-memory store.

use mesh_lifecycle::{
    create_context, InMemoryResourceStore, LifecycleConfig, LifecycleError, ResourceContext,
    ResourceKey, ResourceStore,
};
use mesh_types::{
    Blueprint, BlueprintModule, BlueprintSpec, ObservedState, OwnerIdentity, Plotter,
    ResourceKind, ResourceReference,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn setup(kind: ResourceKind, config: LifecycleConfig) -> (Arc<InMemoryResourceStore>, Arc<dyn ResourceContext>) {
    let store = Arc::new(InMemoryResourceStore::new().with_namespace(&config.system_namespace));
    let ctx = create_context(kind, store.clone(), store.clone(), &config);
    (store, ctx)
}

fn owner() -> OwnerIdentity {
    OwnerIdentity::new("team-a", "notebook")
}

fn plans(clusters: &[&str]) -> BTreeMap<String, BlueprintSpec> {
    clusters
        .iter()
        .map(|c| {
            let spec = BlueprintSpec::new(*c).with_module(BlueprintModule::new("read", "charts/read"));
            (c.to_string(), spec)
        })
        .collect()
}

#[tokio::test]
async fn test_factory_selects_kind() {
    let (_, blueprints) = setup(ResourceKind::Blueprint, LifecycleConfig::default());
    let (_, plotters) = setup(ResourceKind::Plotter, LifecycleConfig::default());
    assert_eq!(blueprints.kind(), ResourceKind::Blueprint);
    assert_eq!(plotters.kind(), ResourceKind::Plotter);
}

#[tokio::test]
async fn test_blueprint_full_lifecycle() {
    let (store, ctx) = setup(ResourceKind::Blueprint, LifecycleConfig::default());
    let owner = owner();

    let reference = ctx.create_reference(&owner).await.unwrap();
    assert!(store.namespace_exists(&reference.namespace));
    assert!(!ctx.exists(Some(&reference)).await);

    ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();
    assert!(ctx.exists(Some(&reference)).await);

    let stored: Blueprint = store
        .get(&ResourceKey::from(&reference))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.spec.cluster, "eu-1");
    assert!(stored.spec.modules.contains_key("read"));

    assert_eq!(ctx.find_by_owner(&owner).await.unwrap(), vec![reference.clone()]);

    ctx.delete(&reference).await.unwrap();
    assert!(!ctx.exists(Some(&reference)).await);
    assert!(!store.namespace_exists(&reference.namespace));

    // deleting again is a no-op
    ctx.delete(&reference).await.unwrap();
}

#[tokio::test]
async fn test_blueprint_namespace_delete_cascades() {
    let (store, ctx) = setup(ResourceKind::Blueprint, LifecycleConfig::default());
    let owner = owner();
    let reference = ctx.create_reference(&owner).await.unwrap();
    ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();

    // a plotter placed in the blueprint namespace goes with it
    let plotters = create_context(
        ResourceKind::Plotter,
        store.clone(),
        store.clone(),
        &LifecycleConfig::default().with_system_namespace(&reference.namespace),
    );
    let sibling = plotters.create_reference(&owner).await.unwrap();
    plotters.create_or_update(&owner, &sibling, &plans(&["eu-1"])).await.unwrap();
    assert_eq!(store.resource_count(), 2);

    ctx.delete(&reference).await.unwrap();
    assert_eq!(store.resource_count(), 0);
}

#[tokio::test]
async fn test_plotter_stores_every_plan() {
    let (store, ctx) = setup(ResourceKind::Plotter, LifecycleConfig::default());
    let owner = owner();
    let reference = ctx.create_reference(&owner).await.unwrap();

    ctx.create_or_update(&owner, &reference, &plans(&["eu-1", "us-1"]))
        .await
        .unwrap();

    let stored: Plotter = store
        .get(&ResourceKey::from(&reference))
        .await
        .unwrap()
        .decode()
        .unwrap();
    let clusters: Vec<_> = stored.spec.blueprints.keys().cloned().collect();
    assert_eq!(clusters, vec!["eu-1", "us-1"]);
    assert_eq!(stored.metadata.owner(), Some(owner));
}

#[tokio::test]
async fn test_plotter_delete_keeps_system_namespace() {
    let (store, ctx) = setup(ResourceKind::Plotter, LifecycleConfig::default());
    let owner = owner();
    let reference = ctx.create_reference(&owner).await.unwrap();
    ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();

    ctx.delete(&reference).await.unwrap();
    assert!(!ctx.exists(Some(&reference)).await);
    assert!(store.namespace_exists("mesh-system"));

    ctx.delete(&reference).await.unwrap();
}

#[tokio::test]
async fn test_exists_false_cases() {
    let (store, ctx) = setup(ResourceKind::Plotter, LifecycleConfig::default());
    let owner = owner();
    let reference = ctx.create_reference(&owner).await.unwrap();
    ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();

    assert!(!ctx.exists(None).await);
    assert!(
        !ctx.exists(Some(&ResourceReference::new("", "mesh-system", ResourceKind::Plotter)))
            .await
    );
    assert!(ctx.exists(Some(&reference)).await);

    store.set_outage(Some("api server down".into())).await;
    assert!(!ctx.exists(Some(&reference)).await);
}

#[tokio::test]
async fn test_exists_false_without_namespace() {
    for kind in [ResourceKind::Blueprint, ResourceKind::Plotter] {
        let (_, ctx) = setup(kind, LifecycleConfig::default());
        let owner = owner();
        let reference = ctx.create_reference(&owner).await.unwrap();
        ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();

        let unnamespaced = ResourceReference::new(reference.name.clone(), "", kind);
        assert!(!ctx.exists(Some(&unnamespaced)).await, "{kind}");
        assert!(
            !ctx.exists(Some(&ResourceReference::new("notebook", "", kind))).await,
            "{kind}"
        );
        assert!(ctx.exists(Some(&reference)).await, "{kind}");
    }
}

#[tokio::test]
async fn test_status_errors_surface() {
    let (store, ctx) = setup(ResourceKind::Plotter, LifecycleConfig::default());
    let owner = owner();
    let reference = ctx.create_reference(&owner).await.unwrap();
    ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();

    store
        .set_observed_state(&ResourceKey::from(&reference), &ObservedState::failed("chart failed"))
        .unwrap();
    let state = ctx.get_status(Some(&reference)).await.unwrap();
    assert!(state.has_error());

    store.set_outage(Some("api server down".into())).await;
    let err = ctx.get_status(Some(&reference)).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(ctx.get_status(None).await.unwrap(), ObservedState::default());
}

#[tokio::test]
async fn test_conflicts_retried_within_budget() {
    let config = LifecycleConfig::default().with_conflict_retries(2);
    let (store, ctx) = setup(ResourceKind::Plotter, config);
    let owner = owner();
    let reference = ctx.create_reference(&owner).await.unwrap();
    ctx.create_or_update(&owner, &reference, &plans(&["eu-1"])).await.unwrap();

    store.inject_conflicts(2);
    ctx.create_or_update(&owner, &reference, &plans(&["eu-1", "us-1"]))
        .await
        .unwrap();

    store.inject_conflicts(3);
    let result = ctx.create_or_update(&owner, &reference, &plans(&["us-1"])).await;
    match result {
        Err(LifecycleError::Store(err)) => assert!(err.is_conflict()),
        other => panic!("expected conflict, got {:?}", other),
    }

    let stored: Plotter = store
        .get(&ResourceKey::from(&reference))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.spec.blueprints.len(), 2);
}

#[tokio::test]
async fn test_find_by_owner_separates_owners() {
    let (_, ctx) = setup(ResourceKind::Blueprint, LifecycleConfig::default());
    let first = owner();
    let second = OwnerIdentity::new("team-b", "notebook");

    for owner in [&first, &second, &first] {
        let reference = ctx.create_reference(owner).await.unwrap();
        ctx.create_or_update(owner, &reference, &plans(&["eu-1"])).await.unwrap();
    }

    assert_eq!(ctx.find_by_owner(&first).await.unwrap().len(), 2);
    assert_eq!(ctx.find_by_owner(&second).await.unwrap().len(), 1);
    assert!(ctx
        .find_by_owner(&OwnerIdentity::new("team-c", "other"))
        .await
        .unwrap()
        .is_empty());
}
