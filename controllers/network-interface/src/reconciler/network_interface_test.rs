//! Unit tests for NetworkInterface reconciler

#[cfg(test)]
mod tests {
    use crate::error::{ControllerError, ErrorClass};
    use crate::scheduler::{ObjectKey, Outcome};
    use crate::test_utils::*;
    use link_client::{LinkCall, LinkOp, Route};
    use std::time::Duration;

    fn key(name: &str) -> ObjectKey {
        ObjectKey::cluster(name)
    }

    fn route(to: &str, via: &str) -> Route {
        Route::new(to.parse().unwrap(), via.parse().unwrap())
    }

    fn ops(calls: &[LinkCall]) -> Vec<LinkOp> {
        calls.iter().map(LinkCall::op).collect()
    }

    fn store_with(nic: crds::NetworkInterface, routes: &[(&str, &str)]) -> MockStore {
        MockStore::new()
            .with_network_interface(nic)
            .with_private_network(create_test_private_network(NETWORK, routes))
    }

    #[tokio::test]
    async fn test_vanished_object_is_a_no_op() {
        let h = create_test_reconciler(MockStore::new(), false);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert!(h.links.calls().is_empty());
        assert_eq!(h.metadata.calls(), 0);
    }

    #[tokio::test]
    async fn test_foreign_object_makes_no_calls() {
        let nic = with_mac(
            create_test_network_interface("nic-a", OTHER_NODE, "192.168.0.10/24", NETWORK),
            MAC,
        );
        let h = create_test_reconciler(store_with(nic, &[("10.1.0.0/16", "192.168.0.1")]), false);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert!(h.links.calls().is_empty());
        assert_eq!(h.metadata.calls(), 0);
        assert!(h.store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_awaiting_address_requeues_without_link_calls() {
        let nic = create_test_network_interface("nic-a", NODE, "192.168.0.10/24", NETWORK);
        let h = create_test_reconciler(store_with(nic, &[]), false);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::RequeueAfter(Duration::from_secs(1)));
        assert!(h.links.calls().is_empty());
        assert!(h.store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_first_pass_binds_configures_and_routes() {
        let nic = create_attached_network_interface("nic-a");
        let h = create_test_reconciler(store_with(nic, &[("10.1.0.0/16", "192.168.0.1")]), false);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(
            ops(&h.links.calls()),
            vec![LinkOp::GetLinkName, LinkOp::Configure, LinkOp::SyncRoutes]
        );
        assert_eq!(
            h.links.calls()[1],
            LinkCall::Configure {
                mac: MAC.to_string(),
                address: "192.168.0.10/24".parse().unwrap(),
            }
        );
        assert_eq!(h.metadata.calls(), 1);
        assert_eq!(h.store.status_writes(), 1);
        let stored = h.store.network_interface("nic-a").unwrap();
        assert_eq!(stored.link_name(), Some(LINK));
        assert_eq!(stored.mac_address(), Some(MAC));
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let nic = create_attached_network_interface("nic-a");
        let h = create_test_reconciler(store_with(nic, &[("10.1.0.0/16", "192.168.0.1")]), false);
        h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();
        let after_first = h.store.network_interface("nic-a").unwrap();
        h.store.clear_writes();
        h.links.clear_calls();

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert!(h.store.writes().is_empty(), "no status write on an up-to-date object");
        assert_eq!(h.store.network_interface("nic-a").unwrap(), after_first);
        assert_eq!(
            ops(&h.links.calls()),
            vec![LinkOp::GetLinkName, LinkOp::Configure, LinkOp::SyncRoutes]
        );
    }

    #[tokio::test]
    async fn test_changed_link_name_is_rewritten() {
        let nic = with_link_name(create_attached_network_interface("nic-a"), "eth9");
        let h = create_test_reconciler(store_with(nic, &[]), false);

        h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(h.store.status_writes(), 1);
        assert_eq!(h.store.network_interface("nic-a").unwrap().link_name(), Some(LINK));
    }

    #[tokio::test]
    async fn test_teardown_releases_finalizer_only_on_success() {
        let nic = terminating(create_attached_network_interface("nic-a"));
        let h = create_test_reconciler(store_with(nic, &[]), false);
        h.links.fail_on(LinkOp::TearDown);
        let before = h.store.network_interface("nic-a").unwrap();

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert!(matches!(err, ControllerError::Link(_)));
        assert_eq!(err.class(), ErrorClass::Transient);
        assert!(h.store.writes().is_empty());
        assert_eq!(h.store.network_interface("nic-a").unwrap(), before);
        assert_eq!(ops(&h.links.calls()), vec![LinkOp::TearDown]);

        h.links.recover(LinkOp::TearDown);
        h.links.clear_calls();
        let _ = h.reconciler.reconcile_network_interface(&key("nic-a")).await;

        assert_eq!(h.links.calls()[0].op(), LinkOp::TearDown);
        assert!(
            h.store.network_interface("nic-a").is_none(),
            "object goes away once the finalizer is released"
        );
    }

    #[tokio::test]
    async fn test_pass_after_release_fails_on_vanished_object_then_settles() {
        let nic = terminating(create_attached_network_interface("nic-a"));
        let h = create_test_reconciler(store_with(nic, &[]), false);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        // The status write after release hits the deleted object
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(
            ops(&h.links.calls()),
            vec![LinkOp::TearDown, LinkOp::GetLinkName]
        );

        h.links.clear_calls();
        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert!(h.links.calls().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_with_other_finalizers_falls_through() {
        let mut nic = terminating(create_attached_network_interface("nic-a"));
        nic.metadata.finalizers = Some(vec![
            crds::NETWORK_INTERFACE_FINALIZER.to_string(),
            "example.com/other".to_string(),
        ]);
        let h = create_test_reconciler(store_with(nic, &[("10.1.0.0/16", "192.168.0.1")]), false);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(
            ops(&h.links.calls()),
            vec![
                LinkOp::TearDown,
                LinkOp::GetLinkName,
                LinkOp::Configure,
                LinkOp::SyncRoutes
            ]
        );
        let stored = h.store.network_interface("nic-a").unwrap();
        assert_eq!(stored.metadata.finalizers, Some(vec!["example.com/other".to_string()]));
        assert_eq!(stored.link_name(), Some(LINK));
    }

    #[tokio::test]
    async fn test_short_circuit_ends_pass_after_release() {
        let nic = terminating(create_attached_network_interface("nic-a"));
        let h = create_test_reconciler(store_with(nic, &[]), true);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(ops(&h.links.calls()), vec![LinkOp::TearDown]);
        assert_eq!(h.metadata.calls(), 0);
        assert!(h.store.network_interface("nic-a").is_none());
    }

    #[tokio::test]
    async fn test_routes_converge_to_the_current_set() {
        let nic = create_attached_network_interface("nic-a");
        let h = create_test_reconciler(
            store_with(nic, &[("10.1.0.0/16", "192.168.0.1"), ("10.2.0.0/16", "192.168.0.1")]),
            false,
        );
        h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();
        assert_eq!(
            h.links.last_synced_routes().unwrap(),
            vec![route("10.1.0.0/16", "192.168.0.1"), route("10.2.0.0/16", "192.168.0.1")]
        );

        h.store.put_private_network(create_test_private_network(
            NETWORK,
            &[("10.2.0.0/16", "192.168.0.1"), ("10.3.0.0/16", "192.168.0.2")],
        ));
        h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();

        assert_eq!(
            h.links.last_synced_routes().unwrap(),
            vec![route("10.2.0.0/16", "192.168.0.1"), route("10.3.0.0/16", "192.168.0.2")]
        );
    }

    #[tokio::test]
    async fn test_malformed_route_aborts_before_sync() {
        let nic = create_attached_network_interface("nic-a");
        let h = create_test_reconciler(
            store_with(nic, &[("10.1.0.0/16", "192.168.0.1"), ("10.2.0.0/99", "192.168.0.1")]),
            false,
        );

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert!(matches!(err, ControllerError::InvalidRoute { field: "to", .. }));
        assert_eq!(err.class(), ErrorClass::Data);
        assert!(h.links.last_synced_routes().is_none());
    }

    #[tokio::test]
    async fn test_missing_nic_fails_and_leaves_link_name_untouched() {
        let nic = with_link_name(create_attached_network_interface("nic-a"), "eth9");
        let h = create_test_reconciler(store_with(nic, &[]), false);
        h.metadata.detach(MAC);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert!(matches!(err, ControllerError::NicNotFound(ref mac) if mac == MAC));
        assert_eq!(err.class(), ErrorClass::Data);
        assert!(h.links.calls().is_empty());
        assert!(h.store.writes().is_empty());
        assert_eq!(h.store.network_interface("nic-a").unwrap().link_name(), Some("eth9"));
    }

    #[tokio::test]
    async fn test_hardware_address_match_ignores_case() {
        let nic = with_mac(
            create_test_network_interface("nic-a", NODE, "192.168.0.10/24", NETWORK),
            &MAC.to_uppercase(),
        );
        let h = create_test_reconciler(store_with(nic, &[]), false);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();
        assert_eq!(outcome, Outcome::Done);
    }

    #[tokio::test]
    async fn test_metadata_failure_is_transient() {
        let h = create_test_reconciler(store_with(create_attached_network_interface("nic-a"), &[]), false);
        h.metadata.set_failing(true);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert!(matches!(err, ControllerError::Metadata(_)));
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[tokio::test]
    async fn test_missing_owner_reference_is_data_error() {
        let mut nic = create_attached_network_interface("nic-a");
        nic.metadata.owner_references = None;
        let h = create_test_reconciler(store_with(nic, &[]), false);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert!(matches!(err, ControllerError::MissingOwnerReference(ref name) if name == "nic-a"));
        assert_eq!(err.class(), ErrorClass::Data);
    }

    #[tokio::test]
    async fn test_missing_private_network_is_data_error() {
        let store = MockStore::new().with_network_interface(create_attached_network_interface("nic-a"));
        let h = create_test_reconciler(store, false);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert!(matches!(err, ControllerError::PrivateNetworkNotFound(ref name) if name == NETWORK));
        assert_eq!(err.class(), ErrorClass::Data);
    }

    #[tokio::test]
    async fn test_malformed_address_is_data_error() {
        let nic = with_mac(create_test_network_interface("nic-a", NODE, "not-an-address", NETWORK), MAC);
        let h = create_test_reconciler(store_with(nic, &[]), false);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();

        assert_eq!(err.class(), ErrorClass::Data);
        assert!(h.links.calls().is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_status_write_redoes_the_pass() {
        let h = create_test_reconciler(store_with(create_attached_network_interface("nic-a"), &[]), false);
        h.store.inject_conflicts(1);

        let err = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Conflict);
        assert_eq!(ops(&h.links.calls()), vec![LinkOp::GetLinkName]);

        let outcome = h.reconciler.reconcile_network_interface(&key("nic-a")).await.unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(h.store.network_interface("nic-a").unwrap().link_name(), Some(LINK));
    }

    #[tokio::test]
    async fn test_stale_copy_loses_status_write() {
        let h = create_test_reconciler(store_with(create_attached_network_interface("nic-a"), &[]), false);
        let stale = h.store.network_interface("nic-a").unwrap();
        // Another writer bumps the resourceVersion
        h.store.put_network_interface(stale.clone());

        let mut update = stale;
        update.status.as_mut().unwrap().link_name = Some("eth1".to_string());
        let err = crate::store::ResourceStore::update_network_interface_status(&h.store, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::store::StoreError::Conflict { .. }));
    }
}
