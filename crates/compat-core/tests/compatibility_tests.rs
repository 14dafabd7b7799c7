//! End-to-end behaviour of the admission gate, engine, and cascade.

use compat_core::{
    Admission, EngineConfig, SelfDependencyPolicy, SpecSet, derive_compatibility, spec_set,
};
use compat_test_utils::Catalog;
use pretty_assertions::assert_eq;

mod derivation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_dependency_free_version() {
        let mut catalog = Catalog::new();
        catalog.put("p0", &["spec1"], &[]);

        catalog.assert_compatible("p0", &["spec1"]);
        catalog.assert_consistent();
    }

    #[test]
    fn test_derive_is_idempotent() {
        let mut catalog = Catalog::new();
        catalog.put("p0", &["spec1", "spec2"], &[]);
        catalog.put("p1", &["spec1"], &["p0"]);
        let p1 = catalog.id("p1");

        let first = derive_compatibility(catalog.store(), p1).unwrap();
        let second = derive_compatibility(catalog.store(), p1).unwrap();
        assert_eq!(first, second);
        assert_eq!(&first, catalog.store().compatible(p1).unwrap());
    }

    #[test]
    fn test_multiple_dependencies_intersect() {
        let mut catalog = Catalog::new();
        catalog.put("a", &["spec1", "spec2"], &[]);
        catalog.put("b", &["spec2", "spec3"], &[]);

        let admission = catalog.put("app", &["spec2"], &["a", "b"]);
        assert!(admission.is_accepted());
        catalog.assert_compatible("app", &["spec2"]);
    }
}

mod admission {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_superset_of_dependency_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.put("p0", &["spec1"], &[]);

        let admission = catalog.put("p1", &["spec1", "spec2"], &["p0"]);

        match admission {
            Admission::Rejected(rejection) => {
                assert_eq!(rejection.product, catalog.id("p1"));
                assert_eq!(rejection.disallowed, spec_set(["spec2"]));
            }
            Admission::Accepted(_) => panic!("expected rejection"),
        }
        catalog.assert_compatible("p1", &[]);
    }

    #[test]
    fn test_rejection_leaves_no_trace() {
        let mut catalog = Catalog::new();
        catalog.put("p0", &["spec1"], &[]);
        catalog.put("p1", &["spec1"], &["p0"]);
        catalog.product("p2");
        let before = catalog.store().snapshot();

        let admission = catalog.put("p2", &["spec1", "spec2"], &["p0", "p1"]);

        assert!(!admission.is_accepted());
        assert_eq!(catalog.store().snapshot(), before);
    }

    #[test]
    fn test_rejection_is_deterministic() {
        let mut catalog = Catalog::new();
        catalog.put("p0", &["spec1"], &[]);

        let first = catalog.put("p1", &["spec2"], &["p0"]);
        let second = catalog.put("p1", &["spec2"], &["p0"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_dependency_on_empty_product_admits_only_empty_supports() {
        let mut catalog = Catalog::new();
        catalog.product("empty");

        assert!(!catalog.put("p", &["spec1"], &["empty"]).is_accepted());
        assert!(catalog.put("p", &[], &["empty"]).is_accepted());
        catalog.assert_compatible("p", &[]);
    }
}

mod propagation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dependency_growth_is_not_inherited() {
        let mut catalog = Catalog::new();
        catalog.put("p0", &["spec1", "spec2"], &[]);
        assert!(catalog.put("p1", &["spec1", "spec2"], &["p0"]).is_accepted());
        catalog.assert_compatible("p1", &["spec1", "spec2"]);

        catalog.put("p0", &["spec3", "spec4"], &[]);

        catalog.assert_compatible("p0", &["spec1", "spec2", "spec3", "spec4"]);
        catalog.assert_compatible("p1", &["spec1", "spec2"]);
        catalog.assert_consistent();
    }

    #[test]
    fn test_narrowing_dependency_caps_dependent() {
        let mut catalog = Catalog::new();
        let v0 = catalog.add("p0", &["spec1", "spec2"], &[]);
        let v1 = catalog.add("p1", &["spec1", "spec2"], &["p0"]);

        let admission = catalog.update("p0", v0, &["spec1"], &[]);
        assert!(admission.is_accepted());

        catalog.assert_compatible("p1", &["spec1"]);
        // The dependent's own declaration is untouched.
        assert_eq!(
            catalog.store().version(v1).unwrap().supports(),
            &spec_set(["spec1", "spec2"])
        );
        catalog.assert_consistent();
    }

    #[test]
    fn test_cascade_reports_changed_dependents() {
        let mut catalog = Catalog::new();
        let v0 = catalog.add("p0", &["spec1", "spec2"], &[]);
        catalog.add("p1", &["spec1", "spec2"], &["p0"]);
        catalog.add("p2", &["spec1"], &["p1"]);

        let accepted = catalog
            .update("p0", v0, &["spec1"], &[])
            .into_accepted()
            .unwrap();

        assert_eq!(
            accepted.cascade.changed_products(),
            vec![catalog.id("p0"), catalog.id("p1")]
        );
        assert!(accepted.cascade.contains(catalog.id("p2")));
    }

    #[test]
    fn test_mutual_dependency_settles() {
        let mut catalog = Catalog::new();
        let v0 = catalog.add("p0", &["spec1"], &[]);
        catalog.add("p1", &["spec1"], &["p0"]);

        let admission = catalog.update("p0", v0, &["spec1"], &["p1"]);

        assert!(admission.is_accepted());
        catalog.assert_compatible("p0", &["spec1"]);
        catalog.assert_compatible("p1", &["spec1"]);
        catalog.assert_consistent();
    }

    #[test]
    fn test_breaking_a_cycle_restores_consistency() {
        let mut catalog = Catalog::new();
        let v0 = catalog.add("p0", &["spec1", "spec2"], &[]);
        let v1 = catalog.add("p1", &["spec1", "spec2"], &["p0"]);
        catalog.update("p0", v0, &["spec1", "spec2"], &["p1"]);

        // Remove the cycle, then re-issue the affected update.
        catalog.update("p1", v1, &["spec1"], &[]);
        catalog.update("p0", v0, &["spec1"], &["p1"]);

        catalog.assert_compatible("p0", &["spec1"]);
        catalog.assert_compatible("p1", &["spec1"]);
        catalog.assert_consistent();
    }

    #[test]
    fn test_self_dependency_allowed_by_policy() {
        let mut catalog = Catalog::with_config(EngineConfig {
            self_dependency: SelfDependencyPolicy::Allow,
            audit_after_commit: true,
        });
        catalog.put("p0", &["spec1", "spec2"], &[]);

        assert!(catalog.put("p0", &["spec1"], &["p0"]).is_accepted());
        catalog.assert_compatible("p0", &["spec1", "spec2"]);
        assert_eq!(catalog.store().product(catalog.id("p0")).unwrap().versions().len(), 2);
    }

    #[test]
    fn test_empty_product_derives_empty() {
        let mut catalog = Catalog::new();
        let p = catalog.product("p");
        assert_eq!(derive_compatibility(catalog.store(), p).unwrap(), SpecSet::new());
    }
}
