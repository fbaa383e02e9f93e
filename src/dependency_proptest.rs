//! Property-based tests for dependency and descriptor string forms.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::dependency::Dependency;
    use crate::descriptor::NativeApplicationDescriptor;
    use proptest::prelude::*;

    // ============================================================================
    // Dependency property tests
    // ============================================================================

    proptest! {
        /// Property: parsing then printing a scoped, versioned dependency is the identity
        #[test]
        fn scoped_dependency_round_trips(
            scope in "[a-z][a-z0-9-]{0,12}",
            name in "[a-z][a-z0-9._-]{0,20}",
            version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        ) {
            let s = format!("@{}/{}@{}", scope, name, version);
            let dep: Dependency = s.parse().unwrap();
            prop_assert_eq!(dep.to_string(), s);
        }

        /// Property: unscoped dependencies round-trip, with or without version
        #[test]
        fn unscoped_dependency_round_trips(
            name in "[a-z][a-z0-9._-]{0,20}",
            version in proptest::option::of("[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}"),
        ) {
            let s = match &version {
                Some(v) => format!("{}@{}", name, v),
                None => name.clone(),
            };
            let dep: Dependency = s.parse().unwrap();
            prop_assert_eq!(dep.version.clone(), version);
            prop_assert_eq!(dep.to_string(), s);
        }

        /// Property: without_version keeps the package identity
        #[test]
        fn without_version_is_same_package(
            name in "[a-z][a-z0-9-]{0,20}",
            version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        ) {
            let dep: Dependency = format!("{}@{}", name, version).parse().unwrap();
            let stripped = dep.without_version();
            prop_assert!(stripped.same_package(&dep));
            prop_assert_eq!(stripped.version, None);
        }

        /// Property: parsing never panics
        #[test]
        fn dependency_parse_never_panics(input in ".*") {
            let _ = input.parse::<Dependency>();
        }
    }

    // ============================================================================
    // Descriptor property tests
    // ============================================================================

    proptest! {
        /// Property: complete descriptors round-trip and are not partial
        #[test]
        fn complete_descriptor_round_trips(
            name in "[A-Za-z][A-Za-z0-9_-]{0,20}",
            platform in prop_oneof![Just("android"), Just("ios")],
            version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        ) {
            let s = format!("{}:{}:{}", name, platform, version);
            let descriptor: NativeApplicationDescriptor = s.parse().unwrap();
            prop_assert!(!descriptor.is_partial());
            prop_assert_eq!(descriptor.to_string(), s);
        }

        /// Property: descriptor parsing never panics
        #[test]
        fn descriptor_parse_never_panics(input in ".*") {
            let _ = input.parse::<NativeApplicationDescriptor>();
        }
    }
}
