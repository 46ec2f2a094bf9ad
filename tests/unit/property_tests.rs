//! Property-based tests for path resolution and scope fallback.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use proptest::prelude::*;

use stratus::DeployContext;
use stratus::domain::scope::PassphraseScope;

use crate::helpers::environ;

fn test_context() -> DeployContext {
    DeployContext::builder()
        .environ(environ(&[]))
        .cwd(PathBuf::from("/work"))
        .home(PathBuf::from("/home/dev"))
        .build()
        .expect("context")
}

/// Path segments without separators, `.`/`..`, or NUL.
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,12}"
}

fn optional_field() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z0-9]{1,8}")
}

proptest! {
    #[test]
    fn prop_abspath_is_idempotent(segments in proptest::collection::vec(segment(), 1..6)) {
        let ctx = test_context();
        let relative = segments.join("/");
        let once = ctx.abspath(&relative);
        let twice = ctx.abspath(once.to_str().expect("utf-8 path"));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_abspath_output_is_absolute(segments in proptest::collection::vec(segment(), 1..6)) {
        let ctx = test_context();
        prop_assert!(ctx.abspath(&segments.join("/")).is_absolute());
    }

    #[test]
    fn prop_fallback_chain_broadens_monotonically(
        backend in optional_field(),
        organization in optional_field(),
        project in optional_field(),
        stack in optional_field(),
    ) {
        let scope = PassphraseScope { backend_url: backend, organization, project, stack };
        let chain = scope.fallbacks();

        // Chain length is the number of pinned fields, and it always ends
        // at the global default when anything was pinned at all.
        let pinned = usize::from(scope.backend_url.is_some())
            + usize::from(scope.organization.is_some())
            + usize::from(scope.project.is_some())
            + usize::from(scope.stack.is_some());
        prop_assert_eq!(chain.len(), pinned);
        if let Some(last) = chain.last() {
            prop_assert!(last.is_global());
        }

        // Each step clears fields relative to its predecessor, never sets.
        let mut previous = scope;
        for step in chain {
            prop_assert!(step.backend_url.is_none() || previous.backend_url.is_some());
            prop_assert!(step.organization.is_none() || previous.organization.is_some());
            prop_assert!(step.project.is_none() || previous.project.is_some());
            prop_assert!(step.stack.is_none());
            previous = step;
        }
    }
}
