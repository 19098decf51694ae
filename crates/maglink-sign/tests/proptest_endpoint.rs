//! Property-based tests for hostname inference
//!
//! Inference runs on attacker-controlled URL strings; it must never
//! panic, and anything it does match must carry the embedded region
//! verbatim.

use maglink_sign::infer;
use proptest::prelude::*;

/// Region-shaped labels
fn arb_region() -> impl Strategy<Value = String> {
    "[a-z]{2}(-[a-z]{2,10}){1,2}-[1-9]"
}

proptest! {
    /// Property: inference never panics, whatever the input
    #[test]
    fn infer_never_panics(input in ".{0,200}") {
        let _ = infer(&input);
    }

    /// Property: inference never panics on URL-shaped input
    #[test]
    fn infer_never_panics_on_url_shapes(
        scheme in "[a-z]{1,8}",
        host in "[a-zA-Z0-9.-]{0,60}",
        path in "[ -~]{0,40}",
    ) {
        let _ = infer(&format!("{scheme}://{host}/{path}"));
    }

    /// Property: well-formed execute-api hostnames always match with the
    /// embedded region
    #[test]
    fn execute_api_region_roundtrip(id in "[a-z0-9]{1,16}", region in arb_region()) {
        let url = format!("https://{id}.execute-api.{region}.amazonaws.com/prod");
        let endpoint = infer(&url).expect("managed hostname must match");
        prop_assert_eq!(endpoint.region, region);
        prop_assert_eq!(endpoint.service, "execute-api");
    }

    /// Property: well-formed lambda-url hostnames always match with the
    /// embedded region
    #[test]
    fn lambda_url_region_roundtrip(id in "[a-z0-9]{1,16}", region in arb_region()) {
        let url = format!("https://{id}.lambda-url.{region}.on.aws/");
        let endpoint = infer(&url).expect("managed hostname must match");
        prop_assert_eq!(endpoint.region, region);
        prop_assert_eq!(endpoint.service, "lambda");
    }

    /// Property: hosts without the managed suffixes never match
    #[test]
    fn unrelated_hosts_never_match(host in "[a-z0-9]{1,20}\\.example\\.com") {
        let url = format!("https://{}/", host);
        prop_assert!(infer(&url).is_none());
    }
}
