// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn slug_parses_owner_and_project() {
    assert_eq!(parse_slug("acme/api").unwrap(), ("acme", "api"));
}

#[test]
fn slug_rejects_malformed_input() {
    assert!(parse_slug("acme").is_err());
    assert!(parse_slug("/api").is_err());
    assert!(parse_slug("acme/").is_err());
    assert!(parse_slug("").is_err());
}

#[test]
fn slug_keeps_extra_separators_in_project() {
    // owner/project/subpath: everything after the first '/' is the project
    assert_eq!(parse_slug("acme/api/extra").unwrap(), ("acme", "api/extra"));
}
