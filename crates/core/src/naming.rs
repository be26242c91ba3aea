// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic, DNS-safe resource names derived from a username.
//!
//! Every object the controller creates for a user is named through
//! [`resource_name`], so later lookups and deletes rebuild the same
//! identifier without any stored state.

use std::fmt::Write;

/// Kind of backend object named after a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Service,
    Claim,
    Mapping,
}

crate::simple_display! {
    ResourceKind {
        Pod => "pod",
        Service => "service",
        Claim => "claim",
        Mapping => "mapping",
    }
}

/// Escape a username into the `[a-z0-9-]` alphabet.
///
/// Characters in `[a-z0-9]` pass through. Every other character is written
/// as its UTF-8 bytes, each rendered `-hh` in lowercase hex. Every escape is
/// exactly three characters and `-` never passes through, so the output
/// decodes unambiguously and distinct inputs never collide.
pub fn escape(user: &str) -> String {
    let mut out = String::with_capacity(user.len());
    let mut buf = [0u8; 4];
    for c in user.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            continue;
        }
        for byte in c.encode_utf8(&mut buf).bytes() {
            // Writing into a String cannot fail
            let _ = write!(out, "-{byte:02x}");
        }
    }
    out
}

/// Name of the `kind` object owned by `user`.
pub fn resource_name(user: &str, kind: ResourceKind) -> String {
    let escaped = escape(user);
    match kind {
        ResourceKind::Pod => format!("hatchery-{escaped}"),
        ResourceKind::Service => format!("h-{escaped}-s"),
        ResourceKind::Mapping => format!("{escaped}-mapping"),
        ResourceKind::Claim => format!("{kind}-{escaped}"),
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
