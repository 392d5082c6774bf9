//! Flutter-facing bindings for the Shattered Ring core.

pub mod api;
