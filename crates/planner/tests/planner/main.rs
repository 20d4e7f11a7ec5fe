//! End-to-end filter compilation tests
//!
//! These tests drive the public API: payloads in, query plans out, over a
//! small company/relationship/person entity graph.

mod errors;
mod helpers;
mod plans;
