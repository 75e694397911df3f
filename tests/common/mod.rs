#![allow(dead_code)]

pub use gwasdag_test_utils::{init_tracing, with_timeout};
