#![allow(dead_code)]

pub mod fake_engine;
pub mod synthetic_ledger;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
