pub mod upper_stub;
