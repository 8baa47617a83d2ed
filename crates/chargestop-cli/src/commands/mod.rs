pub mod inspect;
pub mod solve;
