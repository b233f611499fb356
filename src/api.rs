pub mod nbrb;
pub mod retry;
