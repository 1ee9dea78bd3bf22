pub mod kraken;
#[cfg(test)]
pub mod mock;
pub mod traits;
