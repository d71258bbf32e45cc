pub(crate) mod keypair;

pub use keypair::PrivateKey;
