use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1};

/// Freshly generated key material for a new account.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

/// Generate a new secp256k1 keypair.
/// Address is simply the hex of the compressed public key (didactic).
pub fn generate_keypair() -> KeyPair {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    let public_key = hex::encode(pk.serialize()); // compressed (33 bytes)
    KeyPair {
        private_key: hex::encode(sk.secret_bytes()),
        address: public_key.clone(),
        public_key,
    }
}

/// Derive the address for a hex public key, normalized to lowercase.
pub fn pubkey_to_address_hex(pubkey_hex: &str) -> Result<String, &'static str> {
    let bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&bytes).map_err(|_| "invalid pubkey bytes")?;
    Ok(hex::encode(pk.serialize()))
}
