//! # zkts-common
//!
//! Types shared by every zkts crate: participant identities, stamp commitments,
//! the Groth16-shaped proof envelope, the public-input binding that ties a
//! proof to its submitter, and the two-stage content hash used for
//! self-checking a commitment before it is registered.
//!
//! All fixed-width values serialize as `0x`-prefixed lowercase hex strings so
//! they can be used as JSON map keys and typed on a command line.

pub mod error;
pub mod hash;

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub use error::CommonError;
pub use hash::{hash_by_bytes, CommitmentHasher, Sha256PoseidonHasher};

/// Monetary amount in the substrate's smallest unit.
pub type Amount = u128;

/// Substrate timestamp (seconds). Zero is reserved as the "never" sentinel.
pub type Timestamp = u64;

/// Byte width of an identity.
pub const ADDRESS_LEN: usize = 20;
/// Byte width of a commitment / field element.
pub const FIELD_LEN: usize = 32;

macro_rules! fixed_bytes_type {
    ($(#[$meta:meta])* $name:ident, $len:expr, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// The all-zero value.
            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Copy out the raw bytes.
            pub fn to_bytes(self) -> [u8; $len] {
                self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Parse from hex, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, CommonError> {
                let stripped = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(stripped).map_err(|e| CommonError::InvalidHex {
                    label: $label,
                    reason: e.to_string(),
                })?;
                let arr: [u8; $len] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| CommonError::InvalidLength {
                            label: $label,
                            expected: $len,
                            actual: bytes.len(),
                        })?;
                Ok(Self(arr))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CommonError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(de::Error::custom)
            }
        }
    };
}

fixed_bytes_type!(
    /// A participant identity (account address).
    Address,
    ADDRESS_LEN,
    "address"
);

fixed_bytes_type!(
    /// Commitment to stamped content; the registry key of a stamp.
    StampHash,
    FIELD_LEN,
    "stamp hash"
);

fixed_bytes_type!(
    /// A big-endian encoded proof-system field element.
    FieldElement,
    FIELD_LEN,
    "field element"
);

fixed_bytes_type!(
    /// Reference to a deployed proof verifier.
    VerifierRef,
    ADDRESS_LEN,
    "verifier reference"
);

impl Address {
    /// Left-pad the identity into a field element, the way the circuit
    /// receives the submitter as a public signal.
    pub fn to_field(&self) -> FieldElement {
        let mut out = [0u8; FIELD_LEN];
        out[FIELD_LEN - ADDRESS_LEN..].copy_from_slice(&self.0);
        FieldElement::new(out)
    }
}

impl StampHash {
    /// The commitment viewed as a field element.
    pub fn to_field(&self) -> FieldElement {
        FieldElement::new(self.0)
    }
}

/// Groth16-shaped proof that the submitter knows the preimage of a stamp hash.
///
/// The registry never looks inside; it only hands the proof to the configured
/// verifier together with [`PublicInputs`].
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StampProof {
    /// G1 point `A`.
    pub a: [FieldElement; 2],
    /// G2 point `B`.
    pub b: [[FieldElement; 2]; 2],
    /// G1 point `C`.
    pub c: [FieldElement; 2],
}

impl StampProof {
    /// All eight coordinates in `a, b, c` order.
    pub fn components(&self) -> [&FieldElement; 8] {
        [
            &self.a[0],
            &self.a[1],
            &self.b[0][0],
            &self.b[0][1],
            &self.b[1][0],
            &self.b[1][1],
            &self.c[0],
            &self.c[1],
        ]
    }

    /// Parse a proof from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, CommonError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the proof as JSON.
    pub fn to_json(&self) -> Result<String, CommonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Public inputs of the knowledge-of-preimage statement.
///
/// Binding the submitter into the statement is what stops a captured proof
/// from being replayed by a different caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    /// Commitment being claimed.
    pub stamp_hash: StampHash,
    /// Identity submitting the claim.
    pub caller: Address,
}

impl PublicInputs {
    /// Bind a commitment to its submitter.
    pub fn bind(stamp_hash: StampHash, caller: Address) -> Self {
        Self { stamp_hash, caller }
    }

    /// Public signals in circuit order: `[hash, caller]`.
    pub fn instances(&self) -> [FieldElement; 2] {
        [self.stamp_hash.to_field(), self.caller.to_field()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_parsing() {
        let addr: Address = "0x00000000000000000000000000000000000000aa"
            .parse()
            .expect("valid address");
        assert_eq!(addr.as_bytes()[19], 0xaa);
        assert_eq!(addr.to_string(), "0x00000000000000000000000000000000000000aa");

        let bare = Address::from_hex("00000000000000000000000000000000000000aa")
            .expect("prefix is optional");
        assert_eq!(addr, bare);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = StampHash::from_hex("0xabcd").unwrap_err();
        assert!(matches!(
            err,
            CommonError::InvalidLength {
                label: "stamp hash",
                expected: 32,
                actual: 2
            }
        ));
        assert!(matches!(
            Address::from_hex("0xzz").unwrap_err(),
            CommonError::InvalidHex { .. }
        ));
    }

    #[test]
    fn test_hash_keys_serialize_as_strings() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(StampHash::new([7u8; 32]), 1u8);
        let json = serde_json::to_string(&map).expect("serialize");
        assert!(json.starts_with("{\"0x0707"));
        let back: std::collections::BTreeMap<StampHash, u8> =
            serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, map);
    }

    #[test]
    fn test_public_inputs_left_pad_caller() {
        let caller = Address::new([0x11; 20]);
        let inputs = PublicInputs::bind(StampHash::new([0x22; 32]), caller);
        let [hash, sender] = inputs.instances();
        assert_eq!(hash.as_bytes(), &[0x22; 32]);
        assert_eq!(&sender.as_bytes()[..12], &[0u8; 12]);
        assert_eq!(&sender.as_bytes()[12..], &[0x11; 20]);
    }

    #[test]
    fn test_proof_components_order() {
        let mut proof = StampProof::default();
        proof.a[0] = FieldElement::new([1; 32]);
        proof.c[1] = FieldElement::new([8; 32]);
        let components = proof.components();
        assert_eq!(components[0].as_bytes(), &[1; 32]);
        assert_eq!(components[7].as_bytes(), &[8; 32]);
        assert!(components[3].is_zero());
    }
}
