//! Core data types shared across the virtual machine

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Flat transaction context for one input of a BCH transaction.
///
/// All multi-byte integers are interpreted little-endian when serialized
/// into the signing serialization. The concatenated fields
/// (`transaction_outpoints`, `transaction_sequence_numbers`,
/// `transaction_outputs`) hold the already-serialized wire bytes of every
/// input/output of the spending transaction; this crate never parses the
/// transaction wire format itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContext {
    /// Transaction version
    pub version: u32,
    /// Concatenated 36-byte outpoints of all inputs
    pub transaction_outpoints: ByteString,
    /// Concatenated 4-byte sequence numbers of all inputs
    pub transaction_sequence_numbers: ByteString,
    /// Hash of the transaction that created the output being spent
    pub outpoint_transaction_hash: Hash,
    /// Index of the output being spent within that transaction
    pub outpoint_index: u32,
    /// Value of the output being spent, in satoshis
    pub output_value: u64,
    /// Sequence number of the input under evaluation
    pub sequence_number: u32,
    /// Serialized output at the same index as the input under evaluation,
    /// if the transaction has one
    pub corresponding_output: Option<ByteString>,
    /// Concatenated serialized outputs of the spending transaction
    pub transaction_outputs: ByteString,
    /// Transaction lock time
    pub locktime: u32,
}
