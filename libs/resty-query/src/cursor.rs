use serde::{Deserialize, Serialize};

use crate::collection::Record;
use crate::error::CursorError;
use crate::sort::SortOrder;
use crate::value::{FieldKind, Value};

const CURSOR_VERSION: u8 = 1;

/// Opaque keyset position: the sort-key tuple of one record, tie-break last.
///
/// Wire form is base64url (no padding) of `{"v":1,"k":[...]}` with each key
/// kind-tagged, e.g. `{"t":"int","v":3}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub keys: Vec<Value>,
}

#[derive(Serialize, Deserialize)]
struct CursorWire {
    v: u8,
    k: Vec<Value>,
}

impl Cursor {
    pub fn new(keys: Vec<Value>) -> Self {
        Self { keys }
    }

    pub fn for_record(order: &SortOrder, record: &dyn Record) -> Self {
        Self {
            keys: order.values_of(record),
        }
    }

    pub fn encode(&self) -> String {
        let wire = CursorWire {
            v: CURSOR_VERSION,
            k: self.keys.clone(),
        };
        // Vec<Value> always serializes
        let json = serde_json::to_vec(&wire).unwrap_or_default();
        base64_url::encode(&json)
    }

    /// Decode a token against the kinds of the current sort keys.
    pub fn decode(token: &str, kinds: &[FieldKind]) -> Result<Self, CursorError> {
        let bytes = base64_url::decode(token.trim()).map_err(|_| CursorError::InvalidBase64)?;

        let raw: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| CursorError::InvalidJson)?;
        if raw.get("v").and_then(serde_json::Value::as_u64) != Some(u64::from(CURSOR_VERSION)) {
            return Err(CursorError::InvalidVersion);
        }
        let wire: CursorWire = serde_json::from_value(raw).map_err(|_| CursorError::InvalidJson)?;

        if wire.k.len() != kinds.len() {
            return Err(CursorError::KeyCountMismatch {
                expected: kinds.len(),
                got: wire.k.len(),
            });
        }
        for (index, (value, kind)) in wire.k.iter().zip(kinds).enumerate() {
            if !kind.accepts(value) {
                return Err(CursorError::KindMismatch {
                    index,
                    expected: *kind,
                });
            }
        }
        Ok(Self { keys: wire.k })
    }
}

pub mod base64_url {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    pub fn encode(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(s)
    }
}
