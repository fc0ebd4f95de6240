/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// A decoded SNMP value, reduced to the native kinds the engine works
/// with. Counters, gauges and timeticks map onto the unsigned kinds.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SnmpValue {
    Str(String),
    Int(i64),
    Uint32(u32),
    Uint64(u64),
    IpAddr(Ipv4Addr),
}

impl SnmpValue {
    /// Decode a wire value; `None` for null-ish values (null,
    /// noSuchObject, noSuchInstance, endOfMibView).
    pub(crate) fn decode(value: &snmp2::Value) -> Option<Self> {
        use snmp2::Value;
        match value {
            Value::Integer(n) => Some(SnmpValue::Int(*n)),
            Value::OctetString(bytes) => Some(SnmpValue::Str(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
            Value::ObjectIdentifier(oid) => {
                Some(SnmpValue::Str(oid.to_string()))
            }
            Value::IpAddress(octets) => Some(SnmpValue::IpAddr(
                Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]),
            )),
            Value::Counter32(n)
            | Value::Unsigned32(n)
            | Value::Timeticks(n) => Some(SnmpValue::Uint32(*n)),
            Value::Counter64(n) => Some(SnmpValue::Uint64(*n)),
            _ => None,
        }
    }

    /// Encode for a SET request. Only the kinds the engine writes are
    /// supported; strings are sent as octet strings.
    pub(crate) fn encode(&self) -> snmp2::Value<'_> {
        use snmp2::Value;
        match self {
            SnmpValue::Str(s) => Value::OctetString(s.as_bytes()),
            SnmpValue::Int(n) => Value::Integer(*n),
            SnmpValue::Uint32(n) => Value::Unsigned32(*n),
            SnmpValue::Uint64(n) => Value::Counter64(*n),
            SnmpValue::IpAddr(addr) => Value::Integer(i64::from(
                u32::from_be_bytes(addr.octets()),
            )),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SnmpValue::Int(n) => Some(*n),
            SnmpValue::Uint32(n) => Some(i64::from(*n)),
            SnmpValue::Uint64(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SnmpValue::Int(n) => u64::try_from(*n).ok(),
            SnmpValue::Uint32(n) => Some(u64::from(*n)),
            SnmpValue::Uint64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SnmpValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ipaddr(&self) -> Option<Ipv4Addr> {
        match self {
            SnmpValue::IpAddr(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpValue::Str(s) => write!(f, "{}", s),
            SnmpValue::Int(n) => write!(f, "{}", n),
            SnmpValue::Uint32(n) => write!(f, "{}", n),
            SnmpValue::Uint64(n) => write!(f, "{}", n),
            SnmpValue::IpAddr(addr) => write!(f, "{}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_native_kinds() {
        assert_eq!(
            SnmpValue::decode(&snmp2::Value::Integer(2)),
            Some(SnmpValue::Int(2))
        );
        assert_eq!(
            SnmpValue::decode(&snmp2::Value::OctetString(b"v3.14")),
            Some(SnmpValue::Str("v3.14".into()))
        );
        assert_eq!(
            SnmpValue::decode(&snmp2::Value::Counter64(1 << 40)),
            Some(SnmpValue::Uint64(1 << 40))
        );
        assert_eq!(
            SnmpValue::decode(&snmp2::Value::IpAddress([10, 0, 0, 2])),
            Some(SnmpValue::IpAddr(Ipv4Addr::new(10, 0, 0, 2)))
        );
        assert_eq!(SnmpValue::decode(&snmp2::Value::Null), None);
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(SnmpValue::Uint32(100_000_000).as_u64(), Some(100_000_000));
        assert_eq!(SnmpValue::Int(-1).as_u64(), None);
        assert_eq!(SnmpValue::Str("x".into()).as_i64(), None);
    }
}
