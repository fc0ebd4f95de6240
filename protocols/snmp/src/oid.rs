/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use snmp2::Oid;

use crate::error::{Error, Result};

/// Parse a dotted OID string (with or without a leading dot) into an
/// owned OID.
pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let arcs = s
        .trim()
        .trim_start_matches('.')
        .split('.')
        .map(|p| {
            p.parse::<u64>().map_err(|_| Error::InvalidOid(s.to_string()))
        })
        .collect::<Result<Vec<u64>>>()?;
    if arcs.is_empty() {
        return Err(Error::InvalidOid(s.to_string()));
    }
    Oid::from(&arcs).map_err(|_| Error::InvalidOid(s.to_string()))
}

/// Parse a table column OID with an instance index appended, e.g.
/// `table_oid(IF_OPER_STATUS, 5)` for port 5.
pub fn table_oid(column: &str, index: u32) -> Result<Oid<'static>> {
    parse_oid(&format!("{}.{}", column, index))
}

fn arcs(oid: &Oid) -> Option<Vec<u64>> {
    oid.iter().map(|it| it.collect())
}

/// True when `oid` lies inside the subtree rooted at `root`.
pub fn oid_starts_with(oid: &Oid, root: &Oid) -> bool {
    match (arcs(oid), arcs(root)) {
        (Some(oid), Some(root)) => oid.starts_with(&root),
        _ => false,
    }
}

/// The arcs of `oid` below `root`; `None` when `oid` is outside the
/// subtree. For a single-index table column this is the instance
/// index alone.
pub fn oid_suffix(oid: &Oid, root: &Oid) -> Option<Vec<u64>> {
    let oid = arcs(oid)?;
    let root = arcs(root)?;
    oid.strip_prefix(root.as_slice()).map(<[u64]>::to_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted() {
        let oid = parse_oid(".1.3.6.1.2.1.1.3.0").unwrap();
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.3.0");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_oid("").is_err());
        assert!(parse_oid("1.3.x.4").is_err());
    }

    #[test]
    fn subtree_membership() {
        let root = parse_oid("1.3.6.1.2.1.2.2.1.8").unwrap();
        let inside = parse_oid("1.3.6.1.2.1.2.2.1.8.5").unwrap();
        let outside = parse_oid("1.3.6.1.2.1.2.2.1.7.5").unwrap();
        assert!(oid_starts_with(&inside, &root));
        assert!(!oid_starts_with(&outside, &root));
        assert_eq!(oid_suffix(&inside, &root), Some(vec![5]));
        assert_eq!(oid_suffix(&outside, &root), None);
    }

    #[test]
    fn column_instance() {
        let oid = table_oid("1.3.6.1.4.1.42019.3.2.1.3.1.1.2", 3).unwrap();
        assert_eq!(oid.to_string(), "1.3.6.1.4.1.42019.3.2.1.3.1.1.2.3");
    }
}
