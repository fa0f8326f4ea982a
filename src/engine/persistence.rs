//! Snapshot persistence.
//!
//! A snapshot is a JSON object mapping each key to its item. Restoring never
//! replaces an entry that is still live.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufReader, BufWriter, Read, Write};
use std::time::SystemTime;

use super::{Item, Value};
use crate::error::{CacheError, Result};

/// Write all unexpired entries to `writer`.
pub(crate) fn save(items: &DashMap<String, Item>, writer: &mut dyn Write) -> Result<()> {
    let now = SystemTime::now();
    let mut snapshot = BTreeMap::new();
    for entry in items.iter() {
        if entry.is_expired_at(now) {
            continue;
        }
        if let Value::Opaque(opaque) = &entry.value {
            return Err(CacheError::Unencodable {
                key: entry.key().clone(),
                type_name: opaque.type_name(),
            });
        }
        snapshot.insert(entry.key().clone(), entry.value().clone());
    }

    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, &snapshot)?;
    writer.flush()?;
    tracing::debug!(entries = snapshot.len(), "saved cache snapshot");
    Ok(())
}

/// Read a snapshot from `reader`, inserting keys that are absent or expired.
pub(crate) fn load(items: &DashMap<String, Item>, reader: &mut dyn Read) -> Result<()> {
    let snapshot: HashMap<String, Item> = serde_json::from_reader(BufReader::new(reader))?;
    let now = SystemTime::now();
    let mut restored = 0_usize;
    for (key, item) in snapshot {
        match items.entry(key) {
            Entry::Occupied(entry) if !entry.get().is_expired_at(now) => {}
            Entry::Occupied(mut entry) => {
                entry.insert(item);
                restored += 1;
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
                restored += 1;
            }
        }
    }
    tracing::debug!(restored, "loaded cache snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn live(value: impl Into<Value>) -> Item {
        Item { value: value.into(), expiration: None }
    }

    #[test]
    fn test_round_trip_keeps_live_entries() {
        let source = DashMap::new();
        source.insert("a".to_string(), live("a"));
        source.insert("b".to_string(), live(7_u16));

        let mut buf = Vec::new();
        save(&source, &mut buf).unwrap();

        let target = DashMap::new();
        target.insert("a".to_string(), live("aa"));
        load(&target, &mut buf.as_slice()).unwrap();

        assert_eq!(target.get("a").unwrap().value, Value::from("aa"));
        assert_eq!(target.get("b").unwrap().value, Value::U16(7));
    }

    #[test]
    fn test_load_replaces_expired_entries() {
        let source = DashMap::new();
        source.insert("a".to_string(), live(1_i64));
        let mut buf = Vec::new();
        save(&source, &mut buf).unwrap();

        let target = DashMap::new();
        target.insert(
            "a".to_string(),
            Item {
                value: Value::I64(0),
                expiration: Some(SystemTime::now() - Duration::from_secs(1)),
            },
        );
        load(&target, &mut buf.as_slice()).unwrap();
        assert_eq!(target.get("a").unwrap().value, Value::I64(1));
    }

    #[test]
    fn test_opaque_values_are_rejected() {
        let source = DashMap::new();
        source.insert("chan".to_string(), live(Value::opaque(std::sync::mpsc::channel::<bool>().0)));
        let mut buf = Vec::new();
        let err = save(&source, &mut buf).unwrap_err();
        assert!(matches!(err, CacheError::Unencodable { ref key, .. } if key == "chan"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_malformed_snapshot() {
        let target: DashMap<String, Item> = DashMap::new();
        let err = load(&target, &mut "not json".as_bytes()).unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
    }
}
