use std::collections::HashSet;
use std::fmt;

/// Platform identifier of a peripheral. On Linux and Windows this is the
/// hardware address, on macOS a UUID assigned by CoreBluetooth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeripheralId(String);

impl PeripheralId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeripheralId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A peripheral reported by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peripheral {
    pub id: PeripheralId,
    /// The advertised local name, if any
    pub name: Option<String>,
    /// Signal strength of the first advertisement seen, in dBm
    pub rssi: Option<i16>,
}

impl Peripheral {
    const UNKNOWN_NAME: &'static str = "Unknown Device";

    pub fn new(id: impl Into<PeripheralId>) -> Self {
        Self { id: id.into(), name: None, rssi: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// The advertised name, or a placeholder for anonymous peripherals
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(Self::UNKNOWN_NAME)
    }
}

/// Peripherals found during one scan, in discovery order, at most one per id.
#[derive(Debug, Default, Clone)]
pub struct PeripheralList {
    items: Vec<Peripheral>,
    seen: HashSet<PeripheralId>,
}

impl PeripheralList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peripheral unless one with the same id is already present.
    ///
    /// Returns `true` if the peripheral was new. A repeated report never
    /// replaces the first record.
    pub fn insert(&mut self, peripheral: Peripheral) -> bool {
        if !self.seen.insert(peripheral.id.clone()) {
            return false;
        }
        self.items.push(peripheral);
        true
    }

    pub fn get(&self, id: &PeripheralId) -> Option<&Peripheral> {
        if !self.seen.contains(id) {
            return None;
        }
        self.items.iter().find(|p| &p.id == id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Peripheral> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PeripheralId> {
        self.items.iter().map(|p| &p.id)
    }
}

impl<'a> IntoIterator for &'a PeripheralList {
    type Item = &'a Peripheral;
    type IntoIter = std::slice::Iter<'a, Peripheral>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[test]
fn test_insert_keeps_discovery_order_without_duplicates() {
    let mut list = PeripheralList::new();
    assert!(list.insert(Peripheral::new("A")));
    assert!(list.insert(Peripheral::new("B")));
    assert!(!list.insert(Peripheral::new("A")));

    let ids: Vec<&str> = list.ids().map(PeripheralId::as_str).collect();
    assert_eq!(ids, ["A", "B"]);
}

#[test]
fn test_repeated_report_does_not_replace_first_record() {
    let mut list = PeripheralList::new();
    list.insert(Peripheral::new("A").with_name("BT_HC6172"));
    list.insert(Peripheral::new("A").with_name("renamed"));

    let a = list.get(&"A".into()).unwrap();
    assert_eq!(a.name.as_deref(), Some("BT_HC6172"));
    assert_eq!(list.len(), 1);
}

#[test]
fn test_clear_allows_rediscovery() {
    let mut list = PeripheralList::new();
    list.insert(Peripheral::new("A"));
    list.clear();
    assert!(list.is_empty());
    assert!(list.get(&"A".into()).is_none());
    assert!(list.insert(Peripheral::new("A")));
}

#[test]
fn test_display_name_falls_back() {
    assert_eq!(Peripheral::new("A").display_name(), "Unknown Device");
    assert_eq!(Peripheral::new("A").with_name("BMS").display_name(), "BMS");
}
