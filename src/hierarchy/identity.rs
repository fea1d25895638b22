//! Identifier assignment for nested nodes.
//!
//! A nested node without an identifier is a node the store has never seen.
//! Assignment is idempotent: nodes that already carry an identifier are
//! returned untouched.

use std::collections::HashSet;

use uuid::Uuid;

use super::HierarchyError;
use crate::models::{Location, Step, Zone};

/// Nested node that receives a store identifier on first write
pub trait Identified {
    fn identifier(&self) -> Option<Uuid>;
    fn set_identifier(&mut self, id: Uuid);

    fn is_new(&self) -> bool {
        self.identifier().is_none()
    }
}

impl Identified for Location {
    fn identifier(&self) -> Option<Uuid> {
        self.id
    }

    fn set_identifier(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

impl Identified for Zone {
    fn identifier(&self) -> Option<Uuid> {
        self.id
    }

    fn set_identifier(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

impl Identified for Step {
    fn identifier(&self) -> Option<Uuid> {
        self.id
    }

    fn set_identifier(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

/// Attach a fresh identifier if the node has none.
///
/// Returns true when an identifier was assigned.
pub fn ensure_identity<T: Identified>(node: &mut T) -> bool {
    if node.is_new() {
        node.set_identifier(Uuid::new_v4());
        true
    } else {
        false
    }
}

/// Walk every location, zone and step and assign missing identifiers.
///
/// Returns how many identifiers were assigned.
pub fn assign_identities(locations: &mut [Location]) -> usize {
    let mut assigned = 0;
    for location in locations.iter_mut() {
        assigned += usize::from(ensure_identity(location));
        for zone in location.zones.iter_mut() {
            assigned += usize::from(ensure_identity(zone));
            for step in zone.steps.iter_mut() {
                assigned += usize::from(ensure_identity(step));
            }
        }
    }
    assigned
}

/// Reject a tree in which two nodes carry the same identifier.
///
/// Identifiers are unique across the whole client, whatever the level.
pub fn check_unique_identities(locations: &[Location]) -> Result<(), HierarchyError> {
    let mut seen = HashSet::new();
    let mut claim = |kind: &str, id: Option<Uuid>| match id {
        Some(id) if !seen.insert(id) => Err(HierarchyError::invalid_document(format!(
            "duplicate {} identifier {}",
            kind, id
        ))),
        _ => Ok(()),
    };

    for location in locations {
        claim("location", location.id)?;
        for zone in &location.zones {
            claim("zone", zone.id)?;
            for step in &zone.steps {
                claim("step", step.id)?;
            }
        }
    }
    Ok(())
}
