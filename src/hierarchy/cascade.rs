//! Locating and pruning nodes inside a client's nested location tree.

use uuid::Uuid;

use super::HierarchyError;
use crate::models::{Location, Step, Zone};

/// Address of one node in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePath {
    Client(Uuid),
    Location {
        client: Uuid,
        location: Uuid,
    },
    Zone {
        client: Uuid,
        location: Uuid,
        zone: Uuid,
    },
    Step {
        client: Uuid,
        location: Uuid,
        zone: Uuid,
        step: Uuid,
    },
}

const SEGMENT_KINDS: [&str; 4] = ["client", "location", "zone", "step"];

impl NodePath {
    /// Parse `[client, location?, zone?, step?]`.
    ///
    /// Every segment is checked before the path is returned, so a caller
    /// never touches the store with a malformed path.
    pub fn parse(segments: &[&str]) -> Result<Self, HierarchyError> {
        if segments.is_empty() || segments.len() > SEGMENT_KINDS.len() {
            return Err(HierarchyError::invalid_identifier("path", segments.join("/")));
        }

        let ids = segments
            .iter()
            .zip(SEGMENT_KINDS)
            .map(|(raw, kind)| parse_identifier(kind, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match ids.as_slice() {
            [client] => NodePath::Client(*client),
            [client, location] => NodePath::Location {
                client: *client,
                location: *location,
            },
            [client, location, zone] => NodePath::Zone {
                client: *client,
                location: *location,
                zone: *zone,
            },
            [client, location, zone, step] => NodePath::Step {
                client: *client,
                location: *location,
                zone: *zone,
                step: *step,
            },
            _ => unreachable!("segment count checked above"),
        })
    }

    pub fn client_id(&self) -> Uuid {
        match *self {
            NodePath::Client(client)
            | NodePath::Location { client, .. }
            | NodePath::Zone { client, .. }
            | NodePath::Step { client, .. } => client,
        }
    }

    /// Human name of the addressed level
    pub fn kind(&self) -> &'static str {
        match self {
            NodePath::Client(_) => "Client",
            NodePath::Location { .. } => "Location",
            NodePath::Zone { .. } => "Zone",
            NodePath::Step { .. } => "Step",
        }
    }
}

pub fn parse_identifier(kind: &'static str, raw: &str) -> Result<Uuid, HierarchyError> {
    Uuid::parse_str(raw.trim()).map_err(|_| HierarchyError::invalid_identifier(kind, raw))
}

/// Node taken out of the tree, with everything it owned
#[derive(Debug, Clone, PartialEq)]
pub enum Removed {
    Location(Location),
    Zone(Zone),
    Step(Step),
}

impl Removed {
    /// Number of nodes removed, counting the node itself
    pub fn node_count(&self) -> usize {
        match self {
            Removed::Location(location) => {
                1 + location.zones.iter().map(|z| 1 + z.steps.len()).sum::<usize>()
            }
            Removed::Zone(zone) => 1 + zone.steps.len(),
            Removed::Step(_) => 1,
        }
    }
}

/// Remove the node addressed by `path` from `locations`.
///
/// Siblings keep their relative order. On error `locations` is unchanged.
/// Client paths are not handled here; a client is a whole document.
pub fn remove_node(locations: &mut Vec<Location>, path: &NodePath) -> Result<Removed, HierarchyError> {
    match *path {
        NodePath::Client(_) => Err(HierarchyError::invalid_document(
            "client documents are removed by the store, not pruned",
        )),
        NodePath::Location { location, .. } => {
            let li = location_index(locations, location)?;
            Ok(Removed::Location(locations.remove(li)))
        }
        NodePath::Zone { location, zone, .. } => {
            let li = location_index(locations, location)?;
            let zones = &mut locations[li].zones;
            let zi = zone_index(zones, zone)?;
            Ok(Removed::Zone(zones.remove(zi)))
        }
        NodePath::Step {
            location, zone, step, ..
        } => {
            let li = location_index(locations, location)?;
            let zones = &mut locations[li].zones;
            let zi = zone_index(zones, zone)?;
            let steps = &mut zones[zi].steps;
            let si = steps
                .iter()
                .position(|s| s.id == Some(step))
                .ok_or_else(|| HierarchyError::not_found("Step not found"))?;
            Ok(Removed::Step(steps.remove(si)))
        }
    }
}

fn location_index(locations: &[Location], id: Uuid) -> Result<usize, HierarchyError> {
    locations
        .iter()
        .position(|l| l.id == Some(id))
        .ok_or_else(|| HierarchyError::not_found("Location not found"))
}

fn zone_index(zones: &[Zone], id: Uuid) -> Result<usize, HierarchyError> {
    zones
        .iter()
        .position(|z| z.id == Some(id))
        .ok_or_else(|| HierarchyError::not_found("Zone not found"))
}
