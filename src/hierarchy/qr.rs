//! QR artifacts for zones.
//!
//! The artifact is a self-contained `data:` URI holding an SVG rendering of
//! the zone identifier. It is derived from the identifier alone, so it is
//! generated once and then carried along in the document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;
use qrcode::render::svg;
use qrcode::QrCode;
use uuid::Uuid;

use super::HierarchyError;
use crate::models::Location;

pub const DEFAULT_MIN_DIMENSION: u32 = 200;

const DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

#[derive(Debug, Clone)]
pub struct QrGenerator {
    min_dimension: u32,
}

impl Default for QrGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DIMENSION)
    }
}

impl QrGenerator {
    pub fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }

    /// Artifact for a zone identifier
    pub fn artifact_for(&self, zone_id: Uuid) -> Result<String, HierarchyError> {
        self.encode(&zone_id.to_string())
    }

    pub fn encode(&self, payload: &str) -> Result<String, HierarchyError> {
        let code = QrCode::new(payload.as_bytes())
            .map_err(|e| HierarchyError::generation(format!("cannot encode '{}': {}", truncate(payload), e)))?;

        let image = code
            .render::<svg::Color>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .build();

        Ok(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(image)))
    }

    /// Generate artifacts for every zone that lacks one.
    ///
    /// Zones must already carry identifiers. Rendering runs on the blocking
    /// pool, one task per zone, and all tasks are joined before any zone is
    /// modified. Returns the number of artifacts generated.
    pub async fn fill_missing_artifacts(&self, locations: &mut [Location]) -> Result<usize, HierarchyError> {
        let mut pending = Vec::new();
        for (li, location) in locations.iter().enumerate() {
            for (zi, zone) in location.zones.iter().enumerate() {
                if zone.has_artifact() {
                    continue;
                }
                let zone_id = zone.id.ok_or_else(|| {
                    HierarchyError::invalid_document(format!("zone '{}' has no identifier", zone.name))
                })?;
                pending.push((li, zi, zone_id));
            }
        }

        if pending.is_empty() {
            return Ok(0);
        }

        let tasks = pending.iter().map(|&(_, _, zone_id)| {
            let generator = self.clone();
            tokio::task::spawn_blocking(move || generator.artifact_for(zone_id))
        });
        let results = join_all(tasks).await;

        let generated = pending.len();
        for ((li, zi, _), result) in pending.into_iter().zip(results) {
            let artifact = result.map_err(|e| HierarchyError::generation(format!("render task failed: {}", e)))??;
            locations[li].zones[zi].qr_code = Some(artifact);
        }

        tracing::debug!("Generated {} zone QR artifacts", generated);
        Ok(generated)
    }
}

fn truncate(payload: &str) -> &str {
    match payload.char_indices().nth(32) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}
