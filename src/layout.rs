//! User-edited 2D station layout, stored as a local JSON file of
//! `station name → {x, y}`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::network::StationGraph;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationLayout {
    positions: BTreeMap<String, LayoutPoint>,
}

impl StationLayout {
    /// Reads a layout file. A file that does not exist yet is an empty layout.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No layout file, starting empty");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing layout file {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing layout file {}", path.display()))
    }

    pub fn set(&mut self, station: &str, x: f64, y: f64) {
        self.positions.insert(station.to_string(), LayoutPoint { x, y });
    }

    pub fn get(&self, station: &str) -> Option<LayoutPoint> {
        self.positions.get(station).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drops entries for stations the graph does not know and returns how
    /// many were removed.
    pub fn retain_known(&mut self, graph: &StationGraph) -> usize {
        let before = self.positions.len();
        self.positions.retain(|name, _| {
            let known = graph.contains(name);
            if !known {
                warn!(station = %name, "Dropping layout entry for unknown station");
            }
            known
        });
        before - self.positions.len()
    }

    /// 2D position of every graph station: the layout override when there is
    /// one, the graph's own `x`/`y` otherwise. Graph order.
    pub fn resolve<'g>(&self, graph: &'g StationGraph) -> Vec<(&'g str, LayoutPoint)> {
        graph
            .stations()
            .iter()
            .map(|station| {
                let point = self.get(&station.name).unwrap_or(LayoutPoint {
                    x: station.position.x,
                    y: station.position.y,
                });
                (station.name.as_str(), point)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let layout = StationLayout::load(temp_path("rail_delay_map_no_layout.json")).unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("rail_delay_map_test_layout.json");
        let _ = fs::remove_file(&path);

        let mut layout = StationLayout::default();
        layout.set("Oslo S", 400.0, 300.0);
        layout.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"Oslo S\""));

        let loaded = StationLayout::load(&path).unwrap();
        assert_eq!(loaded, layout);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_resolve_prefers_override() {
        let graph = StationGraph::builtin();
        let mut layout = StationLayout::default();
        layout.set("Bergen", 1.0, 2.0);

        let resolved = layout.resolve(&graph);
        assert_eq!(resolved.len(), graph.len());

        let bergen = resolved.iter().find(|(n, _)| *n == "Bergen").unwrap().1;
        assert_eq!(bergen, LayoutPoint { x: 1.0, y: 2.0 });

        let voss = resolved.iter().find(|(n, _)| *n == "Voss").unwrap().1;
        assert_eq!(voss, LayoutPoint { x: -260.0, y: 80.0 });
    }

    #[test]
    fn test_retain_known() {
        let graph = StationGraph::builtin();
        let mut layout = StationLayout::default();
        layout.set("Hamar", 0.0, 0.0);
        layout.set("Narnia", 0.0, 0.0);

        assert_eq!(layout.retain_known(&graph), 1);
        assert_eq!(layout.len(), 1);
    }
}
