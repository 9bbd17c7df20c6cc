//! Canonical station graph: named stations with display coordinates and the
//! lines that run through them.
//!
//! The graph is static reference data. It is built once at startup, either
//! from the built-in Norwegian network or from a JSON file, and shared
//! read-only (usually behind an `Arc`) by the aggregator and the poller.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::reconcile::normalize;

/// Display position of a station. Irrelevant to aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub name: String,
    pub color_hint: String,
    /// Station names in running order. Names are references into the graph,
    /// and a name the graph does not know is skipped on lookup.
    pub stations: Vec<String>,
}

/// On-disk shape of a network file.
#[derive(Debug, Deserialize)]
struct NetworkFile {
    /// Kept in file order (serde_json `preserve_order`).
    stations: Map<String, Value>,
    #[serde(default)]
    lines: Vec<Line>,
}

/// Built-in stations: (name, x, y, z, elevation in metres).
static BUILTIN_STATIONS: &[(&str, f64, f64, f64, f64)] = &[
    ("Oslo S", 0.0, 0.0, 0.0, 4.0),
    ("Nationaltheatret", -1.5, 0.3, 0.1, 10.0),
    ("Skøyen", -3.5, 0.5, 0.1, 12.0),
    ("Lysaker", -6.0, 0.2, 0.1, 8.0),
    ("Sandvika", -12.0, 1.0, 0.1, 6.0),
    ("Asker", -20.0, -3.0, 1.0, 102.0),
    ("Drammen", -36.0, -8.0, 0.0, 3.0),
    ("Strømmen", 10.0, 5.0, 1.1, 108.0),
    ("Lillestrøm", 17.0, 6.0, 1.1, 106.0),
    ("Oslo lufthavn", 35.0, 38.0, 2.0, 200.0),
    ("Dal", 40.0, 48.0, 1.8, 180.0),
    ("Eidsvoll", 50.0, 58.0, 1.3, 128.0),
    ("Hamar", 78.0, 100.0, 1.3, 127.0),
    ("Lillehammer", 70.0, 140.0, 1.8, 183.0),
    ("Dombås", 40.0, 245.0, 6.6, 659.0),
    ("Oppdal", 55.0, 300.0, 5.5, 545.0),
    ("Trondheim S", 40.0, 390.0, 0.0, 5.0),
    ("Kongsvinger", 75.0, 15.0, 1.5, 148.0),
    ("Ski", 8.0, -22.0, 1.3, 130.0),
    ("Moss", -5.0, -55.0, 0.0, 5.0),
    ("Fredrikstad", 10.0, -80.0, 0.0, 5.0),
    ("Sarpsborg", 20.0, -78.0, 0.4, 40.0),
    ("Halden", 30.0, -100.0, 0.0, 5.0),
    ("Holmestrand", -45.0, -40.0, 0.0, 5.0),
    ("Tønsberg", -40.0, -60.0, 0.1, 10.0),
    ("Sandefjord", -50.0, -78.0, 0.1, 10.0),
    ("Larvik", -60.0, -88.0, 0.0, 5.0),
    ("Porsgrunn", -80.0, -85.0, 0.0, 5.0),
    ("Skien", -85.0, -78.0, 0.1, 10.0),
    ("Kongsberg", -70.0, -10.0, 1.6, 160.0),
    ("Hønefoss", -35.0, 35.0, 1.0, 96.0),
    ("Gol", -110.0, 80.0, 2.1, 207.0),
    ("Geilo", -160.0, 80.0, 7.9, 794.0),
    ("Finse", -200.0, 75.0, 12.2, 1222.0),
    ("Voss", -260.0, 80.0, 0.6, 56.0),
    ("Bergen", -300.0, 70.0, 0.0, 4.0),
];

/// Built-in lines: (name, colour hint, stations in running order).
static BUILTIN_LINES: &[(&str, &str, &[&str])] = &[
    (
        "L1",
        "#e60000",
        &[
            "Lillestrøm",
            "Strømmen",
            "Oslo S",
            "Nationaltheatret",
            "Skøyen",
            "Lysaker",
            "Sandvika",
            "Asker",
        ],
    ),
    (
        "R10",
        "#0064a8",
        &[
            "Lillehammer",
            "Hamar",
            "Eidsvoll",
            "Oslo lufthavn",
            "Lillestrøm",
            "Oslo S",
            "Nationaltheatret",
            "Lysaker",
            "Sandvika",
            "Asker",
            "Drammen",
        ],
    ),
    (
        "R11",
        "#00a0e0",
        &[
            "Eidsvoll",
            "Oslo lufthavn",
            "Lillestrøm",
            "Oslo S",
            "Nationaltheatret",
            "Sandvika",
            "Asker",
            "Drammen",
            "Holmestrand",
            "Tønsberg",
            "Sandefjord",
            "Larvik",
            "Porsgrunn",
            "Skien",
        ],
    ),
    (
        "R12",
        "#8a2be2",
        &[
            "Kongsberg",
            "Drammen",
            "Asker",
            "Sandvika",
            "Nationaltheatret",
            "Oslo S",
            "Lillestrøm",
            "Oslo lufthavn",
            "Eidsvoll",
        ],
    ),
    (
        "R13",
        "#ff8c00",
        &[
            "Drammen",
            "Asker",
            "Sandvika",
            "Nationaltheatret",
            "Oslo S",
            "Lillestrøm",
            "Oslo lufthavn",
            "Dal",
        ],
    ),
    ("R14", "#2e8b57", &["Oslo S", "Lillestrøm", "Kongsvinger"]),
    (
        "R20",
        "#c71585",
        &["Oslo S", "Ski", "Moss", "Fredrikstad", "Sarpsborg", "Halden"],
    ),
    (
        "F1",
        "#9b9b9b",
        &[
            "Drammen",
            "Asker",
            "Sandvika",
            "Lysaker",
            "Skøyen",
            "Nationaltheatret",
            "Oslo S",
            "Lillestrøm",
            "Oslo lufthavn",
        ],
    ),
    (
        "Bergensbanen",
        "#006400",
        &[
            "Oslo S", "Drammen", "Hønefoss", "Gol", "Geilo", "Finse", "Voss", "Bergen",
        ],
    ),
    (
        "Dovrebanen",
        "#8b0000",
        &[
            "Oslo S",
            "Lillestrøm",
            "Eidsvoll",
            "Hamar",
            "Lillehammer",
            "Dombås",
            "Oppdal",
            "Trondheim S",
        ],
    ),
];

/// Read-only canonical network.
#[derive(Debug, Clone)]
pub struct StationGraph {
    stations: Vec<Station>,
    /// Normalized name of each station, same index as `stations`.
    normalized: Vec<String>,
    index: HashMap<String, usize>,
    lines: Vec<Line>,
}

impl StationGraph {
    /// Builds a graph from stations and lines.
    ///
    /// Duplicate station names keep the first occurrence. Lines may name
    /// stations that do not exist; those references are logged and later
    /// skipped by [`StationGraph::line_stations`].
    pub fn new(stations: Vec<Station>, lines: Vec<Line>) -> Self {
        let mut kept = Vec::with_capacity(stations.len());
        let mut index = HashMap::with_capacity(stations.len());

        for station in stations {
            if index.contains_key(&station.name) {
                warn!(station = %station.name, "Duplicate station name, keeping first");
                continue;
            }
            index.insert(station.name.clone(), kept.len());
            kept.push(station);
        }

        for line in &lines {
            for name in line.stations.iter().filter(|n| !index.contains_key(*n)) {
                warn!(line = %line.name, station = %name, "Line references unknown station");
            }
        }

        let normalized = kept.iter().map(|s| normalize(&s.name)).collect();

        Self {
            stations: kept,
            normalized,
            index,
            lines,
        }
    }

    /// The built-in Norwegian network (Oslo area plus the main intercity and
    /// long-distance lines).
    pub fn builtin() -> Self {
        let stations = BUILTIN_STATIONS
            .iter()
            .map(|&(name, x, y, z, elevation)| Station {
                name: name.to_string(),
                position: Position { x, y, z, elevation },
            })
            .collect();

        let lines = BUILTIN_LINES
            .iter()
            .map(|&(name, color, stops)| Line {
                name: name.to_string(),
                color_hint: color.to_string(),
                stations: stops.iter().map(|s| s.to_string()).collect(),
            })
            .collect();

        Self::new(stations, lines)
    }

    /// Parses a network from JSON:
    ///
    /// ```json
    /// {
    ///   "stations": { "Oslo S": { "x": 0, "y": 0, "z": 0, "elevation": 4 } },
    ///   "lines": [{ "name": "L1", "colorHint": "#e60000", "stations": ["Oslo S"] }]
    /// }
    /// ```
    ///
    /// Stations keep the order they appear in the file.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: NetworkFile = serde_json::from_str(content)?;
        let stations = file
            .stations
            .into_iter()
            .map(|(name, position)| {
                let position = serde_json::from_value(position)
                    .with_context(|| format!("invalid position for station {name:?}"))?;
                Ok(Station { name, position })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(stations, file.lines))
    }

    /// Loads a network file from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading network file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("parsing network file {}", path.display()))
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn station(&self, name: &str) -> Option<&Station> {
        self.index.get(name).map(|&i| &self.stations[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.name == name)
    }

    /// Stations of a line in running order, skipping unknown references.
    pub fn line_stations<'a>(&'a self, line: &'a Line) -> impl Iterator<Item = &'a Station> + 'a {
        line.stations.iter().filter_map(|name| self.station(name))
    }

    /// Station names paired with their normalized keys, in graph order.
    pub(crate) fn normalized_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stations
            .iter()
            .zip(&self.normalized)
            .map(|(s, n)| (s.name.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
