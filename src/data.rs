use crate::config::InputConfig;
use crate::types::{Observation, Region};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::GeoJson;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};

pub fn load_observations(config: &InputConfig) -> Result<Vec<Observation>> {
    let file = File::open(&config.observations_csv).with_context(|| {
        format!(
            "Failed to open observations CSV: {:?}",
            config.observations_csv
        )
    })?;
    let observations = read_observations(file, config)?;
    tracing::info!(
        "Loaded {} observations from {:?}",
        observations.len(),
        config.observations_csv
    );
    Ok(observations)
}

fn read_observations<R: Read>(reader: R, config: &InputConfig) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();

    let location_idx = headers
        .iter()
        .position(|h| h == config.location_column)
        .ok_or_else(|| anyhow!("Location column '{}' not found in CSV", config.location_column))?;
    let occurrences_idx = headers
        .iter()
        .position(|h| h == config.occurrences_column)
        .ok_or_else(|| {
            anyhow!(
                "Occurrences column '{}' not found in CSV",
                config.occurrences_column
            )
        })?;

    // Rows repeating a location key sum into one observation, matching the
    // per-coordinate term counts the markers are built from.
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let location = record.get(location_idx).unwrap_or("").trim().to_string();
        if location.is_empty() {
            continue;
        }

        let raw = record.get(occurrences_idx).unwrap_or("").trim();
        let occurrences: u64 = raw
            .parse()
            .with_context(|| format!("Bad occurrence count {:?} in CSV row {}", raw, row + 2))?;

        if !counts.contains_key(&location) {
            order.push(location.clone());
        }
        *counts.entry(location).or_insert(0) += occurrences;
    }

    Ok(order
        .into_iter()
        .map(|location| {
            let occurrences = counts[&location];
            Observation {
                location,
                occurrences,
            }
        })
        .collect())
}

pub fn load_overlay(config: &InputConfig) -> Result<Option<(Vec<u8>, Vec<Region>)>> {
    let Some(path) = &config.overlay_geojson else {
        return Ok(None);
    };

    let mut file =
        File::open(path).with_context(|| format!("Failed to open overlay GeoJSON: {:?}", path))?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)
        .with_context(|| format!("Failed to read overlay GeoJSON: {:?}", path))?;

    let regions = parse_regions(&raw[..], &config.overlay_id_property)
        .with_context(|| format!("Failed to parse overlay GeoJSON: {:?}", path))?;
    tracing::info!("Loaded {} overlay regions from {:?}", regions.len(), path);

    Ok(Some((raw, regions)))
}

fn parse_regions<R: Read>(reader: R, id_property: &str) -> Result<Vec<Region>> {
    let geojson = GeoJson::from_reader(BufReader::new(reader))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Overlay must be a FeatureCollection")),
    };

    let mut regions = Vec::new();

    for feature in collection.features {
        let id_val = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(id_property));

        let id = match id_val {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => continue, // Skip if no usable id
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let converted: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry for '{}': {:?}", id, e))?;

                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // Skip points/lines
                }
            }
            None => continue,
        };

        regions.push(Region { id, geometry });
    }

    Ok(regions)
}
