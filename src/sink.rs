//! Vector sink: accumulates ground polygons and serializes them to the
//! shapefile triple (.shp/.shx/.dbf) with a single character field `id`.

use std::path::{Path, PathBuf};

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Shape};

use crate::error::PipelineError;
use crate::models::GroundPolygon;

/// The three co-located files making up one serialized vector dataset.
#[derive(Debug, Clone)]
pub struct ShapefilePaths {
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
}

impl ShapefilePaths {
    /// Derive the triple from a base path (extension ignored if present).
    pub fn with_base(base: &Path) -> Self {
        Self {
            shp: base.with_extension("shp"),
            shx: base.with_extension("shx"),
            dbf: base.with_extension("dbf"),
        }
    }

    pub fn parts(&self) -> [&Path; 3] {
        [&self.shp, &self.shx, &self.dbf]
    }
}

/// Accumulates (polygon, id) records in insertion order.
///
/// Ids are `weed_<index>` starting at 0 and never reassigned, so output order
/// always equals insertion order.
#[derive(Default)]
pub struct ShapefileSink {
    records: Vec<(String, GroundPolygon)>,
}

impl ShapefileSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store a polygon and return its assigned record id.
    pub fn add_polygon(&mut self, polygon: GroundPolygon) -> String {
        let id = format!("weed_{}", self.records.len());
        self.records.push((id.clone(), polygon));
        id
    }

    /// Write all accumulated records to `<base>.shp/.shx/.dbf`.
    ///
    /// All-or-nothing: on failure the caller must discard any partial files
    /// (the pipeline keeps the triple in a per-run temp dir for exactly this
    /// reason).
    pub fn serialize(&self, base: &Path) -> Result<ShapefilePaths, PipelineError> {
        let paths = ShapefilePaths::with_base(base);

        let field_name = FieldName::try_from("id")
            .map_err(|e| PipelineError::Serialization(format!("invalid field name: {e}")))?;
        let table = TableWriterBuilder::new().add_character_field(field_name, 50);
        let mut writer = shapefile::Writer::from_path(&paths.shp, table)
            .map_err(|e| PipelineError::Serialization(format!("creating {:?}: {e}", paths.shp)))?;

        for (id, polygon) in &self.records {
            let points: Vec<Point> = polygon
                .ring()
                .iter()
                .map(|&(x, y)| Point::new(x, y))
                .collect();
            let shape = Polygon::new(PolygonRing::Outer(points));

            let mut record = Record::default();
            record.insert("id".to_owned(), FieldValue::Character(Some(id.clone())));

            writer
                .write_shape_and_record(&shape, &record)
                .map_err(|e| PipelineError::Serialization(format!("writing record {id}: {e}")))?;
        }

        Ok(paths)
    }
}

/// Read a serialized dataset back as (id, outer ring) pairs, in file order.
/// Used for cross-checking output; not part of the pipeline itself.
pub fn read_features(shp: &Path) -> Result<Vec<(String, Vec<(f64, f64)>)>, PipelineError> {
    let mut reader = shapefile::Reader::from_path(shp)
        .map_err(|e| PipelineError::Serialization(format!("opening {:?}: {e}", shp)))?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) =
            result.map_err(|e| PipelineError::Serialization(format!("reading feature: {e}")))?;
        let Shape::Polygon(polygon) = shape else {
            return Err(PipelineError::Serialization(format!(
                "unexpected shape type {}",
                shape.shapetype()
            )));
        };
        let ring = polygon
            .rings()
            .first()
            .map(|r| r.points().iter().map(|p| (p.x, p.y)).collect())
            .unwrap_or_default();
        let id = match record.get("id") {
            Some(FieldValue::Character(Some(s))) => s.clone(),
            _ => String::new(),
        };
        features.push((id, ring));
    }
    Ok(features)
}
