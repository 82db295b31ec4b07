//! Reader for XML patch configuration documents.
//!
//! ```xml
//! <patch rows="3" cols="4">
//!   <sampling resolution="1024" stride="4" include_end="false" point_size="2"/>
//!   <bvh depth="3" split_depth="2" boundary="half-open"/>
//!   <query margin="0"/>
//!   <control_points>
//!     <point x="0" y="0" z="0"/>
//!     <!-- rows * cols points, row-major -->
//!   </control_points>
//! </patch>
//! ```
//!
//! Every element and attribute except the control points is optional and falls
//! back to [`PatchConfig::default`].

use std::path::{Path, PathBuf};

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{ConfigError, PatchConfig};
use crate::geom::{BoundaryRule, Point3};

/// Result type for reading patch documents.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed or does not match the schema.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// The document parsed but describes an invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parses and validates a patch document.
pub fn parse_str(input: &str) -> ParseResult<PatchConfig> {
    let document: PatchDocument = from_str(input)?;
    let config = document.into_config();
    config.validate()?;

    log::debug!(
        "parsed patch document: {}x{} grid, resolution {}, stride {}",
        config.rows,
        config.cols,
        config.sampling.resolution,
        config.sampling.stride
    );
    Ok(config)
}

/// Reads `path` and parses it with [`parse_str`].
pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<PatchConfig> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&xml)
}

#[derive(Debug, Deserialize)]
struct PatchDocument {
    #[serde(rename = "@rows")]
    rows: Option<usize>,
    #[serde(rename = "@cols")]
    cols: Option<usize>,
    #[serde(default)]
    sampling: Option<SamplingElement>,
    #[serde(default)]
    bvh: Option<BvhElement>,
    #[serde(default)]
    query: Option<QueryElement>,
    #[serde(default)]
    control_points: ControlPointsElement,
}

#[derive(Debug, Deserialize)]
struct SamplingElement {
    #[serde(rename = "@resolution")]
    resolution: Option<u32>,
    #[serde(rename = "@stride")]
    stride: Option<u32>,
    #[serde(rename = "@include_end")]
    include_end: Option<bool>,
    #[serde(rename = "@point_size")]
    point_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BvhElement {
    #[serde(rename = "@depth")]
    depth: Option<usize>,
    #[serde(rename = "@split_depth")]
    split_depth: Option<usize>,
    #[serde(rename = "@boundary")]
    boundary: Option<BoundaryRule>,
}

#[derive(Debug, Deserialize)]
struct QueryElement {
    #[serde(rename = "@margin")]
    margin: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ControlPointsElement {
    #[serde(default, rename = "point")]
    points: Vec<PointElement>,
}

#[derive(Debug, Deserialize)]
struct PointElement {
    #[serde(rename = "@x")]
    x: f64,
    #[serde(rename = "@y")]
    y: f64,
    #[serde(rename = "@z", default)]
    z: f64,
}

impl PatchDocument {
    fn into_config(self) -> PatchConfig {
        let mut config = PatchConfig::default();

        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        config.control_points = self
            .control_points
            .points
            .into_iter()
            .map(|p| Point3::new(p.x, p.y, p.z))
            .collect();

        if let Some(sampling) = self.sampling {
            let target = &mut config.sampling;
            target.resolution = sampling.resolution.unwrap_or(target.resolution);
            target.stride = sampling.stride.unwrap_or(target.stride);
            target.include_end = sampling.include_end.unwrap_or(target.include_end);
            target.point_size = sampling.point_size.unwrap_or(target.point_size);
        }

        if let Some(bvh) = self.bvh {
            let target = &mut config.bvh;
            target.depth = bvh.depth.unwrap_or(target.depth);
            target.split_depth = bvh.split_depth.unwrap_or(target.split_depth);
            target.boundary = bvh.boundary.unwrap_or(target.boundary);
        }

        if let Some(query) = self.query {
            config.query.margin = query.margin.unwrap_or(config.query.margin);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::{ParseError, parse_str};
    use crate::config::ConfigError;
    use crate::geom::{BoundaryRule, Point3, SurfaceError};

    const FLAT_2X2: &str = r#"
<patch rows="2" cols="2">
  <sampling resolution="16" stride="2" include_end="true"/>
  <bvh depth="3" split_depth="3" boundary="closed"/>
  <query margin="0.5"/>
  <control_points>
    <point x="0" y="0" z="0"/>
    <point x="10" y="0" z="0"/>
    <point x="0" y="10" z="0"/>
    <point x="10" y="10" z="5"/>
  </control_points>
</patch>
"#;

    #[test]
    fn parses_full_document() {
        let config = parse_str(FLAT_2X2).expect("document parsed");

        assert_eq!((config.rows, config.cols), (2, 2));
        assert_eq!(config.control_points.len(), 4);
        assert_eq!(config.control_points[3], Point3::new(10.0, 10.0, 5.0));
        assert_eq!(config.sampling.resolution, 16);
        assert_eq!(config.sampling.stride, 2);
        assert!(config.sampling.include_end);
        assert_eq!(config.sampling.point_size, 2.0);
        assert_eq!(config.bvh.split_depth, 3);
        assert_eq!(config.bvh.boundary, BoundaryRule::Closed);
        assert_eq!(config.query.margin, 0.5);
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let xml = r#"
<patch rows="1" cols="2">
  <control_points>
    <point x="-5" y="1"/>
    <point x="5" y="1"/>
  </control_points>
</patch>
"#;
        let config = parse_str(xml).expect("document parsed");

        assert_eq!(config.control_points[0], Point3::new(-5.0, 1.0, 0.0));
        assert_eq!(config.sampling.resolution, 1024);
        assert_eq!(config.sampling.stride, 4);
        assert_eq!(config.bvh.depth, 3);
        assert_eq!(config.bvh.split_depth, 2);
        assert_eq!(config.bvh.boundary, BoundaryRule::HalfOpen);
    }

    #[test]
    fn oversized_grid_fails_fast() {
        let points = "<point x=\"0\" y=\"0\" z=\"0\"/>".repeat(11);
        let xml = format!(
            "<patch rows=\"11\" cols=\"1\"><control_points>{points}</control_points></patch>"
        );

        let err = parse_str(&xml).expect_err("11 rows exceed the table");
        assert!(matches!(
            err,
            ParseError::Config(ConfigError::Surface(SurfaceError::GridTooLarge { rows: 11, .. }))
        ));
    }

    #[test]
    fn boundary_rule_spellings() {
        let xml = FLAT_2X2.replace("boundary=\"closed\"", "boundary=\"half_open\"");
        let config = parse_str(&xml).expect("alias accepted");
        assert_eq!(config.bvh.boundary, BoundaryRule::HalfOpen);

        let xml = FLAT_2X2.replace("boundary=\"closed\"", "boundary=\"fuzzy\"");
        let err = parse_str(&xml).expect_err("unknown rule");
        assert!(matches!(err, ParseError::Xml(_)));
    }

    #[test]
    fn malformed_xml_is_an_xml_error() {
        let err = parse_str("<patch rows=\"two\"></patch>").expect_err("bad number");
        assert!(matches!(err, ParseError::Xml(_)));
    }
}
