use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Error,
    order::{DiskOrder, MemoryOrder},
};

/// OME-NGFF metadata versions which can be parsed.
///
/// Anything else is rejected with [Error::UnsupportedVersion].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NgffVersion {
    V0_4,
}

impl NgffVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            NgffVersion::V0_4 => "0.4",
        }
    }
}

impl FromStr for NgffVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0.4" => Ok(Self::V0_4),
            // 0.3 and 0.5 describe transformations differently; don't guess.
            other => Err(Error::UnsupportedVersion(other.to_owned())),
        }
    }
}

impl fmt::Display for NgffVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of dimension an [Axis] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Time,
    Channel,
    Space,
}

/// One dimension descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    /// Physical unit; only meaningful for space and time axes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Axis {
    pub fn new(name: impl Into<String>, axis_type: AxisType, unit: Option<&str>) -> Self {
        Self {
            name: name.into(),
            axis_type,
            unit: unit.map(str::to_owned),
        }
    }
}

/// One step of a coordinate transformation chain.
///
/// Values are per-axis, in on-disk order.
/// Either may be given by reference to a binary `path` instead of inline,
/// in which case it is not applied by [Multiscales::scale].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum CoordinateTransformation {
    Identity,
    Scale {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<DiskOrder<f64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Translation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        translation: Option<DiskOrder<f64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

impl CoordinateTransformation {
    pub fn scale(values: Vec<f64>) -> Self {
        Self::Scale {
            scale: Some(DiskOrder::new(values)),
            path: None,
        }
    }

    pub fn translation(values: Vec<f64>) -> Self {
        Self::Translation {
            translation: Some(DiskOrder::new(values)),
            path: None,
        }
    }

    fn values(&self) -> Option<&DiskOrder<f64>> {
        match self {
            CoordinateTransformation::Identity => None,
            CoordinateTransformation::Scale { scale, .. } => scale.as_ref(),
            CoordinateTransformation::Translation { translation, .. } => translation.as_ref(),
        }
    }
}

/// One resolution level as listed in the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Path of the level's array, relative to the multiscales group.
    pub path: String,
    #[serde(default)]
    pub coordinate_transformations: Vec<CoordinateTransformation>,
}

/// Calibration of one resolution level, in in-memory axis order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub path: String,
    pub scale_factors: MemoryOrder<f64>,
    pub offsets: MemoryOrder<f64>,
}

/// Representation of a single `multiscales` entry as it appears in v0.4 JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultiscaleEntryV04 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    axes: Option<Vec<Axis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datasets: Option<Vec<Dataset>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    coordinate_transformations: Vec<CoordinateTransformation>,
    /// Downscaling method, e.g. "gaussian".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    downscaling_type: Option<String>,
}

/// One image pyramid: a list of incrementally down-scaled arrays sharing
/// the same axes.
///
/// Parsed once with [Multiscales::parse] and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Multiscales {
    version: NgffVersion,
    name: Option<String>,
    downscaling_type: Option<String>,
    axes: DiskOrder<Axis>,
    datasets: Vec<Dataset>,
    coordinate_transformations: Vec<CoordinateTransformation>,
}

impl Multiscales {
    /// Parse the multiscales description from a node's attributes.
    ///
    /// The attributes may hold `multiscales` directly (Zarr v2 `.zattrs`)
    /// or inside an `ome` object (Zarr v3 `zarr.json`).
    /// Only the first entry of `multiscales` is used.
    pub fn parse(attributes: &Map<String, Value>) -> crate::Result<Self> {
        let container = match attributes.get("ome") {
            Some(Value::Object(ome)) => ome,
            _ => attributes,
        };
        let entries = container
            .get("multiscales")
            .ok_or(Error::MissingField("multiscales"))?
            .as_array()
            .ok_or_else(|| Error::malformed("`multiscales` is not an array"))?;
        let entry = entries
            .first()
            .ok_or_else(|| Error::malformed("`multiscales` is empty"))?;
        if entries.len() > 1 {
            log::debug!(
                "found {} multiscales entries, using the first",
                entries.len()
            );
        }

        let version = entry
            .get("version")
            .or_else(|| container.get("version"))
            .ok_or(Error::MissingField("version"))?
            .as_str()
            .ok_or_else(|| Error::malformed("`version` is not a string"))?
            .parse::<NgffVersion>()?;

        match version {
            NgffVersion::V0_4 => {
                let raw: MultiscaleEntryV04 = serde_json::from_value(entry.clone())?;
                Self::from_v04(raw)
            }
        }
    }

    /// Parse from any JSON value, which must be an object.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        match value {
            Value::Object(attributes) => Self::parse(attributes),
            _ => Err(Error::malformed("attributes are not a JSON object")),
        }
    }

    fn from_v04(raw: MultiscaleEntryV04) -> crate::Result<Self> {
        let axes = DiskOrder::new(raw.axes.ok_or(Error::MissingField("axes"))?);
        let datasets = raw.datasets.ok_or(Error::MissingField("datasets"))?;
        let out = Self {
            version: NgffVersion::V0_4,
            name: raw.name,
            downscaling_type: raw.downscaling_type,
            axes,
            datasets,
            coordinate_transformations: raw.coordinate_transformations,
        };
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.axes.is_empty() {
            return Err(Error::malformed("no axes"));
        }
        for axis_type in [AxisType::Channel, AxisType::Time] {
            let count = self
                .axes
                .iter()
                .filter(|a| a.axis_type == axis_type)
                .count();
            if count > 1 {
                return Err(Error::malformed(format!(
                    "{count} axes of type {axis_type:?}, at most one allowed"
                )));
            }
        }
        for (idx, axis) in self.axes.iter().enumerate() {
            if self.axes[..idx].iter().any(|a| a.name == axis.name) {
                return Err(Error::malformed(format!(
                    "duplicate axis name {:?}",
                    axis.name
                )));
            }
        }
        if self.datasets.is_empty() {
            return Err(Error::malformed("no datasets"));
        }

        let ndim = self.axes.len();
        let check = |t: &CoordinateTransformation, context: &str| {
            match t.values() {
                Some(v) if v.len() != ndim => Err(Error::malformed(format!(
                    "{context} transformation has {} values for {ndim} axes",
                    v.len()
                ))),
                _ => Ok(()),
            }
        };
        for t in &self.coordinate_transformations {
            check(t, "global")?;
        }
        for ds in &self.datasets {
            for t in &ds.coordinate_transformations {
                check(t, &format!("dataset {:?}", ds.path))?;
            }
        }
        Ok(())
    }

    /// Check that the axes match the rank of an array in this pyramid.
    pub fn validate_rank(&self, rank: usize) -> crate::Result<()> {
        if rank != self.axes.len() {
            return Err(Error::malformed(format!(
                "array has {rank} dimensions but metadata lists {} axes",
                self.axes.len()
            )));
        }
        Ok(())
    }

    pub fn version(&self) -> NgffVersion {
        self.version
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn downscaling_type(&self) -> Option<&str> {
        self.downscaling_type.as_deref()
    }

    /// Axes in on-disk order.
    pub fn axes(&self) -> &DiskOrder<Axis> {
        &self.axes
    }

    /// Axes in in-memory order.
    pub fn memory_axes(&self) -> MemoryOrder<Axis> {
        self.axes.to_memory_order()
    }

    /// Resolution levels; index 0 is conventionally, but not necessarily, the finest.
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Transformations applying to every level, before the level's own.
    pub fn coordinate_transformations(&self) -> &[CoordinateTransformation] {
        &self.coordinate_transformations
    }

    pub fn num_dimensions(&self) -> usize {
        self.axes.len()
    }

    pub fn num_resolutions(&self) -> usize {
        self.datasets.len()
    }

    /// On-disk index of the axis of the given type.
    ///
    /// Space axes additionally need a `name`, matched exactly;
    /// without one, None is returned.
    pub fn axis_index(&self, axis_type: AxisType, name: Option<&str>) -> Option<usize> {
        match axis_type {
            AxisType::Space => {
                let name = name?;
                self.axes
                    .iter()
                    .position(|a| a.axis_type == AxisType::Space && a.name == name)
            }
            t => self.axes.iter().position(|a| a.axis_type == t),
        }
    }

    pub fn channel_axis_index(&self) -> Option<usize> {
        self.axis_index(AxisType::Channel, None)
    }

    pub fn time_axis_index(&self) -> Option<usize> {
        self.axis_index(AxisType::Time, None)
    }

    pub fn spatial_axis_index(&self, name: &str) -> Option<usize> {
        self.axis_index(AxisType::Space, Some(name))
    }

    /// Per-axis scale factors of a resolution level, in in-memory order.
    ///
    /// Returns None if there is no such level.
    pub fn compute_scale_factors(&self, level: usize) -> Option<MemoryOrder<f64>> {
        self.scale(level).map(|s| s.scale_factors)
    }

    /// Per-axis scale factors and offsets of a resolution level, in in-memory order.
    ///
    /// The global transformations are composed first, followed by the level's own.
    /// Transformations given by `path` are skipped.
    /// Returns None if there is no such level.
    pub fn scale(&self, level: usize) -> Option<Scale> {
        let dataset = self.datasets.get(level)?;
        let ndim = self.axes.len();
        let mut factors = vec![1.0; ndim];
        let mut offsets = vec![0.0; ndim];

        let chain = self
            .coordinate_transformations
            .iter()
            .chain(&dataset.coordinate_transformations);
        for t in chain {
            match t {
                CoordinateTransformation::Scale {
                    scale: Some(scale), ..
                } => {
                    for d in 0..ndim {
                        factors[d] *= scale[d];
                        offsets[d] *= scale[d];
                    }
                }
                CoordinateTransformation::Translation {
                    translation: Some(translation),
                    ..
                } => {
                    for d in 0..ndim {
                        offsets[d] += translation[d];
                    }
                }
                _ => {}
            }
        }

        Some(Scale {
            path: dataset.path.clone(),
            scale_factors: DiskOrder::new(factors).into_memory_order(),
            offsets: DiskOrder::new(offsets).into_memory_order(),
        })
    }

    /// Calibration of every level, finest (by listing order) first.
    pub fn scales(&self) -> Vec<Scale> {
        (0..self.datasets.len())
            .filter_map(|level| self.scale(level))
            .collect()
    }

    /// Serialize back into an attributes object holding a single v0.4 `multiscales` entry.
    pub fn to_attributes(&self) -> crate::Result<Map<String, Value>> {
        let entry = MultiscaleEntryV04 {
            version: Some(self.version.as_str().to_owned()),
            name: self.name.clone(),
            axes: Some(self.axes.to_vec()),
            datasets: Some(self.datasets.clone()),
            coordinate_transformations: self.coordinate_transformations.clone(),
            downscaling_type: self.downscaling_type.clone(),
        };
        let mut out = Map::new();
        out.insert(
            "multiscales".to_owned(),
            Value::Array(vec![serde_json::to_value(entry)?]),
        );
        Ok(out)
    }
}

impl TryFrom<&Map<String, Value>> for Multiscales {
    type Error = Error;

    fn try_from(value: &Map<String, Value>) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
