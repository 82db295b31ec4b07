#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod debug_draw;
pub mod geom;
pub mod parse;

use config::{ConfigResult, PatchConfig};
use debug_draw::DebugSink;
use geom::{BezierPatch, Bvh, Point3, SampleGrid, TreeNode, build_sample_grid};

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Installs a stderr logger at debug level.
        pub fn init_logger() {
            let _ = env_logger::Builder::new()
                .filter_level(log::LevelFilter::Debug)
                .try_init();
        }
    } else {
        /// Installs a stderr logger controlled by `RUST_LOG` (default `info`).
        pub fn init_logger() {
            let env = env_logger::Env::default().default_filter_or("info");
            let _ = env_logger::Builder::from_env(env).try_init();
        }
    }
}

/// Outcome of [`PatchEngine::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub sample_count: usize,
    pub populated_nodes: usize,
    /// Matches for the startup query, if one was given.
    pub matches: Option<Vec<usize>>,
}

/// Public entry point: a validated patch together with its BVH and, once
/// sampled, its sample grid.
#[derive(Debug, Clone)]
pub struct PatchEngine {
    config: PatchConfig,
    patch: BezierPatch,
    bvh: Bvh,
    samples: Option<SampleGrid>,
}

impl PatchEngine {
    /// Validates `config` and builds the BVH over its control points.
    pub fn new(config: PatchConfig) -> ConfigResult<Self> {
        let grid = config.validate()?;
        let bvh = Bvh::build_in(TreeNode::enclosing(grid.bounds()), &config.bvh);
        let patch = BezierPatch::new(grid, config.sampling.resolution);

        Ok(Self {
            config,
            patch,
            bvh,
            samples: None,
        })
    }

    /// Builds an engine from an XML patch document.
    pub fn from_xml(xml: &str) -> parse::ParseResult<Self> {
        let config = parse::parse_str(xml)?;
        Ok(Self::new(config)?)
    }

    #[must_use]
    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    #[must_use]
    pub fn patch(&self) -> &BezierPatch {
        &self.patch
    }

    #[must_use]
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// The sample grid, once [`PatchEngine::sample`] or [`PatchEngine::start`] ran.
    #[must_use]
    pub fn samples(&self) -> Option<&SampleGrid> {
        self.samples.as_ref()
    }

    /// Samples the patch, forwarding every point to `sink`. The grid is built
    /// once; later calls return the cached grid without drawing again.
    pub fn sample<S: DebugSink>(&mut self, sink: &mut S) -> &SampleGrid {
        let patch = &self.patch;
        let options = &self.config.sampling;
        self.samples
            .get_or_insert_with(|| build_sample_grid(patch, options, sink))
    }

    /// Locates `point` in the BVH, drawing every matched box on `sink`.
    pub fn locate<S: DebugSink>(&self, point: Point3, sink: &mut S) -> Vec<usize> {
        self.bvh.locate_with(point, &self.config.query, sink)
    }

    /// Samples the surface and, when `query` is given, locates it.
    pub fn start<S: DebugSink>(&mut self, query: Option<Point3>, sink: &mut S) -> StartupReport {
        let sample_count = self.sample(sink).len();
        let matches = query.map(|point| {
            let matches = self.locate(point, sink);
            log::info!(
                "query ({}, {}, {}) matched {} node(s): {matches:?}",
                point.x,
                point.y,
                point.z,
                matches.len()
            );
            matches
        });

        StartupReport {
            sample_count,
            populated_nodes: self.bvh.populated_len(),
            matches,
        }
    }
}
