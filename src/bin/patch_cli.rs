use std::process::ExitCode;

use patch_engine::config::PatchConfig;
use patch_engine::debug_draw::{DebugBox, RecordingSink};
use patch_engine::geom::{ControlGrid, Point3};
use patch_engine::{PatchEngine, parse};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const USAGE: &str = r#"patch_cli (patch-engine)

USAGE:
  patch_cli demo [options]
  patch_cli run <config.xml> [options]

COMMANDS:
  demo               Sample the built-in 3x4 demo patch
  run                Sample the patch described by an XML document

OPTIONS:
  --query <x,y,z>    Locate a point after sampling
  --random <n>       Locate n random points inside the root box
  --seed <s>         Seed for --random (default 0)
  --dump-boxes       Print every located box
  -h, --help         Show this help

Set RUST_LOG=trace to see every visited BVH node.
"#;

fn main() -> ExitCode {
    patch_engine::init_logger();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("patch_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "demo" => {
            let options = RunOptions::parse(&mut args)?;
            execute(demo_config()?, &options)
        }
        "run" => {
            let path = args.next().ok_or("missing config path")?;
            let options = RunOptions::parse(&mut args)?;
            let config = parse::parse_file(&path).map_err(|e| e.to_string())?;
            execute(config, &options)
        }
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

#[derive(Debug, Default)]
struct RunOptions {
    query: Option<Point3>,
    random: usize,
    seed: u64,
    dump_boxes: bool,
    help: bool,
}

impl RunOptions {
    fn parse(args: &mut Args) -> Result<Self, String> {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--query" => options.query = Some(parse_point(&args.value("--query")?)?),
                "--random" => {
                    let raw = args.value("--random")?;
                    options.random = raw
                        .parse()
                        .map_err(|_| format!("--random expects a count, got `{raw}`"))?;
                }
                "--seed" => {
                    let raw = args.value("--seed")?;
                    options.seed = raw
                        .parse()
                        .map_err(|_| format!("--seed expects an integer, got `{raw}`"))?;
                }
                "--dump-boxes" => options.dump_boxes = true,
                "-h" | "--help" => options.help = true,
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }
        Ok(options)
    }
}

fn parse_point(raw: &str) -> Result<Point3, String> {
    let coords = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid point `{raw}`: {e}"))?;

    match coords.as_slice() {
        &[x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(format!("point `{raw}` must have three comma-separated coordinates")),
    }
}

/// 3x4 grid over `[0, 300] x [0, 400]` with alternating heights.
fn demo_config() -> Result<PatchConfig, String> {
    let heights = [-10.0, 10.0, -5.0, 5.0];
    let mut points = Vec::with_capacity(12);
    for row in 0..3u32 {
        for (col, height) in heights.iter().enumerate() {
            let x = 100.0 * col as f64;
            let y = 200.0 * f64::from(row);
            let z = if row == 1 { -height } else { *height };
            points.push(Point3::new(x, y, z));
        }
    }
    let grid = ControlGrid::new(3, 4, points).map_err(|e| e.to_string())?;
    Ok(PatchConfig::with_grid(&grid))
}

fn execute(config: PatchConfig, options: &RunOptions) -> Result<(), String> {
    if options.help {
        print_usage();
        return Ok(());
    }

    let mut engine = PatchEngine::new(config).map_err(|e| e.to_string())?;
    let mut sink = RecordingSink::new();
    let report = engine.start(options.query, &mut sink);

    println!(
        "sampled {} points, {} of {} bvh slots populated",
        report.sample_count,
        report.populated_nodes,
        engine.bvh().capacity()
    );
    println!("root: {}", engine.bvh().root());

    if let (Some(point), Some(matches)) = (options.query, report.matches.as_ref()) {
        print_matches(&engine, point, matches);
    }

    if options.random > 0 {
        let mut rng = StdRng::seed_from_u64(options.seed);
        let root = engine.bvh().root().to_bbox();
        for _ in 0..options.random {
            let point = Point3::new(
                random_between(&mut rng, root.min.x, root.max.x),
                random_between(&mut rng, root.min.y, root.max.y),
                random_between(&mut rng, root.min.z, root.max.z),
            );
            let matches = engine.locate(point, &mut sink);
            print_matches(&engine, point, &matches);
        }
    }

    if options.dump_boxes {
        for DebugBox {
            center,
            half_extents,
            ..
        } in sink.boxes()
        {
            println!(
                "box center=({}, {}, {}) half_extents=({}, {}, {})",
                center.x, center.y, center.z, half_extents.x, half_extents.y, half_extents.z
            );
        }
    }

    Ok(())
}

fn random_between(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

fn print_matches(engine: &PatchEngine, point: Point3, matches: &[usize]) {
    println!(
        "query ({}, {}, {}): {} match(es)",
        point.x,
        point.y,
        point.z,
        matches.len()
    );
    for &index in matches {
        if let Some(node) = engine.bvh().node(index) {
            println!("  node {index:>3}: {node}");
        }
    }
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next()
            .ok_or_else(|| format!("missing value for {flag}"))
    }
}
