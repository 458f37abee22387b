//! sdf-tracer CLI - render SDF scenes and inspect generated kernels.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, LevelFilter};

use sdf_tracer::export::save_image;
use sdf_tracer::gpu::GpuContext;
use sdf_tracer::pipeline::{PipelineEvent, RenderPipeline};
use sdf_tracer::scene::{Scene, SceneLayout};
use sdf_tracer::settings::RenderSettings;
use sdf_tracer::shader::{compose, ShaderGroup};

const BUILD_DATE: &str = env!("SDF_TRACER_BUILD_DATE");
const BUILD_TIME: &str = env!("SDF_TRACER_BUILD_TIME");

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = LevelFilter::Info;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = LevelFilter::Debug,
            "-vv" | "--trace" => level = LevelFilter::Trace,
            "-q" | "--quiet" => level = LevelFilter::Error,
            _ => filtered_args.push(arg),
        }
    }
    // Library tracing events reach env_logger through tracing's `log` feature
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
    let _trace_guard = sdf_tracer::init_chrome_trace();

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "r" | "render" => cmd_render(&filtered_args[1..]),
        "w" | "wgsl" => cmd_wgsl(&filtered_args[1..]),
        "i" | "info" => cmd_info(),
        "h" | "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            if Path::new(other).exists() {
                cmd_render(&filtered_args)
            } else {
                eprintln!("Unknown command: {other}");
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_help() {
    println!("sdf-tracer - progressive GPU path tracer for SDF scenes");
    println!();
    println!("USAGE:");
    println!("    sdf-tracer-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    r, render <scene.json>        Render a scene to an image");
    println!("        -o, --output <file>       Output .exr or .hdr (default: render.exr)");
    println!("        -n, --samples <N>         Samples to accumulate (default: 64)");
    println!("        -s, --size <WxH>          Resolution (default: settings or 512x512)");
    println!("        -d, --depth <N>           Bounces per sample");
    println!("        --settings <file>         Load render settings from a JSON file");
    println!("        --linear                  Undo display gamma before writing");
    println!("    w, wgsl   <scene.json> [group] Print generated WGSL (camera, geometry, shading)");
    println!("    i, info                       Show GPU adapter and build info");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("NOTES:");
    println!("    - Passing a scene file directly is equivalent to 'render'");
    println!("    - SDF_TRACER_TRACE=1 writes a chrome trace to trace.json");
}

struct RenderArgs {
    scene: PathBuf,
    output: PathBuf,
    samples: u32,
    size: Option<(u32, u32)>,
    depth: Option<u32>,
    settings: Option<PathBuf>,
    linear: bool,
}

fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| anyhow!("size must look like 640x480, got '{s}'"))?;
    let size = (w.trim().parse()?, h.trim().parse()?);
    if size.0 == 0 || size.1 == 0 {
        bail!("size must be non-zero, got '{s}'");
    }
    Ok(size)
}

fn parse_render_args(args: &[&str]) -> Result<RenderArgs> {
    let mut parsed = RenderArgs {
        scene: PathBuf::new(),
        output: PathBuf::from("render.exr"),
        samples: 64,
        size: None,
        depth: None,
        settings: None,
        linear: false,
    };
    let mut scene = None;
    let mut it = args.iter().copied();
    while let Some(arg) = it.next() {
        let mut value = || it.next().ok_or_else(|| anyhow!("missing value for {arg}"));
        match arg {
            "-o" | "--output" => parsed.output = PathBuf::from(value()?),
            "-n" | "--samples" => parsed.samples = value()?.parse().context("--samples")?,
            "-s" | "--size" => parsed.size = Some(parse_size(value()?)?),
            "-d" | "--depth" => parsed.depth = Some(value()?.parse().context("--depth")?),
            "--settings" => parsed.settings = Some(PathBuf::from(value()?)),
            "--linear" => parsed.linear = true,
            _ if arg.starts_with('-') => bail!("unknown option {arg}"),
            _ if scene.is_none() => scene = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}"),
        }
    }
    parsed.scene = scene.ok_or_else(|| anyhow!("missing scene file\nUsage: sdf-tracer-cli render <scene.json>"))?;
    Ok(parsed)
}

fn cmd_render(args: &[&str]) -> Result<()> {
    let args = parse_render_args(args)?;

    info!("Loading scene: {}", args.scene.display());
    let scene = Scene::load(&args.scene)?;
    debug!("{} nodes, {} primitives", scene.nodes.len(), scene.primitives().count());

    let mut settings = match &args.settings {
        Some(path) => RenderSettings::from_file(path)?,
        None => RenderSettings::load(),
    };
    if let Some(depth) = args.depth {
        settings.max_depth = depth;
    }
    let (width, height) = args.size.or(settings.render_size.map(|[w, h]| (w, h))).unwrap_or((512, 512));
    settings.render_size = Some([width, height]);

    let ctx = GpuContext::new()?;
    info!("Adapter: {}", ctx.adapter_name());
    let mut pipeline = RenderPipeline::new(ctx, settings);
    let events = pipeline.events();

    let t = Instant::now();
    pipeline.compile(&scene)?;
    info!("Compiled {} kernels in {:.2?}", pipeline.last_compile_report().compiled.len(), t.elapsed());

    let t = Instant::now();
    let samples = pipeline.render_samples(args.samples)?;
    let elapsed = t.elapsed();

    let gpu_millis: Vec<f64> = events
        .try_iter()
        .filter_map(|e| match e {
            PipelineEvent::Progress(p) => Some(p.gpu_millis),
            _ => None,
        })
        .collect();
    if !gpu_millis.is_empty() {
        debug!("Mean sample time: {:.2} ms", gpu_millis.iter().sum::<f64>() / gpu_millis.len() as f64);
    }
    info!("Rendered {samples} samples at {width}x{height} in {elapsed:.2?}");

    let pixels = pipeline.read_final()?;
    save_image(&args.output, width, height, &pixels, args.linear)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn cmd_wgsl(args: &[&str]) -> Result<()> {
    let path = args.first().ok_or_else(|| anyhow!("missing scene file\nUsage: sdf-tracer-cli wgsl <scene.json> [group]"))?;
    let scene = Scene::load(Path::new(path))?;
    let layout = SceneLayout::build(&scene, &RenderSettings::load())?;
    let composed = compose(&scene, &layout);

    let groups: Vec<ShaderGroup> = match args.get(1) {
        None => ShaderGroup::ALL.to_vec(),
        Some(name) => vec![ShaderGroup::ALL
            .into_iter()
            .find(|g| g.name() == *name)
            .ok_or_else(|| anyhow!("unknown group '{name}' (camera, geometry, shading)"))?],
    };
    for group in groups {
        println!("// ---- {} ----", group.name());
        println!("{}", composed.source(group));
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("sdf-tracer {} (built {BUILD_DATE} {BUILD_TIME})", env!("CARGO_PKG_VERSION"));
    let ctx = GpuContext::new()?;
    let limits = ctx.limits();
    println!("Adapter: {}", ctx.adapter_name());
    println!("Max storage buffer binding: {} bytes", limits.max_storage_buffer_binding_size);
    println!("Max buffer size: {} bytes", limits.max_buffer_size);
    Ok(())
}
