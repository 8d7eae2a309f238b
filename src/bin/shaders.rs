use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::*;

use shader_sbs::build_tasks::{self, Config, OutputFormat};
use shader_sbs::shaders::backend::{ShaderBackend, TableBackend};
use shader_sbs::shaders::model::{Platform, TargetProfile};

/// Reflects a compiled vertex/fragment pair into an SBS container or json
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// resource tables of the compiled vertex stage
    #[arg(long, required_unless_present = "frag")]
    vert: Option<PathBuf>,

    /// resource tables of the compiled fragment stage
    #[arg(long)]
    frag: Option<PathBuf>,

    /// glsl330, glsl100, glsl300es, hlsl4, hlsl5, msl12 or msl21
    #[arg(long, short, default_value = "glsl330", value_parser = parse_profile)]
    lang: TargetProfile,

    #[arg(long, value_enum, default_value_t = PlatformArg::Default)]
    platform: PlatformArg,

    /// output file template, the extension is ignored
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// write json and bare shader sources instead of an SBS container
    #[arg(long, short = 'J')]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformArg {
    Default,
    Macos,
    Ios,
}

impl From<PlatformArg> for Platform {
    fn from(platform: PlatformArg) -> Self {
        match platform {
            PlatformArg::Default => Platform::Default,
            PlatformArg::Macos => Platform::MacOs,
            PlatformArg::Ios => Platform::Ios,
        }
    }
}

fn parse_profile(name: &str) -> Result<TargetProfile, String> {
    TargetProfile::from_name(name).ok_or_else(|| format!("unsupported shader language '{name}'"))
}

fn load_backend(path: &Path) -> anyhow::Result<Box<dyn ShaderBackend>> {
    let backend = TableBackend::from_path(path)
        .with_context(|| format!("failed to load stage {}", path.display()))?;

    Ok(Box::new(backend))
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut profile = args.lang;
    profile.platform = args.platform.into();

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Sbs
    };
    let config = Config::new(profile, args.output.as_deref(), format);

    let mut backends = vec![];
    for path in [&args.vert, &args.frag].into_iter().flatten() {
        backends.push(load_backend(path)?);
    }

    let path = build_tasks::build_program(&config, backends).context("shader build failed")?;
    info!("done: {}", path.display());

    Ok(())
}

pub fn main() {
    pretty_env_logger::init();

    let args = Args::parse();
    debug!("{args:?}");

    if let Err(err) = run(args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
