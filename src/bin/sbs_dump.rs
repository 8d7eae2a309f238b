use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::*;

use shader_sbs::shaders::model::StageReflection;
use shader_sbs::shaders::sbs;

/// Prints the reflection stored in an SBS container
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    input: PathBuf,

    /// also print the embedded shader sources
    #[arg(long, short)]
    source: bool,
}

fn print_stage(stage: &StageReflection, with_source: bool) {
    println!("{:?}", stage.stage);

    for input in &stage.inputs {
        println!(
            "  input {} @{} {}{} {:?}",
            input.name,
            input.location,
            input.semantic_name,
            input.semantic_index,
            input.attribute_type
        );
    }

    for tex in &stage.textures {
        println!(
            "  texture {} set={} binding={} {:?} {:?}",
            tex.name, tex.set, tex.binding, tex.texture_type, tex.sampler_type
        );
    }

    for smp in &stage.samplers {
        println!(
            "  sampler {} set={} binding={} {:?}",
            smp.name, smp.set, smp.binding, smp.sampler_type
        );
    }

    for pair in &stage.texture_samplers {
        println!(
            "  texture_sampler {} ({} + {}) binding={}",
            pair.name, pair.texture_name, pair.sampler_name, pair.binding
        );
    }

    for ub in &stage.uniform_blocks {
        println!(
            "  uniform_block {} ({}) set={} binding={} size={}{}",
            ub.name,
            ub.inst_name,
            ub.set,
            ub.binding,
            ub.size_bytes,
            if ub.flattened { " flattened" } else { "" }
        );

        for u in &ub.uniforms {
            println!(
                "    {} {:?}[{}] +{}",
                u.name, u.uniform_type, u.array_count, u.offset
            );
        }
    }

    if with_source {
        println!("{}", stage.source);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let program = sbs::read_program(&bytes)
        .with_context(|| format!("malformed sbs container {}", args.input.display()))?;

    let profile = &program.profile;
    println!(
        "{} {:?} {}{}",
        program.name,
        profile.lang,
        profile.version,
        if profile.es { " es" } else { "" }
    );

    for stage in &program.stages {
        print_stage(stage, args.source);
    }

    Ok(())
}

pub fn main() {
    pretty_env_logger::init();

    if let Err(err) = run(Args::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
