//! Command-line front end for build-time tier resolution.
//!
//! Settings come from the `VTIER_*` environment variables and can be
//! overridden with flags, so a build script and a developer see the same
//! resolution.

use bumpalo::Bump;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;

use vtier::compat::{compatible, lane_effect, ContractTable};
use vtier::core::{
    BuildConfig, CompatLevel, EmitContext, EmulatedFamily, Family, GenericOp, Mask, Request,
    ResolveSession, RoundingMode, ScratchSlots, Tier, Variant, WidthSelector,
};
use vtier::resolve::TableCatalogue;
use vtier::Resolver;

#[derive(Parser)]
#[command(name = "vtier")]
#[command(about = "Resolve generic SIMD operations onto the primitives of a vector tier", long_about = None)]
#[command(version)]
struct Cli {
    /// Vector width selector: scalar, 128, 256, 512, 1024, 2048 or var
    #[arg(short = 'w', long, value_name = "WIDTH")]
    width: Option<WidthSelector>,

    /// Element width in bits (16, 32 or 64)
    #[arg(short = 'e', long, value_name = "BITS")]
    element: Option<u32>,

    /// Enable the scalable vector extension
    #[arg(short = 's', long)]
    scalable: bool,

    /// Compatibility level for reciprocal
    #[arg(long, value_name = "LEVEL")]
    recip_level: Option<CompatLevel>,

    /// Compatibility level for reciprocal square root
    #[arg(long, value_name = "LEVEL")]
    rsqrt_level: Option<CompatLevel>,

    /// Compatibility level for fused multiply-add
    #[arg(long, value_name = "LEVEL")]
    fma_level: Option<CompatLevel>,

    /// Compatibility level for fused multiply-subtract
    #[arg(long, value_name = "LEVEL")]
    fms_level: Option<CompatLevel>,

    /// Primitive catalogue file (default: built-in reference target)
    #[arg(short = 'c', long, value_name = "FILE")]
    catalogue: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one generic operation and print its primitive sequence
    Resolve {
        /// Family mnemonic, e.g. add, rcp, fmadd, cmplt
        #[arg(value_name = "FAMILY")]
        family: Family,

        /// Lane interpretation
        #[arg(short = 'v', long, default_value = "float")]
        variant: Variant,

        /// Report that the destination aliases source INDEX
        #[arg(short = 'a', long, value_name = "INDEX")]
        alias: Option<usize>,

        /// Static rounding override
        #[arg(short = 'r', long, value_name = "MODE")]
        rounding: Option<RoundingMode>,

        /// Predicate mask register
        #[arg(short = 'k', long, value_name = "MASK")]
        mask: Option<u8>,

        /// Print session statistics afterwards
        #[arg(long)]
        stats: bool,
    },

    /// Every supported operation with its strategy and symbols
    Table,

    /// Compatibility contract between two tiers (full matrix without arguments)
    Compat {
        #[arg(value_name = "WRITE", requires = "read")]
        write: Option<Tier>,

        #[arg(value_name = "READ")]
        read: Option<Tier>,
    },

    /// Dump the primitive catalogue in file format
    Catalogue,
}

impl Cli {
    fn build_config(&self) -> Result<BuildConfig, Box<dyn std::error::Error>> {
        let mut config = BuildConfig::from_env()?;
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(bits) = self.element {
            config.element_bits = bits;
        }
        config.scalable |= self.scalable;

        let overrides = [
            (EmulatedFamily::Reciprocal, self.recip_level),
            (EmulatedFamily::RecipSqrt, self.rsqrt_level),
            (EmulatedFamily::FusedMulAdd, self.fma_level),
            (EmulatedFamily::FusedMulSub, self.fms_level),
        ];
        for (family, level) in overrides {
            if level.is_some() {
                config.levels.set(family, level);
            }
        }
        Ok(config)
    }

    fn load_catalogue(&self) -> Result<TableCatalogue, Box<dyn std::error::Error>> {
        match &self.catalogue {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                Ok(TableCatalogue::parse(&text)?)
            }
            None => Ok(TableCatalogue::builtin()),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Compat { write, read } => {
            match (write, read) {
                (Some(write), Some(read)) => {
                    println!("{} -> {}: {}", write, read, compatible(*write, *read));
                    if !write.is_vector() {
                        println!("note: {} defines {:?}", write, lane_effect(Family::Move, *write));
                    }
                }
                _ => print!("{}", ContractTable::build()),
            }
            return Ok(());
        }
        Commands::Catalogue => {
            print!("{}", cli.load_catalogue()?.to_text());
            return Ok(());
        }
        _ => {}
    }

    let config = cli.build_config()?;
    let arena = Bump::new();
    let session = ResolveSession::new(&arena);
    let resolver = Resolver::new(&session, &config, cli.load_catalogue()?)?;
    let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);

    match &cli.command {
        Commands::Resolve {
            family,
            variant,
            alias,
            rounding,
            mask,
            stats,
        } => {
            let mut ctx = EmitContext::default();
            if let Some(mode) = rounding {
                ctx = ctx.with_rounding(*mode);
            }
            if let Some(mask) = mask {
                ctx = ctx.with_mask(Mask(*mask));
            }

            let mut request = Request::canonical(GenericOp::new(*family, *variant)).with_context(ctx);
            if let Some(index) = alias {
                request.dst = request.srcs.get(*index).copied().unwrap_or(request.dst);
                request = request.aliasing_source(*index);
            }

            let sequence = resolver.resolve(&request, &mut scratch)?;
            print!("{}", sequence);
            if *stats {
                println!("\n{}", session.stats());
            }
        }
        Commands::Table => {
            println!("# {}", resolver.tuple());
            for op in resolver.supported_ops() {
                let sequence = resolver.resolve(&Request::canonical(op), &mut scratch)?;
                println!(
                    "{:<12} {:<18} {}",
                    op.to_string(),
                    sequence.strategy.to_string(),
                    sequence.symbols().join(" ")
                );
            }
        }
        Commands::Compat { .. } | Commands::Catalogue => {}
    }

    Ok(())
}
