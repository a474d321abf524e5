//! Load and eval commands - materialize manifests and print them

use crate::cli::args::{ManifestArgs, OutputFormat};
use crate::config::Config;
use crate::error::GlacierResult;
use crate::manifest::{FsReader, ManifestCache, QuickJsEvaluator, Strategy};
use crate::ui::{self, UiContext};
use crate::value::Value;
use tracing::debug;

/// Execute the load command
pub fn load(args: ManifestArgs, config: &Config) -> GlacierResult<()> {
    execute(args, config, Strategy::Parse)
}

/// Execute the eval command
pub fn eval(args: ManifestArgs, config: &Config) -> GlacierResult<()> {
    execute(args, config, Strategy::Evaluate)
}

fn execute(args: ManifestArgs, config: &Config, strategy: Strategy) -> GlacierResult<()> {
    let cache =
        ManifestCache::with_collaborators(FsReader, QuickJsEvaluator::from_config(&config.eval));
    let should_cache = config.cache.enabled && !args.no_cache;
    debug!("Materializing {} manifest(s), caching: {}", args.paths.len(), should_cache);

    for path in &args.paths {
        let value = match strategy {
            Strategy::Parse => cache.load_manifest(path, should_cache)?,
            Strategy::Evaluate => cache.eval_manifest(path, should_cache)?,
        };
        print_value(&value, args.format)?;
    }

    if args.stats {
        print_stats(&cache);
    }

    Ok(())
}

fn print_value(value: &Value, format: OutputFormat) -> GlacierResult<()> {
    let rendered = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn print_stats(cache: &ManifestCache) {
    let ctx = UiContext::detect();
    let stats = cache.stats();

    ui::step_ok_detail(&ctx, "Cache statistics", &format!("{} cached", cache.len()));
    ui::key_value(&ctx, "hits", &stats.hits.to_string());
    ui::key_value(&ctx, "misses", &stats.misses.to_string());
    ui::key_value(&ctx, "bypassed", &stats.bypassed.to_string());
    for entry in cache.entries() {
        ui::key_value(
            &ctx,
            &entry.path.display().to_string(),
            &format!("{:?} at {}", entry.strategy, entry.loaded_at.format("%H:%M:%S")),
        );
    }
}
