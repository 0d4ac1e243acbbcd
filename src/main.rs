use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use xwing_data_tools::{
    cli::{Cli, Commands},
    config::Config,
    filter::resolve_passes,
    normalize::{build_pass, Pass, PassContext, Pipeline, ALL_PASSES},
    remote::{reserved_ids_for, CacheManager, MemoryClient},
    schema::SchemaSynthesizer,
    store::RecordStore,
    ui::ConsoleUi,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse_args();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.schema_dir {
        config.schema_dir = dir;
    }
    let store = RecordStore::new(&config.data_dir, config.extension.clone());

    match cli.command {
        Commands::Normalize {
            include,
            exclude,
            order_fields,
            no_fetch,
        } => {
            let start = Instant::now();

            // Resolve pass filters
            let passes = resolve_passes(include, exclude, order_fields)?;

            // Reserved ids only matter to the id pass
            let reserved_ids = if passes.iter().any(|p| p.name == "ids") {
                let cache = CacheManager::new(None)
                    .map_err(|e| warn!("id cache unavailable: {:#}", e))
                    .ok();
                config
                    .reserved_ids
                    .iter()
                    .map(|(collection, url)| {
                        let ids = reserved_ids_for(collection, Some(url.as_str()), cache.as_ref(), no_fetch);
                        (collection.clone(), ids)
                    })
                    .collect()
            } else {
                BTreeMap::new()
            };

            let ctx = PassContext {
                config: &config,
                store: &store,
                reserved_ids,
            };
            let mut built: Vec<Box<dyn Pass>> = passes.iter().flat_map(|info| build_pass(info, &ctx)).collect();

            let mut ui = ConsoleUi::stdin();
            Pipeline::new(&store, config.layout)
                .run(&mut built, &mut ui)
                .with_context(|| format!("Normalization of {:?} failed", store.root()))?;

            let elapsed = start.elapsed();
            println!(
                "\nRan {} passes over {:?} in {:.1}s",
                built.len(),
                store.root(),
                elapsed.as_secs_f64()
            );
        }

        Commands::Schema => {
            let start = Instant::now();

            let mut ui = ConsoleUi::stdin();
            let written = SchemaSynthesizer::new(&store, &config.schema_dir, config.schema_host.clone())
                .run(&mut ui)
                .context("Schema synthesis failed")?;

            let elapsed = start.elapsed();
            println!(
                "\nWrote {} schema documents to {:?} in {:.1}s",
                written.len(),
                config.schema_dir,
                elapsed.as_secs_f64()
            );
        }

        Commands::FetchIds { collection, url } => {
            let ids = MemoryClient::new()?.fetch_reserved_ids(&url)?;
            let cache = CacheManager::new(None)?;
            cache.store(&collection, &ids)?;
            println!(
                "Cached {} reserved ids for {} in {:?}",
                ids.len(),
                collection,
                cache.ids_path(&collection)
            );
        }

        Commands::ListPasses => {
            println!("Available passes:\n");
            for pass in ALL_PASSES {
                let opt_in = if pass.opt_in { " (opt-in)" } else { "" };
                println!("  {:<12} {}{}", pass.name, pass.description, opt_in);
                if !pass.depends_on.is_empty() {
                    println!("  {:<12} after: {}", "", pass.depends_on.join(", "));
                }
            }
        }
    }

    Ok(())
}
