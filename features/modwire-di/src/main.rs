use std::{convert::Infallible, sync::Arc};

use modwire_di::{
    BuildConfig, DependencyGraph, ModuleBuilder, ModuleConfig, ModuleFactory,
    ModuleProps, RequireError,
};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer())
        .init();

    let config = BuildConfig::new()
        .module(
            "service",
            ModuleConfig::new()
                .dependencies(["repository", "clock"])
                .builder(|props: ModuleProps| async move {
                    Ok::<_, RequireError>(Service {
                        repository: props.dependencies().get("repository")?,
                        clock: props.dependencies().get("clock")?,
                    })
                }),
        )
        .module(
            "repository",
            ModuleConfig::new()
                .dependencies([("db", "database")])
                .factory(RepositoryFactory),
        )
        .module(
            "database",
            ModuleConfig::new()
                .arguments(json!({"url": "postgres://localhost/app", "pool_size": 4}))
                .sync_builder(|props: ModuleProps| {
                    props.arguments_as::<Database>()
                }),
        )
        .module(
            "clock",
            ModuleConfig::new().sync_builder(|_: ModuleProps| Ok::<_, Infallible>(Clock)),
        );

    let local = BuildConfig::new().module(
        "database",
        ModuleConfig::new().arguments(json!({"url": "postgres://localhost/dev"})),
    );

    println!("{}", DependencyGraph::from_config(&config).to_dot());

    let modules = match futures::executor::block_on(ModuleBuilder::new().build(&config, &[local])) {
        Ok(modules) => modules,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    println!("{:?}", modules);
    match modules.require::<Service>("service") {
        Ok(service) => {
            let database = &service.repository.database;
            println!(
                "service ready at {:?} using {} ({} connections)",
                service.clock, database.url, database.pool_size
            );
        }
        Err(e) => eprintln!("{e}"),
    }
}

#[derive(Debug, Deserialize)]
struct Database {
    url: String,
    pool_size: u8,
}

#[derive(Debug)]
struct Repository {
    database: Arc<Database>,
}
struct RepositoryFactory;
impl ModuleFactory for RepositoryFactory {
    type Provides = Repository;
    type Error = RequireError;

    async fn construct(&self, props: ModuleProps) -> Result<Repository, RequireError> {
        Ok(Repository {
            database: props.dependencies().get("db")?,
        })
    }
}

#[derive(Debug)]
struct Clock;

#[derive(Debug)]
struct Service {
    repository: Arc<Repository>,
    clock: Arc<Clock>,
}
