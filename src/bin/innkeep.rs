use clap::{Parser, Subcommand};
use innkeep::Backend;
use innkeep::config::Config;
use innkeep::controller::{Operation, Request};
use innkeep::permissions::{JobTitle, Permission};
use innkeep::query::parse_query_string;
use innkeep::resources::{Resource, room};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "innkeep", version, about = "Hotel back-office resource tools", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, global = true, help = "Path to a config file (TOML). Falls back to $INNKEEP_CONFIG, then ./innkeep.toml.")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured log level (error|warn|info|debug|trace)")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "log4rs YAML file; replaces the built-in app/audit log setup")]
    log_config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Compile a URL query string and print the query and the store filter it becomes")]
    Compile {
        #[arg(help = "Raw query string, e.g. 'floor=2&sort=-createdAt&limit=5'")]
        query: String,
        #[arg(long, default_value = room::NAME, help = "Resource whose filter translation to apply: room|guest|employee")]
        resource: String,
    },
    #[command(about = "Print the effective permission table, or one job title's entry")]
    Permissions {
        #[arg(help = "Job title, e.g. 'accommodation supervisor'")]
        title: Option<String>,
    },
    #[command(about = "Print the effective configuration as TOML")]
    Config,
    #[command(about = "Run one operation against a fresh in-memory backend and print the response")]
    Call {
        #[arg(help = "Resource: room|guest|employee")]
        resource: String,
        #[arg(help = "Operation: create|create-many|list|get|patch|patch-by-id|delete|delete-by-id")]
        operation: String,
        #[arg(long, default_value = "", help = "Raw query string")]
        query: String,
        #[arg(long, help = "Path identifier for by-id operations")]
        id: Option<String>,
        #[arg(long, help = "JSON request body")]
        body: Option<String>,
        #[arg(long, value_delimiter = ',', help = "Comma-separated permissions granted to the caller; omit to call unauthenticated")]
        grant: Option<Vec<String>>,
    },
}

fn parse_operation(raw: &str) -> Result<Operation, Box<dyn std::error::Error>> {
    Operation::ALL
        .into_iter()
        .find(|op| op.as_str() == raw)
        .ok_or_else(|| format!("unknown operation '{raw}'").into())
}

fn parse_permissions(raw: &[String]) -> Result<Vec<Permission>, Box<dyn std::error::Error>> {
    let mut out = Vec::with_capacity(raw.len());
    for p in raw {
        let value = serde_json::Value::String(p.trim().to_string());
        out.push(serde_json::from_value::<Permission>(value).map_err(|_| format!("unknown permission '{p}'"))?);
    }
    Ok(out)
}

fn lookup<'a>(backend: &'a Backend, name: &str) -> Result<&'a dyn Resource, Box<dyn std::error::Error>> {
    backend.resource(name).ok_or_else(|| format!("unknown resource '{name}'").into())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    let logging = match &cli.log_config {
        Some(path) => innkeep::logger::init_path(path),
        None => innkeep::logger::configure(&config.log),
    };
    if let Err(e) = logging {
        eprintln!("warning: logging disabled: {e}");
    }
    match cli.command {
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Permissions { title } => {
            let table = config.permission_table();
            match title {
                Some(raw) => {
                    let title: JobTitle = raw.parse()?;
                    println!("{}", serde_json::to_string_pretty(table.for_title(title))?);
                }
                None => println!("{}", serde_json::to_string_pretty(&table)?),
            }
        }
        Commands::Compile { query, resource } => {
            let backend = Backend::in_memory(config)?;
            let handlers = lookup(&backend, &resource)?.handlers();
            let compiled = handlers.compiler().compile(&parse_query_string(&query));
            let filter = handlers.service().filter_for(&compiled);
            println!("{}", serde_json::to_string_pretty(&compiled)?);
            println!("{filter:#?}");
        }
        Commands::Call { resource, operation, query, id, body, grant } => {
            let backend = Backend::in_memory(config)?;
            let target = lookup(&backend, &resource)?;
            let op = parse_operation(&operation)?;
            if op.takes_id() && id.is_none() {
                return Err(format!("operation '{op}' needs --id").into());
            }
            let mut req = Request::new().with_query(&query);
            if let Some(id) = id {
                req = req.with_id(id);
            }
            if let Some(body) = body {
                req = req.with_body(serde_json::from_str(&body)?);
            }
            if let Some(grant) = grant {
                req = req.granted(parse_permissions(&grant)?);
            }
            let resp = target.dispatch(op, &req);
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
