use anyhow::{bail, Context, Result};
use route_localizer::{
    Config, Localization, LocalizedUrlRequest, RouteTableFile, StaticSlugResolver, TargetLocale,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "Usage: route-localizer [--routes FILE] [--from LOCALE] [--show-hidden] \
[--check] [--metrics] <locale|-> <url|route>...";

struct Args {
    routes: Option<PathBuf>,
    from: Option<String>,
    show_hidden: bool,
    check: bool,
    metrics: bool,
    target: Option<String>,
    urls: Vec<String>,
}

impl Args {
    fn parse(raw: impl Iterator<Item = String>) -> Result<Self> {
        let mut args = Args {
            routes: std::env::var("ROUTES_FILE").ok().map(PathBuf::from),
            from: None,
            show_hidden: false,
            check: false,
            metrics: false,
            target: None,
            urls: Vec::new(),
        };

        let mut raw = raw.skip(1);
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--routes" => args.routes = Some(raw.next().context("--routes needs a file")?.into()),
                "--from" => args.from = Some(raw.next().context("--from needs a locale")?),
                "--show-hidden" => args.show_hidden = true,
                "--check" => args.check = true,
                "--metrics" => args.metrics = true,
                "-h" | "--help" => {
                    println!("{}", USAGE);
                    std::process::exit(0);
                }
                other if other.starts_with("--") => bail!("Unknown option '{}'\n{}", other, USAGE),
                other if args.target.is_none() => args.target = Some(other.to_string()),
                other => args.urls.push(other.to_string()),
            }
        }

        Ok(args)
    }
}

fn build_engine(routes_file: Option<&PathBuf>) -> Result<Localization> {
    let Some(path) = routes_file else {
        info!("No route table given, using LOCALIZATION_* environment only");
        let config = Config::from_env()?;
        return Ok(Localization::builder(config).build()?);
    };

    let table = RouteTableFile::load(path)?;
    info!(
        "Loaded {} routes and {} slug tables from {}",
        table.routes.len(),
        table.slugs.len(),
        path.display()
    );

    let mut builder = Localization::builder(table.config).routes(table.routes);
    for (resolver, entries) in table.slugs {
        builder = builder.slug_resolver(&resolver, Arc::new(StaticSlugResolver::new(entries)));
    }
    Ok(builder.build()?)
}

fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("route_localizer=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args())?;
    let engine = build_engine(args.routes.as_ref())?;

    if args.check {
        let report = engine.validate()?;
        for warning in &report.warnings {
            println!("warning: {}", warning);
        }
        for error in &report.errors {
            println!("error: {}", error);
        }
        info!(
            "Route table has {} routes: {} errors, {} warnings",
            engine.registry()?.len(),
            report.errors.len(),
            report.warnings.len()
        );
    }

    let Some(target) = args.target else {
        if args.check {
            return Ok(());
        }
        bail!("{}", USAGE);
    };
    let target = match target.as_str() {
        "-" => TargetLocale::Unlocalized,
        code => TargetLocale::from(code),
    };

    for url in &args.urls {
        let mut request = LocalizedUrlRequest::new(target.clone()).with_url(url);
        request.show_hidden_locale = args.show_hidden;
        request.source_locale = args.from.clone();

        let localized = engine
            .get_localized_url(&request)
            .context(format!("Failed to localize '{}'", url))?;
        println!("{}", localized);
    }

    if args.metrics {
        println!("{}", serde_json::to_string_pretty(&engine.cache_metrics())?);
    }

    Ok(())
}
