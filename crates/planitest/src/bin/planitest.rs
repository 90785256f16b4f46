use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use planitest::{Manifest, OmRunner, OmTarget, SystemCommandRunner};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("planitest")
        .version(planitest::VERSION)
        .about("Inspect products staged on an Ops Manager through om")
        .subcommand_required(true)
        .arg(
            Arg::new("target")
                .long("target")
                .global(true)
                .help("Ops Manager URL (defaults to $OM_URL)"),
        )
        .subcommand(Command::new("staged-products").about("List staged products as JSON"))
        .subcommand(
            Command::new("manifest")
                .about("Print the staged manifest for a product type")
                .arg(product_type_arg()),
        )
        .subcommand(
            Command::new("property")
                .about("Print one job property from the staged manifest")
                .arg(product_type_arg())
                .arg(
                    Arg::new("instance-group")
                        .long("instance-group")
                        .required(true)
                        .help("Instance group name"),
                )
                .arg(Arg::new("job").long("job").required(true).help("Job name"))
                .arg(
                    Arg::new("path")
                        .long("path")
                        .required(true)
                        .help("Property path, e.g. cc/logging_level"),
                ),
        );

    let matches = cli.get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn product_type_arg() -> Arg {
    Arg::new("product-type")
        .long("product-type")
        .required(true)
        .help("Staged product type, e.g. cf")
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let target = match matches.get_one::<String>("target") {
        Some(url) => OmTarget::new(url.clone()),
        None => OmTarget::from_env()?,
    };
    let om = OmRunner::new(SystemCommandRunner::new(), target);

    match matches.subcommand() {
        Some(("staged-products", _)) => {
            let products = om.staged_products()?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        Some(("manifest", args)) => {
            let manifest = fetch_manifest(&om, args)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Some(("property", args)) => {
            let manifest = fetch_manifest(&om, args)?;
            let group = required(args, "instance-group")?;
            let job = required(args, "job")?;
            let path = required(args, "path")?;

            let value = manifest
                .find_instance_group_job(group, job)?
                .property(path)?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

fn fetch_manifest(om: &OmRunner<SystemCommandRunner>, args: &ArgMatches) -> anyhow::Result<Manifest> {
    let product_type = required(args, "product-type")?;
    let staged = om.find_staged_product(product_type)?;
    let raw = om.get_manifest(&staged.guid)?;
    Manifest::from_value(raw).with_context(|| format!("manifest for {product_type} is malformed"))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{name} is required"))
}
