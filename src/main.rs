use log::{debug, error, info};

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use svd2hwreg::config::SourceType;
use svd2hwreg::generate::device::DeviceOutput;
use svd2hwreg::{load_from, Config};

fn parse_configs(app: Command) -> Result<Config> {
    use irx_config::parsers::{cmd, toml};
    use irx_config::ConfigBuilder;
    let irxconfig = ConfigBuilder::default()
        .append_parser(cmd::ParserBuilder::new(app).exit_on_error(true).build()?)
        .append_parser(
            toml::ParserBuilder::default()
                .default_path("svd2hwreg.toml")
                .path_option("config")
                .ignore_missing_file(true)
                .build()?,
        )
        .load()?;

    irxconfig.get().map_err(Into::into)
}

fn run() -> Result<()> {
    use std::io::Read;

    let app = Command::new("svd2hwreg")
        .about("Generate a C++ hardware register header from SVD files")
        .arg(
            Arg::new("input")
                .help("Input SVD file")
                .short('i')
                .action(ArgAction::Set)
                .value_name("FILE"),
        )
        .arg(
            Arg::new("output_dir")
                .long("output-dir")
                .help("Directory to place generated files")
                .short('o')
                .action(ArgAction::Set)
                .value_name("PATH"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .help("Name of the generated header [default: header.hpp]")
                .action(ArgAction::Set)
                .value_name("FILE"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config TOML file")
                .short('c')
                .action(ArgAction::Set)
                .value_name("TOML_FILE"),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .help("Alias of the hardware_registers namespace [default: hr]")
                .action(ArgAction::Set)
                .value_name("NAME"),
        )
        .arg(
            Arg::new("include")
                .long("include")
                .help("Header providing hardware_registers [default: hardware_registers.hpp]")
                .action(ArgAction::Set)
                .value_name("PATH"),
        )
        .arg(
            Arg::new("instance_rule")
                .long("instance-rule")
                .help("Which peripheral names are numbered instances without field constants")
                .action(ArgAction::Set)
                .value_parser(["trailing-digit", "trailing-nonzero-digit", "never"]),
        )
        .arg(
            Arg::new("emit_directives")
                .long("emit-directives")
                .action(ArgAction::SetTrue)
                .help("Also write the layout and constant directives as JSON"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Make advanced checks due to parsing SVD"),
        )
        .arg(
            Arg::new("log_level")
                .long("log")
                .short('l')
                .help(format!(
                    "Choose which messages to log (overrides {})",
                    env_logger::DEFAULT_FILTER_ENV
                ))
                .action(ArgAction::Set)
                .value_parser(["off", "error", "warn", "info", "debug", "trace"]),
        )
        .version(concat!(
            env!("CARGO_PKG_VERSION"),
            include_str!(concat!(env!("OUT_DIR"), "/commit-info.txt"))
        ));

    let mut config = match parse_configs(app) {
        Ok(config) => {
            setup_logging(&config.log_level);
            config
        }
        Err(e) => {
            setup_logging(&None);
            return Err(e);
        }
    };
    debug!("Instance rule: {:?}", config.instance_rule);

    let input = &mut String::new();
    match config.input.as_ref() {
        Some(file) => {
            config.source_type = SourceType::from_path(file);
            let path = file.as_path();
            File::open(path)
                .context("Cannot open the SVD file")?
                .read_to_string(input)
                .context("Cannot read the SVD file")?;
        }
        None => {
            let stdin = std::io::stdin();
            stdin
                .lock()
                .read_to_string(input)
                .context("Cannot read from stdin")?;
        }
    }

    let path = config.output_dir.as_deref().unwrap_or(Path::new("."));

    info!("Parsing device from SVD file");
    let device = load_from(input, &config).context("Error loading SVD file")?;
    info!(
        "Loaded {} with {} peripherals",
        device.name,
        device.peripherals.len()
    );

    info!("Rendering device");
    let generation = svd2hwreg::render(&device, &config)?;

    let header = path.join(config.output());
    File::create(&header)
        .with_context(|| format!("Cannot create {}", header.display()))?
        .write_all(generation.header.as_bytes())
        .context("Cannot write the header")?;

    if config.emit_directives {
        write_directives(path, &generation.directives)?;
    }

    Ok(())
}

#[cfg(feature = "json")]
fn write_directives(path: &Path, directives: &DeviceOutput) -> Result<()> {
    let file = path.join("directives.json");
    let json = serde_json::to_string_pretty(directives).context("Cannot serialize directives")?;
    File::create(&file)
        .with_context(|| format!("Cannot create {}", file.display()))?
        .write_all(json.as_bytes())
        .context("Cannot write directives")?;
    Ok(())
}

#[cfg(not(feature = "json"))]
fn write_directives(_path: &Path, _directives: &DeviceOutput) -> Result<()> {
    anyhow::bail!("svd2hwreg was built without the `json` feature")
}

fn setup_logging(log_level: &Option<String>) {
    // * Log at info by default.
    // * Allow users the option of setting complex logging filters using
    //   env_logger's `RUST_LOG` environment variable.
    // * Override both of those if the logging level is set via the `--log`
    //   command line argument.
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info");
    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp(None);

    let log_lvl_from_env = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();

    if log_lvl_from_env {
        log::set_max_level(log::LevelFilter::Trace);
    } else {
        let level = log_level
            .as_deref()
            .and_then(|lvl| lvl.parse().ok())
            .unwrap_or(log::LevelFilter::Info);
        log::set_max_level(level);
        builder.filter_level(level);
    }

    builder.init();
}

fn main() {
    if let Err(ref e) = run() {
        error!("{:?}", e);

        process::exit(1);
    }
}
