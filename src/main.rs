use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stack_verify::serial::{self, SerialChannel};
use stack_verify::{compile, diff, expect, verify, Config, Image, Simulator};

/// Exit code for a full pass.
const EXIT_SUCCESS: i32 = 0;
/// Exit code for any failed check.
const EXIT_FAILURE: i32 = 1;

// Deploy and verify stack machine programs on the FPGA and in the simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the hardware defaults header
    #[arg(long, default_value = "../hw/defaults.vh")]
    defaults: PathBuf,

    /// Hardware toolchain directory holding the simulator make targets
    #[arg(long, default_value = "../hw")]
    toolchain: PathBuf,

    /// External assembler binary
    #[arg(long, default_value = "../tools/target/debug/as")]
    assembler: PathBuf,

    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy an assembled binary to the device and dump its memory
    Deploy {
        /// The port the FPGA is on. Leave blank for auto.
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate (Hz)
        #[arg(short, long, default_value_t = 115200)]
        baudrate: u32,

        /// Max timeout (s) for a response
        #[arg(short, long, default_value_t = 2.0)]
        timeout: f64,

        /// Number of bits used for addresses (default from the header)
        #[arg(short = 'r', long)]
        address_bits: Option<u32>,

        /// Number of bits per word (default from the header)
        #[arg(short = 'd', long)]
        data_bits: Option<u32>,

        /// Highlight the top of the stack
        #[arg(short = 'l', long)]
        highlight: bool,

        /// Number of cells to expect (default from the header)
        #[arg(short, long)]
        cells: Option<usize>,

        /// The binary file to deploy (an empty program if omitted)
        path: Option<PathBuf>,
    },
    /// Test a program in the simulator and on the FPGA
    TestProgram {
        /// The port the FPGA is on. Leave blank for auto.
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate (Hz)
        #[arg(short, long, default_value_t = 115200)]
        baudrate: u32,

        /// Max timeout (s) for a response
        #[arg(short, long, default_value_t = 2.0)]
        timeout: f64,

        /// Number of cells to expect (default from the header)
        #[arg(short, long)]
        cells: Option<usize>,

        /// The source for the test file
        path: PathBuf,
    },
    /// Test a program in the simulator only, printing `cycles,size`
    TestSim {
        /// Number of cells to expect (default from the header)
        #[arg(short, long)]
        cells: Option<usize>,

        /// The source for the test file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()),
        )
        .with_target(false)
        .init();

    let code = run(&args)?;
    std::process::exit(code);
}

fn run(args: &Args) -> Result<i32> {
    let config = Config::from_defaults_file(&args.defaults)
        .with_context(|| format!("could not load defaults from `{}`", args.defaults.display()))?;

    match &args.command {
        Command::Deploy {
            port,
            baudrate,
            timeout,
            address_bits,
            data_bits,
            highlight,
            cells,
            path,
        } => {
            let mut config = config;
            if let Some(bits) = address_bits {
                config.address_bits = *bits;
            }
            if let Some(bits) = data_bits {
                config.data_bits = *bits;
            }
            if let Some(n) = cells {
                config.cells = *n;
            }
            config.validate()?;
            cmd_deploy(
                &config,
                port.as_deref(),
                *baudrate,
                *timeout,
                *highlight,
                path.as_deref(),
            )
        }
        Command::TestProgram {
            port,
            baudrate,
            timeout,
            cells,
            path,
        } => {
            let mut config = config;
            if let Some(n) = cells {
                config.cells = *n;
            }
            config.validate()?;
            cmd_test_program(args, &config, port.as_deref(), *baudrate, *timeout, path)
        }
        Command::TestSim { cells, path } => {
            let mut config = config;
            if let Some(n) = cells {
                config.cells = *n;
            }
            config.validate()?;
            cmd_test_sim(args, &config, path)
        }
    }
}

fn cmd_deploy(
    config: &Config,
    port: Option<&str>,
    baudrate: u32,
    timeout: f64,
    highlight: bool,
    path: Option<&std::path::Path>,
) -> Result<i32> {
    let port = serial::resolve_port(port)?;
    println!("[PORT]\t\t{}", port);
    println!("[BAUDRATE]\t{} Hz", baudrate);
    println!("[TIMEOUT]\t{} s", timeout);
    println!(
        "[RAM]\t\tWill use {} bit addresses, {} bit words for a total of {} bytes",
        config.address_bits,
        config.data_bits,
        config.ram_bytes()
    );

    let bytes = match path {
        Some(p) => {
            std::fs::read(p).with_context(|| format!("could not read file `{}`", p.display()))?
        }
        None => Vec::new(),
    };
    let image = Image::build(bytes, config)?;

    let mut chan = SerialChannel::open(&port, baudrate, Duration::from_secs_f64(timeout))?;
    let result = serial::send_image(&mut chan, &image, config)?;

    for (i, cell) in result.cells.iter().enumerate() {
        let rendered = if highlight {
            diff::highlight_cell(cell)
        } else {
            diff::byte_string(cell.as_bytes())
        };
        println!("[CELL {}]\t{}", i, rendered);
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_test_program(
    args: &Args,
    config: &Config,
    port: Option<&str>,
    baudrate: u32,
    timeout: f64,
    path: &std::path::Path,
) -> Result<i32> {
    let port = serial::resolve_port(port)?;

    let bytes = compile::compile_program(path, &args.assembler)?;
    let image = Image::build(bytes, config)?;

    let simulator = Simulator::new(config.clone(), &args.toolchain);
    let sim_res = simulator.run(&image)?;

    // Only check as many cells as there are provided stacks
    let expected = expect::expected_stacks(path)?;
    let mut ok = verify::check_stacks(&sim_res, &expected);

    let mut chan = SerialChannel::open(&port, baudrate, Duration::from_secs_f64(timeout))?;
    let hw_res = serial::send_image(&mut chan, &image, config)?;

    if !verify::compare_cells(&sim_res, &hw_res) {
        ok = false;
    }

    Ok(if ok { EXIT_SUCCESS } else { EXIT_FAILURE })
}

fn cmd_test_sim(args: &Args, config: &Config, path: &std::path::Path) -> Result<i32> {
    let bytes = compile::compile_program(path, &args.assembler)?;
    let image = Image::build(bytes, config)?;

    let simulator = Simulator::new(config.clone(), &args.toolchain);
    let sim_res = simulator.run(&image)?;

    println!("{},{}", sim_res.cycles, sim_res.size);

    let expected = expect::expected_stacks(path)?;
    let ok = verify::check_stacks(&sim_res, &expected);

    Ok(if ok { EXIT_SUCCESS } else { EXIT_FAILURE })
}
