//! Level 0 Demo: from circuits to a submittable job
//!
//! Builds a Bell pair, a two-qubit superposition and a teleportation circuit,
//! lists the catalog's local backends, and assembles the same circuits for a
//! local simulator (structured payload) and for a remote device (circuit
//! text).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quill_demos::circuits::{bell, demo_library, superpositions, teleport};
use quill_demos::{print_header, print_info, print_result, print_section, print_success};
use quill_ir::Circuit;
use quill_job::{
    AssemblerConfig, BackendCatalog, BackendConfiguration, BackendFilter, JobAssembler,
    JobCircuit, QuantumJob,
};

#[derive(Parser, Debug)]
#[command(name = "demo-level0")]
#[command(about = "Assemble a few circuits into jobs for local and remote backends")]
struct Args {
    /// YAML assembler configuration (QUILL_* variables still override it)
    #[arg(short, long, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Shots per circuit, overriding the configuration
    #[arg(short, long)]
    shots: Option<u32>,

    /// Seed recorded in every circuit config
    #[arg(long)]
    seed: Option<u64>,

    /// Name of the remote device
    #[arg(long, default_value = "ibmqx5")]
    remote: String,

    /// Print the compiled payloads
    #[arg(long)]
    show_payloads: bool,

    /// Leave compilation to the backend
    #[arg(long)]
    do_compile: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    print_header("Quill Level 0: Circuits to Jobs");

    let config = AssemblerConfig::load(args.config.as_deref())
        .context("failed to load assembler configuration")?;
    let mut assembler = JobAssembler::with_config(config).do_compile(args.do_compile);
    if let Some(shots) = args.shots {
        assembler = assembler.shots(shots);
    }
    if let Some(seed) = args.seed {
        assembler = assembler.seed(seed);
    }
    print_result("Basis", &assembler.config().basis_gates);
    print_result("Shots", assembler.config().shots);

    let library = demo_library()?;
    let circuits: Vec<Circuit> = vec![bell()?, superpositions()?, teleport(library)?];
    let names: Vec<String> = circuits.iter().map(|c| c.name().to_string()).collect();
    let assembler = assembler.names(names);

    print_section("Backends");
    let mut catalog = BackendCatalog::local_simulators();
    catalog.register(BackendConfiguration::remote(&args.remote));
    let local_names = catalog.available(BackendFilter {
        local: Some(true),
        simulator: None,
    });
    let remote_names = catalog.available(BackendFilter {
        local: Some(false),
        simulator: Some(false),
    });
    print_result("Local", local_names.join(", "));
    print_result("Remote", remote_names.join(", "));

    for backend_name in ["local_qasm_simulator", args.remote.as_str()] {
        let backend = catalog
            .get(backend_name)
            .with_context(|| format!("backend '{backend_name}' is not registered"))?;

        let inputs: Vec<JobCircuit> = circuits.iter().cloned().map(JobCircuit::from).collect();
        let job = QuantumJob::new(inputs, backend, &assembler)
            .with_context(|| format!("failed to assemble job for '{backend_name}'"))?;

        print_section(&format!("Job for {backend_name}"));
        print_result("Id", job.id());
        print_result("Mode", job.mode());
        print_result("Max credits", job.resources().max_credits);

        for record in &job.qobj().circuits {
            if let Some(structured) = &record.compiled_circuit {
                print_result(
                    &record.name,
                    format!("{} basis operations", structured.operations().len()),
                );
                if args.show_payloads {
                    println!("{:#}", structured.to_json()?);
                }
            } else if let Some(text) = &record.compiled_circuit_qasm {
                print_result(&record.name, format!("{} lines of circuit text", text.lines().count()));
                if args.show_payloads {
                    println!("{text}");
                }
            } else {
                print_result(&record.name, "left for the backend to compile");
            }
        }
    }

    println!();
    print_success("Level 0 demo complete!");
    print_info("Run with --show-payloads to print the compiled circuits.");
    Ok(())
}
