use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mpqtree::{
    Graph, NicePathDecomposition, Recognition, Recognizer, RecognizerConfig, Vertex, Witness,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mpqtree", about = "Interval graph recognition on modified PQ-trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide whether a graph is an interval graph and print its model.
    Recognize {
        /// Edge list (`u v` per line, a lone id for an isolated vertex).
        edges: PathBuf,
        /// Insertion order (whitespace-separated ids); computed when absent.
        #[arg(long)]
        order: Option<PathBuf>,
        /// Check tree invariants after every vertex and the final model.
        #[arg(long)]
        verify: bool,
    },
    /// Print a nice path decomposition of an interval graph.
    Decompose {
        /// Edge list (`u v` per line, a lone id for an isolated vertex).
        edges: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recognize {
            edges,
            order,
            verify,
        } => run_recognize(edges, order, verify)?,
        Commands::Decompose { edges } => run_decompose(edges)?,
    }

    Ok(())
}

fn run_recognize(edges_path: PathBuf, order_path: Option<PathBuf>, verify: bool) -> Result<()> {
    let graph = read_edge_file(&edges_path)?;
    let config = RecognizerConfig::default()
        .with_verify_invariants(verify)
        .with_verify_representation(verify);
    let recognizer = Recognizer::new(&graph, config);

    let recognition = match order_path {
        Some(path) => {
            let order = read_order_file(&path)?;
            recognizer
                .run_with_order(order)
                .with_context(|| format!("recognition failed with order {}", path.display()))?
        }
        None => recognizer.run().context("recognition failed")?,
    };

    match recognition {
        Recognition::IntervalGraph(rep) => {
            println!("interval graph: yes");
            for (v, interval) in rep.vertex_to_interval() {
                println!("{}\t{}", v, interval);
            }
        }
        Recognition::NotIntervalGraph { witness, rejection } => {
            println!("interval graph: no");
            match witness {
                Some(Witness::Hole(hole)) => println!("hole: {}", hole),
                None => println!("witness: none"),
            }
            if let Some(rejection) = rejection {
                println!("rejected vertex {}: {}", rejection.vertex, rejection.obstruction);
            }
        }
    }

    Ok(())
}

fn run_decompose(edges_path: PathBuf) -> Result<()> {
    let graph = read_edge_file(&edges_path)?;
    let recognition = Recognizer::new(&graph, RecognizerConfig::default())
        .run()
        .context("recognition failed")?;

    let Some(rep) = recognition.representation() else {
        bail!("{} is not an interval graph", edges_path.display());
    };
    let decomposition = NicePathDecomposition::from_representation(rep);
    println!("width {}", decomposition.width());
    print!("{}", decomposition);

    Ok(())
}

fn read_edge_file(path: &Path) -> Result<Graph> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open edge file {}", path.display()))?,
    );

    let mut graph = Graph::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let ids = parse_ids(content)
            .with_context(|| format!("{}:{}: invalid vertex id", path.display(), idx + 1))?;
        match ids.as_slice() {
            [v] => graph.add_vertex(*v),
            [u, v] => graph
                .add_edge(*u, *v)
                .with_context(|| format!("{}:{}: invalid edge", path.display(), idx + 1))?,
            _ => bail!(
                "{}:{}: expected one or two vertex ids, found {}",
                path.display(),
                idx + 1,
                ids.len()
            ),
        }
    }

    Ok(graph)
}

fn read_order_file(path: &Path) -> Result<Vec<Vertex>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read order file {}", path.display()))?;
    let content: String = contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ");
    parse_ids(&content).with_context(|| format!("invalid vertex id in {}", path.display()))
}

fn parse_ids(text: &str) -> Result<Vec<Vertex>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<Vertex>()
                .with_context(|| format!("`{}` is not a vertex id", token))
        })
        .collect()
}
