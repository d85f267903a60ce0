use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use go_annot::io::{self, SNAPSHOT_EXT};
use go_annot::logging::{self, LogConfig};
use go_annot::ontology::ancestors::AncestorResolver;
use go_annot::ontology::OntologyMeta;
use go_annot::report::expression::{self, AnnotateInputs, ExpressionOpt};
use go_annot::report::{self, ReportOpt, UNKNOWN_TERM_MARKER};

#[derive(Parser, Debug)]
#[command(name = "go-annot", author, version, about = "Gene Ontology annotation reports", arg_required_else_help = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides GO_ANNOT_LOG_LEVEL
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Log format (text, json); overrides GO_ANNOT_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse an OBO ontology and save a binary snapshot (.goidx)
    Index {
        /// GO terms file (.obo)
        obo: PathBuf,
        /// Output prefix for the snapshot
        #[arg(short, long, default_value = "go")]
        output: String,
    },
    /// Protein / GO term / ancestor report from an ontology and a GAF file
    Report {
        /// GO terms file (.obo) or snapshot (.goidx)
        ontology: PathBuf,
        /// Gene association file (.gaf)
        gaf: PathBuf,
        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Placeholder written for GO terms missing from the ontology
        #[arg(long, default_value = UNKNOWN_TERM_MARKER)]
        unknown_marker: String,
    },
    /// Print all ancestors of the given GO terms
    Ancestors {
        /// GO terms file (.obo) or snapshot (.goidx)
        ontology: PathBuf,
        /// GO term ids
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Annotate a differential expression matrix with BLAST hits and GO terms
    Annotate {
        /// BLAST tabular output (.outfmt6)
        #[arg(long)]
        blast: PathBuf,
        /// Gene association file (.gaf)
        #[arg(long)]
        gaf: PathBuf,
        /// GO terms file (.obo) or snapshot (.goidx)
        #[arg(long)]
        ontology: PathBuf,
        /// Differential expression matrix (.matrix)
        #[arg(long)]
        matrix: PathBuf,
        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Minimum BLAST percent identity (exclusive)
        #[arg(long = "min-identity", default_value_t = 95.0)]
        min_identity: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if let Some(level) = &cli.log_level {
        log_config.level = level.parse()?;
    }
    if let Some(format) = &cli.log_format {
        log_config.format = format.parse()?;
    }
    logging::init_logging(&log_config)?;

    match cli.command {
        Commands::Index { obo, output } => run_index(&obo, &output),
        Commands::Report { ontology, gaf, out, unknown_marker } => {
            check_input(&ontology, &["obo", SNAPSHOT_EXT])?;
            check_input(&gaf, &["gaf"])?;
            let opt = ReportOpt { unknown_marker };
            report::run_report(&ontology, &gaf, out.as_deref(), opt)
                .with_context(|| format!("cannot build report from '{}' and '{}'", ontology.display(), gaf.display()))?;
            Ok(())
        }
        Commands::Ancestors { ontology, terms } => {
            check_input(&ontology, &["obo", SNAPSHOT_EXT])?;
            run_ancestors(&ontology, &terms)
        }
        Commands::Annotate { blast, gaf, ontology, matrix, out, min_identity } => {
            for p in [&blast, &gaf, &ontology, &matrix] {
                check_input(p, &[])?;
            }
            if !(0.0..=100.0).contains(&min_identity) {
                bail!("--min-identity must be between 0 and 100, got {}", min_identity);
            }
            let inputs = AnnotateInputs { blast: &blast, gaf: &gaf, ontology: &ontology, matrix: &matrix };
            expression::run_annotate(&inputs, out.as_deref(), ExpressionOpt { min_identity })
                .context("cannot build expression annotation report")?;
            Ok(())
        }
    }
}

/// 文件必须存在；`exts` 非空时还要求扩展名匹配其一
fn check_input(path: &Path, exts: &[&str]) -> Result<()> {
    if !path.is_file() {
        bail!("{} not found. Check the file path and try again.", path.display());
    }
    if !exts.is_empty() {
        let ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| exts.contains(&e));
        if !ok {
            bail!("'{}' must have one of the extensions: .{}", path.display(), exts.join(", ."));
        }
    }
    Ok(())
}

fn run_index(obo: &Path, output: &str) -> Result<()> {
    check_input(obo, &["obo"])?;
    let parsed = io::load_ontology(obo).with_context(|| format!("cannot read ontology '{}'", obo.display()))?;
    if parsed.value.is_empty() {
        bail!("ontology '{}' contains no terms", obo.display());
    }
    let mut onto = parsed.value;
    let prev = onto.meta().clone();
    onto.set_meta(OntologyMeta {
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        ..prev
    });

    let out_path = format!("{}.{}", output, SNAPSHOT_EXT);
    onto.save_to_file(&out_path)
        .with_context(|| format!("cannot write snapshot to '{}'", out_path))?;
    info!(
        source = %obo.display(),
        terms = onto.len(),
        skipped = parsed.skipped.len(),
        snapshot = %out_path,
        "ontology snapshot saved"
    );
    Ok(())
}

fn run_ancestors(ontology: &Path, terms: &[String]) -> Result<()> {
    let onto = io::load_ontology(ontology)
        .with_context(|| format!("cannot read ontology '{}'", ontology.display()))?
        .value;
    let mut resolver = AncestorResolver::new(&onto);
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for term in terms {
        match resolver.resolve(term) {
            Ok(set) => {
                let joined: Vec<&str> = set.iter().copied().collect();
                writeln!(out, "{}\t{}", term, joined.join(","))?;
            }
            Err(go_annot::error::AnnotError::UnknownTerm(_)) => {
                writeln!(out, "{}\t{}", term, UNKNOWN_TERM_MARKER)?;
            }
            Err(e) => return Err(e).with_context(|| format!("cannot resolve ancestors of {}", term)),
        }
    }
    out.flush()?;
    Ok(())
}
