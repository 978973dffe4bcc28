use anyhow::{Context, Result};
use clap::Parser;
use csvcast::{
    config::ConvertOptions,
    process::{
        convert::{IntNullPolicy, TextEscape},
        CsvFile,
    },
    schema::write_structure,
    sink::{ParquetSink, TableName},
    ConvertError,
};
use std::{path::PathBuf, process::exit, time::Instant};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Infer column types from a CSV file and write it as typed Parquet"
)]
struct Args {
    /// CSV file to convert
    #[arg(short, long = "input-file")]
    input_file: PathBuf,
    /// Field separator (single character, `\t` for tab)
    #[arg(short = 'd', long = "csv-field-separator")]
    csv_field_separator: Option<String>,
    /// Schema the table belongs to
    #[arg(long = "schema-name")]
    schema_name: Option<String>,
    #[arg(short, long = "table-name")]
    table_name: String,
    /// Parquet file to create (replaced if it exists)
    #[arg(short, long = "output-file")]
    output_file: PathBuf,
    /// Rows after the first that refine the inferred types
    #[arg(long)]
    sample_limit: Option<usize>,
    /// Write 0 instead of null for empty cells in nullable int columns
    #[arg(long)]
    fill_int_nulls: bool,
    /// Backslash-escape double quotes inside text cells
    #[arg(long)]
    escape_quotes: bool,
    /// Rows per Parquet record batch
    #[arg(long)]
    batch_size: Option<usize>,
    /// uncompressed, snappy, gzip, zstd or brotli
    #[arg(long)]
    compression: Option<String>,
    /// Also write the detected structure as JSON
    #[arg(long)]
    structure_out: Option<PathBuf>,
    /// YAML file with defaults for the options above
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// File options first, then command-line flags on top.
    fn options(&self) -> Result<ConvertOptions, ConvertError> {
        let mut opts = match &self.config {
            Some(path) => ConvertOptions::from_yaml_file(path)?,
            None => ConvertOptions::default(),
        };
        if let Some(d) = &self.csv_field_separator {
            opts.delimiter = d.clone();
        }
        if let Some(n) = self.sample_limit {
            opts.sample_limit = n;
        }
        if self.fill_int_nulls {
            opts.int_nulls = IntNullPolicy::ZeroFill;
        }
        if self.escape_quotes {
            opts.text_escape = TextEscape::Quotes;
        }
        if let Some(n) = self.batch_size {
            opts.batch_size = n;
        }
        if let Some(c) = &self.compression {
            opts.compression = c.clone();
        }
        opts.validate()?;
        Ok(opts)
    }
}

fn main() {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_filter = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let start = Instant::now();
    let code = match run(&args) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            err.downcast_ref::<ConvertError>()
                .map(ConvertError::exit_code)
                .unwrap_or(1)
        }
    };
    info!("executed in {:?}", start.elapsed());
    exit(code);
}

fn run(args: &Args) -> Result<()> {
    // ─── 2) options & input ──────────────────────────────────────────
    let opts = args.options()?;
    info!(
        input = %args.input_file.display(),
        output = %args.output_file.display(),
        delimiter = %opts.delimiter,
        sample_limit = opts.sample_limit,
        "starting conversion"
    );
    let delimiter = opts.delimiter_byte().map_err(ConvertError::from)?;
    let source = CsvFile::open(&args.input_file, delimiter)?;

    // ─── 3) detect → coerce → write ──────────────────────────────────
    let table = TableName::new(args.schema_name.clone(), args.table_name.clone());
    let compression = opts.compression().map_err(ConvertError::from)?;
    let mut sink = ParquetSink::new(&args.output_file, compression, opts.batch_size);
    let report = csvcast::convert(&source, &mut sink, &table, &opts)?;

    for (col, spec) in report.structure.iter().zip(&report.schema) {
        info!(
            "column {} `{}`: {} → {}{}",
            col.ordinal,
            col.name,
            col.ty,
            spec.storage_type,
            if spec.nullable { " NULL" } else { " NOT NULL" }
        );
    }
    info!("table {} has {} rows", table, report.rows_confirmed);

    // ─── 4) optional structure dump ──────────────────────────────────
    if let Some(path) = &args.structure_out {
        write_structure(path, &report.structure, &report.schema)
            .with_context(|| format!("writing structure to {}", path.display()))?;
        info!("wrote structure {}", path.display());
    }

    Ok(())
}
