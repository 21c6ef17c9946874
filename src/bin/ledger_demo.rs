use ledger_reader::config::{load_config, DemoConfig};
use ledger_reader::image::io::{load_grayscale_image, write_json_file};
use ledger_reader::normalize::{NameDictionary, Normalizer};
use ledger_reader::pipeline::{PagePipeline, PageRequest};
use ledger_reader::recognize::{CellExtractor, TesseractCli};
use ledger_reader::types::PageResult;
use ledger_reader::validation::LedgerStore;
use ledger_reader::LedgerError;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), LedgerError> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "ledger_demo".to_string());
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| LedgerError::Config(format!("Usage: {program} <config.json>")))?;
    let config = load_config(&config_path)?;

    let gray = load_grayscale_image(&config.input)?;
    let pipeline = build_pipeline(&config)?;
    let request = PageRequest {
        page_id: config.page_id(),
        book_id: config.book_id,
        image: gray.as_view(),
        expected_columns: config.expected_columns,
        expected_rows: config.expected_rows,
        sacrament: config.sacrament,
    };

    let result = match &config.output.database {
        Some(path) => {
            let store = LedgerStore::open(path)?;
            let result = pipeline.process_into(&request, &store)?;
            if config.output.format.includes_text() {
                println!("Pending tuples stored in {}", path.display());
            }
            result
        }
        None => pipeline.process(&request)?,
    };

    if config.output.format.includes_text() {
        print_text_summary(&result);
    }
    if config.output.format.includes_json() {
        match &config.output.json_out {
            Some(path) => {
                write_json_file(path, &result)?;
                println!("JSON report written to {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&result)?),
        }
    }
    Ok(())
}

fn build_pipeline(config: &DemoConfig) -> Result<PagePipeline, LedgerError> {
    let engine = match &config.engine.binary {
        Some(path) => TesseractCli::with_binary(path, &config.engine.lang),
        None => TesseractCli::locate(&config.engine.lang)?,
    };
    let extractor = CellExtractor::with_engine(config.params.extract.clone(), Arc::new(engine));
    let dictionary = NameDictionary::load(&config.dictionary)?;
    let normalizer = Normalizer::new(config.params.normalize.clone(), dictionary);
    Ok(PagePipeline::new(config.params.clone(), extractor, normalizer))
}

fn print_text_summary(result: &PageResult) {
    let report = &result.report;
    println!("Page {} ({})", result.page.page_id, result.page.sacrament);
    println!("  {}", report.summary());
    println!(
        "  grid: {} rows x {} columns, confidence {:.2}{}",
        result.grid.rows(),
        result.grid.columns(),
        result.grid.confidence(),
        if result.grid.is_lossy() { " (fallback geometry, consider re-scanning)" } else { "" }
    );
    for stage in &report.timings.stages {
        println!("  {:<8} {:>9.2} ms", stage.label, stage.elapsed_ms);
    }
    println!();
    for tuple in &result.tuples {
        println!(
            "  {:>3} [{:.2}] {}",
            tuple.row_number,
            tuple.overall_quality,
            tuple.texts().join(" | ")
        );
    }
}
