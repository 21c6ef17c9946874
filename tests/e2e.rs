mod common;

use common::fake_engine::{Broken, InkSpotter};
use common::init_logging;
use common::synthetic_ledger::LedgerPage;
use ledger_reader::grid::BoundarySource;
use ledger_reader::image::ImageU8;
use ledger_reader::normalize::Normalizer;
use ledger_reader::recognize::{CellExtractor, CellOutcome, ExtractParams, TextRecognizer};
use ledger_reader::validation::{LedgerStore, Submission, ValidationMachine};
use ledger_reader::{
    ColumnLayout, Estado, LedgerError, LedgerParams, PagePipeline, PageRequest, SacramentKind,
};
use std::sync::Arc;

fn pipeline_with(engine: Arc<dyn TextRecognizer>) -> PagePipeline {
    let params = LedgerParams::default();
    let extractor = CellExtractor::with_engine(params.extract.clone(), engine);
    PagePipeline::new(params, extractor, Normalizer::default())
}

fn request<'a>(page_id: &str, page: &LedgerPage, data: &'a [u8]) -> PageRequest<'a> {
    PageRequest {
        page_id: page_id.to_string(),
        book_id: 3,
        image: ImageU8 {
            w: page.width,
            h: page.height,
            stride: page.width,
            data,
        },
        expected_columns: page.columns,
        expected_rows: Some(page.rows),
        sacrament: SacramentKind::Baptism,
    }
}

#[test]
fn ten_by_ten_ledger_with_blank_cells() {
    init_logging();
    let page = LedgerPage {
        blanks: vec![(2, 4), (2, 7), (6, 5)],
        ..Default::default()
    };
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));

    let result = pipeline
        .process(&request("libro3-f12", &page, &data))
        .expect("page processed");

    assert_eq!(result.grid.rows_source, BoundarySource::Detected);
    assert_eq!(result.grid.cols_source, BoundarySource::Detected);
    assert_eq!(result.grid.columns(), 10);
    assert_eq!(result.report.segmentation.discarded_rows, 2, "top and bottom margins");
    assert_eq!(result.tuples.len(), 10);

    let layout = ColumnLayout::preset(SacramentKind::Baptism);
    for (r, tuple) in result.tuples.iter().enumerate() {
        assert_eq!(tuple.row_number, r + 1);
        assert_eq!(tuple.cells.len(), 10);
        for (c, cell) in tuple.cells.iter().enumerate() {
            let expected = if page.blanks.contains(&(r, c)) {
                ""
            } else if layout.columns[c].role.is_numeric() {
                "12"
            } else {
                "MARIA"
            };
            assert_eq!(cell.text, expected, "row {r} col {c}");
        }
        let quality = match r {
            2 => 0.8,
            6 => 0.9,
            _ => 1.0,
        };
        assert!(
            (tuple.overall_quality - quality).abs() < 1e-6,
            "row {r}: {}",
            tuple.overall_quality
        );
    }
    assert_eq!(result.tuples[2].cells[4].outcome, CellOutcome::Blank);

    let progress = pipeline.progress().snapshot();
    assert_eq!(progress.total, 100);
    assert_eq!(progress.processed, 100);
    assert_eq!(result.report.extraction.recognized, 97);
    assert_eq!(result.report.extraction.blank, 3);
    assert!(result.report.timings.stage_ms("grid").is_some());
    assert!(result.report.timings.stage_ms("extract").is_some());
}

#[test]
fn page_margins_fold_into_the_outer_columns() {
    init_logging();
    // Table spans 60..740 on an 800 px page.
    let page = LedgerPage {
        left: 60,
        col_w: 68,
        ..Default::default()
    };
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));

    let result = pipeline.process(&request("margins", &page, &data)).unwrap();
    assert_eq!(result.grid.cols_source, BoundarySource::Detected);
    let xs = &result.grid.xs;
    assert_eq!(xs.len(), 11);
    assert_eq!((xs[0], xs[10]), (0, 800));
    for (k, &x) in xs[1..10].iter().enumerate() {
        let rule = (page.left + (k + 1) * page.col_w) as i64;
        assert!((x as i64 - rule).abs() <= 2, "boundary {k}: {x} vs rule {rule}");
    }

    assert_eq!(result.tuples.len(), 10);
    for tuple in &result.tuples {
        assert!(tuple.cells.iter().all(|c| !c.text.is_empty()), "row {}", tuple.row_number);
        assert!((tuple.overall_quality - 1.0).abs() < 1e-6);
    }
}

#[test]
fn missing_column_rules_fall_back_to_layout_ratios() {
    init_logging();
    let page = LedgerPage {
        draw_column_rules: false,
        ..Default::default()
    };
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));

    let result = pipeline.process(&request("unruled", &page, &data)).unwrap();
    assert_eq!(result.grid.rows_source, BoundarySource::Detected);
    assert_eq!(result.grid.cols_source, BoundarySource::Fallback);
    assert!(result.grid.is_lossy());
    assert_eq!(result.report.grid.confidence, 0.5);
    assert_eq!(result.grid.xs.len(), 11);
    assert_eq!(result.tuples.len(), 10);
}

#[test]
fn unrecoverable_grid_is_a_structure_failure() {
    init_logging();
    let blank = vec![250u8; 400 * 300];
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));
    let req = PageRequest {
        page_id: "blank".into(),
        book_id: 1,
        image: ImageU8 {
            w: 400,
            h: 300,
            stride: 400,
            data: &blank,
        },
        expected_columns: 10,
        expected_rows: None,
        sacrament: SacramentKind::Baptism,
    };
    let err = pipeline.process(&req).unwrap_err();
    assert!(err.is_structural(), "{err}");
    assert_eq!(pipeline.progress().snapshot().total, 0);
}

#[test]
fn engine_failures_become_empty_cells() {
    init_logging();
    let page = LedgerPage::default();
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(Broken));

    let result = pipeline.process(&request("broken", &page, &data)).unwrap();
    assert_eq!(result.tuples.len(), 10);
    assert!(result
        .tuples
        .iter()
        .all(|t| t.overall_quality == 0.0 && t.cells.iter().all(|c| c.text.is_empty())));
    assert_eq!(result.report.extraction.failed, 100);
    assert!(result.report.extraction.engine_errors >= 100);
}

#[test]
fn batch_pages_run_in_parallel_with_shared_progress() {
    init_logging();
    let page = LedgerPage::default();
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));
    let requests = vec![
        request("f1", &page, &data),
        request("f2", &page, &data),
        request("f3", &page, &data),
    ];

    let results = pipeline.process_batch(&requests);
    assert_eq!(results.len(), 3);
    for (res, id) in results.iter().zip(["f1", "f2", "f3"]) {
        let res = res.as_ref().expect("page processed");
        assert_eq!(res.page.page_id, id);
        assert_eq!(res.tuples.len(), 10);
    }
    assert_eq!(pipeline.progress().snapshot().processed, 300);
    assert_eq!(pipeline.progress().fraction(), 1.0);
}

#[test]
fn batch_pages_land_in_one_store() {
    init_logging();
    let page = LedgerPage::default();
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));
    let store = LedgerStore::open_in_memory().unwrap();
    let requests = vec![request("f4", &page, &data), request("f5", &page, &data)];

    let results = pipeline.process_batch_into(&requests, &store);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(store.page_tuples("f4").unwrap().len(), 10);
    assert_eq!(store.page_tuples("f5").unwrap().len(), 10);
}

#[test]
fn resubmitted_page_replaces_only_pending_tuples() {
    init_logging();
    let page = LedgerPage::default();
    let data = page.render();
    let pipeline = pipeline_with(Arc::new(InkSpotter::default()));
    let store = Arc::new(LedgerStore::open_in_memory().unwrap());

    pipeline
        .process_into(&request("f7", &page, &data), store.as_ref())
        .unwrap();
    let tuples = store.page_tuples("f7").unwrap();
    assert_eq!(tuples.len(), 10);
    assert!(tuples.iter().all(|t| t.estado == Estado::Pending));

    // Review the first row, correcting its dates into a real calendar date.
    let mut cells = tuples[0].cells.clone();
    cells[3] = "3".into();
    cells[4] = "4".into();
    cells[5] = "1887".into();
    cells[6] = "10".into();
    cells[7] = "4".into();
    cells[8] = "1887".into();
    let machine = ValidationMachine::new(Arc::clone(&store));
    let outcome = machine
        .validate(
            tuples[0].id,
            &Submission {
                institution_id: 1,
                reviewer_id: 9,
                cells,
            },
        )
        .unwrap();
    assert_eq!(outcome.estado, Estado::Corrected);
    assert_eq!(outcome.next_pending_row, Some(2));

    pipeline
        .process_into(&request("f7", &page, &data), store.as_ref())
        .unwrap();
    let again = store.page_tuples("f7").unwrap();
    assert_eq!(again.len(), 10);
    assert_eq!(again[0].id, tuples[0].id);
    assert_eq!(again[0].estado, Estado::Corrected);
    assert!(again[1..].iter().all(|t| t.estado == Estado::Pending));
    assert_eq!(store.person_count().unwrap(), 1);
}

#[test]
fn busy_page_error_names_the_page() {
    let err = LedgerError::PageBusy("f1".into());
    assert_eq!(err.to_string(), "page f1 is already being processed");
}
