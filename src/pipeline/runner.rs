use super::params::LedgerParams;
use super::progress::Progress;
use crate::cells::{CellImage, CellSegmenter};
use crate::detector::{GridDetector, GridTarget};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{ExtractionStage, InputDescriptor, PageReport, TimingBreakdown};
use crate::enhance::CellEnhancer;
use crate::error::{LedgerError, Result};
use crate::image::ImageU8;
use crate::layout::SacramentKind;
use crate::normalize::Normalizer;
use crate::recognize::{CellExtractor, CellOutcome, CellRole};
use crate::types::{CellValue, PageMeta, PageResult, TupleCandidate};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Page to process plus the caller's expectations about it.
#[derive(Clone, Debug)]
pub struct PageRequest<'a> {
    pub page_id: String,
    pub book_id: i64,
    pub image: ImageU8<'a>,
    pub expected_columns: usize,
    /// Needed only when rows must be recovered by uniform split.
    pub expected_rows: Option<usize>,
    pub sacrament: SacramentKind,
}

/// Persistence callback receiving a page's fresh tuples.
pub trait TupleSink {
    /// Replace the page's pending tuples with `tuples`, returning how many
    /// were stored. Tuples already reviewed are left untouched.
    fn replace_pending(&self, page: &PageMeta, tuples: &[TupleCandidate]) -> Result<usize>;
}

/// Removes the page id from the in-flight set when dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    page_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.page_id);
        }
    }
}

/// End-to-end page processor.
pub struct PagePipeline {
    params: LedgerParams,
    detector: GridDetector,
    segmenter: CellSegmenter,
    enhancer: CellEnhancer,
    extractor: CellExtractor,
    normalizer: Normalizer,
    progress: Arc<Progress>,
    in_flight: Mutex<HashSet<String>>,
}

impl PagePipeline {
    /// The extractor and normalizer carry their own parameters; those replace
    /// `params.extract` and `params.normalize` so [`params`](Self::params)
    /// reports what actually runs.
    pub fn new(mut params: LedgerParams, extractor: CellExtractor, normalizer: Normalizer) -> Self {
        params.extract = extractor.params().clone();
        params.normalize = normalizer.params().clone();
        Self {
            detector: GridDetector::new(params.grid.clone()),
            segmenter: CellSegmenter::new(params.segment.clone()),
            enhancer: CellEnhancer::new(params.enhance.clone()),
            extractor,
            normalizer,
            params,
            progress: Arc::new(Progress::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    /// Shared progress handle for pollers.
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    pub fn process(&self, request: &PageRequest<'_>) -> Result<PageResult> {
        let _guard = self.claim(&request.page_id)?;
        self.run(request)
    }

    /// Process and hand the tuples to `sink` while the page is still claimed,
    /// so a concurrent re-submission cannot interleave with the write.
    pub fn process_into(&self, request: &PageRequest<'_>, sink: &dyn TupleSink) -> Result<PageResult> {
        let _guard = self.claim(&request.page_id)?;
        let result = self.run(request)?;
        let stored = sink.replace_pending(&result.page, &result.tuples)?;
        debug!(
            "PagePipeline::process_into page={} stored {} pending tuples",
            request.page_id, stored
        );
        Ok(result)
    }

    /// Independent pages in parallel; one result per request, in order.
    pub fn process_batch(&self, requests: &[PageRequest<'_>]) -> Vec<Result<PageResult>> {
        requests.par_iter().map(|r| self.process(r)).collect()
    }

    pub fn process_batch_into<S>(&self, requests: &[PageRequest<'_>], sink: &S) -> Vec<Result<PageResult>>
    where
        S: TupleSink + Sync,
    {
        requests
            .par_iter()
            .map(|r| self.process_into(r, sink))
            .collect()
    }

    fn claim(&self, page_id: &str) -> Result<InFlight<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| LedgerError::InvalidInput("in-flight registry poisoned".to_string()))?;
        if !set.insert(page_id.to_string()) {
            return Err(LedgerError::PageBusy(page_id.to_string()));
        }
        Ok(InFlight {
            set: &self.in_flight,
            page_id: page_id.to_string(),
        })
    }

    fn run(&self, req: &PageRequest<'_>) -> Result<PageResult> {
        let total_start = Instant::now();
        let mut timings = TimingBreakdown::default();
        let layout = self.params.layout(req.sacrament);
        let layout = layout.for_columns(req.expected_columns);
        if layout.is_none() {
            debug!(
                "PagePipeline::process page={} no {} layout with {} columns, roles estimated from width",
                req.page_id, req.sacrament, req.expected_columns
            );
        }
        let ratios = layout.map(|l| l.width_ratios());

        let stage_start = Instant::now();
        let target = GridTarget::new(req.expected_columns)
            .with_rows(req.expected_rows)
            .with_column_ratios(ratios.as_deref());
        let detection = self.detector.detect(&req.image, target).map_err(|e| {
            warn!("PagePipeline::process page={} grid failure: {e}", req.page_id);
            e
        })?;
        timings.push_since("grid", stage_start);
        if detection.grid.is_lossy() {
            warn!(
                "PagePipeline::process page={} grid is a fallback estimate (confidence {:.2})",
                req.page_id,
                detection.grid.confidence()
            );
        }

        let stage_start = Instant::now();
        let segmentation = self.segmenter.segment(&detection.grid, &detection.ink);
        timings.push_since("segment", stage_start);

        let stage_start = Instant::now();
        self.progress.add_total(segmentation.stage.cells);
        let mut extraction = ExtractionStage::default();
        let mut confidence_sum = 0.0f32;
        let numeric_width_ratio = self.extractor.params().numeric_width_ratio;
        let mut tuples = Vec::with_capacity(segmentation.rows.len());
        for row in &segmentation.rows {
            let mut cells = Vec::with_capacity(row.cells.len());
            for &rect in &row.cells {
                let cell = CellImage::from_page(&req.image, rect);
                let role = layout.and_then(|l| l.role(rect.col));
                let variants = self.enhancer.enhance(&cell.crop);
                let cell_role = CellRole::estimate(role, cell.width_ratio, numeric_width_ratio);
                let read = self.extractor.extract(&variants, cell_role);

                extraction.attempts += read.attempts;
                extraction.timeouts += read.timeouts;
                extraction.engine_errors += read.engine_errors;
                extraction.short_circuits += usize::from(read.short_circuit);
                match read.outcome {
                    CellOutcome::Recognized => extraction.recognized += 1,
                    CellOutcome::Blank => extraction.blank += 1,
                    CellOutcome::Skipped => extraction.skipped += 1,
                    CellOutcome::Failed => extraction.failed += 1,
                }
                confidence_sum += read.confidence();

                let text =
                    self.normalizer
                        .normalize_field(read.text(), role, Some(rect.aspect_ratio()));
                cells.push(CellValue {
                    confidence: if text.is_empty() { 0.0 } else { read.confidence() },
                    text,
                    outcome: read.outcome,
                    variant: read.best.as_ref().map(|c| c.variant),
                });
                self.progress.advance(1);
            }
            tuples.push(TupleCandidate::new(row.index + 1, cells));
        }
        extraction.cells = segmentation.stage.cells;
        if extraction.cells > 0 {
            extraction.mean_confidence = confidence_sum / extraction.cells as f32;
        }
        extraction.elapsed_ms = elapsed_ms(stage_start);
        timings.push("extract", extraction.elapsed_ms);
        timings.total_ms = elapsed_ms(total_start);

        let report = PageReport {
            input: InputDescriptor {
                page_id: req.page_id.clone(),
                width: req.image.w,
                height: req.image.h,
                expected_columns: req.expected_columns,
                expected_rows: req.expected_rows,
                sacrament: req.sacrament,
            },
            timings,
            grid: detection.stage,
            segmentation: segmentation.stage,
            extraction,
        };
        info!("PagePipeline::process page={} {}", req.page_id, report.summary());

        Ok(PageResult {
            page: PageMeta {
                page_id: req.page_id.clone(),
                book_id: req.book_id,
                sacrament: req.sacrament,
                columns: detection.grid.columns(),
            },
            tuples,
            grid: detection.grid,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::{ExtractParams, OcrConfig, RecognizeError, TextRecognizer};
    use image::GrayImage;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Reads "12" from any crop holding a dark pixel, optionally slowly.
    struct Stub {
        delay: Duration,
        started: AtomicBool,
    }

    impl TextRecognizer for Stub {
        fn name(&self) -> &str {
            "stub"
        }
        fn recognize(&self, image: &GrayImage, _: &OcrConfig) -> std::result::Result<String, RecognizeError> {
            self.started.store(true, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(if image.pixels().any(|p| p.0[0] < 128) { "12".into() } else { String::new() })
        }
    }

    fn pipeline(delay_ms: u64) -> (PagePipeline, Arc<Stub>) {
        let stub = Arc::new(Stub {
            delay: Duration::from_millis(delay_ms),
            started: AtomicBool::new(false),
        });
        let extract = ExtractParams {
            engine_timeout_ms: 0,
            ..Default::default()
        };
        let extractor = CellExtractor::with_engine(extract, stub.clone());
        (
            PagePipeline::new(LedgerParams::default(), extractor, Normalizer::default()),
            stub,
        )
    }

    /// 3x2 ruled page with one short flat stroke in the first cell of each row.
    fn page() -> (usize, usize, Vec<u8>) {
        let (w, h) = (240usize, 120usize);
        let mut img = vec![245u8; w * h];
        for y in [0usize, 40, 80, 119] {
            img[y * w..(y + 1) * w].fill(10);
        }
        for x in [0usize, 120, 239] {
            for y in 0..h {
                img[y * w + x] = 10;
            }
        }
        for row in 0..3 {
            for y in 18 + row * 40..22 + row * 40 {
                for x in 50..70 {
                    img[y * w + x] = 30;
                }
            }
        }
        (w, h, img)
    }

    fn request<'a>(id: &str, w: usize, h: usize, data: &'a [u8]) -> PageRequest<'a> {
        PageRequest {
            page_id: id.to_string(),
            book_id: 1,
            image: ImageU8 { w, h, stride: w, data },
            expected_columns: 2,
            expected_rows: Some(3),
            sacrament: SacramentKind::Baptism,
        }
    }

    #[test]
    fn small_page_yields_one_tuple_per_row() {
        let (pipe, _) = pipeline(0);
        let (w, h, data) = page();
        let res = pipe.process(&request("p1", w, h, &data)).unwrap();
        assert_eq!(res.tuples.len(), 3);
        for (i, t) in res.tuples.iter().enumerate() {
            assert_eq!(t.row_number, i + 1);
            assert_eq!(t.cells.len(), 2);
            assert_eq!(t.texts(), vec!["12".to_string(), String::new()]);
            assert!((t.overall_quality - 0.5).abs() < 1e-6);
        }
        let snap = pipe.progress().snapshot();
        assert_eq!(snap, crate::pipeline::ProgressSnapshot { processed: 6, total: 6 });
        assert_eq!(res.report.extraction.recognized, 3);
    }

    #[test]
    fn params_report_the_running_extractor() {
        let (pipe, _) = pipeline(0);
        assert_eq!(pipe.params().extract.engine_timeout_ms, 0);
        assert_eq!(
            pipe.params().normalize.similarity_threshold,
            Normalizer::default().params().similarity_threshold
        );
    }

    #[test]
    fn same_page_twice_in_flight_is_busy() {
        let (pipe, stub) = pipeline(30);
        let (w, h, data) = page();
        thread::scope(|s| {
            let first = s.spawn(|| pipe.process(&request("p1", w, h, &data)));
            while !stub.started.load(Ordering::SeqCst) {
                thread::yield_now();
            }
            let second = pipe.process(&request("p1", w, h, &data));
            assert!(matches!(second, Err(LedgerError::PageBusy(id)) if id == "p1"));
            assert!(first.join().unwrap().is_ok());
        });
        // released afterwards
        assert!(pipe.process(&request("p1", w, h, &data)).is_ok());
    }

    #[test]
    fn batch_keeps_request_order() {
        let (pipe, _) = pipeline(0);
        let (w, h, data) = page();
        let reqs = vec![request("a", w, h, &data), request("b", w, h, &data)];
        let out = pipe.process_batch(&reqs);
        let ids: Vec<_> = out.iter().map(|r| r.as_ref().unwrap().page.page_id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
