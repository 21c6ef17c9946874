use ledger_reader::detector::{GridDetector, GridTarget};
use ledger_reader::image::ImageU8;

fn main() {
    // Demo stub: a synthetic ruled page with 4 rows and 3 columns
    let (w, h) = (300usize, 200usize);
    let mut gray = vec![240u8; w * h];
    for y in [50usize, 100, 150] {
        gray[y * w..(y + 1) * w].fill(20);
    }
    for x in [100usize, 200] {
        for y in 0..h {
            gray[y * w + x] = 20;
        }
    }
    let img = ImageU8 {
        w,
        h,
        stride: w,
        data: &gray,
    };

    match GridDetector::default().detect(&img, GridTarget::new(3)) {
        Ok(det) => println!(
            "ys={:?} xs={:?} confidence={:.2} latency_ms={:.3}",
            det.grid.ys,
            det.grid.xs,
            det.grid.confidence(),
            det.stage.elapsed_ms
        ),
        Err(err) => eprintln!("detection failed: {err}"),
    }
}
