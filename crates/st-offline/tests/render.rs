//! Full pipeline runs against real files on disk.

use std::f64::consts::TAU;

use st_core::{StemBuffer, StemKind, StemSet, DELIVERY_SAMPLE_RATE};
use st_offline::{BatchRenderer, RenderConfig, UpmixJob};
use st_spatial::QualityPreset;

const FRAMES: usize = 9_600;

fn sine(freq: f64, amp: f64) -> Vec<f64> {
    (0..FRAMES)
        .map(|n| amp * (TAU * freq * n as f64 / DELIVERY_SAMPLE_RATE as f64).sin())
        .collect()
}

fn stems() -> StemSet {
    StemSet::new(
        StemBuffer::new(
            StemKind::Vocals,
            DELIVERY_SAMPLE_RATE,
            sine(440.0, 0.5),
            sine(440.0, 0.5),
        ),
        StemBuffer::new(
            StemKind::Drums,
            DELIVERY_SAMPLE_RATE,
            sine(180.0, 0.4),
            sine(220.0, 0.4),
        ),
        StemBuffer::new(
            StemKind::Bass,
            DELIVERY_SAMPLE_RATE,
            sine(55.0, 0.6),
            sine(55.0, 0.6),
        ),
        StemBuffer::new(
            StemKind::Other,
            DELIVERY_SAMPLE_RATE,
            sine(330.0, 0.3),
            sine(510.0, 0.3),
        ),
    )
}

#[test]
fn test_batch_render_writes_valid_masters() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig {
        quality: QualityPreset::Low,
        ..RenderConfig::default()
    };
    let batch = BatchRenderer::new(config).unwrap();
    let results = batch.render_all(
        vec![
            UpmixJob::new("alpha", stems()),
            UpmixJob::new("beta", stems()),
        ],
        dir.path(),
    );

    assert_eq!(results.len(), 2);
    for (job_id, result) in &results {
        let written = result.as_ref().unwrap();
        assert_eq!(written.len(), 2, "{job_id} masters");

        for path in written {
            let mut reader = hound::WavReader::open(path).unwrap();
            let spec = reader.spec();
            assert_eq!(spec.sample_rate, DELIVERY_SAMPLE_RATE);
            assert_eq!(spec.bits_per_sample, 24);
            assert!(spec.channels == 12 || spec.channels == 6);

            let count = reader.samples::<i32>().count();
            assert_eq!(count, FRAMES * spec.channels as usize);
        }
    }
}
