//! Offline render pipeline.
//!
//! [`RenderPipeline`] drives one job through routing, mixing,
//! normalization and the optional 5.1 fold, publishing stage progress
//! over an optional channel. [`BatchRenderer`] fans a job list out over
//! rayon; jobs are isolated, so one failure never takes down the batch.

use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use rayon::prelude::*;
use st_core::{CancelToken, StemSet};
use st_dsp::normalize;
use st_spatial::{fold_to_51, mix, MixError, RoutingMatrix};

use crate::config::RenderConfig;
use crate::encoder::{write_wav, MasterBuffer};
use crate::error::{OfflineError, OfflineResult};
use crate::job::{ProgressEvent, Stage, UpmixJob};

/// The deliverables of one rendered job
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub surround714: Option<MasterBuffer>,
    pub surround51: Option<MasterBuffer>,
}

impl RenderOutput {
    pub fn masters(&self) -> impl Iterator<Item = &MasterBuffer> {
        self.surround714.iter().chain(self.surround51.iter())
    }
}

pub struct RenderPipeline {
    config: RenderConfig,
    cancel: CancelToken,
    progress: Option<Sender<ProgressEvent>>,
    stage: RwLock<Option<Stage>>,
}

impl RenderPipeline {
    pub fn new(config: RenderConfig) -> OfflineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
            progress: None,
            stage: RwLock::new(None),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, sender: Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Token shared with the running render; cancel it from any thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stage the pipeline is currently in, if a render is running
    pub fn current_stage(&self) -> Option<Stage> {
        *self.stage.read()
    }

    /// Renders one job to its in-memory masters.
    pub fn render(&self, job: &UpmixJob) -> OfflineResult<RenderOutput> {
        let result = self.render_inner(job);
        if let Err(e) = &result {
            let stage = (*self.stage.read()).map(|s| s.name()).unwrap_or("setup");
            log::error!("job '{}' failed during {stage}: {e}", job.id);
        }
        *self.stage.write() = None;
        result
    }

    fn render_inner(&self, job: &UpmixJob) -> OfflineResult<RenderOutput> {
        let sample_rate = job.stems.sample_rate();

        self.enter(job, Stage::Routing)?;
        let matrix =
            RoutingMatrix::build(self.config.quality, &self.config.analysis, sample_rate)?;

        self.enter(job, Stage::Mixing)?;
        let mut bed = mix(&job.stems, &matrix, self.config.decorr_seed, &self.cancel)
            .map_err(|e| match e {
                MixError::Cancelled => OfflineError::Cancelled,
                other => OfflineError::Mix(other),
            })?;

        self.enter(job, Stage::Normalizing)?;
        normalize(&mut bed, self.config.target_peak_dbfs, self.config.knee_db);

        let surround51 = if self.config.outputs.wants_51() {
            self.enter(job, Stage::Downmixing)?;
            let mut folded = fold_to_51(&bed);
            // Folded channels can sum hotter than the bed; bring the
            // deliverable back to target.
            normalize(&mut folded, self.config.target_peak_dbfs, self.config.knee_db);
            Some(MasterBuffer::new(folded, sample_rate))
        } else {
            None
        };

        let surround714 = self
            .config
            .outputs
            .wants_714()
            .then(|| MasterBuffer::new(bed, sample_rate));

        Ok(RenderOutput {
            surround714,
            surround51,
        })
    }

    /// Renders a job and writes every selected master under `dir`.
    pub fn render_to_dir(&self, job: &UpmixJob, dir: &Path) -> OfflineResult<Vec<PathBuf>> {
        let output = self.render(job)?;
        let result = self.encode(job, &output, dir);
        if let Err(e) = &result {
            log::error!("job '{}' failed during encoding: {e}", job.id);
        }
        *self.stage.write() = None;
        result
    }

    fn encode(&self, job: &UpmixJob, output: &RenderOutput, dir: &Path) -> OfflineResult<Vec<PathBuf>> {
        self.enter(job, Stage::Encoding)?;
        let mut written = Vec::new();
        for master in output.masters() {
            let path = dir.join(master_file_name(&job.id, master));
            write_wav(master, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    fn enter(&self, job: &UpmixJob, stage: Stage) -> OfflineResult<()> {
        if self.cancel.is_cancelled() {
            return Err(OfflineError::Cancelled);
        }
        *self.stage.write() = Some(stage);
        log::info!("job '{}': {}", job.id, stage.name());
        if let Some(sender) = &self.progress {
            let _ = sender.send(ProgressEvent {
                job_id: job.id.clone(),
                stage,
            });
        }
        Ok(())
    }
}

fn master_file_name(job_id: &str, master: &MasterBuffer) -> String {
    format!("{}.{}.wav", job_id, master.layout().name())
}

// ============================================================
// Batch rendering
// ============================================================

pub struct BatchRenderer {
    config: RenderConfig,
    cancel: CancelToken,
    progress: Option<Sender<ProgressEvent>>,
}

impl BatchRenderer {
    pub fn new(config: RenderConfig) -> OfflineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    pub fn with_progress(mut self, sender: Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Renders every job, writing masters under `dir`. Results come
    /// back in job order; each job fails or succeeds on its own.
    pub fn render_all(
        &self,
        jobs: Vec<UpmixJob>,
        dir: &Path,
    ) -> Vec<(String, OfflineResult<Vec<PathBuf>>)> {
        jobs.into_par_iter()
            .map(|job| {
                let pipeline = match RenderPipeline::new(self.config.clone()) {
                    Ok(p) => p.with_cancel(self.cancel.clone()),
                    Err(e) => return (job.id, Err(e)),
                };
                let pipeline = match &self.progress {
                    Some(sender) => pipeline.with_progress(sender.clone()),
                    None => pipeline,
                };
                (job.id.clone(), pipeline.render_to_dir(&job, dir))
            })
            .collect()
    }
}

/// Convenience entry point: renders one stem set with the given config.
pub fn render(config: RenderConfig, stems: StemSet) -> OfflineResult<RenderOutput> {
    let pipeline = RenderPipeline::new(config)?;
    pipeline.render(&UpmixJob::new("track", stems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputSelector;
    use st_core::{db_to_linear, StemBuffer, StemKind, DELIVERY_SAMPLE_RATE};
    use st_spatial::QualityPreset;

    const FRAMES: usize = 4_800;

    fn tone_stems() -> StemSet {
        let sine = |freq: f64, amp: f64| -> Vec<f64> {
            (0..FRAMES)
                .map(|n| {
                    amp * (std::f64::consts::TAU * freq * n as f64
                        / DELIVERY_SAMPLE_RATE as f64)
                        .sin()
                })
                .collect()
        };
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

    fn quick_config() -> RenderConfig {
        RenderConfig {
            quality: QualityPreset::Low,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_render_produces_both_masters() {
        let output = render(quick_config(), tone_stems()).unwrap();
        let bed = output.surround714.unwrap();
        let fold = output.surround51.unwrap();
        assert_eq!(bed.audio().channel_count(), 12);
        assert_eq!(fold.audio().channel_count(), 6);
        assert_eq!(bed.audio().frames(), FRAMES);
        assert_eq!(fold.audio().frames(), FRAMES);
    }

    #[test]
    fn test_masters_hit_the_peak_target() {
        let output = render(quick_config(), tone_stems()).unwrap();
        let config = RenderConfig::default();
        let target = db_to_linear(config.target_peak_dbfs);
        // The knee shaves at most knee/8 dB off a peak sitting at the
        // ceiling.
        let floor = db_to_linear(config.target_peak_dbfs - config.knee_db / 8.0);
        for master in output.masters() {
            let peak = master.audio().peak();
            assert!(peak <= target + 1e-9);
            assert!(peak >= floor - 1e-9, "normalize undershot: {peak}");
        }
    }

    #[test]
    fn test_output_selector_respected() {
        let config = RenderConfig {
            outputs: OutputSelector::Surround714,
            ..quick_config()
        };
        let output = render(config, tone_stems()).unwrap();
        assert!(output.surround714.is_some());
        assert!(output.surround51.is_none());
    }

    #[test]
    fn test_renders_are_reproducible() {
        let a = render(quick_config(), tone_stems()).unwrap();
        let b = render(quick_config(), tone_stems()).unwrap();
        let (a, b) = (a.surround714.unwrap(), b.surround714.unwrap());
        for idx in 0..a.audio().channel_count() {
            assert_eq!(a.audio().channel(idx), b.audio().channel(idx));
        }
    }

    #[test]
    fn test_cancelled_pipeline_returns_nothing() {
        let pipeline = RenderPipeline::new(quick_config()).unwrap();
        pipeline.cancel_token().cancel();
        let err = pipeline
            .render(&UpmixJob::new("t", tone_stems()))
            .unwrap_err();
        assert!(matches!(err, OfflineError::Cancelled));
        assert!(pipeline.current_stage().is_none());
    }

    #[test]
    fn test_progress_events_arrive_in_stage_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let pipeline = RenderPipeline::new(quick_config())
            .unwrap()
            .with_progress(tx);
        pipeline.render(&UpmixJob::new("t", tone_stems())).unwrap();
        drop(pipeline);

        let stages: Vec<Stage> = rx.try_iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Routing,
                Stage::Mixing,
                Stage::Normalizing,
                Stage::Downmixing
            ]
        );
    }

    #[test]
    fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let bad_stems = StemSet::new(
            StemBuffer::silent(StemKind::Vocals, DELIVERY_SAMPLE_RATE, FRAMES),
            StemBuffer::silent(StemKind::Drums, 44_100, FRAMES),
            StemBuffer::silent(StemKind::Bass, DELIVERY_SAMPLE_RATE, FRAMES),
            StemBuffer::silent(StemKind::Other, DELIVERY_SAMPLE_RATE, FRAMES),
        );
        let batch = BatchRenderer::new(quick_config()).unwrap();
        let results = batch.render_all(
            vec![
                UpmixJob::new("good", tone_stems()),
                UpmixJob::new("bad", bad_stems),
            ],
            dir.path(),
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "good");
        let written = results[0].1.as_ref().unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));
        assert!(results[1].1.is_err());
    }

    #[test]
    fn test_cancelled_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let batch = BatchRenderer::new(quick_config()).unwrap();
        batch.cancel_token().cancel();
        let results = batch.render_all(vec![UpmixJob::new("t", tone_stems())], dir.path());
        assert!(matches!(results[0].1, Err(OfflineError::Cancelled)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
