//! Single-pass and two-pass nearest picking on top of [`SelectSession`].

use super::hit::{HitBuffer, HitRecord};
use super::mode::SelectMode;
use super::query::SelectGpu;
use super::session::{SelectOutcome, SelectSession};
use super::state::Rect;
use crate::error::SelectError;
use crate::options::Options;

/// Draws picking candidates.
///
/// `candidates` must return ids in the same order every time it is called
/// within one pick, since the nearest second pass matches ids against the
/// first pass by position.
pub trait DrawDriver<G> {
    /// Candidate ids, in draw order.
    fn candidates(&self) -> Vec<u32>;

    /// Issue the draw calls for object `id`.
    fn draw(&mut self, gpu: &mut G, id: u32);
}

/// Result of a nearest pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Outcome of the last pass that ran.
    pub outcome: SelectOutcome,
    /// Record the second pass marked as nearest.
    pub nearest: Option<HitRecord>,
}

/// Run one session over every candidate the driver offers, skipping the
/// draw of candidates the session rejects.
///
/// # Errors
///
/// Propagates [`SelectSession::begin`] and [`SelectSession::end`] errors.
pub fn run_pass<G, D>(
    gpu: &mut G,
    driver: &mut D,
    region: Rect,
    hits: &mut HitBuffer,
    mode: SelectMode,
    previous_hits: Option<usize>,
) -> Result<SelectOutcome, SelectError>
where
    G: SelectGpu,
    D: DrawDriver<G>,
{
    let candidates = driver.candidates();
    let mut session =
        SelectSession::begin(gpu, hits, region, mode, previous_hits)?;
    for id in candidates {
        if session.load_id(id) {
            driver.draw(session.gpu_mut(), id);
        }
    }
    session.end()
}

/// Pick every candidate visible in `region`.
///
/// # Errors
///
/// Propagates session errors.
pub fn select_all<G, D>(
    gpu: &mut G,
    driver: &mut D,
    region: Rect,
    hits: &mut HitBuffer,
) -> Result<SelectOutcome, SelectError>
where
    G: SelectGpu,
    D: DrawDriver<G>,
{
    run_pass(gpu, driver, region, hits, SelectMode::All, None)
}

/// Pick the candidate nearest to the viewer in `region`.
///
/// Runs a depth-tested first pass, then redraws its survivors with an
/// equal-depth test. The second pass is skipped when the first finds
/// nothing or overflows.
///
/// # Errors
///
/// Propagates session errors.
pub fn select_nearest<G, D>(
    gpu: &mut G,
    driver: &mut D,
    region: Rect,
    hits: &mut HitBuffer,
) -> Result<Selection, SelectError>
where
    G: SelectGpu,
    D: DrawDriver<G>,
{
    let first = run_pass(
        gpu,
        driver,
        region,
        hits,
        SelectMode::NearestFirstPass,
        None,
    )?;
    let count = match first {
        SelectOutcome::Hits(0) | SelectOutcome::Overflow => {
            return Ok(Selection {
                outcome: first,
                nearest: None,
            })
        }
        SelectOutcome::Hits(n) => n,
    };

    let outcome = run_pass(
        gpu,
        driver,
        region,
        hits,
        SelectMode::NearestSecondPass,
        Some(count),
    )?;
    let nearest = hits.iter().find(|r| r.is_nearest()).copied();
    Ok(Selection { outcome, nearest })
}

/// Owns a hit buffer sized from [`Options`] and runs picks into it.
#[derive(Debug, Clone)]
pub struct Picker {
    hits: HitBuffer,
    log_hits: bool,
}

impl Picker {
    /// Create a picker from options.
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            hits: HitBuffer::with_capacity(options.select.buffer_capacity),
            log_hits: options.debug.log_hits,
        }
    }

    /// Hits of the last pick.
    #[must_use]
    pub fn hits(&self) -> &HitBuffer {
        &self.hits
    }

    /// See [`select_all`].
    ///
    /// # Errors
    ///
    /// Propagates session errors.
    pub fn pick_all<G, D>(
        &mut self,
        gpu: &mut G,
        driver: &mut D,
        region: Rect,
    ) -> Result<SelectOutcome, SelectError>
    where
        G: SelectGpu,
        D: DrawDriver<G>,
    {
        let outcome = select_all(gpu, driver, region, &mut self.hits)?;
        self.report(outcome);
        Ok(outcome)
    }

    /// See [`select_nearest`].
    ///
    /// # Errors
    ///
    /// Propagates session errors.
    pub fn pick_nearest<G, D>(
        &mut self,
        gpu: &mut G,
        driver: &mut D,
        region: Rect,
    ) -> Result<Selection, SelectError>
    where
        G: SelectGpu,
        D: DrawDriver<G>,
    {
        let selection = select_nearest(gpu, driver, region, &mut self.hits)?;
        self.report(selection.outcome);
        Ok(selection)
    }

    fn report(&self, outcome: SelectOutcome) {
        if !self.log_hits {
            return;
        }
        match outcome {
            SelectOutcome::Hits(n) => {
                log::info!("picked {n} objects: {:?}", self.hits.ids());
            }
            SelectOutcome::Overflow => log::info!(
                "pick overflowed the {}-record hit buffer",
                self.hits.capacity()
            ),
        }
    }
}
