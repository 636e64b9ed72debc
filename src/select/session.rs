//! Occlusion-query selection session.
//!
//! One query is issued per candidate object: the draw driver calls
//! [`SelectSession::load_id`] before drawing each object, and
//! [`SelectSession::end`] turns the per-query "anything drawn?" answers into
//! hit records.
//!
//! The session mutably borrows both the GPU and the caller's hit buffer, so
//! only one session per GPU can be open at a time. Render state changed at
//! `begin` is restored when the session ends, including on overflow, on
//! readback failure and when the session is dropped without `end`.

use super::hit::{HitBuffer, HitRecord};
use super::mode::SelectMode;
use super::query::{QueryKind, SelectGpu};
use super::state::{DepthTest, Rect, RenderStateSnapshot};
use crate::error::SelectError;

/// Debug group label wrapped around the session's GPU work.
pub const DEBUG_GROUP: &str = "Selection Queries";

/// Result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Number of records in the hit buffer.
    Hits(usize),
    /// More candidates were visible than the buffer holds. Partial results
    /// were discarded.
    Overflow,
}

impl SelectOutcome {
    /// Hit count, or `None` on overflow.
    #[must_use]
    pub fn hit_count(self) -> Option<usize> {
        match self {
            Self::Hits(n) => Some(n),
            Self::Overflow => None,
        }
    }

    /// Returns `true` for [`SelectOutcome::Overflow`].
    #[must_use]
    pub fn is_overflow(self) -> bool {
        matches!(self, Self::Overflow)
    }

    /// Hit count in the signed form older callers expect, with `-1` for
    /// overflow.
    #[must_use]
    pub fn legacy_hit_count(self) -> i64 {
        match self {
            Self::Hits(n) => n as i64,
            Self::Overflow => -1,
        }
    }
}

/// An open selection session.
pub struct SelectSession<'a, G: SelectGpu> {
    gpu: &'a mut G,
    hits: &'a mut HitBuffer,
    mode: SelectMode,
    /// First-pass hit count; only read in the second pass.
    previous_hits: usize,
    /// Next first-pass record the second pass expects to see.
    cursor: usize,
    pool: Option<G::Pool>,
    /// One id per issued query, in issue order.
    issued_ids: Vec<u32>,
    query_outstanding: bool,
    saved: RenderStateSnapshot,
    finished: bool,
}

impl<'a, G: SelectGpu> SelectSession<'a, G> {
    /// Open a session.
    ///
    /// `region` is the picking rectangle; the viewport keeps its origin and
    /// shrinks to the rectangle's size so the query pass touches as few
    /// pixels as possible. `previous_hits` is the hit count returned by a
    /// nearest first pass and is required in
    /// [`SelectMode::NearestSecondPass`]; other modes ignore it and clear
    /// `hits`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::MissingFirstPass`] when a second pass is
    /// requested without a first-pass count, or with a count the buffer
    /// does not hold. No GPU state is touched in that case.
    pub fn begin(
        gpu: &'a mut G,
        hits: &'a mut HitBuffer,
        region: Rect,
        mode: SelectMode,
        previous_hits: Option<usize>,
    ) -> Result<Self, SelectError> {
        let previous_hits = match mode {
            SelectMode::NearestSecondPass => match previous_hits {
                Some(n) if n <= hits.len() => n,
                _ => {
                    return Err(SelectError::MissingFirstPass {
                        previous_hits,
                        buffered: hits.len(),
                    })
                }
            },
            SelectMode::All | SelectMode::NearestFirstPass => {
                hits.clear();
                0
            }
        };

        gpu.push_debug_group(DEBUG_GROUP);
        let pool = gpu.alloc_query_pool(QueryKind::Occlusion);
        let saved = gpu.snapshot();

        // Alpha-blended geometry fails the query unless every color channel
        // is written.
        gpu.set_color_write(true);

        let viewport = saved.viewport.shrunk_to(&region);
        gpu.set_viewport(viewport);
        gpu.set_scissor(viewport);
        gpu.set_scissor_test(false);

        match mode {
            SelectMode::All => {
                // Some drivers only count samples with depth testing on.
                gpu.set_depth_test(DepthTest::Always);
                gpu.set_depth_write(true);
            }
            SelectMode::NearestFirstPass => {
                gpu.set_depth_test(DepthTest::LessEqual);
                gpu.set_depth_write(true);
                gpu.clear_depth(1.0);
            }
            SelectMode::NearestSecondPass => {
                gpu.set_depth_test(DepthTest::Equal);
                gpu.set_depth_write(false);
            }
        }

        log::debug!(
            "selection session begin: mode={}, region={}x{}, capacity={}, \
             previous_hits={previous_hits}",
            mode.label(),
            region.width(),
            region.height(),
            hits.capacity(),
        );

        Ok(Self {
            gpu,
            hits,
            mode,
            previous_hits,
            cursor: 0,
            pool: Some(pool),
            issued_ids: Vec::new(),
            query_outstanding: false,
            saved,
            finished: false,
        })
    }

    /// Start the query for the next candidate.
    ///
    /// Ends the previous query first, so each query covers exactly one
    /// object's draw calls. Returns whether the caller should draw the
    /// object: always `true` except in the second pass, where only the
    /// first-pass survivors are redrawn. Ids must be loaded in the same
    /// order in both passes.
    pub fn load_id(&mut self, id: u32) -> bool {
        if let Some(pool) = self.pool.as_mut() {
            if self.query_outstanding {
                self.gpu.end_query(pool);
            }
            self.gpu.begin_query(pool);
        }
        self.issued_ids.push(id);
        self.query_outstanding = true;
        log::trace!("query {} -> id {id}", self.issued_ids.len() - 1);

        match self.mode {
            SelectMode::All | SelectMode::NearestFirstPass => true,
            SelectMode::NearestSecondPass => {
                let expected = (self.cursor < self.previous_hits)
                    .then(|| self.hits.get(self.cursor))
                    .flatten();
                if expected.is_some_and(|record| record.id == id) {
                    self.cursor += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// GPU the session runs on, for issuing draw calls between
    /// [`SelectSession::load_id`] calls.
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut *self.gpu
    }

    /// Close the session, reconcile query results into the hit buffer and
    /// restore render state.
    ///
    /// # Errors
    ///
    /// Propagates backend readback failures. Render state is restored and
    /// the pool released before the error is returned.
    pub fn end(mut self) -> Result<SelectOutcome, SelectError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<SelectOutcome, SelectError> {
        let outcome = match self.pool.take() {
            Some(mut pool) => {
                if self.query_outstanding {
                    self.gpu.end_query(&mut pool);
                    self.query_outstanding = false;
                }
                let mut results = vec![0u32; self.issued_ids.len()];
                let read = self.gpu.occlusion_results(&mut pool, &mut results);
                self.gpu.free_query_pool(pool);
                read.map(|()| self.reconcile(&results))
            }
            None => Ok(SelectOutcome::Hits(self.hits.len())),
        };
        self.release();

        match &outcome {
            Ok(result) => log::debug!(
                "selection session end: mode={}, queries={}, outcome={result:?}",
                self.mode.label(),
                self.issued_ids.len(),
            ),
            Err(e) => log::warn!("selection session failed: {e}"),
        }
        outcome
    }

    fn reconcile(&mut self, results: &[u32]) -> SelectOutcome {
        let mut visible = self
            .issued_ids
            .iter()
            .zip(results)
            .filter(|(_, samples)| **samples != 0)
            .map(|(&id, _)| id);

        match self.mode {
            SelectMode::All | SelectMode::NearestFirstPass => {
                for id in visible {
                    if self.hits.try_push(HitRecord::visible(id)).is_err() {
                        log::warn!(
                            "selection overflow: more than {} visible \
                             candidates, results discarded",
                            self.hits.capacity()
                        );
                        self.hits.clear();
                        return SelectOutcome::Overflow;
                    }
                }
                SelectOutcome::Hits(self.hits.len())
            }
            SelectMode::NearestSecondPass => {
                // Only one candidate can sit at the stored nearest depth, so
                // the first surviving id settles the pass.
                if let Some(id) = visible.next() {
                    let marked = self.hits.mark_nearest(id, self.previous_hits);
                    log::debug!("nearest hit: id {id} ({marked} records)");
                }
                SelectOutcome::Hits(self.previous_hits)
            }
        }
    }

    /// Release GPU resources and put render state back. Idempotent.
    fn release(&mut self) {
        if self.finished {
            return;
        }
        if let Some(mut pool) = self.pool.take() {
            if self.query_outstanding {
                self.gpu.end_query(&mut pool);
            }
            self.gpu.free_query_pool(pool);
        }
        self.query_outstanding = false;
        self.gpu.restore(&self.saved);
        self.gpu.pop_debug_group();
        self.finished = true;
    }
}

impl<G: SelectGpu> Drop for SelectSession<'_, G> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!(
                "selection session dropped without end after {} queries, \
                 results discarded",
                self.issued_ids.len()
            );
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::dummy::{DummyEvent, DummyGpu};
    use crate::select::hit::DEPTH_UNKNOWN;
    use crate::select::state::{RenderStateProvider, Viewport, WriteMask};
    use proptest::prelude::*;

    fn region() -> Rect {
        Rect::around(50, 50, 5)
    }

    fn run(
        gpu: &mut DummyGpu,
        hits: &mut HitBuffer,
        mode: SelectMode,
        previous: Option<usize>,
        ids: &[u32],
    ) -> (Vec<bool>, Result<SelectOutcome, SelectError>) {
        let mut session =
            SelectSession::begin(gpu, hits, region(), mode, previous).unwrap();
        let mut accepted = Vec::new();
        for &id in ids {
            let draw = session.load_id(id);
            if draw {
                session.gpu_mut().draw(id);
            }
            accepted.push(draw);
        }
        (accepted, session.end())
    }

    #[test]
    fn all_mode_counts_visible_ids() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([2, 4, 5]);
        let mut hits = HitBuffer::with_capacity(8);
        let (accepted, outcome) =
            run(&mut gpu, &mut hits, SelectMode::All, None, &[1, 2, 3, 4, 5]);

        assert!(accepted.iter().all(|&a| a));
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(3));
        assert_eq!(hits.ids(), vec![2, 4, 5]);
        for record in &hits {
            assert_eq!(record.hit, 1);
            assert_eq!(record.near, DEPTH_UNKNOWN);
            assert_eq!(record.far, DEPTH_UNKNOWN);
        }
    }

    #[test]
    fn overflow_discards_results_and_restores_state() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1, 2, 3]);
        gpu.set_depth_test(DepthTest::Less);
        gpu.set_write_mask(WriteMask::RED);
        gpu.set_scissor_test(true);
        let before = gpu.snapshot();

        let mut hits = HitBuffer::with_capacity(2);
        let (_, outcome) =
            run(&mut gpu, &mut hits, SelectMode::All, None, &[1, 2, 3]);

        let outcome = outcome.unwrap();
        assert_eq!(outcome, SelectOutcome::Overflow);
        assert_eq!(outcome.legacy_hit_count(), -1);
        assert!(hits.is_empty());
        assert_eq!(gpu.snapshot(), before);
        assert_eq!(gpu.pools_allocated(), gpu.pools_freed());
    }

    #[test]
    fn exact_capacity_is_not_overflow() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1, 2]);
        let mut hits = HitBuffer::with_capacity(2);
        let (_, outcome) =
            run(&mut gpu, &mut hits, SelectMode::All, None, &[1, 2, 3]);
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(2));
    }

    #[test]
    fn begin_configures_query_state() {
        let mut gpu = DummyGpu::new(640, 480);
        gpu.set_viewport(Viewport::new(16, 32, 640, 480));
        gpu.set_scissor_test(true);
        gpu.set_write_mask(WriteMask::DEPTH);
        let mut hits = HitBuffer::with_capacity(4);

        let mut session = SelectSession::begin(
            &mut gpu,
            &mut hits,
            Rect::new(100, 110, 200, 204),
            SelectMode::All,
            None,
        )
        .unwrap();
        let during = session.gpu_mut().snapshot();
        drop(session);

        assert_eq!(during.viewport, Viewport::new(16, 32, 10, 4));
        assert_eq!(during.scissor, during.viewport);
        assert!(!during.scissor_test);
        assert_eq!(during.write_mask, WriteMask::all());
        assert_eq!(during.depth_test, DepthTest::Always);

        let events = gpu.events();
        assert_eq!(
            events.first(),
            Some(&DummyEvent::PushDebugGroup(DEBUG_GROUP.to_owned()))
        );
        assert_eq!(events.last(), Some(&DummyEvent::PopDebugGroup));
    }

    #[test]
    fn first_pass_clears_depth_and_second_pass_does_not_write_it() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1]);
        let mut hits = HitBuffer::with_capacity(4);
        let (_, outcome) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestFirstPass,
            None,
            &[1],
        );
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(1));
        assert_eq!(gpu.depth_clears(), vec![1.0]);
        assert!(gpu.events().contains(&DummyEvent::Draw {
            id: 1,
            depth_test: DepthTest::LessEqual,
            write_mask: WriteMask::all(),
        }));

        gpu.clear_events();
        let (_, outcome) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestSecondPass,
            Some(1),
            &[1],
        );
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(1));
        assert!(gpu.depth_clears().is_empty());
        assert!(gpu.events().contains(&DummyEvent::Draw {
            id: 1,
            depth_test: DepthTest::Equal,
            write_mask: WriteMask::COLOR,
        }));
    }

    #[test]
    fn second_pass_only_redraws_first_pass_survivors() {
        let mut gpu = DummyGpu::new(100, 100)
            .with_visible([5, 9])
            .with_nearest([9]);
        let mut hits = HitBuffer::with_capacity(4);
        hits.try_push(HitRecord::visible(5)).unwrap();
        hits.try_push(HitRecord::visible(9)).unwrap();

        let (accepted, outcome) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestSecondPass,
            Some(2),
            &[5, 7, 9],
        );

        assert_eq!(accepted, vec![true, false, true]);
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(2));
        assert!(!hits.get(0).unwrap().is_nearest());
        assert_eq!(hits.get(0).unwrap().near, DEPTH_UNKNOWN);
        assert!(hits.get(1).unwrap().is_nearest());
    }

    #[test]
    fn second_pass_rejects_ids_past_previous_hits() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([3]);
        let mut hits = HitBuffer::with_capacity(4);
        hits.try_push(HitRecord::visible(3)).unwrap();
        hits.try_push(HitRecord::visible(4)).unwrap();

        let (accepted, _) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestSecondPass,
            Some(1),
            &[3, 4],
        );
        assert_eq!(accepted, vec![true, false]);
    }

    #[test]
    fn second_pass_stops_after_first_visible_id() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1, 2]);
        let mut hits = HitBuffer::with_capacity(4);
        hits.try_push(HitRecord::visible(1)).unwrap();
        hits.try_push(HitRecord::visible(2)).unwrap();

        let (_, outcome) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestSecondPass,
            Some(2),
            &[1, 2],
        );
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(2));
        assert!(hits.get(0).unwrap().is_nearest());
        assert!(!hits.get(1).unwrap().is_nearest());
    }

    #[test]
    fn second_pass_without_first_pass_is_rejected() {
        let mut gpu = DummyGpu::new(100, 100);
        let mut hits = HitBuffer::with_capacity(4);
        let before = gpu.snapshot();

        let err = SelectSession::begin(
            &mut gpu,
            &mut hits,
            region(),
            SelectMode::NearestSecondPass,
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            SelectError::MissingFirstPass {
                previous_hits: None,
                ..
            }
        ));

        let err = SelectSession::begin(
            &mut gpu,
            &mut hits,
            region(),
            SelectMode::NearestSecondPass,
            Some(3),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SelectError::MissingFirstPass { .. }));
        assert!(gpu.events().is_empty());
        assert_eq!(gpu.snapshot(), before);
    }

    #[test]
    fn queries_never_overlap() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1, 2, 3]);
        let mut hits = HitBuffer::with_capacity(8);
        let (_, outcome) =
            run(&mut gpu, &mut hits, SelectMode::All, None, &[1, 2, 3, 4]);
        assert!(outcome.is_ok());

        let mut open = false;
        let mut begins = 0;
        for event in gpu.events() {
            match event {
                DummyEvent::BeginQuery(_) => {
                    assert!(!open, "query begun while another is open");
                    open = true;
                    begins += 1;
                }
                DummyEvent::EndQuery(_) => {
                    assert!(open);
                    open = false;
                }
                _ => {}
            }
        }
        assert!(!open);
        assert_eq!(begins, 4);
        assert_eq!(gpu.overlapping_begins(), 0);
    }

    #[test]
    fn readback_failure_still_restores_state() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1]);
        gpu.fail_next_readback();
        let before = gpu.snapshot();
        let mut hits = HitBuffer::with_capacity(4);

        let (_, outcome) =
            run(&mut gpu, &mut hits, SelectMode::All, None, &[1]);
        assert!(matches!(outcome, Err(SelectError::QueryReadback(_))));
        assert_eq!(gpu.snapshot(), before);
        assert_eq!(gpu.pools_allocated(), gpu.pools_freed());
        assert!(gpu.debug_groups().is_empty());
    }

    #[test]
    fn dropping_an_open_session_releases_everything() {
        let mut gpu = DummyGpu::new(100, 100).with_visible([1]);
        let before = gpu.snapshot();
        let mut hits = HitBuffer::with_capacity(4);
        {
            let mut session = SelectSession::begin(
                &mut gpu,
                &mut hits,
                region(),
                SelectMode::All,
                None,
            )
            .unwrap();
            assert!(session.load_id(1));
            session.gpu_mut().draw(1);
        }
        assert_eq!(gpu.snapshot(), before);
        assert_eq!(gpu.pools_allocated(), 1);
        assert_eq!(gpu.pools_freed(), 1);
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_session_reports_no_hits() {
        let mut gpu = DummyGpu::new(100, 100);
        let mut hits = HitBuffer::with_capacity(4);
        let (_, outcome) = run(&mut gpu, &mut hits, SelectMode::All, None, &[]);
        assert_eq!(outcome.unwrap(), SelectOutcome::Hits(0));
        assert!(!gpu
            .events()
            .iter()
            .any(|e| matches!(e, DummyEvent::BeginQuery(_))));
    }

    #[test]
    fn second_pass_restores_depth_write() {
        let mut gpu = DummyGpu::new(100, 100)
            .with_visible([4, 6])
            .with_nearest([6]);
        gpu.set_viewport(Viewport::new(8, 8, 80, 60));
        gpu.set_depth_test(DepthTest::Less);
        let before = gpu.snapshot();
        assert!(before.write_mask.contains(WriteMask::DEPTH));

        let mut hits = HitBuffer::with_capacity(4);
        let (_, first) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestFirstPass,
            None,
            &[4, 6],
        );
        assert_eq!(first.unwrap(), SelectOutcome::Hits(2));
        assert_eq!(gpu.snapshot(), before);

        let (_, second) = run(
            &mut gpu,
            &mut hits,
            SelectMode::NearestSecondPass,
            Some(2),
            &[4, 6],
        );
        assert_eq!(second.unwrap(), SelectOutcome::Hits(2));
        assert_eq!(gpu.snapshot(), before);
        assert!(gpu.write_mask().contains(WriteMask::DEPTH));
        assert!(hits.get(1).unwrap().is_nearest());
    }

    proptest! {
        /// A single pass reports every visible id in draw order, or
        /// overflows with an empty buffer, and always leaves render state
        /// as it found it.
        #[test]
        fn single_pass_counts_or_overflows(
            mask in prop::collection::vec(any::<bool>(), 0..12),
            capacity in 0usize..8,
            mode in prop_oneof![
                Just(SelectMode::All),
                Just(SelectMode::NearestFirstPass),
            ],
            depth_test in prop_oneof![
                Just(DepthTest::None),
                Just(DepthTest::Less),
                Just(DepthTest::GreaterEqual),
            ],
            bits in 0u8..32,
            scissor_test in any::<bool>(),
        ) {
            let ids: Vec<u32> = (0..mask.len() as u32).collect();
            let visible: Vec<u32> =
                ids.iter().copied().filter(|&id| mask[id as usize]).collect();
            let mut gpu =
                DummyGpu::new(100, 100).with_visible(visible.iter().copied());
            gpu.set_depth_test(depth_test);
            gpu.set_write_mask(WriteMask::from_bits_truncate(bits));
            gpu.set_scissor_test(scissor_test);
            let before = gpu.snapshot();

            let mut hits = HitBuffer::with_capacity(capacity);
            let (accepted, outcome) = run(&mut gpu, &mut hits, mode, None, &ids);
            let outcome = outcome.unwrap();

            prop_assert!(accepted.iter().all(|&a| a));
            if visible.len() <= capacity {
                prop_assert_eq!(outcome, SelectOutcome::Hits(visible.len()));
                prop_assert_eq!(hits.ids(), visible.clone());
            } else {
                prop_assert_eq!(outcome.legacy_hit_count(), -1);
                prop_assert!(hits.is_empty());
            }
            prop_assert_eq!(gpu.snapshot(), before);
            prop_assert_eq!(gpu.pools_allocated(), gpu.pools_freed());
            prop_assert_eq!(gpu.overlapping_begins(), 0);
            prop_assert!(gpu.debug_groups().is_empty());
        }

        /// The second pass redraws exactly the first-pass hits and marks the
        /// first of them lying at the nearest depth.
        #[test]
        fn nearest_passes_mark_first_survivor(
            flags in prop::collection::vec((any::<bool>(), any::<bool>()), 0..12),
            capacity in 0usize..8,
        ) {
            let ids: Vec<u32> = (0..flags.len() as u32).collect();
            let visible: Vec<u32> =
                ids.iter().copied().filter(|&id| flags[id as usize].0).collect();
            let nearest: Vec<u32> = visible
                .iter()
                .copied()
                .filter(|&id| flags[id as usize].1)
                .collect();
            let mut gpu = DummyGpu::new(100, 100)
                .with_visible(visible.iter().copied())
                .with_nearest(nearest.iter().copied());
            let before = gpu.snapshot();

            let mut hits = HitBuffer::with_capacity(capacity);
            let (_, first) = run(
                &mut gpu,
                &mut hits,
                SelectMode::NearestFirstPass,
                None,
                &ids,
            );
            let count = match first.unwrap() {
                SelectOutcome::Hits(n) if n > 0 => n,
                _ => return Ok(()),
            };

            let (accepted, second) = run(
                &mut gpu,
                &mut hits,
                SelectMode::NearestSecondPass,
                Some(count),
                &ids,
            );
            prop_assert_eq!(second.unwrap(), SelectOutcome::Hits(count));
            let redrawn: Vec<bool> = flags.iter().map(|&(v, _)| v).collect();
            prop_assert_eq!(accepted, redrawn);

            let marked: Vec<u32> =
                hits.iter().filter(|r| r.is_nearest()).map(|r| r.id).collect();
            let expected: Vec<u32> = nearest.first().copied().into_iter().collect();
            prop_assert_eq!(marked, expected);
            prop_assert_eq!(hits.ids(), visible);
            prop_assert_eq!(gpu.snapshot(), before);
        }
    }
}
