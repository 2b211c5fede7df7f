use crate::foundation::core::{FrameIndex, FrameRange, Fps};
use crate::foundation::error::{ProfilmError, ProfilmResult};
use crate::timeline::block::{Block, Importance};

/// Blank lead-in frames before the first block.
pub const HEAD_PAD: u64 = 45;
/// Blank tail frames after the last block's gap.
pub const TAIL_PAD: u64 = 60;

/// The block resolved for one global frame.
#[derive(Clone, Copy, Debug)]
pub struct ActiveBlock<'a> {
    /// Index into the schedule's block list.
    pub index: usize,
    /// The block itself.
    pub block: &'a Block,
    /// Frames elapsed since the block's start.
    pub local: u64,
}

/// Derived, read-only timeline: the ordered blocks plus a total mapping from
/// global frame index to the active block.
///
/// Built once per render. Blocks never overlap; frames inside the head or
/// tail padding clamp to the nearest block's boundary frame, which paints
/// blank under the alpha envelopes.
#[derive(Clone, Debug)]
pub struct Schedule {
    blocks: Vec<Block>,
    starts: Vec<u64>,
    total_frames: u64,
    seed: u64,
    fps: Fps,
}

impl Schedule {
    /// Assemble a schedule from finished blocks.
    ///
    /// Start offsets are cumulative after [`HEAD_PAD`]; the total adds
    /// [`TAIL_PAD`] after the last block.
    pub fn new(blocks: Vec<Block>, seed: u64, fps: Fps) -> ProfilmResult<Self> {
        if blocks.is_empty() {
            return Err(ProfilmError::validation("schedule needs at least one block"));
        }
        let mut starts = Vec::with_capacity(blocks.len());
        let mut cursor = HEAD_PAD;
        for block in &blocks {
            starts.push(cursor);
            cursor = cursor
                .checked_add(block.duration_frames())
                .ok_or_else(|| ProfilmError::validation("schedule frame count overflow"))?;
        }
        let total_frames = cursor + TAIL_PAD;
        Ok(Self { blocks, starts, total_frames, seed, fps })
    }

    /// All blocks in play order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Seed shared by schedule jitter, world layout and the score.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Frame rate the schedule was built for.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Total frames including head and tail padding.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Full frame range of the film.
    pub fn frame_range(&self) -> FrameRange {
        FrameRange { start: FrameIndex(0), end: FrameIndex(self.total_frames) }
    }

    /// Film duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames)
    }

    /// Absolute start frame of block `index`.
    pub fn start_of(&self, index: usize) -> Option<FrameIndex> {
        self.starts.get(index).map(|&s| FrameIndex(s))
    }

    /// Resolve the block shown at `frame`.
    ///
    /// Total over the whole film: head padding clamps to the first block's
    /// opening frame, tail padding to the last block's closing frame.
    pub fn block_at(&self, frame: FrameIndex) -> ActiveBlock<'_> {
        let f = frame.0;
        // First start > f, minus one, is the only candidate.
        let idx = self.starts.partition_point(|&s| s <= f).saturating_sub(1);
        let start = self.starts[idx];
        let block = &self.blocks[idx];
        let end = start + block.duration_frames();
        ActiveBlock { index: idx, block, local: f.clamp(start, end - 1) - start }
    }

    /// Block transition timestamps with their importance, in play order.
    /// Drives the score's transient accents.
    pub fn transitions(&self) -> impl Iterator<Item = (FrameIndex, Importance)> + '_ {
        self.starts
            .iter()
            .zip(&self.blocks)
            .map(|(&start, block)| (FrameIndex(start), block.importance()))
    }

    /// Fraction of the film elapsed at `frame`, in `[0, 1]`.
    pub fn progress_at(&self, frame: FrameIndex) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (frame.0 as f64 / self.total_frames as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::block::{BlockBody, BlockTag, HoldPolicy, SceneKind};

    fn block(hold: u64) -> Block {
        Block {
            tag: BlockTag::Intro,
            body: BlockBody::Lines(vec!["a".into(), "b".into()]),
            policy: HoldPolicy::Timed(Importance::Normal),
            hold_frames: hold,
        }
    }

    fn scene(hold: u64) -> Block {
        Block {
            tag: BlockTag::OutroScene,
            body: BlockBody::Scene(SceneKind::Outro),
            policy: HoldPolicy::Exact(hold),
            hold_frames: hold,
        }
    }

    #[test]
    fn total_is_sum_of_durations_plus_padding() {
        let blocks = vec![block(30), scene(50), block(10)];
        let sum: u64 = blocks.iter().map(Block::duration_frames).sum();
        let s = Schedule::new(blocks, 1, Fps { num: 30, den: 1 }).unwrap();
        assert_eq!(s.total_frames(), HEAD_PAD + sum + TAIL_PAD);
    }

    #[test]
    fn mapping_is_total_with_no_gaps_or_overlaps() {
        let s =
            Schedule::new(vec![block(30), scene(50), block(10)], 1, Fps { num: 30, den: 1 })
                .unwrap();
        let first = HEAD_PAD;
        let last = s.total_frames() - TAIL_PAD;
        let mut seen = vec![0u64; s.blocks().len()];
        for f in first..last {
            seen[s.block_at(FrameIndex(f)).index] += 1;
        }
        for (i, &count) in seen.iter().enumerate() {
            assert_eq!(count, s.blocks()[i].duration_frames(), "block {i} frame count");
        }
    }

    #[test]
    fn padding_clamps_to_the_boundary_blocks() {
        let s =
            Schedule::new(vec![block(30), scene(50)], 1, Fps { num: 30, den: 1 }).unwrap();
        for f in 0..HEAD_PAD {
            let head = s.block_at(FrameIndex(f));
            assert_eq!((head.index, head.local), (0, 0));
        }
        let closing = s.blocks()[1].duration_frames() - 1;
        for f in (s.total_frames() - TAIL_PAD)..s.total_frames() {
            let tail = s.block_at(FrameIndex(f));
            assert_eq!((tail.index, tail.local), (1, closing));
        }
    }

    #[test]
    fn local_offset_counts_from_block_start() {
        let s = Schedule::new(vec![block(30)], 1, Fps { num: 30, den: 1 }).unwrap();
        let active = s.block_at(FrameIndex(HEAD_PAD + 7));
        assert_eq!(active.index, 0);
        assert_eq!(active.local, 7);
    }

    #[test]
    fn transitions_follow_play_order() {
        let s = Schedule::new(vec![block(30), scene(50)], 1, Fps { num: 30, den: 1 }).unwrap();
        let t: Vec<_> = s.transitions().collect();
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].0, FrameIndex(HEAD_PAD));
        assert_eq!(t[1].0, FrameIndex(HEAD_PAD + s.blocks()[0].duration_frames()));
        assert_eq!(t[1].1, Importance::Normal);
    }

    #[test]
    fn empty_schedule_is_rejected() {
        assert!(Schedule::new(Vec::new(), 1, Fps { num: 30, den: 1 }).is_err());
    }
}
