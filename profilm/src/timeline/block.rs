use crate::foundation::ease::Ease;

/// Frames between consecutive line starts during a block's appearance.
pub const LINE_GAP: u64 = 14;
/// Frames over which a single line fades from invisible to full.
pub const LINE_FADE: u64 = 22;
/// Frames over which the whole block fades out after its hold ends.
pub const FADE_OUT: u64 = 26;
/// Black gap frames between a block's fade-out and the next block.
pub const BLOCK_BLACK: u64 = 10;

/// How strongly a block demands the viewer's time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Importance {
    /// Barely there. Roughly a third of a normal hold.
    Flash,
    /// Baseline pacing.
    Normal,
    /// Held more than twice as long as normal.
    Linger,
}

impl Importance {
    /// Hold-duration multiplier for this tag.
    pub fn hold_multiplier(self) -> f64 {
        match self {
            Self::Flash => 0.35,
            Self::Normal => 1.0,
            Self::Linger => 2.2,
        }
    }

    /// Transient-click gain used by the score synthesizer.
    pub fn click_gain(self) -> f64 {
        match self {
            Self::Flash => 0.6,
            Self::Normal => 1.0,
            Self::Linger => 1.5,
        }
    }
}

/// How a block's hold duration is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum HoldPolicy {
    /// Hold computed from timeline position, content size and importance,
    /// jittered by the schedule RNG.
    Timed(Importance),
    /// Hold fixed at an exact frame count.
    Exact(u64),
}

impl HoldPolicy {
    /// Importance used for pacing-adjacent concerns (audio accents).
    pub fn importance(self) -> Importance {
        match self {
            Self::Timed(importance) => importance,
            Self::Exact(_) => Importance::Normal,
        }
    }
}

/// Full-canvas procedural scenes interleaved with the monologue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum SceneKind {
    /// Nodes converge out of darkness into the constellation.
    Emergence,
    /// A slow orbit around the subject's center node.
    Identity,
    /// The entropy constellation with per-signal radial bars.
    EntropyConstellation,
    /// Price count-up over a pulsing graph.
    Valuation,
    /// Columns of falling glyphs.
    DataRain,
    /// The network collapses back into a single point.
    Outro,
}

/// Stable identity of each block in the script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum BlockTag {
    /// Opening scene.
    EmergenceScene,
    /// Opening monologue.
    Intro,
    /// Device and browser facts.
    Device,
    /// Location facts.
    Location,
    /// Browser language vs network country discrepancy.
    LanguageMismatch,
    /// Orbiting identity scene.
    IdentityScene,
    /// Inferred profession, income and literacy.
    Subject,
    /// Total entropy and what it singles out.
    EntropyIntro,
    /// Constellation scene with signal bars.
    ConstellationScene,
    /// Strongest individual signals.
    TopSignals,
    /// Cookie and tracker counts.
    CookieSummary,
    /// Named tracker domains.
    TopTrackers,
    /// Browsing-pattern observations.
    BrowsingPatterns,
    /// Price count-up scene.
    ValuationScene,
    /// Factors behind the price.
    PricingFactors,
    /// The price itself.
    PriceReveal,
    /// Falling-data scene.
    DataRainScene,
    /// Closing monologue.
    Closing,
    /// Collapse scene.
    OutroScene,
}

/// Block content: either timed monologue lines or a procedural scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum BlockBody {
    /// Text lines, revealed one by one. Empty strings act as spacers.
    Lines(Vec<String>),
    /// A full-canvas scene painted by the rasterizer.
    Scene(SceneKind),
}

/// One timed unit of the film.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Block {
    /// Stable identity within the script.
    pub tag: BlockTag,
    /// What the block shows.
    pub body: BlockBody,
    /// How its hold duration was decided.
    pub policy: HoldPolicy,
    /// Computed hold duration in frames.
    pub hold_frames: u64,
}

impl Block {
    /// Number of text lines (zero for scenes).
    pub fn line_count(&self) -> usize {
        match &self.body {
            BlockBody::Lines(lines) => lines.len(),
            BlockBody::Scene(_) => 0,
        }
    }

    /// Frames spent revealing content before the hold starts.
    pub fn appear_frames(&self) -> u64 {
        self.line_count() as u64 * LINE_GAP + LINE_FADE
    }

    /// Total frames this block occupies, black gap included.
    ///
    /// A block with zero lines still occupies its fade and gap frames.
    pub fn duration_frames(&self) -> u64 {
        self.appear_frames() + self.hold_frames + FADE_OUT + BLOCK_BLACK
    }

    /// Importance used for audio accents at this block's transition.
    pub fn importance(&self) -> Importance {
        self.policy.importance()
    }

    /// Block-level alpha at `local` frames into the block.
    ///
    /// Full during appearance and hold, eased to zero across the fade-out
    /// window, zero through the black gap.
    pub fn block_alpha(&self, local: u64) -> f64 {
        let fade_start = self.appear_frames() + self.hold_frames;
        if local < fade_start {
            return 1.0;
        }
        let into_fade = local - fade_start;
        if into_fade >= FADE_OUT {
            return 0.0;
        }
        1.0 - Ease::OutQuad.apply(into_fade as f64 / FADE_OUT as f64)
    }

    /// Alpha of line `line_idx` at `local` frames into the block.
    ///
    /// Lines start staggered by [`LINE_GAP`], each easing in over
    /// [`LINE_FADE`] with a cubic ease-out, multiplied by [`Self::block_alpha`].
    /// Scene blocks use line index 0 as their entrance envelope.
    pub fn line_alpha(&self, local: u64, line_idx: usize) -> f64 {
        let start = line_idx as u64 * LINE_GAP;
        if local < start {
            return 0.0;
        }
        let t = (local - start) as f64 / LINE_FADE as f64;
        Ease::OutCubic.apply(t) * self.block_alpha(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_block(n: usize, hold: u64) -> Block {
        Block {
            tag: BlockTag::Intro,
            body: BlockBody::Lines(vec!["x".to_string(); n]),
            policy: HoldPolicy::Timed(Importance::Normal),
            hold_frames: hold,
        }
    }

    #[test]
    fn duration_accounts_for_every_phase() {
        let b = lines_block(3, 48);
        assert_eq!(b.duration_frames(), 3 * LINE_GAP + LINE_FADE + 48 + FADE_OUT + BLOCK_BLACK);
    }

    #[test]
    fn zero_line_block_still_occupies_fade_and_gap() {
        let b = Block {
            tag: BlockTag::EmergenceScene,
            body: BlockBody::Scene(SceneKind::Emergence),
            policy: HoldPolicy::Exact(0),
            hold_frames: 0,
        };
        assert_eq!(b.duration_frames(), LINE_FADE + FADE_OUT + BLOCK_BLACK);
    }

    #[test]
    fn line_alpha_hits_exact_boundaries() {
        let b = lines_block(2, 40);
        // First frame: invisible.
        assert_eq!(b.line_alpha(0, 0), 0.0);
        // A line is fully in LINE_FADE frames after its start.
        assert_eq!(b.line_alpha(LINE_FADE, 0), 1.0);
        assert_eq!(b.line_alpha(LINE_GAP + LINE_FADE, 1), 1.0);
        // Before its start a line does not exist.
        assert_eq!(b.line_alpha(LINE_GAP - 1, 1), 0.0);
    }

    #[test]
    fn block_alpha_is_zero_after_fade_out() {
        let b = lines_block(1, 30);
        let fade_start = b.appear_frames() + b.hold_frames;
        assert_eq!(b.block_alpha(fade_start - 1), 1.0);
        assert!(b.block_alpha(fade_start + FADE_OUT / 2) < 1.0);
        assert_eq!(b.block_alpha(fade_start + FADE_OUT), 0.0);
        assert_eq!(b.line_alpha(fade_start + FADE_OUT, 0), 0.0);
        assert_eq!(b.block_alpha(b.duration_frames() - 1), 0.0);
    }

    #[test]
    fn exact_policy_reports_normal_importance() {
        assert_eq!(HoldPolicy::Exact(10).importance(), Importance::Normal);
        assert_eq!(HoldPolicy::Timed(Importance::Linger).importance(), Importance::Linger);
    }
}
