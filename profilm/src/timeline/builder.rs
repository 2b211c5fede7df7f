use crate::foundation::core::Fps;
use crate::foundation::error::ProfilmResult;
use crate::foundation::math::{derive_seed, Lcg64};
use crate::profile::record::{CookieStats, ProfileRecord};
use crate::timeline::block::{Block, BlockBody, BlockTag, HoldPolicy, Importance, SceneKind};
use crate::timeline::schedule::Schedule;

/// Baseline hold for a normal block before any scaling.
pub const BASE_HOLD_SECS: f64 = 1.6;

/// Which script a schedule is built from. Variants differ only in block
/// membership; pacing, content and ordering rules are shared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptVariant {
    /// The complete film.
    #[default]
    Full,
    /// Monologue-focused cut: only the opening and closing scenes survive.
    Essential,
    /// Short teaser cut.
    Trailer,
}

impl ScriptVariant {
    fn includes(self, tag: BlockTag) -> bool {
        match self {
            Self::Full => true,
            Self::Essential => !matches!(
                tag,
                BlockTag::IdentityScene
                    | BlockTag::ConstellationScene
                    | BlockTag::ValuationScene
                    | BlockTag::DataRainScene
            ),
            Self::Trailer => matches!(
                tag,
                BlockTag::EmergenceScene
                    | BlockTag::Intro
                    | BlockTag::EntropyIntro
                    | BlockTag::PriceReveal
                    | BlockTag::DataRainScene
                    | BlockTag::OutroScene
            ),
        }
    }
}

type Draft = (BlockTag, BlockBody, HoldPolicy);

fn text(tag: BlockTag, lines: Vec<String>, importance: Importance) -> Draft {
    (tag, BlockBody::Lines(lines), HoldPolicy::Timed(importance))
}

fn scene(tag: BlockTag, kind: SceneKind, policy: HoldPolicy) -> Draft {
    (tag, BlockBody::Scene(kind), policy)
}

/// Build the block schedule for `record`.
///
/// Pure in `record` except for hold jitter, which comes from an LCG seeded
/// off the visitor identifier, so identical input reproduces an identical
/// schedule. Conditional blocks appear only when their profile group is
/// present; omitting them never reorders the rest.
pub fn build(record: &ProfileRecord, variant: ScriptVariant, fps: Fps) -> ProfilmResult<Schedule> {
    record.validate()?;
    let seed = derive_seed(record.visitor_id.as_deref());
    let mut rng = Lcg64::new(seed);

    let drafts: Vec<Draft> = compose(record)
        .into_iter()
        .filter(|(tag, _, _)| variant.includes(*tag))
        .collect();

    let total = drafts.len();
    let mut blocks = Vec::with_capacity(total);
    for (i, (tag, body, policy)) in drafts.into_iter().enumerate() {
        let hold_frames = hold_frames(&body, policy, i, total, fps, &mut rng);
        blocks.push(Block { tag, body, policy, hold_frames });
    }
    Schedule::new(blocks, seed, fps)
}

/// The fixed, content-conditional script. Ordering here is the contract.
fn compose(record: &ProfileRecord) -> Vec<Draft> {
    let mut drafts = vec![
        scene(BlockTag::EmergenceScene, SceneKind::Emergence, HoldPolicy::Exact(100)),
        text(BlockTag::Intro, intro_lines(), Importance::Normal),
        text(BlockTag::Device, device_lines(record), Importance::Normal),
        text(BlockTag::Location, location_lines(record), Importance::Normal),
    ];
    if let Some(mismatch) = language_mismatch_lines(record) {
        drafts.push(text(BlockTag::LanguageMismatch, mismatch, Importance::Flash));
    }

    drafts.push(scene(
        BlockTag::IdentityScene,
        SceneKind::Identity,
        HoldPolicy::Timed(Importance::Normal),
    ));
    drafts.push(text(BlockTag::Subject, subject_lines(record), Importance::Normal));
    drafts.push(text(BlockTag::EntropyIntro, entropy_intro_lines(record), Importance::Linger));
    drafts.push(scene(
        BlockTag::ConstellationScene,
        SceneKind::EntropyConstellation,
        HoldPolicy::Timed(Importance::Linger),
    ));

    if let Some(signals) = top_signal_lines(record) {
        drafts.push(text(BlockTag::TopSignals, signals, Importance::Normal));
    }
    let cookies = record.extras.as_ref().and_then(|e| e.cookies.as_ref());
    if let Some(stats) = cookies.filter(|c| c.total > 0) {
        drafts.push(text(BlockTag::CookieSummary, cookie_summary_lines(stats), Importance::Linger));
        if !stats.top_trackers.is_empty() {
            drafts.push(text(BlockTag::TopTrackers, top_tracker_lines(stats), Importance::Normal));
        }
    }
    if let Some(extras) = &record.extras
        && !extras.browsing_patterns.is_empty()
    {
        drafts.push(text(
            BlockTag::BrowsingPatterns,
            browsing_pattern_lines(&extras.browsing_patterns),
            Importance::Normal,
        ));
    }

    drafts.push(scene(BlockTag::ValuationScene, SceneKind::Valuation, HoldPolicy::Exact(130)));
    if !record.pricing.factors.is_empty() {
        drafts.push(text(BlockTag::PricingFactors, pricing_factor_lines(record), Importance::Normal));
    }
    drafts.push(text(BlockTag::PriceReveal, price_reveal_lines(record), Importance::Linger));

    drafts.push(scene(
        BlockTag::DataRainScene,
        SceneKind::DataRain,
        HoldPolicy::Timed(Importance::Normal),
    ));
    drafts.push(text(BlockTag::Closing, closing_lines(), Importance::Linger));
    drafts.push(scene(
        BlockTag::OutroScene,
        SceneKind::Outro,
        HoldPolicy::Timed(Importance::Linger),
    ));

    drafts
}

/// The "scared timing" model: front-loaded, relaxed through the middle,
/// accelerating through the last quarter.
fn position_multiplier(u: f64) -> f64 {
    if u < 0.25 {
        1.3 - 1.2 * u
    } else if u < 0.75 {
        1.0
    } else {
        (1.0 - 2.2 * (u - 0.75)).max(0.4)
    }
}

fn content_scale(body: &BlockBody) -> f64 {
    match body {
        BlockBody::Scene(_) => 1.0,
        BlockBody::Lines(lines) => {
            let chars: usize = lines.iter().map(|l| l.chars().count()).sum();
            (0.55 + chars as f64 / 90.0).clamp(0.7, 1.9)
        }
    }
}

fn hold_frames(
    body: &BlockBody,
    policy: HoldPolicy,
    index: usize,
    total: usize,
    fps: Fps,
    rng: &mut Lcg64,
) -> u64 {
    match policy {
        HoldPolicy::Exact(frames) => frames,
        HoldPolicy::Timed(importance) => {
            let u = index as f64 / total.max(1) as f64;
            let jitter = 0.75 + 0.5 * rng.next_f64_01();
            let secs = BASE_HOLD_SECS
                * position_multiplier(u)
                * content_scale(body)
                * importance.hold_multiplier()
                * jitter;
            fps.secs_to_frames_round(secs)
        }
    }
}

fn intro_lines() -> Vec<String> {
    vec![
        "Hello.".into(),
        String::new(),
        "This page read you while you read it.".into(),
        "Here is what it saw.".into(),
    ]
}

fn device_lines(record: &ProfileRecord) -> Vec<String> {
    let d = &record.device;
    let mut lines = vec![format!("{} on {}.", d.browser, d.platform)];
    if let Some(screen) = d.screen {
        lines.push(format!("A {}\u{d7}{} screen.", screen.width, screen.height));
    }
    match (d.cores, d.memory_gb) {
        (Some(cores), Some(mem)) => {
            lines.push(format!("{} cores, {} GB of memory.", cores, format_gb(mem)));
        }
        (Some(cores), None) => lines.push(format!("{cores} cores.")),
        (None, Some(mem)) => lines.push(format!("{} GB of memory.", format_gb(mem))),
        (None, None) => {}
    }
    lines
}

fn location_lines(record: &ProfileRecord) -> Vec<String> {
    let l = &record.location;
    let mut lines = Vec::new();
    match (&l.city, &l.country) {
        (Some(city), Some(country)) => lines.push(format!("{city}, {country}.")),
        (Some(city), None) => lines.push(format!("{city}.")),
        (None, Some(country)) => lines.push(format!("{country}.")),
        (None, None) => {}
    }
    if let Some(tz) = &l.timezone {
        lines.push(format!("Your clock is set to {tz}."));
    }
    if let Some(isp) = &l.isp {
        lines.push(format!("You connect through {isp}."));
    }
    if lines.is_empty() {
        lines.push("No location resolved.".into());
        lines.push("Hiding is also a signal.".into());
    }
    lines
}

/// Region subtag of a BCP 47 language tag, e.g. `en-US` yields `US`.
fn language_region(tag: &str) -> Option<String> {
    let parts: Vec<&str> = tag.split(['-', '_']).collect();
    if parts.len() < 2 {
        return None;
    }
    let last = parts.last()?;
    (last.len() == 2 && last.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| last.to_ascii_uppercase())
}

fn language_mismatch_lines(record: &ProfileRecord) -> Option<Vec<String>> {
    let language = record.subject.language.as_deref()?;
    let region = language_region(language)?;
    let country = record.location.country_code.as_deref()?;
    if region == country.to_ascii_uppercase() {
        return None;
    }
    Some(vec![
        format!("Your browser prefers {language}."),
        format!("Your network sits in {}.", country.to_ascii_uppercase()),
        "One of those is a story.".into(),
    ])
}

fn subject_lines(record: &ProfileRecord) -> Vec<String> {
    let s = &record.subject;
    let mut facts = Vec::new();
    if let Some(p) = &s.profession {
        facts.push(format!("Occupation: {p}."));
    }
    if let Some(b) = &s.income_bracket {
        facts.push(format!("Income: {b}."));
    }
    if let Some(t) = &s.tech_literacy {
        facts.push(format!("Tech literacy: {t}."));
    }
    if facts.is_empty() {
        return vec!["You give away less than most.".into(), "Still enough to file you.".into()];
    }
    let mut lines = vec!["What the patterns suggest:".into()];
    lines.append(&mut facts);
    lines.push(String::new());
    lines.push("Nobody asked you anything.".into());
    lines
}

fn entropy_intro_lines(record: &ProfileRecord) -> Vec<String> {
    let bits = record.entropy.total_bits;
    if bits <= 0.0 {
        return vec![
            "0.0 bits of identifying entropy.".into(),
            String::new(),
            "You are a ghost. For now.".into(),
        ];
    }
    let population = format_count(2f64.powf(bits));
    vec![
        format!("{bits:.1} bits of identifying entropy."),
        String::new(),
        format!("Enough to pick you out of {population} people."),
    ]
}

fn top_signal_lines(record: &ProfileRecord) -> Option<Vec<String>> {
    let mut present: Vec<_> = record.present_contributions().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| {
        b.bits.total_cmp(&a.bits).then_with(|| a.label.cmp(&b.label))
    });
    let mut lines = vec!["Your loudest signals:".into()];
    for c in present.iter().take(3) {
        lines.push(format!("{}: {:.1} bits.", c.label, c.bits));
    }
    Some(lines)
}

fn cookie_summary_lines(stats: &CookieStats) -> Vec<String> {
    let pct = (f64::from(stats.trackers) / f64::from(stats.total) * 100.0).round() as u32;
    vec![
        format!("{} cookies found.", stats.total),
        format!("{} belong to known trackers.", stats.trackers),
        format!("{pct}% surveillance."),
    ]
}

fn top_tracker_lines(stats: &CookieStats) -> Vec<String> {
    let mut lines = vec!["They have names:".into()];
    for tracker in stats.top_trackers.iter().take(4) {
        lines.push(tracker.clone());
    }
    let rest = stats.top_trackers.len().saturating_sub(4);
    if rest > 0 {
        lines.push(format!("And {rest} more."));
    }
    lines
}

fn browsing_pattern_lines(patterns: &[String]) -> Vec<String> {
    let mut lines = vec!["Your history has a rhythm:".into()];
    for p in patterns.iter().take(3) {
        lines.push(p.clone());
    }
    lines
}

fn pricing_factor_lines(record: &ProfileRecord) -> Vec<String> {
    let mut lines = vec!["What sets your price:".into()];
    for f in record.pricing.factors.iter().take(4) {
        if f.effect.trim().is_empty() {
            lines.push(format!("{}: {}.", f.label, f.value));
        } else {
            lines.push(format!("{}: {} ({}).", f.label, f.value, f.effect));
        }
    }
    lines
}

fn price_reveal_lines(record: &ProfileRecord) -> Vec<String> {
    vec![
        "Your attention, bundled and sold:".into(),
        format!("${:.2} per thousand impressions.", record.pricing.price_usd),
        String::new(),
        "You were never the customer.".into(),
    ]
}

fn closing_lines() -> Vec<String> {
    vec![
        "All of this from a single page load.".into(),
        "No permissions. No questions.".into(),
        String::new(),
        "Now multiply by every page you have ever opened.".into(),
    ]
}

fn format_gb(gb: f64) -> String {
    if gb.fract() == 0.0 {
        format!("{gb:.0}")
    } else {
        format!("{gb:.1}")
    }
}

/// Humanize a (possibly huge) count for narration.
fn format_count(n: f64) -> String {
    if n >= 1e12 {
        format!("{:.1} trillion", n / 1e12)
    } else if n >= 1e9 {
        format!("{:.1} billion", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.1} million", n / 1e6)
    } else {
        group_thousands(n.round() as u64)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
