use crate::foundation::error::{ProfilmError, ProfilmResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Basic device and browser facts.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviceFacts {
    /// Browser name and version, e.g. `"Chrome 120"`.
    pub browser: String,
    /// Operating system or platform, e.g. `"macOS"`.
    pub platform: String,
    /// Physical screen size in pixels, when known.
    #[serde(default)]
    pub screen: Option<ScreenFacts>,
    /// Logical CPU core count, when exposed.
    #[serde(default)]
    pub cores: Option<u32>,
    /// Device memory in gigabytes, when exposed.
    #[serde(default)]
    pub memory_gb: Option<f64>,
}

/// Reported screen geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScreenFacts {
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
}

/// Network-derived location facts. Every field is optional; absent fields
/// suppress the corresponding line of narration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocationFacts {
    /// City name.
    #[serde(default)]
    pub city: Option<String>,
    /// Country name.
    #[serde(default)]
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default)]
    pub country_code: Option<String>,
    /// IANA timezone identifier.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Internet service provider name.
    #[serde(default)]
    pub isp: Option<String>,
}

/// Inferred facts about the person behind the browser.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubjectFacts {
    /// Primary browser language tag, e.g. `"en-US"`.
    #[serde(default)]
    pub language: Option<String>,
    /// Inferred profession.
    #[serde(default)]
    pub profession: Option<String>,
    /// Inferred income bracket label.
    #[serde(default)]
    pub income_bracket: Option<String>,
    /// Inferred technical-literacy label.
    #[serde(default)]
    pub tech_literacy: Option<String>,
}

/// One fingerprinting signal and its information content.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntropyContribution {
    /// Signal label, e.g. `"canvas fingerprint"`.
    pub label: String,
    /// Information content in bits.
    pub bits: f64,
    /// Whether the signal was actually observed on this subject.
    pub present: bool,
}

/// Aggregate identifiability estimate.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntropyFacts {
    /// Total bits across present contributions.
    pub total_bits: f64,
    /// Per-signal breakdown.
    #[serde(default)]
    pub contributions: Vec<EntropyContribution>,
}

/// One factor feeding the ad-value estimate.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PricingFactor {
    /// Factor label, e.g. `"income bracket"`.
    pub label: String,
    /// Factor value as shown to the subject.
    pub value: String,
    /// Textual effect, e.g. `"+40%"`.
    pub effect: String,
}

/// Estimated advertising value of the subject.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PricingFacts {
    /// Estimated CPM in US dollars.
    pub price_usd: f64,
    /// Factors behind the estimate.
    #[serde(default)]
    pub factors: Vec<PricingFactor>,
}

/// Cookie and tracker statistics gathered by the extension collaborator.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CookieStats {
    /// Total cookies observed.
    pub total: u32,
    /// Cookies attributed to known trackers.
    pub trackers: u32,
    /// Cookie counts by category.
    #[serde(default)]
    pub categories: BTreeMap<String, u32>,
    /// Most frequent tracker domains, ordered by prevalence.
    #[serde(default)]
    pub top_trackers: Vec<String>,
}

/// Optional extension-sourced data. Absent groups omit their blocks without
/// shifting the rest of the schedule.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtensionData {
    /// Cookie statistics, when collected.
    #[serde(default)]
    pub cookies: Option<CookieStats>,
    /// One-line browsing-pattern summaries, when collected.
    #[serde(default)]
    pub browsing_patterns: Vec<String>,
}

/// Immutable input record describing the subject of the film.
///
/// Produced entirely by the external collector/inference pipeline. The
/// renderer never mutates it; optional groups degrade to omitted blocks.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProfileRecord {
    /// Stable visitor identifier used to derive the render seed.
    #[serde(default)]
    pub visitor_id: Option<String>,
    /// Device and browser facts.
    pub device: DeviceFacts,
    /// Location facts.
    #[serde(default)]
    pub location: LocationFacts,
    /// Inferred subject facts.
    #[serde(default)]
    pub subject: SubjectFacts,
    /// Fingerprint entropy estimate.
    pub entropy: EntropyFacts,
    /// Ad-value estimate.
    pub pricing: PricingFacts,
    /// Extension-sourced extras.
    #[serde(default)]
    pub extras: Option<ExtensionData>,
}

impl ProfileRecord {
    /// Parse a profile record from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ProfilmResult<Self> {
        let record: Self = serde_json::from_reader(r)
            .map_err(|e| ProfilmError::input(format!("parse profile JSON: {e}")))?;
        record.validate()?;
        Ok(record)
    }

    /// Parse a profile record from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ProfilmResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ProfilmError::input(format!("open profile JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the record against the renderer's input contract.
    ///
    /// Required groups must be well-formed; optional groups may be absent but
    /// not malformed (e.g. more tracker cookies than cookies).
    pub fn validate(&self) -> ProfilmResult<()> {
        if self.device.browser.trim().is_empty() {
            return Err(ProfilmError::input("device.browser must be non-empty"));
        }
        if self.device.platform.trim().is_empty() {
            return Err(ProfilmError::input("device.platform must be non-empty"));
        }
        if !self.entropy.total_bits.is_finite() || self.entropy.total_bits < 0.0 {
            return Err(ProfilmError::input("entropy.total_bits must be finite and >= 0"));
        }
        for (i, c) in self.entropy.contributions.iter().enumerate() {
            if c.label.trim().is_empty() {
                return Err(ProfilmError::input(format!(
                    "entropy.contributions[{i}].label must be non-empty"
                )));
            }
            if !c.bits.is_finite() || c.bits < 0.0 {
                return Err(ProfilmError::input(format!(
                    "entropy.contributions[{i}].bits must be finite and >= 0"
                )));
            }
        }
        if !self.pricing.price_usd.is_finite() || self.pricing.price_usd < 0.0 {
            return Err(ProfilmError::input("pricing.price_usd must be finite and >= 0"));
        }
        for (i, f) in self.pricing.factors.iter().enumerate() {
            if f.label.trim().is_empty() {
                return Err(ProfilmError::input(format!(
                    "pricing.factors[{i}].label must be non-empty"
                )));
            }
        }
        if let Some(extras) = &self.extras
            && let Some(cookies) = &extras.cookies
            && cookies.trackers > cookies.total
        {
            return Err(ProfilmError::input("cookies.trackers must be <= cookies.total"));
        }
        Ok(())
    }

    /// Contributions that were actually observed and carry information.
    pub fn present_contributions(&self) -> impl Iterator<Item = &EntropyContribution> {
        self.entropy.contributions.iter().filter(|c| c.present && c.bits > 0.0)
    }

    /// Largest single contribution in bits, used to normalize node sizing.
    pub fn max_contribution_bits(&self) -> f64 {
        self.present_contributions().map(|c| c.bits).fold(0.0, f64::max)
    }
}
