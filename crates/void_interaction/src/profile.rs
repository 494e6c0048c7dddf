//! Interaction profiles - per-title tuning loaded from TOML
//!
//! A profile bundles the physics configuration, feedback queue sizes,
//! comfort settings, hand tuning and the feedback preset used for each
//! interaction category. Everything is optional; missing values fall back
//! to the built-in defaults.
//!
//! # Profile Format
//!
//! ```toml
//! [profile]
//! name = "escape-room"
//!
//! [physics]
//! preset = "vr"
//! max_collisions = 128
//! gravity = [0.0, -9.81, 0.0]
//!
//! [feedback]
//! haptic_capacity = 64
//!
//! [comfort]
//! haptic_scale = 0.8
//! performance_mode = false
//!
//! [hands]
//! radius = 0.06
//! push_strength = 2.0
//!
//! [presets.door]
//! haptic = "medium"
//! intensity = 0.7
//! duration = 0.3
//! highlight = [0.0, 1.0, 0.0]
//! ```

use crate::error::{ProfileError, ProfileResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use void_feedback::{colors, FeedbackConfig, HapticCategory};
use void_physics::{GravityModel, LayerGating, PhysicsBackend, PhysicsConfig};

/// Kind of object being interacted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionCategory {
    #[default]
    Generic,
    Door,
    Weapon,
    Vehicle,
    Npc,
    Environment,
    Inventory,
    Puzzle,
}

impl InteractionCategory {
    /// Every category, in declaration order
    pub const ALL: [InteractionCategory; 8] = [
        Self::Generic,
        Self::Door,
        Self::Weapon,
        Self::Vehicle,
        Self::Npc,
        Self::Environment,
        Self::Inventory,
        Self::Puzzle,
    ];

    /// Lowercase name as used in profile files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Door => "door",
            Self::Weapon => "weapon",
            Self::Vehicle => "vehicle",
            Self::Npc => "npc",
            Self::Environment => "environment",
            Self::Inventory => "inventory",
            Self::Puzzle => "puzzle",
        }
    }
}

impl std::fmt::Display for InteractionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionCategory {
    type Err = ProfileError;

    fn from_str(s: &str) -> ProfileResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProfileError::UnknownCategory(s.to_string()))
    }
}

/// Feedback emitted when an object of some category is interacted with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPreset {
    pub haptic: HapticCategory,
    /// Pulse strength in [0, 1]
    pub intensity: f32,
    /// Pulse length in seconds
    pub duration: f32,
    /// Highlight colour, if the object should light up
    pub highlight: Option<Vec3>,
    /// Highlight strength in [0, 1]
    pub highlight_intensity: f32,
}

impl FeedbackPreset {
    /// Built-in preset for a category
    pub fn default_for(category: InteractionCategory) -> Self {
        use InteractionCategory::*;
        let (haptic, intensity, duration, highlight, highlight_intensity) = match category {
            Generic => (HapticCategory::Light, 0.5, 0.2, Some(colors::WHITE), 0.8),
            Door => (HapticCategory::Medium, 0.7, 0.3, Some(colors::GREEN), 0.8),
            Weapon => (HapticCategory::Heavy, 0.9, 0.5, Some(colors::ORANGE), 1.0),
            Vehicle => (HapticCategory::Light, 0.4, 0.2, None, 0.0),
            Npc => (HapticCategory::Medium, 0.6, 0.3, Some(colors::BLUE), 0.7),
            Environment => (HapticCategory::Light, 0.3, 0.2, None, 0.0),
            Inventory => (HapticCategory::Custom, 0.8, 0.4, Some(colors::YELLOW), 0.9),
            Puzzle => (HapticCategory::Medium, 0.5, 0.25, Some(colors::CYAN), 0.8),
        };
        Self {
            haptic,
            intensity,
            duration,
            highlight,
            highlight_intensity,
        }
    }

    fn validate(&self, category: InteractionCategory) -> ProfileResult<()> {
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(ProfileError::Validation(format!(
                "preset {}: intensity must be in [0, 1], got {}",
                category, self.intensity
            )));
        }
        if !(0.0..=1.0).contains(&self.highlight_intensity) {
            return Err(ProfileError::Validation(format!(
                "preset {}: highlight_intensity must be in [0, 1], got {}",
                category, self.highlight_intensity
            )));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ProfileError::Validation(format!(
                "preset {}: duration must be non-negative, got {}",
                category, self.duration
            )));
        }
        if let Some(color) = self.highlight {
            if !(color.is_finite() && color.min_element() >= 0.0 && color.max_element() <= 1.0) {
                return Err(ProfileError::Validation(format!(
                    "preset {}: highlight channels must be in [0, 1]",
                    category
                )));
            }
        }
        Ok(())
    }
}

/// Player comfort and device performance settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfortProfile {
    /// Multiplier on every haptic intensity
    pub haptic_scale: f32,
    /// Multiplier on every highlight intensity
    pub visual_scale: f32,
    /// Upper bound on haptic intensity after scaling
    pub max_haptic_intensity: f32,
    /// Suppress highlights on constrained devices
    pub performance_mode: bool,
}

impl Default for ComfortProfile {
    fn default() -> Self {
        Self {
            haptic_scale: 1.0,
            visual_scale: 1.0,
            max_haptic_intensity: 1.0,
            performance_mode: false,
        }
    }
}

impl ComfortProfile {
    /// Haptic intensity after scaling and capping
    pub fn haptic_intensity(&self, base: f32) -> f32 {
        (base * self.haptic_scale).max(0.0).min(self.max_haptic_intensity.max(0.0))
    }

    /// Highlight intensity after scaling
    pub fn visual_intensity(&self, base: f32) -> f32 {
        (base * self.visual_scale).max(0.0).min(1.0)
    }

    /// Check scales and the haptic cap
    pub fn validate(&self) -> ProfileResult<()> {
        let scales = [
            ("haptic_scale", self.haptic_scale),
            ("visual_scale", self.visual_scale),
        ];
        for (name, value) in scales {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ProfileError::Validation(format!(
                    "comfort.{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.max_haptic_intensity) {
            return Err(ProfileError::Validation(format!(
                "comfort.max_haptic_intensity must be in [0, 1], got {}",
                self.max_haptic_intensity
            )));
        }
        Ok(())
    }
}

/// Tuning of hand proxies and the impulses they apply
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandSettings {
    /// Radius of the hand proxy sphere
    pub radius: f32,
    /// Impulse magnitude for push and pull
    pub push_strength: f32,
    /// Angular impulse magnitude for rotate, open and close
    pub rotate_strength: f32,
    /// Fraction of hand velocity handed to a released object
    pub throw_scale: f32,
}

impl Default for HandSettings {
    fn default() -> Self {
        Self {
            radius: 0.05,
            push_strength: 1.0,
            rotate_strength: 0.5,
            throw_scale: 1.0,
        }
    }
}

impl HandSettings {
    fn validate(&self) -> ProfileResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ProfileError::Validation(format!(
                "hands.radius must be positive, got {}",
                self.radius
            )));
        }
        let magnitudes = [
            ("push_strength", self.push_strength),
            ("rotate_strength", self.rotate_strength),
            ("throw_scale", self.throw_scale),
        ];
        for (name, value) in magnitudes {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ProfileError::Validation(format!(
                    "hands.{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionProfile {
    pub name: String,
    pub physics: PhysicsConfig,
    pub feedback: FeedbackConfig,
    pub comfort: ComfortProfile,
    pub hands: HandSettings,
    presets: BTreeMap<InteractionCategory, FeedbackPreset>,
}

impl Default for InteractionProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            physics: PhysicsConfig::vr(),
            feedback: FeedbackConfig::default(),
            comfort: ComfortProfile::default(),
            hands: HandSettings::default(),
            presets: InteractionCategory::ALL
                .into_iter()
                .map(|c| (c, FeedbackPreset::default_for(c)))
                .collect(),
        }
    }
}

impl InteractionProfile {
    /// Preset for a category
    pub fn preset(&self, category: InteractionCategory) -> FeedbackPreset {
        self.presets
            .get(&category)
            .copied()
            .unwrap_or_else(|| FeedbackPreset::default_for(category))
    }

    /// Replace the preset for a category
    pub fn set_preset(&mut self, category: InteractionCategory, preset: FeedbackPreset) {
        self.presets.insert(category, preset);
    }

    /// Set the comfort settings
    pub fn with_comfort(mut self, comfort: ComfortProfile) -> Self {
        self.comfort = comfort;
        self
    }

    /// Set the physics configuration
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Check every range
    pub fn validate(&self) -> ProfileResult<()> {
        self.physics
            .validate()
            .map_err(|e| ProfileError::Validation(e.to_string()))?;
        if self.feedback.haptic_capacity == 0 || self.feedback.visual_capacity == 0 {
            return Err(ProfileError::Validation(
                "feedback capacities must be at least 1".into(),
            ));
        }
        self.comfort.validate()?;
        self.hands.validate()?;
        for (category, preset) in &self.presets {
            preset.validate(*category)?;
        }
        Ok(())
    }
}

/// Raw TOML structure for profile section
#[derive(Debug, Deserialize, Default)]
struct ProfileHeaderToml {
    name: Option<String>,
}

/// Raw TOML structure for physics section
#[derive(Debug, Deserialize, Default)]
struct PhysicsToml {
    preset: Option<String>,
    timestep: Option<f32>,
    max_substeps: Option<u32>,
    max_collisions: Option<usize>,
    collision_tolerance: Option<f32>,
    gravity: Option<[f32; 3]>,
    layer_gating: Option<LayerGating>,
    constraint_gain: Option<f32>,
    collision_response: Option<bool>,
    backend: Option<String>,
}

/// Raw TOML structure for one preset
#[derive(Debug, Deserialize)]
struct PresetToml {
    haptic: Option<String>,
    intensity: Option<f32>,
    duration: Option<f32>,
    highlight: Option<[f32; 3]>,
    highlight_intensity: Option<f32>,
    #[serde(default)]
    no_highlight: bool,
}

/// Root TOML structure
#[derive(Debug, Deserialize, Default)]
struct InteractionProfileToml {
    #[serde(default)]
    profile: Option<ProfileHeaderToml>,
    #[serde(default)]
    physics: Option<PhysicsToml>,
    #[serde(default)]
    feedback: Option<FeedbackConfig>,
    #[serde(default)]
    comfort: Option<ComfortProfile>,
    #[serde(default)]
    hands: Option<HandSettings>,
    #[serde(default)]
    presets: BTreeMap<String, PresetToml>,
}

fn parse_physics_preset(s: &str) -> ProfileResult<PhysicsConfig> {
    match s.to_lowercase().as_str() {
        "default" => Ok(PhysicsConfig::default()),
        "vr" => Ok(PhysicsConfig::vr()),
        "high_precision" => Ok(PhysicsConfig::high_precision()),
        "fast" => Ok(PhysicsConfig::fast()),
        _ => Err(ProfileError::Validation(format!("Unknown physics preset: {}", s))),
    }
}

fn parse_haptic(s: &str) -> ProfileResult<HapticCategory> {
    match s.to_lowercase().as_str() {
        "light" => Ok(HapticCategory::Light),
        "medium" => Ok(HapticCategory::Medium),
        "heavy" => Ok(HapticCategory::Heavy),
        "custom" => Ok(HapticCategory::Custom),
        _ => Err(ProfileError::UnknownHaptic(s.to_string())),
    }
}

fn build_physics(raw: PhysicsToml) -> ProfileResult<PhysicsConfig> {
    let mut config = match &raw.preset {
        Some(preset) => parse_physics_preset(preset)?,
        None => PhysicsConfig::vr(),
    };

    if let Some(timestep) = raw.timestep {
        config.timestep = timestep;
    }
    if let Some(max_substeps) = raw.max_substeps {
        config.max_substeps = max_substeps;
    }
    if let Some(max_collisions) = raw.max_collisions {
        config.max_collisions = max_collisions;
    }
    if let Some(tolerance) = raw.collision_tolerance {
        config.collision_tolerance = tolerance;
    }
    if let Some([x, y, z]) = raw.gravity {
        config.gravity = GravityModel::Uniform {
            acceleration: Vec3::new(x, y, z),
        };
    }
    if let Some(gating) = raw.layer_gating {
        config.layer_gating = gating;
    }
    if let Some(gain) = raw.constraint_gain {
        config.constraint_gain = gain;
    }
    if let Some(response) = raw.collision_response {
        config.collision_response = response;
    }
    if let Some(backend) = &raw.backend {
        config.backend = backend
            .parse::<PhysicsBackend>()
            .map_err(|e| ProfileError::Validation(e.to_string()))?;
    }

    Ok(config)
}

fn build_preset(category: InteractionCategory, raw: PresetToml) -> ProfileResult<FeedbackPreset> {
    let mut preset = FeedbackPreset::default_for(category);
    if let Some(haptic) = &raw.haptic {
        preset.haptic = parse_haptic(haptic)?;
    }
    if let Some(intensity) = raw.intensity {
        preset.intensity = intensity;
    }
    if let Some(duration) = raw.duration {
        preset.duration = duration;
    }
    if let Some([r, g, b]) = raw.highlight {
        preset.highlight = Some(Vec3::new(r, g, b));
    }
    if let Some(strength) = raw.highlight_intensity {
        preset.highlight_intensity = strength;
    }
    if raw.no_highlight {
        preset.highlight = None;
    }
    Ok(preset)
}

/// Parse a profile from a TOML string
pub fn parse_profile(content: &str) -> ProfileResult<InteractionProfile> {
    let raw: InteractionProfileToml = toml::from_str(content)?;
    let mut profile = InteractionProfile::default();

    if let Some(name) = raw.profile.and_then(|p| p.name) {
        profile.name = name;
    }
    if let Some(physics) = raw.physics {
        profile.physics = build_physics(physics)?;
    }
    if let Some(feedback) = raw.feedback {
        profile.feedback = feedback;
    }
    if let Some(comfort) = raw.comfort {
        profile.comfort = comfort;
    }
    if let Some(hands) = raw.hands {
        profile.hands = hands;
    }
    for (key, preset) in raw.presets {
        let category: InteractionCategory = key.parse()?;
        profile.set_preset(category, build_preset(category, preset)?);
    }

    profile.validate()?;
    Ok(profile)
}

/// Load and parse a profile from a file
pub fn load_profile(path: impl AsRef<Path>) -> ProfileResult<InteractionProfile> {
    let content = std::fs::read_to_string(path)?;
    parse_profile(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_empty_profile() {
        let profile = parse_profile("").unwrap();
        assert_eq!(profile, InteractionProfile::default());
        assert_eq!(profile.preset(InteractionCategory::Door).haptic, HapticCategory::Medium);
    }

    #[test]
    fn test_parse_full_profile() {
        let content = r#"
[profile]
name = "escape-room"

[physics]
preset = "fast"
max_collisions = 32
gravity = [0.0, -1.62, 0.0]
layer_gating = "one_way"
backend = "builtin"

[feedback]
haptic_capacity = 16

[comfort]
haptic_scale = 0.5
performance_mode = true

[hands]
radius = 0.08

[presets.weapon]
intensity = 0.4
no_highlight = true

[presets.Puzzle]
haptic = "heavy"
"#;

        let profile = parse_profile(content).unwrap();
        assert_eq!(profile.name, "escape-room");
        assert_eq!(profile.physics.max_collisions, 32);
        assert_eq!(profile.physics.max_substeps, PhysicsConfig::fast().max_substeps);
        assert_eq!(profile.physics.layer_gating, LayerGating::OneWay);
        assert_eq!(profile.physics.backend, PhysicsBackend::Builtin);
        assert_eq!(profile.feedback.haptic_capacity, 16);
        assert_eq!(profile.feedback.visual_capacity, 100);
        assert!(profile.comfort.performance_mode);
        assert_relative_eq!(profile.comfort.visual_scale, 1.0);
        assert_relative_eq!(profile.hands.radius, 0.08);
        assert_relative_eq!(profile.hands.push_strength, 1.0);

        let weapon = profile.preset(InteractionCategory::Weapon);
        assert_eq!(weapon.haptic, HapticCategory::Heavy);
        assert_relative_eq!(weapon.intensity, 0.4);
        assert!(weapon.highlight.is_none());
        assert_eq!(profile.preset(InteractionCategory::Puzzle).haptic, HapticCategory::Heavy);
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert!(matches!(
            parse_profile("[presets.spaceship]\nintensity = 0.5"),
            Err(ProfileError::UnknownCategory(_))
        ));
        assert!(matches!(
            parse_profile("[presets.door]\nhaptic = \"buzz\""),
            Err(ProfileError::UnknownHaptic(_))
        ));
        assert!(matches!(
            parse_profile("[physics]\npreset = \"ludicrous\""),
            Err(ProfileError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(parse_profile("[comfort]\nmax_haptic_intensity = 1.5").is_err());
        assert!(parse_profile("[hands]\nradius = 0.0").is_err());
        assert!(parse_profile("[physics]\ntimestep = -0.01").is_err());
        assert!(parse_profile("[presets.npc]\nhighlight = [2.0, 0.0, 0.0]").is_err());
        assert!(parse_profile("[feedback]\nvisual_capacity = 0").is_err());
        assert!(matches!(parse_profile("[physics\n"), Err(ProfileError::Parse(_))));
    }

    #[test]
    fn test_comfort_scaling() {
        let comfort = ComfortProfile {
            haptic_scale: 2.0,
            max_haptic_intensity: 0.6,
            visual_scale: 0.5,
            ..Default::default()
        };
        assert_relative_eq!(comfort.haptic_intensity(0.5), 0.6);
        assert_relative_eq!(comfort.haptic_intensity(0.2), 0.4);
        assert_relative_eq!(comfort.visual_intensity(1.0), 0.5);
    }

    #[test]
    fn test_comfort_intensity_never_panics() {
        let broken = ComfortProfile {
            haptic_scale: f32::NAN,
            visual_scale: -2.0,
            max_haptic_intensity: -0.1,
            performance_mode: false,
        };
        assert!(broken.validate().is_err());
        assert_eq!(broken.haptic_intensity(0.5), 0.0);
        assert_eq!(broken.visual_intensity(0.5), 0.0);

        let uncapped = ComfortProfile {
            max_haptic_intensity: f32::NAN,
            ..Default::default()
        };
        assert!(uncapped.validate().is_err());
        assert!(uncapped.haptic_intensity(0.5).is_finite());
    }
}
