//! Contraindication filter.
//!
//! A user's health record is turned into a set of lower-case tokens. An
//! exercise is excluded when its lower-cased name, slug or movement pattern
//! contains any token as a substring. Excluded exercises are dropped, not
//! down-scored.

use std::collections::BTreeSet;

use tracing::debug;

use repforge_core::{Exercise, UserHealth};

/// Added for pregnancy: lying on the back, high impact, twisting.
pub const PREGNANCY_TOKENS: &[&str] = &["supine", "lying", "crunch", "sit_up", "jump", "burpee", "twist"];

/// Added after recent surgery: heavy compound lifts.
pub const RECENT_SURGERY_TOKENS: &[&str] = &["heavy", "deadlift", "clean", "snatch", "max_effort"];

/// Injury sites with a fixed exclusion list each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Injury {
    Knee,
    Shoulder,
    LowerBack,
    Wrist,
    Ankle,
    Hip,
    Neck,
    Elbow,
}

impl Injury {
    pub fn parse(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "knee" | "knees" | "acl" | "meniscus" => Some(Injury::Knee),
            "shoulder" | "shoulders" | "rotator_cuff" => Some(Injury::Shoulder),
            "back" | "lower_back" | "lumbar" | "spine" => Some(Injury::LowerBack),
            "wrist" | "wrists" => Some(Injury::Wrist),
            "ankle" | "ankles" | "achilles" => Some(Injury::Ankle),
            "hip" | "hips" => Some(Injury::Hip),
            "neck" | "cervical" => Some(Injury::Neck),
            "elbow" | "elbows" | "tennis_elbow" => Some(Injury::Elbow),
            _ => None,
        }
    }

    pub fn excluded_tokens(self) -> &'static [&'static str] {
        match self {
            Injury::Knee => &["squat", "lunge", "leg_press", "leg_extension", "jump"],
            Injury::Shoulder => &["overhead", "military_press", "upright_row", "dip", "handstand", "snatch"],
            Injury::LowerBack => &["deadlift", "good_morning", "hyperextension", "bent_over", "sit_up"],
            Injury::Wrist => &["handstand", "burpee", "clean", "front_squat"],
            Injury::Ankle => &["jump", "hop", "sprint", "skip", "plyo"],
            Injury::Hip => &["lunge", "split_squat", "sumo", "step_up"],
            Injury::Neck => &["shrug", "headstand", "behind_neck"],
            Injury::Elbow => &["skull_crusher", "dip", "close_grip"],
        }
    }
}

/// Chronic conditions with a fixed exclusion list each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChronicCondition {
    Hypertension,
    Osteoporosis,
    Arthritis,
    Asthma,
    HeartDisease,
}

impl ChronicCondition {
    pub fn parse(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "hypertension" | "high_blood_pressure" => Some(ChronicCondition::Hypertension),
            "osteoporosis" | "osteopenia" => Some(ChronicCondition::Osteoporosis),
            "arthritis" | "osteoarthritis" | "rheumatoid_arthritis" => Some(ChronicCondition::Arthritis),
            "asthma" => Some(ChronicCondition::Asthma),
            "heart_disease" | "cardiovascular_disease" | "heart_condition" => {
                Some(ChronicCondition::HeartDisease)
            }
            _ => None,
        }
    }

    pub fn excluded_tokens(self) -> &'static [&'static str] {
        match self {
            ChronicCondition::Hypertension => &["heavy", "max_effort", "headstand", "handstand"],
            ChronicCondition::Osteoporosis => &["jump", "twist", "crunch", "sit_up", "heavy"],
            ChronicCondition::Arthritis => &["jump", "plyo", "sprint"],
            ChronicCondition::Asthma => &["sprint", "burpee"],
            ChronicCondition::HeartDisease => &["sprint", "burpee", "max_effort", "heavy"],
        }
    }
}

/// Lower-case tokens an exercise must not contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    tokens: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, lower-cased. Blank tokens are ignored since they
    /// would match every exercise.
    pub fn insert(&mut self, token: &str) {
        let token = token.trim().to_lowercase();
        if !token.is_empty() {
            self.tokens.insert(token);
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

/// Build the exclusion set for a health record. All rules are additive.
pub fn derive_exclusions(health: &UserHealth) -> ExclusionSet {
    let mut set = ExclusionSet::new();

    for injury in &health.injuries {
        match Injury::parse(injury) {
            Some(site) => site.excluded_tokens().iter().for_each(|t| set.insert(t)),
            None => debug!("Unknown injury token {:?}, no exclusions added", injury),
        }
    }
    for condition in &health.chronic_conditions {
        match ChronicCondition::parse(condition) {
            Some(c) => c.excluded_tokens().iter().for_each(|t| set.insert(t)),
            None => debug!("Unknown chronic condition {:?}, no exclusions added", condition),
        }
    }

    for token in health
        .contraindicated_movements
        .iter()
        .chain(health.contraindicated_exercises.iter())
    {
        set.insert(token);
    }

    if health.pregnant {
        PREGNANCY_TOKENS.iter().for_each(|t| set.insert(t));
    }
    if health.recent_surgery {
        RECENT_SURGERY_TOKENS.iter().for_each(|t| set.insert(t));
    }

    set
}

/// True iff name, slug or movement pattern contains an excluded token.
pub fn is_excluded(exercise: &Exercise, exclusions: &ExclusionSet) -> bool {
    if exclusions.is_empty() {
        return false;
    }
    let fields = [
        exercise.name.to_lowercase(),
        exercise.slug.to_lowercase(),
        exercise.movement_pattern.to_lowercase(),
    ];
    exclusions
        .iter()
        .any(|token| fields.iter().any(|f| f.contains(token)))
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase().replace([' ', '-'], "_")
}
