//! Weekly split templates.
//!
//! The table is product configuration: one template per training
//! frequency from 2 to 7 days.

use serde::Serialize;

use repforge_core::SplitType;

/// Named weekly templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SplitTemplate {
    FullBody,
    PushPullLegs,
    UpperLower,
    BroSplit,
    PushPullLegsTwice,
    PushPullLegsTwicePlusFullBody,
}

/// One day of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitDay {
    pub split_type: SplitType,
    pub focus_muscles: Vec<String>,
    pub day_label: String,
    /// Days after Monday.
    pub weekday_offset: u32,
}

/// A resolved template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPlan {
    pub template: SplitTemplate,
    pub split_name: String,
    pub days: Vec<SplitDay>,
}

impl SplitTemplate {
    /// Template for a training frequency. Outside 2..=7 the 3-day
    /// template is used.
    pub fn for_days(days_per_week: u32) -> Self {
        match days_per_week {
            2 => SplitTemplate::FullBody,
            3 => SplitTemplate::PushPullLegs,
            4 => SplitTemplate::UpperLower,
            5 => SplitTemplate::BroSplit,
            6 => SplitTemplate::PushPullLegsTwice,
            7 => SplitTemplate::PushPullLegsTwicePlusFullBody,
            _ => SplitTemplate::PushPullLegs,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SplitTemplate::FullBody => "Full Body",
            SplitTemplate::PushPullLegs => "Push/Pull/Legs",
            SplitTemplate::UpperLower => "Upper/Lower",
            SplitTemplate::BroSplit => "Bro Split",
            SplitTemplate::PushPullLegsTwice => "Push/Pull/Legs x2",
            SplitTemplate::PushPullLegsTwicePlusFullBody => "Push/Pull/Legs x2 + Full Body",
        }
    }

    /// Split type and weekday offset of each day.
    fn schedule(self) -> &'static [(SplitType, u32)] {
        use SplitType::*;
        match self {
            SplitTemplate::FullBody => &[(FullBody, 0), (FullBody, 3)],
            SplitTemplate::PushPullLegs => &[(Push, 0), (Pull, 2), (Legs, 4)],
            SplitTemplate::UpperLower => &[(Upper, 0), (Lower, 1), (Upper, 3), (Lower, 4)],
            SplitTemplate::BroSplit => &[(Chest, 0), (Back, 1), (Legs, 2), (Shoulders, 3), (Arms, 4)],
            SplitTemplate::PushPullLegsTwice => {
                &[(Push, 0), (Pull, 1), (Legs, 2), (Push, 3), (Pull, 4), (Legs, 5)]
            }
            SplitTemplate::PushPullLegsTwicePlusFullBody => &[
                (Push, 0),
                (Pull, 1),
                (Legs, 2),
                (Push, 3),
                (Pull, 4),
                (Legs, 5),
                (FullBody, 6),
            ],
        }
    }

    pub fn days(self) -> Vec<SplitDay> {
        self.schedule()
            .iter()
            .enumerate()
            .map(|(i, &(split_type, weekday_offset))| SplitDay {
                split_type,
                focus_muscles: focus_muscles(split_type).iter().map(|m| m.to_string()).collect(),
                day_label: format!("Day {}: {}", i + 1, label(split_type)),
                weekday_offset,
            })
            .collect()
    }
}

/// Muscles trained on a day of the given type.
pub fn focus_muscles(split: SplitType) -> &'static [&'static str] {
    match split {
        SplitType::FullBody => &["chest", "back", "quadriceps", "hamstrings", "shoulders", "core"],
        SplitType::Upper => &["chest", "back", "shoulders", "biceps", "triceps"],
        SplitType::Lower => &["quadriceps", "hamstrings", "glutes", "calves"],
        SplitType::Push => &["chest", "shoulders", "triceps"],
        SplitType::Pull => &["back", "biceps", "rear_delts"],
        SplitType::Legs => &["quadriceps", "hamstrings", "glutes", "calves"],
        SplitType::Chest => &["chest", "triceps"],
        SplitType::Back => &["back", "biceps"],
        SplitType::Shoulders => &["shoulders", "traps"],
        SplitType::Arms => &["biceps", "triceps", "forearms"],
    }
}

pub fn label(split: SplitType) -> &'static str {
    match split {
        SplitType::FullBody => "Full Body",
        SplitType::Upper => "Upper Body",
        SplitType::Lower => "Lower Body",
        SplitType::Push => "Push",
        SplitType::Pull => "Pull",
        SplitType::Legs => "Legs",
        SplitType::Chest => "Chest",
        SplitType::Back => "Back",
        SplitType::Shoulders => "Shoulders",
        SplitType::Arms => "Arms",
    }
}

/// Resolve the template for a training frequency.
pub fn plan_for(days_per_week: u32) -> SplitPlan {
    let template = SplitTemplate::for_days(days_per_week);
    SplitPlan {
        template,
        split_name: template.name().to_string(),
        days: template.days(),
    }
}
