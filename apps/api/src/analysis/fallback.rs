//! The fixed fallback AnalysisResult used whenever model output is unusable
//! or the persisted slot cannot be read.

use crate::analysis::models::{AnalysisResult, Profile, Routine, Step};

pub const DEFAULT_SKIN_TYPE: &str = "Combination";
pub const DEFAULT_CONCERNS: [&str; 2] = ["Acne", "Uneven Tone"];
pub const FALLBACK_HYDRATION_SCORE: u8 = 65;
pub const FALLBACK_OILINESS_SCORE: u8 = 70;

pub const FALLBACK_TIPS: [&str; 5] = [
    "Drink at least 8 glasses of water daily to maintain skin hydration",
    "Change pillowcases 2-3 times per week to prevent bacteria buildup",
    "Avoid touching your face throughout the day",
    "Incorporate foods rich in omega-3 fatty acids and antioxidants",
    "Cleanse skin immediately after exercising to prevent breakouts",
];

fn morning_routine() -> Routine {
    Routine {
        steps: vec![
            Step::new(
                "Cleanse",
                "Gentle Foaming Cleanser",
                "Removes impurities without stripping natural oils",
            ),
            Step::new(
                "Moisturize",
                "Oil-Free Moisturizer",
                "Hydrates without clogging pores",
            ),
            Step::new(
                "Protect",
                "Broad Spectrum SPF 30+",
                "Shields skin from harmful UV rays",
            ),
        ],
    }
}

fn evening_routine() -> Routine {
    Routine {
        steps: vec![
            Step::new(
                "Cleanse",
                "Double Cleansing Method",
                "Oil cleanser followed by water-based cleanser",
            ),
            Step::new(
                "Treat",
                "Niacinamide Serum",
                "Reduces inflammation and regulates oil production",
            ),
            Step::new(
                "Moisturize",
                "Hydrating Night Cream",
                "Repairs skin barrier and prevents moisture loss",
            ),
        ],
    }
}

/// Fallback for a specific profile: keeps the user's own skin type and
/// concerns when they gave any.
pub fn fallback_result(profile: &Profile) -> AnalysisResult {
    let skin_type = profile
        .skin_type
        .map(|t| t.id().to_string())
        .unwrap_or_else(|| DEFAULT_SKIN_TYPE.to_string());

    let concerns = if profile.skin_concerns.is_empty() {
        DEFAULT_CONCERNS.iter().map(|c| c.to_string()).collect()
    } else {
        profile.concern_ids()
    };

    AnalysisResult {
        skin_type,
        concerns,
        morning_routine: morning_routine(),
        evening_routine: evening_routine(),
        hydration_score: FALLBACK_HYDRATION_SCORE,
        oiliness_score: FALLBACK_OILINESS_SCORE,
        tips: FALLBACK_TIPS.iter().map(|t| t.to_string()).collect(),
    }
}

/// Profile-independent fallback served by the results read site.
pub fn canonical_fallback() -> AnalysisResult {
    fallback_result(&Profile::default())
}
