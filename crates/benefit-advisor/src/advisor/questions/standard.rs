use super::{BinaryChoices, ChoiceOption, CorrelationTable, Question};
use crate::advisor::domain::{BenefitCategory, QuestionId};

use BenefitCategory::*;

struct Entry {
    id: &'static str,
    prompt: &'static str,
    dimensions: &'static [&'static str],
    a: (&'static str, &'static [(BenefitCategory, f64)]),
    b: (&'static str, &'static [(BenefitCategory, f64)]),
}

const STANDARD_BANK: &[Entry] = &[
    Entry {
        id: "q01_risk_behavior",
        prompt: "Which sounds more appealing for a weekend?",
        dimensions: &["risk_tolerance", "activity_level", "accident_risk"],
        a: (
            "Skydiving, rock climbing, or other adventure sports",
            &[
                (AccidentInsurance, 0.72),
                (LifeInsurance, 0.58),
                (Disability, 0.51),
                (CriticalIllness, 0.38),
                (Medical, 0.41),
            ],
        ),
        b: (
            "Reading, a museum, or other quiet activities",
            &[
                (Vision, 0.42),
                (LongTermCare, 0.31),
                (AccidentInsurance, -0.35),
            ],
        ),
    },
    Entry {
        id: "q02_health_consciousness",
        prompt: "How do you typically handle a headache?",
        dimensions: &["health_behavior", "medical_utilization"],
        a: (
            "Ignore it and power through",
            &[
                (Medical, -0.45),
                (AccidentInsurance, 0.38),
                (CriticalIllness, 0.41),
            ],
        ),
        b: (
            "Take medicine immediately and rest",
            &[(Medical, 0.62), (HealthcareFsa, 0.55), (Vision, 0.48)],
        ),
    },
    Entry {
        id: "q03_work_travel",
        prompt: "On a typical work trip, you'd rather:",
        dimensions: &["independence", "risk_exposure"],
        a: (
            "Rent a car and explore independently",
            &[
                (AccidentInsurance, 0.51),
                (Disability, 0.44),
                (LifeInsurance, 0.39),
            ],
        ),
        b: (
            "Use rideshare and stick to the hotel",
            &[(CommuterBenefits, 0.48)],
        ),
    },
    Entry {
        id: "q04_financial_planning",
        prompt: "You just got a $5,000 bonus. What do you do?",
        dimensions: &["financial_planning", "risk_tolerance"],
        a: (
            "Invest it for long-term growth",
            &[(Retirement401k, 0.68), (Hsa, 0.61), (Medical, 0.35)],
        ),
        b: (
            "Pay off debt or build an emergency fund",
            &[(Disability, 0.54), (LifeInsurance, 0.48)],
        ),
    },
    Entry {
        id: "q05_family_priorities",
        prompt: "Imagine you have kids. Your top priority would be:",
        dimensions: &["family_planning", "financial_priorities"],
        a: (
            "Saving for their college education",
            &[(LifeInsurance, 0.71), (Retirement401k, 0.58)],
        ),
        b: (
            "Making sure they have great experiences now",
            &[(DependentCareFsa, 0.61), (HealthcareFsa, 0.47)],
        ),
    },
    Entry {
        id: "q06_stress_management",
        prompt: "After a stressful day, you prefer to:",
        dimensions: &["lifestyle", "health_behaviors"],
        a: (
            "Exercise or do something active",
            &[(LongTermCare, -0.22), (Medical, -0.15)],
        ),
        b: (
            "Watch TV or play video games",
            &[(Vision, 0.44), (LongTermCare, 0.31)],
        ),
    },
    Entry {
        id: "q07_career_commitment",
        prompt: "If your dream job required relocation, would you:",
        dimensions: &["career_stability", "family_ties"],
        a: (
            "Move immediately for the opportunity",
            &[(LifeInsurance, 0.42), (Disability, 0.38)],
        ),
        b: (
            "Only consider it if absolutely necessary",
            &[(DependentCareFsa, 0.48)],
        ),
    },
    Entry {
        id: "q08_tech_adoption",
        prompt: "When a new tech gadget launches, you:",
        dimensions: &["innovation", "financial_prudence"],
        a: (
            "Pre-order and get it on day one",
            &[(Hsa, 0.44), (Medical, 0.28)],
        ),
        b: ("Wait for reviews and discounts", &[(Medical, 0.42)]),
    },
    Entry {
        id: "q09_pet_ownership",
        prompt: "Do you have or want pets?",
        dimensions: &["pet_ownership"],
        a: ("Yes, pets are family", &[(PetInsurance, 0.91)]),
        b: ("No, I prefer not to have pets", &[(PetInsurance, -0.95)]),
    },
    Entry {
        id: "q10_dental_habits",
        prompt: "How often do you visit the dentist?",
        dimensions: &["preventive_care"],
        a: ("Twice a year or more", &[(Dental, 0.71)]),
        b: ("Only when there's a problem", &[(Dental, 0.38)]),
    },
];

pub(super) fn questions() -> Vec<Question> {
    STANDARD_BANK.iter().map(build).collect()
}

fn build(entry: &Entry) -> Question {
    let option = |(label, weights): (&str, &[(BenefitCategory, f64)])| ChoiceOption {
        label: label.to_string(),
        correlations: CorrelationTable::new(weights.iter().copied()),
    };

    Question {
        id: QuestionId::new(entry.id),
        prompt: entry.prompt.to_string(),
        dimensions: entry.dimensions.iter().map(|dim| dim.to_string()).collect(),
        choices: BinaryChoices {
            a: option(entry.a),
            b: option(entry.b),
        },
        choice_probabilities: None,
    }
}
