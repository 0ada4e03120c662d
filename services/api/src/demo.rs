use crate::infra::{apply_choice_stats, sample_profile, InMemorySessionRepository};
use benefit_advisor::advisor::{
    AdvisorConfig, AdvisorService, Choice, CoverageDetail, DemographicPriors, QuestionBank,
    SessionStep, SynthesisReport, UserProfile,
};
use benefit_advisor::error::AppError;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_SCRIPT: &str = "AABAAABAAA";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// JSON household profile. Defaults to a married, two-child sample household.
    #[arg(long)]
    pub(crate) profile: Option<PathBuf>,
    /// Answers to give in order, e.g. "ABBA". The script repeats when it runs out.
    #[arg(long, value_parser = parse_script)]
    pub(crate) answers: Option<AnswerScript>,
    /// Replace the built-in question bank with a JSON bank.
    #[arg(long)]
    pub(crate) question_bank: Option<PathBuf>,
    /// Historical answer counts (CSV) used to weight information gain.
    #[arg(long)]
    pub(crate) choice_stats: Option<PathBuf>,
    /// Print the final report as JSON instead of a summary.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BankValidateArgs {
    /// JSON question bank to validate
    pub(crate) path: PathBuf,
    /// Optional choice statistics CSV to check against the bank
    #[arg(long)]
    pub(crate) choice_stats: Option<PathBuf>,
}

/// Scripted answers for the demo, never empty.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnswerScript(Vec<Choice>);

fn parse_script(raw: &str) -> Result<AnswerScript, String> {
    parse_answers(raw).map(AnswerScript)
}

pub(crate) fn parse_answers(raw: &str) -> Result<Vec<Choice>, String> {
    let answers = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c.to_ascii_uppercase() {
            'A' => Ok(Choice::A),
            'B' => Ok(Choice::B),
            other => Err(format!("'{other}' is not an answer; use A or B")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if answers.is_empty() {
        return Err("answer script must contain at least one A or B".to_string());
    }
    Ok(answers)
}

pub(crate) fn run_bank_validation(args: BankValidateArgs) -> Result<(), AppError> {
    let bank = QuestionBank::from_path(&args.path)?;
    println!(
        "{}: {} questions valid",
        args.path.display(),
        bank.len()
    );
    for question in bank.iter() {
        println!(
            "  - {} ({} categories) {}",
            question.id,
            question.touched_categories().len(),
            question.prompt
        );
    }

    if let Some(path) = args.choice_stats {
        let bank = apply_choice_stats(bank, &path)?;
        let weighted = bank
            .iter()
            .filter(|question| question.choice_probabilities.is_some())
            .count();
        println!(
            "{}: choice statistics attached to {} of {} questions",
            path.display(),
            weighted,
            bank.len()
        );
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        profile,
        answers,
        question_bank,
        choice_stats,
        json,
    } = args;

    let profile = match profile {
        Some(path) => load_profile(path)?,
        None => sample_profile(),
    };
    let script = match answers {
        Some(AnswerScript(answers)) => answers,
        None => parse_answers(DEFAULT_SCRIPT).unwrap_or_else(|_| vec![Choice::A]),
    };

    let mut bank = match question_bank {
        Some(path) => QuestionBank::from_path(path)?,
        None => QuestionBank::standard(),
    };
    if let Some(path) = choice_stats {
        bank = apply_choice_stats(bank, &path)?;
    }

    let config = AdvisorConfig::default();
    let service = AdvisorService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(DemographicPriors::new(config.priors.clone())),
        Arc::new(bank),
        config,
    );

    if !json {
        println!("Adaptive benefits questionnaire");
        println!(
            "- Household: age {}, {:?}, {} dependents",
            profile.age, profile.marital_status, profile.dependents
        );
        println!(
            "- Income ${:.0} | debt ${:.0} | savings ${:.0}",
            profile.annual_income, profile.debt, profile.savings
        );
    }

    let (session_id, mut step) = service.start_session(profile)?;
    let mut turn = 0usize;
    while let SessionStep::Question { question, progress } = &step {
        let choice = script[turn % script.len()];
        if !json {
            if turn == 0 {
                println!("- Initial entropy: {:.2} bits\n", progress.initial_entropy);
            }
            println!("Question {}: {}", turn + 1, question.prompt);
            for option in &question.choices {
                println!("  {}) {}", option.choice, option.label);
            }
            println!(
                "  expected gain {:.3} bits -> answered {}",
                question.information_gain, choice
            );
        }

        let question_id = question.question_id.clone();
        step = service.answer_question(&session_id, &question_id, choice)?;
        turn += 1;

        if !json {
            let entropy = match &step {
                SessionStep::Question { progress, .. } | SessionStep::Complete { progress, .. } => {
                    progress.entropy
                }
            };
            println!("  entropy now {:.2} bits", entropy);
        }
    }

    let report = service.report(&session_id)?;
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("report unavailable: {err}"),
        }
    } else {
        render_report(&report);
    }

    service.end_session(&session_id)?;
    Ok(())
}

fn load_profile(path: PathBuf) -> Result<UserProfile, AppError> {
    let raw = std::fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} is not a valid profile: {err}", path.display()),
        ))
    })
}

fn render_report(report: &SynthesisReport) {
    println!("\nStopped: {}", report.stop_reason.label());
    println!(
        "- {} questions | entropy {:.2} -> {:.2} bits ({:.2} reduced)",
        report.questions_asked,
        report.initial_entropy,
        report.final_entropy,
        report.entropy_reduction
    );

    for (priority, recommendations) in report.by_priority() {
        println!("\n{}:", priority.label());
        for rec in recommendations {
            println!(
                "  - {}: score {:.0}/100 (confidence {:.0}%)",
                rec.category.label(),
                rec.score,
                rec.confidence * 100.0
            );
            println!("    {}", rec.rationale);
            if let Some(summary) = coverage_summary(&rec.coverage) {
                println!("    {summary}");
            }
        }
    }
}

fn coverage_summary(coverage: &CoverageDetail) -> Option<String> {
    let summary = match coverage {
        CoverageDetail::TermLife {
            coverage_amount,
            term_years,
            monthly_premium,
            ..
        } => format!(
            "${coverage_amount:.0} term life, {term_years} years, ~${monthly_premium:.0}/month"
        ),
        CoverageDetail::Disability {
            monthly_benefit,
            elimination_days,
            benefit_period_end_age,
            ..
        } => format!(
            "${monthly_benefit:.0}/month benefit after {elimination_days} days, to age {benefit_period_end_age}"
        ),
        CoverageDetail::Medical {
            plan,
            metal_tier,
            deductible,
            ..
        } => format!("{plan:?} ({metal_tier:?}), ${deductible:.0} deductible"),
        CoverageDetail::Hsa {
            annual_contribution,
            tax_savings,
            ..
        } => format!("${annual_contribution:.0}/year HSA, ~${tax_savings:.0} tax savings"),
        CoverageDetail::Retirement {
            contribution_rate_pct,
            annual_amount,
            ..
        } => format!("{contribution_rate_pct:.0}% contribution (${annual_amount:.0}/year)"),
        CoverageDetail::General {
            tier,
            monthly_premium,
        } => format!("{tier:?} tier, ~${monthly_premium:.0}/month"),
        CoverageDetail::NotApplicable { .. } => return None,
    };
    Some(summary)
}
