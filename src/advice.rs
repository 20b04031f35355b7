//! Wellness advice for the current cycle phase and the one coming up.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::cycle::CycleError;
use crate::llm::{GenerationLimits, LlmError, TextGenerator};
use crate::models::{CycleInput, CycleState, Notification, Phase, Prediction};

pub const CURRENT_ADVICE_LIMITS: GenerationLimits = GenerationLimits {
    max_tokens: 300,
    temperature: 0.7,
};

pub const PREP_TIPS_LIMITS: GenerationLimits = GenerationLimits {
    max_tokens: 200,
    temperature: 0.7,
};

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error(transparent)]
    Calculation(#[from] CycleError),

    #[error(transparent)]
    Upstream(#[from] LlmError),
}

/// Source of "today" for cycle-day arithmetic.
pub type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub fn utc_today() -> Today {
    Arc::new(|| Utc::now().date_naive())
}

fn current_advice_prompt(day: u32, phase: Phase) -> String {
    format!(
        r#"
You are an expert wellness coach. A user is on day {day} of their menstrual cycle, which is the {phase} phase.
1. What types of work or activities are ideal right now?
2. How much energy can they expect (low/medium/high)?
3. What activities should they avoid?
4. Suggest 3 foods to eat and 2 foods to avoid in this phase.
Provide a concise, bullet-point list.
"#
    )
}

fn prep_tips_prompt(days_left: u32, upcoming_phase: Phase) -> String {
    format!(
        r#"
You are an expert wellness coach. The user is about to enter the {upcoming_phase} phase in {days_left} days.
1. What should they do now to prepare?
2. Any warnings or activities to avoid?
Provide a concise, bullet-point list.
"#
    )
}

pub async fn request_current_advice(
    generator: &dyn TextGenerator,
    day: u32,
    phase: Phase,
) -> Result<String, LlmError> {
    tracing::info!("💬 Requesting advice for day {} ({})", day, phase);

    let prompt = current_advice_prompt(day, phase);
    let text = generator.generate(&prompt, CURRENT_ADVICE_LIMITS).await?;
    Ok(text.trim().to_string())
}

pub async fn request_prep_tips(
    generator: &dyn TextGenerator,
    days_left: u32,
    upcoming_phase: Phase,
) -> Result<String, LlmError> {
    tracing::info!("🔔 Requesting prep tips: {} in {} days", upcoming_phase, days_left);

    let prompt = prep_tips_prompt(days_left, upcoming_phase);
    let text = generator.generate(&prompt, PREP_TIPS_LIMITS).await?;
    Ok(text.trim().to_string())
}

/// Runs the calculator and the advice requests for one caller.
#[derive(Clone)]
pub struct Advisor {
    generator: Arc<dyn TextGenerator>,
    prep_threshold: u32,
    today: Today,
}

impl Advisor {
    pub fn new(generator: Arc<dyn TextGenerator>, prep_threshold: u32) -> Self {
        Self {
            generator,
            prep_threshold,
            today: utc_today(),
        }
    }

    pub fn with_today(mut self, today: Today) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn state(&self, input: &CycleInput) -> Result<CycleState, CycleError> {
        CycleState::compute(input, self.today())
    }

    pub async fn predict(&self, input: &CycleInput) -> Result<Prediction, AdviceError> {
        let state = self.state(input)?;
        let advice =
            request_current_advice(self.generator.as_ref(), state.day_of_cycle, state.phase)
                .await?;

        Ok(Prediction {
            day_of_cycle: state.day_of_cycle,
            phase: state.phase,
            advice,
        })
    }

    pub async fn notify(&self, input: &CycleInput) -> Result<Notification, AdviceError> {
        let state = self.state(input)?;
        let advice =
            request_current_advice(self.generator.as_ref(), state.day_of_cycle, state.phase)
                .await?;

        let prep_tips = if state.days_until_next <= self.prep_threshold {
            Some(
                request_prep_tips(
                    self.generator.as_ref(),
                    state.days_until_next,
                    state.upcoming_phase,
                )
                .await?,
            )
        } else {
            tracing::debug!(
                "No prep tips: {} days until {}",
                state.days_until_next,
                state.upcoming_phase
            );
            None
        };

        Ok(Notification {
            day_of_cycle: state.day_of_cycle,
            phase: state.phase,
            advice,
            days_until_next: state.days_until_next,
            upcoming_phase: state.upcoming_phase,
            prep_tips,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted stand-in for the text generation service.
    #[derive(Default)]
    pub(crate) struct FakeGenerator {
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<(String, GenerationLimits)>>,
        pub fail_with: Option<String>,
        pub fail_on_call: Option<usize>,
    }

    impl FakeGenerator {
        pub(crate) fn failing(detail: &str) -> Self {
            Self {
                fail_with: Some(detail.to_string()),
                ..Self::default()
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(
            &self,
            prompt: &str,
            limits: GenerationLimits,
        ) -> Result<String, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), limits));

            if let Some(detail) = &self.fail_with {
                if self.fail_on_call.map_or(true, |n| n == call) {
                    return Err(LlmError::Api(detail.clone()));
                }
            }
            Ok(format!("\n  response {call}  \n"))
        }
    }

    pub(crate) fn fixed_today(y: i32, m: u32, d: u32) -> Today {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Arc::new(move || date)
    }

    fn advisor(generator: Arc<FakeGenerator>) -> Advisor {
        Advisor::new(generator, 3).with_today(fixed_today(2024, 3, 29))
    }

    fn input_on_day(day: i64) -> CycleInput {
        // today is 2024-03-29, so a start `day` days earlier lands on that cycle day
        let start = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap() - chrono::Duration::days(day);
        CycleInput::new(start, 28).unwrap()
    }

    #[tokio::test]
    async fn current_advice_prompt_embeds_day_and_phase() {
        let generator = FakeGenerator::default();

        let text = request_current_advice(&generator, 14, Phase::Ovulation)
            .await
            .unwrap();

        assert_eq!(text, "response 1");
        let prompts = generator.prompts.lock().unwrap();
        let (prompt, limits) = &prompts[0];
        assert!(prompt.contains("day 14 of their menstrual cycle, which is the Ovulation phase"));
        assert!(prompt.contains("3 foods to eat and 2 foods to avoid"));
        assert_eq!(*limits, CURRENT_ADVICE_LIMITS);
    }

    #[tokio::test]
    async fn prep_prompt_embeds_days_left_and_upcoming_phase() {
        let generator = FakeGenerator::default();

        request_prep_tips(&generator, 2, Phase::Menstrual)
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap();
        let (prompt, limits) = &prompts[0];
        assert!(prompt.contains("about to enter the Menstrual phase in 2 days"));
        assert_eq!(limits.max_tokens, 200);
    }

    #[tokio::test]
    async fn predict_calls_generator_once() {
        let generator = Arc::new(FakeGenerator::default());

        let prediction = advisor(generator.clone())
            .predict(&input_on_day(1))
            .await
            .unwrap();

        assert_eq!(prediction.day_of_cycle, 1);
        assert_eq!(prediction.phase, Phase::Menstrual);
        assert_eq!(prediction.advice, "response 1");
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn notify_fetches_prep_tips_within_threshold() {
        let generator = Arc::new(FakeGenerator::default());

        let notification = advisor(generator.clone())
            .notify(&input_on_day(28))
            .await
            .unwrap();

        assert_eq!(notification.day_of_cycle, 28);
        assert_eq!(notification.phase, Phase::Luteal);
        assert_eq!(notification.days_until_next, 1);
        assert_eq!(notification.upcoming_phase, Phase::Menstrual);
        assert_eq!(notification.prep_tips.as_deref(), Some("response 2"));
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn notify_fetches_prep_tips_exactly_at_threshold() {
        let generator = Arc::new(FakeGenerator::default());

        // day 3: three days until Follicular
        let notification = advisor(generator.clone())
            .notify(&input_on_day(3))
            .await
            .unwrap();

        assert_eq!(notification.days_until_next, 3);
        assert!(notification.prep_tips.is_some());
    }

    #[tokio::test]
    async fn notify_skips_prep_tips_beyond_threshold() {
        let generator = Arc::new(FakeGenerator::default());

        // day 1: five days until Follicular
        let notification = advisor(generator.clone())
            .notify(&input_on_day(1))
            .await
            .unwrap();

        assert_eq!(notification.days_until_next, 5);
        assert_eq!(notification.upcoming_phase, Phase::Follicular);
        assert_eq!(notification.prep_tips, None);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_propagates_from_predict() {
        let generator = Arc::new(FakeGenerator::failing("quota exceeded"));

        let err = advisor(generator)
            .predict(&input_on_day(10))
            .await
            .unwrap_err();

        assert!(matches!(err, AdviceError::Upstream(LlmError::Api(ref d)) if d == "quota exceeded"));
    }

    #[tokio::test]
    async fn failed_current_advice_aborts_notify_before_prep_tips() {
        let generator = Arc::new(FakeGenerator::failing("timeout"));

        let err = advisor(generator.clone())
            .notify(&input_on_day(28))
            .await
            .unwrap_err();

        assert!(matches!(err, AdviceError::Upstream(_)));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_prep_tips_fail_the_whole_notify() {
        let generator = Arc::new(FakeGenerator {
            fail_with: Some("rate limited".into()),
            fail_on_call: Some(2),
            ..FakeGenerator::default()
        });

        let err = advisor(generator.clone())
            .notify(&input_on_day(28))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(generator.call_count(), 2);
    }
}
