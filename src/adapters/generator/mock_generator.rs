//! Mock content generator for tests and local runs.
//!
//! Replies are deterministic: each category is described as
//! `"{category} description"` and reports echo the finalists. Errors can be
//! queued to exercise retry and rollback paths.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockContentGenerator::new()
//!     .with_reveal_error(GeneratorError::RateLimited)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::session::{Category, Report, FINALIST_COUNT};
use crate::ports::{ContentGenerator, GenerationContext, GeneratorError, RevealedPair};

/// Mock content generator.
#[derive(Debug, Clone, Default)]
pub struct MockContentGenerator {
    /// Errors returned by upcoming `reveal` calls, in order.
    reveal_errors: Arc<Mutex<VecDeque<GeneratorError>>>,
    /// Errors returned by upcoming `summarize` calls, in order.
    summarize_errors: Arc<Mutex<VecDeque<GeneratorError>>>,
    /// Simulated latency per call.
    delay: Duration,
    reveal_calls: Arc<Mutex<Vec<(Category, Category)>>>,
    summarize_calls: Arc<Mutex<Vec<[Category; FINALIST_COUNT]>>>,
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an error for the next `reveal` call.
    pub fn with_reveal_error(self, error: GeneratorError) -> Self {
        self.fail_next_reveal(error);
        self
    }

    /// Queues an error for the next `summarize` call.
    pub fn with_summarize_error(self, error: GeneratorError) -> Self {
        self.summarize_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
        self
    }

    /// Sets the simulated latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues an error on a generator that is already shared.
    pub fn fail_next_reveal(&self, error: GeneratorError) {
        self.reveal_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    /// Pairs passed to `reveal`, in call order.
    pub fn reveal_calls(&self) -> Vec<(Category, Category)> {
        self.reveal_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Finalists passed to `summarize`, in call order.
    pub fn summarize_calls(&self) -> Vec<[Category; FINALIST_COUNT]> {
        self.summarize_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Description the mock gives `category`.
    pub fn description_for(category: &Category) -> String {
        format!("{} description", category)
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    async fn reveal(
        &self,
        _context: &GenerationContext,
        first: &Category,
        second: &Category,
    ) -> Result<RevealedPair, GeneratorError> {
        self.reveal_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((first.clone(), second.clone()));
        self.simulate_latency().await;

        let queued = self
            .reveal_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(err) = queued {
            return Err(err);
        }

        Ok(RevealedPair {
            first: Self::description_for(first),
            second: Self::description_for(second),
        })
    }

    async fn summarize(
        &self,
        _context: &GenerationContext,
        finalists: &[Category; FINALIST_COUNT],
    ) -> Result<Report, GeneratorError> {
        self.summarize_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(finalists.clone());
        self.simulate_latency().await;

        let queued = self
            .summarize_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(err) = queued {
            return Err(err);
        }

        Ok(Report {
            final_three_majors: finalists.iter().map(|c| c.to_string()).collect(),
            final_three_majors_report: finalists
                .iter()
                .map(|c| format!("{} report", c))
                .collect(),
            final_recommendation: finalists[0].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    fn context() -> GenerationContext {
        GenerationContext::new(SessionId::new(), Default::default())
    }

    #[tokio::test]
    async fn reveal_describes_both_categories_and_records_call() {
        let generator = MockContentGenerator::new();
        let a = Category::new("医学").unwrap();
        let b = Category::new("文学").unwrap();

        let pair = generator.reveal(&context(), &a, &b).await.unwrap();

        assert_eq!(pair.first, "医学 description");
        assert_eq!(pair.second, "文学 description");
        assert_eq!(generator.reveal_calls(), vec![(a, b)]);
    }

    #[tokio::test]
    async fn queued_errors_are_returned_once() {
        let generator = MockContentGenerator::new().with_reveal_error(GeneratorError::RateLimited);
        let a = Category::new("a").unwrap();
        let b = Category::new("b").unwrap();

        assert!(generator.reveal(&context(), &a, &b).await.is_err());
        assert!(generator.reveal(&context(), &a, &b).await.is_ok());
    }

    #[tokio::test]
    async fn summarize_echoes_finalists() {
        let generator = MockContentGenerator::new();
        let finalists = [
            Category::new("a").unwrap(),
            Category::new("b").unwrap(),
            Category::new("c").unwrap(),
        ];

        let report = generator.summarize(&context(), &finalists).await.unwrap();

        assert!(report.validate_against(&finalists).is_ok());
        assert_eq!(generator.summarize_calls().len(), 1);
    }
}
