use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::MediaFetcher;
use crate::transcribe::Transcriber;
use crate::utils::format_duration;
use crate::{ConfigError, Result};

/// Source of pacing delays between batch items.
///
/// Kept separate from the fetch/transcribe steps so the delay policy can be
/// tested (and substituted) on its own.
#[cfg_attr(test, mockall::automock)]
pub trait Pacer: Send {
    /// Pick the delay to wait before the next item.
    fn delay(&mut self) -> Duration;
}

/// Pacer drawing a uniformly random whole number of seconds in
/// `[min_secs, max_secs]` inclusive.
#[derive(Debug)]
pub struct UniformPacer {
    min_secs: u64,
    max_secs: u64,
}

impl UniformPacer {
    /// Fails when `min_secs > max_secs`; a uniform draw over an empty range is
    /// undefined.
    pub fn new(min_secs: u64, max_secs: u64) -> std::result::Result<Self, ConfigError> {
        if min_secs > max_secs {
            return Err(ConfigError::InvalidDelayRange {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min_secs, max_secs })
    }
}

impl Pacer for UniformPacer {
    fn delay(&mut self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs(secs)
    }
}

/// Per-item outcome. Outcomes are held in memory for the end-of-run summary
/// only; the durable output is the files written to the output directory.
#[derive(Debug)]
pub enum ItemOutcome {
    Completed {
        url: String,
        audio_path: PathBuf,
        transcript_path: Option<PathBuf>,
    },
    Failed {
        url: String,
        reason: String,
    },
}

impl ItemOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ItemOutcome::Completed { .. })
    }
}

/// Sequential batch runner with per-item failure isolation.
///
/// Items are processed strictly in input order, one at a time. A failure in
/// either the fetch or the transcribe step is recorded and the batch moves on;
/// no item is retried within the same run. Between items (never after the
/// last) the runner sleeps for a pacer-chosen duration, whether or not the
/// item succeeded.
pub struct BatchRunner {
    fetcher: Box<dyn MediaFetcher>,
    transcriber: Option<Box<dyn Transcriber>>,
    pacer: Box<dyn Pacer>,
    output_dir: PathBuf,
}

impl BatchRunner {
    /// `transcriber` is `None` when transcription is skipped for the run.
    pub fn new(
        fetcher: Box<dyn MediaFetcher>,
        transcriber: Option<Box<dyn Transcriber>>,
        pacer: Box<dyn Pacer>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            pacer,
            output_dir,
        }
    }

    /// Process every URL exactly once, in order, and return the per-item
    /// outcomes.
    pub async fn run(&mut self, urls: &[String]) -> Vec<ItemOutcome> {
        let total = urls.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, url) in urls.iter().enumerate() {
            tracing::info!("Processing URL {}/{}: {}", index + 1, total, url);

            let outcome = match self.process_item(url).await {
                Ok((audio_path, transcript_path)) => ItemOutcome::Completed {
                    url: url.clone(),
                    audio_path,
                    transcript_path,
                },
                Err(error) => {
                    tracing::error!("Error processing URL {}: {:#}", url, error);
                    tracing::info!("Continuing with next URL...");
                    ItemOutcome::Failed {
                        url: url.clone(),
                        reason: format!("{:#}", error),
                    }
                }
            };
            outcomes.push(outcome);

            if index + 1 < total {
                let delay = self.pacer.delay();
                tracing::info!(
                    "Waiting {} before next download...",
                    format_duration(delay.as_secs_f64())
                );
                tokio::time::sleep(delay).await;
            }
        }

        outcomes
    }

    async fn process_item(&self, url: &str) -> Result<(PathBuf, Option<PathBuf>)> {
        let audio_path = self.fetcher.fetch_audio(url, &self.output_dir).await?;

        let transcript_path = match &self.transcriber {
            Some(transcriber) => Some(transcriber.transcribe(&audio_path).await?),
            None => None,
        };

        Ok((audio_path, transcript_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockMediaFetcher;
    use crate::transcribe::MockTranscriber;
    use mockall::Sequence;
    use std::path::Path;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn zero_pacer(expected_calls: usize) -> Box<MockPacer> {
        let mut pacer = MockPacer::new();
        pacer
            .expect_delay()
            .times(expected_calls)
            .returning(|| Duration::ZERO);
        Box::new(pacer)
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_every_url_exactly_once_in_order() {
        let mut fetcher = MockMediaFetcher::new();
        let mut seq = Sequence::new();
        for expected in ["https://a", "https://b", "https://c"] {
            fetcher
                .expect_fetch_audio()
                .withf(move |url, dir| url == expected && dir == Path::new("out"))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(PathBuf::from("out/a.mp3")));
        }

        let mut runner = BatchRunner::new(
            Box::new(fetcher),
            None,
            zero_pacer(2),
            PathBuf::from("out"),
        );
        let outcomes = runner
            .run(&urls(&["https://a", "https://b", "https://c"]))
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(ItemOutcome::is_completed));
    }

    #[tokio::test(start_paused = true)]
    async fn skipping_transcription_produces_no_transcript_path() {
        let mut fetcher = MockMediaFetcher::new();
        fetcher
            .expect_fetch_audio()
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("out/talk.mp3")));

        let mut runner =
            BatchRunner::new(Box::new(fetcher), None, zero_pacer(0), PathBuf::from("out"));
        let outcomes = runner.run(&urls(&["https://a"])).await;

        match &outcomes[0] {
            ItemOutcome::Completed {
                transcript_path, ..
            } => assert!(transcript_path.is_none()),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_does_not_stop_the_batch() {
        let mut fetcher = MockMediaFetcher::new();
        let mut seq = Sequence::new();
        fetcher
            .expect_fetch_audio()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(anyhow::anyhow!("network down")));
        fetcher
            .expect_fetch_audio()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(PathBuf::from("out/b.mp3")));

        // The pacing delay applies after failures too.
        let mut runner = BatchRunner::new(
            Box::new(fetcher),
            None,
            zero_pacer(1),
            PathBuf::from("out"),
        );
        let outcomes = runner.run(&urls(&["https://a", "https://b"])).await;

        assert!(!outcomes[0].is_completed());
        assert!(outcomes[1].is_completed());
        match &outcomes[0] {
            ItemOutcome::Failed { url, reason } => {
                assert_eq!(url, "https://a");
                assert!(reason.contains("network down"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transcription_failure_is_isolated_per_item() {
        let mut fetcher = MockMediaFetcher::new();
        fetcher
            .expect_fetch_audio()
            .times(2)
            .returning(|_, _| Ok(PathBuf::from("out/x.mp3")));

        let mut transcriber = MockTranscriber::new();
        let mut seq = Sequence::new();
        transcriber
            .expect_transcribe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("HTTP 500")));
        transcriber
            .expect_transcribe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PathBuf::from("out/x_transcript.txt")));

        let mut runner = BatchRunner::new(
            Box::new(fetcher),
            Some(Box::new(transcriber)),
            zero_pacer(1),
            PathBuf::from("out"),
        );
        let outcomes = runner.run(&urls(&["https://a", "https://b"])).await;

        assert!(!outcomes[0].is_completed());
        match &outcomes[1] {
            ItemOutcome::Completed {
                transcript_path, ..
            } => assert_eq!(
                transcript_path.as_deref(),
                Some(Path::new("out/x_transcript.txt"))
            ),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_after_the_final_item() {
        let mut fetcher = MockMediaFetcher::new();
        fetcher
            .expect_fetch_audio()
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("out/only.mp3")));

        let mut pacer = MockPacer::new();
        pacer.expect_delay().never();

        let mut runner = BatchRunner::new(
            Box::new(fetcher),
            None,
            Box::new(pacer),
            PathBuf::from("out"),
        );
        runner.run(&urls(&["https://only"])).await;
    }

    #[test]
    fn uniform_pacer_rejects_an_inverted_range() {
        let err = UniformPacer::new(7, 3).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelayRange { min: 7, max: 3 }));
    }

    #[test]
    fn uniform_pacer_stays_within_bounds() {
        let mut pacer = UniformPacer::new(3, 7).unwrap();
        for _ in 0..200 {
            let delay = pacer.delay();
            assert!(delay >= Duration::from_secs(3));
            assert!(delay <= Duration::from_secs(7));
        }
    }

    #[test]
    fn uniform_pacer_with_equal_bounds_is_constant() {
        let mut pacer = UniformPacer::new(42, 42).unwrap();
        for _ in 0..20 {
            assert_eq!(pacer.delay(), Duration::from_secs(42));
        }
    }

    #[test]
    fn uniform_pacer_bounds_are_inclusive() {
        let mut pacer = UniformPacer::new(0, 1).unwrap();
        let mut seen = [false, false];
        for _ in 0..500 {
            seen[pacer.delay().as_secs() as usize] = true;
        }
        assert!(seen[0] && seen[1]);
    }
}
