//! Trivia rounds backed by the Open Trivia DB.
//!
//! A round lives in the [`TriviaBoard`] from `/trivia` until it is answered or
//! its deadline passes. Only the user who started it may answer.

use anyhow::{Context, Result};
use dashmap::DashMap;
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use serenity::model::id::UserId;
use std::{
    collections::HashSet,
    time::{Duration, Instant},
};
use tracing::{debug, info};

const CUSTOM_ID_PREFIX: &str = "trivia";

#[derive(Debug, Clone, PartialEq)]
pub struct TriviaQuestion {
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    response_code: u8,
    results: Vec<OpenTdbQuestion>,
}

#[derive(Debug, Deserialize)]
struct OpenTdbQuestion {
    category: String,
    difficulty: String,
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

pub struct TriviaClient {
    client: reqwest::Client,
    api_url: String,
}

impl TriviaClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_url: api_url.into(),
        }
    }

    pub async fn fetch_question(&self) -> Result<TriviaQuestion> {
        debug!("❓ Pidiendo pregunta a {}", self.api_url);

        let response: OpenTdbResponse = self
            .client
            .get(&self.api_url)
            .query(&[("amount", "1"), ("type", "multiple"), ("encode", "url3986")])
            .send()
            .await
            .context("Trivia service unreachable")?
            .error_for_status()?
            .json()
            .await
            .context("Trivia service returned an unexpected payload")?;

        parse_response(response)
    }
}

fn parse_response(response: OpenTdbResponse) -> Result<TriviaQuestion> {
    if response.response_code != 0 {
        anyhow::bail!("Trivia service answered with code {}", response.response_code);
    }

    let raw = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Trivia service returned no questions"))?;

    Ok(TriviaQuestion {
        category: decode(&raw.category)?,
        difficulty: decode(&raw.difficulty)?,
        question: decode(&raw.question)?,
        correct_answer: decode(&raw.correct_answer)?,
        incorrect_answers: raw
            .incorrect_answers
            .iter()
            .map(|answer| decode(answer))
            .collect::<Result<_>>()?,
    })
}

fn decode(value: &str) -> Result<String> {
    Ok(urlencoding::decode(value)
        .context("Trivia text was not valid UTF-8")?
        .into_owned())
}

/// How a single button press is judged against a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgement {
    NotEligible,
    Expired,
    InvalidChoice,
    Correct,
    Wrong,
}

#[derive(Debug, Clone)]
pub struct TriviaRound {
    question: TriviaQuestion,
    options: Vec<String>,
    correct_index: usize,
    deadline: Instant,
    eligible: HashSet<UserId>,
}

impl TriviaRound {
    pub fn new<R: Rng + ?Sized>(
        question: TriviaQuestion,
        owner: UserId,
        timeout: Duration,
        rng: &mut R,
    ) -> Self {
        let mut options = question.incorrect_answers.clone();
        options.push(question.correct_answer.clone());
        options.shuffle(rng);

        let correct_index = options
            .iter()
            .position(|option| *option == question.correct_answer)
            .unwrap_or_default();

        Self {
            question,
            options,
            correct_index,
            deadline: Instant::now() + timeout,
            eligible: HashSet::from([owner]),
        }
    }

    pub fn question(&self) -> &TriviaQuestion {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// `choice` is the 0-based option index.
    pub fn judge(&self, user: UserId, choice: usize, now: Instant) -> Judgement {
        if !self.eligible.contains(&user) {
            Judgement::NotEligible
        } else if self.is_expired(now) {
            Judgement::Expired
        } else if choice >= self.options.len() {
            Judgement::InvalidChoice
        } else if choice == self.correct_index {
            Judgement::Correct
        } else {
            Judgement::Wrong
        }
    }
}

#[derive(Debug)]
pub enum AnswerOutcome {
    NotEligible,
    Expired,
    InvalidChoice,
    Finished { round: TriviaRound, correct: bool },
}

/// All open rounds, keyed by the id of the interaction that started them.
#[derive(Default)]
pub struct TriviaBoard {
    rounds: DashMap<u64, TriviaRound>,
}

impl TriviaBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, round_id: u64, round: TriviaRound) {
        info!("❓ Ronda de trivia {} iniciada", round_id);
        self.rounds.insert(round_id, round);
    }

    pub fn answer(&self, round_id: u64, user: UserId, choice: usize, now: Instant) -> AnswerOutcome {
        let judgement = match self.rounds.get(&round_id) {
            Some(round) => round.judge(user, choice, now),
            None => return AnswerOutcome::Expired,
        };

        match judgement {
            Judgement::NotEligible => AnswerOutcome::NotEligible,
            // The timeout task owns cleanup of expired rounds.
            Judgement::Expired => AnswerOutcome::Expired,
            Judgement::InvalidChoice => AnswerOutcome::InvalidChoice,
            Judgement::Correct | Judgement::Wrong => match self.rounds.remove(&round_id) {
                Some((_, round)) => {
                    info!("❓ Ronda de trivia {} respondida", round_id);
                    AnswerOutcome::Finished {
                        round,
                        correct: judgement == Judgement::Correct,
                    }
                }
                // Someone else's click finished it first.
                None => AnswerOutcome::Expired,
            },
        }
    }

    /// Removes a round whose deadline passed. `None` if it was already answered.
    pub fn expire(&self, round_id: u64) -> Option<TriviaRound> {
        self.rounds.remove(&round_id).map(|(_, round)| round)
    }

    pub fn open_rounds(&self) -> usize {
        self.rounds.len()
    }
}

pub fn custom_id(round_id: u64, choice: usize) -> String {
    format!("{}:{}:{}", CUSTOM_ID_PREFIX, round_id, choice)
}

/// Parses a button id produced by [`custom_id`].
pub fn parse_custom_id(custom_id: &str) -> Option<(u64, usize)> {
    let mut parts = custom_id.split(':');
    if parts.next()? != CUSTOM_ID_PREFIX {
        return None;
    }
    let round_id = parts.next()?.parse().ok()?;
    let choice = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((round_id, choice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn question() -> TriviaQuestion {
        TriviaQuestion {
            category: "Science".to_string(),
            difficulty: "easy".to_string(),
            question: "What is H2O?".to_string(),
            correct_answer: "Water".to_string(),
            incorrect_answers: vec!["Salt".to_string(), "Iron".to_string(), "Air".to_string()],
        }
    }

    fn round(owner: UserId) -> TriviaRound {
        let mut rng = StdRng::seed_from_u64(7);
        TriviaRound::new(question(), owner, Duration::from_secs(30), &mut rng)
    }

    fn correct_choice(round: &TriviaRound) -> usize {
        round.options().iter().position(|o| o == "Water").unwrap()
    }

    #[test]
    fn test_options_contain_every_answer_once() {
        let round = round(UserId::new(1));
        let mut options = round.options().to_vec();
        options.sort();
        assert_eq!(options, vec!["Air", "Iron", "Salt", "Water"]);
        assert_eq!(round.correct_answer(), "Water");
    }

    #[test]
    fn test_judging() {
        let owner = UserId::new(1);
        let round = round(owner);
        let now = Instant::now();
        let correct = correct_choice(&round);
        let wrong = (correct + 1) % 4;

        assert_eq!(round.judge(UserId::new(2), correct, now), Judgement::NotEligible);
        assert_eq!(round.judge(owner, correct, now), Judgement::Correct);
        assert_eq!(round.judge(owner, wrong, now), Judgement::Wrong);
        assert_eq!(round.judge(owner, 9, now), Judgement::InvalidChoice);
        assert_eq!(
            round.judge(owner, correct, now + Duration::from_secs(31)),
            Judgement::Expired
        );
    }

    #[test]
    fn test_first_answer_finishes_round() {
        let board = TriviaBoard::new();
        let owner = UserId::new(1);
        let round = round(owner);
        let correct = correct_choice(&round);
        board.start(10, round);

        match board.answer(10, UserId::new(2), correct, Instant::now()) {
            AnswerOutcome::NotEligible => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(board.open_rounds(), 1);

        match board.answer(10, owner, correct, Instant::now()) {
            AnswerOutcome::Finished { correct, .. } => assert!(correct),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(board.open_rounds(), 0);

        assert!(matches!(
            board.answer(10, owner, correct, Instant::now()),
            AnswerOutcome::Expired
        ));
        assert!(board.expire(10).is_none());
    }

    #[test]
    fn test_expire_removes_unanswered_round() {
        let board = TriviaBoard::new();
        board.start(3, round(UserId::new(1)));
        assert!(board.expire(3).is_some());
        assert_eq!(board.open_rounds(), 0);
    }

    #[test]
    fn test_custom_ids() {
        assert_eq!(parse_custom_id(&custom_id(42, 3)), Some((42, 3)));
        assert_eq!(parse_custom_id("player_skip"), None);
        assert_eq!(parse_custom_id("trivia:x:1"), None);
        assert_eq!(parse_custom_id("trivia:1:2:3"), None);
    }

    #[test]
    fn test_parse_url3986_payload() {
        let response: OpenTdbResponse = serde_json::from_str(
            r#"{"response_code":0,"results":[{"category":"General%20Knowledge","difficulty":"easy","question":"What%20is%20%22H2O%22%3F","correct_answer":"Water","incorrect_answers":["Salt","Iron","Air"]}]}"#,
        )
        .unwrap();

        let question = parse_response(response).unwrap();

        assert_eq!(question.category, "General Knowledge");
        assert_eq!(question.question, "What is \"H2O\"?");
        assert_eq!(question.incorrect_answers.len(), 3);
    }

    #[test]
    fn test_error_code_is_rejected() {
        let response: OpenTdbResponse =
            serde_json::from_str(r#"{"response_code":1,"results":[]}"#).unwrap();
        assert!(parse_response(response).is_err());
    }
}
