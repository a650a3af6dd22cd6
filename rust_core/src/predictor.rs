//! Request orchestration.
//!
//! [`GamePredictor`] resolves a game through the schedule feed and runs the
//! feature, classifier, signal and blend stages on a blocking worker.
//! [`PlayerForecaster`] answers player threshold requests for a scheduled game.

use crate::classifier::ClassifierService;
use crate::clients::{PlayerLogSource, ScheduleSource};
use crate::error::{ClassifierUnavailable, PredictionError};
use crate::features::{build_form, TeamFormSnapshot, FORM_WINDOW};
use crate::league_config::{find_team, get_team_by_abbr};
use crate::models::{GameRecord, ScheduledGame};
use crate::player::{parse_matchup, predict_thresholds, PlayerPredictionResponse};
use crate::signals::head_to_head::NEUTRAL_RATE;
use crate::signals::{head_to_head, RestAdjustment, HOME_COURT_BUMP};
use crate::store::{DatasetSummary, HistoricalStore};
use crate::win_prob::{
    blend, BlendInputs, BlendWeights, Explain, PredictionResponse, Probabilities,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Teams listed in the dataset summary's scoring table
const SUMMARY_TOP_TEAMS: usize = 5;

pub struct GamePredictor {
    store: Arc<HistoricalStore>,
    classifier: Arc<ClassifierService>,
    schedule: Arc<dyn ScheduleSource>,
}

impl GamePredictor {
    pub fn new(classifier: Arc<ClassifierService>, schedule: Arc<dyn ScheduleSource>) -> Self {
        Self {
            store: classifier.store().clone(),
            classifier,
            schedule,
        }
    }

    /// Predict a scheduled game by its feed identifier.
    ///
    /// Unknown games and feed failures are errors; every other gap degrades
    /// to a neutral value inside the response.
    pub async fn predict(&self, game_id: &str) -> Result<PredictionResponse, PredictionError> {
        let game = resolve_game(self.schedule.as_ref(), game_id).await?;

        let store = self.store.clone();
        let classifier = self.classifier.clone();
        let response =
            tokio::task::spawn_blocking(move || predict_game(&store, &classifier, &game)).await?;

        info!(
            "Game {}: {} ({:.2} / {:.2})",
            response.game_id,
            response.prediction,
            response.probabilities.home,
            response.probabilities.away
        );
        Ok(response)
    }

    /// Synchronous prediction for an already-resolved game.
    pub fn predict_scheduled(&self, game: &ScheduledGame) -> PredictionResponse {
        predict_game(&self.store, &self.classifier, game)
    }

    /// Predict every upcoming game. Empty when the feed is down.
    pub async fn predict_slate(&self) -> Result<Vec<PredictionResponse>, PredictionError> {
        let games = self.upcoming().await;
        let store = self.store.clone();
        let classifier = self.classifier.clone();
        let responses = tokio::task::spawn_blocking(move || {
            batch_predict(&store, &classifier, &games)
        })
        .await?;
        Ok(responses)
    }

    /// Games that have not started; empty when the feed is down.
    pub async fn upcoming(&self) -> Vec<ScheduledGame> {
        match self.schedule.upcoming().await {
            Ok(games) => games,
            Err(e) => {
                warn!("Upcoming games unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Form and recent games for a team looked up by name or code.
    pub fn team_report(&self, query: &str, as_of: NaiveDate) -> Result<TeamReport, PredictionError> {
        let team = find_team(query).ok_or_else(|| PredictionError::TeamNotFound(query.to_string()))?;
        Ok(TeamReport {
            abbreviation: team.abbreviation.to_string(),
            full_name: team.full_name.to_string(),
            form: build_form(&self.store, team.abbreviation, as_of),
            recent_games: self
                .store
                .recent_games(team.abbreviation, Some(as_of), FORM_WINDOW)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    pub fn summary(&self) -> DatasetSummary {
        self.store.summary(SUMMARY_TOP_TEAMS)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub abbreviation: String,
    pub full_name: String,
    pub form: Option<TeamFormSnapshot>,
    pub recent_games: Vec<GameRecord>,
}

async fn resolve_game(
    schedule: &dyn ScheduleSource,
    game_id: &str,
) -> Result<ScheduledGame, PredictionError> {
    match schedule.game(game_id).await {
        Ok(Some(game)) => Ok(game),
        Ok(None) => Err(PredictionError::GameNotFound(game_id.to_string())),
        Err(e) => Err(PredictionError::ScheduleUnavailable(e.to_string())),
    }
}

fn display_name(name: &str, abbr: &str) -> String {
    if !name.is_empty() {
        return name.to_string();
    }
    get_team_by_abbr(abbr)
        .map(|team| team.full_name.to_string())
        .unwrap_or_else(|| abbr.to_string())
}

/// Run every stage for one game. Pure given the store and trained model.
pub fn predict_game(
    store: &HistoricalStore,
    classifier: &ClassifierService,
    game: &ScheduledGame,
) -> PredictionResponse {
    let trained = match classifier.model() {
        Ok(trained) => trained,
        Err(reason) => return fallback_response(game, &reason),
    };

    let as_of = game.reference_date();
    let home_form = build_form(store, &game.home_abbr, as_of);
    let away_form = build_form(store, &game.away_abbr, as_of);

    let mut degraded = Vec::new();
    for (abbr, form) in [(&game.home_abbr, &home_form), (&game.away_abbr, &away_form)] {
        if form.is_none() {
            debug!("No games for {} before {}; using neutral model term", abbr, as_of);
            degraded.push(format!("no recent games for {}", abbr));
        }
    }

    let score = |form: &Option<TeamFormSnapshot>| {
        form.as_ref()
            .map(|f| trained.predict(&f.features()))
            .unwrap_or(NEUTRAL_RATE)
    };
    let inputs = BlendInputs {
        model_home: score(&home_form),
        model_away: score(&away_form),
        h2h: head_to_head(store, &game.home_abbr, &game.away_abbr),
        rest: RestAdjustment::compute(store, &game.home_abbr, &game.away_abbr, as_of),
    };
    let weights = BlendWeights::STANDARD;
    let outcome = blend(&inputs, &weights);
    if outcome.degenerate {
        degraded.push("degenerate signal sums".to_string());
    }

    let contributions = |form: &Option<TeamFormSnapshot>| {
        form.as_ref()
            .map(|f| trained.contributions(&f.features()))
            .unwrap_or_default()
    };

    let explain = Explain {
        weights,
        home_court_bump: HOME_COURT_BUMP,
        h2h_home: Some(inputs.h2h.home_rate),
        h2h_away: Some(inputs.h2h.away_rate),
        h2h_meetings: Some(inputs.h2h.meetings),
        home_rest_days: Some(inputs.rest.home_days),
        away_rest_days: Some(inputs.rest.away_days),
        rest_diff: Some(inputs.rest.diff),
        rest_bump: Some(inputs.rest.bump),
        model_home: Some(inputs.model_home),
        model_away: Some(inputs.model_away),
        home_contributions: contributions(&home_form),
        away_contributions: contributions(&away_form),
        home_form,
        away_form,
        intercept: Some(trained.intercept()),
        reason: (!degraded.is_empty()).then(|| degraded.join("; ")),
    };

    build_response(game, outcome.probabilities, Some(trained.training_accuracy), explain)
}

/// Predict many games in parallel, preserving input order.
pub fn batch_predict(
    store: &HistoricalStore,
    classifier: &ClassifierService,
    games: &[ScheduledGame],
) -> Vec<PredictionResponse> {
    // Warm the build-once model before fanning out.
    let _ = classifier.model();
    games
        .par_iter()
        .map(|game| predict_game(store, classifier, game))
        .collect()
}

fn fallback_response(game: &ScheduledGame, reason: &ClassifierUnavailable) -> PredictionResponse {
    debug!("Game {}: classifier unavailable, even split", game.game_id);
    build_response(game, Probabilities::EVEN, None, Explain::fallback(reason.reason()))
}

fn build_response(
    game: &ScheduledGame,
    probabilities: Probabilities,
    accuracy: Option<f64>,
    explain: Explain,
) -> PredictionResponse {
    let home_name = display_name(&game.home_name, &game.home_abbr);
    let away_name = display_name(&game.away_name, &game.away_abbr);
    let predicted_winner = if probabilities.home_favored() {
        home_name.clone()
    } else {
        away_name.clone()
    };

    PredictionResponse {
        game_id: game.game_id.clone(),
        prediction: format!("{} wins", predicted_winner),
        predicted_winner,
        home_name,
        away_name,
        home_abbr: game.home_abbr.clone(),
        away_abbr: game.away_abbr.clone(),
        probabilities,
        accuracy,
        explain,
    }
}

/// Player threshold requests against the scheduled opponent
pub struct PlayerForecaster {
    logs: Arc<dyn PlayerLogSource>,
    schedule: Arc<dyn ScheduleSource>,
}

impl PlayerForecaster {
    pub fn new(logs: Arc<dyn PlayerLogSource>, schedule: Arc<dyn ScheduleSource>) -> Self {
        Self { logs, schedule }
    }

    pub async fn predict(
        &self,
        player_id: &str,
        game_id: &str,
    ) -> Result<PlayerPredictionResponse, PredictionError> {
        let game = resolve_game(self.schedule.as_ref(), game_id).await?;
        let logs = self
            .logs
            .game_logs(player_id)
            .await
            .map_err(|e| PredictionError::PlayerLogsUnavailable(e.to_string()))?
            .ok_or_else(|| PredictionError::PlayerNotFound(player_id.to_string()))?;

        // The latest game with a readable matchup names the player's team.
        let latest_team = logs
            .iter()
            .filter_map(|log| parse_matchup(&log.matchup).map(|m| (log, m.team)))
            .max_by_key(|(log, _)| log.game_date);
        let Some((latest, team)) = latest_team else {
            let reason = if logs.is_empty() {
                "no game logs"
            } else {
                "no readable matchup in game logs"
            };
            let (games_used, features) = predict_thresholds(&[], "");
            return Ok(PlayerPredictionResponse {
                player_id: player_id.to_string(),
                player_name: logs
                    .first()
                    .map(|log| log.player_name.clone())
                    .filter(|name| !name.is_empty()),
                game_id: game.game_id,
                team: None,
                opponent: None,
                games_used,
                features,
                reason: Some(reason.to_string()),
            });
        };

        let opponent = if team == game.home_abbr {
            game.away_abbr.clone()
        } else if team == game.away_abbr {
            game.home_abbr.clone()
        } else {
            return Err(PredictionError::PlayerNotInGame {
                player_id: player_id.to_string(),
                team,
                game_id: game.game_id,
            });
        };

        let (games_used, features) = predict_thresholds(&logs, &opponent);
        debug!(
            "Player {} vs {}: {} qualifying games",
            player_id, opponent, games_used
        );

        Ok(PlayerPredictionResponse {
            player_id: player_id.to_string(),
            player_name: Some(latest.player_name.clone()).filter(|name| !name.is_empty()),
            game_id: game.game_id,
            reason: (games_used == 0).then(|| format!("no games against {}", opponent)),
            team: Some(team),
            opponent: Some(opponent),
            games_used,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FitOptions;
    use crate::clients::{InMemoryPlayerLogs, InMemorySchedule};
    use crate::models::Location;
    use crate::player::test_support::log;
    use crate::store::test_support::{date, record, trainable_store};
    use chrono::{TimeZone, Utc};

    fn lal_bos(id: &str) -> ScheduledGame {
        ScheduledGame {
            game_id: id.to_string(),
            home_abbr: "LAL".to_string(),
            away_abbr: "BOS".to_string(),
            home_name: "Los Angeles Lakers".to_string(),
            away_name: "Boston Celtics".to_string(),
            // 2021-06-01 evening Eastern
            start_time: Utc.with_ymd_and_hms(2021, 6, 2, 0, 0, 0).unwrap(),
            venue: Some("Crypto.com Arena".to_string()),
            label: "Regular Season".to_string(),
        }
    }

    fn predictor(store: HistoricalStore, games: Vec<ScheduledGame>) -> GamePredictor {
        let classifier = Arc::new(ClassifierService::new(Arc::new(store)));
        GamePredictor::new(classifier, Arc::new(InMemorySchedule::new(games)))
    }

    #[test]
    fn test_trained_prediction_fills_explain() {
        let predictor = predictor(trainable_store(400), vec![]);
        let response = predictor.predict_scheduled(&lal_bos("1"));

        assert!((response.probabilities.home + response.probabilities.away - 100.0).abs() < 1e-9);
        assert!(response.accuracy.is_some());
        assert_eq!(response.explain.weights, BlendWeights::STANDARD);
        assert!(response.explain.home_form.is_some());
        assert_eq!(response.explain.home_contributions.len(), 5);
        assert!(response.explain.reason.is_none());
        assert!(response.prediction.ends_with(" wins"));
    }

    #[test]
    fn test_small_store_forces_even_split() {
        let predictor = predictor(trainable_store(50), vec![]);
        let response = predictor.predict_scheduled(&lal_bos("1"));

        assert_eq!(response.probabilities, Probabilities::EVEN);
        assert_eq!(response.accuracy, None);
        assert_eq!(response.explain.reason.as_deref(), Some("not enough training data"));
        assert_eq!(response.prediction, "Los Angeles Lakers wins");
    }

    #[test]
    fn test_unconverged_model_forces_even_split() {
        let options = FitOptions {
            max_iter: 1,
            tolerance: 0.0,
        };
        let classifier = ClassifierService::with_options(Arc::new(trainable_store(400)), options);
        let response = predict_game(classifier.store(), &classifier, &lal_bos("1"));

        assert_eq!(response.probabilities, Probabilities::EVEN);
        assert_eq!(response.accuracy, None);
        assert_eq!(
            response.explain.reason.as_deref(),
            Some("model failed to converge after 1 iterations")
        );
        assert_eq!(response.prediction, "Los Angeles Lakers wins");
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["accuracy"].is_null());
    }

    #[test]
    fn test_team_without_history_uses_neutral_term() {
        let mut game = lal_bos("1");
        game.away_abbr = "MIA".to_string();
        game.away_name = String::new();
        let predictor = predictor(trainable_store(400), vec![]);
        let response = predictor.predict_scheduled(&game);

        assert_eq!(response.explain.model_away, Some(NEUTRAL_RATE));
        assert!(response.explain.away_form.is_none());
        assert_eq!(response.explain.away_rest_days, Some(0));
        assert_eq!(response.away_name, "Miami Heat");
        assert!(response
            .explain
            .reason
            .as_deref()
            .unwrap_or_default()
            .contains("no recent games for MIA"));
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let predictor = predictor(trainable_store(400), vec![lal_bos("1")]);
        let err = predictor.predict("999").await.unwrap_err();
        assert!(matches!(err, PredictionError::GameNotFound(ref id) if id == "999"));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let predictor = predictor(trainable_store(400), vec![lal_bos("1")]);
        let a = predictor.predict("1").await.unwrap();
        let b = predictor.predict_scheduled(&lal_bos("1"));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_slate_matches_single_predictions() {
        let mut other = lal_bos("2");
        other.home_abbr = "BOS".to_string();
        other.away_abbr = "LAL".to_string();
        other.start_time = Utc.with_ymd_and_hms(2021, 6, 4, 0, 0, 0).unwrap();
        let predictor = predictor(trainable_store(400), vec![other.clone(), lal_bos("1")]);

        let slate = predictor.predict_slate().await.unwrap();
        assert_eq!(slate.len(), 2);
        assert_eq!(slate[0], predictor.predict_scheduled(&lal_bos("1")));
        assert_eq!(slate[1], predictor.predict_scheduled(&other));
    }

    #[test]
    fn test_team_report() {
        let records = vec![
            record("LAL", "BOS", date(2024, 1, 3), Location::Home, 120.0, true),
            record("LAL", "NYK", date(2024, 1, 1), Location::Away, 100.0, false),
        ];
        let predictor = predictor(HistoricalStore::from_records(records), vec![]);

        let report = predictor.team_report("lakers", date(2024, 1, 10)).unwrap();
        assert_eq!(report.abbreviation, "LAL");
        assert_eq!(report.recent_games.len(), 2);
        assert_eq!(report.form.unwrap().avg_points, 110.0);

        assert!(matches!(
            predictor.team_report("Sonics", date(2024, 1, 10)),
            Err(PredictionError::TeamNotFound(_))
        ));
    }

    fn forecaster(logs: InMemoryPlayerLogs) -> PlayerForecaster {
        PlayerForecaster::new(
            Arc::new(logs),
            Arc::new(InMemorySchedule::new(vec![lal_bos("1")])),
        )
    }

    #[tokio::test]
    async fn test_player_thresholds_against_scheduled_opponent() {
        let mut logs = InMemoryPlayerLogs::new();
        logs.insert(
            "2544",
            vec![
                log("LAL vs. BOS", date(2021, 3, 1), 30.0, 3.0),
                log("LAL @ BOS", date(2021, 2, 1), 20.0, 1.0),
                log("LAL vs. DEN", date(2021, 4, 1), 40.0, 5.0),
            ],
        );
        let response = forecaster(logs).predict("2544", "1").await.unwrap();

        assert_eq!(response.team.as_deref(), Some("LAL"));
        assert_eq!(response.opponent.as_deref(), Some("BOS"));
        assert_eq!(response.games_used, 2);
        assert_eq!(response.features["PTS"].len(), 6);
        assert!(response.reason.is_none());
    }

    #[tokio::test]
    async fn test_player_edge_cases() {
        let mut logs = InMemoryPlayerLogs::new();
        logs.insert("1", Vec::new());
        logs.insert("2", vec![log("MIA vs. NYK", date(2021, 3, 1), 10.0, 1.0)]);
        logs.insert("3", vec![log("BOS @ DEN", date(2021, 3, 1), 10.0, 1.0)]);
        let forecaster = forecaster(logs);

        let empty = forecaster.predict("1", "1").await.unwrap();
        assert_eq!(empty.games_used, 0);
        assert!(empty
            .features
            .values()
            .all(|lines| lines == &vec![crate::player::ThresholdLine::unavailable()]));

        assert!(matches!(
            forecaster.predict("2", "1").await,
            Err(PredictionError::PlayerNotInGame { .. })
        ));

        let no_meetings = forecaster.predict("3", "1").await.unwrap();
        assert_eq!(no_meetings.opponent.as_deref(), Some("LAL"));
        assert_eq!(no_meetings.reason.as_deref(), Some("no games against LAL"));

        assert!(matches!(
            forecaster.predict("404", "1").await,
            Err(PredictionError::PlayerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_latest_matchup_falls_back() {
        let mut logs = InMemoryPlayerLogs::new();
        logs.insert(
            "2544",
            vec![
                log("LAL vs BOS (OT)", date(2021, 4, 1), 40.0, 5.0),
                log("LAL @ BOS", date(2021, 3, 1), 20.0, 1.0),
            ],
        );
        logs.insert("7", vec![log("TBD", date(2021, 4, 1), 10.0, 1.0)]);
        let forecaster = forecaster(logs);

        let response = forecaster.predict("2544", "1").await.unwrap();
        assert_eq!(response.team.as_deref(), Some("LAL"));
        assert_eq!(response.opponent.as_deref(), Some("BOS"));
        assert_eq!(response.games_used, 1);

        let unreadable = forecaster.predict("7", "1").await.unwrap();
        assert_eq!(unreadable.games_used, 0);
        assert!(unreadable.team.is_none());
        assert_eq!(
            unreadable.reason.as_deref(),
            Some("no readable matchup in game logs")
        );
    }
}
