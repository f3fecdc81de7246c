//! DTO definitions used by the competition REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::GameDefaults,
    engine::{
        game_mode::{FinishReason, GameResult},
        roster::{Player, PlayerId},
        scoring::{GuessCategory, Guesses, ScoreBreakdown},
        settings::{CompetitionSettings, GameMode, PointValues, TieBreakPolicy},
        snapshot::{EngineSnapshot, GameStats, GameStatus, TurnSnapshot},
        song_pool::Song,
        turn::{TurnOutcome, TurnPhase},
    },
    error::ServiceError,
};

/// Win condition selected when starting a competition.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameModeKind {
    Points,
    TimeBased,
    Rounds,
}

/// How a tie at the end of a rounds game is settled.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakDto {
    HighestScore,
    MultipleWinners,
    SuddenDeath,
}

impl From<TieBreakDto> for TieBreakPolicy {
    fn from(value: TieBreakDto) -> Self {
        match value {
            TieBreakDto::HighestScore => TieBreakPolicy::HighestScore,
            TieBreakDto::MultipleWinners => TieBreakPolicy::MultipleWinners,
            TieBreakDto::SuddenDeath => TieBreakPolicy::SuddenDeath,
        }
    }
}

/// Points awarded per category; any omitted block falls back to the configured defaults.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct PointValuesDto {
    pub artist: u32,
    pub title: u32,
    pub year: u32,
    pub bonus: u32,
}

impl From<PointValuesDto> for PointValues {
    fn from(value: PointValuesDto) -> Self {
        Self {
            artist: value.artist,
            title: value.title,
            year: value.year,
            bonus: value.bonus,
        }
    }
}

/// Payload used to start a brand-new competition.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartCompetitionRequest {
    /// Display names in turn order.
    #[validate(length(min = 1, max = 10))]
    pub player_names: Vec<String>,
    /// Defaults to the number of names.
    #[serde(default)]
    pub number_of_players: Option<usize>,
    pub game_mode: GameModeKind,
    /// Required for `points`.
    #[serde(default)]
    pub target_score: Option<u32>,
    /// Required for `time_based`.
    #[serde(default)]
    pub game_duration_minutes: Option<u32>,
    /// Required for `rounds`.
    #[serde(default)]
    pub maximum_rounds: Option<u32>,
    /// Only read for `rounds`; defaults to `highest_score`.
    #[serde(default)]
    pub tie_break_policy: Option<TieBreakDto>,
    #[serde(default)]
    pub points: Option<PointValuesDto>,
    #[serde(default)]
    pub skips_per_player: Option<u32>,
    #[serde(default)]
    pub skip_cost: Option<u32>,
    #[validate(nested)]
    pub songs: Vec<SongInput>,
}

impl StartCompetitionRequest {
    /// Split the request into engine settings and the song list, filling gaps from `defaults`.
    pub fn into_parts(
        self,
        defaults: GameDefaults,
    ) -> Result<(CompetitionSettings, Vec<Song>), ServiceError> {
        let mode = match self.game_mode {
            GameModeKind::Points => GameMode::Points {
                target_score: require(self.target_score, "target_score")?,
            },
            GameModeKind::TimeBased => GameMode::TimeBased {
                duration_minutes: require(self.game_duration_minutes, "game_duration_minutes")?,
            },
            GameModeKind::Rounds => GameMode::Rounds {
                maximum_rounds: require(self.maximum_rounds, "maximum_rounds")?,
                tie_break: self
                    .tie_break_policy
                    .map(Into::into)
                    .unwrap_or(TieBreakPolicy::HighestScore),
            },
        };

        let settings = CompetitionSettings {
            number_of_players: self.number_of_players.unwrap_or(self.player_names.len()),
            mode,
            points: self.points.map(Into::into).unwrap_or(defaults.points),
            skips_per_player: self.skips_per_player.unwrap_or(defaults.skips_per_player),
            skip_cost: self.skip_cost.unwrap_or(defaults.skip_cost),
            player_names: self
                .player_names
                .into_iter()
                .map(|name| name.trim().to_string())
                .collect(),
        };
        let songs = self.songs.into_iter().map(Song::from).collect();

        Ok((settings, songs))
    }
}

fn require(value: Option<u32>, field: &str) -> Result<u32, ServiceError> {
    value.ok_or_else(|| ServiceError::InvalidInput(format!("{field} is required for this mode")))
}

/// Song entry of the list loaded for the game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SongInput {
    /// Identifier printed on the card (QR payload).
    #[validate(length(min = 1))]
    pub external_id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub year: Option<u16>,
}

impl From<SongInput> for Song {
    fn from(value: SongInput) -> Self {
        Self {
            external_id: value.external_id.trim().to_string(),
            title: value.title,
            artist: value.artist,
            year: value.year,
        }
    }
}

/// Identifier decoded by the scanner.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    pub scanned: String,
}

/// Guessable category.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GuessCategoryDto {
    Artist,
    Title,
    Year,
}

impl From<GuessCategoryDto> for GuessCategory {
    fn from(value: GuessCategoryDto) -> Self {
        match value {
            GuessCategoryDto::Artist => GuessCategory::Artist,
            GuessCategoryDto::Title => GuessCategory::Title,
            GuessCategoryDto::Year => GuessCategory::Year,
        }
    }
}

/// Toggle a category, or set it explicitly when `correct` is present.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GuessRequest {
    pub category: GuessCategoryDto,
    #[serde(default)]
    pub correct: Option<bool>,
}

/// Song details, only sent once the answers are revealed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SongDto {
    pub external_id: String,
    pub title: String,
    pub artist: String,
    pub year: Option<u16>,
}

impl From<&Song> for SongDto {
    fn from(song: &Song) -> Self {
        Self {
            external_id: song.external_id.clone(),
            title: song.title.clone(),
            artist: song.artist.clone(),
            year: song.year,
        }
    }
}

/// Categories marked as guessed on the active turn.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GuessesDto {
    pub artist: bool,
    pub title: bool,
    pub year: bool,
}

impl From<Guesses> for GuessesDto {
    fn from(value: Guesses) -> Self {
        Self {
            artist: value.artist,
            title: value.title,
            year: value.year,
        }
    }
}

/// Points earned, split per category.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ScoreBreakdownDto {
    pub artist: u32,
    pub title: u32,
    pub year: u32,
    pub bonus: u32,
    pub total: u32,
}

impl From<ScoreBreakdown> for ScoreBreakdownDto {
    fn from(value: ScoreBreakdown) -> Self {
        Self {
            artist: value.artist,
            title: value.title,
            year: value.year,
            bonus: value.bonus,
            total: value.total(),
        }
    }
}

/// Player standing as shown on the scoreboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub skips_used: u32,
    pub turns_played: u32,
    pub points: ScoreBreakdownDto,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            score: player.score,
            skips_used: player.skips_used,
            turns_played: player.turns_played,
            points: player.points.into(),
        }
    }
}

/// Phase of the active turn.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhaseDto {
    Idle,
    AwaitingScan,
    Resolved,
    Revealed,
}

impl From<TurnPhase> for TurnPhaseDto {
    fn from(value: TurnPhase) -> Self {
        match value {
            TurnPhase::Idle => TurnPhaseDto::Idle,
            TurnPhase::AwaitingScan => TurnPhaseDto::AwaitingScan,
            TurnPhase::Resolved => TurnPhaseDto::Resolved,
            TurnPhase::Revealed => TurnPhaseDto::Revealed,
        }
    }
}

/// Active turn. `song` stays empty until the answers are revealed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TurnView {
    pub player_id: PlayerId,
    pub player_name: String,
    pub phase: TurnPhaseDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<SongDto>,
    pub guessed: GuessesDto,
}

impl TurnView {
    fn from_snapshot(turn: &TurnSnapshot, players: &[Player]) -> Self {
        Self {
            player_id: turn.player,
            player_name: player_name(players, turn.player),
            phase: turn.phase.into(),
            song_id: turn.song.as_ref().map(|song| song.external_id.clone()),
            song: turn
                .song
                .as_ref()
                .filter(|_| turn.revealed)
                .map(SongDto::from),
            guessed: turn.guessed.into(),
        }
    }
}

fn player_name(players: &[Player], id: PlayerId) -> String {
    players
        .get(id)
        .map(|player| player.name.clone())
        .unwrap_or_default()
}

/// Overall competition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatusDto {
    InProgress,
    SuddenDeath,
    Finished,
}

/// Why the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FinishReasonDto {
    TargetReached,
    TimeExpired,
    RoundLimitReached,
    SuddenDeathResolved,
    PoolExhausted,
}

impl From<FinishReason> for FinishReasonDto {
    fn from(value: FinishReason) -> Self {
        match value {
            FinishReason::TargetReached => FinishReasonDto::TargetReached,
            FinishReason::TimeExpired => FinishReasonDto::TimeExpired,
            FinishReason::RoundLimitReached => FinishReasonDto::RoundLimitReached,
            FinishReason::SuddenDeathResolved => FinishReasonDto::SuddenDeathResolved,
            FinishReason::PoolExhausted => FinishReasonDto::PoolExhausted,
        }
    }
}

/// Final outcome of a finished game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameResultDto {
    pub winners: Vec<PlayerSummary>,
    pub reason: FinishReasonDto,
}

impl GameResultDto {
    fn from_result(result: &GameResult, players: &[Player]) -> Self {
        Self {
            winners: result
                .winners
                .iter()
                .filter_map(|id| players.get(*id))
                .map(PlayerSummary::from)
                .collect(),
            reason: result.reason.into(),
        }
    }
}

/// Derived statistics for the end-of-game screen.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GameStatsDto {
    pub total_rounds: u32,
    pub total_songs_played: usize,
    pub elapsed_minutes: u64,
    pub was_sudden_death: bool,
}

impl From<GameStats> for GameStatsDto {
    fn from(value: GameStats) -> Self {
        Self {
            total_rounds: value.total_rounds,
            total_songs_played: value.total_songs_played,
            elapsed_minutes: value.elapsed_minutes,
            was_sudden_death: value.was_sudden_death,
        }
    }
}

/// Full competition state pushed to the host screen after every event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompetitionSnapshot {
    pub status: CompetitionStatusDto,
    /// Seats still playing during sudden death.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contenders: Vec<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResultDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnView>,
    pub players: Vec<PlayerSummary>,
    pub leaderboard: Vec<PlayerSummary>,
    pub stats: GameStatsDto,
    pub remaining_songs: usize,
    pub no_more_turns: bool,
    pub year_data_available: bool,
    pub skip_available: bool,
}

impl From<&EngineSnapshot> for CompetitionSnapshot {
    fn from(snapshot: &EngineSnapshot) -> Self {
        let players = &snapshot.players;
        let (status, contenders, result) = match &snapshot.status {
            GameStatus::InProgress => (CompetitionStatusDto::InProgress, Vec::new(), None),
            GameStatus::SuddenDeath { contenders } => {
                (CompetitionStatusDto::SuddenDeath, contenders.clone(), None)
            }
            GameStatus::Finished(result) => (
                CompetitionStatusDto::Finished,
                Vec::new(),
                Some(GameResultDto::from_result(result, players)),
            ),
        };

        Self {
            status,
            contenders,
            result,
            turn: snapshot
                .turn
                .as_ref()
                .map(|turn| TurnView::from_snapshot(turn, players)),
            players: players.iter().map(PlayerSummary::from).collect(),
            leaderboard: snapshot.leaderboard.iter().map(PlayerSummary::from).collect(),
            stats: snapshot.stats.into(),
            remaining_songs: snapshot.remaining_songs,
            no_more_turns: snapshot.no_more_turns,
            year_data_available: snapshot.year_data_available,
            skip_available: snapshot.skip_available,
        }
    }
}

/// Whether a scan or draw found a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanResultKind {
    Matched,
    NotFound,
}

/// Response to a scan or a digital draw.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    pub result: ScanResultKind,
    /// Identifier as received (empty for a draw).
    pub scanned: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<String>,
    pub competition: CompetitionSnapshot,
}

/// Response to a reveal, carrying the answers.
#[derive(Debug, Serialize, ToSchema)]
pub struct RevealResponse {
    pub song: SongDto,
    pub competition: CompetitionSnapshot,
}

/// How the turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcomeKind {
    Completed,
    Skipped,
}

/// Response sent when a turn is completed or skipped.
#[derive(Debug, Serialize, ToSchema)]
pub struct TurnReportResponse {
    pub player: PlayerSummary,
    pub outcome: TurnOutcomeKind,
    /// Points earned on a completed turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<ScoreBreakdownDto>,
    /// Points paid for a skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cost: Option<u32>,
    /// Song consumed by the turn, shown in full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<SongDto>,
    pub competition: CompetitionSnapshot,
}

impl TurnReportResponse {
    /// Assemble the report once the engine has moved on to the next turn.
    pub fn new(
        player: PlayerSummary,
        outcome: &TurnOutcome,
        song: Option<&Song>,
        competition: CompetitionSnapshot,
    ) -> Self {
        let (kind, points, skip_cost) = match outcome {
            TurnOutcome::Completed(breakdown) => {
                (TurnOutcomeKind::Completed, Some((*breakdown).into()), None)
            }
            TurnOutcome::Skipped { cost } => (TurnOutcomeKind::Skipped, None, Some(*cost)),
        };
        Self {
            player,
            outcome: kind,
            points,
            skip_cost,
            song: song.map(SongDto::from),
            competition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::engine::{CompetitionEngine, clock::ManualClock, song_pool::tests::song};

    fn defaults() -> GameDefaults {
        GameDefaults {
            points: PointValues {
                artist: 1,
                title: 1,
                year: 1,
                bonus: 1,
            },
            skips_per_player: 3,
            skip_cost: 1,
        }
    }

    fn request(body: serde_json::Value) -> StartCompetitionRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn omitted_rules_come_from_defaults() {
        let (settings, songs) = request(serde_json::json!({
            "player_names": [" Ada ", "Bob"],
            "game_mode": "rounds",
            "maximum_rounds": 3,
            "songs": [{ "external_id": " 42 ", "title": "T", "artist": "A", "year": 1999 }]
        }))
        .into_parts(defaults())
        .unwrap();

        assert_eq!(settings.number_of_players, 2);
        assert_eq!(settings.player_names, vec!["Ada", "Bob"]);
        assert_eq!(
            settings.mode,
            GameMode::Rounds {
                maximum_rounds: 3,
                tie_break: TieBreakPolicy::HighestScore
            }
        );
        assert_eq!(settings.skips_per_player, 3);
        assert_eq!(settings.points.max_per_turn(), 4);
        assert_eq!(songs[0].external_id, "42");
    }

    #[test]
    fn missing_threshold_is_rejected() {
        let err = request(serde_json::json!({
            "player_names": ["Ada"],
            "game_mode": "time_based",
            "songs": []
        }))
        .into_parts(defaults())
        .unwrap_err();

        match err {
            ServiceError::InvalidInput(message) => {
                assert!(message.contains("game_duration_minutes"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn too_many_players_fail_validation() {
        let names: Vec<String> = (0..11).map(|i| format!("P{i}")).collect();
        let request = request(serde_json::json!({
            "player_names": names,
            "game_mode": "points",
            "target_score": 10,
            "songs": [{ "external_id": "", "title": "T", "artist": "A" }]
        }));

        let errors = request.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("player_names"));
        assert!(fields.contains_key("songs"));
    }

    #[test]
    fn snapshot_hides_song_until_reveal() {
        let settings = crate::engine::settings::tests::settings(
            GameMode::Points { target_score: 50 },
            &["Ada", "Bob"],
        );
        let mut engine = CompetitionEngine::new(
            settings,
            vec![song("001", Some(1984)), song("002", Some(1990))],
            Arc::new(ManualClock::new()),
        )
        .unwrap();
        engine.scan("001").unwrap();

        let hidden = CompetitionSnapshot::from(&engine.snapshot());
        let turn = hidden.turn.unwrap();
        assert_eq!(turn.song_id.as_deref(), Some("001"));
        assert!(turn.song.is_none());
        assert_eq!(turn.player_name, "Ada");

        engine.reveal().unwrap();
        let shown = CompetitionSnapshot::from(&engine.snapshot());
        assert_eq!(
            shown.turn.and_then(|turn| turn.song).map(|song| song.year),
            Some(Some(1984))
        );
    }
}
